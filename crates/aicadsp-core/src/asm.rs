//! The assembler: packs a listing into a [`DspImage`].
//!
//! Input is the emitter's output language, one directive per line:
//! `MADRS[n] = <int>`, `COEF[n] = <signed int>`, `TEMP[n] = <int>`, and
//! `MPRO[n] = <field tokens>`. Unlike the compiler, every malformed line
//! here is fatal; this text is machine-generated.

use crate::error::AsmError;
use crate::image::{COEF_LEN, DspImage, MADRS_LEN, MPRO_LEN, TEMP_LEN};
use crate::lexer::{self, Line, parse_int, parse_uint};
use crate::step::FIELD_ORDER;

pub fn assemble(source: &str) -> Result<DspImage, AsmError> {
    let mut image = DspImage::default();
    for raw in source.lines() {
        match lexer::classify(raw) {
            Line::Blank | Line::Comment => {}
            Line::Madrs(line) | Line::Statement(line) => directive(line, &mut image)?,
        }
    }
    Ok(image)
}

fn directive(line: &str, image: &mut DspImage) -> Result<(), AsmError> {
    let (head, rhs) = line
        .split_once('=')
        .ok_or_else(|| AsmError::Malformed(line.to_string()))?;
    let (table, index) = table_ref(head.trim())?;
    let rhs = rhs.trim();

    match table.as_str() {
        "madrs" => {
            let slot = slot(index, MADRS_LEN, "MADRS")?;
            image.madrs[slot] = scalar(rhs, "MADRS")?;
        }
        "coef" => {
            let slot = slot(index, COEF_LEN, "COEF")?;
            image.coef[slot] = scalar(rhs, "COEF")?;
        }
        "temp" => {
            let slot = slot(index, TEMP_LEN, "TEMP")?;
            image.temp[slot] = scalar(rhs, "TEMP")?;
        }
        "mpro" => {
            let slot = slot(index, MPRO_LEN, "MPRO")?;
            image.mpro[slot] = fields(rhs)?;
        }
        _ => return Err(AsmError::UnknownDirective(head.trim().to_string())),
    }
    Ok(())
}

/// `NAME[index]` → (lower-cased name, index).
fn table_ref(head: &str) -> Result<(String, u64), AsmError> {
    let malformed = || AsmError::Malformed(head.to_string());
    let open = head.find('[').ok_or_else(malformed)?;
    let inner = head[open + 1..]
        .strip_suffix(']')
        .ok_or_else(malformed)?
        .trim();
    let index = parse_uint(inner).ok_or_else(|| AsmError::BadInteger(inner.to_string()))?;
    Ok((head[..open].trim().to_ascii_lowercase(), index))
}

fn slot(index: u64, len: usize, table: &'static str) -> Result<usize, AsmError> {
    if index < len as u64 {
        Ok(index as usize)
    } else {
        Err(AsmError::IndexOutOfRange { table, index })
    }
}

fn scalar<T: TryFrom<i64>>(rhs: &str, table: &'static str) -> Result<T, AsmError> {
    let value = parse_int(rhs).ok_or_else(|| AsmError::BadInteger(rhs.to_string()))?;
    T::try_from(value).map_err(|_| AsmError::ValueOutOfRange { table, value })
}

/// Packs a space-separated field list into a step word. Single-bit fields
/// appear bare; multi-bit fields as `NAME:<value>`.
fn fields(list: &str) -> Result<u64, AsmError> {
    let mut word = 0u64;
    for token in list.split_whitespace() {
        let (name, value_token) = match token.split_once(':') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        let Some((_, kind)) = FIELD_ORDER
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
        else {
            return Err(AsmError::UnknownField(name.to_string()));
        };
        let value = match value_token {
            Some(token) => parse_uint(token).ok_or_else(|| AsmError::BadInteger(token.to_string()))?,
            None => 1,
        };
        if value > kind.limit() {
            return Err(AsmError::ValueTooWide {
                field: name.to_string(),
                value,
            });
        }
        word |= kind.prep(value);
    }
    Ok(word)
}
