//! FITS header cards.
//!
//! A header is a run of 80-byte ASCII records packed into 2880-byte blocks and
//! terminated by an `END` record. cfitsio only hands out keys one at a time,
//! so the full card list is read straight from the file.

use super::error::{ModelError, Result};
use std::io::{Read, Seek, SeekFrom};

pub const BLOCK_LEN: usize = 2880;
pub const CARD_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCard {
    pub key: String,
    pub value: String,
}

/// Read every card of HDU `hdu_index`, in file order.
pub fn read_headers<R: Read + Seek>(reader: &mut R, hdu_index: usize) -> Result<Vec<HeaderCard>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut hdu = 0usize;
    loop {
        let raw = read_raw_header(reader)?;
        if hdu == hdu_index {
            return Ok(raw.chunks_exact(CARD_LEN).filter_map(parse_card).collect());
        }
        let data_len = padded_data_len(&raw)?;
        if data_len > 0 {
            reader.seek(SeekFrom::Current(data_len))?;
        }
        hdu += 1;
    }
}

fn read_raw_header<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut block = [0u8; BLOCK_LEN];
    loop {
        reader.read_exact(&mut block).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ModelError::Header("missing END record".to_string())
            } else {
                ModelError::Io(e)
            }
        })?;
        raw.extend_from_slice(&block);
        if block.chunks_exact(CARD_LEN).any(is_end_card) {
            return Ok(raw);
        }
    }
}

fn is_end_card(rec: &[u8]) -> bool {
    rec.starts_with(b"END") && rec[3..].iter().all(|&b| b == b' ')
}

/// Size of the data unit following a header, rounded up to whole blocks.
fn padded_data_len(raw: &[u8]) -> Result<i64> {
    let bitpix = raw_int(raw, "BITPIX").unwrap_or(8);
    let naxis = raw_int(raw, "NAXIS").unwrap_or(0);
    if naxis <= 0 {
        return Ok(0);
    }
    let overflow = || ModelError::Header("data unit size overflows".to_string());
    let mut bits = bitpix.unsigned_abs();
    for i in 1..=naxis {
        let axis = raw_int(raw, &format!("NAXIS{i}")).unwrap_or(0).max(0) as u64;
        bits = bits.checked_mul(axis).ok_or_else(overflow)?;
    }
    let blocks = bits.div_ceil(8).div_ceil(BLOCK_LEN as u64);
    blocks
        .checked_mul(BLOCK_LEN as u64)
        .and_then(|len| i64::try_from(len).ok())
        .ok_or_else(overflow)
}

fn raw_int(raw: &[u8], key: &str) -> Option<i64> {
    raw.chunks_exact(CARD_LEN)
        .filter_map(parse_card)
        .find(|c| c.key == key)
        .and_then(|c| c.value.parse().ok())
}

fn parse_card(rec: &[u8]) -> Option<HeaderCard> {
    let card: String = rec
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect();
    let card = card.trim_end();
    if card.is_empty() {
        return None;
    }
    let key = card[..card.len().min(8)].trim().to_string();
    if key.is_empty() || key == "END" {
        return None;
    }
    let rest = card.get(8..).unwrap_or("");
    let value = match rest.strip_prefix("= ") {
        Some(v) => unquote(strip_comment(v)),
        None => rest.trim().to_string(),
    };
    Some(HeaderCard { key, value })
}

/// Drop an inline ` / comment`, leaving quoted strings intact.
fn strip_comment(field: &str) -> &str {
    let field = field.trim();
    if let Some(body) = field.strip_prefix('\'') {
        let bytes = body.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return &field[..i + 2];
            }
            i += 1;
        }
        field
    } else {
        match field.find('/') {
            Some(pos) => field[..pos].trim_end(),
            None => field,
        }
    }
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].replace("''", "'").trim_end().to_string()
    } else {
        value.to_string()
    }
}

pub fn find<'a>(cards: &'a [HeaderCard], key: &str) -> Option<&'a str> {
    cards.iter().find(|c| c.key == key).map(|c| c.value.as_str())
}

pub fn find_int(cards: &[HeaderCard], key: &str) -> Option<i64> {
    find(cards, key).and_then(|v| v.trim().parse().ok())
}

/// `KEY: value` lines, one per card.
pub fn header_text(cards: &[HeaderCard]) -> String {
    cards
        .iter()
        .map(|c| format!("{}: {}", c.key, c.value))
        .collect::<Vec<_>>()
        .join("\n")
}
