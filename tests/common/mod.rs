//! Hand-assembled FITS files for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const BLOCK: usize = 2880;

#[derive(Clone, Copy)]
pub enum Value<'a> {
    Int(i64),
    Str(&'a str),
    Logical(bool),
}

fn card(key: &str, value: Value) -> String {
    let value = match value {
        Value::Int(v) => format!("{v:>20}"),
        Value::Logical(v) => format!("{:>20}", if v { "T" } else { "F" }),
        Value::Str(s) => format!("'{s:<8}'"),
    };
    format!("{key:<8}= {value:<70}")
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(BLOCK) * BLOCK;
    bytes.resize(len, fill);
}

/// One HDU: header cards, then `data` encoded for `bitpix`.
pub fn hdu(first: (&str, Value), bitpix: i64, dims: &[usize], extra: &[(&str, Value)], data: &[f64]) -> Vec<u8> {
    let mut header = card(first.0, first.1);
    header.push_str(&card("BITPIX", Value::Int(bitpix)));
    header.push_str(&card("NAXIS", Value::Int(dims.len() as i64)));
    for (i, d) in dims.iter().enumerate() {
        header.push_str(&card(&format!("NAXIS{}", i + 1), Value::Int(*d as i64)));
    }
    if first.0 == "XTENSION" {
        header.push_str(&card("PCOUNT", Value::Int(0)));
        header.push_str(&card("GCOUNT", Value::Int(1)));
    }
    for (key, value) in extra {
        header.push_str(&card(key, *value));
    }
    header.push_str(&format!("{:<80}", "END"));

    let mut bytes = header.into_bytes();
    pad(&mut bytes, b' ');

    let mut body = Vec::new();
    for &v in data {
        match bitpix {
            8 => body.push(v as u8),
            16 => body.extend((v as i16).to_be_bytes()),
            32 => body.extend((v as i32).to_be_bytes()),
            -32 => body.extend((v as f32).to_be_bytes()),
            -64 => body.extend(v.to_be_bytes()),
            other => panic!("unsupported BITPIX {other}"),
        }
    }
    if !body.is_empty() {
        pad(&mut body, 0);
    }
    bytes.extend(body);
    bytes
}

/// Single-HDU file holding `data` with the given axes (NAXIS1 first).
pub fn write_image(path: &Path, bitpix: i64, dims: &[usize], data: &[f64], extra: &[(&str, Value)]) -> PathBuf {
    let bytes = hdu(("SIMPLE", Value::Logical(true)), bitpix, dims, extra, data);
    std::fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// 16-bit `width` x `height` image whose pixel at column x is `f(x)`.
pub fn write_rows(path: &Path, width: usize, height: usize, f: impl Fn(usize) -> f64) -> PathBuf {
    let data: Vec<f64> = (0..height).flat_map(|_| (0..width).map(&f)).collect();
    write_image(path, 16, &[width, height], &data, &[])
}

/// Set the modification time of `path` to `secs` seconds after a fixed base.
pub fn touch(path: &Path, secs: u64) {
    let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(base + Duration::from_secs(secs))
        .unwrap();
}
