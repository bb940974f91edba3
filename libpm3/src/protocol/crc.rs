// libpm3/src/protocol/crc.rs

//! Table-driven CRC-16 with selectable bit reflection.
//!
//! Lookup tables are built lazily on first use and kept for the life of
//! the process: one 8-bit reflection table, and one 256-entry table per
//! `(polynomial, reflect_input)` pair.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// CCITT polynomial shared by CRC-A and CRC-X25.
pub const CRC16_POLY_CCITT: u16 = 0x1021;

/// Initial value for ISO14443-A frames.
pub const CRC16_INIT_14A: u16 = 0xC6C6;

/// Initial value (and final XOR) for X.25 style frames.
pub const CRC16_INIT_X25: u16 = 0xFFFF;

type PolyTable = [u16; 256];

fn reflect8_table() -> &'static [u8; 256] {
    static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0u8; 256];
        for (i, slot) in t.iter_mut().enumerate() {
            *slot = (i as u8).reverse_bits();
        }
        t
    })
}

fn reflect8(b: u8) -> u8 {
    reflect8_table()[b as usize]
}

fn reflect16(u: u16) -> u16 {
    (reflect8((u >> 8) as u8) as u16) | ((reflect8(u as u8) as u16) << 8)
}

fn poly_table(poly: u16, reflect_input: bool) -> Arc<PolyTable> {
    static TABLES: OnceLock<Mutex<HashMap<(u16, bool), Arc<PolyTable>>>> = OnceLock::new();
    let tables = TABLES.get_or_init(|| Mutex::new(HashMap::new()));
    // A poisoned lock only means another thread panicked mid-insert; the
    // map itself is still consistent.
    let mut tables = tables.lock().unwrap_or_else(|e| e.into_inner());
    tables
        .entry((poly, reflect_input))
        .or_insert_with(|| Arc::new(build_poly_table(poly, reflect_input)))
        .clone()
}

fn build_poly_table(poly: u16, reflect_input: bool) -> PolyTable {
    let mut table = [0u16; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let byte = if reflect_input {
            reflect8(i as u8)
        } else {
            i as u8
        };
        let mut c = (byte as u16) << 8;
        let mut crc = 0u16;
        for _ in 0..8 {
            let top = (crc ^ c) & 0x8000 != 0;
            crc = (if top { poly } else { 0 }) ^ (crc << 1);
            c <<= 1;
        }
        *slot = if reflect_input { reflect16(crc) } else { crc };
    }
    table
}

/// Compute a CRC-16 over `data`.
///
/// Empty input yields the bitwise complement of `init`.
pub fn crc16(data: &[u8], poly: u16, init: u16, reflect_input: bool, reflect_output: bool) -> u16 {
    if data.is_empty() {
        return !init;
    }
    let table = poly_table(poly, reflect_input);
    if reflect_input {
        let mut crc = reflect16(init);
        for &d in data {
            crc = (crc >> 8) ^ table[((crc & 0xFF) as u8 ^ d) as usize];
        }
        if reflect_output { crc } else { reflect16(crc) }
    } else {
        let mut crc = init;
        for &d in data {
            crc = ((crc & 0xFF) << 8) ^ table[((crc >> 8) as u8 ^ d) as usize];
        }
        if reflect_output { reflect16(crc) } else { crc }
    }
}

/// ISO14443-A CRC, returned little-endian for direct concatenation.
pub fn crc16_a(data: &[u8]) -> [u8; 2] {
    crc16(data, CRC16_POLY_CCITT, CRC16_INIT_14A, true, true).to_le_bytes()
}

/// CRC-16/X25 (ISO14443-B, ISO15693, Topaz), little-endian.
pub fn crc16_x25(data: &[u8]) -> [u8; 2] {
    (0xFFFF ^ crc16(data, CRC16_POLY_CCITT, CRC16_INIT_X25, true, true)).to_le_bytes()
}

/// Check that the last two bytes of `frame` are the CRC-A of the rest.
pub fn check_crc16_a(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (body, crc) = frame.split_at(frame.len() - 2);
    crc16_a(body) == crc
}
