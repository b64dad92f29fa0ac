//! IEEE-488.2 definite-length binary block decoding.
//!
//! The spectrum analyzer returns trace data in the definite-length block
//! format: a literal `#` marker, one ASCII digit giving the number of length
//! digits, the payload length in ASCII decimal, then the raw payload. With
//! `:FORM INT,32` and `:FORM:BORD NORM` negotiated, the payload is a sequence
//! of big-endian two's-complement 32-bit integers, one per trace point,
//! reported in milli-units.
//!
//! Any framing mismatch is a hard [`InstrumentError::MalformedBlock`]; a block
//! is never silently truncated or zero-padded, since silent data loss in a
//! measurement pipeline is unacceptable.

use crate::error::{InstrumentError, Result};

/// Bytes per trace point (`:FORM INT,32`).
const BYTES_PER_POINT: usize = 4;

/// The instrument reports amplitudes in milli-units; this divisor is part of
/// the wire contract for the E4407B, not a configurable scale.
const MILLIUNITS_PER_UNIT: f64 = 1000.0;

/// Decodes a definite-length binary block into rescaled sample values.
///
/// Returns exactly `d / 4` samples for a declared payload length `d`, in wire
/// order. An empty payload (`#10`) decodes to an empty vector without error.
pub fn decode_block(raw: &[u8]) -> Result<Vec<f64>> {
    let marker = raw
        .first()
        .ok_or_else(|| InstrumentError::MalformedBlock("empty response".to_string()))?;
    if *marker != b'#' {
        return Err(InstrumentError::MalformedBlock(format!(
            "expected '#' marker, got byte 0x{marker:02x}"
        )));
    }

    let digit_count = raw
        .get(1)
        .ok_or_else(|| InstrumentError::MalformedBlock("missing header-length digit".to_string()))
        .and_then(|b| {
            (*b as char).to_digit(10).ok_or_else(|| {
                InstrumentError::MalformedBlock(format!(
                    "header-length byte 0x{b:02x} is not an ASCII digit"
                ))
            })
        })? as usize;

    let length_digits = raw.get(2..2 + digit_count).ok_or_else(|| {
        InstrumentError::MalformedBlock(format!(
            "block too short for {digit_count} length digits"
        ))
    })?;
    let declared_len: usize = std::str::from_utf8(length_digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            InstrumentError::MalformedBlock(format!(
                "payload length {:?} is not an ASCII decimal integer",
                String::from_utf8_lossy(length_digits)
            ))
        })?;

    let payload = &raw[2 + digit_count..];
    if payload.len() != declared_len {
        return Err(InstrumentError::MalformedBlock(format!(
            "declared payload length {declared_len} but {} bytes present",
            payload.len()
        )));
    }
    if declared_len % BYTES_PER_POINT != 0 {
        return Err(InstrumentError::MalformedBlock(format!(
            "payload length {declared_len} is not a multiple of {BYTES_PER_POINT}"
        )));
    }

    Ok(payload
        .chunks_exact(BYTES_PER_POINT)
        .map(|chunk| {
            let value = i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            f64::from(value) / MILLIUNITS_PER_UNIT
        })
        .collect())
}
