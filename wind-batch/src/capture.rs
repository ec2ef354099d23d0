//! Capture file parsing.
//!
//! One report per line: a unix-millisecond timestamp and a hex frame,
//! whitespace separated. Anything else (short frames, garbage, comments) is
//! skipped, not fatal; receiver dumps are messy.

use std::io::BufRead;

use tracing::debug;
use wind_core::types::RawMessage;

/// One timestamped frame from a capture file.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRecord {
    /// Receive time, unix milliseconds.
    pub time_ms: u64,
    pub frame: RawMessage,
}

/// Parse a capture stream, skipping unusable lines.
pub fn parse_capture<R: BufRead>(reader: R) -> std::io::Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    let mut skipped = 0u64;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(ts), Some(hex)) = (parts.next(), parts.next()) else {
            skipped += 1;
            continue;
        };

        let Ok(time) = ts.parse::<f64>() else {
            skipped += 1;
            continue;
        };
        if !time.is_finite() || time < 0.0 {
            skipped += 1;
            continue;
        }

        let Ok(frame) = RawMessage::from_hex(hex) else {
            skipped += 1;
            continue;
        };

        records.push(CaptureRecord {
            time_ms: time.round() as u64,
            frame,
        });
    }

    if skipped > 0 {
        debug!(skipped, kept = records.len(), "capture parse");
    }
    Ok(records)
}

/// Round a timestamp to the nearest bucket of `resolution_ms`.
pub fn bucket_ms(time_ms: u64, resolution_ms: u64) -> u64 {
    debug_assert!(resolution_ms > 0);
    (time_ms + resolution_ms / 2) / resolution_ms * resolution_ms
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
