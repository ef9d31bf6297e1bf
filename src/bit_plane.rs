//! Bit-plane run-length coding (`.RLCBP`)
//!
//! Each of the 8 bit-planes (least significant first) is run-length encoded
//! on its own, keeping the raw mask value (`0` or `1 << plane`) as the run
//! symbol. The planes are concatenated into one stream of `[symbol, length]`
//! records, the same record shape as plain RLE.

use crate::error::{CodecError, Result};
use crate::raster::{Raster, PIXEL_COUNT};
use crate::rle::{encode_runs, read_runs, write_runs};

pub const PLANES: usize = 8;

/// Number of sample positions covered by a complete stream.
const STREAM_CELLS: usize = PLANES * PIXEL_COUNT;

/// Compress a raster plane by plane.
pub fn compress(raster: &Raster) -> Result<Vec<u8>> {
    let mut runs = Vec::new();
    for plane in 0..PLANES {
        let mask = 1u8 << plane;
        let before = runs.len();
        encode_runs(raster.pixels().iter().map(|&v| v & mask), &mut runs);
        tracing::trace!(plane, runs = runs.len() - before, "encoded bit-plane");
    }
    tracing::debug!(runs = runs.len(), "bit-plane encoded raster");
    Ok(write_runs(&runs))
}

/// Rebuild a raster by summing the contribution of every plane.
///
/// A run may straddle the boundary between two planes only if its symbol is
/// valid in both, which in practice means a run of zeros.
pub fn decompress(data: &[u8]) -> Result<Raster> {
    let runs = read_runs(data)?;
    let mut pixels = vec![0u8; PIXEL_COUNT];
    let mut cursor = 0usize;

    for (i, run) in runs.iter().enumerate() {
        let end = cursor + run.length as usize;
        if end > STREAM_CELLS {
            return Err(CodecError::Overrun(format!(
                "run {i} extends past the last bit-plane"
            )));
        }
        while cursor < end {
            let plane = cursor / PIXEL_COUNT;
            let segment_end = end.min((plane + 1) * PIXEL_COUNT);
            if run.symbol != 0 && run.symbol != 1u8 << plane {
                return Err(CodecError::Format(format!(
                    "run {i} has symbol {} in bit-plane {plane}",
                    run.symbol
                )));
            }
            if run.symbol != 0 {
                let start = cursor % PIXEL_COUNT;
                let stop = start + (segment_end - cursor);
                // each cell receives a given plane's bit exactly once
                for cell in &mut pixels[start..stop] {
                    *cell += run.symbol;
                }
            }
            cursor = segment_end;
        }
    }

    if cursor < STREAM_CELLS {
        return Err(CodecError::TruncatedData {
            expected: STREAM_CELLS,
            actual: cursor,
        });
    }
    Raster::from_raw_bytes(pixels)
}
