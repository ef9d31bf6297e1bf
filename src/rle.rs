//! Plain run-length coding (`.RLC`)
//!
//! The raster is scanned row-major and stored as a flat sequence of
//! `[symbol, length]` byte pairs. A run never claims more than 255 samples;
//! longer stretches are split.

use crate::error::{CodecError, Result};
use crate::raster::{Raster, PIXEL_COUNT};

/// Longest run a single record can describe.
pub const MAX_RUN: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub symbol: u8,
    pub length: u8,
}

/// Append the runs of `samples` to `runs`. Runs never continue past the end
/// of `samples`, so separate calls produce independent run sequences.
pub(crate) fn encode_runs<I>(samples: I, runs: &mut Vec<Run>)
where
    I: IntoIterator<Item = u8>,
{
    let mut current: Option<Run> = None;
    for symbol in samples {
        match current.as_mut() {
            Some(run) if run.symbol == symbol && run.length < MAX_RUN => run.length += 1,
            _ => {
                if let Some(closed) = current.replace(Run { symbol, length: 1 }) {
                    runs.push(closed);
                }
            }
        }
    }
    runs.extend(current);
}

pub(crate) fn write_runs(runs: &[Run]) -> Vec<u8> {
    let mut output = Vec::with_capacity(runs.len() * 2);
    for run in runs {
        output.push(run.symbol);
        output.push(run.length);
    }
    output
}

pub(crate) fn read_runs(data: &[u8]) -> Result<Vec<Run>> {
    if data.len() % 2 != 0 {
        return Err(CodecError::Format(format!(
            "run records are two bytes, got {} bytes",
            data.len()
        )));
    }
    data.chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| match pair[1] {
            0 => Err(CodecError::Format(format!("run {i} has zero length"))),
            length => Ok(Run {
                symbol: pair[0],
                length,
            }),
        })
        .collect()
}

/// Compress a raster into `[symbol, length]` records.
pub fn compress(raster: &Raster) -> Result<Vec<u8>> {
    let mut runs = Vec::new();
    encode_runs(raster.pixels().iter().copied(), &mut runs);
    tracing::debug!(runs = runs.len(), "run-length encoded raster");
    Ok(write_runs(&runs))
}

/// Rebuild a raster from `[symbol, length]` records.
pub fn decompress(data: &[u8]) -> Result<Raster> {
    let runs = read_runs(data)?;
    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for run in &runs {
        let end = pixels.len() + run.length as usize;
        if end > PIXEL_COUNT {
            return Err(CodecError::Overrun(format!(
                "runs describe more than {PIXEL_COUNT} samples"
            )));
        }
        pixels.resize(end, run.symbol);
    }
    Raster::from_raw_bytes(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::WIDTH;

    fn runs_of(samples: &[u8]) -> Vec<Run> {
        let mut runs = Vec::new();
        encode_runs(samples.iter().copied(), &mut runs);
        runs
    }

    #[test]
    fn test_run_of_256_splits() {
        let runs = runs_of(&[9u8; 256]);
        assert_eq!(
            runs,
            vec![
                Run { symbol: 9, length: 255 },
                Run { symbol: 9, length: 1 }
            ]
        );
    }

    #[test]
    fn test_symbol_change_closes_run() {
        let runs = runs_of(&[1, 1, 2, 1]);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], Run { symbol: 1, length: 2 });
    }

    #[test]
    fn test_all_zero_raster() {
        let compressed = compress(&Raster::zeros()).unwrap();
        let records = (PIXEL_COUNT + 254) / 255;
        assert_eq!(compressed.len(), records * 2);
        for pair in compressed[..compressed.len() - 2].chunks(2) {
            assert_eq!(pair, [0, 255]);
        }
        assert_eq!(&compressed[compressed.len() - 2..], [0, (PIXEL_COUNT % 255) as u8]);
        assert_eq!(decompress(&compressed).unwrap(), Raster::zeros());
    }

    #[test]
    fn test_roundtrip_gradient() {
        let mut raster = Raster::zeros();
        for y in 0..512 {
            for x in 0..WIDTH {
                raster.set(x, y, (x / 3 + y) as u8);
            }
        }
        let compressed = compress(&raster).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), raster);
    }

    #[test]
    fn test_odd_length_is_format_error() {
        assert!(matches!(decompress(&[0, 255, 7]), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_zero_length_run_is_format_error() {
        assert!(matches!(decompress(&[4, 0]), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_short_stream_is_truncated() {
        let err = decompress(&[3, 255]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedData { expected: PIXEL_COUNT, actual: 255 }
        ));
    }

    #[test]
    fn test_extra_runs_overrun() {
        let mut data = compress(&Raster::filled(4)).unwrap();
        data.extend_from_slice(&[4, 1]);
        assert!(matches!(decompress(&data), Err(CodecError::Overrun(_))));
    }
}
