//! raster-codec: lossless codecs for fixed-size 8-bit grayscale rasters.
//!
//! Three interchangeable strategies over a 512x512 raster:
//! - Run-length coding (`.RLC`): `[symbol, length]` byte pairs
//! - Bit-plane run-length coding (`.RLCBP`): the same records, one plane at a time
//! - Huffman coding (`.HCSV`): a textual code table plus one code token per pixel
//!
//! A bit-packed Huffman variant (`.HBIN`) is available as a separate format.

pub mod bit_plane;
pub mod config;
pub mod error;
pub mod huffman;
pub mod packed_huffman;
pub mod persistence;
pub mod raster;
pub mod rle;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::persistence::{ArtifactEncoding, Persistence};
use crate::stats::{OperationKind, OperationStats, StatisticsSink, TracingStatistics};

pub use crate::raster::{Raster, HEIGHT, PIXEL_COUNT, WIDTH};

/// Codec selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CodecKind {
    RunLength,
    BitPlaneRunLength,
    Huffman,
    PackedHuffman,
}

impl CodecKind {
    pub const ALL: [CodecKind; 4] = [
        CodecKind::RunLength,
        CodecKind::BitPlaneRunLength,
        CodecKind::Huffman,
        CodecKind::PackedHuffman,
    ];

    pub fn encoding(self) -> ArtifactEncoding {
        match self {
            CodecKind::Huffman => ArtifactEncoding::Text,
            _ => ArtifactEncoding::Binary,
        }
    }
}

impl std::str::FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rle" | "rlc" => Ok(CodecKind::RunLength),
            "bitplane" | "rlcbp" => Ok(CodecKind::BitPlaneRunLength),
            "huffman" | "hcsv" => Ok(CodecKind::Huffman),
            "packed" | "hbin" => Ok(CodecKind::PackedHuffman),
            other => Err(CodecError::Format(format!("unknown codec {other:?}"))),
        }
    }
}

/// Serialized form of a compressed raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Binary(Vec<u8>),
    Text(String),
}

impl Artifact {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Binary(bytes) => bytes,
            Artifact::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encoding(&self) -> ArtifactEncoding {
        match self {
            Artifact::Binary(_) => ArtifactEncoding::Binary,
            Artifact::Text(_) => ArtifactEncoding::Text,
        }
    }
}

/// Compressed output container
#[derive(Debug, Clone)]
pub struct CompressedOutput {
    pub kind: CodecKind,
    pub artifact: Artifact,
    pub stats: OperationStats,
}

/// The codec engine: dispatches to a codec, times it and reports statistics.
pub struct ImageCodec {
    config: CodecConfig,
    sink: Arc<dyn StatisticsSink>,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl ImageCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingStatistics))
    }

    pub fn with_sink(config: CodecConfig, sink: Arc<dyn StatisticsSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn report(&self, stats: &OperationStats) {
        if self.config.report_statistics {
            self.sink.report(stats);
        }
    }

    /// Compress a raster with the given codec.
    ///
    /// The reported byte count is the artifact size, except for the textual
    /// Huffman format, which reports its theoretical bit-length estimate.
    pub fn compress(&self, raster: &Raster, kind: CodecKind) -> Result<CompressedOutput> {
        let start = Instant::now();
        let (artifact, output_bytes) = match kind {
            CodecKind::RunLength => {
                let bytes = rle::compress(raster)?;
                let n = bytes.len();
                (Artifact::Binary(bytes), n)
            }
            CodecKind::BitPlaneRunLength => {
                let bytes = bit_plane::compress(raster)?;
                let n = bytes.len();
                (Artifact::Binary(bytes), n)
            }
            CodecKind::Huffman => {
                let output = huffman::compress(raster)?;
                (Artifact::Text(output.artifact), output.estimated_bytes)
            }
            CodecKind::PackedHuffman => {
                let bytes = packed_huffman::compress(raster)?;
                let n = bytes.len();
                (Artifact::Binary(bytes), n)
            }
        };

        let stats = OperationStats {
            kind: OperationKind::Compression,
            codec: kind,
            elapsed_millis: start.elapsed().as_millis() as u64,
            output_bytes,
        };
        self.report(&stats);
        Ok(CompressedOutput {
            kind,
            artifact,
            stats,
        })
    }

    /// Decompress an artifact. A text artifact handed to a binary codec (or
    /// the reverse) is a format error.
    pub fn decompress(&self, artifact: &Artifact, kind: CodecKind) -> Result<Raster> {
        let start = Instant::now();
        let raster = match (kind, artifact) {
            (CodecKind::RunLength, Artifact::Binary(bytes)) => rle::decompress(bytes)?,
            (CodecKind::BitPlaneRunLength, Artifact::Binary(bytes)) => {
                bit_plane::decompress(bytes)?
            }
            (CodecKind::Huffman, Artifact::Text(text)) => huffman::decompress(text)?,
            (CodecKind::PackedHuffman, Artifact::Binary(bytes)) => {
                packed_huffman::decompress(bytes)?
            }
            (kind, artifact) => {
                return Err(CodecError::Format(format!(
                    "{kind:?} cannot decode a {:?} artifact",
                    artifact.encoding()
                )))
            }
        };

        self.report(&OperationStats {
            kind: OperationKind::Decompression,
            codec: kind,
            elapsed_millis: start.elapsed().as_millis() as u64,
            output_bytes: 0,
        });
        Ok(raster)
    }

    /// Compress and hand the artifact to `store` under the codec's extension.
    pub fn compress_to(
        &self,
        raster: &Raster,
        kind: CodecKind,
        store: &dyn Persistence,
    ) -> Result<PathBuf> {
        let output = self.compress(raster, kind)?;
        store.save(&output.artifact, self.config.extension_for(kind))
    }

    /// Load an artifact from `store` and decompress it.
    pub fn decompress_from(&self, kind: CodecKind, store: &dyn Persistence) -> Result<Raster> {
        let artifact = store.load(self.config.extension_for(kind), kind.encoding())?;
        self.decompress(&artifact, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RecordingStatistics;

    fn recording_codec() -> (ImageCodec, Arc<RecordingStatistics>) {
        let sink = Arc::new(RecordingStatistics::new());
        let codec = ImageCodec::with_sink(CodecConfig::default(), sink.clone());
        (codec, sink)
    }

    #[test]
    fn test_compress_rle_reports_artifact_size() {
        let (codec, sink) = recording_codec();
        let output = codec.compress(&Raster::zeros(), CodecKind::RunLength).unwrap();
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, OperationKind::Compression);
        assert_eq!(records[0].output_bytes, output.artifact.len());
    }

    #[test]
    fn test_huffman_reports_estimate() {
        let (codec, sink) = recording_codec();
        let pixels = (0..PIXEL_COUNT).map(|i| (i % 4) as u8).collect();
        let raster = Raster::from_raw_bytes(pixels).unwrap();
        let output = codec.compress(&raster, CodecKind::Huffman).unwrap();
        // every 2-bit code rounds up to one byte
        assert_eq!(output.stats.output_bytes, PIXEL_COUNT);
        assert!(output.artifact.len() > PIXEL_COUNT);
        assert_eq!(sink.records()[0].output_bytes, PIXEL_COUNT);
    }

    #[test]
    fn test_roundtrip_every_kind() {
        let (codec, sink) = recording_codec();
        let pixels = (0..PIXEL_COUNT).map(|i| ((i / 700) % 256) as u8).collect();
        let raster = Raster::from_raw_bytes(pixels).unwrap();
        for kind in CodecKind::ALL {
            let output = codec.compress(&raster, kind).unwrap();
            assert_eq!(codec.decompress(&output.artifact, kind).unwrap(), raster);
        }
        let records = sink.records();
        assert_eq!(records.len(), 8);
        assert!(records
            .iter()
            .filter(|r| r.kind == OperationKind::Decompression)
            .all(|r| r.output_bytes == 0));
    }

    #[test]
    fn test_encoding_mismatch() {
        let codec = ImageCodec::default();
        let err = codec
            .decompress(&Artifact::Text("1\n,0".into()), CodecKind::RunLength)
            .unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));
    }

    #[test]
    fn test_failed_decompress_reports_nothing() {
        let (codec, sink) = recording_codec();
        assert!(codec
            .decompress(&Artifact::Binary(vec![1, 2, 3]), CodecKind::RunLength)
            .is_err());
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_statistics_can_be_disabled() {
        let sink = Arc::new(RecordingStatistics::new());
        let config = CodecConfig {
            report_statistics: false,
            ..CodecConfig::default()
        };
        let codec = ImageCodec::with_sink(config, sink.clone());
        codec.compress(&Raster::zeros(), CodecKind::Huffman).unwrap();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_codec_kind_from_str() {
        assert_eq!("RLE".parse::<CodecKind>().unwrap(), CodecKind::RunLength);
        assert_eq!("hcsv".parse::<CodecKind>().unwrap(), CodecKind::Huffman);
        assert!("lz4".parse::<CodecKind>().is_err());
    }
}
