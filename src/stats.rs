//! Compression and decompression statistics
//!
//! The engine computes timings and byte counts and hands them to a
//! `StatisticsSink`; presenting them is the sink's business.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::raster::PIXEL_COUNT;
use crate::CodecKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Compression,
    Decompression,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Compression => f.write_str("COMPRESSION"),
            OperationKind::Decompression => f.write_str("DECOMPRESSION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    pub kind: OperationKind,
    pub codec: CodecKind,
    pub elapsed_millis: u64,
    /// Zero for decompression.
    pub output_bytes: usize,
}

impl OperationStats {
    /// Raster size over output size, when there is an output size.
    pub fn compression_ratio(&self) -> Option<f64> {
        (self.output_bytes > 0).then(|| PIXEL_COUNT as f64 / self.output_bytes as f64)
    }
}

impl fmt::Display for OperationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} STATISTICS ({:?}): Execution Time: {}ms",
            self.kind, self.codec, self.elapsed_millis
        )?;
        if let Some(ratio) = self.compression_ratio() {
            write!(f, ", Compression Ratio: {ratio:.4}")?;
        }
        Ok(())
    }
}

pub trait StatisticsSink: Send + Sync {
    fn report(&self, stats: &OperationStats);
}

/// Default sink: one `tracing` event per operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatistics;

impl StatisticsSink for TracingStatistics {
    fn report(&self, stats: &OperationStats) {
        tracing::info!(
            operation = %stats.kind,
            codec = ?stats.codec,
            elapsed_ms = stats.elapsed_millis,
            output_bytes = stats.output_bytes,
            ratio = stats.compression_ratio(),
            "codec statistics"
        );
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingStatistics {
    records: Mutex<Vec<OperationStats>>,
}

impl RecordingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<OperationStats> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl StatisticsSink for RecordingStatistics {
    fn report(&self, stats: &OperationStats) {
        match self.records.lock() {
            Ok(mut records) => records.push(stats.clone()),
            Err(poisoned) => poisoned.into_inner().push(stats.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(kind: OperationKind, output_bytes: usize) -> OperationStats {
        OperationStats {
            kind,
            codec: CodecKind::RunLength,
            elapsed_millis: 3,
            output_bytes,
        }
    }

    #[test]
    fn test_ratio() {
        let s = stats(OperationKind::Compression, PIXEL_COUNT / 4);
        assert!((s.compression_ratio().unwrap() - 4.0).abs() < 1e-9);
        assert!(stats(OperationKind::Decompression, 0).compression_ratio().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(OperationKind::Decompression.to_string(), "DECOMPRESSION");
        let line = stats(OperationKind::Compression, PIXEL_COUNT).to_string();
        assert!(line.starts_with("COMPRESSION STATISTICS"));
        assert!(line.ends_with("Compression Ratio: 1.0000"));
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingStatistics::new();
        sink.report(&stats(OperationKind::Compression, 10));
        sink.report(&stats(OperationKind::Decompression, 0));
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, OperationKind::Decompression);
    }
}
