//! Configuration for raster-codec

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::CodecKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    pub rle_extension: String,
    pub bit_plane_extension: String,
    pub huffman_extension: String,
    pub packed_huffman_extension: String,
    pub report_statistics: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            rle_extension: ".RLC".to_string(),
            bit_plane_extension: ".RLCBP".to_string(),
            huffman_extension: ".HCSV".to_string(),
            packed_huffman_extension: ".HBIN".to_string(),
            report_statistics: true,
        }
    }
}

impl CodecConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// File extension used when persisting artifacts of `kind`.
    pub fn extension_for(&self, kind: CodecKind) -> &str {
        match kind {
            CodecKind::RunLength => &self.rle_extension,
            CodecKind::BitPlaneRunLength => &self.bit_plane_extension,
            CodecKind::Huffman => &self.huffman_extension,
            CodecKind::PackedHuffman => &self.packed_huffman_extension,
        }
    }
}
