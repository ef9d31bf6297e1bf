//! Huffman coding with a self-describing text artifact (`.HCSV`)
//!
//! The artifact is a transcript, not a bit stream:
//!
//! ```text
//! N
//! <code>,<value>      (N rows, ascending value)
//! <code>,<code>,...   (HEIGHT rows of WIDTH tokens)
//! ```
//!
//! Tree construction is deterministic: among nodes of equal frequency the one
//! created first leaves the queue first, leaves being created in ascending
//! value order and internal nodes after them as they are formed.

use crate::error::{CodecError, Result};
use crate::raster::{Raster, HEIGHT, PIXEL_COUNT, WIDTH};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

#[derive(Debug)]
pub enum HuffNode {
    Leaf {
        value: u8,
        frequency: u32,
    },
    Internal {
        left: Box<HuffNode>,
        right: Box<HuffNode>,
        frequency: u32,
    },
}

impl HuffNode {
    pub fn frequency(&self) -> u32 {
        match self {
            HuffNode::Leaf { frequency, .. } | HuffNode::Internal { frequency, .. } => *frequency,
        }
    }
}

/// Intensity value to code string (`'0'`/`'1'` characters, root to leaf).
pub type CodeTable = BTreeMap<u8, String>;

/// Build the Huffman tree for a histogram. Returns `None` when every count is zero.
pub fn build_tree(histogram: &[u32; 256]) -> Option<HuffNode> {
    // Queue entries are (frequency, creation index); the index doubles as the
    // slot holding the node, so ties resolve first-created, first-removed.
    let mut slots: Vec<Option<HuffNode>> = Vec::new();
    let mut heap = BinaryHeap::new();

    for (value, &frequency) in histogram.iter().enumerate() {
        if frequency > 0 {
            heap.push(Reverse((frequency, slots.len())));
            slots.push(Some(HuffNode::Leaf {
                value: value as u8,
                frequency,
            }));
        }
    }

    while heap.len() > 1 {
        let Reverse((_, l)) = heap.pop()?;
        let Reverse((_, r)) = heap.pop()?;
        let left = slots[l].take()?;
        let right = slots[r].take()?;
        let frequency = left.frequency() + right.frequency();
        heap.push(Reverse((frequency, slots.len())));
        slots.push(Some(HuffNode::Internal {
            left: Box::new(left),
            right: Box::new(right),
            frequency,
        }));
    }

    let Reverse((_, root)) = heap.pop()?;
    slots[root].take()
}

fn collect_codes(node: &HuffNode, prefix: &mut String, codes: &mut CodeTable) {
    match node {
        HuffNode::Leaf { value, .. } => {
            codes.insert(*value, prefix.clone());
        }
        HuffNode::Internal { left, right, .. } => {
            prefix.push('0');
            collect_codes(left, prefix, codes);
            prefix.pop();
            prefix.push('1');
            collect_codes(right, prefix, codes);
            prefix.pop();
        }
    }
}

/// Derive the code table of a tree. A lone leaf gets the empty code.
pub fn derive_codes(root: &HuffNode) -> CodeTable {
    let mut codes = CodeTable::new();
    collect_codes(root, &mut String::new(), &mut codes);
    codes
}

/// Code table for a histogram; empty when the histogram is empty.
pub fn code_table(histogram: &[u32; 256]) -> CodeTable {
    build_tree(histogram)
        .map(|root| derive_codes(&root))
        .unwrap_or_default()
}

/// Theoretical compressed size: every symbol occurrence costs its code length
/// rounded up to whole bytes.
pub fn estimated_size(table: &CodeTable, histogram: &[u32; 256]) -> usize {
    table
        .iter()
        .map(|(&value, code)| (code.len() + 7) / 8 * histogram[value as usize] as usize)
        .sum()
}

/// Result of a Huffman compression.
#[derive(Debug, Clone)]
pub struct HuffmanOutput {
    pub artifact: String,
    pub table: CodeTable,
    /// Byte count used for statistics instead of the artifact length.
    pub estimated_bytes: usize,
}

pub fn compress(raster: &Raster) -> Result<HuffmanOutput> {
    let histogram = raster.histogram();
    let table = code_table(&histogram);

    let mut lookup = vec![""; 256];
    for (&value, code) in &table {
        lookup[value as usize] = code.as_str();
    }

    let longest = table.values().map(String::len).max().unwrap_or(0);
    let mut artifact = String::with_capacity(PIXEL_COUNT * (longest + 1) + table.len() * 12);
    artifact.push_str(&table.len().to_string());
    for (&value, code) in &table {
        artifact.push('\n');
        artifact.push_str(code);
        artifact.push(',');
        artifact.push_str(&value.to_string());
    }
    for y in 0..HEIGHT {
        artifact.push('\n');
        for (x, &v) in raster.row(y).iter().enumerate() {
            if x > 0 {
                artifact.push(',');
            }
            artifact.push_str(lookup[v as usize]);
        }
    }

    let estimated_bytes = estimated_size(&table, &histogram);
    tracing::debug!(
        symbols = table.len(),
        longest_code = longest,
        estimated_bytes,
        "huffman encoded raster"
    );
    Ok(HuffmanOutput {
        artifact,
        table,
        estimated_bytes,
    })
}

/// Plain decimal digits only; `str::parse` alone would also take a leading `+`.
fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_table_row(index: usize, line: &str) -> Result<(&str, u8)> {
    let (code, value) = line
        .split_once(',')
        .ok_or_else(|| CodecError::Format(format!("table row {index} has no separator")))?;
    let code = code.trim();
    if !code.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(CodecError::Format(format!(
            "table row {index} has non-binary code {code:?}"
        )));
    }
    let value = value.trim();
    let value = parse_decimal::<u8>(value).ok_or_else(|| {
        CodecError::Format(format!("table row {index} has bad value {value:?}"))
    })?;
    Ok((code, value))
}

pub fn decompress(artifact: &str) -> Result<Raster> {
    let mut lines = artifact.lines().map(str::trim);

    let count_line = lines.next().ok_or(CodecError::TruncatedData {
        expected: 1,
        actual: 0,
    })?;
    let count = parse_decimal::<usize>(count_line)
        .ok_or_else(|| CodecError::Format(format!("bad record count {count_line:?}")))?;
    if count == 0 || count > 256 {
        return Err(CodecError::Format(format!(
            "record count {count} outside 1..=256"
        )));
    }

    let mut inverse: HashMap<&str, u8> = HashMap::with_capacity(count);
    let mut seen = [false; 256];
    for i in 0..count {
        let line = lines.next().ok_or(CodecError::TruncatedData {
            expected: count,
            actual: i,
        })?;
        let (code, value) = parse_table_row(i, line)?;
        if inverse.insert(code, value).is_some() {
            return Err(CodecError::Format(format!("duplicate code {code:?}")));
        }
        if std::mem::replace(&mut seen[value as usize], true) {
            return Err(CodecError::Format(format!("duplicate value {value}")));
        }
    }

    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for y in 0..HEIGHT {
        let line = lines.next().ok_or(CodecError::TruncatedData {
            expected: HEIGHT,
            actual: y,
        })?;
        let row_start = pixels.len();
        for token in line.split(',') {
            if pixels.len() - row_start == WIDTH {
                return Err(CodecError::Overrun(format!(
                    "row {y} has more than {WIDTH} tokens"
                )));
            }
            let value = inverse
                .get(token.trim())
                .ok_or_else(|| CodecError::Format(format!("row {y}: unknown code {token:?}")))?;
            pixels.push(*value);
        }
        let tokens = pixels.len() - row_start;
        if tokens < WIDTH {
            return Err(CodecError::TruncatedData {
                expected: WIDTH,
                actual: tokens,
            });
        }
    }

    if lines.any(|l| !l.is_empty()) {
        return Err(CodecError::Overrun(format!(
            "content after {HEIGHT} image rows"
        )));
    }
    Raster::from_raw_bytes(pixels)
}
