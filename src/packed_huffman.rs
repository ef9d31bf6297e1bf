//! Bit-packed Huffman format (`.HBIN`)
//!
//! Uses the same deterministic code table as the text format, but writes real
//! bits. Layout, big-endian bit order:
//! `[count:u16][value:u8, code_len:u8, code bits]*count[pixel codes][pad to byte]`

use std::io::{self, Cursor};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::error::{CodecError, Result};
use crate::huffman;
use crate::raster::{Raster, PIXEL_COUNT};

/// Map an early end of stream to `TruncatedData`, anything else to `Io`.
fn eof_as_truncated(expected: usize, actual: usize) -> impl Fn(io::Error) -> CodecError {
    move |e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::TruncatedData { expected, actual },
        _ => CodecError::Io(e),
    }
}

pub fn compress(raster: &Raster) -> Result<Vec<u8>> {
    let table = huffman::code_table(&raster.histogram());

    let mut lookup: Vec<Vec<bool>> = vec![Vec::new(); 256];
    for (&value, code) in &table {
        lookup[value as usize] = code.bytes().map(|b| b == b'1').collect();
    }

    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    writer.write(16, table.len() as u16)?;
    for (&value, code) in &table {
        writer.write(8, value)?;
        writer.write(8, code.len() as u8)?;
        for &bit in &lookup[value as usize] {
            writer.write_bit(bit)?;
        }
    }
    for &v in raster.pixels() {
        for &bit in &lookup[v as usize] {
            writer.write_bit(bit)?;
        }
    }
    writer.byte_align()?;

    let output = writer.into_writer();
    tracing::debug!(symbols = table.len(), bytes = output.len(), "packed huffman encoded raster");
    Ok(output)
}

#[derive(Default, Clone, Copy)]
struct TrieNode {
    children: [Option<usize>; 2],
    value: Option<u8>,
}

/// Binary trie over the code table, rejecting tables that are not prefix-free.
struct DecodeTrie {
    nodes: Vec<TrieNode>,
}

impl DecodeTrie {
    fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    fn insert(&mut self, code: &[bool], value: u8) -> Result<()> {
        let mut at = 0;
        for &bit in code {
            if self.nodes[at].value.is_some() {
                return Err(CodecError::Format(format!(
                    "code for {value} extends another code"
                )));
            }
            at = match self.nodes[at].children[bit as usize] {
                Some(next) => next,
                None => {
                    self.nodes.push(TrieNode::default());
                    let next = self.nodes.len() - 1;
                    self.nodes[at].children[bit as usize] = Some(next);
                    next
                }
            };
        }
        let node = &mut self.nodes[at];
        if node.value.is_some() || node.children.iter().any(Option::is_some) {
            return Err(CodecError::Format(format!(
                "code for {value} duplicates or prefixes another code"
            )));
        }
        node.value = Some(value);
        Ok(())
    }

    fn decode<R: BitRead>(&self, reader: &mut R, decoded: usize) -> Result<u8> {
        let mut at = 0;
        loop {
            if let Some(value) = self.nodes[at].value {
                return Ok(value);
            }
            let bit = reader
                .read_bit()
                .map_err(eof_as_truncated(PIXEL_COUNT, decoded))?;
            at = self.nodes[at].children[bit as usize].ok_or_else(|| {
                CodecError::Format(format!("pixel {decoded} matches no code"))
            })?;
        }
    }
}

pub fn decompress(data: &[u8]) -> Result<Raster> {
    let mut reader = BitReader::endian(Cursor::new(data), BigEndian);

    let count: u16 = reader.read(16).map_err(eof_as_truncated(2, data.len()))?;
    let count = count as usize;
    if count == 0 || count > 256 {
        return Err(CodecError::Format(format!(
            "entry count {count} outside 1..=256"
        )));
    }

    let mut trie = DecodeTrie::new();
    let mut seen = [false; 256];
    for i in 0..count {
        let truncated = eof_as_truncated(count, i);
        let value: u8 = reader.read(8).map_err(&truncated)?;
        let len: u8 = reader.read(8).map_err(&truncated)?;
        let code = (0..len)
            .map(|_| reader.read_bit())
            .collect::<io::Result<Vec<bool>>>()
            .map_err(&truncated)?;
        if std::mem::replace(&mut seen[value as usize], true) {
            return Err(CodecError::Format(format!("duplicate value {value}")));
        }
        if count > 1 && code.is_empty() {
            return Err(CodecError::Format(format!("empty code for {value}")));
        }
        trie.insert(&code, value)?;
    }

    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for i in 0..PIXEL_COUNT {
        pixels.push(trie.decode(&mut reader, i)?);
    }

    reader.byte_align();
    let consumed = reader.into_reader().position() as usize;
    if consumed < data.len() {
        return Err(CodecError::Overrun(format!(
            "{} bytes after the last pixel",
            data.len() - consumed
        )));
    }
    Raster::from_raw_bytes(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::WIDTH;

    #[test]
    fn test_roundtrip_two_values() {
        let mut raster = Raster::zeros();
        for x in 0..WIDTH {
            raster.set(x, 100, 255);
        }
        let packed = compress(&raster).unwrap();
        // 1 bit per pixel plus a small table
        assert!(packed.len() < PIXEL_COUNT / 8 + 16);
        assert_eq!(decompress(&packed).unwrap(), raster);
    }

    #[test]
    fn test_single_value_has_no_pixel_bits() {
        let raster = Raster::filled(17);
        let packed = compress(&raster).unwrap();
        // count(2) + value(1) + len(1)
        assert_eq!(packed, vec![0, 1, 17, 0]);
        assert_eq!(decompress(&packed).unwrap(), raster);
    }

    #[test]
    fn test_uniform_values_pack_to_one_byte_each() {
        let pixels = (0..PIXEL_COUNT).map(|i| (i % 256) as u8).collect();
        let raster = Raster::from_raw_bytes(pixels).unwrap();
        let packed = compress(&raster).unwrap();
        assert_eq!(packed.len(), 2 + 256 * 3 + PIXEL_COUNT);
        assert_eq!(decompress(&packed).unwrap(), raster);
    }

    #[test]
    fn test_truncated_pixels() {
        let mut raster = Raster::zeros();
        raster.set(0, 0, 9);
        let packed = compress(&raster).unwrap();
        let err = decompress(&packed[..packed.len() / 2]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedData { expected: PIXEL_COUNT, .. }
        ));
    }

    #[test]
    fn test_trailing_bytes_overrun() {
        let mut packed = compress(&Raster::filled(3)).unwrap();
        packed.push(0);
        assert!(matches!(decompress(&packed), Err(CodecError::Overrun(_))));
    }

    #[test]
    fn test_prefix_conflict_rejected() {
        // two entries: value 1 -> "0", value 2 -> "01"
        // bits after the first entry header: 0 | 00000010 | 00000010 | 01
        let data = [0, 2, 1, 1, 0b0000_0001, 0b0000_0001, 0b0010_0000];
        assert!(matches!(decompress(&data), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(matches!(decompress(&[0, 0]), Err(CodecError::Format(_))));
    }
}
