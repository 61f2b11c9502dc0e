//! TON cell and Bag-of-Cells codec
//!
//! A proof's `state_init` arrives as a base64 Bag-of-Cells. This module
//! decodes it into a tree of ordinary cells, computes the standard cell
//! representation hash (which is also how contract addresses are derived),
//! and can serialize cells back for tooling and tests.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum number of data bits in a single cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of child references of a single cell.
pub const MAX_CELL_REFS: usize = 4;

const BOC_MAGIC: u32 = 0xb5ee_9c72;

/// Errors produced while decoding, building or reading cells
#[derive(Error, Debug)]
pub enum CellError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("truncated bag of cells")]
    Truncated,

    #[error("bad bag-of-cells magic: {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported bag of cells: {0}")]
    Unsupported(&'static str),

    #[error("malformed cell: {0}")]
    Malformed(String),

    #[error("cell capacity exceeded: {0}")]
    Capacity(String),
}

pub type ArcCell = Arc<Cell>;

/// An ordinary level-0 cell: up to 1023 data bits and 4 references.
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<ArcCell>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Creates a cell from MSB-first packed bits.
    ///
    /// `data` must hold at least `bit_len` bits; bits past `bit_len` in the
    /// final byte are cleared so equal cells always hash equal.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<ArcCell>) -> Result<Self, CellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::Capacity(format!(
                "{} data bits exceeds the {} bit limit",
                bit_len, MAX_CELL_BITS
            )));
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(CellError::Capacity(format!(
                "{} references exceeds the {} reference limit",
                refs.len(),
                MAX_CELL_REFS
            )));
        }
        let byte_len = (bit_len + 7) / 8;
        if data.len() < byte_len {
            return Err(CellError::Malformed(
                "data shorter than declared bit length".to_string(),
            ));
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            let mask = 0xffu8 << (8 - bit_len % 8);
            if let Some(last) = data.last_mut() {
                *last &= mask;
            }
        }

        let depth = refs.iter().map(|c| c.depth + 1).max().unwrap_or(0);
        let hash = Self::representation_hash(&data, bit_len, &refs);

        Ok(Cell {
            data,
            bit_len,
            refs,
            hash,
            depth,
        })
    }

    /// Parses a base64-encoded Bag-of-Cells holding a single root.
    pub fn from_boc_base64(encoded: &str) -> Result<ArcCell, CellError> {
        Self::from_boc(&BASE64.decode(encoded)?)
    }

    /// Parses a Bag-of-Cells holding a single root.
    pub fn from_boc(bytes: &[u8]) -> Result<ArcCell, CellError> {
        parse_boc(bytes)
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[ArcCell] {
        &self.refs
    }

    /// The cell representation hash, used for code-hash lookups and for
    /// contract address derivation.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn parser(&self) -> CellParser<'_> {
        CellParser {
            cell: self,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// d1/d2 descriptor bytes of an ordinary level-0 cell.
    fn descriptors(&self) -> [u8; 2] {
        let d1 = self.refs.len() as u8;
        let d2 = (self.bit_len / 8 + (self.bit_len + 7) / 8) as u8;
        [d1, d2]
    }

    /// Data bytes with the completion tag applied when not byte-aligned.
    fn tagged_data(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = data.last_mut() {
                *last |= 1 << (7 - rem);
            }
        }
        data
    }

    fn representation_hash(data: &[u8], bit_len: usize, refs: &[ArcCell]) -> [u8; 32] {
        let mut tagged = data.to_vec();
        let rem = bit_len % 8;
        if rem != 0 {
            if let Some(last) = tagged.last_mut() {
                *last |= 1 << (7 - rem);
            }
        }

        let d1 = refs.len() as u8;
        let d2 = (bit_len / 8 + (bit_len + 7) / 8) as u8;

        let mut hasher = Sha256::new();
        hasher.update([d1, d2]);
        hasher.update(&tagged);
        for child in refs {
            hasher.update(child.depth.to_be_bytes());
        }
        for child in refs {
            hasher.update(child.hash);
        }
        hasher.finalize().into()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bit_len", &self.bit_len)
            .field("refs", &self.refs.len())
            .field("hash", &hex::encode(self.hash))
            .finish()
    }
}

/// Sequential bit/reference reader over a cell.
pub struct CellParser<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellParser<'a> {
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        if self.bit_pos >= self.cell.bit_len {
            return Err(CellError::Malformed(
                "read past the end of cell data".to_string(),
            ));
        }
        let byte = self.cell.data[self.bit_pos / 8];
        let bit = byte >> (7 - self.bit_pos % 8) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as a big-endian unsigned integer.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::Malformed(format!(
                "cannot load {} bits into a u64",
                bits
            )));
        }
        let mut value = 0u64;
        for _ in 0..bits {
            value = value << 1 | self.load_bit()? as u64;
        }
        Ok(value)
    }

    /// Reads `bits` bits into MSB-first packed bytes.
    pub fn load_bits(&mut self, bits: usize) -> Result<Vec<u8>, CellError> {
        let mut out = vec![0u8; (bits + 7) / 8];
        for i in 0..bits {
            if self.load_bit()? {
                out[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Ok(out)
    }

    pub fn load_ref(&mut self) -> Result<&'a ArcCell, CellError> {
        let cell = self.cell.refs.get(self.ref_pos).ok_or_else(|| {
            CellError::Malformed("read past the last cell reference".to_string())
        })?;
        self.ref_pos += 1;
        Ok(cell)
    }
}

/// Incremental cell constructor.
#[derive(Default)]
pub struct CellBuilder {
    bits: Vec<bool>,
    refs: Vec<ArcCell>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bit(&mut self, bit: bool) -> &mut Self {
        self.bits.push(bit);
        self
    }

    /// Stores the low `bits` bits of `value`, most significant first.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> &mut Self {
        for i in (0..bits).rev() {
            self.bits.push(value >> i & 1 == 1);
        }
        self
    }

    pub fn store_slice(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.store_uint(*byte as u64, 8);
        }
        self
    }

    pub fn store_ref(&mut self, cell: ArcCell) -> &mut Self {
        self.refs.push(cell);
        self
    }

    pub fn build(&self) -> Result<Cell, CellError> {
        let mut data = vec![0u8; (self.bits.len() + 7) / 8];
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                data[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Cell::new(data, self.bits.len(), self.refs.clone())
    }
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, CellError> {
        let byte = *self.buf.get(self.pos).ok_or(CellError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], CellError> {
        let end = self.pos.checked_add(len).ok_or(CellError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(CellError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    /// Big-endian unsigned integer of `len` bytes, `len` <= 8.
    fn read_be(&mut self, len: usize) -> Result<u64, CellError> {
        let mut value = 0u64;
        for byte in self.read_slice(len)? {
            value = value << 8 | *byte as u64;
        }
        Ok(value)
    }

    fn skip(&mut self, len: usize) -> Result<(), CellError> {
        self.read_slice(len).map(|_| ())
    }
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn parse_boc(bytes: &[u8]) -> Result<ArcCell, CellError> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.read_be(4)? as u32;
    if magic != BOC_MAGIC {
        return Err(CellError::BadMagic(magic));
    }

    let flags = reader.read_u8()?;
    let has_index = flags & 0x80 != 0;
    let has_crc = flags & 0x40 != 0;
    if flags & 0x20 != 0 {
        return Err(CellError::Unsupported("cached cells"));
    }
    if flags & 0x18 != 0 {
        return Err(CellError::Unsupported("reserved flag bits set"));
    }
    let ref_size = (flags & 0x07) as usize;
    if !(1..=4).contains(&ref_size) {
        return Err(CellError::Malformed(format!(
            "reference size {} out of range",
            ref_size
        )));
    }

    let offset_size = reader.read_u8()? as usize;
    if !(1..=8).contains(&offset_size) {
        return Err(CellError::Malformed(format!(
            "offset size {} out of range",
            offset_size
        )));
    }

    let cell_count = reader.read_be(ref_size)? as usize;
    let root_count = reader.read_be(ref_size)? as usize;
    let absent_count = reader.read_be(ref_size)? as usize;
    let _total_size = reader.read_be(offset_size)?;

    if root_count != 1 {
        return Err(CellError::Unsupported("expected exactly one root cell"));
    }
    if absent_count != 0 {
        return Err(CellError::Unsupported("absent cells"));
    }
    if cell_count == 0 {
        return Err(CellError::Malformed("empty cell list".to_string()));
    }

    let root_index = reader.read_be(ref_size)? as usize;
    if root_index >= cell_count {
        return Err(CellError::Malformed("root index out of range".to_string()));
    }

    if has_index {
        reader.skip(cell_count * offset_size)?;
    }

    let mut raw_cells = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        let d1 = reader.read_u8()?;
        if d1 & 0x08 != 0 {
            return Err(CellError::Unsupported("exotic cell"));
        }
        if d1 >> 5 != 0 {
            return Err(CellError::Unsupported("cell with non-zero level"));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_CELL_REFS {
            return Err(CellError::Malformed(format!(
                "cell {} declares {} references",
                i, ref_count
            )));
        }

        let d2 = reader.read_u8()? as usize;
        let byte_len = (d2 + 1) / 2;
        let data = reader.read_slice(byte_len)?.to_vec();
        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            // Odd d2: the final byte carries a completion tag (lowest set bit).
            let last = *data
                .last()
                .ok_or_else(|| CellError::Malformed("empty partial byte".to_string()))?;
            if last == 0 {
                return Err(CellError::Malformed("missing completion tag".to_string()));
            }
            byte_len * 8 - last.trailing_zeros() as usize - 1
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let index = reader.read_be(ref_size)? as usize;
            if index <= i || index >= cell_count {
                return Err(CellError::Malformed(format!(
                    "cell {} references {} out of order",
                    i, index
                )));
            }
            refs.push(index);
        }

        raw_cells.push(RawCell {
            data,
            bit_len,
            refs,
        });
    }

    if has_crc {
        reader.skip(4)?;
    }

    // References only point forward, so building back-to-front resolves them.
    let mut cells: Vec<Option<ArcCell>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let raw = &raw_cells[i];
        let mut refs = Vec::with_capacity(raw.refs.len());
        for &child in &raw.refs {
            refs.push(cells[child].clone().ok_or_else(|| {
                CellError::Malformed("unresolved cell reference".to_string())
            })?);
        }
        let cell = Cell::new(raw.data.clone(), raw.bit_len, refs)?;
        cells[i] = Some(Arc::new(cell));
    }

    cells[root_index]
        .clone()
        .ok_or_else(|| CellError::Malformed("root cell missing".to_string()))
}

/// Serializes a cell tree as a Bag-of-Cells (no index, no checksum).
pub fn serialize_boc(root: &ArcCell) -> Vec<u8> {
    struct Entry {
        cell: ArcCell,
        refs: Vec<usize>,
    }

    // Preorder traversal; every reference points at a later index.
    fn collect(cell: &ArcCell, out: &mut Vec<Entry>) -> usize {
        let index = out.len();
        out.push(Entry {
            cell: cell.clone(),
            refs: Vec::new(),
        });
        let children: Vec<usize> = cell.refs().iter().map(|c| collect(c, out)).collect();
        out[index].refs = children;
        index
    }

    let mut entries = Vec::new();
    collect(root, &mut entries);

    let ref_size = byte_width(entries.len() as u64);

    let mut body = Vec::new();
    for entry in &entries {
        let [d1, d2] = entry.cell.descriptors();
        body.push(d1);
        body.push(d2);
        body.extend_from_slice(&entry.cell.tagged_data());
        for &child in &entry.refs {
            body.extend_from_slice(&be_bytes(child as u64, ref_size));
        }
    }

    let offset_size = byte_width(body.len() as u64);

    let mut out = Vec::with_capacity(body.len() + 16);
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
    out.push(ref_size as u8);
    out.push(offset_size as u8);
    out.extend_from_slice(&be_bytes(entries.len() as u64, ref_size));
    out.extend_from_slice(&be_bytes(1, ref_size));
    out.extend_from_slice(&be_bytes(0, ref_size));
    out.extend_from_slice(&be_bytes(body.len() as u64, offset_size));
    out.extend_from_slice(&be_bytes(0, ref_size));
    out.extend_from_slice(&body);
    out
}

/// Serializes a cell tree as a base64 Bag-of-Cells.
pub fn boc_base64(root: &ArcCell) -> String {
    BASE64.encode(serialize_boc(root))
}

fn byte_width(value: u64) -> usize {
    let mut width = 1;
    while value >> (width * 8) != 0 {
        width += 1;
    }
    width
}

fn be_bytes(value: u64, width: usize) -> Vec<u8> {
    value.to_be_bytes()[8 - width..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cell() -> ArcCell {
        Arc::new(CellBuilder::new().build().unwrap())
    }

    #[test]
    fn test_empty_cell_hash() {
        // Known vector: the representation of an empty cell is 0x0000.
        assert_eq!(
            hex::encode(empty_cell().hash()),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn test_depth() {
        let leaf = empty_cell();
        let mid = Arc::new(
            CellBuilder::new()
                .store_uint(1, 8)
                .store_ref(leaf.clone())
                .build()
                .unwrap(),
        );
        let root = Arc::new(
            CellBuilder::new()
                .store_ref(mid)
                .store_ref(leaf)
                .build()
                .unwrap(),
        );
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_builder_bit_len() {
        let cell = CellBuilder::new().store_uint(0b10110, 5).build().unwrap();
        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.data(), &[0b1011_0000]);
    }

    #[test]
    fn test_parser_reads_across_byte_boundaries() {
        let cell = CellBuilder::new()
            .store_uint(0b101, 3)
            .store_uint(0xabcd, 16)
            .build()
            .unwrap();
        let mut parser = cell.parser();
        assert_eq!(parser.load_uint(3).unwrap(), 0b101);
        assert_eq!(parser.load_uint(16).unwrap(), 0xabcd);
        assert_eq!(parser.remaining_bits(), 0);
        assert!(parser.load_bit().is_err());
    }

    #[test]
    fn test_load_bits_repacks_unaligned_bytes() {
        let cell = CellBuilder::new()
            .store_bit(true)
            .store_slice(&[0x12, 0x34])
            .build()
            .unwrap();
        let mut parser = cell.parser();
        parser.load_bit().unwrap();
        assert_eq!(parser.load_bits(16).unwrap(), vec![0x12, 0x34]);
    }

    #[test]
    fn test_boc_round_trip() {
        let leaf = Arc::new(CellBuilder::new().store_uint(0x55, 8).build().unwrap());
        let root = Arc::new(
            CellBuilder::new()
                .store_uint(0b1101, 4)
                .store_ref(leaf.clone())
                .store_ref(leaf)
                .build()
                .unwrap(),
        );

        let parsed = Cell::from_boc(&serialize_boc(&root)).unwrap();
        assert_eq!(parsed.hash(), root.hash());
        assert_eq!(parsed.bit_len(), 4);
        assert_eq!(parsed.refs().len(), 2);
        assert_eq!(parsed.refs()[0].data(), &[0x55]);
    }

    #[test]
    fn test_boc_base64_round_trip() {
        let root = Arc::new(CellBuilder::new().store_uint(7, 21).build().unwrap());
        let parsed = Cell::from_boc_base64(&boc_base64(&root)).unwrap();
        assert_eq!(parsed.hash(), root.hash());
        assert_eq!(parsed.bit_len(), 21);
    }

    #[test]
    fn test_hash_changes_with_single_bit() {
        let a = CellBuilder::new().store_uint(0, 16).build().unwrap();
        let b = CellBuilder::new().store_uint(1, 16).build().unwrap();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = serialize_boc(&empty_cell());
        bytes[0] ^= 0xff;
        assert!(matches!(
            Cell::from_boc(&bytes),
            Err(CellError::BadMagic(_))
        ));
    }

    #[test]
    fn test_truncated_rejected() {
        let root = Arc::new(CellBuilder::new().store_uint(9, 32).build().unwrap());
        let bytes = serialize_boc(&root);
        assert!(matches!(
            Cell::from_boc(&bytes[..bytes.len() - 2]),
            Err(CellError::Truncated)
        ));
    }

    #[test]
    fn test_exotic_cell_rejected() {
        // Header is 11 bytes for a single-byte ref/offset layout; the first
        // cell's d1 descriptor follows directly.
        let root = Arc::new(CellBuilder::new().store_uint(1, 8).build().unwrap());
        let mut bytes = serialize_boc(&root);
        bytes[11] |= 0x08;
        assert!(matches!(
            Cell::from_boc(&bytes),
            Err(CellError::Unsupported("exotic cell"))
        ));
    }

    #[test]
    fn test_garbage_base64_rejected() {
        assert!(matches!(
            Cell::from_boc_base64("not!!base64"),
            Err(CellError::Base64(_))
        ));
    }

    #[test]
    fn test_capacity_limits() {
        let mut builder = CellBuilder::new();
        builder.store_slice(&[0u8; 128]);
        assert!(matches!(builder.build(), Err(CellError::Capacity(_))));

        let leaf = empty_cell();
        let mut builder = CellBuilder::new();
        for _ in 0..5 {
            builder.store_ref(leaf.clone());
        }
        assert!(matches!(builder.build(), Err(CellError::Capacity(_))));
    }
}
