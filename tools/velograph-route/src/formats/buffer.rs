//! Read-only byte buffers backing the record decoders

use std::fmt;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;
use velograph_common::Result;

/// Bytes of one dataset file: either memory-mapped or owned.
pub enum Buffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    /// Memory-map `path` read-only. Empty files become an empty owned buffer
    /// since zero-length mappings are rejected on some platforms.
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Buffer::Owned(Vec::new()));
        }
        // SAFETY: dataset files are treated as immutable while a graph is
        // loaded; modifying them underneath a running process is unsupported.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Buffer::Mapped(mmap))
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Buffer::Mapped(mmap) => mmap,
            Buffer::Owned(bytes) => bytes,
        }
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer::Owned(bytes)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Buffer::Mapped(_) => "Mapped",
            Buffer::Owned(_) => "Owned",
        };
        f.debug_struct("Buffer")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

#[inline]
pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[inline]
pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(word)
}
