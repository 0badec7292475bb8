//! Bounds-checked view of a mapped register region

use std::ptr;

use crate::error::{RegSyncError, Result};

use super::{
    constants::ENTRY_SENTINEL,
    headers::{RegisterMetadata, SharedHeader, HEADER_SIZE},
};

/// Typed accessors over the raw bytes of a register region.
///
/// Every access is checked against the length of the underlying slice, which
/// callers keep equal to the committed `size_backed`.
pub struct SharedLayout<B> {
    bytes: B,
}

impl<B: AsRef<[u8]>> SharedLayout<B> {
    /// Wrap a mapped region
    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    /// Number of addressable bytes
    pub fn len(&self) -> usize {
        self.bytes.as_ref().len()
    }

    /// Whether the region is too small to hold even an empty byte
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the header out of the region without validating it
    pub fn read_header_raw(&self) -> Result<SharedHeader> {
        let bytes = self.bytes.as_ref();
        if bytes.len() < HEADER_SIZE {
            return Err(RegSyncError::layout(format!(
                "region of {} bytes cannot hold a {} byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        // SAFETY: the slice holds at least HEADER_SIZE bytes and SharedHeader
        // consists of u64 fields only, so every bit pattern is a valid value.
        Ok(unsafe { ptr::read_unaligned(bytes.as_ptr() as *const SharedHeader) })
    }

    /// Copy the header out of the region and validate it
    pub fn read_header(&self) -> Result<SharedHeader> {
        let header = self.read_header_raw()?;
        header.validate(self.len())?;
        Ok(header)
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let bytes = self.bytes.as_ref();
        offset
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .map(|end| &bytes[offset..end])
            .ok_or_else(|| {
                RegSyncError::layout(format!(
                    "read of {} bytes at {} exceeds region of {} bytes",
                    len,
                    offset,
                    bytes.len()
                ))
            })
    }

    /// Decode the entries of one register
    pub fn read_entries(&self, meta: &RegisterMetadata) -> Result<Vec<String>> {
        let area = self.bytes_at(meta.offset as usize, meta.length_used as usize)?;
        let mut entries = Vec::with_capacity((meta.num_entries as usize).min(area.len()));
        let mut rest = area;

        for _ in 0..meta.num_entries {
            let end = rest
                .iter()
                .position(|&byte| byte == ENTRY_SENTINEL)
                .ok_or_else(|| RegSyncError::layout("unterminated register entry"))?;
            let entry = std::str::from_utf8(&rest[..end])
                .map_err(|e| RegSyncError::layout(format!("register entry is not UTF-8: {}", e)))?;
            entries.push(entry.to_string());
            rest = &rest[end + 1..];
        }

        if !rest.is_empty() {
            return Err(RegSyncError::layout(format!(
                "{} trailing bytes after {} entries",
                rest.len(),
                meta.num_entries
            )));
        }
        Ok(entries)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SharedLayout<B> {
    /// Store the header at the start of the region
    pub fn write_header(&mut self, header: &SharedHeader) -> Result<()> {
        let bytes = self.bytes.as_mut();
        if bytes.len() < HEADER_SIZE {
            return Err(RegSyncError::layout("region too small for header"));
        }
        // SAFETY: bounds checked above; write_unaligned has no alignment needs.
        unsafe { ptr::write_unaligned(bytes.as_mut_ptr() as *mut SharedHeader, *header) };
        Ok(())
    }

    /// Write entries back to back starting at `offset`, each followed by the
    /// sentinel. Returns the number of bytes written.
    pub fn write_entries<'e, I>(&mut self, offset: usize, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'e str>,
    {
        let bytes = self.bytes.as_mut();
        let mut cursor = offset;
        for entry in entries {
            let end = cursor
                .checked_add(entry.len() + 1)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| {
                    RegSyncError::layout(format!(
                        "write of {} bytes at {} exceeds region of {} bytes",
                        entry.len() + 1,
                        cursor,
                        bytes.len()
                    ))
                })?;
            bytes[cursor..end - 1].copy_from_slice(entry.as_bytes());
            bytes[end - 1] = ENTRY_SENTINEL;
            cursor = end;
        }
        Ok(cursor - offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(size: usize) -> SharedLayout<Vec<u8>> {
        let mut layout = SharedLayout::new(vec![0u8; size]);
        layout.write_header(&SharedHeader::new(size)).unwrap();
        layout
    }

    #[test]
    fn test_header_survives_write() {
        let mut layout = region(4096);
        let mut header = layout.read_header().unwrap();
        header.write_counter = 42;
        layout.write_header(&header).unwrap();
        assert_eq!(layout.read_header().unwrap().write_counter, 42);
    }

    #[test]
    fn test_entries_are_sentinel_terminated() {
        let mut layout = region(4096);
        let written = layout
            .write_entries(HEADER_SIZE, ["/tmp/a", "/b"])
            .unwrap();
        assert_eq!(written, 10);
        assert_eq!(layout.bytes_at(HEADER_SIZE, 10).unwrap(), b"/tmp/a\0/b\0");

        let meta = RegisterMetadata {
            write_counter: 1,
            num_entries: 2,
            offset: HEADER_SIZE as u64,
            length_used: 10,
            length_available: 10,
        };
        assert_eq!(layout.read_entries(&meta).unwrap(), ["/tmp/a", "/b"]);
    }

    #[test]
    fn test_write_past_end_fails() {
        let mut layout = region(HEADER_SIZE + 4);
        assert!(layout.write_entries(HEADER_SIZE, ["/abcd"]).is_err());
        assert_eq!(layout.write_entries(HEADER_SIZE, ["/ab"]).unwrap(), 4);
    }

    #[test]
    fn test_read_rejects_inconsistent_metadata() {
        let mut layout = region(4096);
        layout.write_entries(HEADER_SIZE, ["/a"]).unwrap();

        let mut meta = RegisterMetadata {
            write_counter: 1,
            num_entries: 2,
            offset: HEADER_SIZE as u64,
            length_used: 3,
            length_available: 3,
        };
        assert!(layout.read_entries(&meta).is_err());

        meta.num_entries = 0;
        assert!(layout.read_entries(&meta).is_err());

        meta.num_entries = 1;
        meta.offset = 5000;
        assert!(layout.read_entries(&meta).is_err());
    }

    #[test]
    fn test_small_region_has_no_header() {
        let layout = SharedLayout::new(vec![0u8; 16]);
        assert!(layout.read_header_raw().is_err());
    }
}
