//! Header structures at the start of the shared region

use std::{mem::size_of, ops::Range};

use crate::{
    error::{RegSyncError, Result},
    registers::NUM_REGISTERS,
};

use super::constants::*;

/// Bookkeeping for one register's slice of the data area
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterMetadata {
    /// Global write counter value at the last write of this register
    pub write_counter: u64,
    /// Number of sentinel-terminated entries
    pub num_entries: u64,
    /// Absolute byte offset of the first entry
    pub offset: u64,
    /// Bytes occupied by the entries
    pub length_used: u64,
    /// Bytes reserved for this register, `>= length_used`
    pub length_available: u64,
}

impl RegisterMetadata {
    /// Byte range holding the entries
    pub fn used_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.length_used as usize
    }

    /// Reserved bytes past the entries
    pub fn slack_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start + self.length_used as usize..start + self.length_available as usize
    }

    fn reserved_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.length_available as usize
    }
}

/// Fixed header at offset 0 of the shared region
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedHeader {
    /// Magic number for validation
    pub magic: u64,
    /// Layout version
    pub version: u64,
    /// Bytes committed to the backing store, header included
    pub size_backed: u64,
    /// Global write counter, bumped by every publish
    pub write_counter: u64,
    /// Bytes of the data area in use, header excluded
    pub length_area_used: u64,
    /// Per-register metadata in slot order
    pub registers: [RegisterMetadata; NUM_REGISTERS],
}

/// Size of the header; the data area starts right after it
pub const HEADER_SIZE: usize = size_of::<SharedHeader>();

impl SharedHeader {
    /// Create the header of a freshly created region
    pub fn new(size_backed: usize) -> Self {
        Self {
            magic: REGSYNC_MAGIC,
            version: LAYOUT_VERSION,
            size_backed: size_backed as u64,
            write_counter: 0,
            length_area_used: 0,
            registers: [RegisterMetadata::default(); NUM_REGISTERS],
        }
    }

    /// Whether no process has initialized the region yet
    pub fn is_blank(&self) -> bool {
        self.magic == 0
    }

    /// Bytes left at the tail of the data area
    pub fn slack(&self) -> usize {
        (self.size_backed as usize)
            .saturating_sub(HEADER_SIZE)
            .saturating_sub(self.length_area_used as usize)
    }

    /// Validate identification and every size/offset invariant.
    ///
    /// `mapped` is the number of bytes this process can address.
    pub fn validate(&self, mapped: usize) -> Result<()> {
        if self.magic != REGSYNC_MAGIC {
            return Err(RegSyncError::layout("invalid magic number"));
        }
        if self.version != LAYOUT_VERSION {
            return Err(RegSyncError::layout(format!(
                "unsupported layout version: {}",
                self.version
            )));
        }

        let size = self.size_backed as usize;
        if size < HEADER_SIZE || size > mapped {
            return Err(RegSyncError::layout(format!(
                "size_backed {} outside [{}, {}]",
                size, HEADER_SIZE, mapped
            )));
        }
        if self.length_area_used as usize > size - HEADER_SIZE {
            return Err(RegSyncError::layout(format!(
                "length_area_used {} exceeds data area of {} bytes",
                self.length_area_used,
                size - HEADER_SIZE
            )));
        }

        for (slot, meta) in self.registers.iter().enumerate() {
            if meta.length_used > meta.length_available {
                return Err(RegSyncError::layout(format!(
                    "register {} uses {} of {} reserved bytes",
                    slot, meta.length_used, meta.length_available
                )));
            }
            if meta.num_entries > meta.length_used {
                return Err(RegSyncError::layout(format!(
                    "register {} claims {} entries in {} bytes",
                    slot, meta.num_entries, meta.length_used
                )));
            }
            if meta.length_available == 0 {
                continue;
            }
            let end = meta.offset.checked_add(meta.length_available);
            if (meta.offset as usize) < HEADER_SIZE || end.map_or(true, |end| end as usize > size) {
                return Err(RegSyncError::layout(format!(
                    "register {} range {}+{} outside data area",
                    slot, meta.offset, meta.length_available
                )));
            }
        }

        for (i, a) in self.registers.iter().enumerate() {
            for (j, b) in self.registers.iter().enumerate().skip(i + 1) {
                if a.length_available == 0 || b.length_available == 0 {
                    continue;
                }
                let (ra, rb) = (a.reserved_range(), b.reserved_range());
                if ra.start < rb.end && rb.start < ra.end {
                    return Err(RegSyncError::layout(format!(
                        "registers {} and {} overlap",
                        i, j
                    )));
                }
            }
        }

        Ok(())
    }
}
