//! Growth and shrink policy for publishing registers
//!
//! Kept free of I/O so that resize decisions can be checked directly.

use crate::{
    layout::{SharedHeader, HEADER_SIZE},
    registers::NUM_REGISTERS,
};

/// How a publish lays registers out in the data area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPlan {
    /// Registers that outgrew their reservation move to the tail of the used
    /// area; all others are rewritten where they are
    Incremental,
    /// Lay every register out back to back without resizing
    Rewrite,
    /// Double the allocation until everything fits, then lay out back to back
    Grow { new_size: usize },
    /// Halve the allocation, then lay out back to back
    Shrink { new_size: usize },
}

impl PublishPlan {
    /// Size the region must be resized to first, if any
    pub fn resize_to(&self) -> Option<usize> {
        match *self {
            Self::Grow { new_size } | Self::Shrink { new_size } => Some(new_size),
            Self::Incremental | Self::Rewrite => None,
        }
    }

    /// Whether every register is relocated from the start of the data area
    pub fn is_full_rewrite(&self) -> bool {
        !matches!(self, Self::Incremental)
    }
}

/// Serialized sizes of all registers about to be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    /// Bytes each register needs, sentinels included
    pub sizes: [usize; NUM_REGISTERS],
    /// Sum of all sizes
    pub total: usize,
    /// Sum of sizes of registers that no longer fit their reservation
    pub overflow: usize,
}

impl SizeReport {
    /// Compare the wanted sizes with the current reservations
    pub fn new(sizes: [usize; NUM_REGISTERS], header: &SharedHeader) -> Self {
        let total = sizes.iter().sum();
        let overflow = sizes
            .iter()
            .zip(header.registers.iter())
            .filter(|(&size, meta)| size as u64 > meta.length_available)
            .map(|(&size, _)| size)
            .sum();
        Self {
            sizes,
            total,
            overflow,
        }
    }

    /// Whether register `slot` must move to the tail
    pub fn overflows(&self, slot: usize, header: &SharedHeader) -> bool {
        self.sizes[slot] as u64 > header.registers[slot].length_available
    }
}

/// Decide how to publish.
///
/// `force_rewrite` lays everything out from scratch (growing if needed) even
/// when the overflow would fit into the slack; used to initialize a region.
pub fn plan_publish(
    header: &SharedHeader,
    report: &SizeReport,
    initial_size: usize,
    force_rewrite: bool,
) -> PublishPlan {
    let size_backed = header.size_backed as usize;

    if !force_rewrite && report.overflow <= header.slack() {
        let halved = size_backed / 2;
        if report.total < halved.saturating_sub(HEADER_SIZE) && size_backed > initial_size {
            return PublishPlan::Shrink { new_size: halved };
        }
        return PublishPlan::Incremental;
    }

    let mut new_size = size_backed.max(HEADER_SIZE);
    while report.total > new_size - HEADER_SIZE {
        new_size = new_size.saturating_mul(2);
        if new_size == usize::MAX {
            break;
        }
    }

    if new_size == size_backed {
        PublishPlan::Rewrite
    } else {
        PublishPlan::Grow { new_size }
    }
}
