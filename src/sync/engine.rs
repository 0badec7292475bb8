//! Publish and refresh of registers through the shared layout
//!
//! Every method takes a [`MutexGuard`] as proof that the caller holds the
//! session mutex for the whole call.

use log::{debug, info, trace};

use crate::{
    config::SyncConfig,
    error::Result,
    layout::{SharedHeader, SharedLayout, HEADER_SIZE},
    memory::{MutexGuard, SharedRegion},
    registers::{RegisterStore, NUM_REGISTERS},
};

use super::plan::{plan_publish, PublishPlan, SizeReport};

/// Per-session synchronization state
#[derive(Debug, Default, Clone)]
pub struct SyncEngine {
    local_write_counter: u64,
}

impl SyncEngine {
    /// Create an engine that has seen no shared writes yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Global write counter as of this process's last publish or refresh
    pub fn local_write_counter(&self) -> u64 {
        self.local_write_counter
    }

    /// Whether the region still lacks a header
    pub fn is_blank(&self, _guard: &MutexGuard<'_>, region: &SharedRegion) -> Result<bool> {
        let header = SharedLayout::new(region.as_slice()).read_header_raw()?;
        Ok(header.is_blank())
    }

    /// Bring the mapping in line with the committed size and return the
    /// validated header
    pub fn attach(&self, _guard: &MutexGuard<'_>, region: &mut SharedRegion) -> Result<SharedHeader> {
        let raw = SharedLayout::new(region.as_slice()).read_header_raw()?;
        let size_backed = raw.size_backed as usize;
        if size_backed >= HEADER_SIZE && size_backed != region.len() {
            trace!("Following resize from {} to {} bytes", region.len(), size_backed);
            region.remap(size_backed)?;
        }
        SharedLayout::new(region.as_slice()).read_header()
    }

    /// Write a fresh header and lay out the local table from scratch
    pub fn initialize(
        &mut self,
        guard: &MutexGuard<'_>,
        region: &mut SharedRegion,
        store: &RegisterStore,
        config: &SyncConfig,
    ) -> Result<PublishPlan> {
        if region.len() != config.initial_size {
            region.resize(config.initial_size)?;
        }
        let header = SharedHeader::new(config.initial_size);
        SharedLayout::new(region.as_mut_slice()).write_header(&header)?;
        self.local_write_counter = header.write_counter;

        self.publish_inner(guard, region, store, config, true)
    }

    /// Serialize every register into the shared region
    pub fn publish(
        &mut self,
        guard: &MutexGuard<'_>,
        region: &mut SharedRegion,
        store: &RegisterStore,
        config: &SyncConfig,
    ) -> Result<PublishPlan> {
        self.publish_inner(guard, region, store, config, false)
    }

    fn publish_inner(
        &mut self,
        guard: &MutexGuard<'_>,
        region: &mut SharedRegion,
        store: &RegisterStore,
        config: &SyncConfig,
        force_rewrite: bool,
    ) -> Result<PublishPlan> {
        let mut header = self.attach(guard, region)?;

        header.write_counter += 1;
        self.local_write_counter = header.write_counter;

        let sizes: [usize; NUM_REGISTERS] = std::array::from_fn(|slot| store.slot(slot).serialized_size());
        let report = SizeReport::new(sizes, &header);
        let plan = plan_publish(&header, &report, config.initial_size, force_rewrite);
        trace!(
            "Publishing {} bytes ({} overflowing) as {:?}",
            report.total,
            report.overflow,
            plan
        );

        if let Some(new_size) = plan.resize_to() {
            info!(
                "Resizing shared registers from {} to {} bytes",
                header.size_backed, new_size
            );
            region.resize(new_size)?;
            header.size_backed = new_size as u64;
            SharedLayout::new(region.as_mut_slice()).write_header(&header)?;
        }

        let mut layout = SharedLayout::new(region.as_mut_slice());
        let mut offset = if plan.is_full_rewrite() {
            HEADER_SIZE
        } else {
            HEADER_SIZE + header.length_area_used as usize
        };

        for slot in 0..NUM_REGISTERS {
            if plan.is_full_rewrite() || report.overflows(slot, &header) {
                offset = self.store_register(&mut layout, &mut header, store, slot, offset, true)?;
            } else {
                let in_place = header.registers[slot].offset as usize;
                self.store_register(&mut layout, &mut header, store, slot, in_place, false)?;
            }
        }
        header.length_area_used = (offset - HEADER_SIZE) as u64;

        layout.write_header(&header)?;
        Ok(plan)
    }

    /// Write one register at `offset` and update its metadata.
    ///
    /// A relocated register gets a reservation of exactly its size; one
    /// written in place keeps its reservation. Returns the end offset.
    fn store_register(
        &self,
        layout: &mut SharedLayout<&mut [u8]>,
        header: &mut SharedHeader,
        store: &RegisterStore,
        slot: usize,
        offset: usize,
        relocate: bool,
    ) -> Result<usize> {
        let reg = store.slot(slot);
        let written = layout.write_entries(offset, reg.files())?;

        let meta = &mut header.registers[slot];
        meta.write_counter = self.local_write_counter;
        meta.num_entries = reg.len() as u64;
        meta.offset = offset as u64;
        meta.length_used = written as u64;
        if relocate {
            meta.length_available = meta.length_used;
        }
        Ok(offset + written)
    }

    /// Load registers other processes wrote since our last sync.
    ///
    /// Local registers are replaced only after every changed register has
    /// been read successfully. Returns the number of registers replaced.
    pub fn refresh(
        &mut self,
        guard: &MutexGuard<'_>,
        region: &mut SharedRegion,
        store: &mut RegisterStore,
    ) -> Result<usize> {
        let header = self.attach(guard, region)?;
        if header.write_counter == self.local_write_counter {
            return Ok(0);
        }

        // A counter behind ours means the region was recreated: reload all.
        let seen = if header.write_counter < self.local_write_counter {
            debug!(
                "Shared write counter went back from {} to {}",
                self.local_write_counter, header.write_counter
            );
            0
        } else {
            self.local_write_counter
        };

        let layout = SharedLayout::new(region.as_slice());
        let mut changed = Vec::new();
        for (slot, meta) in header.registers.iter().enumerate() {
            if meta.write_counter > seen {
                changed.push((slot, layout.read_entries(meta)?));
            }
        }

        let count = changed.len();
        for (slot, entries) in changed {
            store.replace_slot(slot, entries);
        }
        self.local_write_counter = header.write_counter;

        debug!(
            "Refreshed {} registers up to write counter {}",
            count, self.local_write_counter
        );
        Ok(count)
    }
}
