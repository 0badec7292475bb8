//! Per-process table of registers

use std::path::Path;

use log::debug;

use crate::error::{RegSyncError, Result};

use super::{
    name::{self, BLACKHOLE, NUM_REGISTERS, STORAGE_NAMES, UNNAMED, UNNAMED_SLOT},
    paths::{abbreviate_home, home_dir, is_under, paths_equal},
    register::{Register, ENTRY_SENTINEL},
};

/// The authoritative, process-local register table.
///
/// Holds one [`Register`] per storage slot. Not synchronized: it is meant to
/// be driven from the host application's single control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterStore {
    registers: [Register; NUM_REGISTERS],
}

impl RegisterStore {
    /// Create a table with every register empty
    pub fn new() -> Self {
        Self {
            registers: std::array::from_fn(|slot| Register::new(STORAGE_NAMES[slot])),
        }
    }

    /// Whether `name` is a valid register name, uppercase aliases included
    pub fn exists(&self, name: char) -> bool {
        name::is_valid(name)
    }

    /// Look up a storage-backed register; uppercase aliases miss
    pub fn find(&self, name: char) -> Option<&Register> {
        name::slot_of(name).map(|slot| &self.registers[slot])
    }

    fn find_mut(&mut self, name: char) -> Option<&mut Register> {
        name::slot_of(name).map(move |slot| &mut self.registers[slot])
    }

    /// Append `path` to a register.
    ///
    /// Returns `false` for names without storage, for duplicates and for
    /// paths that cannot be represented in the shared area.
    pub fn append(&mut self, name: char, path: &str) -> bool {
        self.try_append(name, path).is_ok()
    }

    /// Like [`RegisterStore::append`] but reports why the path was refused
    pub fn try_append(&mut self, name: char, path: &str) -> Result<()> {
        if name == BLACKHOLE {
            return Ok(());
        }

        let reg = self
            .find_mut(name)
            .ok_or_else(|| RegSyncError::invalid_register(name, "register has no storage"))?;

        if path.contains(ENTRY_SENTINEL) {
            return Err(RegSyncError::invalid_register(name, "path contains a NUL byte"));
        }
        if reg.contains(path) {
            return Err(RegSyncError::invalid_register(
                name,
                format!("'{}' is already stored", path),
            ));
        }

        reg.push(path.to_string());
        Ok(())
    }

    /// Remove every entry of a register
    pub fn clear(&mut self, name: char) {
        if let Some(reg) = self.find_mut(name) {
            reg.clear();
        }
    }

    /// Clear all registers
    pub fn reset(&mut self) {
        for reg in self.registers.iter_mut() {
            reg.clear();
        }
    }

    /// Tombstone an entry ahead of a [`RegisterStore::pack`]
    pub fn tombstone(&mut self, name: char, index: usize) -> Option<String> {
        self.find_mut(name).and_then(|reg| reg.tombstone(index))
    }

    /// Drop tombstoned entries of a register, preserving order
    pub fn pack(&mut self, name: char) {
        if let Some(reg) = self.find_mut(name) {
            reg.pack();
        }
    }

    /// List registers named in `names`, in that order.
    ///
    /// Each nonempty register contributes a `"<name>` header followed by its
    /// entries, most recent first.
    pub fn list(&self, names: &str) -> Vec<String> {
        let mut list = Vec::new();
        for reg in names.chars().filter_map(|name| self.find(name)) {
            if reg.is_empty() {
                continue;
            }
            list.push(format!("\"{}", reg.name()));
            list.extend(reg.files().rev().map(str::to_string));
        }
        list
    }

    /// Follow a rename on disk: replace `old` with `new` in every register.
    ///
    /// Registers hold no duplicates, so scanning stops at the first match.
    /// A register that already holds `new` drops the matched entry instead.
    pub fn rename_contents(&mut self, old: &str, new: &str) {
        for reg in self.registers.iter_mut() {
            let hit = reg
                .entries_mut()
                .iter()
                .position(|entry| entry.as_deref().map_or(false, |file| paths_equal(file, old)));
            let Some(index) = hit else {
                continue;
            };

            if !paths_equal(old, new) && reg.contains(new) {
                reg.tombstone(index);
                reg.pack();
            } else {
                reg.entries_mut()[index] = Some(new.to_string());
            }
        }
    }

    /// Forget entries under `trash_root` that no longer exist on disk
    pub fn remove_stale_trashed_entries(&mut self, trash_root: &Path) {
        for reg in self.registers.iter_mut() {
            let mut needs_packing = false;
            for entry in reg.entries_mut().iter_mut() {
                let stale = entry.as_deref().map_or(false, |file| {
                    let path = Path::new(file);
                    is_under(path, trash_root) && !path.exists()
                });
                if stale {
                    *entry = None;
                    needs_packing = true;
                }
            }
            if needs_packing {
                debug!("Dropped stale trash entries from register {}", reg.name());
                reg.pack();
            }
        }
    }

    /// Replace the unnamed register with a copy of register `name`
    pub fn copy_into_unnamed(&mut self, name: char) {
        if name == UNNAMED {
            return;
        }
        let Some(entries) = self.find(name).map(Register::to_vec) else {
            return;
        };
        self.registers[UNNAMED_SLOT].replace(entries);
    }

    /// Enumerate completion candidates with the user's home abbreviated
    pub fn suggest<F>(&self, names: &str, max_per_register: usize, cb: F)
    where
        F: FnMut(&str, &str),
    {
        self.suggest_with_home(names, max_per_register, home_dir().as_deref(), cb)
    }

    /// Enumerate completion candidates.
    ///
    /// For each nonempty register the most recent entry is labeled
    /// `reg: <name>`; up to `max_per_register - 1` older entries follow with
    /// an empty label.
    pub fn suggest_with_home<F>(&self, names: &str, max_per_register: usize, home: Option<&Path>, mut cb: F)
    where
        F: FnMut(&str, &str),
    {
        for reg in names.chars().filter_map(|name| self.find(name)) {
            let mut files = reg.files().rev();
            let Some(latest) = files.next() else {
                continue;
            };

            let label = format!("reg: {}", reg.name());
            cb(&label, &abbreviate_home(latest, home));
            for file in files.take(max_per_register.saturating_sub(1)) {
                cb("", &abbreviate_home(file, home));
            }
        }
    }

    /// Iterate over all storage-backed registers in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter()
    }

    pub(crate) fn slot(&self, slot: usize) -> &Register {
        &self.registers[slot]
    }

    /// Install entries read from shared memory; the blackhole stays empty
    pub(crate) fn replace_slot(&mut self, slot: usize, entries: Vec<String>) {
        if slot == name::BLACKHOLE_SLOT {
            return;
        }
        self.registers[slot].replace(entries);
    }
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new()
    }
}
