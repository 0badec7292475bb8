//! Constants of the shared register layout

/// Magic number identifying a register region ("REGSYNC1")
pub const REGSYNC_MAGIC: u64 = 0x5245_4753_594E_4331;

/// Current layout version
pub const LAYOUT_VERSION: u64 = 1;

/// Byte terminating every entry in the data area
pub const ENTRY_SENTINEL: u8 = 0;
