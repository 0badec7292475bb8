//! Register names and their mapping onto storage slots
//!
//! Storage exists for the blackhole register, the unnamed register and the
//! 26 lowercase letters. Uppercase letters are accepted as names too but only
//! ever address the storage of their lowercase counterpart.

/// Name of the register that discards everything written to it
pub const BLACKHOLE: char = '_';

/// Name of the unnamed (default) register
pub const UNNAMED: char = '"';

/// Number of registers named after alphabet letters
pub const NUM_LETTER_REGISTERS: usize = 26;

/// Number of storage-backed registers
pub const NUM_REGISTERS: usize = 2 + NUM_LETTER_REGISTERS;

/// Storage slot of the blackhole register
pub const BLACKHOLE_SLOT: usize = 0;

/// Storage slot of the unnamed register
pub const UNNAMED_SLOT: usize = 1;

/// Storage-backed names in slot order
pub const STORAGE_NAMES: [char; NUM_REGISTERS] = [
    BLACKHOLE, UNNAMED, 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Storage slot of a name, without alias resolution.
///
/// Uppercase names have no storage of their own and always miss here.
pub fn slot_of(name: char) -> Option<usize> {
    match name {
        BLACKHOLE => Some(BLACKHOLE_SLOT),
        UNNAMED => Some(UNNAMED_SLOT),
        'a'..='z' => Some(2 + (name as usize - 'a' as usize)),
        _ => None,
    }
}

/// Maps any accepted register name to the storage slot it addresses.
pub fn canonicalize(name: char) -> Option<usize> {
    if name.is_ascii_uppercase() {
        slot_of(name.to_ascii_lowercase())
    } else {
        slot_of(name)
    }
}

/// Whether `name` is a syntactically valid register name
pub fn is_valid(name: char) -> bool {
    canonicalize(name).is_some()
}

/// Name of the register stored in `slot`
pub fn name_of(slot: usize) -> Option<char> {
    STORAGE_NAMES.get(slot).copied()
}

/// Every valid name: storage names in slot order, then the uppercase aliases
pub fn all_names() -> impl Iterator<Item = char> {
    STORAGE_NAMES.iter().copied().chain('A'..='Z')
}
