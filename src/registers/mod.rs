//! In-process register table

pub mod name;
pub mod paths;
pub mod register;
pub mod store;

pub use name::{canonicalize, BLACKHOLE, NUM_REGISTERS, UNNAMED};
pub use register::Register;
pub use store::RegisterStore;
