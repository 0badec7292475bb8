//! Binary layout of the shared register region
//!
//! ```text
//! ┌──────────────────────────────┐ 0
//! │ SharedHeader                 │
//! │  magic, version              │
//! │  size_backed, write_counter  │
//! │  length_area_used            │
//! │  RegisterMetadata × 28       │
//! ├──────────────────────────────┤ HEADER_SIZE
//! │ data area                    │
//! │  "path\0path\0" per register │
//! │  + reserved slack            │
//! ├──────────────────────────────┤ HEADER_SIZE + length_area_used
//! │ free tail                    │
//! └──────────────────────────────┘ size_backed
//! ```

pub mod constants;
pub mod headers;
pub mod view;

pub use constants::*;
pub use headers::{RegisterMetadata, SharedHeader, HEADER_SIZE};
pub use view::SharedLayout;
