//! Named shared objects: the cross-process mutex and the mapped region

pub mod mutex;
pub mod names;
pub mod region;

pub use mutex::{MutexGuard, NamedMutex};
pub use names::ObjectNames;
pub use region::SharedRegion;
