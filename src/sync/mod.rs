//! Cross-process synchronization of the register table
//!
//! Layers, bottom-up:
//! - [`plan`]: pure growth and shrink policy
//! - [`engine`]: publish and refresh under a held mutex
//! - [`session`]: named mutex and region bound to a session name
//! - [`controller`]: enable/disable lifecycle and error reporting
//! - [`dump`]: diagnostic rendering

pub mod controller;
pub mod dump;
pub mod engine;
pub mod plan;
pub mod session;

pub use controller::SessionController;
pub use engine::SyncEngine;
pub use plan::{plan_publish, PublishPlan, SizeReport};
pub use session::Session;
