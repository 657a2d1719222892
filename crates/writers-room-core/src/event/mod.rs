//! In-process scene event bus.

pub mod bus;

pub use bus::{EventBus, SceneEvents};
