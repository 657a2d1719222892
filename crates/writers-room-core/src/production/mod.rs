//! Sequential execution of many scenes.

pub mod runner;

pub use runner::{ProductionError, ProductionRunner, ScenePlan};
