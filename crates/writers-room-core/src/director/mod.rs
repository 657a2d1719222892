//! Scene supervision.
//!
//! - `SceneDirector`: lifecycle owner for one scene (`Idle -> Running -> Stopped`)
//! - `Transcript`: the director's ordered record of a scene's lines
//! - `report`: recovers line statistics from a saved transcript
//! - `RetryPolicy`: bounded generation retries handed to every agent

pub mod report;
pub mod retry;
pub mod supervisor;
pub mod transcript;

pub use retry::RetryPolicy;
pub use supervisor::{SceneDirector, SceneSettings};
pub use transcript::Transcript;
