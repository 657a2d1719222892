//! Dialog orchestration engine for the Writers' Room.
//!
//! This crate defines the message protocol plumbing, the character agents,
//! the scene director and the production runner, plus the "ports" (broker,
//! text generation, transcript storage) that `writers-room-infra`
//! implements. It depends only on `writers-room-types` -- never on
//! `writers-room-infra` or any network/IO crate.

pub mod agent;
pub mod channel;
pub mod director;
pub mod event;
pub mod llm;
pub mod production;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
