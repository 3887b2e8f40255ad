//! tusk-core - Core library for Tusk
//!
//! This crate contains the shared models, the local task store, the remote
//! service client, and the offline sync engine used by all Tusk
//! interfaces.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod net;
pub mod remote;
pub mod sync;
#[cfg(test)]
mod testing;
mod util;

pub use error::{Error, Result};
pub use models::{Task, TaskId};
