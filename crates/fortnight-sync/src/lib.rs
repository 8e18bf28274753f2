pub mod cache;
pub mod client;
pub mod engine;
pub mod error;
pub mod wire;

pub use engine::SyncEngine;
pub use error::{Result, SyncError};
