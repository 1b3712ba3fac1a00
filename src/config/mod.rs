// src/config/mod.rs
pub mod sync;

pub use sync::SyncConfig;
