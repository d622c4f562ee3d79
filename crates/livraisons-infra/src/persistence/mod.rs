//! Persistence implementations
//!
//! This module provides file-based implementations of the repository traits.

mod file_record_store;

pub use file_record_store::FileRecordStore;
