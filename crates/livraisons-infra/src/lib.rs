//! Infrastructure layer
//!
//! Adapters between the domain and the outside world: the file-backed
//! record store, CSV export of delivery lists, and import of data dumped
//! from the hosted backend.

pub mod backend_import;
pub mod csv_export;
pub mod persistence;

pub use persistence::FileRecordStore;
