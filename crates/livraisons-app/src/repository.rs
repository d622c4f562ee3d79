//! Repository adapters for persistence layer

use std::path::PathBuf;

use livraisons_infra::FileRecordStore;
use livraisons_types::Result;

use crate::config::Config;

/// Open the record store in the configured directory
pub fn open_record_store(config: &Config) -> Result<FileRecordStore> {
    let store_dir = config.store_dir()?;
    FileRecordStore::open(store_dir)
}

/// Open the record store at a custom directory
pub fn open_record_store_at(store_dir: PathBuf) -> Result<FileRecordStore> {
    FileRecordStore::open(store_dir)
}
