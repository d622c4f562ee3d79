//! Persistent store for delivery records
//!
//! Plays the part of the hosted backend: one JSON document holding the
//! `deliveries`, `delivery_expenses` and `billings` tables, rewritten in
//! full on every mutation.

mod billings;
mod deliveries;
mod expenses;
mod policy;

pub use policy::check_delete_allowed;

use livraisons_types::{Billing, DeliveryRecord, ExpenseRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "livraisons.json";

/// On-disk document
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    next_delivery_id: i64,
    #[serde(default)]
    next_expense_id: i64,
    #[serde(default)]
    next_billing_id: i64,
    /// Rows are kept without their joined expense
    #[serde(default)]
    deliveries: BTreeMap<i64, DeliveryRecord>,
    /// Keyed by delivery id, at most one per delivery
    #[serde(default)]
    delivery_expenses: BTreeMap<i64, ExpenseRecord>,
    #[serde(default)]
    billings: BTreeMap<i64, Billing>,
}

/// Persistent store for deliveries, expenses and billings
pub struct Store {
    store_path: PathBuf,
    tables: Tables,
}

impl Store {
    /// Create or load a store
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join(STORE_FILE);

        let tables = if store_path.exists() {
            let file = File::open(&store_path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)?
        } else {
            Tables::default()
        };

        tracing::debug!(
            path = %store_path.display(),
            deliveries = tables.deliveries.len(),
            billings = tables.billings.len(),
            "store opened"
        );
        Ok(Self { store_path, tables })
    }

    /// Path of the backing JSON document
    pub fn path(&self) -> &Path {
        &self.store_path
    }

    /// Write a version of the tables to disk
    ///
    /// Writes a sibling temp file and renames it over the document, so a
    /// crash mid-write leaves the previous version in place.
    fn write(&self, tables: &Tables) -> Result<()> {
        let tmp_path = self.store_path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, tables)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.store_path)?;
        Ok(())
    }

    /// Apply a change to a copy of the tables and keep it only once written.
    ///
    /// A failed change or a failed write leaves the in-memory tables, id
    /// sequences included, as they were.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut next = self.tables.clone();
        let out = change(&mut next)?;
        self.write(&next)?;
        self.tables = next;
        Ok(out)
    }

    /// Number of delivery and billing rows
    pub fn count(&self) -> usize {
        self.tables.deliveries.len() + self.tables.billings.len()
    }

    /// Load exported rows, keeping their ids and timestamps, in a single write.
    ///
    /// With `replace` every existing row is dropped and the id sequences
    /// reset first. Returns the number of rows dropped.
    pub fn import_rows(
        &mut self,
        billings: Vec<Billing>,
        deliveries: Vec<DeliveryRecord>,
        replace: bool,
    ) -> Result<usize> {
        let cleared = if replace { self.count() } else { 0 };
        self.commit(|tables| {
            if replace {
                *tables = Tables::default();
            }
            for billing in billings {
                tables.import_billing(billing);
            }
            for record in deliveries {
                tables.import_delivery(record);
            }
            Ok(cleared)
        })
    }
}

impl Tables {
    fn next_id(sequence: &mut i64) -> i64 {
        *sequence += 1;
        *sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use livraisons_types::{DeliveryFormData, TruckType};
    use tempfile::tempdir;

    pub(crate) fn form(plate: &str, owner: &str, weight: f64) -> DeliveryFormData {
        DeliveryFormData {
            truck_immatriculation: plate.to_string(),
            driver_names: "Ibrahim Sow".to_string(),
            loading_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            unloading_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            weight_loaded: weight,
            delivery_bond_number: format!("BON-{}", plate),
            truck_owner: owner.to_string(),
            truck_type: TruckType::Flatbed,
        }
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempdir().unwrap();
        {
            let mut store = Store::open(dir.path().to_path_buf()).unwrap();
            store.insert_delivery(&form("AA-1", "Transco", 1200.0)).unwrap();
            store.insert_delivery(&form("AA-2", "Transco", 800.0)).unwrap();
        }
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.list_deliveries().len(), 2);
        assert!(!dir.path().join("livraisons.json.tmp").exists());
    }

    #[test]
    fn test_import_rows_replace_resets_sequences() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        store.insert_delivery(&form("AA-1", "Transco", 1200.0)).unwrap();
        store.insert_delivery(&form("AA-2", "Transco", 1200.0)).unwrap();
        assert_eq!(store.import_rows(Vec::new(), Vec::new(), true).unwrap(), 2);
        assert_eq!(store.count(), 0);
        let again = store.insert_delivery(&form("AA-9", "Transco", 100.0)).unwrap();
        assert_eq!(again.id, 1);
    }

    #[test]
    fn test_import_rows_keeps_ids_and_expense() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let mut record = store.insert_delivery(&form("AA-1", "Transco", 1200.0)).unwrap();
        record.id = 40;
        let mut expense = livraisons_types::ExpenseRecord::new(0);
        expense.road_costs = 300.0;
        record.expense = Some(expense);

        assert_eq!(store.import_rows(Vec::new(), vec![record], false).unwrap(), 0);
        let imported = store.get_delivery(40).unwrap();
        assert_eq!(imported.expense.unwrap().delivery_id, 40);
        assert_eq!(store.list_deliveries().len(), 2);
        let next = store.insert_delivery(&form("AA-2", "Transco", 100.0)).unwrap();
        assert_eq!(next.id, 41);
    }

    #[test]
    fn test_failed_write_keeps_memory_and_sequences() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let blocker = dir.path().join("livraisons.json.tmp");
        fs::create_dir(&blocker).unwrap();

        assert!(store.insert_delivery(&form("AA-1", "Transco", 1200.0)).is_err());
        assert!(store.list_deliveries().is_empty());
        assert!(store.import_rows(Vec::new(), Vec::new(), true).is_err());

        fs::remove_dir(&blocker).unwrap();
        let first = store.insert_delivery(&form("AA-1", "Transco", 1200.0)).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(store.list_deliveries().len(), 1);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();
        assert!(Store::open(dir.path().to_path_buf()).is_err());
    }
}
