//! Import data dumped from the hosted backend
//!
//! Reads the JSON document `{ "deliveries": [...], "billings": [...] }`
//! where each delivery carries its `delivery_expenses` join as returned by
//! the backend: one object, a list, an empty list or null.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use livraisons_store::Store;
use livraisons_types::{Billing, DeliveryRecord, Error, ExpenseJoin, Result};

/// Backend export document
#[derive(Debug, Deserialize)]
pub struct BackendDump {
    #[serde(default)]
    pub deliveries: Vec<DumpDelivery>,
    #[serde(default)]
    pub billings: Vec<Billing>,
}

/// Delivery row with the raw expense join
#[derive(Debug, Clone, Deserialize)]
pub struct DumpDelivery {
    #[serde(flatten)]
    pub record: DeliveryRecord,
    #[serde(default)]
    pub delivery_expenses: Option<ExpenseJoin>,
}

impl DumpDelivery {
    /// The record with its expense normalized to at most one row
    pub fn into_record(self) -> DeliveryRecord {
        let mut record = self.record;
        if let Some(expense) = self.delivery_expenses.and_then(ExpenseJoin::into_option) {
            record.expense = Some(expense);
        }
        record
    }

    pub fn has_expense(&self) -> bool {
        match &self.delivery_expenses {
            Some(ExpenseJoin::One(_)) => true,
            Some(ExpenseJoin::Many(rows)) => !rows.is_empty(),
            None => false,
        }
    }
}

/// Import mode for backend dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing rows and skip ids that are already present
    #[default]
    Append,
    /// Clear the store before importing
    Refresh,
}

/// Import result
#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub deliveries_imported: usize,
    pub billings_imported: usize,
    pub expenses_imported: usize,
    pub skipped: usize,
    pub cleared: usize,
    pub dry_run: bool,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load a backend dump from a JSON file
pub fn load_dump(path: &Path) -> Result<BackendDump> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Import(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Import(format!("Failed to parse backend dump: {}", e)))
}

/// Import a dump into the store.
///
/// Every accepted row lands in a single store write, so a failed write
/// imports nothing. With `dry_run` the store is left untouched and the
/// result reports what would have happened.
pub fn import_dump(dump: &BackendDump, store: &mut Store, mode: ImportMode, dry_run: bool) -> ImportResult {
    let mut result = ImportResult {
        dry_run,
        ..Default::default()
    };

    let replacing = mode == ImportMode::Refresh;
    let mut billing_ids = BTreeSet::new();
    let mut billings = Vec::new();
    for billing in &dump.billings {
        if !replacing && (store.has_billing(billing.id) || !billing_ids.insert(billing.id)) {
            result.skipped += 1;
            continue;
        }
        billings.push(billing.clone());
    }

    let mut delivery_ids = BTreeSet::new();
    let mut deliveries = Vec::new();
    let mut expenses = 0;
    for row in &dump.deliveries {
        let id = row.record.id;
        if !replacing && (store.has_delivery(id) || !delivery_ids.insert(id)) {
            result.skipped += 1;
            continue;
        }
        expenses += usize::from(row.has_expense());
        deliveries.push(row.clone().into_record());
    }

    let (billing_count, delivery_count) = (billings.len(), deliveries.len());
    if dry_run {
        result.cleared = if replacing { store.count() } else { 0 };
    } else {
        match store.import_rows(billings, deliveries, replacing) {
            Ok(cleared) => result.cleared = cleared,
            Err(e) => {
                result.errors.push(format!("Failed to write imported rows: {}", e));
                warn!(error = %e, "backend dump import failed");
                return result;
            }
        }
    }
    result.billings_imported = billing_count;
    result.deliveries_imported = delivery_count;
    result.expenses_imported = expenses;

    info!(
        deliveries = result.deliveries_imported,
        billings = result.billings_imported,
        skipped = result.skipped,
        cleared = result.cleared,
        dry_run,
        "backend dump imported"
    );
    result
}

/// Short description of a dump's content
pub fn summarize_dump(dump: &BackendDump) -> String {
    let mut report = String::new();
    report.push_str("=== Backend Dump ===\n");
    report.push_str(&format!("Deliveries: {}\n", dump.deliveries.len()));
    let with_expense = dump.deliveries.iter().filter(|d| d.has_expense()).count();
    report.push_str(&format!("  with expenses: {}\n", with_expense));
    let billed = dump.deliveries.iter().filter(|d| d.record.is_billed()).count();
    report.push_str(&format!("  billed: {}\n", billed));
    report.push_str(&format!("Billings: {}\n", dump.billings.len()));

    let first = dump.deliveries.iter().map(|d| d.record.loading_date).min();
    let last = dump.deliveries.iter().map(|d| d.record.loading_date).max();
    if let (Some(first), Some(last)) = (first, last) {
        report.push_str(&format!("Loading dates: {} -> {}\n", first, last));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DUMP: &str = r#"{
        "deliveries": [
            {
                "id": 11,
                "truck_immatriculation": "TH-100-AA",
                "driver_names": "Saliou Ba",
                "loading_date": "2024-04-02",
                "unloading_date": "2024-04-03",
                "weight_loaded": "12500",
                "delivery_bond_number": "BL-11",
                "truck_owner": "Transco",
                "truck_type": "Tanker",
                "created_at": "2024-04-02T08:00:00+00:00",
                "billing_id": 4,
                "delivery_expenses": [{"id": 90, "delivery_id": 11, "road_costs": 100, "diesel_liters": "50", "diesel_price_unit": null, "toll_costs": 20, "extra_costs": 0, "extra_description": null}]
            },
            {
                "id": 12,
                "truck_immatriculation": "TH-200-BB",
                "driver_names": "Khady Sarr",
                "loading_date": "2024-04-05",
                "unloading_date": "2024-04-05",
                "weight_loaded": 8000,
                "delivery_bond_number": "BL-12",
                "truck_owner": "SOTRA",
                "truck_type": "Box Truck",
                "billing_id": null,
                "delivery_expenses": []
            },
            {
                "id": 13,
                "truck_immatriculation": "TH-300-CC",
                "driver_names": "Modou Gaye",
                "loading_date": "2024-04-06",
                "unloading_date": "2024-04-07",
                "weight_loaded": 500,
                "delivery_bond_number": "BL-13",
                "truck_owner": "SOTRA",
                "truck_type": "Flatbed",
                "delivery_expenses": {"delivery_id": 13, "toll_costs": 15}
            }
        ],
        "billings": [
            {
                "id": 4,
                "billing_number": "INV-20240410-0420",
                "created_at": "2024-04-10T10:00:00.123456+00:00",
                "total_weight": 12.5,
                "price_per_ton": "5000",
                "total_amount": 62500,
                "status": "paid",
                "notes": "Facture pour 1 livraisons"
            }
        ]
    }"#;

    fn dump() -> BackendDump {
        serde_json::from_str(DUMP).unwrap()
    }

    #[test]
    fn test_parse_every_join_shape() {
        let records: Vec<DeliveryRecord> = dump()
            .deliveries
            .into_iter()
            .map(DumpDelivery::into_record)
            .collect();
        assert_eq!(records[0].weight_loaded, 12500.0);
        assert_eq!(records[0].expense.as_ref().map(|e| e.diesel_liters), Some(50.0));
        assert!(records[1].expense.is_none());
        assert_eq!(records[2].expense.as_ref().map(|e| e.toll_costs), Some(15.0));
    }

    #[test]
    fn test_import_append_skips_existing() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let data = dump();

        let first = import_dump(&data, &mut store, ImportMode::Append, false);
        assert!(first.is_success());
        assert_eq!(first.deliveries_imported, 3);
        assert_eq!(first.billings_imported, 1);
        assert_eq!(first.expenses_imported, 2);

        let second = import_dump(&data, &mut store, ImportMode::Append, false);
        assert_eq!(second.deliveries_imported, 0);
        assert_eq!(second.skipped, 4);

        let imported = store.get_delivery(11).unwrap();
        assert_eq!(imported.billing_id, Some(4));
        assert_eq!(imported.expense.and_then(|e| e.id), Some(90));
    }

    #[test]
    fn test_refresh_clears_first() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        import_dump(&dump(), &mut store, ImportMode::Append, false);

        let result = import_dump(&dump(), &mut store, ImportMode::Refresh, false);
        assert_eq!(result.cleared, 4);
        assert_eq!(result.deliveries_imported, 3);
        assert_eq!(result.skipped, 0);
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let result = import_dump(&dump(), &mut store, ImportMode::Refresh, true);
        assert!(result.dry_run);
        assert_eq!(result.deliveries_imported, 3);
        assert_eq!(store.count(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_dump_errors_are_import_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.json");
        assert!(matches!(load_dump(&path), Err(Error::Import(_))));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_dump(&path), Err(Error::Import(_))));

        fs::write(&path, DUMP).unwrap();
        let summary = summarize_dump(&load_dump(&path).unwrap());
        assert!(summary.contains("Deliveries: 3"));
        assert!(summary.contains("with expenses: 2"));
        assert!(summary.contains("Loading dates: 2024-04-02 -> 2024-04-06"));
    }

    #[test]
    fn test_failed_write_imports_nothing() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        fs::create_dir(dir.path().join("livraisons.json.tmp")).unwrap();

        let result = import_dump(&dump(), &mut store, ImportMode::Append, false);
        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.deliveries_imported, 0);
        assert_eq!(store.count(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_repeated_id_in_dump_is_skipped() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let mut data = dump();
        let copy = data.deliveries[0].clone();
        data.deliveries.push(copy);

        let result = import_dump(&data, &mut store, ImportMode::Append, false);
        assert_eq!(result.deliveries_imported, 3);
        assert_eq!(result.skipped, 1);
        assert_eq!(store.list_deliveries().len(), 3);
    }
}
