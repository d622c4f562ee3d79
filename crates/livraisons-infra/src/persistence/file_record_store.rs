//! File-based record store implementation

use std::cell::RefCell;
use std::path::PathBuf;

use tracing::{debug, info};

use livraisons_domain::repository::RecordStore;
use livraisons_store::Store;
use livraisons_types::{
    Billing, DeliveryFormData, DeliveryRecord, ExpenseRecord, NewBilling, Result,
};

use crate::backend_import::{import_dump, BackendDump, ImportMode, ImportResult};

/// `RecordStore` backed by the local JSON document store
///
/// Every mutating call rewrites the document before returning, so the
/// next `list_deliveries` sees it.
pub struct FileRecordStore {
    store: RefCell<Store>,
}

impl FileRecordStore {
    /// Create or load a record store in the given directory
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        let store = Store::open(store_dir)?;
        Ok(Self {
            store: RefCell::new(store),
        })
    }

    /// Path of the backing JSON document
    pub fn path(&self) -> PathBuf {
        self.store.borrow().path().to_path_buf()
    }

    /// Load a backend dump into this store
    pub fn import(&self, dump: &BackendDump, mode: ImportMode, dry_run: bool) -> ImportResult {
        import_dump(dump, &mut self.store.borrow_mut(), mode, dry_run)
    }

    fn location(&self) -> String {
        self.store.borrow().path().display().to_string()
    }
}

impl RecordStore for FileRecordStore {
    fn list_deliveries(&self) -> Result<Vec<DeliveryRecord>> {
        let rows = self.store.borrow().list_deliveries();
        debug!(count = rows.len(), "deliveries fetched");
        Ok(rows)
    }

    fn create_delivery(&self, form: &DeliveryFormData) -> Result<DeliveryRecord> {
        let record = self.store.borrow_mut().insert_delivery(form)?;
        info!(
            id = record.id,
            plate = %record.truck_immatriculation,
            store = %self.location(),
            "delivery created"
        );
        Ok(record)
    }

    fn update_delivery(&self, id: i64, form: &DeliveryFormData) -> Result<DeliveryRecord> {
        let record = self.store.borrow_mut().update_delivery(id, form)?;
        info!(id, "delivery updated");
        Ok(record)
    }

    fn delete_delivery(&self, id: i64) -> Result<()> {
        self.store.borrow_mut().remove_delivery(id)?;
        info!(id, "delivery deleted");
        Ok(())
    }

    fn upsert_expense(&self, expense: &ExpenseRecord) -> Result<ExpenseRecord> {
        let saved = self.store.borrow_mut().upsert_expense(expense)?;
        info!(delivery_id = saved.delivery_id, "expense saved");
        Ok(saved)
    }

    fn create_billing(&self, billing: &NewBilling) -> Result<Billing> {
        let row = self.store.borrow_mut().insert_billing(billing)?;
        info!(id = row.id, number = %row.billing_number, "billing created");
        Ok(row)
    }

    fn list_billings(&self) -> Result<Vec<Billing>> {
        Ok(self.store.borrow().list_billings())
    }

    fn update_deliveries_billing_link(&self, ids: &[i64], billing_id: i64) -> Result<()> {
        let stamped = self.store.borrow_mut().set_billing_link(ids, billing_id)?;
        debug!(billing_id, requested = ids.len(), stamped, "deliveries linked");
        Ok(())
    }

    /// Both writes land in the same document save; an unknown delivery id
    /// rejects the billing before anything is written
    fn create_billing_with_links(&self, billing: &NewBilling, ids: &[i64]) -> Result<Billing> {
        let row = self
            .store
            .borrow_mut()
            .insert_billing_with_links(billing, ids)?;
        info!(
            id = row.id,
            number = %row.billing_number,
            deliveries = ids.len(),
            amount = row.total_amount,
            "billing created"
        );
        Ok(row)
    }
}
