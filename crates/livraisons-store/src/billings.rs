//! `billings` table

use chrono::Utc;
use livraisons_types::{Billing, BillingStatus, Error, NewBilling, Result};

use crate::{Store, Tables};

fn new_billing_row(tables: &mut Tables, billing: &NewBilling) -> Billing {
    let id = Tables::next_id(&mut tables.next_billing_id);
    Billing {
        id,
        billing_number: billing.billing_number.clone(),
        created_at: Utc::now(),
        total_weight: billing.total_weight,
        price_per_ton: billing.price_per_ton,
        total_amount: billing.total_amount,
        status: BillingStatus::Pending,
        notes: billing.notes.clone(),
    }
}

impl Store {
    /// Insert a billing; it always starts out pending
    pub fn insert_billing(&mut self, billing: &NewBilling) -> Result<Billing> {
        self.commit(|tables| {
            let row = new_billing_row(tables, billing);
            tables.billings.insert(row.id, row.clone());
            Ok(row)
        })
    }

    /// Insert a billing and stamp its deliveries in a single write.
    ///
    /// Every id must name an existing delivery; otherwise nothing is written.
    pub fn insert_billing_with_links(
        &mut self,
        billing: &NewBilling,
        delivery_ids: &[i64],
    ) -> Result<Billing> {
        if let Some(missing) = delivery_ids
            .iter()
            .find(|id| !self.tables.deliveries.contains_key(*id))
        {
            return Err(Error::remote(format!(
                "insert or update on table \"deliveries\" violates foreign key constraint: delivery #{} does not exist",
                missing
            )));
        }

        self.commit(|tables| {
            let row = new_billing_row(tables, billing);
            tables.billings.insert(row.id, row.clone());
            tables.stamp(delivery_ids, row.id);
            Ok(row)
        })
    }

    /// All billings, newest first
    pub fn list_billings(&self) -> Vec<Billing> {
        let mut rows: Vec<Billing> = self.tables.billings.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    pub fn has_billing(&self, id: i64) -> bool {
        self.tables.billings.contains_key(&id)
    }
}

impl Tables {
    /// Insert a billing exported from another store, keeping its id
    pub(crate) fn import_billing(&mut self, billing: Billing) {
        self.next_billing_id = self.next_billing_id.max(billing.id);
        self.billings.insert(billing.id, billing);
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::form;
    use crate::Store;
    use livraisons_types::{BillingStatus, ErrorKind, NewBilling};
    use tempfile::tempdir;

    fn new_billing(number: &str) -> NewBilling {
        NewBilling {
            billing_number: number.to_string(),
            total_weight: 12.5,
            price_per_ton: 5000.0,
            total_amount: 62500.0,
            notes: Some("Facture pour 2 livraisons".to_string()),
        }
    }

    #[test]
    fn test_insert_billing_is_pending() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let billing = store.insert_billing(&new_billing("INV-20240501-0001")).unwrap();
        assert_eq!(billing.id, 1);
        assert_eq!(billing.status, BillingStatus::Pending);
        assert_eq!(store.list_billings().len(), 1);
    }

    #[test]
    fn test_insert_with_links_stamps_deliveries() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let a = store.insert_delivery(&form("AA-1", "Transco", 10000.0)).unwrap();
        let b = store.insert_delivery(&form("AA-2", "Transco", 2500.0)).unwrap();

        let billing = store
            .insert_billing_with_links(&new_billing("INV-20240501-0002"), &[a.id, b.id])
            .unwrap();
        assert!(store
            .list_deliveries()
            .iter()
            .all(|d| d.billing_id == Some(billing.id)));
    }

    #[test]
    fn test_list_billings_newest_first() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        store.insert_billing(&new_billing("INV-20240501-0001")).unwrap();
        store.insert_billing(&new_billing("INV-20240501-0002")).unwrap();
        let numbers: Vec<String> = store
            .list_billings()
            .into_iter()
            .map(|b| b.billing_number)
            .collect();
        assert_eq!(numbers, vec!["INV-20240501-0002", "INV-20240501-0001"]);
    }

    #[test]
    fn test_unknown_delivery_rejects_whole_billing() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let a = store.insert_delivery(&form("AA-1", "Transco", 10000.0)).unwrap();

        let err = store
            .insert_billing_with_links(&new_billing("INV-20240501-0003"), &[a.id, 77])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert!(err.to_string().contains("#77"));
        assert!(store.list_billings().is_empty());
        assert_eq!(store.get_delivery(a.id).unwrap().billing_id, None);

        let billing = store.insert_billing(&new_billing("INV-20240501-0004")).unwrap();
        assert_eq!(billing.id, 1);
    }

    #[test]
    fn test_failed_write_drops_billing() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let a = store.insert_delivery(&form("AA-1", "Transco", 10000.0)).unwrap();
        std::fs::create_dir(dir.path().join("livraisons.json.tmp")).unwrap();

        assert!(store
            .insert_billing_with_links(&new_billing("INV-20240501-0005"), &[a.id])
            .is_err());
        assert!(store.list_billings().is_empty());
        assert_eq!(store.get_delivery(a.id).unwrap().billing_id, None);
    }
}
