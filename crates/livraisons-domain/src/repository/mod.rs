//! Repository trait definitions for data persistence

use livraisons_types::{Billing, DeliveryFormData, DeliveryRecord, Error, ExpenseRecord, NewBilling};

/// The backend holding deliveries, their expenses and billings.
///
/// Calls are plain request/response: no locking, no retry, no versioning.
/// Updates and deletes are unconditional by id, so the last write wins.
pub trait RecordStore {
    /// All deliveries with their expense joined, newest first
    fn list_deliveries(&self) -> Result<Vec<DeliveryRecord>, Error>;

    /// Create a delivery from form data
    fn create_delivery(&self, form: &DeliveryFormData) -> Result<DeliveryRecord, Error>;

    /// Replace the editable fields of a delivery
    fn update_delivery(&self, id: i64, form: &DeliveryFormData) -> Result<DeliveryRecord, Error>;

    /// Delete a delivery for good; `PermissionDenied` if the access policy refuses
    fn delete_delivery(&self, id: i64) -> Result<(), Error>;

    /// Create or replace the expense of a delivery, keyed by `delivery_id`
    fn upsert_expense(&self, expense: &ExpenseRecord) -> Result<ExpenseRecord, Error>;

    /// Record a billing with status pending
    fn create_billing(&self, billing: &NewBilling) -> Result<Billing, Error>;

    /// All billings, newest first
    fn list_billings(&self) -> Result<Vec<Billing>, Error>;

    /// Stamp deliveries with the billing they were invoiced under
    fn update_deliveries_billing_link(&self, ids: &[i64], billing_id: i64) -> Result<(), Error>;

    /// Record a billing and stamp its deliveries.
    ///
    /// The default runs two separate calls and is not atomic: if stamping
    /// fails, the billing row stays behind with no deliveries pointing at it,
    /// and the returned error names it. Stores that can do both in one
    /// write should override this.
    fn create_billing_with_links(&self, billing: &NewBilling, ids: &[i64]) -> Result<Billing, Error> {
        let created = self.create_billing(billing)?;
        if let Err(err) = self.update_deliveries_billing_link(ids, created.id) {
            tracing::error!(
                billing_id = created.id,
                billing_number = %created.billing_number,
                error = %err,
                "billing recorded but deliveries were not linked"
            );
            return Err(Error::remote(format!(
                "billing {} (#{}) was recorded but its deliveries were not linked: {}",
                created.billing_number, created.id, err
            )));
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use livraisons_types::{BillingStatus, ErrorKind};
    use std::cell::RefCell;

    /// Billing table only; linking fails on demand
    struct FlakyStore {
        billings: RefCell<Vec<Billing>>,
        linked: RefCell<Vec<(i64, i64)>>,
        fail_link: bool,
    }

    impl FlakyStore {
        fn new(fail_link: bool) -> Self {
            Self {
                billings: RefCell::new(Vec::new()),
                linked: RefCell::new(Vec::new()),
                fail_link,
            }
        }
    }

    impl RecordStore for FlakyStore {
        fn list_deliveries(&self) -> Result<Vec<DeliveryRecord>, Error> {
            Ok(Vec::new())
        }
        fn create_delivery(&self, _form: &DeliveryFormData) -> Result<DeliveryRecord, Error> {
            Err(Error::remote("not supported"))
        }
        fn update_delivery(&self, id: i64, _form: &DeliveryFormData) -> Result<DeliveryRecord, Error> {
            Err(Error::DeliveryNotFound(id))
        }
        fn delete_delivery(&self, id: i64) -> Result<(), Error> {
            Err(Error::DeliveryNotFound(id))
        }
        fn upsert_expense(&self, expense: &ExpenseRecord) -> Result<ExpenseRecord, Error> {
            Ok(expense.clone())
        }
        fn create_billing(&self, billing: &NewBilling) -> Result<Billing, Error> {
            let mut billings = self.billings.borrow_mut();
            let row = Billing {
                id: billings.len() as i64 + 1,
                billing_number: billing.billing_number.clone(),
                created_at: Utc::now(),
                total_weight: billing.total_weight,
                price_per_ton: billing.price_per_ton,
                total_amount: billing.total_amount,
                status: BillingStatus::Pending,
                notes: billing.notes.clone(),
            };
            billings.push(row.clone());
            Ok(row)
        }
        fn list_billings(&self) -> Result<Vec<Billing>, Error> {
            Ok(self.billings.borrow().clone())
        }
        fn update_deliveries_billing_link(&self, ids: &[i64], billing_id: i64) -> Result<(), Error> {
            if self.fail_link {
                return Err(Error::remote("connection reset by peer"));
            }
            self.linked
                .borrow_mut()
                .extend(ids.iter().map(|id| (*id, billing_id)));
            Ok(())
        }
    }

    fn new_billing() -> NewBilling {
        NewBilling {
            billing_number: "INV-20240610-0042".to_string(),
            total_weight: 3.0,
            price_per_ton: 1000.0,
            total_amount: 3000.0,
            notes: None,
        }
    }

    #[test]
    fn test_default_links_after_create() {
        let store = FlakyStore::new(false);
        let billing = store.create_billing_with_links(&new_billing(), &[4, 5]).unwrap();
        assert_eq!(*store.linked.borrow(), vec![(4, billing.id), (5, billing.id)]);
    }

    #[test]
    fn test_default_leaves_orphan_on_link_failure() {
        let store = FlakyStore::new(true);
        let err = store.create_billing_with_links(&new_billing(), &[4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert!(err.to_string().contains("INV-20240610-0042"));
        // The billing row is not rolled back
        assert_eq!(store.list_billings().unwrap().len(), 1);
        assert!(store.linked.borrow().is_empty());
    }
}
