//! `deliveries` table

use chrono::{NaiveDate, Utc};
use livraisons_types::{DeliveryFormData, DeliveryRecord, Error, Result};

use crate::policy::check_delete_allowed;
use crate::{Store, Tables};

fn required_date(value: Option<NaiveDate>, column: &str) -> Result<NaiveDate> {
    value.ok_or_else(|| {
        Error::remote(format!(
            "null value in column \"{}\" of relation \"deliveries\" violates not-null constraint",
            column
        ))
    })
}

impl Store {
    /// All deliveries with their expense joined, newest first
    pub fn list_deliveries(&self) -> Vec<DeliveryRecord> {
        let mut rows: Vec<DeliveryRecord> = self
            .tables
            .deliveries
            .values()
            .map(|row| self.joined(row))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    /// Get a delivery by ID, expense joined
    pub fn get_delivery(&self, id: i64) -> Option<DeliveryRecord> {
        self.tables.deliveries.get(&id).map(|row| self.joined(row))
    }

    fn joined(&self, row: &DeliveryRecord) -> DeliveryRecord {
        let mut record = row.clone();
        record.expense = self.tables.delivery_expenses.get(&row.id).cloned();
        record
    }

    /// Insert a new delivery; the store assigns id and creation time
    pub fn insert_delivery(&mut self, form: &DeliveryFormData) -> Result<DeliveryRecord> {
        let loading_date = required_date(form.loading_date, "loading_date")?;
        let unloading_date = required_date(form.unloading_date, "unloading_date")?;

        self.commit(|tables| {
            let id = Tables::next_id(&mut tables.next_delivery_id);
            let record = DeliveryRecord {
                id,
                truck_immatriculation: form.truck_immatriculation.clone(),
                driver_names: form.driver_names.clone(),
                loading_date,
                unloading_date,
                weight_loaded: form.weight_loaded,
                delivery_bond_number: form.delivery_bond_number.clone(),
                truck_owner: form.truck_owner.clone(),
                truck_type: form.truck_type,
                created_at: Some(Utc::now()),
                expense: None,
                billing_id: None,
            };
            tables.deliveries.insert(id, record.clone());
            Ok(record)
        })
    }

    /// Replace the editable fields of a delivery
    pub fn update_delivery(&mut self, id: i64, form: &DeliveryFormData) -> Result<DeliveryRecord> {
        let loading_date = required_date(form.loading_date, "loading_date")?;
        let unloading_date = required_date(form.unloading_date, "unloading_date")?;

        let updated = self.commit(|tables| {
            let row = tables
                .deliveries
                .get_mut(&id)
                .ok_or(Error::DeliveryNotFound(id))?;
            row.truck_immatriculation = form.truck_immatriculation.clone();
            row.driver_names = form.driver_names.clone();
            row.loading_date = loading_date;
            row.unloading_date = unloading_date;
            row.weight_loaded = form.weight_loaded;
            row.delivery_bond_number = form.delivery_bond_number.clone();
            row.truck_owner = form.truck_owner.clone();
            row.truck_type = form.truck_type;
            Ok(row.clone())
        })?;
        Ok(self.joined(&updated))
    }

    /// Delete a delivery and its expense row
    pub fn remove_delivery(&mut self, id: i64) -> Result<()> {
        let row = self
            .tables
            .deliveries
            .get(&id)
            .ok_or(Error::DeliveryNotFound(id))?;
        check_delete_allowed(row)?;

        self.commit(|tables| {
            tables.deliveries.remove(&id);
            tables.delivery_expenses.remove(&id);
            Ok(())
        })
    }

    /// Stamp the given deliveries with a billing id.
    ///
    /// Ids with no matching row are skipped. Returns the number of rows updated.
    pub fn set_billing_link(&mut self, ids: &[i64], billing_id: i64) -> Result<usize> {
        self.commit(|tables| Ok(tables.stamp(ids, billing_id)))
    }

    /// Whether a delivery with this id exists
    pub fn has_delivery(&self, id: i64) -> bool {
        self.tables.deliveries.contains_key(&id)
    }
}

impl Tables {
    pub(crate) fn stamp(&mut self, ids: &[i64], billing_id: i64) -> usize {
        let mut updated = 0;
        for id in ids {
            if let Some(row) = self.deliveries.get_mut(id) {
                row.billing_id = Some(billing_id);
                updated += 1;
            }
        }
        updated
    }

    /// Insert a delivery exported from another store, keeping its id and timestamps.
    ///
    /// The expense carried by the record, if any, is stored alongside it.
    pub(crate) fn import_delivery(&mut self, mut record: DeliveryRecord) {
        if let Some(mut expense) = record.expense.take() {
            expense.delivery_id = record.id;
            match expense.id {
                Some(expense_id) => {
                    self.next_expense_id = self.next_expense_id.max(expense_id);
                }
                None => expense.id = Some(Self::next_id(&mut self.next_expense_id)),
            }
            self.delivery_expenses.insert(record.id, expense);
        }
        self.next_delivery_id = self.next_delivery_id.max(record.id);
        self.deliveries.insert(record.id, record);
    }
}
