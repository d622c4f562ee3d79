//! `delivery_expenses` table

use livraisons_types::{Error, ExpenseRecord, Result};

use crate::{Store, Tables};

impl Store {
    /// Insert or replace the expense row of a delivery.
    ///
    /// Conflicts resolve on `delivery_id`: an existing row keeps its id and
    /// has every other column overwritten.
    pub fn upsert_expense(&mut self, expense: &ExpenseRecord) -> Result<ExpenseRecord> {
        if !self.tables.deliveries.contains_key(&expense.delivery_id) {
            return Err(Error::remote(format!(
                "insert or update on table \"delivery_expenses\" violates foreign key constraint: delivery #{} does not exist",
                expense.delivery_id
            )));
        }

        self.commit(|tables| {
            let existing_id = tables
                .delivery_expenses
                .get(&expense.delivery_id)
                .and_then(|existing| existing.id);
            let id = match existing_id {
                Some(id) => id,
                None => Tables::next_id(&mut tables.next_expense_id),
            };

            let mut row = expense.clone();
            row.id = Some(id);
            tables.delivery_expenses.insert(row.delivery_id, row.clone());
            Ok(row)
        })
    }

    /// Expense row of a delivery, if any
    pub fn get_expense(&self, delivery_id: i64) -> Option<&ExpenseRecord> {
        self.tables.delivery_expenses.get(&delivery_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::form;
    use crate::Store;
    use livraisons_types::{ErrorKind, ExpenseRecord};
    use tempfile::tempdir;

    #[test]
    fn test_upsert_keeps_one_row_per_delivery() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let delivery = store.insert_delivery(&form("AA-1", "Transco", 1000.0)).unwrap();

        let mut expense = ExpenseRecord::new(delivery.id);
        expense.road_costs = 100.0;
        let first = store.upsert_expense(&expense).unwrap();

        expense.road_costs = 250.0;
        expense.id = None;
        let second = store.upsert_expense(&expense).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.get_expense(delivery.id).unwrap().road_costs, 250.0);
        let joined = store.get_delivery(delivery.id).unwrap();
        assert_eq!(joined.expense.unwrap().road_costs, 250.0);
    }

    #[test]
    fn test_upsert_for_missing_delivery() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let err = store.upsert_expense(&ExpenseRecord::new(8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
    }

    #[test]
    fn test_failed_write_does_not_consume_expense_id() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().to_path_buf()).unwrap();
        let delivery = store.insert_delivery(&form("AA-1", "Transco", 1000.0)).unwrap();
        let blocker = dir.path().join("livraisons.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(store.upsert_expense(&ExpenseRecord::new(delivery.id)).is_err());
        assert!(store.get_expense(delivery.id).is_none());

        std::fs::remove_dir(&blocker).unwrap();
        let saved = store.upsert_expense(&ExpenseRecord::new(delivery.id)).unwrap();
        assert_eq!(saved.id, Some(1));
    }
}
