//! Delivery table sorting and owner grouping

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use livraisons_types::{DeliveryRecord, SortDirection, SortField};

use super::expense::delivery_expense_total;
use super::filter::total_weight;

/// Active sort column and direction of a table.
///
/// Picking the active column again toggles the direction; picking a new
/// column switches to it with the table's initial direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + PartialEq> SortState<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn select(&mut self, field: F, initial: SortDirection) {
        if self.field == field {
            self.direction = self.direction.toggled();
        } else {
            self.field = field;
            self.direction = initial;
        }
    }
}

impl Default for SortState<SortField> {
    /// Delivery table opens on loading date, newest first
    fn default() -> Self {
        Self::new(SortField::LoadingDate, SortDirection::Desc)
    }
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Primary collation key: lower case with Latin accents folded
pub fn collation_key(s: &str) -> String {
    s.to_lowercase().chars().map(fold_char).collect()
}

/// Human ordering of names: case and accents only break ties
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn cmp_text_ci(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_by(field: SortField, a: &DeliveryRecord, b: &DeliveryRecord) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Plate => cmp_text_ci(&a.truck_immatriculation, &b.truck_immatriculation),
        SortField::Driver => cmp_text_ci(&a.driver_names, &b.driver_names),
        SortField::LoadingDate => a.loading_date.cmp(&b.loading_date),
        SortField::UnloadingDate => a.unloading_date.cmp(&b.unloading_date),
        SortField::Weight => a.weight_loaded.total_cmp(&b.weight_loaded),
        SortField::BondNumber => cmp_text_ci(&a.delivery_bond_number, &b.delivery_bond_number),
        SortField::Owner => cmp_text_ci(&a.truck_owner, &b.truck_owner),
        SortField::TruckType => a.truck_type.label().cmp(b.truck_type.label()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::ExpensesTotal => delivery_expense_total(a).total_cmp(&delivery_expense_total(b)),
    }
}

/// Stable single-column sort; equal rows keep their input order
pub fn sort_deliveries(
    deliveries: &[DeliveryRecord],
    field: SortField,
    direction: SortDirection,
) -> Vec<DeliveryRecord> {
    let mut sorted = deliveries.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare_by(field, a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Deliveries of one owner with their subtotals
#[derive(Debug, Clone, Serialize)]
pub struct OwnerGroup {
    pub owner: String,
    pub deliveries: Vec<DeliveryRecord>,
    pub total_weight_kg: f64,
    pub total_expenses: f64,
}

/// Table view: owner groups in name order, with grand totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupedView {
    pub groups: Vec<OwnerGroup>,
    pub delivery_count: usize,
    pub total_weight_kg: f64,
    pub total_expenses: f64,
}

/// Partition deliveries by owner after applying the active sort
pub fn group_by_owner(
    deliveries: &[DeliveryRecord],
    field: SortField,
    direction: SortDirection,
) -> GroupedView {
    let sorted = sort_deliveries(deliveries, field, direction);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut members: Vec<(String, Vec<DeliveryRecord>)> = Vec::new();
    for delivery in sorted {
        match index.get(&delivery.truck_owner) {
            Some(&i) => members[i].1.push(delivery),
            None => {
                index.insert(delivery.truck_owner.clone(), members.len());
                members.push((delivery.truck_owner.clone(), vec![delivery]));
            }
        }
    }

    let mut groups: Vec<OwnerGroup> = members
        .into_iter()
        .map(|(owner, deliveries)| OwnerGroup {
            total_weight_kg: total_weight(&deliveries),
            total_expenses: deliveries.iter().map(delivery_expense_total).sum(),
            owner,
            deliveries,
        })
        .collect();
    groups.sort_by(|a, b| collate(&a.owner, &b.owner));

    GroupedView {
        delivery_count: groups.iter().map(|g| g.deliveries.len()).sum(),
        total_weight_kg: groups.iter().map(|g| g.total_weight_kg).sum(),
        total_expenses: groups.iter().map(|g| g.total_expenses).sum(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{delivery, with_expense, with_loading_date};
    use crate::service::filter::filter_deliveries;
    use livraisons_types::FilterCriteria;
    use proptest::prelude::*;

    #[test]
    fn test_grouping_example() {
        let deliveries = vec![
            delivery(1, "P1", "A", 1000.0),
            delivery(2, "P2", "B", 2000.0),
            delivery(3, "P3", "A", 1500.0),
        ];
        let criteria = FilterCriteria {
            owners: vec!["A".to_string()],
            ..Default::default()
        };
        let view = group_by_owner(
            &filter_deliveries(&deliveries, &criteria),
            SortField::LoadingDate,
            SortDirection::Desc,
        );
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].owner, "A");
        assert_eq!(view.groups[0].total_weight_kg, 2500.0);
        assert_eq!(view.delivery_count, 2);
    }

    #[test]
    fn test_groups_follow_collation_not_bytes() {
        let deliveries = vec![
            delivery(1, "P1", "zeta", 1.0),
            delivery(2, "P2", "Émile", 1.0),
            delivery(3, "P3", "alpha", 1.0),
            delivery(4, "P4", "Beta", 1.0),
        ];
        let view = group_by_owner(&deliveries, SortField::Id, SortDirection::Asc);
        let owners: Vec<&str> = view.groups.iter().map(|g| g.owner.as_str()).collect();
        assert_eq!(owners, vec!["alpha", "Beta", "Émile", "zeta"]);
    }

    #[test]
    fn test_members_keep_active_sort() {
        let deliveries = vec![
            delivery(1, "P1", "A", 300.0),
            delivery(2, "P2", "A", 100.0),
            delivery(3, "P3", "A", 200.0),
        ];
        let view = group_by_owner(&deliveries, SortField::Weight, SortDirection::Asc);
        let ids: Vec<i64> = view.groups[0].deliveries.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_ties_keep_input_order_both_directions() {
        let deliveries = vec![
            with_loading_date(delivery(1, "P1", "A", 1.0), 2024, 1, 5),
            with_loading_date(delivery(2, "P2", "A", 1.0), 2024, 1, 9),
            with_loading_date(delivery(3, "P3", "A", 1.0), 2024, 1, 5),
        ];
        let asc: Vec<i64> = sort_deliveries(&deliveries, SortField::LoadingDate, SortDirection::Asc)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(asc, vec![1, 3, 2]);
        let desc: Vec<i64> = sort_deliveries(&deliveries, SortField::LoadingDate, SortDirection::Desc)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(desc, vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_by_expenses_total() {
        let deliveries = vec![
            with_expense(delivery(1, "P1", "A", 1.0), 500.0, 0.0, 0.0),
            delivery(2, "P2", "A", 1.0),
            with_expense(delivery(3, "P3", "A", 1.0), 0.0, 1.0, 0.0),
        ];
        let ids: Vec<i64> = sort_deliveries(&deliveries, SortField::ExpensesTotal, SortDirection::Desc)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_group_expense_subtotals() {
        let deliveries = vec![
            with_expense(delivery(1, "P1", "A", 1000.0), 100.0, 50.0, 755.0),
            delivery(2, "P2", "A", 500.0),
        ];
        let view = group_by_owner(&deliveries, SortField::LoadingDate, SortDirection::Desc);
        assert_eq!(view.groups[0].total_expenses, 37850.0);
        assert_eq!(view.total_expenses, 37850.0);
    }

    #[test]
    fn test_sort_state_select() {
        let mut state = SortState::default();
        assert_eq!(state.field, SortField::LoadingDate);
        assert_eq!(state.direction, SortDirection::Desc);

        state.select(SortField::LoadingDate, SortDirection::Asc);
        assert_eq!(state.direction, SortDirection::Asc);

        state.select(SortField::Weight, SortDirection::Asc);
        assert_eq!(state.field, SortField::Weight);
        assert_eq!(state.direction, SortDirection::Asc);
    }

    proptest! {
        #[test]
        fn grouping_keeps_every_record_once(
            rows in prop::collection::vec(
                (prop::sample::select(vec!["A", "b", "C", "é"]), 1u32..100_000),
                0..50,
            )
        ) {
            let deliveries: Vec<DeliveryRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, (owner, weight))| delivery(i as i64, "P", owner, *weight as f64))
                .collect();
            let view = group_by_owner(&deliveries, SortField::Weight, SortDirection::Desc);

            prop_assert_eq!(view.delivery_count, deliveries.len());
            prop_assert_eq!(view.total_weight_kg, total_weight(&deliveries));

            let mut ids: Vec<i64> = view
                .groups
                .iter()
                .flat_map(|g| g.deliveries.iter().map(|d| d.id))
                .collect();
            ids.sort();
            let expected: Vec<i64> = (0..deliveries.len() as i64).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
