//! Expense totals

use serde::Serialize;

use livraisons_types::{DeliveryRecord, ExpenseRecord, DEFAULT_DIESEL_PRICE_UNIT};

/// Diesel unit price to apply, falling back to the default when none is set
pub fn effective_diesel_price(expense: &ExpenseRecord) -> f64 {
    let price = expense.diesel_price_unit;
    if price == 0.0 || price.is_nan() {
        DEFAULT_DIESEL_PRICE_UNIT
    } else {
        price
    }
}

/// Total cost of an expense record; no record costs nothing
pub fn expense_total(expense: Option<&ExpenseRecord>) -> f64 {
    match expense {
        Some(e) => {
            e.road_costs
                + e.diesel_liters * effective_diesel_price(e)
                + e.toll_costs
                + e.extra_costs
        }
        None => 0.0,
    }
}

/// Total cost of the expense attached to a delivery
pub fn delivery_expense_total(delivery: &DeliveryRecord) -> f64 {
    expense_total(delivery.expense.as_ref())
}

/// Line-by-line cost view for the delivery details page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpenseBreakdown {
    pub diesel_liters: f64,
    pub diesel_price_unit: f64,
    pub diesel_total: f64,
    pub road_costs: f64,
    pub toll_costs: f64,
    pub extra_costs: f64,
    pub extra_description: String,
    pub total: f64,
}

impl ExpenseBreakdown {
    pub fn from_expense(expense: Option<&ExpenseRecord>) -> Option<Self> {
        let e = expense?;
        let diesel_price_unit = effective_diesel_price(e);
        Some(Self {
            diesel_liters: e.diesel_liters,
            diesel_price_unit,
            diesel_total: e.diesel_liters * diesel_price_unit,
            road_costs: e.road_costs,
            toll_costs: e.toll_costs,
            extra_costs: e.extra_costs,
            extra_description: e.extra_description.clone(),
            total: expense_total(Some(e)),
        })
    }

    /// Road, toll and extra costs together
    pub fn fixed_costs(&self) -> f64 {
        self.road_costs + self.toll_costs + self.extra_costs
    }
}
