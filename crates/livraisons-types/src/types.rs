//! Delivery, expense and billing records

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Diesel unit price used when an expense has none configured
pub const DEFAULT_DIESEL_PRICE_UNIT: f64 = 755.0;

/// Upper bound for a single load, in kilograms
pub const MAX_WEIGHT_KG: f64 = 100_000.0;

/// Longest plate number accepted by the entry form
pub const MAX_PLATE_LEN: usize = 20;

/// Shortest driver name(s) accepted by the entry form
pub const MIN_DRIVER_LEN: usize = 3;

/// Deserialize null as default value
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Deserialize a number that may arrive as a JSON number, a numeric string or null
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrText::Number(n)) => Ok(n),
        Some(NumberOrText::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(0.0)
            } else {
                trimmed.parse::<f64>().map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Kind of truck used for a delivery
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum TruckType {
    #[default]
    #[serde(rename = "Semi-Truck")]
    SemiTruck,
    #[serde(rename = "Box Truck")]
    BoxTruck,
    Flatbed,
    Refrigerated,
    Tanker,
    Other,
}

impl TruckType {
    pub const ALL: [TruckType; 6] = [
        TruckType::SemiTruck,
        TruckType::BoxTruck,
        TruckType::Flatbed,
        TruckType::Refrigerated,
        TruckType::Tanker,
        TruckType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TruckType::SemiTruck => "Semi-Truck",
            TruckType::BoxTruck => "Box Truck",
            TruckType::Flatbed => "Flatbed",
            TruckType::Refrigerated => "Refrigerated",
            TruckType::Tanker => "Tanker",
            TruckType::Other => "Other",
        }
    }
}

impl std::fmt::Display for TruckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Editable fields of a delivery, as submitted by the entry form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryFormData {
    pub truck_immatriculation: String,
    pub driver_names: String,
    pub loading_date: Option<NaiveDate>,
    pub unloading_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_loaded: f64,
    pub delivery_bond_number: String,
    pub truck_owner: String,
    #[serde(default)]
    pub truck_type: TruckType,
}

/// One truck trip as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: i64,
    pub truck_immatriculation: String,
    pub driver_names: String,
    pub loading_date: NaiveDate,
    pub unloading_date: NaiveDate,
    #[serde(deserialize_with = "lenient_f64")]
    pub weight_loaded: f64,
    pub delivery_bond_number: String,
    pub truck_owner: String,
    #[serde(default)]
    pub truck_type: TruckType,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Joined expense row, if one was recorded
    #[serde(default)]
    pub expense: Option<ExpenseRecord>,
    /// Billing this delivery was invoiced under
    #[serde(default)]
    pub billing_id: Option<i64>,
}

impl DeliveryRecord {
    pub fn is_billed(&self) -> bool {
        self.billing_id.is_some()
    }

    /// The editable subset, used to prefill the edit form
    pub fn form_data(&self) -> DeliveryFormData {
        DeliveryFormData {
            truck_immatriculation: self.truck_immatriculation.clone(),
            driver_names: self.driver_names.clone(),
            loading_date: Some(self.loading_date),
            unloading_date: Some(self.unloading_date),
            weight_loaded: self.weight_loaded,
            delivery_bond_number: self.delivery_bond_number.clone(),
            truck_owner: self.truck_owner.clone(),
            truck_type: self.truck_type,
        }
    }
}

/// Cost breakdown attached to one delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub delivery_id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub road_costs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub diesel_liters: f64,
    /// Zero means no price was configured
    #[serde(default, deserialize_with = "lenient_f64")]
    pub diesel_price_unit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub toll_costs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub extra_costs: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub extra_description: String,
}

impl ExpenseRecord {
    /// Blank expense entry for a delivery, prefilled with the default diesel price
    pub fn new(delivery_id: i64) -> Self {
        Self {
            id: None,
            delivery_id,
            road_costs: 0.0,
            diesel_liters: 0.0,
            diesel_price_unit: DEFAULT_DIESEL_PRICE_UNIT,
            toll_costs: 0.0,
            extra_costs: 0.0,
            extra_description: String::new(),
        }
    }
}

/// Expense join as returned by the backend: a single row, a list, or null
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpenseJoin {
    Many(Vec<ExpenseRecord>),
    One(ExpenseRecord),
}

impl ExpenseJoin {
    /// Collapse the join into the at-most-one expense a delivery can have
    pub fn into_option(self) -> Option<ExpenseRecord> {
        match self {
            ExpenseJoin::Many(rows) => rows.into_iter().next(),
            ExpenseJoin::One(row) => Some(row),
        }
    }
}

/// Billing lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Paid => "paid",
            BillingStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tonnage-rated invoice recorded over a set of deliveries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    pub id: i64,
    pub billing_number: String,
    pub created_at: DateTime<Utc>,
    /// Total weight in tons
    #[serde(deserialize_with = "lenient_f64")]
    pub total_weight: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_per_ton: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default)]
    pub status: BillingStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Billing fields supplied by the client; the store assigns id, timestamp and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBilling {
    pub billing_number: String,
    pub total_weight: f64,
    pub price_per_ton: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
}

/// Filter panel state; empty fields put no constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub plate_number: String,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub weight_min: Option<f64>,
    #[serde(default)]
    pub weight_max: Option<f64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.plate_number.is_empty()
            && self.owners.is_empty()
            && self.weight_min.is_none()
            && self.weight_max.is_none()
    }

    /// Short description of the active owner and plate filters
    pub fn summary(&self) -> String {
        let mut summary = if self.owners.is_empty() {
            "All owners".to_string()
        } else {
            format!("{} owner(s)", self.owners.len())
        };
        if !self.plate_number.is_empty() {
            summary.push_str(&format!(" • {}", self.plate_number));
        }
        summary
    }
}

/// Entry form fields that can carry a validation message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    #[serde(rename = "truck_immatriculation")]
    Plate,
    #[serde(rename = "driver_names")]
    Drivers,
    LoadingDate,
    UnloadingDate,
    #[serde(rename = "weight_loaded")]
    Weight,
    #[serde(rename = "delivery_bond_number")]
    BondNumber,
    #[serde(rename = "truck_owner")]
    Owner,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Plate => "truck_immatriculation",
            FormField::Drivers => "driver_names",
            FormField::LoadingDate => "loading_date",
            FormField::UnloadingDate => "unloading_date",
            FormField::Weight => "weight_loaded",
            FormField::BondNumber => "delivery_bond_number",
            FormField::Owner => "truck_owner",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation message scoped to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Column the delivery table can be sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Plate,
    Driver,
    #[default]
    LoadingDate,
    UnloadingDate,
    Weight,
    BondNumber,
    Owner,
    TruckType,
    CreatedAt,
    ExpensesTotal,
}

/// Column the billing history can be sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingSortField {
    #[default]
    CreatedAt,
    TotalAmount,
    Status,
    BillingNumber,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}
