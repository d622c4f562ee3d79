//! Domain services

pub mod billing;
pub mod dashboard;
pub mod expense;
pub mod filter;
pub mod grouping;
pub mod invoice;
pub mod validation;

pub use billing::{
    estimate_amount, kg_to_tons, sort_billings, total_billed_amount, BillingQuote, InvoiceNumber,
};
pub use dashboard::DashboardMetrics;
pub use expense::{delivery_expense_total, expense_total, ExpenseBreakdown};
pub use filter::{filter_deliveries, total_weight, unique_owners};
pub use grouping::{group_by_owner, sort_deliveries, GroupedView, OwnerGroup, SortState};
pub use invoice::{format_amount, render_invoice, InvoiceDocument};
pub use validation::{check_delivery, validate_delivery, DeliveryForm, FormMode, FormState, Submission};
