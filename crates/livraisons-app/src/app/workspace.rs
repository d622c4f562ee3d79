//! Workspace - application state and use cases
//!
//! Owns the record store, the last fetched delivery list, the active
//! filters and sort, the rate being typed for an invoice and the last
//! notice shown to the user. Every store failure is caught here, logged
//! and turned into an error notice; nothing is retried.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use livraisons_domain::repository::RecordStore;
use livraisons_domain::service::billing::parse_rate;
use livraisons_domain::service::{
    estimate_amount, filter_deliveries, group_by_owner, render_invoice, sort_billings,
    total_weight, unique_owners, BillingQuote, DashboardMetrics, DeliveryForm, GroupedView,
    InvoiceDocument, InvoiceNumber, SortState, Submission,
};
use livraisons_infra::csv_export::export_deliveries_csv;
use livraisons_types::{
    Billing, BillingSortField, DeliveryRecord, Error, ErrorKind, ExpenseRecord, FilterCriteria,
    Result, SortDirection, SortField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Invoice prepared from the current selection
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub number: InvoiceNumber,
    pub issued_on: NaiveDate,
    pub quote: BillingQuote,
    pub deliveries: Vec<DeliveryRecord>,
}

pub struct Workspace<S: RecordStore> {
    store: S,
    deliveries: Vec<DeliveryRecord>,
    billings: Vec<Billing>,
    filters: FilterCriteria,
    sort: SortState<SortField>,
    billing_sort: SortState<BillingSortField>,
    rate_text: String,
    notice: Option<Notice>,
}

impl<S: RecordStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            deliveries: Vec::new(),
            billings: Vec::new(),
            filters: FilterCriteria::default(),
            sort: SortState::default(),
            billing_sort: SortState::new(BillingSortField::CreatedAt, SortDirection::Desc),
            rate_text: String::new(),
            notice: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last notice, if any
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn succeed(&mut self, message: &str) {
        self.notice = Some(Notice::success(message));
    }

    /// Log a failed call and keep a notice for it; the error is handed back
    fn fail(&mut self, action: &str, err: Error) -> Error {
        let message = match err.kind() {
            ErrorKind::PermissionDenied => {
                "Permission denied: the row-level security policy refused this change".to_string()
            }
            ErrorKind::Validation | ErrorKind::CalculationPrecondition => {
                warn!(action, error = %err, "action rejected locally");
                err.to_string()
            }
            ErrorKind::RemoteFailure => format!("{} failed: {}", action, err),
        };
        if matches!(err.kind(), ErrorKind::PermissionDenied | ErrorKind::RemoteFailure) {
            error!(action, error = %err, "store call failed");
        }
        self.notice = Some(Notice::error(message));
        err
    }

    // --- Deliveries -----------------------------------------------------

    /// Fetch the full delivery list from the store
    pub fn refresh(&mut self) -> Result<()> {
        match self.store.list_deliveries() {
            Ok(rows) => {
                self.deliveries = rows;
                Ok(())
            }
            Err(err) => Err(self.fail("Loading deliveries", err)),
        }
    }

    /// Last fetched list, newest first
    pub fn deliveries(&self) -> &[DeliveryRecord] {
        &self.deliveries
    }

    pub fn find(&self, id: i64) -> Option<&DeliveryRecord> {
        self.deliveries.iter().find(|d| d.id == id)
    }

    /// Look up a delivery in the last fetched list
    pub fn require(&self, id: i64) -> Result<&DeliveryRecord> {
        self.find(id).ok_or(Error::DeliveryNotFound(id))
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn sort(&self) -> SortState<SortField> {
        self.sort
    }

    /// Pick a sort column: a new column starts ascending, the active one toggles
    pub fn sort_by(&mut self, field: SortField) {
        self.sort.select(field, SortDirection::Asc);
    }

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.sort = SortState::new(field, direction);
    }

    /// Deliveries passing the active filters
    pub fn filtered(&self) -> Vec<DeliveryRecord> {
        filter_deliveries(&self.deliveries, &self.filters)
    }

    /// Filtered deliveries grouped by owner under the active sort
    pub fn grouped_view(&self) -> GroupedView {
        group_by_owner(&self.filtered(), self.sort.field, self.sort.direction)
    }

    pub fn owners(&self) -> Vec<String> {
        unique_owners(&self.deliveries)
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> DashboardMetrics {
        DashboardMetrics::compute(&self.deliveries, now)
    }

    /// Validate the form and send it to the store.
    ///
    /// A new delivery is put at the front of the local list; an edit
    /// refetches the whole list.
    pub fn submit(&mut self, form: &mut DeliveryForm) -> Result<DeliveryRecord> {
        let submission = match form.begin_submit() {
            Ok(submission) => submission,
            Err(err) => return Err(self.fail("Saving delivery", err)),
        };

        let outcome = match &submission {
            Submission::Create(data) => self.store.create_delivery(data),
            Submission::Update(id, data) => self.store.update_delivery(*id, data),
        };
        form.finish(&outcome);
        let record = match outcome {
            Ok(record) => record,
            Err(err) => return Err(self.fail("Saving delivery", err)),
        };

        match submission {
            Submission::Create(_) => {
                self.deliveries.insert(0, record.clone());
                self.succeed("Delivery created");
            }
            Submission::Update(..) => {
                self.refresh()?;
                self.succeed("Delivery updated");
            }
        }
        Ok(record)
    }

    /// Confirmation text shown before a delete
    pub fn delete_prompt(&self, id: i64) -> String {
        let identifier = match self.find(id) {
            Some(d) => format!("delivery #{} for truck {}", id, d.truck_immatriculation),
            None => format!("delivery #{}", id),
        };
        format!(
            "Delete {}? The record is removed from the store for good and cannot be restored.",
            identifier
        )
    }

    /// Delete a delivery for good, then refetch
    pub fn delete(&mut self, id: i64) -> Result<()> {
        if let Err(err) = self.store.delete_delivery(id) {
            return Err(self.fail("Deleting delivery", err));
        }
        info!(id, "delivery removed");
        self.refresh()?;
        self.succeed("Delivery permanently deleted");
        Ok(())
    }

    // --- Expenses -------------------------------------------------------

    /// Expense entry to edit for a delivery: the saved one or a blank one
    pub fn expense_draft(&self, delivery_id: i64) -> ExpenseRecord {
        self.find(delivery_id)
            .and_then(|d| d.expense.clone())
            .unwrap_or_else(|| ExpenseRecord::new(delivery_id))
    }

    /// Save a delivery's expense, then refetch so totals follow
    pub fn save_expense(&mut self, expense: &ExpenseRecord) -> Result<ExpenseRecord> {
        let saved = match self.store.upsert_expense(expense) {
            Ok(saved) => saved,
            Err(err) => return Err(self.fail("Saving expenses", err)),
        };
        self.refresh()?;
        self.succeed("Expenses saved");
        Ok(saved)
    }

    // --- Billing --------------------------------------------------------

    pub fn rate_text(&self) -> &str {
        &self.rate_text
    }

    pub fn set_rate_text(&mut self, text: impl Into<String>) {
        self.rate_text = text.into();
    }

    /// Live amount for the filtered selection at the typed rate
    pub fn estimate(&self) -> f64 {
        estimate_amount(total_weight(&self.filtered()), &self.rate_text)
    }

    /// Invoice for the filtered selection at the typed rate
    pub fn draft_invoice(&mut self, today: NaiveDate) -> Result<InvoiceDraft> {
        let deliveries = self.filtered();
        if deliveries.is_empty() {
            return Err(self.fail("Billing", Error::precondition("No deliveries to bill")));
        }
        let quote = match BillingQuote::compute(&deliveries, parse_rate(&self.rate_text)) {
            Ok(quote) => quote,
            Err(err) => return Err(self.fail("Billing", err)),
        };
        Ok(InvoiceDraft {
            number: InvoiceNumber::generate(today),
            issued_on: today,
            quote,
            deliveries,
        })
    }

    /// Printable text of a draft
    pub fn invoice_text(&self, draft: &InvoiceDraft, currency: &str) -> String {
        render_invoice(&InvoiceDocument {
            number: &draft.number,
            issued_on: draft.issued_on,
            quote: &draft.quote,
            deliveries: &draft.deliveries,
            criteria: &self.filters,
            currency,
        })
    }

    /// Record the invoice and stamp its deliveries, then refetch
    pub fn save_billing(&mut self, draft: &InvoiceDraft) -> Result<Billing> {
        let new_billing = draft.quote.to_new_billing(&draft.number);
        let billing = match self
            .store
            .create_billing_with_links(&new_billing, &draft.quote.delivery_ids)
        {
            Ok(billing) => billing,
            Err(err) => return Err(self.fail("Saving invoice", err)),
        };
        info!(
            number = %billing.billing_number,
            deliveries = draft.quote.delivery_count(),
            "invoice saved"
        );
        self.refresh()?;
        self.succeed("Invoice created and saved");
        Ok(billing)
    }

    /// Fetch the billing history
    pub fn refresh_billings(&mut self) -> Result<()> {
        match self.store.list_billings() {
            Ok(rows) => {
                self.billings = rows;
                Ok(())
            }
            Err(err) => Err(self.fail("Loading billings", err)),
        }
    }

    /// Pick a billing history column: a new column starts descending
    pub fn sort_billings_by(&mut self, field: BillingSortField) {
        self.billing_sort.select(field, SortDirection::Desc);
    }

    pub fn set_billing_sort(&mut self, field: BillingSortField, direction: SortDirection) {
        self.billing_sort = SortState::new(field, direction);
    }

    /// Billing history under the active sort
    pub fn billings(&self) -> Vec<Billing> {
        sort_billings(
            &self.billings,
            self.billing_sort.field,
            self.billing_sort.direction,
        )
    }

    // --- Export ---------------------------------------------------------

    /// Export the filtered deliveries to CSV
    pub fn export_csv(&mut self, path: &Path) -> Result<usize> {
        match export_deliveries_csv(&self.filtered(), path) {
            Ok(rows) => {
                self.succeed("Export complete");
                Ok(rows)
            }
            Err(err) => Err(self.fail("Export", err)),
        }
    }
}
