//! Delivery entry form
//!
//! Local checks run before anything is sent to the store. A rejected form
//! keeps its data and reports one message per offending field.

use serde::Serialize;
use tracing::warn;

use livraisons_types::{
    DeliveryFormData, DeliveryRecord, Error, FieldError, FormField, Result, TruckType,
    MAX_PLATE_LEN, MAX_WEIGHT_KG, MIN_DRIVER_LEN,
};

/// Check every field rule; an empty list means the form can be submitted
pub fn validate_delivery(form: &DeliveryFormData) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let plate = &form.truck_immatriculation;
    if plate.trim().is_empty() || plate.chars().count() > MAX_PLATE_LEN {
        errors.push(FieldError::new(FormField::Plate, "Required (max 20 chars)"));
    }

    let drivers = &form.driver_names;
    if drivers.trim().is_empty() || drivers.chars().count() < MIN_DRIVER_LEN {
        errors.push(FieldError::new(FormField::Drivers, "Required (min 3 chars)"));
    }

    if form.loading_date.is_none() {
        errors.push(FieldError::new(FormField::LoadingDate, "Required"));
    }

    match (form.loading_date, form.unloading_date) {
        (_, None) => errors.push(FieldError::new(FormField::UnloadingDate, "Required")),
        (Some(loading), Some(unloading)) if unloading < loading => errors.push(FieldError::new(
            FormField::UnloadingDate,
            "Must be on/after loading date",
        )),
        _ => {}
    }

    let weight = form.weight_loaded;
    if !(weight > 0.0 && weight <= MAX_WEIGHT_KG) {
        errors.push(FieldError::new(FormField::Weight, "1-100,000 kg"));
    }

    if form.delivery_bond_number.trim().is_empty() {
        errors.push(FieldError::new(FormField::BondNumber, "Required"));
    }
    if form.truck_owner.trim().is_empty() {
        errors.push(FieldError::new(FormField::Owner, "Required"));
    }

    errors
}

/// Same rules as [`validate_delivery`], as a `Result`
pub fn check_delivery(form: &DeliveryFormData) -> Result<()> {
    let errors = validate_delivery(form);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    RejectedLocally,
    /// The store refused the submission
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// What a validated form asks the store to do
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(DeliveryFormData),
    Update(i64, DeliveryFormData),
}

/// Entry form for a new delivery or an edit of an existing one
#[derive(Debug, Clone)]
pub struct DeliveryForm {
    mode: FormMode,
    data: DeliveryFormData,
    state: FormState,
    errors: Vec<FieldError>,
}

impl DeliveryForm {
    pub fn create(data: DeliveryFormData) -> Self {
        Self {
            mode: FormMode::Create,
            data,
            state: FormState::Idle,
            errors: Vec::new(),
        }
    }

    /// Form prefilled from an existing record
    pub fn edit(record: &DeliveryRecord) -> Self {
        Self {
            mode: FormMode::Edit(record.id),
            data: record.form_data(),
            state: FormState::Idle,
            errors: Vec::new(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn data(&self) -> &DeliveryFormData {
        &self.data
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Change the form data; the edited field loses its message
    pub fn update(&mut self, field: FormField, apply: impl FnOnce(&mut DeliveryFormData)) {
        apply(&mut self.data);
        self.errors.retain(|e| e.field != field);
        if matches!(self.state, FormState::RejectedLocally | FormState::Error(_)) {
            self.state = FormState::Idle;
        }
    }

    /// Truck type is a closed choice and never carries a message
    pub fn select_truck_type(&mut self, truck_type: TruckType) {
        self.data.truck_type = truck_type;
    }

    /// Validate and, if clean, hand out what to send to the store.
    ///
    /// On rejection the form goes to `RejectedLocally` with its data intact.
    pub fn begin_submit(&mut self) -> Result<Submission> {
        if self.state == FormState::Submitting {
            return Err(Error::precondition("A submission is already in progress"));
        }
        self.state = FormState::Validating;
        let errors = validate_delivery(&self.data);
        if !errors.is_empty() {
            warn!(fields = errors.len(), "delivery form rejected locally");
            self.errors = errors.clone();
            self.state = FormState::RejectedLocally;
            return Err(Error::Validation(errors));
        }

        self.errors.clear();
        self.state = FormState::Submitting;
        Ok(match self.mode {
            FormMode::Create => Submission::Create(self.data.clone()),
            FormMode::Edit(id) => Submission::Update(id, self.data.clone()),
        })
    }

    /// Record the store's answer to the submission
    pub fn finish<T>(&mut self, outcome: &Result<T>) {
        self.state = match outcome {
            Ok(_) => FormState::Idle,
            Err(err) => FormState::Error(err.to_string()),
        };
    }
}
