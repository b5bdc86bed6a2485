//! Draft state for the add and edit patient forms.
//!
//! A [`PatientForm`] owns exactly one draft at a time. Every address
//! operation leaves the list either empty or with exactly one primary
//! address. Custom field entries are paired to the injected template list by
//! `template_id`; when the templates change the entries are re-paired rather
//! than rebuilt, so values already typed survive.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use validator::{Validate, ValidationError};

use crate::error::{CoreError, Result};
use crate::model::{
    Address, CustomFieldTemplate, Patient, PatientId, PatientStatus, TemplateId,
};
use crate::time::parse_birth_date;

/// A custom field value as edited in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldEntry {
    pub template_id: TemplateId,
    /// Template name, shown as the input label.
    pub field_name: String,
    pub value: String,
}

/// The in-progress patient record.
///
/// Everything is kept as the user typed it; trimming and filtering happen
/// when the draft is turned into a request body.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct PatientDraft {
    #[validate(custom(function = "non_blank", message = "First name is required"))]
    pub first_name: String,
    pub middle_name: String,
    #[validate(custom(function = "non_blank", message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom(function = "birth_date"))]
    pub date_of_birth: String,
    #[validate(custom(function = "known_status"))]
    pub status: String,
    #[validate(custom(function = "one_primary_address"))]
    pub addresses: Vec<Address>,
    pub custom_fields: Vec<CustomFieldEntry>,
}

impl Default for PatientDraft {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            date_of_birth: String::new(),
            status: PatientStatus::default().as_str().to_string(),
            addresses: Vec::new(),
            custom_fields: Vec::new(),
        }
    }
}

fn non_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn birth_date(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Date of birth is required".into());
        return Err(err);
    }
    if parse_birth_date(value.trim()).is_err() {
        let mut err = ValidationError::new("date");
        err.message = Some("Date of birth must be YYYY-MM-DD".into());
        return Err(err);
    }
    Ok(())
}

fn known_status(value: &str) -> std::result::Result<(), ValidationError> {
    if value.parse::<PatientStatus>().is_err() {
        let mut err = ValidationError::new("status");
        err.message = Some("Status must be one of INQUIRY, ONBOARDING, ACTIVE, CHURNED".into());
        return Err(err);
    }
    Ok(())
}

fn one_primary_address(addresses: &[Address]) -> std::result::Result<(), ValidationError> {
    if addresses.is_empty() {
        return Ok(());
    }
    let primaries = addresses.iter().filter(|a| a.is_primary).count();
    if primaries != 1 {
        let mut err = ValidationError::new("primary_address");
        err.add_param("primaries".into(), &primaries);
        err.message = Some("Must have one primary address".into());
        return Err(err);
    }
    Ok(())
}

/// Scalar fields settable through [`PatientForm::set_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    Status,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::FirstName => "first_name",
            DraftField::MiddleName => "middle_name",
            DraftField::LastName => "last_name",
            DraftField::DateOfBirth => "date_of_birth",
            DraftField::Status => "status",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first_name" => Ok(DraftField::FirstName),
            "middle_name" => Ok(DraftField::MiddleName),
            "last_name" => Ok(DraftField::LastName),
            "date_of_birth" => Ok(DraftField::DateOfBirth),
            "status" => Ok(DraftField::Status),
            _ => Err(CoreError::invalid_field(s)),
        }
    }
}

/// Location fields of one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    City,
    State,
    ZipCode,
}

impl FromStr for AddressField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "street" => Ok(AddressField::Street),
            "city" => Ok(AddressField::City),
            "state" => Ok(AddressField::State),
            "zip_code" => Ok(AddressField::ZipCode),
            _ => Err(CoreError::invalid_field(s)),
        }
    }
}

/// Form state manager for one add or edit surface.
#[derive(Debug, Clone)]
pub struct PatientForm {
    templates: Vec<CustomFieldTemplate>,
    patient_id: Option<PatientId>,
    /// Custom field values of the patient being edited, as stored on the
    /// server. Consulted when templates arrive after the draft was seeded.
    stored_values: HashMap<TemplateId, String>,
    draft: PatientDraft,
}

impl PatientForm {
    /// An empty add form.
    pub fn new(templates: Vec<CustomFieldTemplate>) -> Self {
        let mut form = Self {
            templates: Vec::new(),
            patient_id: None,
            stored_values: HashMap::new(),
            draft: PatientDraft::default(),
        };
        form.initialize(None, templates);
        form
    }

    /// An edit form seeded from `patient`.
    pub fn for_patient(patient: &Patient, templates: Vec<CustomFieldTemplate>) -> Self {
        let mut form = Self::new(Vec::new());
        form.initialize(Some(patient), templates);
        form
    }

    /// Replace the draft: a copy of `patient` when given, otherwise the empty
    /// add draft.
    pub fn initialize(&mut self, patient: Option<&Patient>, templates: Vec<CustomFieldTemplate>) {
        self.templates = templates;
        match patient {
            Some(patient) => {
                self.patient_id = Some(patient.id.clone());
                self.stored_values = patient
                    .custom_fields
                    .iter()
                    .map(|f| (f.template_id, f.value.clone()))
                    .collect();
                self.draft = PatientDraft {
                    first_name: patient.first_name.clone(),
                    middle_name: patient.middle_name.clone().unwrap_or_default(),
                    last_name: patient.last_name.clone(),
                    date_of_birth: patient.date_of_birth.clone(),
                    status: patient.status.as_str().to_string(),
                    addresses: normalize_primary(patient.addresses.clone()),
                    custom_fields: pair_custom_fields(&self.templates, &self.stored_values),
                };
            }
            None => {
                self.patient_id = None;
                self.stored_values.clear();
                self.draft = PatientDraft {
                    addresses: vec![Address::empty(true)],
                    custom_fields: pair_custom_fields(&self.templates, &HashMap::new()),
                    ..PatientDraft::default()
                };
            }
        }
        tracing::debug!(
            patient_id = ?self.patient_id,
            templates = self.templates.len(),
            "patient form initialized"
        );
    }

    pub fn draft(&self) -> &PatientDraft {
        &self.draft
    }

    pub fn templates(&self) -> &[CustomFieldTemplate] {
        &self.templates
    }

    /// The patient being edited; `None` for an add form.
    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn is_edit(&self) -> bool {
        self.patient_id.is_some()
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::FirstName => self.draft.first_name = value,
            DraftField::MiddleName => self.draft.middle_name = value,
            DraftField::LastName => self.draft.last_name = value,
            DraftField::DateOfBirth => self.draft.date_of_birth = value,
            DraftField::Status => self.draft.status = value,
        }
    }

    /// [`set_field`](Self::set_field) addressed by wire name.
    pub fn set_field_by_name(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field = name.parse()?;
        self.set_field(field, value);
        Ok(())
    }

    /// No-op when `index` is out of range.
    pub fn set_address_field(&mut self, index: usize, field: AddressField, value: impl Into<String>) {
        let Some(address) = self.draft.addresses.get_mut(index) else {
            return;
        };
        let value = value.into();
        match field {
            AddressField::Street => address.street = value,
            AddressField::City => address.city = value,
            AddressField::State => address.state = value,
            AddressField::ZipCode => address.zip_code = value,
        }
    }

    /// Returns false when no entry has `template_id`.
    pub fn set_custom_field(&mut self, template_id: TemplateId, value: impl Into<String>) -> bool {
        match self
            .draft
            .custom_fields
            .iter_mut()
            .find(|f| f.template_id == template_id)
        {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Append an empty address. It is primary only if it is the first one.
    pub fn add_address(&mut self) {
        let is_primary = self.draft.addresses.is_empty();
        self.draft.addresses.push(Address::empty(is_primary));
    }

    /// Remove the address at `index`; out of range is a no-op returning
    /// `None`. Removing the primary promotes the new first address.
    pub fn remove_address(&mut self, index: usize) -> Option<Address> {
        if index >= self.draft.addresses.len() {
            return None;
        }
        let removed = self.draft.addresses.remove(index);
        if removed.is_primary
            && let Some(first) = self.draft.addresses.first_mut()
        {
            first.is_primary = true;
        }
        Some(removed)
    }

    /// Make `index` the only primary address; out of range is a no-op.
    pub fn set_primary_address(&mut self, index: usize) -> bool {
        if index >= self.draft.addresses.len() {
            return false;
        }
        for (i, address) in self.draft.addresses.iter_mut().enumerate() {
            address.is_primary = i == index;
        }
        true
    }

    /// Back to the empty add draft, keeping the injected templates.
    pub fn reset(&mut self) {
        let templates = std::mem::take(&mut self.templates);
        self.initialize(None, templates);
    }

    /// Re-pair custom field entries against a new template list.
    ///
    /// Values for templates still present are kept, values for removed
    /// templates are dropped and new templates get an empty entry. For an
    /// edit form the stored values fill in templates the draft did not have
    /// an entry for yet.
    pub fn templates_loaded(&mut self, templates: Vec<CustomFieldTemplate>) {
        let mut values = self.stored_values.clone();
        values.extend(
            self.draft
                .custom_fields
                .drain(..)
                .map(|entry| (entry.template_id, entry.value)),
        );
        self.templates = templates;
        self.draft.custom_fields = pair_custom_fields(&self.templates, &values);
    }

    /// Field-level check of the draft; no network involved.
    pub fn validate(&self) -> Result<()> {
        self.draft.validate()?;
        Ok(())
    }
}

/// Entries for `templates` in template order. Inactive templates only show
/// up when they already hold a value.
fn pair_custom_fields(
    templates: &[CustomFieldTemplate],
    values: &HashMap<TemplateId, String>,
) -> Vec<CustomFieldEntry> {
    templates
        .iter()
        .filter_map(|template| {
            let value = values.get(&template.id).cloned().unwrap_or_default();
            (template.is_active || !value.trim().is_empty()).then(|| CustomFieldEntry {
                template_id: template.id,
                field_name: template.name.clone(),
                value,
            })
        })
        .collect()
}

/// Keep the first primary address, or promote the first address when none
/// is flagged.
fn normalize_primary(mut addresses: Vec<Address>) -> Vec<Address> {
    let primary = addresses.iter().position(|a| a.is_primary).unwrap_or(0);
    for (i, address) in addresses.iter_mut().enumerate() {
        address.is_primary = i == primary;
    }
    addresses
}

/// The edit surface of the detail view. Open while a form exists.
#[derive(Debug, Clone, Default)]
pub struct PatientEditor {
    form: Option<PatientForm>,
}

impl PatientEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, patient: &Patient, templates: Vec<CustomFieldTemplate>) {
        self.form = Some(PatientForm::for_patient(patient, templates));
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn form(&self) -> Option<&PatientForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut PatientForm> {
        self.form.as_mut()
    }

    /// Discard the draft.
    pub fn close(&mut self) {
        self.form = None;
    }
}
