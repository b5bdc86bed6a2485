//! Turning drafts into API mutations.

use std::sync::Arc;

use crate::api::PatientApi;
use crate::error::{CoreError, Result};
use crate::events::EventBroadcaster;
use crate::feedback::NoticeBoard;
use crate::form::{PatientDraft, PatientEditor, PatientForm};
use crate::model::{Address, CustomFieldValue, Patient, PatientPayload, PatientStatus};

pub const CREATED_NOTICE: &str = "Patient successfully added!";
pub const CREATE_FAILED_NOTICE: &str = "Failed to add patient";
pub const UPDATED_NOTICE: &str = "Patient updated";
pub const UPDATE_FAILED_NOTICE: &str = "Failed to update patient";
pub const DELETED_NOTICE: &str = "Patient deleted";
pub const DELETE_FAILED_NOTICE: &str = "Failed to delete patient";

/// Validate `draft` and build the request body.
///
/// Addresses with every location field blank and custom fields with a blank
/// value are left out. If the primary address was one of the blank ones,
/// the first remaining address becomes primary.
pub fn prepare_payload(draft: &PatientDraft) -> Result<PatientPayload> {
    validator::Validate::validate(draft)?;
    let status: PatientStatus = draft.status.parse()?;

    let mut addresses: Vec<Address> = draft
        .addresses
        .iter()
        .filter(|a| !a.is_blank())
        .cloned()
        .collect();
    if !addresses.iter().any(|a| a.is_primary)
        && let Some(first) = addresses.first_mut()
    {
        first.is_primary = true;
    }

    let custom_fields = draft
        .custom_fields
        .iter()
        .filter_map(|entry| {
            let value = entry.value.trim();
            (!value.is_empty()).then(|| CustomFieldValue {
                template_id: entry.template_id,
                value: value.to_string(),
            })
        })
        .collect();

    let middle_name = draft.middle_name.trim();
    Ok(PatientPayload {
        first_name: draft.first_name.trim().to_string(),
        middle_name: (!middle_name.is_empty()).then(|| middle_name.to_string()),
        last_name: draft.last_name.trim().to_string(),
        date_of_birth: draft.date_of_birth.trim().to_string(),
        status,
        addresses,
        custom_fields,
    })
}

/// Sends create, update and delete requests and fans out the follow-ups:
/// view invalidation and user notices.
#[derive(Clone)]
pub struct SubmissionPipeline {
    api: Arc<dyn PatientApi>,
    events: EventBroadcaster,
}

impl SubmissionPipeline {
    pub fn new(api: Arc<dyn PatientApi>, events: EventBroadcaster) -> Self {
        Self { api, events }
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Create a patient from the add form.
    ///
    /// A validation failure returns before any request. On an API failure
    /// the draft is left as it was so the user can retry.
    pub async fn create(&self, form: &mut PatientForm, notices: &mut NoticeBoard) -> Result<Patient> {
        let payload = prepare_payload(form.draft())?;
        match self.api.create_patient(&payload).await {
            Ok(patient) => {
                tracing::info!(patient_id = %patient.id, "patient created");
                form.reset();
                self.events.send_patient_list_invalidated();
                notices.success(CREATED_NOTICE);
                Ok(patient)
            }
            Err(e) => {
                tracing::warn!(error = %e, "patient create failed");
                notices.error(e.user_message(CREATE_FAILED_NOTICE));
                Err(e)
            }
        }
    }

    /// Save the open edit form. On success the editor closes; on failure it
    /// stays open with the draft intact.
    pub async fn update(
        &self,
        editor: &mut PatientEditor,
        notices: &mut NoticeBoard,
    ) -> Result<Patient> {
        let form = editor
            .form()
            .ok_or_else(|| CoreError::configuration("no patient is being edited"))?;
        let id = form
            .patient_id()
            .ok_or_else(|| CoreError::configuration("edit form has no patient id"))?
            .to_string();
        let payload = prepare_payload(form.draft())?;

        match self.api.update_patient(&id, &payload).await {
            Ok(patient) => {
                tracing::info!(patient_id = %id, "patient updated");
                self.events.send_patient_list_invalidated();
                self.events.send_patient_invalidated(id);
                editor.close();
                notices.success(UPDATED_NOTICE);
                Ok(patient)
            }
            Err(e) => {
                tracing::warn!(patient_id = %id, error = %e, "patient update failed");
                notices.error(e.user_message(UPDATE_FAILED_NOTICE));
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &str, notices: &mut NoticeBoard) -> Result<()> {
        match self.api.delete_patient(id).await {
            Ok(()) => {
                tracing::info!(patient_id = %id, "patient deleted");
                self.events.send_patient_list_invalidated();
                self.events.send_patient_invalidated(id);
                notices.success(DELETED_NOTICE);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(patient_id = %id, error = %e, "patient delete failed");
                notices.error(e.user_message(DELETE_FAILED_NOTICE));
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Call, FakeApi, patient, template};
    use crate::events::ViewEvent;
    use crate::feedback::NoticeKind;
    use crate::form::{AddressField, DraftField};

    fn filled_form(templates: Vec<crate::model::CustomFieldTemplate>) -> PatientForm {
        let mut form = PatientForm::new(templates);
        form.set_field(DraftField::FirstName, " Ada ");
        form.set_field(DraftField::LastName, "Lovelace");
        form.set_field(DraftField::DateOfBirth, "1815-12-10");
        form.set_field(DraftField::Status, "ACTIVE");
        form
    }

    fn pipeline(api: &Arc<FakeApi>) -> SubmissionPipeline {
        SubmissionPipeline::new(api.clone(), EventBroadcaster::new())
    }

    #[test]
    fn test_blank_addresses_are_dropped() {
        let mut form = filled_form(vec![]);
        form.add_address();
        assert_eq!(form.draft().addresses.len(), 2);

        let payload = prepare_payload(form.draft()).unwrap();
        assert!(payload.addresses.is_empty());
    }

    #[test]
    fn test_blank_custom_fields_are_dropped() {
        let mut form = filled_form(vec![template(1, "A", true), template(2, "B", true)]);
        form.set_custom_field(1, " ");
        form.set_custom_field(2, "x");

        let payload = prepare_payload(form.draft()).unwrap();
        assert_eq!(
            payload.custom_fields,
            vec![CustomFieldValue { template_id: 2, value: "x".to_string() }]
        );
    }

    #[test]
    fn test_payload_trims_and_omits_blank_middle_name() {
        let mut form = filled_form(vec![]);
        form.set_field(DraftField::MiddleName, "  ");
        let payload = prepare_payload(form.draft()).unwrap();
        assert_eq!(payload.first_name, "Ada");
        assert_eq!(payload.middle_name, None);
        assert_eq!(payload.status, PatientStatus::Active);
    }

    #[test]
    fn test_blank_primary_moves_to_first_remaining() {
        let mut form = filled_form(vec![]);
        form.add_address();
        form.set_address_field(1, AddressField::City, "Boston");

        let payload = prepare_payload(form.draft()).unwrap();
        assert_eq!(payload.addresses.len(), 1);
        assert_eq!(payload.addresses[0].city, "Boston");
        assert!(payload.addresses[0].is_primary);
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_request() {
        let api = Arc::new(FakeApi::default());
        let mut form = PatientForm::new(vec![]);
        let mut notices = NoticeBoard::new();

        let err = pipeline(&api).create(&mut form, &mut notices).await.unwrap_err();
        assert!(err.is_validation_error());
        assert!(api.calls().is_empty());
        assert!(notices.current().is_none());
    }

    #[tokio::test]
    async fn test_create_success_resets_and_invalidates() {
        let api = Arc::new(FakeApi::default());
        let pipeline = pipeline(&api);
        let mut events = pipeline.events().subscribe();
        let mut form = filled_form(vec![template(1, "A", true)]);
        form.set_custom_field(1, "value");
        let mut notices = NoticeBoard::new();

        let created = pipeline.create(&mut form, &mut notices).await.unwrap();
        assert_eq!(created.first_name, "Ada");

        assert!(form.draft().first_name.is_empty());
        assert_eq!(form.draft().custom_fields[0].value, "");
        assert_eq!(events.recv().await.unwrap(), ViewEvent::PatientListInvalidated);

        let notice = notices.current().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, CREATED_NOTICE);
        assert!(matches!(&api.calls()[0], Call::Create(p) if p.custom_fields.len() == 1));
    }

    #[tokio::test]
    async fn test_create_failure_keeps_draft_and_shows_detail() {
        let api = Arc::new(FakeApi::failing(400, Some("Duplicate patient")));
        let mut form = filled_form(vec![]);
        let before = form.draft().clone();
        let mut notices = NoticeBoard::new();

        let err = pipeline(&api).create(&mut form, &mut notices).await.unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(form.draft(), &before);
        assert_eq!(notices.current().unwrap().text, "Duplicate patient");
    }

    #[tokio::test]
    async fn test_create_failure_without_detail_uses_generic_notice() {
        let api = Arc::new(FakeApi::failing(500, None));
        let mut form = filled_form(vec![]);
        let mut notices = NoticeBoard::new();

        pipeline(&api).create(&mut form, &mut notices).await.unwrap_err();
        let notice = notices.current().unwrap();
        assert!(notice.is_error());
        assert_eq!(notice.text, CREATE_FAILED_NOTICE);
    }

    #[tokio::test]
    async fn test_update_success_closes_editor() {
        let api = Arc::new(FakeApi::default());
        let pipeline = pipeline(&api);
        let mut events = pipeline.events().subscribe();
        let mut editor = PatientEditor::new();
        editor.open(&patient("p1", "Ada", "Lovelace"), vec![]);
        editor.form_mut().unwrap().set_field(DraftField::LastName, "Byron");
        let mut notices = NoticeBoard::new();

        let updated = pipeline.update(&mut editor, &mut notices).await.unwrap();
        assert_eq!(updated.last_name, "Byron");
        assert!(!editor.is_open());
        assert_eq!(events.recv().await.unwrap(), ViewEvent::PatientListInvalidated);
        assert_eq!(events.recv().await.unwrap(), ViewEvent::patient("p1"));
        assert_eq!(notices.current().unwrap().text, UPDATED_NOTICE);
        assert!(matches!(&api.calls()[0], Call::Update(id, _) if id == "p1"));
    }

    #[tokio::test]
    async fn test_update_failure_keeps_editor_open() {
        let api = Arc::new(FakeApi::failing(409, Some("Conflict")));
        let mut editor = PatientEditor::new();
        editor.open(&patient("p1", "Ada", "Lovelace"), vec![]);
        let mut notices = NoticeBoard::new();

        let err = pipeline(&api).update(&mut editor, &mut notices).await.unwrap_err();
        assert!(matches!(err, CoreError::Api { status: 409, .. }));
        assert!(editor.is_open());
        assert_eq!(notices.current().unwrap().text, "Conflict");
    }

    #[tokio::test]
    async fn test_update_without_open_editor() {
        let api = Arc::new(FakeApi::default());
        let mut editor = PatientEditor::new();
        let mut notices = NoticeBoard::new();
        assert!(pipeline(&api).update(&mut editor, &mut notices).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let api = Arc::new(FakeApi::default());
        api.patients.lock().unwrap().push(patient("p1", "Ada", "Lovelace"));
        let mut notices = NoticeBoard::new();

        pipeline(&api).delete("p1", &mut notices).await.unwrap();
        assert!(api.patients.lock().unwrap().is_empty());
        assert_eq!(notices.current().unwrap().text, DELETED_NOTICE);
    }
}
