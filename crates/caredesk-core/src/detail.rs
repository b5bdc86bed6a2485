use crate::api::PatientApi;
use crate::events::ViewEvent;
use crate::model::{Patient, PatientId};

/// State of the single-patient view.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientDetail {
    Loaded(Patient),
    /// The patient does not exist; shown as a full-page failure, not a notice.
    NotFound(PatientId),
    Failed(String),
}

impl PatientDetail {
    pub async fn load(api: &dyn PatientApi, id: &str) -> Self {
        match api.get_patient(id).await {
            Ok(patient) => PatientDetail::Loaded(patient),
            Err(e) if e.is_not_found() => {
                tracing::debug!(patient_id = %id, "patient not found");
                PatientDetail::NotFound(id.to_string())
            }
            Err(e) => {
                tracing::warn!(patient_id = %id, error = %e, "patient fetch failed");
                PatientDetail::Failed(e.user_message("Failed to load patient"))
            }
        }
    }

    pub fn patient(&self) -> Option<&Patient> {
        match self {
            PatientDetail::Loaded(patient) => Some(patient),
            _ => None,
        }
    }

    /// Whether `event` makes the view for `id` stale.
    pub fn needs_reload(id: &str, event: &ViewEvent) -> bool {
        event.affects_patient(id)
    }
}
