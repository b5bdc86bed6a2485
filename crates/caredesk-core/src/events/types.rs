use crate::model::PatientId;

/// A cached view that is now stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    /// Any patient list page, whatever its filters.
    PatientListInvalidated,
    /// The detail view of one patient.
    PatientInvalidated { patient_id: PatientId },
    /// The custom field template list.
    TemplatesInvalidated,
}

impl ViewEvent {
    pub fn patient(patient_id: impl Into<PatientId>) -> Self {
        ViewEvent::PatientInvalidated {
            patient_id: patient_id.into(),
        }
    }

    /// Returns the string representation of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewEvent::PatientListInvalidated => "patient_list_invalidated",
            ViewEvent::PatientInvalidated { .. } => "patient_invalidated",
            ViewEvent::TemplatesInvalidated => "templates_invalidated",
        }
    }

    /// A changed patient may move between pages or change its row, so both
    /// kinds of patient event make list pages stale.
    pub fn affects_patient_list(&self) -> bool {
        matches!(
            self,
            ViewEvent::PatientListInvalidated | ViewEvent::PatientInvalidated { .. }
        )
    }

    pub fn affects_patient(&self, id: &str) -> bool {
        matches!(self, ViewEvent::PatientInvalidated { patient_id } if patient_id == id)
    }

    pub fn affects_templates(&self) -> bool {
        matches!(self, ViewEvent::TemplatesInvalidated)
    }
}

impl std::fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewEvent::PatientInvalidated { patient_id } => {
                write!(f, "{}({})", self.as_str(), patient_id)
            }
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_scopes() {
        let list = ViewEvent::PatientListInvalidated;
        assert!(list.affects_patient_list());
        assert!(!list.affects_patient("p1"));
        assert!(!list.affects_templates());

        let one = ViewEvent::patient("p1");
        assert!(one.affects_patient_list());
        assert!(one.affects_patient("p1"));
        assert!(!one.affects_patient("p2"));

        assert!(ViewEvent::TemplatesInvalidated.affects_templates());
        assert!(!ViewEvent::TemplatesInvalidated.affects_patient_list());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(ViewEvent::patient("p1").to_string(), "patient_invalidated(p1)");
        assert_eq!(
            ViewEvent::TemplatesInvalidated.to_string(),
            "templates_invalidated"
        );
    }
}
