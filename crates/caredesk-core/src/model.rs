//! Wire types shared by the API client and the view state.

use crate::error::{CoreError, Result};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient identity as assigned by the API.
pub type PatientId = String;

/// Custom field template identity.
pub type TemplateId = i64;

/// Lifecycle stage of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatientStatus {
    #[default]
    Inquiry,
    Onboarding,
    Active,
    Churned,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Inquiry,
        PatientStatus::Onboarding,
        PatientStatus::Active,
        PatientStatus::Churned,
    ];

    /// Wire spelling, e.g. `ACTIVE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "INQUIRY",
            PatientStatus::Onboarding => "ONBOARDING",
            PatientStatus::Active => "ACTIVE",
            PatientStatus::Churned => "CHURNED",
        }
    }

    /// Human label, e.g. `Active`.
    pub fn label(&self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "Inquiry",
            PatientStatus::Onboarding => "Onboarding",
            PatientStatus::Active => "Active",
            PatientStatus::Churned => "Churned",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        PatientStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_status(s))
    }
}

/// One postal address of a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl Address {
    pub fn empty(is_primary: bool) -> Self {
        Self {
            is_primary,
            ..Self::default()
        }
    }

    /// True when all four location fields are blank.
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.zip_code]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    /// Single-line rendering, skipping blank parts.
    pub fn one_line(&self) -> String {
        [&self.street, &self.city, &self.state, &self.zip_code]
            .iter()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Stored value of one custom field for one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub template_id: TemplateId,
    #[serde(default)]
    pub value: String,
}

/// A patient record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(
        default,
        deserialize_with = "crate::time::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "crate::time::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        let middle = self.middle_name.as_deref().map(str::trim).unwrap_or("");
        if middle.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            format!("{} {} {}", self.first_name, middle, self.last_name)
        }
    }

    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_primary)
    }
}

/// Request body for patient create and update.
///
/// Server-managed timestamps have no place here, so an update can never
/// send them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPayload {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    pub status: PatientStatus,
    pub addresses: Vec<Address>,
    pub custom_fields: Vec<CustomFieldValue>,
}

fn default_active() -> bool {
    true
}

/// Tenant-wide custom field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request body for template create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

/// One page of a paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: PatientStatus,
    pub count: u64,
}

/// Dashboard counters from `GET /patients/stats/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientStats {
    #[serde(default)]
    pub status_distribution: Vec<StatusCount>,
    pub new_patients_30d: u64,
    #[serde(default)]
    pub monthly_growth: Option<f64>,
    pub total_patients: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&PatientStatus::Onboarding).unwrap(), "\"ONBOARDING\"");
        let status: PatientStatus = serde_json::from_str("\"CHURNED\"").unwrap();
        assert_eq!(status, PatientStatus::Churned);
        assert_eq!(PatientStatus::default(), PatientStatus::Inquiry);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ACTIVE".parse::<PatientStatus>().unwrap(), PatientStatus::Active);
        assert_eq!("active".parse::<PatientStatus>().unwrap(), PatientStatus::Active);
        assert!(matches!(
            "ARCHIVED".parse::<PatientStatus>(),
            Err(CoreError::InvalidStatus(_))
        ));
        assert!("".parse::<PatientStatus>().is_err());
    }

    #[test]
    fn test_address_blank_detection() {
        assert!(Address::empty(true).is_blank());

        let whitespace = Address {
            street: "  ".to_string(),
            ..Address::default()
        };
        assert!(whitespace.is_blank());

        let zip_only = Address {
            zip_code: "02139".to_string(),
            ..Address::default()
        };
        assert!(!zip_only.is_blank());
        assert_eq!(zip_only.one_line(), "02139");
    }

    #[test]
    fn test_patient_from_api_json() {
        let patient: Patient = serde_json::from_value(json!({
            "id": "6f1c2b0e-8d4a-4c1e-9a59-0f6f3c2d1b7a",
            "first_name": "Ada",
            "middle_name": null,
            "last_name": "Lovelace",
            "date_of_birth": "1815-12-10",
            "status": "ACTIVE",
            "addresses": [
                {"id": "a1", "street": "12 St James's Sq", "city": "London", "state": "", "zip_code": "SW1Y", "is_primary": true}
            ],
            "custom_fields": [{"template_id": 3, "value": "none", "field_name": "Allergies"}],
            "created_at": "2024-01-05T10:00:00.123456Z",
            "updated_at": "2024-01-06T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(patient.full_name(), "Ada Lovelace");
        assert_eq!(patient.status, PatientStatus::Active);
        assert_eq!(patient.primary_address().unwrap().city, "London");
        assert_eq!(patient.custom_fields[0].template_id, 3);
        assert!(patient.created_at.is_some());
    }

    #[test]
    fn test_patient_minimal_json() {
        // list endpoints may omit nested collections
        let patient: Patient = serde_json::from_value(json!({
            "id": "p1",
            "first_name": "Grace",
            "middle_name": "Brewster",
            "last_name": "Hopper",
            "date_of_birth": "1906-12-09"
        }))
        .unwrap();

        assert_eq!(patient.full_name(), "Grace Brewster Hopper");
        assert_eq!(patient.status, PatientStatus::Inquiry);
        assert!(patient.addresses.is_empty());
        assert!(patient.created_at.is_none());
    }

    #[test]
    fn test_naive_timestamps_do_not_reject_patient() {
        let page: Page<Patient> = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": "p1",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "date_of_birth": "1815-12-10",
                "created_at": "2024-01-05T10:00:00.123456",
                "updated_at": "2024-01-06T10:00:00Z"
            }]
        }))
        .unwrap();

        let patient = &page.results[0];
        assert!(patient.created_at.is_none());
        assert!(patient.updated_at.is_some());
    }

    #[test]
    fn test_payload_has_no_timestamps() {
        let payload = PatientPayload {
            first_name: "Ada".to_string(),
            middle_name: None,
            last_name: "Lovelace".to_string(),
            date_of_birth: "1815-12-10".to_string(),
            status: PatientStatus::Active,
            addresses: vec![],
            custom_fields: vec![],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("created_at").is_none());
        assert!(value.get("updated_at").is_none());
        assert_eq!(value["middle_name"], serde_json::Value::Null);
        assert_eq!(value["status"], "ACTIVE");
    }

    #[test]
    fn test_page_and_stats_json() {
        let page: Page<CustomFieldTemplate> = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 1, "name": "Allergies"}]
        }))
        .unwrap();
        assert_eq!(page.count, 1);
        assert!(page.results[0].is_active);
        assert_eq!(page.results[0].description, "");

        let stats: PatientStats = serde_json::from_value(json!({
            "status_distribution": [{"status": "ACTIVE", "count": 4}],
            "new_patients_30d": 2,
            "total_patients": 9
        }))
        .unwrap();
        assert_eq!(stats.monthly_growth, None);
        assert_eq!(stats.status_distribution[0].status, PatientStatus::Active);
    }
}
