//! The seam between view state and the REST API.
//!
//! Every suspension point of the client goes through [`PatientApi`]. The
//! HTTP implementation lives in the CLI crate; tests use in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::listing::PatientQuery;
use crate::model::{
    CustomFieldTemplate, Patient, PatientPayload, PatientStats, Page, TemplateId, TemplatePayload,
};

#[async_trait]
pub trait PatientApi: Send + Sync {
    /// `GET /patients/` with the list query.
    async fn list_patients(&self, query: &PatientQuery) -> Result<Page<Patient>>;

    /// `GET /patients/{id}/`. A 404 surfaces as [`crate::CoreError::NotFound`].
    async fn get_patient(&self, id: &str) -> Result<Patient>;

    async fn create_patient(&self, payload: &PatientPayload) -> Result<Patient>;

    async fn update_patient(&self, id: &str, payload: &PatientPayload) -> Result<Patient>;

    async fn delete_patient(&self, id: &str) -> Result<()>;

    async fn patient_stats(&self) -> Result<PatientStats>;

    async fn list_templates(&self) -> Result<Vec<CustomFieldTemplate>>;

    async fn create_template(&self, payload: &TemplatePayload) -> Result<CustomFieldTemplate>;

    async fn update_template(
        &self,
        id: TemplateId,
        payload: &TemplatePayload,
    ) -> Result<CustomFieldTemplate>;

    async fn delete_template(&self, id: TemplateId) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::CoreError;
    use crate::model::PatientStatus;
    use std::sync::Mutex;

    /// A call the fake received, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        List(PatientQuery),
        Get(String),
        Create(PatientPayload),
        Update(String, PatientPayload),
        Delete(String),
        Stats,
        ListTemplates,
        CreateTemplate(TemplatePayload),
        UpdateTemplate(TemplateId, TemplatePayload),
        DeleteTemplate(TemplateId),
    }

    /// Records every call; fails with the configured status when set.
    #[derive(Default)]
    pub struct FakeApi {
        pub calls: Mutex<Vec<Call>>,
        pub fail_with: Mutex<Option<(u16, Option<String>)>>,
        pub patients: Mutex<Vec<Patient>>,
        pub templates: Mutex<Vec<CustomFieldTemplate>>,
    }

    impl FakeApi {
        pub fn failing(status: u16, detail: Option<&str>) -> Self {
            let api = Self::default();
            *api.fail_with.lock().unwrap() = Some((status, detail.map(str::to_string)));
            api
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with.lock().unwrap().clone() {
                Some((status, detail)) => Err(CoreError::api(status, detail)),
                None => Ok(()),
            }
        }

        fn to_patient(id: &str, payload: &PatientPayload) -> Patient {
            Patient {
                id: id.to_string(),
                first_name: payload.first_name.clone(),
                middle_name: payload.middle_name.clone(),
                last_name: payload.last_name.clone(),
                date_of_birth: payload.date_of_birth.clone(),
                status: payload.status,
                addresses: payload.addresses.clone(),
                custom_fields: payload.custom_fields.clone(),
                created_at: None,
                updated_at: None,
            }
        }
    }

    pub fn patient(id: &str, first: &str, last: &str) -> Patient {
        Patient {
            id: id.to_string(),
            first_name: first.to_string(),
            middle_name: None,
            last_name: last.to_string(),
            date_of_birth: "1990-01-01".to_string(),
            status: PatientStatus::Active,
            addresses: vec![],
            custom_fields: vec![],
            created_at: None,
            updated_at: None,
        }
    }

    pub fn template(id: TemplateId, name: &str, is_active: bool) -> CustomFieldTemplate {
        CustomFieldTemplate {
            id,
            name: name.to_string(),
            description: String::new(),
            is_active,
        }
    }

    #[async_trait]
    impl PatientApi for FakeApi {
        async fn list_patients(&self, query: &PatientQuery) -> Result<Page<Patient>> {
            self.record(Call::List(query.clone()))?;
            let patients = self.patients.lock().unwrap().clone();
            Ok(Page {
                count: patients.len() as u64,
                next: None,
                previous: None,
                results: patients,
            })
        }

        async fn get_patient(&self, id: &str) -> Result<Patient> {
            self.record(Call::Get(id.to_string()))?;
            self.patients
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("patients", id))
        }

        async fn create_patient(&self, payload: &PatientPayload) -> Result<Patient> {
            self.record(Call::Create(payload.clone()))?;
            let created = Self::to_patient("new-patient", payload);
            self.patients.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_patient(&self, id: &str, payload: &PatientPayload) -> Result<Patient> {
            self.record(Call::Update(id.to_string(), payload.clone()))?;
            Ok(Self::to_patient(id, payload))
        }

        async fn delete_patient(&self, id: &str) -> Result<()> {
            self.record(Call::Delete(id.to_string()))?;
            self.patients.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn patient_stats(&self) -> Result<PatientStats> {
            self.record(Call::Stats)?;
            Ok(PatientStats {
                status_distribution: vec![],
                new_patients_30d: 0,
                monthly_growth: None,
                total_patients: self.patients.lock().unwrap().len() as u64,
            })
        }

        async fn list_templates(&self) -> Result<Vec<CustomFieldTemplate>> {
            self.record(Call::ListTemplates)?;
            Ok(self.templates.lock().unwrap().clone())
        }

        async fn create_template(&self, payload: &TemplatePayload) -> Result<CustomFieldTemplate> {
            self.record(Call::CreateTemplate(payload.clone()))?;
            let mut templates = self.templates.lock().unwrap();
            let id = templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            let created = CustomFieldTemplate {
                id,
                name: payload.name.clone(),
                description: payload.description.clone(),
                is_active: payload.is_active,
            };
            templates.push(created.clone());
            Ok(created)
        }

        async fn update_template(
            &self,
            id: TemplateId,
            payload: &TemplatePayload,
        ) -> Result<CustomFieldTemplate> {
            self.record(Call::UpdateTemplate(id, payload.clone()))?;
            Ok(CustomFieldTemplate {
                id,
                name: payload.name.clone(),
                description: payload.description.clone(),
                is_active: payload.is_active,
            })
        }

        async fn delete_template(&self, id: TemplateId) -> Result<()> {
            self.record(Call::DeleteTemplate(id))?;
            self.templates.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }
}
