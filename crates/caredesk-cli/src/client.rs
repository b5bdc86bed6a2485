use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use caredesk_core::{
    ClientConfig, CoreError, CustomFieldTemplate, Page, Patient, PatientApi, PatientPayload,
    PatientQuery, PatientStats, Result, TemplateId, TemplatePayload,
};

/// HTTP implementation of [`PatientApi`].
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url: Url = self.config.endpoint(path)?;
        tracing::debug!(%method, %url, "api request");
        Ok(self
            .http
            .request(method, url)
            .header("Accept", "application/json"))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let body = handle_response(send(req).await?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(method, path)?.json(body)).await
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        handle_response(send(self.request(method, path)?).await?).await?;
        Ok(())
    }
}

async fn send(req: RequestBuilder) -> Result<reqwest::Response> {
    req.send()
        .await
        .map_err(|e| CoreError::transport(format!("Failed to connect to server: {e}")))
}

/// Return the body of a 2xx response, or map the status and the server's
/// error body onto [`CoreError::Api`].
async fn handle_response(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| CoreError::transport(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), body = %body, "api error response");
        return Err(CoreError::api(status.as_u16(), error_detail(&body)));
    }
    Ok(body)
}

/// `{"detail": "..."}` when present. Otherwise field errors of the form
/// `{"first_name": ["This field is required."]}` are joined into one line.
fn error_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    if let Some(detail) = json.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    let fields = json.as_object()?;
    let msgs: Vec<String> = fields
        .iter()
        .filter_map(|(field, errors)| {
            let errors: Vec<&str> = errors.as_array()?.iter().filter_map(Value::as_str).collect();
            (!errors.is_empty()).then(|| format!("{field}: {}", errors.join(" ")))
        })
        .collect();
    (!msgs.is_empty()).then(|| msgs.join("; "))
}

#[async_trait]
impl PatientApi for ApiClient {
    async fn list_patients(&self, query: &PatientQuery) -> Result<Page<Patient>> {
        let req = self.request(Method::GET, "patients/")?.query(&query.to_pairs());
        self.send(req).await
    }

    async fn get_patient(&self, id: &str) -> Result<Patient> {
        let req = self.request(Method::GET, &format!("patients/{id}/"))?;
        match self.send(req).await {
            Err(CoreError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(CoreError::not_found("patients", id))
            }
            other => other,
        }
    }

    async fn create_patient(&self, payload: &PatientPayload) -> Result<Patient> {
        self.send_json(Method::POST, "patients/", payload).await
    }

    async fn update_patient(&self, id: &str, payload: &PatientPayload) -> Result<Patient> {
        self.send_json(Method::PUT, &format!("patients/{id}/"), payload)
            .await
    }

    async fn delete_patient(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("patients/{id}/"))
            .await
    }

    async fn patient_stats(&self) -> Result<PatientStats> {
        self.send(self.request(Method::GET, "patients/stats/")?).await
    }

    async fn list_templates(&self) -> Result<Vec<CustomFieldTemplate>> {
        self.send(self.request(Method::GET, "custom-field-templates/")?)
            .await
    }

    async fn create_template(&self, payload: &TemplatePayload) -> Result<CustomFieldTemplate> {
        self.send_json(Method::POST, "custom-field-templates/", payload)
            .await
    }

    async fn update_template(
        &self,
        id: TemplateId,
        payload: &TemplatePayload,
    ) -> Result<CustomFieldTemplate> {
        self.send_json(Method::PUT, &format!("custom-field-templates/{id}/"), payload)
            .await
    }

    async fn delete_template(&self, id: TemplateId) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("custom-field-templates/{id}/"))
            .await
    }
}
