//! Settings view state for custom field templates.

use serde::Serialize;

use crate::api::PatientApi;
use crate::error::Result;
use crate::events::EventBroadcaster;
use crate::feedback::NoticeBoard;
use crate::model::{CustomFieldTemplate, TemplateId, TemplatePayload};

pub const SAVED_NOTICE: &str = "Custom fields saved";
pub const REMOVE_FAILED_NOTICE: &str = "Failed to remove field";

/// One editable row. `id` is `None` until the row has been saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRow {
    pub id: Option<TemplateId>,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

impl TemplateRow {
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    fn payload(&self) -> TemplatePayload {
        TemplatePayload {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
        }
    }
}

impl From<CustomFieldTemplate> for TemplateRow {
    fn from(template: CustomFieldTemplate) -> Self {
        Self {
            id: Some(template.id),
            name: template.name,
            description: template.description,
            is_active: template.is_active,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateEditor {
    rows: Vec<TemplateRow>,
    events: EventBroadcaster,
}

impl TemplateEditor {
    pub fn new(events: EventBroadcaster) -> Self {
        Self {
            rows: Vec::new(),
            events,
        }
    }

    pub fn rows(&self) -> &[TemplateRow] {
        &self.rows
    }

    /// Replace the edited rows with the server's list.
    pub fn load(&mut self, templates: Vec<CustomFieldTemplate>) {
        self.rows = templates.into_iter().map(TemplateRow::from).collect();
    }

    /// Append an unsaved, active row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(TemplateRow {
            id: None,
            name: String::new(),
            description: String::new(),
            is_active: true,
        });
        self.rows.len() - 1
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.name = name.into();
        }
    }

    pub fn set_description(&mut self, index: usize, description: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.description = description.into();
        }
    }

    pub fn set_active(&mut self, index: usize, is_active: bool) {
        if let Some(row) = self.rows.get_mut(index) {
            row.is_active = is_active;
        }
    }

    /// Drop the row at `index`. A saved row is deleted on the server first
    /// and stays in place if that fails.
    pub async fn remove_row(
        &mut self,
        api: &dyn PatientApi,
        index: usize,
        notices: &mut NoticeBoard,
    ) -> Result<Option<TemplateRow>> {
        let Some(row) = self.rows.get(index) else {
            return Ok(None);
        };
        if let Some(id) = row.id {
            if let Err(e) = api.delete_template(id).await {
                tracing::warn!(template_id = id, error = %e, "template delete failed");
                notices.error(e.user_message(REMOVE_FAILED_NOTICE));
                return Err(e);
            }
            tracing::info!(template_id = id, "template deleted");
            self.events.send_templates_invalidated();
        }
        Ok(Some(self.rows.remove(index)))
    }

    /// Create unsaved rows and update saved ones, in row order. Rows with a
    /// blank name are skipped. The first failure stops the save; rows saved
    /// before it keep their new ids so a retry does not create duplicates.
    pub async fn save(&mut self, api: &dyn PatientApi, notices: &mut NoticeBoard) -> Result<usize> {
        let mut saved = 0;
        for row in self.rows.iter_mut().filter(|r| !r.name.trim().is_empty()) {
            let payload = row.payload();
            let result = match row.id {
                Some(id) => api.update_template(id, &payload).await,
                None => api.create_template(&payload).await,
            };
            match result {
                Ok(template) => {
                    tracing::debug!(template_id = template.id, name = %template.name, "template saved");
                    *row = TemplateRow::from(template);
                    saved += 1;
                }
                Err(e) => {
                    tracing::warn!(name = %row.name, error = %e, "template save failed");
                    notices.error(e.user_message(&format!("Failed to save field: {}", row.name)));
                    if saved > 0 {
                        self.events.send_templates_invalidated();
                    }
                    return Err(e);
                }
            }
        }
        self.events.send_templates_invalidated();
        notices.success(SAVED_NOTICE);
        Ok(saved)
    }
}
