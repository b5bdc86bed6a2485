pub mod api;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod events;
pub mod feedback;
pub mod form;
pub mod listing;
pub mod model;
pub mod submit;
pub mod templates;
pub mod time;

pub use api::PatientApi;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use debounce::Debouncer;
pub use detail::PatientDetail;
pub use error::{CoreError, ErrorCategory, Result};
pub use events::{EventBroadcaster, ViewEvent};
pub use feedback::{Notice, NoticeBoard, NoticeKind};
pub use form::{AddressField, CustomFieldEntry, DraftField, PatientDraft, PatientEditor, PatientForm};
pub use listing::{FetchTicket, Ordering, PageLink, PatientListController, PatientQuery, StatusFilter};
pub use model::{
    Address, CustomFieldTemplate, CustomFieldValue, Page, Patient, PatientId, PatientPayload,
    PatientStats, PatientStatus, StatusCount, TemplateId, TemplatePayload,
};
pub use submit::{SubmissionPipeline, prepare_payload};
pub use templates::{TemplateEditor, TemplateRow};
pub use time::{Timestamp, now_utc, parse_birth_date};
