//! View invalidation events.
//!
//! After a mutation succeeds, the view that caused it does not refetch other
//! views itself. It broadcasts which cached views went stale, and each view
//! that holds data (patient list, patient detail, template lists) decides
//! whether to refetch.
//!
//! ```text
//!  SubmissionPipeline ─┐                      ┌─> PatientListController
//!  TemplateEditor ─────┼─> EventBroadcaster ──┼─> PatientDetail
//!                      │   (tokio broadcast)  └─> PatientForm (templates)
//! ```
//!
//! - [`types`]: the [`ViewEvent`] enum
//! - [`broadcaster`]: the bus

pub mod broadcaster;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use types::ViewEvent;
