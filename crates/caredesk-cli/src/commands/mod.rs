pub mod patients;
pub mod stats;
pub mod templates;
