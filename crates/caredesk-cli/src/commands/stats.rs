use anyhow::{Context, Result};

use caredesk_core::PatientApi;

use crate::cli::OutputFormat;
use crate::output::{print_json, stats_table};

pub async fn stats(api: &dyn PatientApi, format: OutputFormat) -> Result<()> {
    let stats = api
        .patient_stats()
        .await
        .context("Failed to load patient statistics")?;
    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => println!("{}", stats_table(&stats)),
    }
    Ok(())
}
