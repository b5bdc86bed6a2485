use std::collections::BTreeMap;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use caredesk_core::{CustomFieldTemplate, Notice, Page, PageLink, Patient, PatientStats};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_notice(notice: &Notice) {
    if notice.is_error() {
        print_error(&notice.text);
    } else {
        print_success(&notice.text);
    }
}

/// One line per field of a failed validation.
pub fn print_field_errors(fields: &BTreeMap<String, Vec<String>>) {
    for (field, messages) in fields {
        eprintln!("  {}: {}", field.yellow(), messages.join(", "));
    }
}

pub fn patient_table(page: &Page<Patient>) -> String {
    if page.results.is_empty() {
        return "No patients found.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Date of birth", "Status", "Primary address"]);
    for p in &page.results {
        builder.push_record([
            p.id.clone(),
            p.full_name(),
            p.date_of_birth.clone(),
            p.status.label().to_string(),
            p.primary_address()
                .map(|a| a.one_line())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// `‹ 1 [2] 3 ›`; empty when everything fits on one page.
pub fn pagination_line(links: &[PageLink], has_previous: bool, has_next: bool) -> String {
    if links.len() <= 1 {
        return String::new();
    }
    let mut parts = Vec::with_capacity(links.len() + 2);
    parts.push(if has_previous { "‹" } else { " " }.to_string());
    for link in links {
        if link.active {
            parts.push(format!("[{}]", link.number));
        } else {
            parts.push(link.number.to_string());
        }
    }
    parts.push(if has_next { "›" } else { " " }.to_string());
    parts.join(" ")
}

pub fn print_patient(patient: &Patient, templates: &[CustomFieldTemplate]) {
    println!("{}: {}", "Patient".cyan(), patient.full_name());
    println!("{}: {}", "ID".cyan(), patient.id);
    println!("{}: {}", "Date of birth".cyan(), patient.date_of_birth);
    println!("{}: {}", "Status".cyan(), patient.status.label());
    if let Some(created) = &patient.created_at {
        println!("{}: {}", "Created".cyan(), created);
    }

    if !patient.addresses.is_empty() {
        println!("{}:", "Addresses".cyan());
        for address in &patient.addresses {
            let marker = if address.is_primary { " (primary)" } else { "" };
            println!("  {}{}", address.one_line(), marker.green());
        }
    }

    if !patient.custom_fields.is_empty() {
        println!("{}:", "Custom fields".cyan());
        for field in &patient.custom_fields {
            let name = templates
                .iter()
                .find(|t| t.id == field.template_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| format!("#{}", field.template_id));
            println!("  {name}: {}", field.value);
        }
    }
}

pub fn stats_table(stats: &PatientStats) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Status", "Patients"]);
    for entry in &stats.status_distribution {
        builder.push_record([entry.status.label().to_string(), entry.count.to_string()]);
    }
    let mut out = builder.build().with(Style::rounded()).to_string();
    out.push_str(&format!("\nTotal patients: {}", stats.total_patients));
    out.push_str(&format!("\nNew in the last 30 days: {}", stats.new_patients_30d));
    if let Some(growth) = stats.monthly_growth {
        out.push_str(&format!("\nMonthly growth: {growth:.1}%"));
    }
    out
}

pub fn templates_table(templates: &[CustomFieldTemplate]) -> String {
    if templates.is_empty() {
        return "No custom fields configured.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Description", "Active"]);
    for t in templates {
        builder.push_record([
            t.id.to_string(),
            t.name.clone(),
            t.description.clone(),
            if t.is_active { "yes" } else { "no" }.to_string(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
