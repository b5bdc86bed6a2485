use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use caredesk_core::{
    AddressField, ClientConfig, CoreError, CustomFieldTemplate, DraftField, EventBroadcaster, NoticeBoard,
    Patient, PatientApi, PatientDetail, PatientEditor, PatientForm, PatientListController,
    SubmissionPipeline,
};

use crate::cli::{CreateArgs, ListArgs, OutputFormat, PatientFields, UpdateArgs};
use crate::output::{
    pagination_line, patient_table, print_error, print_field_errors, print_json, print_notice,
    print_patient,
};

pub async fn list(
    api: &dyn PatientApi,
    config: &ClientConfig,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut list = PatientListController::with_config(config);
    if let Some(search) = &args.search {
        list.set_search_text(search.trim());
        list.apply_search_now();
    }
    list.set_status(args.status);
    list.set_ordering(args.ordering);

    list.refresh(api).await?;
    if args.page != 1 {
        if !list.go_to_page(args.page) {
            anyhow::bail!(
                "Page {} is out of range (1..={})",
                args.page,
                list.total_pages().max(1)
            );
        }
        list.refresh(api).await?;
    }

    let page = list.results().context("No patient page was loaded")?;
    match format {
        OutputFormat::Json => print_json(page)?,
        OutputFormat::Table => {
            println!("{}", patient_table(page));
            let links = pagination_line(&list.page_links(), list.has_previous(), list.has_next());
            if !links.is_empty() {
                println!("{links}");
            }
            println!(
                "Page {} of {} ({} patients)",
                list.page(),
                list.total_pages().max(1),
                list.total_count()
            );
        }
    }
    Ok(())
}

pub async fn show(api: &dyn PatientApi, id: &str, format: OutputFormat) -> Result<()> {
    let patient = load_patient(api, id).await?;
    match format {
        OutputFormat::Json => print_json(&patient)?,
        OutputFormat::Table => {
            let templates = api.list_templates().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not load custom field names");
                Vec::new()
            });
            print_patient(&patient, &templates);
        }
    }
    Ok(())
}

pub async fn create(api: Arc<dyn PatientApi>, args: &CreateArgs, format: OutputFormat) -> Result<()> {
    let templates = load_templates(api.as_ref()).await?;
    let mut form = PatientForm::new(templates);
    form.set_field(DraftField::FirstName, args.first_name.as_str());
    form.set_field(DraftField::LastName, args.last_name.as_str());
    form.set_field(DraftField::DateOfBirth, args.date_of_birth.as_str());
    apply_fields(&mut form, &args.fields)?;

    let pipeline = SubmissionPipeline::new(api, EventBroadcaster::new());
    let mut notices = NoticeBoard::new();
    let result = pipeline.create(&mut form, &mut notices).await;
    report(result, &notices, format)
}

pub async fn update(api: Arc<dyn PatientApi>, args: &UpdateArgs, format: OutputFormat) -> Result<()> {
    let patient = load_patient(api.as_ref(), &args.id).await?;
    let templates = load_templates(api.as_ref()).await?;

    let mut editor = PatientEditor::new();
    editor.open(&patient, templates);
    let form = editor.form_mut().context("Edit form did not open")?;
    if let Some(first_name) = &args.first_name {
        form.set_field(DraftField::FirstName, first_name.as_str());
    }
    if let Some(last_name) = &args.last_name {
        form.set_field(DraftField::LastName, last_name.as_str());
    }
    if let Some(date_of_birth) = &args.date_of_birth {
        form.set_field(DraftField::DateOfBirth, date_of_birth.as_str());
    }
    apply_fields(form, &args.fields)?;

    let pipeline = SubmissionPipeline::new(api, EventBroadcaster::new());
    let mut notices = NoticeBoard::new();
    let result = pipeline.update(&mut editor, &mut notices).await;
    report(result, &notices, format)
}

pub async fn delete(api: Arc<dyn PatientApi>, id: &str) -> Result<()> {
    let pipeline = SubmissionPipeline::new(api, EventBroadcaster::new());
    let mut notices = NoticeBoard::new();
    match pipeline.delete(id, &mut notices).await {
        Ok(()) => {
            if let Some(notice) = notices.current() {
                print_notice(notice);
            }
            println!("  {}", id.cyan());
            Ok(())
        }
        Err(e) => Err(notice_error(&notices, e)),
    }
}

async fn load_patient(api: &dyn PatientApi, id: &str) -> Result<Patient> {
    match PatientDetail::load(api, id).await {
        PatientDetail::Loaded(patient) => Ok(patient),
        PatientDetail::NotFound(id) => anyhow::bail!("Patient {id} not found"),
        PatientDetail::Failed(message) => anyhow::bail!(message),
    }
}

async fn load_templates(api: &dyn PatientApi) -> Result<Vec<CustomFieldTemplate>> {
    api.list_templates()
        .await
        .context("Failed to load custom field templates")
}

/// Apply the flags shared by create and update. Addresses, when given,
/// replace every address already on the form.
fn apply_fields(form: &mut PatientForm, fields: &PatientFields) -> Result<()> {
    if let Some(middle_name) = &fields.middle_name {
        form.set_field(DraftField::MiddleName, middle_name.as_str());
    }
    if let Some(status) = &fields.status {
        form.set_field(DraftField::Status, status.as_str());
    }

    if !fields.addresses.is_empty() {
        while form.remove_address(0).is_some() {}
        for (index, raw) in fields.addresses.iter().enumerate() {
            form.add_address();
            let parts = [
                AddressField::Street,
                AddressField::City,
                AddressField::State,
                AddressField::ZipCode,
            ];
            for (field, value) in parts.into_iter().zip(parse_address(raw)?) {
                form.set_address_field(index, field, value);
            }
        }
    }
    if let Some(primary) = fields.primary {
        if primary == 0 || !form.set_primary_address(primary - 1) {
            anyhow::bail!(
                "--primary {primary} does not match an address (1..={})",
                form.draft().addresses.len()
            );
        }
    }

    for (template_id, value) in &fields.fields {
        if !form.set_custom_field(*template_id, value.as_str()) {
            anyhow::bail!("Unknown or inactive custom field template: {template_id}");
        }
    }
    Ok(())
}

/// `street|city|state|zip`; trailing parts may be left out.
fn parse_address(raw: &str) -> Result<Vec<String>> {
    let parts: Vec<String> = raw.split('|').map(|p| p.trim().to_string()).collect();
    if parts.len() > 4 {
        anyhow::bail!("Invalid address \"{raw}\". Expected street|city|state|zip");
    }
    Ok(parts)
}

fn report(result: caredesk_core::Result<Patient>, notices: &NoticeBoard, format: OutputFormat) -> Result<()> {
    match result {
        Ok(patient) => {
            if let Some(notice) = notices.current() {
                print_notice(notice);
            }
            match format {
                OutputFormat::Json => print_json(&patient)?,
                OutputFormat::Table => println!("  {} {}", patient.full_name(), patient.id.cyan()),
            }
            Ok(())
        }
        Err(e) if e.is_validation_error() => {
            print_error("Patient is invalid:");
            print_field_errors(&e.field_messages());
            Err(e).context("Nothing was sent")
        }
        Err(e) => Err(notice_error(notices, e)),
    }
}

/// The notice text is what the user should see; the error is kept as its
/// source.
fn notice_error(notices: &NoticeBoard, e: CoreError) -> anyhow::Error {
    match notices.current() {
        Some(notice) => anyhow::Error::new(e).context(notice.text.clone()),
        None => e.into(),
    }
}
