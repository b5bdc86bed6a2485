use anyhow::{Context, Result};
use colored::Colorize;

use caredesk_core::{
    CoreError, CustomFieldTemplate, EventBroadcaster, NoticeBoard, PatientApi, TemplateEditor,
    TemplateId,
};

use crate::cli::{OutputFormat, TemplateCreateArgs, TemplateUpdateArgs};
use crate::output::{print_json, print_notice, templates_table};

pub async fn list(api: &dyn PatientApi, format: OutputFormat) -> Result<()> {
    let templates = api
        .list_templates()
        .await
        .context("Failed to load custom field templates")?;
    match format {
        OutputFormat::Json => print_json(&templates)?,
        OutputFormat::Table => println!("{}", templates_table(&templates)),
    }
    Ok(())
}

pub async fn create(api: &dyn PatientApi, args: &TemplateCreateArgs, format: OutputFormat) -> Result<()> {
    if args.name.trim().is_empty() {
        anyhow::bail!("Template name must not be blank");
    }
    let mut editor = TemplateEditor::new(EventBroadcaster::new());
    let row = editor.add_row();
    editor.set_name(row, args.name.as_str());
    editor.set_description(row, args.description.as_str());
    editor.set_active(row, !args.inactive);
    save(api, &mut editor, format).await
}

pub async fn update(api: &dyn PatientApi, args: &TemplateUpdateArgs, format: OutputFormat) -> Result<()> {
    let template = find(api, args.id).await?;
    let mut editor = TemplateEditor::new(EventBroadcaster::new());
    editor.load(vec![template]);
    if let Some(name) = &args.name {
        if name.trim().is_empty() {
            anyhow::bail!("Template name must not be blank");
        }
        editor.set_name(0, name.as_str());
    }
    if let Some(description) = &args.description {
        editor.set_description(0, description.as_str());
    }
    if let Some(active) = args.active {
        editor.set_active(0, active);
    }
    save(api, &mut editor, format).await
}

pub async fn delete(api: &dyn PatientApi, id: TemplateId) -> Result<()> {
    let template = find(api, id).await?;
    let mut editor = TemplateEditor::new(EventBroadcaster::new());
    editor.load(vec![template]);
    let mut notices = NoticeBoard::new();
    match editor.remove_row(api, 0, &mut notices).await {
        Ok(Some(row)) => {
            println!("{} Deleted custom field {}", "✓".green(), row.name.cyan());
            Ok(())
        }
        Ok(None) => anyhow::bail!("Custom field {id} not found"),
        Err(e) => Err(with_notice(&notices, e)),
    }
}

async fn find(api: &dyn PatientApi, id: TemplateId) -> Result<CustomFieldTemplate> {
    api.list_templates()
        .await
        .context("Failed to load custom field templates")?
        .into_iter()
        .find(|t| t.id == id)
        .with_context(|| format!("Custom field {id} not found"))
}

async fn save(api: &dyn PatientApi, editor: &mut TemplateEditor, format: OutputFormat) -> Result<()> {
    let mut notices = NoticeBoard::new();
    if let Err(e) = editor.save(api, &mut notices).await {
        return Err(with_notice(&notices, e));
    }
    if let Some(notice) = notices.current() {
        print_notice(notice);
    }
    match format {
        OutputFormat::Json => print_json(editor.rows())?,
        OutputFormat::Table => {
            for row in editor.rows() {
                println!("  {} {}", row.id.unwrap_or_default(), row.name.cyan());
            }
        }
    }
    Ok(())
}

fn with_notice(notices: &NoticeBoard, e: CoreError) -> anyhow::Error {
    match notices.current() {
        Some(notice) => anyhow::Error::new(e).context(notice.text.clone()),
        None => e.into(),
    }
}
