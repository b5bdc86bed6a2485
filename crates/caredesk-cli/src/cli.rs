use clap::{Parser, Subcommand, ValueEnum};

use caredesk_core::{Ordering, StatusFilter, TemplateId};

#[derive(Parser)]
#[command(name = "caredesk")]
#[command(about = "Caredesk CLI: list, create and edit patients on a caredesk API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and CAREDESK_API_URL env var)
    #[arg(short, long, global = true, env = "CAREDESK_API_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "CAREDESK_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List, show, create, update and delete patients
    Patients(PatientsArgs),
    /// Show patient statistics
    Stats,
    /// Manage custom field templates
    Templates(TemplatesArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: PatientCommands,
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// List patients, one page at a time
    List(ListArgs),
    /// Show one patient
    Show(IdArgs),
    /// Create a patient
    Create(CreateArgs),
    /// Update a patient
    Update(UpdateArgs),
    /// Delete a patient
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Filter by name
    #[arg(long)]
    pub search: Option<String>,
    /// Status filter: all, INQUIRY, ONBOARDING, ACTIVE or CHURNED
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    pub status: StatusFilter,
    /// Sort order: -created_at, created_at, last_name or -last_name
    #[arg(long, default_value = "-created_at", value_parser = parse_ordering, allow_hyphen_values = true)]
    pub ordering: Ordering,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(clap::Args)]
pub struct IdArgs {
    /// Patient id
    pub id: String,
}

/// Fields shared by create and update.
#[derive(clap::Args)]
pub struct PatientFields {
    #[arg(long)]
    pub middle_name: Option<String>,
    /// INQUIRY, ONBOARDING, ACTIVE or CHURNED
    #[arg(long)]
    pub status: Option<String>,
    /// Address as street|city|state|zip (repeatable)
    #[arg(long = "address")]
    pub addresses: Vec<String>,
    /// 1-based index of the primary address
    #[arg(long)]
    pub primary: Option<usize>,
    /// Custom field value as TEMPLATE_ID=VALUE (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(TemplateId, String)>,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date_of_birth: String,
    #[command(flatten)]
    pub fields: PatientFields,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Patient id
    pub id: String,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date_of_birth: Option<String>,
    /// Addresses given here replace the stored ones
    #[command(flatten)]
    pub fields: PatientFields,
}

#[derive(clap::Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplateCommands,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List custom field templates
    List,
    /// Create a template
    Create(TemplateCreateArgs),
    /// Update a template
    Update(TemplateUpdateArgs),
    /// Delete a template
    Delete(TemplateIdArgs),
}

#[derive(clap::Args)]
pub struct TemplateCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Create the template disabled
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args)]
pub struct TemplateUpdateArgs {
    pub id: TemplateId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// true or false
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(clap::Args)]
pub struct TemplateIdArgs {
    pub id: TemplateId,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}

fn parse_status_filter(s: &str) -> Result<StatusFilter, String> {
    s.parse().map_err(|e: caredesk_core::CoreError| e.to_string())
}

fn parse_ordering(s: &str) -> Result<Ordering, String> {
    s.parse().map_err(|e: caredesk_core::CoreError| e.to_string())
}

fn parse_field(s: &str) -> Result<(TemplateId, String), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid field \"{s}\". Expected TEMPLATE_ID=VALUE"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("Invalid template id \"{id}\""))?;
    Ok((id, value.to_string()))
}
