mod cli;
mod client;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use caredesk_core::{ClientConfig, PatientApi};

use cli::{Cli, Commands, ConfigCommands, PatientCommands, TemplateCommands};
use client::ApiClient;
use config::ConfigStore;
use output::print_error;

#[tokio::main]
async fn main() {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    let profile = &cli.profile;
    let store = ConfigStore::open_default()?;
    let profile_cfg = store.load_profile(profile)?;
    let format = match cli.format {
        Some(format) => format,
        None => profile_cfg.output_format()?.unwrap_or_default(),
    };

    if let Commands::Config(args) = &cli.command {
        match &args.command {
            ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!("{}: {}", "File".cyan(), store.path().display());
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    profile_cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("table")
                );
            }
            ConfigCommands::Set(set_args) => {
                store.set(profile, &set_args.key, &set_args.value)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        }
        return Ok(());
    }

    let server = config::resolve_server(cli.server.as_deref(), &profile_cfg);
    let client_config =
        ClientConfig::new(&server).with_context(|| format!("Invalid server URL: {server}"))?;
    tracing::debug!(server = %client_config.api_base_url, profile = %profile, "resolved server");
    let api: Arc<dyn PatientApi> = Arc::new(ApiClient::new(client_config.clone()));

    match &cli.command {
        Commands::Patients(args) => match &args.command {
            PatientCommands::List(list_args) => {
                commands::patients::list(api.as_ref(), &client_config, list_args, format).await?;
            }
            PatientCommands::Show(id_args) => {
                commands::patients::show(api.as_ref(), &id_args.id, format).await?;
            }
            PatientCommands::Create(create_args) => {
                commands::patients::create(api, create_args, format).await?;
            }
            PatientCommands::Update(update_args) => {
                commands::patients::update(api, update_args, format).await?;
            }
            PatientCommands::Delete(id_args) => {
                commands::patients::delete(api, &id_args.id).await?;
            }
        },
        Commands::Stats => {
            commands::stats::stats(api.as_ref(), format).await?;
        }
        Commands::Templates(args) => match &args.command {
            TemplateCommands::List => {
                commands::templates::list(api.as_ref(), format).await?;
            }
            TemplateCommands::Create(create_args) => {
                commands::templates::create(api.as_ref(), create_args, format).await?;
            }
            TemplateCommands::Update(update_args) => {
                commands::templates::update(api.as_ref(), update_args, format).await?;
            }
            TemplateCommands::Delete(id_args) => {
                commands::templates::delete(api.as_ref(), id_args.id).await?;
            }
        },
        Commands::Config(_) => {}
    }

    Ok(())
}
