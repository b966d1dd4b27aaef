//! support-config CLI
//!
//! Administration tool for the configuration document of the support app:
//! inspect and change settings, reset, export/import and back up storage.

use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use std::sync::Arc;
use support_config::cli::export::write_output;
use support_config::cli::import::read_input;
use support_config::cli::{Cli, Command};
use support_config::config::{Category, ConfigManager};
use support_config::error::Error;
use support_config::logging::{LogTarget, init_logging};
use support_config::settings::{ENV_SETTINGS_PATH, SettingsLoader};
use support_config::storage::StorageService;
use support_config::store::SqliteStore;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // If explicit settings path given, set it as env var for SettingsLoader to pick up
    // SAFETY: This is safe at program startup before any other threads are spawned
    if let Some(settings_path) = &cli.settings {
        unsafe {
            std::env::set_var(ENV_SETTINGS_PATH, settings_path);
        }
    }
    let mut loader = SettingsLoader::load()?;
    if let Some(db_path) = &cli.database {
        loader.settings_mut().storage.db_path = db_path.into();
    }
    let settings = loader.settings().clone();

    init_logging(
        &LogTarget::parse(&cli.log),
        &settings.logging.level,
        cli.verbose,
    )?;
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Loaded settings");
    }
    info!(db = %settings.storage.db_path.display(), "Opening store");

    let store = Arc::new(SqliteStore::open(&settings.storage.db_path)?);
    let storage = Arc::new(StorageService::with_options(
        store,
        settings.storage.storage_options(),
    ));
    let manager = ConfigManager::new(Arc::clone(&storage));
    manager.initialize().await;

    match run(cli.command, &manager, &storage).await {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(err) => eprintln!("{}", serde_json::to_string_pretty(&err.report())?),
                None => eprintln!("error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}

async fn run(command: Command, manager: &ConfigManager, storage: &StorageService) -> Result<()> {
    match command {
        Command::Show { format } => {
            print!("{}", ensure_newline(format.render(&manager.to_value())?));
        }
        Command::Get { path } => match manager.get_value(&path) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => anyhow::bail!("no value at {}", path),
        },
        Command::Set(args) => {
            let value = args.parsed_value();
            manager.set(&args.path, value).await?;
            println!("Updated {}", args.path);
        }
        Command::Category { name, json } => {
            let category: Category = name.parse().map_err(anyhow::Error::msg)?;
            let partial: Value = serde_json::from_str(&json)?;
            manager.update_category(category, partial).await?;
            println!("Updated {}", category);
        }
        Command::Reset => {
            manager.reset().await?;
            println!("Configuration reset to defaults");
        }
        Command::Export(args) => {
            let export = manager.export();
            let json = serde_json::to_string_pretty(&export)?;
            match &args.output {
                Some(path) => {
                    write_output(path, &json, args.should_compress())?;
                    info!(path = %path.display(), checksum = %export.checksum, "Exported configuration");
                    eprintln!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Import(args) => {
            let content = read_input(&args.file)?;
            if args.dry_run {
                // Verify against a throwaway manager so nothing is persisted
                let scratch = ConfigManager::new(Arc::new(StorageService::new(Arc::new(
                    support_config::store::MemoryStore::new(),
                ))));
                scratch.import_str(&content).await?;
                println!("{} is a valid export", args.file.display());
            } else {
                manager.import_str(&content).await?;
                println!("Imported {}", args.file.display());
            }
        }
        Command::Keys => {
            for key in storage.get_all_keys().await {
                println!("{}", key);
            }
        }
        Command::Info => {
            let info = storage
                .get_storage_info()
                .await
                .ok_or_else(|| Error::unavailable("could not read storage info"))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Backup { output } => {
            let backup = storage
                .export_data()
                .await
                .ok_or_else(|| Error::unavailable("could not read storage"))?;
            let json = backup.to_json_pretty()?;
            match output {
                Some(path) => {
                    write_output(&path, &json, false)?;
                    eprintln!("Backed up {} keys to {}", backup.data.len(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Restore { file } => {
            let content = read_input(&file)?;
            let value: Value = serde_json::from_str(&content)
                .map_err(|e| Error::InvalidBackupFormat(format!("not valid JSON: {}", e)))?;
            if !storage.import_data(value).await? {
                return Err(Error::unavailable("could not write backup entries").into());
            }
            println!("Restored {}", file.display());
        }
    }
    Ok(())
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
