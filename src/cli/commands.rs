use clap::{Args, Parser, Subcommand};
use crate::cli::output::{
    format_columns, format_resources, format_task_details, format_view_json, render_timeline, write_export,
    TimelineOptions,
};
use crate::config::Config;
use crate::db::DbConnection;
use crate::import::decoder::decoder_for_path;
use crate::import::header::detect_mapping;
use crate::import::worker::{ImportHandle, ImportOutcome};
use crate::models::{ColumnMapping, Record};
use crate::repo::settings::{SettingsStore, SqliteSettings};
use crate::session::prefs::KEYS;
use crate::session::{ImportSummary, Preset, Session};
use crate::utils::fuzzy::filter_resource_names;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "gantt")]
#[command(about = "Production schedule viewer - import order data and lay it out as a per-resource timeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the schedule in a file as a text timeline
    Show {
        /// Input file (.csv or .json)
        file: PathBuf,
        #[command(flatten)]
        import: ImportArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the file's headers, the field each maps to, and the detected mapping
    Columns {
        file: PathBuf,
        /// Seconds without decoder progress before giving up
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List resources in a file
    Resources {
        file: PathBuf,
        /// Only resources whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        #[command(flatten)]
        import: ImportArgs,
    },
    /// Show details of one task
    Task {
        file: PathBuf,
        /// Task id (e.g. ORD001-10)
        id: String,
        #[command(flatten)]
        import: ImportArgs,
        #[arg(long)]
        json: bool,
    },
    /// Render the built-in demo schedule
    Demo {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Export the visible tasks as CSV
    Export {
        file: PathBuf,
        /// Destination CSV file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        import: ImportArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Read and write preferences
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one preference
    Get { key: String },
    /// Set one preference (dark_mode, zoom_level, custom_range.start, custom_range.end)
    Set { key: String, value: String },
    /// Print all preferences
    List,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ImportArgs {
    /// Column mapping override, FIELD=HEADER (repeatable). Unnamed fields
    /// keep their detected header.
    #[arg(long = "map", value_name = "FIELD=HEADER")]
    pub map: Vec<String>,
    /// Seconds without decoder progress before the import is cut short
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only show this resource (repeatable)
    #[arg(short, long)]
    pub resource: Vec<String>,
    /// Also show every resource whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub select: Option<String>,
    /// Order number search; an exact match shows the order's route
    #[arg(short, long)]
    pub search: Option<String>,
    /// Time window preset: today, 7days, 30days
    #[arg(long, conflicts_with_all = ["from", "to", "saved_range"])]
    pub preset: Option<String>,
    /// Window start (requires --to)
    #[arg(long, requires = "to", conflicts_with = "saved_range")]
    pub from: Option<String>,
    /// Window end (requires --from)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
    /// Use the stored custom range
    #[arg(long)]
    pub saved_range: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    log::debug!("config: {:?}", config);

    match cli.command {
        Commands::Show { file, import, filter, json } => handle_show(&config, &file, &import, &filter, json),
        Commands::Columns { file, timeout } => handle_columns(&config, &file, timeout),
        Commands::Resources { file, filter, import } => handle_resources(&config, &file, &import, filter.as_deref()),
        Commands::Task { file, id, import, json } => handle_task(&config, &file, &import, &id, json),
        Commands::Demo { filter, json } => handle_demo(&config, &filter, json),
        Commands::Export { file, output, import, filter } => handle_export(&config, &file, &output, &import, &filter),
        Commands::Config { subcommand } => handle_config(&config, subcommand),
    }
}

fn open_settings(config: &Config) -> Result<SqliteSettings> {
    let conn = DbConnection::connect(&config.data_location)
        .context("Failed to connect to settings database")?;
    Ok(SqliteSettings::new(conn))
}

fn open_session(config: &Config) -> Result<Session<SqliteSettings>> {
    let store = open_settings(config)?;
    Session::new(store).context("Failed to load preferences")
}

/// Decode `file` on the worker thread and wait for it to settle
fn decode_file(config: &Config, file: &Path, timeout: Option<u64>) -> Result<ImportOutcome> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let decoder = decoder_for_path(file, config.chunk_size)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let timeout = timeout.map(Duration::from_secs).unwrap_or(config.import_timeout);
    let handle = ImportHandle::spawn(decoder, timeout)?;
    Ok(handle.wait())
}

/// Detected mapping with the user's overrides applied on top
fn resolve_mapping(rows: &[Record], overrides: &[String]) -> Result<Option<ColumnMapping>> {
    if overrides.is_empty() {
        return Ok(None);
    }
    let overrides = ColumnMapping::from_specs(overrides)?;
    let mut mapping = rows
        .first()
        .map(|row| detect_mapping(row.keys().map(String::as_str)))
        .unwrap_or_default();
    for (field, header) in overrides.iter() {
        mapping.set(field, header);
    }
    Ok(Some(mapping))
}

fn load_file<S: SettingsStore>(session: &mut Session<S>, config: &Config, file: &Path, import: &ImportArgs) -> Result<ImportSummary> {
    let outcome = decode_file(config, file, import.timeout)?;
    let mapping = match &outcome {
        ImportOutcome::Completed { rows, .. } => resolve_mapping(rows, &import.map)?,
        _ => None,
    };
    let summary = session
        .finish_import(outcome, mapping.as_ref())
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if summary.partial {
        eprintln!(
            "Warning: import stalled; using the {} rows decoded before the timeout.",
            summary.total_rows
        );
    }
    if summary.dropped > 0 {
        eprintln!(
            "Note: skipped {} of {} rows with missing values or unreadable dates.",
            summary.dropped, summary.total_rows
        );
    }
    Ok(summary)
}

fn apply_filter_args<S: SettingsStore>(session: &mut Session<S>, filter: &FilterArgs) -> Result<()> {
    if !filter.resource.is_empty() {
        let known = session.resources();
        for resource in &filter.resource {
            if !known.contains(resource) {
                anyhow::bail!("Resource not found: '{}'", resource);
            }
        }
        session.set_resource_filter(filter.resource.iter().cloned());
    }
    if let Some(query) = &filter.select {
        if session.select_resources_matching(query) == 0 {
            anyhow::bail!("No resources match '{}'", query);
        }
    }

    // Window first: pinning a window clears the search
    if let Some(preset) = &filter.preset {
        let preset: Preset = preset.parse()?;
        session.apply_preset(preset, Utc::now())?;
    } else if let (Some(from), Some(to)) = (&filter.from, &filter.to) {
        session.set_custom_range(from, to).context("Invalid time range")?;
    } else if filter.saved_range && session.apply_saved_range()?.is_none() {
        anyhow::bail!("No saved range. Set custom_range.start and custom_range.end first.");
    }

    if let Some(query) = &filter.search {
        session.set_search(query);
    }
    Ok(())
}

fn print_view<S: SettingsStore>(session: &Session<S>, json: bool) -> Result<()> {
    if json {
        println!("{}", format_view_json(session.view())?);
    } else {
        print!("{}", render_timeline(session.view(), &TimelineOptions::for_terminal()));
    }
    Ok(())
}

fn handle_show(config: &Config, file: &Path, import: &ImportArgs, filter: &FilterArgs, json: bool) -> Result<()> {
    let mut session = open_session(config)?;
    load_file(&mut session, config, file, import)?;
    apply_filter_args(&mut session, filter)?;
    print_view(&session, json)
}

fn handle_demo(config: &Config, filter: &FilterArgs, json: bool) -> Result<()> {
    let mut session = open_session(config)?;
    session.load_demo(Utc::now());
    apply_filter_args(&mut session, filter)?;
    print_view(&session, json)
}

fn handle_columns(config: &Config, file: &Path, timeout: Option<u64>) -> Result<()> {
    let rows = match decode_file(config, file, timeout)? {
        ImportOutcome::Completed { rows, .. } => rows,
        ImportOutcome::Failed(e) => return Err(e).with_context(|| format!("Failed to read {}", file.display())),
        ImportOutcome::Cancelled => anyhow::bail!("Import cancelled"),
    };
    let Some(first) = rows.first() else {
        anyhow::bail!("{} has no data rows", file.display());
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mapping = detect_mapping(headers.iter().map(String::as_str));
    print!("{}", format_columns(&headers, &mapping, crate::cli::output::is_tty()));
    Ok(())
}

fn handle_resources(config: &Config, file: &Path, import: &ImportArgs, query: Option<&str>) -> Result<()> {
    let mut session = open_session(config)?;
    load_file(&mut session, config, file, import)?;
    let resources = session.resources();
    let shown = filter_resource_names(&resources, query.unwrap_or(""));
    print!("{}", format_resources(&shown, session.tasks()));
    Ok(())
}

fn handle_task(config: &Config, file: &Path, import: &ImportArgs, id: &str, json: bool) -> Result<()> {
    let mut session = open_session(config)?;
    load_file(&mut session, config, file, import)?;
    let Some(task) = session.select_task(id) else {
        anyhow::bail!("Task not found: '{}'", id);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        print!("{}", format_task_details(task, crate::cli::output::is_tty()));
    }
    Ok(())
}

fn handle_export(config: &Config, file: &Path, output: &Path, import: &ImportArgs, filter: &FilterArgs) -> Result<()> {
    let mut session = open_session(config)?;
    load_file(&mut session, config, file, import)?;
    apply_filter_args(&mut session, filter)?;

    let tasks = &session.view().tasks;
    let out = std::fs::File::create(output)
        .with_context(|| format!("Cannot create {}", output.display()))?;
    write_export(tasks, std::io::BufWriter::new(out))?;
    println!("Exported {} tasks to {}.", tasks.len(), output.display());
    Ok(())
}

fn handle_config(config: &Config, subcommand: ConfigCommands) -> Result<()> {
    let mut session = open_session(config)?;
    match subcommand {
        ConfigCommands::Get { key } => match session.preferences().get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        ConfigCommands::Set { key, value } => {
            session
                .set_preference(&key, &value)
                .with_context(|| format!("Cannot set {}", key))?;
            let stored = session.preferences().get(&key)?.unwrap_or_default();
            println!("{} = {}", key, stored);
        }
        ConfigCommands::List => {
            for key in KEYS {
                let value = session.preferences().get(key)?.unwrap_or_else(|| "(not set)".to_string());
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}
