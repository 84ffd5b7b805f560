use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod breakpoint;
mod controller;
mod domain;
mod model;
mod resolver;
mod structure;
mod ui;

use controller::Controller;
use domain::{RtabConfig, RtabError};
use model::{Model, Status};
use resolver::{NullWarnSink, StructureResolver, TracingWarnSink, WarnSink};
use structure::TableConfig;
use ui::TableUI;

/// A tui based tabular data viewer with responsive table structures.
///
/// Column layouts are looked up per table type in a configuration file and
/// resolved against the current terminal size, so narrow terminals can get
/// a reduced set of columns.
#[derive(Parser, Debug)]
#[command(name = "rtab", version)]
struct Cli {
    /// Data file to display (csv, parquet, arrow/ipc)
    file: Option<String>,

    /// Table configuration file (json), mapping table types to
    /// per-breakpoint header variants
    #[arg(short, long)]
    config: Option<String>,

    /// Table type used for the structure lookup, defaults to the
    /// data file stem
    #[arg(short, long)]
    table_type: Option<String>,

    /// Log file, the terminal itself is taken by the UI
    #[arg(long, default_value = "rtab.log")]
    log_file: String,

    /// Suppress structure resolution warnings
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), RtabError> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;
    info!("Starting rtab!");

    let table_config = match &cli.config {
        Some(path) => TableConfig::load(&expand_path(path)?)?,
        None => TableConfig::new(),
    };

    let data_file = cli.file.as_deref().map(expand_path).transpose()?;
    let table_type = cli
        .table_type
        .or_else(|| {
            data_file
                .as_ref()
                .and_then(|p| p.file_stem())
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "table".to_string());

    let cfg = RtabConfig {
        quiet_structure_warnings: cli.quiet,
        ..RtabConfig::default()
    };

    let sink: Box<dyn WarnSink> = if cfg.quiet_structure_warnings {
        Box::new(NullWarnSink)
    } else {
        Box::new(TracingWarnSink)
    };
    let resolver = StructureResolver::new(table_config, sink);

    let mut terminal = ratatui::init();
    let size = terminal.size()?;

    let mut model = Model::init(
        &cfg,
        resolver,
        table_type,
        size.width as usize,
        size.height as usize,
    )?;
    if let Some(path) = data_file {
        model.load_data_file(path)?;
    }

    let ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}

fn expand_path(path: &str) -> Result<PathBuf, RtabError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| RtabError::LoadingFailed(format!("Invalid path \"{path}\": {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn init_tracing(log_file: &str) -> Result<(), RtabError> {
    let file = std::fs::File::create(log_file)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
