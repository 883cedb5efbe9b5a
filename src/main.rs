mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod picker;
mod service;
mod theme;
mod tree;
mod tui;
mod ui;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use crate::app::App;
use crate::config::{PickerConfig, PickerSection, ThemeSection};
use crate::event::{Event, EventHandler};
use crate::service::local::LocalDirectoryService;
use crate::tui::{install_panic_hook, Tui};
use crate::worker::worker_loop;

/// A terminal directory-tree picker.
#[derive(Parser, Debug)]
#[command(name = "dirpick", version, about)]
struct Cli {
    /// Directory served as the tree root (defaults to current directory)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Initial path (inside the tree) to auto-expand on startup
    #[arg(long)]
    path: Option<String>,

    /// Disable the create-folder affordance
    #[arg(long)]
    no_create: bool,

    /// Explicit config file (overrides the profile)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Theme scheme: "dark", "light" or "custom"
    #[arg(long)]
    theme: Option<String>,

    /// Write debug logs to this file (stderr belongs to the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Partial config derived from CLI flags; flags left at their defaults
    /// stay `None` so lower tiers show through.
    fn overrides(&self) -> PickerConfig {
        PickerConfig {
            picker: PickerSection {
                initial_path: self.path.clone(),
                allow_create_folder: if self.no_create { Some(false) } else { None },
            },
            theme: ThemeSection {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..Default::default()
        }
    }
}

fn init_tracing(log_file: &std::path::Path) -> error::Result<()> {
    let file = std::fs::File::create(log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dirpick=debug")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Some(log_file) = &cli.log_file {
        init_tracing(log_file)?;
    }

    let root = cli.root.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", cli.root.display()))
    })?;
    if !root.is_dir() {
        return Err(error::AppError::InvalidPath(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    // Tier 2: register the host profile, when one exists on disk.
    for candidate in config::profile_candidate_paths() {
        if let Some(profile) = config::load_file(&candidate) {
            config::register_profile(profile);
            break;
        }
    }

    // Tier 3: per-instance options from --config plus CLI flags.
    let mut instance = cli
        .config
        .as_deref()
        .and_then(config::load_file)
        .unwrap_or_default();
    instance = instance.merge(&cli.overrides());

    let resolved = PickerConfig::resolve(Some(&instance));

    install_panic_hook();

    let service = Arc::new(LocalDirectoryService::new(root));
    let (task_tx, task_rx) = mpsc::unbounded_channel();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    tokio::spawn(worker_loop(service, task_rx, events.sender()));

    let mut app = App::new(
        &resolved,
        task_tx,
        Box::new(|path| info!(path, "path changed")),
    );

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::ListingLoaded {
                generation,
                path,
                result,
            } => app.handle_listing(generation, &path, result),
            Event::FolderCreated {
                generation,
                parent,
                name,
                result,
            } => app.handle_folder_created(generation, &parent, &name, result),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
