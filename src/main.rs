//! CLI entry point for the workspace model.
//!
//! Every command that queries the model scans the workspace first; nothing
//! but the builtin catalog is persisted between runs.

use anyhow::{Context, Result, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use ui5_atlas::indexing::{ScanPhase, ScanProgress, scan_workspace};
use ui5_atlas::rename::{apply_edits, group_by_file};
use ui5_atlas::{IndexStats, Settings, Workspace};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Source model and type resolution for UI5 workspaces
#[derive(Parser)]
#[command(
    name = "ui5-atlas",
    version = env!("CARGO_PKG_VERSION"),
    about = "Source model and type resolution for UI5 workspaces",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root to scan (defaults to the configured root or the current directory)
    #[arg(short, long, global = true, env = "ATLAS_ROOT")]
    root: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the .ui5atlas directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Scan the workspace and report what was found
    Index {
        /// Directory to scan (defaults to the workspace root)
        path: Option<PathBuf>,

        /// Show progress during the scan
        #[arg(short, long)]
        progress: bool,

        /// List the files that would be scanned without parsing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Static type of the expression at a byte offset of a script
    Resolve { file: PathBuf, offset: usize },

    /// Declaration of the member referenced at a byte offset
    Definition { file: PathBuf, offset: usize },

    /// Members of a class with their inferred types
    Members { class_name: String },

    /// Controller responsible for a view or fragment
    Controller { file: PathBuf },

    /// Rename the member at a byte offset
    Rename {
        file: PathBuf,
        offset: usize,
        new_name: String,

        /// Write the edits to disk instead of printing them
        #[arg(long)]
        write: bool,
    },

    /// Delete the persisted builtin cache
    #[command(name = "clear-cache")]
    ClearCache,
}

/// indicatif bar per scan phase
struct BarProgress {
    bar: Option<ProgressBar>,
}

impl ScanProgress for BarProgress {
    fn phase_started(&mut self, phase: ScanPhase, total: usize) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(phase.label());
        self.bar = Some(bar);
    }

    fn file_done(&mut self, _path: &Path) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    file: &'a Path,
    offset: usize,
    class_name: Option<String>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn scan(ws: &Workspace, root: &Path, progress: bool) -> IndexStats {
    let cancel = CancellationToken::new();
    if progress {
        let mut bars = BarProgress { bar: None };
        scan_workspace(ws, &[root.to_path_buf()], &cancel, &mut bars)
    } else {
        scan_workspace(ws, &[root.to_path_buf()], &cancel, &mut ui5_atlas::indexing::NoProgress)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| {
            anyhow::anyhow!("Configuration error loading from {}: {e}", path.display())
        })?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    init_logging(cli.verbose || settings.debug);

    let root = cli
        .root
        .clone()
        .or_else(|| settings.workspace_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let root = absolute(&root);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::ClearCache => {
            let ws = Workspace::open(settings)?;
            ws.clear_caches()?;
            println!("Builtin cache cleared");
        }

        Commands::Index {
            path,
            progress,
            dry_run,
        } => {
            let root = path.map(|p| absolute(&p)).unwrap_or(root);
            if dry_run {
                let walker = ui5_atlas::indexing::FileWalker::new(std::sync::Arc::new(settings));
                let files = walker.collect(&root);
                for path in files
                    .manifests
                    .iter()
                    .chain(&files.fragments)
                    .chain(&files.views)
                    .chain(&files.scripts)
                {
                    println!("{}", path.display());
                }
                println!("\n{} files would be indexed", files.len());
                return Ok(());
            }
            let ws = Workspace::open(settings)?;
            let stats = scan(&ws, &root, progress);
            stats.display();
        }

        Commands::Resolve { file, offset } => {
            let ws = Workspace::open(settings)?;
            scan(&ws, &root, false);
            let file = absolute(&file);
            let Some(def) = ws.class_for_path(&file) else {
                bail!("{} is not a project class", file.display());
            };
            let resolved = ws.resolver().type_of_expression_at(&def.class_name, offset);
            print_json(&ResolveOutput {
                file: &file,
                offset,
                class_name: resolved.into_option(),
            })?;
        }

        Commands::Definition { file, offset } => {
            let ws = Workspace::open(settings)?;
            scan(&ws, &root, false);
            print_json(&ws.find_definition(&absolute(&file), offset))?;
        }

        Commands::Members { class_name } => {
            let ws = Workspace::open(settings)?;
            scan(&ws, &root, false);
            match ws.members_of(&class_name) {
                Some(members) => print_json(&members)?,
                None => bail!("Class '{class_name}' not found"),
            }
        }

        Commands::Controller { file } => {
            let ws = Workspace::open(settings)?;
            scan(&ws, &root, false);
            print_json(&ws.responsible_controller(&absolute(&file)))?;
        }

        Commands::Rename {
            file,
            offset,
            new_name,
            write,
        } => {
            let ws = Workspace::open(settings)?;
            scan(&ws, &root, false);
            let target = match ws.prepare_rename(&absolute(&file), offset) {
                Ok(target) => target,
                Err(e) => {
                    eprintln!("Error: {e}");
                    for suggestion in e.recovery_suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                    std::process::exit(1);
                }
            };
            let edits = ws.rename(&target, &new_name);

            if !write {
                print_json(&edits)?;
                return Ok(());
            }
            for (path, file_edits) in group_by_file(&edits) {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                std::fs::write(&path, apply_edits(&text, &file_edits))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}: {} edit(s)", path.display(), file_edits.len());
            }
        }
    }

    Ok(())
}
