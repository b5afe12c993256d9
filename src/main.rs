//! launch-grid command line tool.
//!
//! Inspects and maintains a stored launcher layout:
//! - print pages and run store validation
//! - export / import layout bundles
//! - reset or compact the stored layout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use launch_grid::state::bundle::bundle_config;
use launch_grid::state::pages::{last_updated, PageStore};
use launch_grid::{AppCatalog, BlankIconResolver, GridItem, Library, Reconciler, Result};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "launch-grid")]
#[command(about = "Inspect and maintain a launcher grid layout")]
struct Args {
    /// Data directory holding layout.db and config.json
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every page and its slots
    Show,
    /// Check the stored records without changing them
    Validate,
    /// Write the layout into a bundle directory
    Export { dir: PathBuf },
    /// Replace the layout with a bundle directory
    Import { dir: PathBuf },
    /// Forget the stored layout
    Reset,
    /// Drop trailing empty pages and save
    Compact,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(Library::default_data_dir);
    info!(data_dir = %data_dir.display(), "using data directory");

    let mut reconciler = Reconciler::open(&data_dir, AppCatalog::new(), Arc::new(BlankIconResolver))?;

    match args.command {
        Command::Show => {
            reconciler.load()?;
            print_layout(&reconciler)?;
        }
        Command::Validate => {
            reconciler.validate_store()?;
            println!("layout is consistent");
        }
        Command::Export { dir } => {
            reconciler.export_bundle(&dir)?;
            println!("exported to {}", dir.display());
        }
        Command::Import { dir } => {
            if let Ok(bundled) = bundle_config(&dir) {
                if bundled.page_capacity != reconciler.config().page_capacity {
                    warn!(
                        bundle = bundled.page_capacity,
                        current = reconciler.config().page_capacity,
                        "bundle page capacity differs, pages will be re-flowed"
                    );
                }
            }
            if reconciler.import_bundle(&dir)? {
                println!("imported {}", dir.display());
            } else {
                println!("{} is not a layout bundle, nothing imported", dir.display());
            }
        }
        Command::Reset => {
            reconciler.reset()?;
            println!("layout reset");
        }
        Command::Compact => {
            reconciler.load()?;
            let removed = reconciler.compact();
            reconciler.persist()?;
            println!("removed {} empty page(s)", removed);
        }
    }

    Ok(())
}

fn print_layout(reconciler: &Reconciler) -> Result<()> {
    let layout = reconciler.layout();
    for (page_index, page) in layout.pages().iter().enumerate() {
        println!("page {}", page_index);
        for (position, item) in page.iter().enumerate() {
            match item {
                GridItem::Application(app) => {
                    println!("  {:>3}  app     {}  ({})", position, app.name, app.path)
                }
                GridItem::Folder(folder) => println!(
                    "  {:>3}  folder  {}  [{} apps]",
                    position,
                    folder.name,
                    folder.apps.len()
                ),
                GridItem::Empty(_) => {}
            }
        }
    }

    let records = PageStore::new(reconciler.library().conn()).load_all()?;
    let stamp = last_updated(&records)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{} page(s), {} item(s), last saved {}",
        layout.page_count(),
        layout.real_item_count(),
        stamp
    );
    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("launch_grid=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
