//! varstash: find, import and browse Virt-A-Mate `.var` packages.

mod error;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use varstash_cache::{Database, Pagination, Repository};
use varstash_config::Config;
use varstash_library::{Context, ScanEvent, ScanOutcome, Scanner, delete_package};
use varstash_storage::BackendHandle;
use varstash_storage::backend::LocalBackend;

#[derive(Parser)]
#[command(name = "varstash", author, version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import new packages from VaM install directories
    Scan {
        /// Install directories containing `AddonPackages` (defaults to the configured roots)
        roots: Vec<PathBuf>,
    },
    /// List imported packages, most recently imported first
    List {
        #[arg(long, default_value_t = 20)]
        take: u32,
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },
    /// Remove an imported package and its unshared preview images
    Delete {
        /// Package id, e.g. `Alice.MyScene.3`
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.or_else(Config::default_path);
    let config = Config::load(config_path.as_deref()).or_raise(|| ErrorKind::Config)?;
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let cache = Repository::from(&db);

    let result = match cli.command {
        Command::Scan { roots } => scan(&config, cache, roots).await,
        Command::List { take, skip } => list(&cache, Pagination { take, skip }).await,
        Command::Delete { id } => delete(&config, &cache, &id).await,
    };
    db.close().await;
    result
}

fn images(config: &Config) -> Result<BackendHandle> {
    let backend = LocalBackend::new("images", &config.images_dir).or_raise(|| ErrorKind::Storage)?;
    Ok(Arc::new(backend))
}

async fn scan(config: &Config, cache: Repository, roots: Vec<PathBuf>) -> Result<()> {
    let roots = if roots.is_empty() { config.scan_roots.clone() } else { roots };
    let ctx = Context { images: images(config)?, image_quality: config.image_save_quality };
    let scanner = Arc::new(Scanner::new(cache, ctx));
    let token = CancellationToken::new();
    let (tx, mut rx) = unbounded_channel();

    let task = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        let token = token.clone();
        async move { scanner.scan(&roots, &tx, &token).await }
    });
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => print_event(&event),
                // The sender lives in the scan task; it's gone once the scan is.
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !token.is_cancelled() => {
                tracing::warn!("Interrupted; stopping after the current package");
                token.cancel();
            },
        }
    }

    let report = task.await.or_raise(|| ErrorKind::Scan)?.or_raise(|| ErrorKind::Scan)?;
    let verb = match report.outcome {
        ScanOutcome::Stopped => "Finished",
        ScanOutcome::Cancelled => "Cancelled",
    };
    println!(
        "{verb}: {} imported, {} skipped, {} failed in {:.1?}",
        report.imported.len(),
        report.skipped,
        report.errors.len(),
        report.duration
    );
    Ok(())
}

fn print_event(event: &ScanEvent) {
    match event {
        ScanEvent::Started => println!("Scanning..."),
        ScanEvent::Progress(percent) => println!("{percent:>3}%"),
        ScanEvent::Imported(package) => println!("  + {}", package.id),
        ScanEvent::Error(message) => eprintln!("  ! {message}"),
        ScanEvent::Stopped(_) => {},
    }
}

async fn list(cache: &Repository, page: Pagination) -> Result<()> {
    let packages = cache.find_many(page).await.or_raise(|| ErrorKind::List)?;
    for package in packages {
        let package_type = package.package_type.map_or("-", |kind| kind.as_str());
        let image = package.primary_image().map_or("-", |image| image.path.as_str());
        println!("{}\t{package_type}\t{}\t{image}", package.id, package.file.size);
    }
    Ok(())
}

async fn delete(config: &Config, cache: &Repository, id: &str) -> Result<()> {
    let images = images(config)?;
    match delete_package(cache, &images, id).await.or_raise(|| ErrorKind::Delete)? {
        Some(package) => {
            println!("Deleted {}", package.id);
            Ok(())
        },
        None => exn::bail!(ErrorKind::PackageNotFound(id.to_string())),
    }
}
