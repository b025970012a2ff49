// PhotoVault CLI binary

use std::path::PathBuf;
use clap::{ArgGroup, Parser, Subcommand};
use anyhow::Result;

use photovault_lib::checksum::{self, ChecksumAlgorithm, VerificationReport};
use photovault_lib::config::{CliOverrides, EnvironmentDefaults, ImportContext};
use photovault_lib::import;
use photovault_lib::metadata::ExifToolGateway;

#[derive(Parser)]
#[command(name = "photovault")]
#[command(about = "PhotoVault - date-organized photo import with checksum ledgers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import photos from a card or directory into the archive
    Import {
        /// Source directory (card root)
        source: PathBuf,
        /// Event name used in filenames and metadata
        #[arg(short, long)]
        event: Option<String>,
        /// Location written into metadata
        #[arg(short, long)]
        location: Option<String>,
        /// Author/creator written into metadata
        #[arg(long)]
        author: Option<String>,
        /// Copyright notice written into metadata
        #[arg(long)]
        copyright: Option<String>,
        /// Credit line written into metadata
        #[arg(long)]
        credit: Option<String>,
        /// GPS position as decimal "lat,lon"
        #[arg(long)]
        gps: Option<String>,
        /// Show the full plan without copying anything
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Delete source files after a verified copy
        #[arg(long)]
        delete: bool,
        /// Keep source files even when a configured default enables deletion
        #[arg(long, conflicts_with = "delete")]
        no_delete: bool,
        /// Separate raw and jpeg files into raw/ and jpg/ subfolders
        #[arg(long)]
        split_by_type: bool,
        /// Trip mode: tolerate a missing event, use date-only names
        #[arg(long)]
        trip: bool,
        /// Update checksum ledgers in every touched directory
        #[arg(long)]
        checksums: bool,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Verify or maintain checksum ledgers in the archive
    #[command(group = ArgGroup::new("mode").required(true))]
    Verify {
        /// Directory to verify (defaults to the archive root)
        dir: Option<PathBuf>,
        /// Create ledgers for directories that have none
        #[arg(long, group = "mode")]
        generate: bool,
        /// Check files against existing ledgers
        #[arg(long, group = "mode")]
        check: bool,
        /// Re-sync existing ledgers with the files on disk
        #[arg(long, group = "mode")]
        update: bool,
        /// Operate on the given directory only, not its subdirectories
        #[arg(long)]
        no_recursive: bool,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Import { verbose, .. } => *verbose,
        Commands::Verify { verbose, .. } => *verbose,
    };
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Import {
            source,
            event,
            location,
            author,
            copyright,
            credit,
            gps,
            dry_run,
            delete,
            no_delete,
            split_by_type,
            trip,
            checksums,
            verbose: _,
        } => {
            let overrides = CliOverrides {
                event,
                location,
                author,
                copyright,
                credit,
                gps,
                delete_after_import: delete && !no_delete,
                split_by_type,
                trip,
                generate_checksums: checksums,
            };
            cmd_import(source, overrides, dry_run)
        }
        Commands::Verify {
            dir,
            generate,
            check,
            update,
            no_recursive,
            verbose: _,
        } => cmd_verify(dir, generate, check, update, !no_recursive),
    }
}

fn cmd_import(source: PathBuf, overrides: CliOverrides, dry_run: bool) -> Result<()> {
    let defaults = EnvironmentDefaults::load();
    let ctx = ImportContext::resolve(&overrides, &source, &defaults)?;

    let gateway = ExifToolGateway::new();
    if !gateway.is_available() {
        eprintln!("Warning: exiftool not found; capture dates fall back to file timestamps and no metadata will be written");
    }

    println!(
        "Importing from {} into {}",
        source.display(),
        ctx.archive_root.display()
    );
    if dry_run {
        println!("DRY-RUN: no files will be copied, deleted, or modified");
    }

    let report = import::run(&source, &ctx, &gateway, dry_run)?;

    for warning in &report.skipped {
        eprintln!("{}", warning);
    }

    if report.plan.is_empty() {
        println!("No supported files found in {}", source.display());
        return Ok(());
    }

    if dry_run {
        println!();
        for planned in &report.plan {
            println!(
                "  {} -> {}",
                planned.source.path.display(),
                planned.destination_path().display()
            );
        }
        println!();
        println!("DRY-RUN plan: {} files", report.planned());
        return Ok(());
    }

    println!();
    println!("Import complete:");
    println!("  Images:   {}", report.images);
    println!("  Raw:      {}", report.raws);
    println!("  Copied:   {}", report.copied);
    println!("  Failed:   {}", report.failed);
    if report.metadata_failures > 0 {
        println!("  Metadata failures: {}", report.metadata_failures);
    }
    if !report.skipped.is_empty() {
        println!("  Skipped:  {}", report.skipped.len());
    }
    if ctx.delete_after_import {
        println!("  Deleted:  {}", report.deleted);
    }
    if ctx.generate_checksums {
        println!("  Ledgers updated: {}", report.ledgers_updated);
    }

    if report.failed > 0 || report.metadata_failures > 0 {
        anyhow::bail!(
            "{} files failed",
            report.failed + report.metadata_failures
        );
    }

    Ok(())
}

fn cmd_verify(
    dir: Option<PathBuf>,
    generate: bool,
    check: bool,
    update: bool,
    recursive: bool,
) -> Result<()> {
    let defaults = EnvironmentDefaults::load();
    let root = dir.unwrap_or_else(|| defaults.archive_root.clone());
    let algorithm: ChecksumAlgorithm = defaults
        .checksum_algorithm
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // clap guarantees exactly one mode flag
    debug_assert!(generate || check || update);
    if generate {
        let report = checksum::generate(&root, recursive, algorithm)?;
        println!(
            "Generated ledgers for {} directories ({} files hashed)",
            report.results.len(),
            report.added()
        );
        return Ok(());
    }

    if update {
        let report = checksum::update(&root, recursive, algorithm)?;
        println!(
            "Updated {} ledgers: {} entries added, {} removed",
            report.ledgers_visited,
            report.added(),
            report.removed()
        );
        return Ok(());
    }

    let report = checksum::check(&root, recursive, algorithm)?;
    print_check_report(&report);

    if !report.is_success() {
        anyhow::bail!(
            "Verification failed: {} mismatched, {} missing, {} unreadable",
            report.mismatched(),
            report.missing(),
            report.unreadable()
        );
    }
    Ok(())
}

fn print_check_report(report: &VerificationReport) {
    for result in &report.results {
        for name in &result.mismatched {
            println!("MISMATCH    {}", result.directory.join(name).display());
        }
        for name in &result.missing {
            println!("MISSING     {}", result.directory.join(name).display());
        }
        for name in &result.unreadable {
            println!("UNREADABLE  {}", result.directory.join(name).display());
        }
    }

    println!(
        "Checked {} ledgers: {} verified, {} mismatched, {} missing, {} unreadable",
        report.ledgers_visited,
        report.verified(),
        report.mismatched(),
        report.missing(),
        report.unreadable()
    );
}
