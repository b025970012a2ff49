// Import orchestrator
//
// One import run: discover files on the card, classify, resolve capture
// times, compute the full destination plan, then either report it (dry run)
// or execute it. Per-file failures are counted and logged, never fatal; the
// batch always runs to completion.

pub mod copy;
pub mod discover;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use log::warn;
use serde::Serialize;

use crate::checksum;
use crate::classify::FileKind;
use crate::config::ImportContext;
use crate::error::{PhotoVaultError, Result};
use crate::metadata::{Field, FieldValues, GpsPosition, MetadataGateway};
use crate::naming::{PlacementDecision, Placer};

pub use copy::copy_with_verify;
pub use discover::{scan_source_tree, SourceFile};

/// One source file with its decided destination.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub source: SourceFile,
    pub destination: PlacementDecision,
}

impl PlannedFile {
    pub fn destination_path(&self) -> PathBuf {
        self.destination.full_path()
    }
}

/// Outcome of one import run. In dry-run mode only `plan` and the counts
/// derived from discovery are populated.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub images: usize,
    pub raws: usize,
    /// Warnings for files left on the card (unsupported types).
    pub skipped: Vec<String>,
    pub copied: usize,
    pub failed: usize,
    pub deleted: usize,
    pub metadata_failures: usize,
    pub ledgers_updated: usize,
    #[serde(skip)]
    pub plan: Vec<PlannedFile>,
}

impl ImportReport {
    pub fn planned(&self) -> usize {
        self.plan.len()
    }
}

/// Run one import. The whole plan is computed before the first byte moves,
/// so dry-run output is exactly what a commit would do.
pub fn run(
    source_root: &Path,
    ctx: &ImportContext,
    gateway: &dyn MetadataGateway,
    dry_run: bool,
) -> Result<ImportReport> {
    if let Some(gps) = &ctx.gps {
        if GpsPosition::parse(gps).is_none() {
            return Err(PhotoVaultError::Config(format!(
                "GPS coordinates must be decimal \"lat,lon\": {}",
                gps
            )));
        }
    }

    let mut report = ImportReport {
        dry_run,
        ..Default::default()
    };

    let mut accepted = Vec::new();
    for path in scan_source_tree(source_root)? {
        match FileKind::from_path(&path) {
            FileKind::Other => {
                report
                    .skipped
                    .push(format!("Skipping unsupported file: {}", path.display()));
            }
            kind => {
                // A file that vanished between scan and resolve fails alone,
                // never the batch.
                let file = match discover::resolve_source_file(&path, kind, gateway) {
                    Ok(file) => file,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        report.failed += 1;
                        continue;
                    }
                };
                if !file.captured_from_metadata {
                    warn!(
                        "No capture date in metadata for {}, using file mtime",
                        path.display()
                    );
                }
                match kind {
                    FileKind::Image => report.images += 1,
                    FileKind::Raw => report.raws += 1,
                    FileKind::Other => unreachable!(),
                }
                accepted.push(file);
            }
        }
    }

    // Capture order decides sequence numbers; path breaks timestamp ties so
    // repeated runs over the same card plan identically.
    accepted.sort_by(|a, b| (a.captured, &a.path).cmp(&(b.captured, &b.path)));

    let mut placer = Placer::new(&ctx.folder_pattern, &ctx.filename_pattern, ctx.split_by_type)?;
    for file in accepted {
        let destination = placer.place(
            &file.path,
            file.kind,
            file.captured,
            &ctx.archive_root,
            ctx.event.as_deref(),
        )?;
        report.plan.push(PlannedFile {
            source: file,
            destination,
        });
    }

    if dry_run {
        return Ok(report);
    }

    let values = field_values(ctx);
    let mut touched_dirs: BTreeSet<PathBuf> = BTreeSet::new();

    for planned in &report.plan {
        let dest = planned.destination_path();
        if let Err(e) = fs::create_dir_all(&planned.destination.directory) {
            warn!("Cannot create {}: {}", planned.destination.directory.display(), e);
            report.failed += 1;
            continue;
        }
        if let Err(e) = copy_with_verify(&planned.source.path, &dest) {
            warn!("Copy failed for {}: {}", planned.source.path.display(), e);
            report.failed += 1;
            continue;
        }
        report.copied += 1;
        touched_dirs.insert(planned.destination.directory.clone());

        let mut metadata_ok = true;
        if !values.is_empty() {
            if let Err(e) = gateway.write_fields(&dest, &values) {
                // The archived copy stays; only the source cleanup is held back.
                warn!("Metadata write failed for {}: {}", dest.display(), e);
                report.metadata_failures += 1;
                metadata_ok = false;
            }
        }

        if ctx.delete_after_import && metadata_ok {
            match fs::remove_file(&planned.source.path) {
                Ok(()) => report.deleted += 1,
                Err(e) => warn!(
                    "Cannot delete source {}: {}",
                    planned.source.path.display(),
                    e
                ),
            }
        }
    }

    if ctx.generate_checksums {
        for dir in &touched_dirs {
            checksum::update_directory(dir, ctx.checksum_algorithm)?;
            report.ledgers_updated += 1;
        }
    }

    Ok(report)
}

/// The metadata payload applied to every archived file in this run.
fn field_values(ctx: &ImportContext) -> FieldValues {
    let mut values = FieldValues::new();
    values.set_opt(Field::Event, ctx.event.as_deref());
    values.set_opt(Field::Location, ctx.location.as_deref());
    values.set_opt(Field::Author, ctx.author.as_deref());
    values.set_opt(Field::Copyright, ctx.copyright.as_deref());
    values.set_opt(Field::Credit, ctx.credit.as_deref());
    values.set_opt(Field::Gps, ctx.gps.as_deref());
    if !ctx.tags.is_empty() {
        values.set(Field::Keywords, ctx.tags.join(", "));
    }
    values
}
