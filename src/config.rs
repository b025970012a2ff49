// Layered run configuration
//
// Three layers, lowest to highest priority:
//   1. built-in defaults, overridable by environment variables
//   2. .import.yaml at the source root
//   3. explicit CLI arguments
// Each field falls through to the next lower layer when absent. The merged
// result is a read-only ImportContext for the whole run.

use std::env;
use std::path::{Path, PathBuf};
use serde::Deserialize;

use crate::checksum::ChecksumAlgorithm;
use crate::constants::{
    DATE_ONLY_FILENAME_PATTERN, DEFAULT_FILENAME_PATTERN, DEFAULT_FOLDER_STRUCTURE,
    DEFAULT_LIBRARY_DIRNAME, IMPORT_CONFIG_FILENAME,
};
use crate::error::{PhotoVaultError, Result};
use crate::naming::FilenamePattern;

/// Context/placement overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub event: Option<String>,
    pub location: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub credit: Option<String>,
    pub gps: Option<String>,
    pub delete_after_import: bool,
    pub split_by_type: bool,
    pub trip: bool,
    pub generate_checksums: bool,
}

/// Environment-variable layer with built-in fallbacks. Keys follow the
/// archive's long-standing shell configuration names.
#[derive(Debug, Clone)]
pub struct EnvironmentDefaults {
    pub archive_root: PathBuf,
    pub folder_structure: String,
    pub filename_pattern: String,
    pub generate_checksums: bool,
    pub checksum_algorithm: String,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub credit: Option<String>,
}

impl EnvironmentDefaults {
    pub fn load() -> EnvironmentDefaults {
        EnvironmentDefaults {
            archive_root: env::var("PHOTO_LIBRARY")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_library_root()),
            folder_structure: env::var("FOLDER_STRUCTURE")
                .unwrap_or_else(|_| DEFAULT_FOLDER_STRUCTURE.to_string()),
            filename_pattern: env::var("FILENAME_PATTERN")
                .unwrap_or_else(|_| DEFAULT_FILENAME_PATTERN.to_string()),
            generate_checksums: env::var("GENERATE_CHECKSUMS")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            checksum_algorithm: env::var("CHECKSUM_ALGORITHM")
                .unwrap_or_else(|_| crate::constants::DEFAULT_CHECKSUM_ALGORITHM.to_string()),
            author: env::var("DEFAULT_AUTHOR").ok().filter(|v| !v.is_empty()),
            copyright: env::var("DEFAULT_COPYRIGHT").ok().filter(|v| !v.is_empty()),
            credit: env::var("DEFAULT_CREDIT").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn default_library_root() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_LIBRARY_DIRNAME)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// The declarative `.import.yaml` at a card root. Flat key/value document;
/// unknown keys are ignored, malformed content is a hard error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardConfig {
    pub event: Option<String>,
    pub location: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub credit: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CardConfig {
    /// Look for `.import.yaml` at the root of the source tree, non-recursive.
    pub fn load(source_root: &Path) -> Result<Option<CardConfig>> {
        let path = source_root.join(IMPORT_CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            PhotoVaultError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: CardConfig = serde_yaml::from_str(&text).map_err(|e| {
            PhotoVaultError::Config(format!("Malformed {}: {}", path.display(), e))
        })?;

        Ok(Some(config))
    }
}

/// Resolved, read-only configuration for one import run.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub archive_root: PathBuf,
    pub event: Option<String>,
    pub location: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub credit: Option<String>,
    pub gps: Option<String>,
    pub tags: Vec<String>,
    pub folder_pattern: String,
    pub filename_pattern: String,
    pub delete_after_import: bool,
    pub generate_checksums: bool,
    pub split_by_type: bool,
    pub trip: bool,
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl ImportContext {
    /// Merge the three layers. Fails fast (before any file I/O) when the
    /// effective filename pattern needs an event none of the layers supplied
    /// and trip mode is off.
    pub fn resolve(
        cli: &CliOverrides,
        source_root: &Path,
        defaults: &EnvironmentDefaults,
    ) -> Result<ImportContext> {
        let card = CardConfig::load(source_root)?.unwrap_or_default();

        let event = cli.event.clone().or_else(|| card.event.clone());
        let location = cli.location.clone().or_else(|| card.location.clone());
        let author = cli
            .author
            .clone()
            .or_else(|| card.author.clone())
            .or_else(|| defaults.author.clone());
        let copyright = cli
            .copyright
            .clone()
            .or_else(|| card.copyright.clone())
            .or_else(|| defaults.copyright.clone());
        let credit = cli
            .credit
            .clone()
            .or_else(|| card.credit.clone())
            .or_else(|| defaults.credit.clone());

        let checksum_algorithm: ChecksumAlgorithm = defaults
            .checksum_algorithm
            .parse()
            .map_err(PhotoVaultError::Config)?;

        let mut filename_pattern = defaults.filename_pattern.clone();
        let parsed = FilenamePattern::parse(&filename_pattern)?;
        if parsed.references_event() && event.is_none() {
            if cli.trip {
                // Trip mode tolerates missing events; drop to date-only names.
                filename_pattern = DATE_ONLY_FILENAME_PATTERN.to_string();
            } else {
                return Err(PhotoVaultError::Config(
                    "No event resolved from CLI, .import.yaml, or defaults; \
                     pass --event, add one to .import.yaml, or use --trip"
                        .to_string(),
                ));
            }
        }

        Ok(ImportContext {
            archive_root: defaults.archive_root.clone(),
            event,
            location,
            author,
            copyright,
            credit,
            gps: cli.gps.clone(),
            tags: card.tags,
            folder_pattern: defaults.folder_structure.clone(),
            filename_pattern,
            delete_after_import: cli.delete_after_import,
            generate_checksums: cli.generate_checksums || defaults.generate_checksums,
            split_by_type: cli.split_by_type,
            trip: cli.trip,
            checksum_algorithm,
        })
    }
}
