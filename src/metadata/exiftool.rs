// ExifTool adapter for the metadata gateway
//
// Tool resolution order:
// 1) PHOTOVAULT_EXIFTOOL_PATH environment override
// 2) PATH lookup

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{PhotoVaultError, Result};
use super::{Field, FieldValues, GpsPosition, MetadataGateway};

/// Concrete tags written for each logical field. Redundant namespaces keep
/// EXIF-only, XMP-only, and IPTC-only viewers in agreement.
fn tags_for(field: Field) -> &'static [&'static str] {
    match field {
        Field::Author => &["Artist", "XMP:Creator", "IPTC:By-line"],
        Field::Copyright => &["Copyright", "XMP:Rights", "IPTC:CopyrightNotice"],
        Field::Event => &["XMP:Event", "IPTC:Caption-Abstract"],
        Field::Location => &["XMP:Location", "IPTC:City"],
        Field::Title => &["XMP:Title", "IPTC:ObjectName"],
        Field::Description => &["ImageDescription", "XMP:Description", "IPTC:Caption-Abstract"],
        Field::Keywords => &["XMP:Subject", "IPTC:Keywords"],
        Field::Credit => &["IPTC:Credit"],
        Field::Gps => &[],
    }
}

/// Capture date tags in order of preference.
const DATE_TAGS: [&str; 2] = ["EXIF:DateTimeOriginal", "EXIF:CreateDate"];

pub struct ExifToolGateway {
    exiftool_path: PathBuf,
}

impl Default for ExifToolGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ExifToolGateway {
    pub fn new() -> Self {
        ExifToolGateway {
            exiftool_path: resolve_exiftool_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        ExifToolGateway { exiftool_path: path }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.exiftool_path)
            .arg("-ver")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Full grouped dump: `exiftool -json -G <file>`.
    /// Keys come back as "Group:Field"; a tag the file lacks yields no key.
    fn read_dump(&self, path: &Path) -> Option<serde_json::Value> {
        let output = Command::new(&self.exiftool_path)
            .args(["-json", "-G"])
            .arg(path)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let array: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
        array.as_array().and_then(|a| a.first()).cloned()
    }

    /// Translate logical fields into exiftool tag assignments.
    fn build_write_args(values: &FieldValues) -> Vec<String> {
        let mut args = vec!["-overwrite_original".to_string()];

        for (field, value) in values.iter() {
            if field == Field::Gps {
                match GpsPosition::parse(value) {
                    Some(gps) => {
                        args.push(format!("-GPSLatitude={}", gps.latitude));
                        args.push(format!("-GPSLatitudeRef={}", gps.latitude_ref));
                        args.push(format!("-GPSLongitude={}", gps.longitude));
                        args.push(format!("-GPSLongitudeRef={}", gps.longitude_ref));
                    }
                    None => {
                        log::warn!("Invalid GPS format, expected \"lat,lon\": {}", value);
                    }
                }
                continue;
            }

            for tag in tags_for(field) {
                args.push(format!("-{}={}", tag, value));
            }
        }

        args
    }
}

impl MetadataGateway for ExifToolGateway {
    fn read_capture_date(&self, path: &Path) -> Option<NaiveDateTime> {
        let dump = self.read_dump(path)?;
        for tag in DATE_TAGS {
            if let Some(value) = dump.get(tag).and_then(|v| v.as_str()) {
                if let Some(parsed) = parse_exif_datetime(value) {
                    return Some(parsed);
                }
            }
        }
        None
    }

    fn read_field(&self, path: &Path, field: Field) -> Option<String> {
        let dump = self.read_dump(path)?;
        for tag in tags_for(field) {
            // Bare tags ("Artist") land in a group in the -G dump; try the
            // tag as-is first, then any "Group:Tag" key ending with it.
            if let Some(value) = dump.get(*tag).and_then(|v| v.as_str()) {
                return Some(value.to_string());
            }
            let suffix = format!(":{}", tag);
            if let Some(obj) = dump.as_object() {
                for (key, value) in obj {
                    if key.ends_with(&suffix) || key == tag {
                        if let Some(s) = value.as_str() {
                            return Some(s.to_string());
                        }
                    }
                }
            }
        }
        None
    }

    fn write_fields(&self, path: &Path, values: &FieldValues) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let mut args = Self::build_write_args(values);
        args.push(path.to_string_lossy().to_string());

        let output = Command::new(&self.exiftool_path)
            .args(&args)
            .output()
            .map_err(|e| PhotoVaultError::ExifTool(format!("Failed to run exiftool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PhotoVaultError::ExifTool(format!(
                "Metadata write failed for {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn write_fields_batch(&self, paths: &[&Path], values: &FieldValues) -> usize {
        if paths.is_empty() || values.is_empty() {
            return if values.is_empty() { paths.len() } else { 0 };
        }

        let mut args = Self::build_write_args(values);
        for path in paths {
            args.push(path.to_string_lossy().to_string());
        }

        let output = match Command::new(&self.exiftool_path).args(&args).output() {
            Ok(o) => o,
            Err(e) => {
                log::warn!("Failed to run exiftool batch write: {}", e);
                return 0;
            }
        };

        // exiftool reports "N image files updated" on stdout
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(count) = parse_updated_count(&stdout) {
            return count;
        }

        if output.status.success() {
            paths.len()
        } else {
            0
        }
    }
}

/// Parse exiftool's "YYYY:MM:DD HH:MM:SS" date form (first 19 chars; some
/// cameras append subseconds or timezone offsets).
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let head: String = value.chars().take(19).collect();
    NaiveDateTime::parse_from_str(&head, "%Y:%m:%d %H:%M:%S").ok()
}

fn parse_updated_count(stdout: &str) -> Option<usize> {
    let re = Regex::new(r"(\d+) image files updated").ok()?;
    let caps = re.captures(stdout)?;
    caps[1].parse().ok()
}

fn resolve_exiftool_path() -> PathBuf {
    if let Ok(v) = env::var("PHOTOVAULT_EXIFTOOL_PATH") {
        let p = PathBuf::from(&v);
        if p.exists() {
            return p;
        }
    }
    PathBuf::from("exiftool")
}
