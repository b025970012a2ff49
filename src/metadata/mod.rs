// Metadata gateway
//
// The import pipeline never builds exiftool argument strings itself; it talks
// to this trait. The exiftool adapter lives in `exiftool.rs` and is the only
// place that knows concrete tag names and invocation syntax.

pub mod exiftool;

use std::collections::BTreeMap;
use std::path::Path;
use chrono::NaiveDateTime;

use crate::error::Result;

pub use exiftool::ExifToolGateway;

/// Logical metadata fields the archive cares about. Each maps to one or more
/// concrete tags in the adapter, written redundantly across namespaces so any
/// downstream viewer sees consistent values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Author,
    Copyright,
    Event,
    Location,
    Title,
    Description,
    Keywords,
    Credit,
    Gps,
}

/// A set of logical field values to write onto a file.
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
    values: BTreeMap<Field, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) -> &mut Self {
        self.values.insert(field, value.into());
        self
    }

    /// Insert only when the value is present; `None` leaves the field unset.
    pub fn set_opt(&mut self, field: Field, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.values.insert(field, v.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

/// GPS position decomposed into the magnitude + hemisphere-reference pairs
/// metadata tags expect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPosition {
    pub latitude: f64,
    pub latitude_ref: char,
    pub longitude: f64,
    pub longitude_ref: char,
}

impl GpsPosition {
    /// Parse a `"lat,lon"` decimal-degrees string.
    pub fn parse(value: &str) -> Option<GpsPosition> {
        let mut parts = value.splitn(2, ',');
        let lat: f64 = parts.next()?.trim().parse().ok()?;
        let lon: f64 = parts.next()?.trim().parse().ok()?;
        Some(GpsPosition {
            latitude: lat.abs(),
            latitude_ref: if lat >= 0.0 { 'N' } else { 'S' },
            longitude: lon.abs(),
            longitude_ref: if lon >= 0.0 { 'E' } else { 'W' },
        })
    }
}

/// Read/write access to file metadata through an external tool.
///
/// Reads are best-effort: a missing tool, unreadable file, or malformed dump
/// yields `None` and callers degrade to filesystem timestamps. Writes report
/// errors so the orchestrator can count the file as failed.
pub trait MetadataGateway {
    /// Original capture date/time, if the file asserts one.
    fn read_capture_date(&self, path: &Path) -> Option<NaiveDateTime>;

    /// Read a single logical field from a file.
    fn read_field(&self, path: &Path, field: Field) -> Option<String>;

    /// Write a set of logical fields onto one file.
    fn write_fields(&self, path: &Path, values: &FieldValues) -> Result<()>;

    /// Write the same fields onto many files; returns the success count.
    fn write_fields_batch(&self, paths: &[&Path], values: &FieldValues) -> usize;
}
