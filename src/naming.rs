// Naming and placement engine
//
// Computes destination directory + filename for each accepted source file
// from the folder/filename patterns, capture date, event, and sequence
// counters keyed by destination directory and realized pattern. Counters are
// seeded from the highest sequence number already on disk, so re-running an
// import never overwrites and never reuses a number.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::classify::FileKind;
use crate::constants::{JPG_SUBFOLDER, RAW_SUBFOLDER};
use crate::error::{PhotoVaultError, Result};

/// Destination decided for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDecision {
    pub directory: PathBuf,
    pub filename: String,
    pub sequence: u32,
}

impl PlacementDecision {
    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// A filename pattern with its `{seq:NNNd}` token parsed out.
#[derive(Debug, Clone)]
pub struct FilenamePattern {
    /// Pattern text before the sequence token, `{date}`/`{event}` unsubstituted.
    prefix: String,
    /// Pattern text after the sequence token.
    suffix: String,
    /// Zero-pad width taken from the token itself.
    seq_width: usize,
}

impl FilenamePattern {
    pub fn parse(pattern: &str) -> Result<FilenamePattern> {
        let re = Regex::new(r"\{seq:(\d+)d\}").expect("static regex");
        let caps = re.captures(pattern).ok_or_else(|| {
            PhotoVaultError::Pattern(format!(
                "Filename pattern must contain a {{seq:NNNd}} token: {}",
                pattern
            ))
        })?;
        let token = caps.get(0).expect("whole match");
        let seq_width: usize = caps[1]
            .parse()
            .map_err(|_| PhotoVaultError::Pattern(format!("Bad sequence width in: {}", pattern)))?;

        Ok(FilenamePattern {
            prefix: pattern[..token.start()].to_string(),
            suffix: pattern[token.end()..].to_string(),
            seq_width,
        })
    }

    pub fn references_event(&self) -> bool {
        self.prefix.contains("{event}") || self.suffix.contains("{event}")
    }

    /// Substitute `{date}` and `{event}`, leaving the sequence slot open.
    /// Returns (stem prefix, stem suffix).
    fn realize(&self, date: NaiveDate, event: Option<&str>) -> (String, String) {
        let date_str = date.format("%Y%m%d").to_string();
        let event_str = event.unwrap_or("");
        let sub = |s: &str| s.replace("{date}", &date_str).replace("{event}", event_str);
        (sub(&self.prefix), sub(&self.suffix))
    }

    /// Render the full filename for a given sequence number and extension.
    /// The extension is appended unchanged, case preserved from the source.
    fn render(&self, date: NaiveDate, event: Option<&str>, seq: u32, ext: &str) -> String {
        let (prefix, suffix) = self.realize(date, event);
        format!("{}{:0width$}{}.{}", prefix, seq, suffix, ext, width = self.seq_width)
    }

    /// Regex matching filenames produced by this pattern on a given date,
    /// capturing the sequence number. Any extension is accepted.
    fn seed_regex(&self, date: NaiveDate, event: Option<&str>) -> Regex {
        let (prefix, suffix) = self.realize(date, event);
        let expr = format!(
            r"^{}(\d{{{},}}){}\.[^.]+$",
            regex::escape(&prefix),
            self.seq_width,
            regex::escape(&suffix)
        );
        Regex::new(&expr).expect("escaped pattern regex")
    }
}

/// Substitute `{year}`/`{month}`/`{day}` into the folder pattern. A literal
/// `/` in the pattern yields nested directories.
pub fn render_folder(pattern: &str, date: NaiveDate) -> PathBuf {
    let rendered = pattern
        .replace("{year}", &format!("{:04}", date.year()))
        .replace("{month}", &format!("{:02}", date.month()))
        .replace("{day}", &format!("{:02}", date.day()));

    let mut path = PathBuf::new();
    for part in rendered.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

#[derive(Debug)]
struct PairEntry {
    sequence: u32,
    kinds: Vec<FileKind>,
}

/// Stateful placer for one import run.
pub struct Placer {
    folder_pattern: String,
    filename_pattern: FilenamePattern,
    split_by_type: bool,
    /// Next sequence number per (date directory, realized prefix, suffix).
    /// A dateless folder pattern puts several dates in one directory; each
    /// realized pattern still numbers from its own counter.
    counters: HashMap<(PathBuf, String, String), u32>,
    /// Split-by-type pairing: (date dir, lowercased stem) -> shared sequence.
    pairs: HashMap<(PathBuf, String), PairEntry>,
}

impl Placer {
    pub fn new(
        folder_pattern: &str,
        filename_pattern: &str,
        split_by_type: bool,
    ) -> Result<Placer> {
        Ok(Placer {
            folder_pattern: folder_pattern.to_string(),
            filename_pattern: FilenamePattern::parse(filename_pattern)?,
            split_by_type,
            counters: HashMap::new(),
            pairs: HashMap::new(),
        })
    }

    pub fn references_event(&self) -> bool {
        self.filename_pattern.references_event()
    }

    /// Decide the destination for one file. Files must be fed in capture-time
    /// order (ties broken by source path) for deterministic numbering.
    pub fn place(
        &mut self,
        source: &Path,
        kind: FileKind,
        captured: NaiveDateTime,
        archive_root: &Path,
        event: Option<&str>,
    ) -> Result<PlacementDecision> {
        let date = captured.date();
        let date_dir = archive_root.join(render_folder(&self.folder_pattern, date));

        let dest_dir = if self.split_by_type {
            match kind {
                FileKind::Raw => date_dir.join(RAW_SUBFOLDER),
                _ => date_dir.join(JPG_SUBFOLDER),
            }
        } else {
            date_dir.clone()
        };

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                PhotoVaultError::InvalidPath(format!("No extension: {}", source.display()))
            })?
            .to_string();

        let stem_key = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        // Paired raw/jpg siblings share one sequence number so their stems
        // match across the raw/ and jpg/ subfolders.
        if self.split_by_type {
            let key = (date_dir.clone(), stem_key.clone());
            if let Some(entry) = self.pairs.get_mut(&key) {
                if !entry.kinds.contains(&kind) {
                    let seq = entry.sequence;
                    entry.kinds.push(kind);
                    let filename = self.filename_pattern.render(date, event, seq, &ext);
                    let candidate = dest_dir.join(&filename);
                    if !candidate.exists() {
                        return Ok(PlacementDecision {
                            directory: dest_dir,
                            filename,
                            sequence: seq,
                        });
                    }
                    // Sibling slot already taken on disk; fall through to a
                    // fresh allocation below.
                }
            }
        }

        let seq = self.allocate(&date_dir, &dest_dir, date, event)?;
        let filename = self.filename_pattern.render(date, event, seq, &ext);

        if self.split_by_type {
            self.pairs.insert(
                (date_dir, stem_key),
                PairEntry {
                    sequence: seq,
                    kinds: vec![kind],
                },
            );
        }

        Ok(PlacementDecision {
            directory: dest_dir,
            filename,
            sequence: seq,
        })
    }

    /// Take the next free sequence number for a realized pattern in a date
    /// directory, seeding the counter from disk on first use and skipping any
    /// occupied paths.
    fn allocate(
        &mut self,
        date_dir: &Path,
        dest_dir: &Path,
        date: NaiveDate,
        event: Option<&str>,
    ) -> Result<u32> {
        let (prefix, suffix) = self.filename_pattern.realize(date, event);
        let counter_key = (date_dir.to_path_buf(), prefix.clone(), suffix.clone());

        if !self.counters.contains_key(&counter_key) {
            let seed = self.seed_from_disk(date_dir, date, event);
            self.counters.insert(counter_key.clone(), seed + 1);
        }

        let counter = self.counters.get_mut(&counter_key).expect("seeded above");
        // A path that exists with different content is a collision, never an
        // overwrite; advance until the slot is free.
        loop {
            let seq = *counter;
            *counter += 1;
            let probe = format!(
                "{}{:0width$}{}",
                prefix,
                seq,
                suffix,
                width = self.filename_pattern.seq_width
            );
            let occupied = std::fs::read_dir(dest_dir)
                .ok()
                .map(|entries| {
                    entries.filter_map(|e| e.ok()).any(|e| {
                        e.file_name()
                            .to_str()
                            .map(|n| stem_matches(n, &probe))
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if !occupied {
                return Ok(seq);
            }
        }
    }

    /// Highest sequence number already on disk for this pattern and date,
    /// across the date directory and its split subfolders. Zero when none.
    fn seed_from_disk(&self, date_dir: &Path, date: NaiveDate, event: Option<&str>) -> u32 {
        let re = self.filename_pattern.seed_regex(date, event);
        let mut dirs = vec![date_dir.to_path_buf()];
        if self.split_by_type {
            dirs.push(date_dir.join(RAW_SUBFOLDER));
            dirs.push(date_dir.join(JPG_SUBFOLDER));
        }

        let mut max_seq = 0u32;
        for dir in dirs {
            let entries = match std::fs::read_dir(&dir) {
                Ok(e) => e,
                Err(_) => continue,
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if let Some(caps) = re.captures(name) {
                    if let Ok(n) = caps[1].parse::<u32>() {
                        max_seq = max_seq.max(n);
                    }
                }
            }
        }
        max_seq
    }
}

/// True when an existing filename has exactly this stem (extension ignored).
fn stem_matches(filename: &str, stem: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((s, _ext)) => s == stem,
        None => filename == stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dt(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_render_folder_default() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap();
        assert_eq!(
            render_folder("{year}-{month}-{day}", date),
            PathBuf::from("2026-01-24")
        );
    }

    #[test]
    fn test_render_folder_nested() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap();
        assert_eq!(
            render_folder("{year}/{month}", date),
            PathBuf::from("2026").join("01")
        );
    }

    #[test]
    fn test_pattern_parse_width() {
        let p = FilenamePattern::parse("{date}_{event}_{seq:03d}").unwrap();
        assert_eq!(p.seq_width, 3);
        assert!(p.references_event());

        let p = FilenamePattern::parse("{date}_{seq:05d}").unwrap();
        assert_eq!(p.seq_width, 5);
        assert!(!p.references_event());
    }

    #[test]
    fn test_pattern_parse_requires_seq() {
        assert!(FilenamePattern::parse("{date}_{event}").is_err());
    }

    #[test]
    fn test_render_preserves_extension_case() {
        let p = FilenamePattern::parse("{date}_{event}_{seq:03d}").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap();
        assert_eq!(
            p.render(date, Some("Wedding"), 7, "JPG"),
            "20260124_Wedding_007.JPG"
        );
    }

    #[test]
    fn test_sequence_counts_up_in_order() {
        let tmp = TempDir::new().unwrap();
        let mut placer = Placer::new("{year}-{month}-{day}", "{date}_{event}_{seq:03d}", false).unwrap();

        let mut names = Vec::new();
        for i in 0..10 {
            let d = placer
                .place(
                    Path::new(&format!("/sd/IMG_{:04}.JPG", 1000 + i)),
                    FileKind::Image,
                    dt(2026, 1, 24, 10 + i / 4),
                    tmp.path(),
                    Some("Trip"),
                )
                .unwrap();
            names.push(d.filename);
        }

        assert_eq!(names[0], "20260124_Trip_001.JPG");
        assert_eq!(names[9], "20260124_Trip_010.JPG");
    }

    #[test]
    fn test_sequence_seeds_from_disk() {
        let tmp = TempDir::new().unwrap();
        let day_dir = tmp.path().join("2026-01-24");
        std::fs::create_dir_all(&day_dir).unwrap();
        std::fs::write(day_dir.join("20260124_Trip_004.jpg"), b"x").unwrap();
        std::fs::write(day_dir.join("20260124_Trip_002.jpg"), b"x").unwrap();
        // Unrelated file must not perturb the counter
        std::fs::write(day_dir.join("notes.txt"), b"x").unwrap();

        let mut placer = Placer::new("{year}-{month}-{day}", "{date}_{event}_{seq:03d}", false).unwrap();
        let d = placer
            .place(
                Path::new("/sd/IMG_1000.JPG"),
                FileKind::Image,
                dt(2026, 1, 24, 10),
                tmp.path(),
                Some("Trip"),
            )
            .unwrap();

        assert_eq!(d.filename, "20260124_Trip_005.JPG");
    }

    #[test]
    fn test_split_by_type_pairs_share_sequence() {
        let tmp = TempDir::new().unwrap();
        let mut placer = Placer::new("{year}-{month}-{day}", "{date}_{event}_{seq:03d}", true).unwrap();

        let jpg = placer
            .place(
                Path::new("/sd/IMG_1000.JPG"),
                FileKind::Image,
                dt(2026, 1, 24, 10),
                tmp.path(),
                Some("Trip"),
            )
            .unwrap();
        let raw = placer
            .place(
                Path::new("/sd/IMG_1000.CR3"),
                FileKind::Raw,
                dt(2026, 1, 24, 10),
                tmp.path(),
                Some("Trip"),
            )
            .unwrap();

        assert_eq!(jpg.sequence, raw.sequence);
        assert!(jpg.directory.ends_with(Path::new("2026-01-24").join(JPG_SUBFOLDER)));
        assert!(raw.directory.ends_with(Path::new("2026-01-24").join(RAW_SUBFOLDER)));
        assert_eq!(jpg.filename, "20260124_Trip_001.JPG");
        assert_eq!(raw.filename, "20260124_Trip_001.CR3");
    }

    #[test]
    fn test_split_by_type_same_kind_same_stem_gets_new_sequence() {
        let tmp = TempDir::new().unwrap();
        let mut placer = Placer::new("{year}-{month}-{day}", "{date}_{seq:03d}", true).unwrap();

        let a = placer
            .place(Path::new("/a/IMG_1000.JPG"), FileKind::Image, dt(2026, 1, 24, 10), tmp.path(), None)
            .unwrap();
        let b = placer
            .place(Path::new("/b/IMG_1000.JPG"), FileKind::Image, dt(2026, 1, 24, 11), tmp.path(), None)
            .unwrap();

        assert_ne!(a.sequence, b.sequence);
        assert_ne!(a.full_path(), b.full_path());
    }

    #[test]
    fn test_dateless_folder_pattern_numbers_each_date_independently() {
        let tmp = TempDir::new().unwrap();
        let mut placer = Placer::new("archive", "{date}_{seq:03d}", false).unwrap();

        let a = placer
            .place(Path::new("/sd/IMG_1.JPG"), FileKind::Image, dt(2026, 1, 24, 10), tmp.path(), None)
            .unwrap();
        let b = placer
            .place(Path::new("/sd/IMG_2.JPG"), FileKind::Image, dt(2026, 1, 25, 10), tmp.path(), None)
            .unwrap();

        assert_eq!(a.directory, b.directory);
        assert_eq!(a.filename, "20260124_001.JPG");
        assert_eq!(b.filename, "20260125_001.JPG");
    }

    #[test]
    fn test_dateless_folder_pattern_seeds_each_date_from_disk() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("archive");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("20260125_004.jpg"), b"x").unwrap();

        let mut placer = Placer::new("archive", "{date}_{seq:03d}", false).unwrap();
        let a = placer
            .place(Path::new("/sd/IMG_1.JPG"), FileKind::Image, dt(2026, 1, 24, 10), tmp.path(), None)
            .unwrap();
        let b = placer
            .place(Path::new("/sd/IMG_2.JPG"), FileKind::Image, dt(2026, 1, 25, 10), tmp.path(), None)
            .unwrap();

        assert_eq!(a.filename, "20260124_001.JPG");
        // The second date's counter seeds from its own on-disk files
        assert_eq!(b.filename, "20260125_005.JPG");
    }

    #[test]
    fn test_distinct_dates_get_distinct_folders() {
        let tmp = TempDir::new().unwrap();
        let mut placer = Placer::new("{year}-{month}-{day}", "{date}_{seq:03d}", false).unwrap();

        let a = placer
            .place(Path::new("/sd/IMG_1.JPG"), FileKind::Image, dt(2026, 1, 24, 10), tmp.path(), None)
            .unwrap();
        let b = placer
            .place(Path::new("/sd/IMG_2.JPG"), FileKind::Image, dt(2026, 1, 25, 10), tmp.path(), None)
            .unwrap();

        assert!(a.directory.ends_with("2026-01-24"));
        assert!(b.directory.ends_with("2026-01-25"));
        // Counters are independent per directory
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 1);
    }
}
