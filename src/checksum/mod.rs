// Per-directory checksum ledgers
//
// Each directory carries its own `.checksums` file: one `<digest>  <filename>`
// line per visible file, non-recursive (subdirectories have their own
// ledgers). Three operations: generate fills gaps at the directory level,
// check verifies listed entries, update reconciles the entry set without ever
// recomputing an unchanged digest. Ledger rewrites go through a temp file and
// rename so an interrupted run never leaves a truncated ledger.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use log::warn;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::constants::{HASH_CHUNK_SIZE, LEDGER_FILENAME, LEDGER_TEMP_SUFFIX};
use crate::error::{PhotoVaultError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha256,
    Blake3,
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "blake3" => Ok(ChecksumAlgorithm::Blake3),
            other => Err(format!("Unknown checksum algorithm: {}", other)),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
            ChecksumAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Hex digest of a file's full contents, read in 1MB chunks.
pub fn digest_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        PhotoVaultError::Checksum(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buffer).map_err(|e| {
                    PhotoVaultError::Checksum(format!("Failed to read {}: {}", path.display(), e))
                })?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            Ok(format!("{:x}", hasher.finalize()))
        }
        ChecksumAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = file.read(&mut buffer).map_err(|e| {
                    PhotoVaultError::Checksum(format!("Failed to read {}: {}", path.display(), e))
                })?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
    }
}

/// One ledger line: filename relative to the ledger's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub filename: String,
    pub digest: String,
}

/// In-memory ledger for one directory. Entries are keyed by filename and keep
/// insertion order for stable diffs.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Load the ledger for a directory, `None` when the directory has none.
    pub fn load(dir: &Path) -> Result<Option<Ledger>> {
        let path = dir.join(LEDGER_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            PhotoVaultError::Checksum(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut entries = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            // Two spaces separate digest and filename; the filename itself
            // may contain spaces.
            let (digest, filename) = line.split_once("  ").ok_or_else(|| {
                PhotoVaultError::Checksum(format!("Malformed ledger line in {}: {}", path.display(), line))
            })?;
            entries.push(LedgerEntry {
                filename: filename.to_string(),
                digest: digest.to_string(),
            });
        }

        Ok(Some(Ledger { entries }))
    }

    /// Atomically rewrite the ledger: write a temp file, then rename over.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(LEDGER_FILENAME);
        let tmp_path = dir.join(format!("{}{}", LEDGER_FILENAME, LEDGER_TEMP_SUFFIX));

        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.digest);
            content.push_str("  ");
            content.push_str(&entry.filename);
            content.push('\n');
        }

        std::fs::write(&tmp_path, content).map_err(|e| {
            PhotoVaultError::Checksum(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            PhotoVaultError::Checksum(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.iter().any(|e| e.filename == filename)
    }

    pub fn push(&mut self, filename: String, digest: String) {
        self.entries.push(LedgerEntry { filename, digest });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome for one directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResult {
    pub directory: PathBuf,
    pub verified: usize,
    pub mismatched: Vec<String>,
    pub missing: Vec<String>,
    /// Files that could not be opened or read for digesting. A read failure
    /// is a per-file discrepancy, not a scan abort.
    pub unreadable: Vec<String>,
    pub added: usize,
    pub removed: usize,
}

impl DirectoryResult {
    fn new(directory: &Path) -> DirectoryResult {
        DirectoryResult {
            directory: directory.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty() && self.unreadable.is_empty()
    }
}

/// Aggregate over every directory a verify run visited. Discrepancies are
/// accumulated across the whole tree; the scan never stops early.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub results: Vec<DirectoryResult>,
    pub ledgers_visited: usize,
}

impl VerificationReport {
    pub fn verified(&self) -> usize {
        self.results.iter().map(|r| r.verified).sum()
    }

    pub fn mismatched(&self) -> usize {
        self.results.iter().map(|r| r.mismatched.len()).sum()
    }

    pub fn missing(&self) -> usize {
        self.results.iter().map(|r| r.missing.len()).sum()
    }

    pub fn unreadable(&self) -> usize {
        self.results.iter().map(|r| r.unreadable.len()).sum()
    }

    pub fn added(&self) -> usize {
        self.results.iter().map(|r| r.added).sum()
    }

    pub fn removed(&self) -> usize {
        self.results.iter().map(|r| r.removed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.is_clean())
    }
}

/// Visible files directly inside a directory, sorted by name. Dotfiles
/// (the ledger itself, card config files) are never ledgered.
fn visible_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| {
        PhotoVaultError::Checksum(format!("Failed to list {}: {}", dir.display(), e))
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| {
            PhotoVaultError::Checksum(format!("Failed to list {}: {}", dir.display(), e))
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Directories to operate on: the root and, when recursive, every
/// subdirectory, in sorted traversal order.
fn target_directories(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PhotoVaultError::Source(format!(
            "Directory does not exist: {}",
            root.display()
        )));
    }

    if !recursive {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            dirs.push(entry.path().to_path_buf());
        }
    }
    Ok(dirs)
}

/// Write a fresh ledger for every directory in scope that has none.
/// Directories already carrying a ledger are left untouched: generate fills
/// gaps at the directory level, never the file level.
pub fn generate(root: &Path, recursive: bool, algorithm: ChecksumAlgorithm) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    for dir in target_directories(root, recursive)? {
        if Ledger::load(&dir)?.is_some() {
            report.ledgers_visited += 1;
            continue;
        }

        let files = visible_files(&dir)?;
        if files.is_empty() {
            continue;
        }

        let mut result = DirectoryResult::new(&dir);
        let mut ledger = Ledger::default();
        for name in files {
            match digest_file(&dir.join(&name), algorithm) {
                Ok(digest) => {
                    ledger.push(name, digest);
                    result.added += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    result.unreadable.push(name);
                }
            }
        }
        ledger.save(&dir)?;
        report.ledgers_visited += 1;
        report.results.push(result);
    }

    Ok(report)
}

/// Verify every ledgered directory in scope. Listed files are recomputed and
/// compared; a changed digest is a mismatch, a vanished file is missing.
/// Files on disk that were never ledgered are not errors here (update's job).
/// Zero ledgers in scope is a successful no-op: integrity checking is opt-in.
pub fn check(root: &Path, recursive: bool, algorithm: ChecksumAlgorithm) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    for dir in target_directories(root, recursive)? {
        let Some(ledger) = Ledger::load(&dir)? else {
            continue;
        };
        report.ledgers_visited += 1;

        let mut result = DirectoryResult::new(&dir);
        for entry in ledger.entries() {
            let path = dir.join(&entry.filename);
            if !path.is_file() {
                result.missing.push(entry.filename.clone());
                continue;
            }
            // A file that cannot be read is exactly what the ledger is here
            // to catch; record it and keep scanning.
            let actual = match digest_file(&path, algorithm) {
                Ok(digest) => digest,
                Err(e) => {
                    warn!("{}", e);
                    result.unreadable.push(entry.filename.clone());
                    continue;
                }
            };
            if actual == entry.digest {
                result.verified += 1;
            } else {
                result.mismatched.push(entry.filename.clone());
            }
        }
        report.results.push(result);
    }

    Ok(report)
}

/// Reconcile every ledgered directory in scope: append entries for new files,
/// drop entries for deleted files, and keep every surviving entry's line
/// byte-identical. Update never recomputes an existing digest, so it can
/// never silently paper over a mismatch.
pub fn update(root: &Path, recursive: bool, algorithm: ChecksumAlgorithm) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    for dir in target_directories(root, recursive)? {
        if Ledger::load(&dir)?.is_none() {
            continue;
        }
        report.ledgers_visited += 1;
        let result = update_directory(&dir, algorithm)?;
        report.results.push(result);
    }

    Ok(report)
}

/// Update one directory's ledger, creating it when absent. This is the entry
/// point the import pipeline uses for freshly written destination folders.
pub fn update_directory(dir: &Path, algorithm: ChecksumAlgorithm) -> Result<DirectoryResult> {
    let old = Ledger::load(dir)?.unwrap_or_default();
    let files = visible_files(dir)?;

    let mut result = DirectoryResult::new(dir);
    let mut updated = Ledger::default();

    // Existing entries survive byte-for-byte while their file is present
    for entry in old.entries() {
        if files.contains(&entry.filename) {
            updated.push(entry.filename.clone(), entry.digest.clone());
            result.verified += 1;
        } else {
            result.removed += 1;
        }
    }

    // New files are appended in sorted order
    for name in &files {
        if !old.contains(name) {
            match digest_file(&dir.join(name), algorithm) {
                Ok(digest) => {
                    updated.push(name.clone(), digest);
                    result.added += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    result.unreadable.push(name.clone());
                }
            }
        }
    }

    if !updated.is_empty() || !old.is_empty() {
        updated.save(dir)?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ALGO: ChecksumAlgorithm = ChecksumAlgorithm::Sha256;

    fn write_files(dir: &Path, files: &[(&str, &[u8])]) {
        std::fs::create_dir_all(dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("sha256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!("BLAKE3".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Blake3);
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_sha256_digest_known_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            digest_file(&path, ChecksumAlgorithm::Sha256).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generate_then_check_round_trip() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"aaa"), ("b.jpg", b"bbb"), ("c.jpg", b"ccc")]);

        let gen = generate(tmp.path(), true, ALGO).unwrap();
        assert!(gen.is_success());
        assert_eq!(gen.added(), 3);

        let ledger_text = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        let lines: Vec<_> = ledger_text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.contains("  "), "digest and filename are two-space separated");
        }

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(chk.is_success());
        assert_eq!(chk.verified(), 3);
        assert_eq!(chk.mismatched(), 0);
        assert_eq!(chk.missing(), 0);
    }

    #[test]
    fn test_check_detects_single_mismatch() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("ok.jpg", b"fine"), ("bad.jpg", b"original")]);
        generate(tmp.path(), true, ALGO).unwrap();

        // Append one byte to one file
        let mut content = std::fs::read(tmp.path().join("bad.jpg")).unwrap();
        content.push(b'!');
        std::fs::write(tmp.path().join("bad.jpg"), content).unwrap();

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(!chk.is_success());
        assert_eq!(chk.mismatched(), 1);
        assert_eq!(chk.missing(), 0);
        assert_eq!(chk.results[0].mismatched, vec!["bad.jpg".to_string()]);
        assert_eq!(chk.verified(), 1);
    }

    #[test]
    fn test_check_detects_missing_file_only() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("keep.jpg", b"keep"), ("gone.jpg", b"gone")]);
        generate(tmp.path(), true, ALGO).unwrap();

        std::fs::remove_file(tmp.path().join("gone.jpg")).unwrap();

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(!chk.is_success());
        assert_eq!(chk.missing(), 1);
        assert_eq!(chk.results[0].missing, vec!["gone.jpg".to_string()]);
        // Unrelated files must not be dragged into the failure
        assert_eq!(chk.mismatched(), 0);
        assert_eq!(chk.verified(), 1);
    }

    #[test]
    fn test_check_without_ledgers_is_success() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("unledgered.jpg", b"x")]);

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(chk.is_success());
        assert_eq!(chk.ledgers_visited, 0);
    }

    #[test]
    fn test_check_ignores_unledgered_disk_files() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"a")]);
        generate(tmp.path(), true, ALGO).unwrap();
        write_files(tmp.path(), &[("later.jpg", b"l")]);

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(chk.is_success());
        assert_eq!(chk.verified(), 1);
    }

    #[test]
    fn test_generate_recursive_and_top_level_only() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("top.jpg", b"t")]);
        write_files(&tmp.path().join("sub"), &[("nested.jpg", b"n")]);

        generate(tmp.path(), false, ALGO).unwrap();
        assert!(tmp.path().join(LEDGER_FILENAME).exists());
        assert!(!tmp.path().join("sub").join(LEDGER_FILENAME).exists());

        generate(tmp.path(), true, ALGO).unwrap();
        assert!(tmp.path().join("sub").join(LEDGER_FILENAME).exists());
    }

    #[test]
    fn test_generate_is_noop_on_ledgered_directory() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"a")]);
        generate(tmp.path(), true, ALGO).unwrap();
        let before = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();

        // Even after the file changes, generate must not recompute
        std::fs::write(tmp.path().join("a.jpg"), b"changed").unwrap();
        generate(tmp.path(), true, ALGO).unwrap();
        let after = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_update_preserves_unchanged_appends_new_drops_deleted() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"aaa"), ("z.jpg", b"zzz")]);
        generate(tmp.path(), true, ALGO).unwrap();

        let before = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        let a_line = before.lines().find(|l| l.ends_with("a.jpg")).unwrap().to_string();

        // Silently corrupt a.jpg, add b.jpg, delete z.jpg
        std::fs::write(tmp.path().join("a.jpg"), b"tampered").unwrap();
        std::fs::write(tmp.path().join("b.jpg"), b"bbb").unwrap();
        std::fs::remove_file(tmp.path().join("z.jpg")).unwrap();

        let upd = update(tmp.path(), true, ALGO).unwrap();
        assert_eq!(upd.added(), 1);
        assert_eq!(upd.removed(), 1);

        let after = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        // a.jpg's line survives byte-for-byte: update never "fixes" a digest
        assert!(after.lines().any(|l| l == a_line));
        assert!(after.contains("b.jpg"));
        assert!(!after.contains("z.jpg"));

        // The tampering is still detectable afterwards
        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert_eq!(chk.mismatched(), 1);
        assert_eq!(chk.results[0].mismatched, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn test_update_skips_unledgered_directories() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"a")]);

        let upd = update(tmp.path(), true, ALGO).unwrap();
        assert_eq!(upd.ledgers_visited, 0);
        assert!(!tmp.path().join(LEDGER_FILENAME).exists());
    }

    #[test]
    fn test_update_directory_creates_ledger_for_import() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("20260124_E_001.jpg", b"x")]);

        let result = update_directory(tmp.path(), ALGO).unwrap();
        assert_eq!(result.added, 1);
        assert!(tmp.path().join(LEDGER_FILENAME).exists());
    }

    #[test]
    fn test_ledger_never_lists_dotfiles() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"a")]);
        std::fs::write(tmp.path().join(".import.yaml"), "event: X\n").unwrap();

        generate(tmp.path(), true, ALGO).unwrap();
        let text = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains(".import.yaml"));
        assert!(!text.contains(LEDGER_FILENAME));
    }

    #[test]
    fn test_filename_with_spaces_round_trips() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("My Photo Name.jpg", b"spacey")]);

        generate(tmp.path(), true, ALGO).unwrap();
        let text = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        assert!(text.contains("My Photo Name.jpg"));

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(chk.is_success());
        assert_eq!(chk.verified(), 1);
    }

    #[cfg(unix)]
    fn make_unreadable(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged processes ignore file modes; report whether it took
        std::fs::read(path).is_err()
    }

    #[cfg(unix)]
    #[test]
    fn test_check_scans_past_unreadable_file() {
        let tmp = TempDir::new().unwrap();
        let dir_a = tmp.path().join("a");
        let dir_b = tmp.path().join("b");
        write_files(&dir_a, &[("locked.jpg", b"locked"), ("fine.jpg", b"fine")]);
        write_files(&dir_b, &[("clean.jpg", b"clean")]);
        generate(tmp.path(), true, ALGO).unwrap();

        if !make_unreadable(&dir_a.join("locked.jpg")) {
            return;
        }

        let chk = check(tmp.path(), true, ALGO).unwrap();
        assert!(!chk.is_success());
        assert_eq!(chk.unreadable(), 1);
        assert_eq!(chk.mismatched(), 0);
        // The readable entry in a and all of b are still verified
        assert_eq!(chk.verified(), 2);
        assert!(chk
            .results
            .iter()
            .any(|r| r.directory == dir_b && r.is_clean()));
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_records_unreadable_and_ledgers_the_rest() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("locked.jpg", b"locked"), ("fine.jpg", b"fine")]);

        if !make_unreadable(&tmp.path().join("locked.jpg")) {
            return;
        }

        let gen = generate(tmp.path(), true, ALGO).unwrap();
        assert_eq!(gen.added(), 1);
        assert_eq!(gen.unreadable(), 1);

        let text = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        assert!(text.contains("fine.jpg"));
        assert!(!text.contains("locked.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_update_skips_unreadable_new_file() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"aaa")]);
        generate(tmp.path(), true, ALGO).unwrap();

        write_files(tmp.path(), &[("locked.jpg", b"locked")]);
        if !make_unreadable(&tmp.path().join("locked.jpg")) {
            return;
        }

        let upd = update(tmp.path(), true, ALGO).unwrap();
        assert_eq!(upd.added(), 0);
        assert_eq!(upd.unreadable(), 1);

        let text = std::fs::read_to_string(tmp.path().join(LEDGER_FILENAME)).unwrap();
        assert!(text.contains("a.jpg"));
        assert!(!text.contains("locked.jpg"));
    }

    #[test]
    fn test_nonexistent_directory_is_source_error() {
        let err = generate(Path::new("/nonexistent/path"), true, ALGO).unwrap_err();
        assert!(matches!(err, PhotoVaultError::Source(_)));
    }

    #[test]
    fn test_no_temp_file_left_after_save() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", b"a")]);
        generate(tmp.path(), true, ALGO).unwrap();

        let tmp_name = format!("{}{}", LEDGER_FILENAME, LEDGER_TEMP_SUFFIX);
        assert!(!tmp.path().join(tmp_name).exists());
    }
}
