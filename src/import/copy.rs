// File copy with verification

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{PhotoVaultError, Result};

/// Copy one file with size verification and mtime preservation. A failed
/// verification removes the partial destination before returning the error,
/// so the archive never keeps a half-written file.
pub fn copy_with_verify(source: &Path, dest: &Path) -> Result<()> {
    let mut source_file = fs::File::open(source)?;
    let mut buffer = Vec::new();
    source_file.read_to_end(&mut buffer)?;

    let mut dest_file = fs::File::create(dest)?;
    dest_file.write_all(&buffer)?;
    dest_file.sync_all()?;

    let source_size = fs::metadata(source)?.len();
    let dest_size = fs::metadata(dest)?.len();

    if source_size != dest_size {
        let _ = fs::remove_file(dest);
        return Err(PhotoVaultError::Import(format!(
            "Verification failed for {}: size mismatch ({} vs {})",
            dest.display(),
            source_size,
            dest_size
        )));
    }

    // Keep the capture-era modification time on the archived copy
    if let Ok(source_meta) = fs::metadata(source) {
        if let Ok(modified) = source_meta.modified() {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
        }
    }

    Ok(())
}
