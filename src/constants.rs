// PhotoVault constants

// Naming defaults. The filename pattern drops to DATE_ONLY_FILENAME_PATTERN
// when trip mode runs without a resolved event.
pub const DEFAULT_FOLDER_STRUCTURE: &str = "{year}-{month}-{day}";
pub const DEFAULT_FILENAME_PATTERN: &str = "{date}_{event}_{seq:03d}";
pub const DATE_ONLY_FILENAME_PATTERN: &str = "{date}_{seq:03d}";

// Per-source declarative config at the card root
pub const IMPORT_CONFIG_FILENAME: &str = ".import.yaml";

// Checksum ledger
pub const LEDGER_FILENAME: &str = ".checksums";
pub const LEDGER_TEMP_SUFFIX: &str = ".tmp";
pub const DEFAULT_CHECKSUM_ALGORITHM: &str = "sha256";
pub const HASH_CHUNK_SIZE: usize = 1_048_576; // 1MB

// Split-by-type subfolders
pub const RAW_SUBFOLDER: &str = "raw";
pub const JPG_SUBFOLDER: &str = "jpg";

// Default archive location when PHOTO_LIBRARY is unset
pub const DEFAULT_LIBRARY_DIRNAME: &str = "PhotoLibrary";

// Raster image extensions
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "heic", "heif", "webp",
];

// Raw sensor extensions
pub const RAW_EXTENSIONS: [&str; 14] = [
    "cr2", "cr3", "nef", "nrw", "arw", "srf", "sr2", "orf", "rw2", "raf",
    "dng", "pef", "srw", "x3f",
];
