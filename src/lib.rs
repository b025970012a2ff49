// PhotoVault library root

pub mod checksum;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod import;
pub mod metadata;
pub mod naming;

pub use checksum::{ChecksumAlgorithm, VerificationReport};
pub use classify::FileKind;
pub use config::{CliOverrides, EnvironmentDefaults, ImportContext};
pub use error::{PhotoVaultError, Result};
pub use import::{ImportReport, PlannedFile};
pub use metadata::{ExifToolGateway, MetadataGateway};
