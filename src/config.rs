//! Rules file I/O.
//!
//! The rules file is plain line-oriented text (see `engine/parser.rs` for the
//! dialect). This module only handles the file mechanics: creating the
//! commented default file when none exists, and reading lines back.
//!
//! I/O failures are the one error class that surfaces to the host as a hard
//! `Result` (a failed reload must be distinguishable from an empty file so
//! the previous rule store can be kept).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Suggested file name for the rules file in the host's config directory.
pub const DEFAULT_FILE_NAME: &str = "biomeshift.rules";

const DEFAULT_TEMPLATE: &str = "\
muteChatInfo = false
! Mute the join notification (true/false, default: false)
!
! Define biome replacement rules below:
! Syntax: old_biome > new_biome
!
! Example rules (remove '!' to activate):
! minecraft:dark_forest > minecraft:cherry_grove
! terralith:lavender_forest > aurorasdeco:lavender_plains
! terralith:cave/infested_caves > minecraft:dripstone_caves
!
! For biome tags, use '#' as prefix:
! #minecraft:is_forest > minecraft:desert
!
! Optional trailing modifiers:
!   probability        minecraft:plains > minecraft:sunflower_plains 0.3
!   seed-stable roll   #minecraft:is_forest > minecraft:desert 0.5 seed_stable=true
!   blend range        minecraft:badlands > minecraft:desert blend_range=8
";

/// Errors from reading or creating the rules file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the rules file.
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error writing the default rules file.
    #[error("failed to create default rules file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write the commented default rules file if `path` does not exist yet.
pub fn create_if_absent(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, DEFAULT_TEMPLATE)
        .map_err(|source| ConfigError::Create { path: path.to_path_buf(), source })?;
    log::info!("default rules file created at {}", path.display());
    Ok(())
}

/// Read the rules file into lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    Ok(text.lines().map(str::to_owned).collect())
}
