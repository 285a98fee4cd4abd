//! Random Japanese names from static word lists.
//!
//! Lists live in one directory: `familyNames.txt` holds family names and
//! `<age>-<gender>-Names.txt` holds the given names for each bucket, one name
//! per line.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::error::{Result, TrainerError};
use crate::model::{validate_age, validate_gender, Age, Gender, NameParts};

/// File name of the family-name list.
pub const FAMILY_NAMES_FILE: &str = "familyNames.txt";

/// File name of the given-name list for a bucket.
pub fn given_names_file(age: Age, gender: Gender) -> String {
    format!("{age}-{gender}-Names.txt")
}

/// Picks names from the word lists in a directory.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    names_dir: PathBuf,
}

impl NameGenerator {
    pub fn new(names_dir: impl Into<PathBuf>) -> Self {
        Self {
            names_dir: names_dir.into(),
        }
    }

    pub fn names_dir(&self) -> &Path {
        &self.names_dir
    }

    /// Pick a family name and a given name suitable for the bucket.
    pub fn generate_name(&self, age: Age, gender: Gender) -> Result<NameParts> {
        let family_name = random_line(&self.names_dir.join(FAMILY_NAMES_FILE))?;
        let given_name = random_line(&self.names_dir.join(given_names_file(age, gender)))?;
        Ok(NameParts {
            family_name,
            given_name,
        })
    }

    /// Validate raw bucket values, then pick a name.
    pub fn generate_name_for(&self, age: i64, gender: &str) -> Result<NameParts> {
        let age = validate_age(age)?;
        let gender = validate_gender(gender)?;
        self.generate_name(age, gender)
    }
}

/// Read the usable (non-blank, trimmed) lines of a list.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(TrainerError::ResourceMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| TrainerError::StorageReadError(format!("{}: {e}", path.display())))?;
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if lines.is_empty() {
        return Err(TrainerError::ResourceEmpty(path.to_path_buf()));
    }
    Ok(lines)
}

fn random_line(path: &Path) -> Result<String> {
    let lines = read_list(path)?;
    lines
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| TrainerError::ResourceEmpty(path.to_path_buf()))
}
