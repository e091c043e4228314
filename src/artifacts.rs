use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{BblError, Result};

pub const TEMPLATE_FILE: &str = "template.json";
pub const CLOUD_CONFIG_FILE: &str = "cloud-config.yml";
pub const OPS_FILE: &str = "ops-file.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub relative_path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(relative_path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            contents: contents.into(),
        }
    }
}

/// Rejects absolute paths and any that climb out of the output directory.
fn check_relative(candidate: &Path) -> Result<()> {
    if candidate.is_absolute() {
        return Err(BblError::Config(format!(
            "absolute paths are not allowed: {}",
            candidate.display()
        )));
    }
    if candidate
        .components()
        .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(BblError::Config(format!(
            "path escapes output directory: {}",
            candidate.display()
        )));
    }
    Ok(())
}

/// Writes every file under `root`, creating directories as needed, and
/// returns the written paths.
pub fn write_artifacts(root: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    for file in files {
        check_relative(&file.relative_path)?;
    }
    fs::create_dir_all(root)?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = root.join(&file.relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.contents)?;
        written.push(target);
    }
    Ok(written)
}
