//! Hand-off to the external CSV converter, and the fix-up of its output.
//!
//! The converter (mrc-converter-suite's `convert.pl`) turns the CSV into a
//! password manager bundle. It knows nothing about the quote placeholders,
//! so they are put back into its output file afterwards.

use crate::escape::Placeholders;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// How to invoke the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Run the converter at all after writing the CSV
    pub enabled: bool,
    /// Interpreter or executable
    pub program: String,
    /// Script passed as first argument
    pub script: String,
    /// Input format argument understood by the script
    pub format: String,
    /// Directory the converter runs in
    pub workdir: PathBuf,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "perl".to_string(),
            script: "convert.pl".to_string(),
            format: "csv".to_string(),
            workdir: PathBuf::from("mrc-converter-suite"),
        }
    }
}

impl ConverterConfig {
    /// Build the converter command for one CSV file.
    pub fn command(&self, csv_path: &Path, output_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .arg(&self.format)
            .arg("-a")
            .arg(csv_path)
            .arg("-o")
            .arg(output_path)
            .current_dir(&self.workdir);
        cmd
    }

    /// Run the converter and wait for it. A non-zero exit is an error.
    pub fn run(&self, csv_path: &Path, output_path: &Path) -> anyhow::Result<()> {
        // The converter runs in its own directory, so hand it absolute paths
        let csv_path = absolute(csv_path)?;
        let output_path = absolute(output_path)?;

        let mut cmd = self.command(&csv_path, &output_path);
        debug!("Running {:?}", cmd);
        info!("Calling converter {} {}", self.program, self.script);

        let status = cmd.status().with_context(|| {
            format!(
                "failed to start converter '{}' in {}",
                self.program,
                self.workdir.display()
            )
        })?;

        if !status.success() {
            anyhow::bail!("converter failed ({}) for {}", status, csv_path.display());
        }

        info!("Converter complete: {}", output_path.display());
        Ok(())
    }
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Put quotes back in place of placeholders in `path`, rewriting it.
pub fn restore_file(path: &Path, placeholders: &Placeholders) -> anyhow::Result<()> {
    info!("Fixing up escape backslashes, single and double quotes in {}", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let restored = placeholders.restore(&content);
    fs::write(path, restored).with_context(|| format!("failed to write {}", path.display()))?;

    info!("Fix up complete: {}", path.display());
    Ok(())
}
