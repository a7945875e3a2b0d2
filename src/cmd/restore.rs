use crate::config::ExportConfig;
use crate::convert::restore_file;
use std::path::PathBuf;

pub fn run(file: PathBuf, config: Option<PathBuf>) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let config = ExportConfig::load_or_default(config.as_deref())?;
    restore_file(&file, &config.placeholders)
}
