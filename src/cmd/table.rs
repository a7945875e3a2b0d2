use crate::config::ExportConfig;
use crate::dump::TableLoader;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn run(
    file: PathBuf,
    table: String,
    index: Option<String>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let config = ExportConfig::load_or_default(config.as_deref())?;
    let data = TableLoader::new(&file, &config.placeholders).load(&table, index.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &data)?;
    writeln!(out)?;

    Ok(())
}
