use crate::assemble::FieldSet;
use crate::config::ExportConfig;
use crate::convert::restore_file;
use crate::dump::SortedIndex;
use crate::pipeline;
use crate::writer::{write_csv, write_json};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub struct ExportArgs {
    pub passphrase_file: PathBuf,
    pub user_file: PathBuf,
    pub output: Option<PathBuf>,
    pub save_intermediate: bool,
    pub config: Option<PathBuf>,
    pub no_convert: bool,
    pub progress: bool,
}

/// `output_<YYYYmmdd-HHMM>` in local time
fn default_output_base() -> PathBuf {
    PathBuf::from(chrono::Local::now().format("output_%Y%m%d-%H%M").to_string())
}

/// Append an extension without replacing one already in the base name.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    for file in [&args.passphrase_file, &args.user_file] {
        if !file.exists() {
            anyhow::bail!("input file does not exist: {}", file.display());
        }
    }

    let config = ExportConfig::load_or_default(args.config.as_deref())?;

    let base = args.output.unwrap_or_else(default_output_base);
    let csv_path = with_suffix(&base, ".csv");
    let bundle_path = with_suffix(&base, ".1pif");
    let snapshot_dir = base
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let start_time = Instant::now();

    let extracted = pipeline::extract(
        &args.passphrase_file,
        &args.user_file,
        &config,
        args.progress,
    )?;

    if args.save_intermediate {
        info!("Saving intermediate files.");
        write_json(
            &snapshot_dir.join("user_data.json"),
            &SortedIndex(&extracted.users),
        )?;
        write_json(
            &snapshot_dir.join("passphrase_data.json"),
            &extracted.credentials,
        )?;
        write_json(
            &snapshot_dir.join("secret_data.json"),
            &SortedIndex(&extracted.secrets),
        )?;
        write_json(
            &snapshot_dir.join("assembled_dict.json"),
            &extracted.records,
        )?;
    }

    info!("Writing to {}.", csv_path.display());
    write_csv(&csv_path, &FieldSet::default(), &extracted.records)?;

    if args.no_convert || !config.converter.enabled {
        info!("Skipping converter; output file: {}", csv_path.display());
    } else {
        config.converter.run(&csv_path, &bundle_path)?;
        restore_file(&bundle_path, &config.placeholders)?;
    }

    info!(
        "Exported {} credentials in {:.3?}",
        extracted.records.len(),
        start_time.elapsed()
    );

    Ok(())
}
