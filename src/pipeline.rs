//! Load the three tables and assemble them, as one step.

use crate::assemble::{AssembledRecord, Assembler, FieldSet};
use crate::config::ExportConfig;
use crate::dump::{TableIndex, TableLoader, TableRow};
use crate::progress;
use indicatif::ProgressBar;
use std::path::Path;

/// Everything read from the dumps, plus the assembled output.
#[derive(Debug)]
pub struct Extracted {
    pub users: TableIndex,
    pub credentials: Vec<TableRow>,
    pub secrets: TableIndex,
    pub records: Vec<AssembledRecord>,
}

fn loader<'a>(
    path: &Path,
    config: &'a ExportConfig,
    spinner: Option<&ProgressBar>,
    table: &str,
) -> TableLoader<'a> {
    let loader = TableLoader::new(path, &config.placeholders);
    match spinner {
        Some(pb) => loader.with_progress(progress::spinner_callback(pb, table)),
        None => loader,
    }
}

/// Users come from `user_dump`; credentials and secrets from
/// `passphrase_dump`. The two may be the same file.
pub fn extract(
    passphrase_dump: &Path,
    user_dump: &Path,
    config: &ExportConfig,
    show_progress: bool,
) -> anyhow::Result<Extracted> {
    let tables = &config.tables;

    let load_spinner = |table: &str| show_progress.then(|| progress::table_spinner(table));

    let pb = load_spinner(&tables.user.name);
    let users = loader(user_dump, config, pb.as_ref(), &tables.user.name)
        .load_index(&tables.user.name, &tables.user.index)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let pb = load_spinner(&tables.credential);
    let credentials = loader(passphrase_dump, config, pb.as_ref(), &tables.credential)
        .load_rows(&tables.credential)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let pb = load_spinner(&tables.secret.name);
    let secrets = loader(passphrase_dump, config, pb.as_ref(), &tables.secret.name)
        .load_index(&tables.secret.name, &tables.secret.index)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let records = Assembler::new(&users, &secrets, FieldSet::default())?.assemble(&credentials)?;

    Ok(Extracted {
        users,
        credentials,
        secrets,
        records,
    })
}
