use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlspell::database::SqliteLevelStore;
use sqlspell::lens::utils::{render_table, OutputFormat};
use sqlspell::SpellConfig;
use std::path::PathBuf;

/// Arguments for the Import command
#[derive(Args)]
pub struct ImportArgs {
    /// JSON file holding an array of level records, or an object keyed by moduleLevelID
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    file: String,
    store: String,
    imported: usize,
    total: u64,
}

pub fn run(config: &SpellConfig, args: ImportArgs, output_format: OutputFormat) -> Result<()> {
    let ImportArgs { file } = args;

    let store = SqliteLevelStore::open(&config.levels_path())?;
    let imported = store.import_json_file(&file)?;

    let summary = ImportSummary {
        file: file.to_string_lossy().to_string(),
        store: config.levels_path(),
        imported,
        total: store.count()?,
    };

    if output_format.is_json() {
        println!("{}", output_format.to_json(&summary)?);
        return Ok(());
    }

    let header = vec![
        "file".to_string(),
        "imported".to_string(),
        "total".to_string(),
    ];
    let rows = vec![vec![
        summary.file,
        summary.imported.to_string(),
        summary.total.to_string(),
    ]];
    println!("{}", render_table(&header, &rows, output_format));
    Ok(())
}
