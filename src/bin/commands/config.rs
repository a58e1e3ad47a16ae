use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlspell::database::{LevelSummary, SqliteLevelStore};
use sqlspell::lens::utils::OutputFormat;
use sqlspell::SpellConfig;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// List every stored level
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    scratch_dir: String,
    statement_timeout_ms: u64,
    listen: String,
    store: StoreInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    levels: Option<Vec<LevelSummary>>,
}

#[derive(Debug, Serialize)]
struct StoreInfo {
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level_count: Option<u64>,
}

pub fn run(config: &SpellConfig, args: ConfigArgs, output_format: OutputFormat) -> Result<()> {
    let ConfigArgs { verbose } = args;

    let store_path = config.levels_path();
    let exists = Path::new(&store_path).exists();
    let size_bytes = if exists {
        std::fs::metadata(&store_path).ok().map(|m| m.len())
    } else {
        None
    };

    // only open an existing store, so `config` never creates one
    let store = if exists {
        SqliteLevelStore::open(&store_path).ok()
    } else {
        None
    };
    let level_count = store.as_ref().and_then(|s| s.count().ok());
    let levels = match (&store, verbose) {
        (Some(s), true) => Some(s.list()?),
        _ => None,
    };

    let info = ConfigInfo {
        config_file: SpellConfig::config_file_path(),
        data_dir: config.data_dir.clone(),
        scratch_dir: config.scratch_dir.clone(),
        statement_timeout_ms: config.statement_timeout_ms,
        listen: format!("{}:{}", config.address, config.port),
        store: StoreInfo {
            path: store_path,
            exists,
            size_bytes,
            level_count,
        },
        levels,
    };

    if output_format.is_json() {
        println!("{}", output_format.to_json(&info)?);
        return Ok(());
    }

    print_config_table(config, &info);
    Ok(())
}

fn print_config_table(config: &SpellConfig, info: &ConfigInfo) {
    println!("sqlspell Configuration");
    println!("======================\n");
    println!("{}", config.summary());
    println!();

    println!("Level Store:");
    println!(
        "  Status:         {}",
        if info.store.exists {
            "exists"
        } else {
            "not created"
        }
    );
    if let Some(size) = info.store.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    if let Some(count) = info.store.level_count {
        println!("  Levels:         {}", count);
    }

    if let Some(ref levels) = info.levels {
        println!();
        println!("  {:<20} {}", "Level", "Updated");
        println!("  {}", "-".repeat(50));
        for level in levels {
            println!(
                "  {:<20} {}",
                level.module_level_id,
                level.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    eprintln!();
    eprintln!("Tips:");
    eprintln!("  Use --verbose (-v) to list every stored level");
    eprintln!("  Use --format json for machine-readable output");
    eprintln!("  Edit {} to customize settings", SpellConfig::config_file_path());
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
