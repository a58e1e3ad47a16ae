use anyhow::{anyhow, Result};
use clap::Args;
use sqlspell::database::{level_key, SqliteLevelStore};
use sqlspell::lens::level::{LevelLens, LevelView};
use sqlspell::lens::utils::{render_table, truncate_cell, OutputFormat, DEFAULT_CELL_MAX_LEN};
use sqlspell::SpellConfig;

/// Arguments for the Level command
#[derive(Args)]
pub struct LevelArgs {
    /// Module number
    pub module_id: i64,

    /// Level number within the module
    pub level_id: i64,

    /// Print only the reference solution
    #[clap(short, long)]
    pub solution: bool,
}

pub fn run(config: &SpellConfig, args: LevelArgs, output_format: OutputFormat) -> Result<()> {
    let LevelArgs {
        module_id,
        level_id,
        solution,
    } = args;

    let store = SqliteLevelStore::open(&config.levels_path())?;
    let key = level_key(module_id, level_id);

    let view = LevelLens::new(&store)
        .view(&key, solution)?
        .ok_or_else(|| anyhow!("Level {} not found in {}", key, config.levels_path()))?;

    if output_format.is_json() {
        println!("{}", output_format.to_json(&view)?);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = match &view {
        LevelView::Solution { solution } => vec![vec![
            "solution".to_string(),
            solution.clone().unwrap_or_default(),
        ]],
        LevelView::Public(record) => {
            let value = serde_json::to_value(record)?;
            let mut rows = Vec::new();
            if let Some(fields) = value.as_object() {
                for (name, field) in fields {
                    let text = match field {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    rows.push(vec![name.clone(), truncate_cell(&text, DEFAULT_CELL_MAX_LEN)]);
                }
            }
            rows
        }
    };

    let header = vec!["field".to_string(), "value".to_string()];
    println!("{}", render_table(&header, &rows, output_format));
    Ok(())
}
