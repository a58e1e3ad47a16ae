use anyhow::{anyhow, Result};
use clap::Args;
use sqlspell::database::SqliteLevelStore;
use sqlspell::lens::grade::{GradeLens, GradeOptions, GradeResult};
use sqlspell::lens::utils::{render_table, truncate_cell, OutputFormat, DEFAULT_CELL_MAX_LEN};
use sqlspell::server::GradeResponse;
use sqlspell::SpellConfig;
use std::io::Read;
use std::path::PathBuf;

/// Arguments for the Grade command
#[derive(Args)]
pub struct GradeArgs {
    /// Module number
    pub module_id: i64,

    /// Level number within the module
    pub level_id: i64,

    /// SQL to grade; read from stdin when neither this nor --file is given
    pub sql: Option<String>,

    /// Read the SQL to grade from a file
    #[clap(long)]
    pub file: Option<PathBuf>,
}

pub fn run(config: &SpellConfig, args: GradeArgs, output_format: OutputFormat) -> Result<()> {
    let GradeArgs {
        module_id,
        level_id,
        sql,
        file,
    } = args;

    let submission = match (sql, file) {
        (Some(sql), _) => sql,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow!("Failed to read SQL from stdin: {}", e))?;
            buf
        }
    };

    std::fs::create_dir_all(&config.scratch_dir)
        .map_err(|e| anyhow!("Failed to create scratch directory {}: {}", config.scratch_dir, e))?;

    let store = SqliteLevelStore::open(&config.levels_path())?;
    let lens = GradeLens::new(GradeOptions::from(config));
    let result = lens.grade_level(&store, module_id, level_id, &submission);

    if output_format.is_json() {
        println!("{}", output_format.to_json(&GradeResponse::from(result))?);
        return Ok(());
    }

    print_result(&result, output_format);
    Ok(())
}

fn print_result(result: &GradeResult, output_format: OutputFormat) {
    let verdict = if result.passed() { "PASSED" } else { "FAILED" };
    println!("{}: {}", verdict, result.message);

    if !result.columns.is_empty() {
        let rows: Vec<Vec<String>> = result
            .output
            .iter()
            .map(|row| {
                row.cells()
                    .iter()
                    .map(|(_, value)| truncate_cell(&value.to_string(), DEFAULT_CELL_MAX_LEN))
                    .collect()
            })
            .collect();
        let header: Vec<String> = match result.output.first() {
            Some(row) => row.cells().iter().map(|(name, _)| name.clone()).collect(),
            None => result.columns.clone(),
        };
        println!("{}", render_table(&header, &rows, output_format));
    }

    if let Some(hint) = &result.hint {
        if hint != &result.message {
            eprintln!("Hint: {}", hint);
        }
    }
    if result.show_solution() {
        eprintln!("Tip: run `sqlspell level <MODULE> <LEVEL> --solution` to see the solution");
    }
}
