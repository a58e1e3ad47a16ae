use clap::{Parser, Subcommand};
use sqlspell::lens::utils::OutputFormat;
use sqlspell::SpellConfig;
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::grade::GradeArgs;
use commands::import::ImportArgs;
use commands::level::LevelArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.sqlspell/sqlspell.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server for the game frontend
    Serve(ServeArgs),

    /// Show a stored level
    Level(LevelArgs),

    /// Grade a query against a level
    Grade(GradeArgs),

    /// Load level records from a JSON file into the level store
    Import(ImportArgs),

    /// Show configuration and level store status
    Config(ConfigArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match SpellConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if cli.debug || matches!(cli.command, Commands::Serve(_)) {
        tracing_subscriber::fmt()
            // filter spans/events with level TRACE or higher.
            .with_max_level(Level::INFO)
            .init();
    }

    let output_format = cli.format;

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(&config, args),
        Commands::Level(args) => commands::level::run(&config, args, output_format),
        Commands::Grade(args) => commands::grade::run(&config, args, output_format),
        Commands::Import(args) => commands::import::run(&config, args, output_format),
        Commands::Config(args) => commands::config::run(&config, args, output_format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
