use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SpellConfig {
    /// Path to the directory holding the level store
    pub data_dir: String,

    /// Directory where per-request scratch databases are created
    pub scratch_dir: String,

    /// Execution deadline for one grading call in milliseconds (0 disables it)
    pub statement_timeout_ms: u64,

    /// HTTP bind address
    pub address: String,

    /// HTTP port
    pub port: u16,
}

const EMPTY_CONFIG: &str = r#"### sqlspell configuration file

### directory holding the level store database
# data_dir = "~/.sqlspell"

### directory for per-request scratch databases (defaults to the OS temp dir)
# scratch_dir = "/tmp"

### execution deadline for a grading call, in milliseconds (0 disables it)
# statement_timeout_ms = 5000

### HTTP server settings
# address = "127.0.0.1"
# port = 8080
"#;

const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

fn default_data_dir() -> String {
    let home_dir = dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/.sqlspell", home_dir)
}

fn default_scratch_dir() -> String {
    std::env::temp_dir().to_string_lossy().to_string()
}

impl Default for SpellConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scratch_dir: default_scratch_dir(),
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl SpellConfig {
    /// Create and initialize a new configuration
    ///
    /// Reads the TOML file at `path` (or `$HOME/.sqlspell/sqlspell.toml`),
    /// writing a commented template when it does not exist yet, then layers
    /// `SQLSPELL_*` environment variables on top.
    pub fn new(path: &Option<String>) -> Result<SpellConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let spell_dir = default_data_dir();
                std::fs::create_dir_all(spell_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create sqlspell directory: {}", e))?;
                let p = format!("{}/sqlspell.toml", spell_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `SQLSPELL_PORT=9000 sqlspell serve` overrides the port
        builder = builder.add_source(config::Environment::with_prefix("SQLSPELL"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let values = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_values(&values)
    }

    /// Build a configuration from flat key/value settings, applying defaults
    pub fn from_values(values: &HashMap<String, String>) -> Result<SpellConfig> {
        let data_dir = match values.get("data_dir") {
            Some(p) => expand_home(p),
            None => default_data_dir(),
        };
        std::fs::create_dir_all(data_dir.as_str())
            .map_err(|e| anyhow!("Unable to create data directory '{}': {}", data_dir, e))?;

        let scratch_dir = values
            .get("scratch_dir")
            .map(|p| expand_home(p))
            .unwrap_or_else(default_scratch_dir);

        let statement_timeout_ms = match values.get("statement_timeout_ms") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid statement_timeout_ms '{}': {}", s, e))?,
            None => DEFAULT_STATEMENT_TIMEOUT_MS,
        };

        let port = match values.get("port") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid port '{}': {}", s, e))?,
            None => DEFAULT_PORT,
        };

        let address = values
            .get("address")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Ok(SpellConfig {
            data_dir,
            scratch_dir,
            statement_timeout_ms,
            address,
            port,
        })
    }

    /// Get the path to the level store SQLite file
    pub fn levels_path(&self) -> String {
        let data_dir = self.data_dir.trim_end_matches('/');
        format!("{}/sqlspell-levels.sqlite3", data_dir)
    }

    /// Get the scratch directory as a path
    pub fn scratch_path(&self) -> PathBuf {
        PathBuf::from(&self.scratch_dir)
    }

    /// Get the grading deadline, `None` when disabled
    pub fn statement_timeout(&self) -> Option<Duration> {
        match self.statement_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let timeout = match self.statement_timeout_ms {
            0 => "disabled".to_string(),
            ms => format!("{} ms", ms),
        };
        [
            format!("Config File:        {}", Self::config_file_path()),
            format!("Data Directory:     {}", self.data_dir),
            format!("Level Store:        {}", self.levels_path()),
            format!("Scratch Directory:  {}", self.scratch_dir),
            format!("Statement Timeout:  {}", timeout),
            format!("Listen Address:     {}:{}", self.address, self.port),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        format!("{}/sqlspell.toml", default_data_dir())
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut values = HashMap::new();
        values.insert(
            "data_dir".to_string(),
            dir.path().to_string_lossy().to_string(),
        );

        let config = SpellConfig::from_values(&values).unwrap();
        assert_eq!(config.statement_timeout_ms, 5000);
        assert_eq!(config.port, 8080);
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(
            config.statement_timeout(),
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_from_values_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let mut values = HashMap::new();
        values.insert("data_dir".to_string(), format!("{}/", data_dir));
        values.insert("scratch_dir".to_string(), "/var/tmp".to_string());
        values.insert("statement_timeout_ms".to_string(), "0".to_string());
        values.insert("port".to_string(), "9000".to_string());

        let config = SpellConfig::from_values(&values).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.scratch_path(), PathBuf::from("/var/tmp"));
        assert!(config.statement_timeout().is_none());
        assert_eq!(
            config.levels_path(),
            format!("{}/sqlspell-levels.sqlite3", data_dir)
        );
    }

    #[test]
    fn test_from_values_rejects_bad_port() {
        let dir = tempfile::tempdir().unwrap();
        let mut values = HashMap::new();
        values.insert(
            "data_dir".to_string(),
            dir.path().to_string_lossy().to_string(),
        );
        values.insert("port".to_string(), "eighty".to_string());

        assert!(SpellConfig::from_values(&values).is_err());
    }

    #[test]
    fn test_new_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlspell.toml");
        let path_str = path.to_string_lossy().to_string();

        // The template only holds comments, so every value falls back to defaults
        let _ = SpellConfig::new(&Some(path_str.clone()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("statement_timeout_ms"));
    }

    #[test]
    fn test_summary_mentions_store() {
        let config = SpellConfig::default();
        let summary = config.summary();
        assert!(summary.contains("sqlspell-levels.sqlite3"));
        assert!(summary.contains("5000 ms"));
    }
}
