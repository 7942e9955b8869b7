use anyhow::{Context, Result};
use log::debug;
use serde::{self, Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub editor: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            editor: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load(config_file_path: &Path) -> Result<Config> {
        let mut config: Config = if config_file_path.exists() {
            debug!("Loading config from {:?}", config_file_path);
            let config_data = File::open(config_file_path)
                .and_then(|mut file| {
                    let mut content = String::new();
                    file.read_to_string(&mut content).map(|_| content)
                })
                .context("Error opening the configuration file")?;
            toml::from_str(&config_data).context("Invalid configuration file")?
        } else {
            Config::default()
        };

        let _ = std::env::var("FILEADMIN_API_URL").map(|val| config.api_url = val);
        let _ = std::env::var("FILEADMIN_EDITOR").map(|val| config.editor = Some(val));
        if let Ok(val) = std::env::var("FILEADMIN_TIMEOUT") {
            config.timeout_secs = Some(
                val.parse()
                    .with_context(|| format!("FILEADMIN_TIMEOUT must be a number of seconds, got {}", val))?,
            );
        }

        Ok(config)
    }

    pub fn save(&self, config_file_path: &Path) -> Result<()> {
        let mut file = File::create(config_file_path)?;
        let default_content = toml::to_string(&self)?;
        file.write_all(default_content.as_bytes())?;
        Ok(())
    }

    /// Editor command for `edit`: configured value, then `$VISUAL`, then `$EDITOR`.
    pub fn editor_command(&self) -> Option<String> {
        self.editor
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|cmd| !cmd.trim().is_empty())
    }
}
