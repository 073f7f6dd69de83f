use config::{Config, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;
pub mod watcher;

use crate::adapters::store::Definitions;
use crate::cli::Cli;
use crate::domain::{Endpoint, ResponseWrapper, Schema, DEFAULT_PROJECT};
use crate::engine::compositor::DEFAULT_PLACEHOLDER;
use crate::engine::resolver::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITEMS};

/// Directories (relative to the config root) scanned for definition files.
pub const SCHEMAS_DIR: &str = "config/schemas";
pub const ENDPOINTS_DIR: &str = "config/endpoints";
pub const WRAPPERS_DIR: &str = "config/wrappers";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub response_wrappers: Vec<ResponseWrapper>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Knobs of the resolution/generation engine.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineSettings {
    /// Maximum number of nested schemas on one resolution path.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Maximum item count of a single array field.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// String value in a response wrapper that is replaced by the payload.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Project used when a request carries no project id.
    #[serde(default = "default_project")]
    pub default_project: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_items: default_max_items(),
            cache_enabled: default_cache_enabled(),
            placeholder: default_placeholder(),
            default_project: default_project(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_cache_enabled() -> bool {
    true
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Sustained requests per second allowed for each project.
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, then CLI/env overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let root = config_root(&cli.config);
        let mut settings = Self::load(cli.config.clone(), &root)?;
        settings.apply_cli_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let root = PathBuf::from(root);
        let config_path = root.join("mockshape");
        let settings = Self::load(config_path, &root)?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: PathBuf, root: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.load_external_definitions(root)?;
        Ok(settings)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(max_depth) = cli.max_depth {
            self.engine.max_depth = max_depth;
        }
        if cli.no_cache {
            self.engine.cache_enabled = false;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    fn load_external_definitions(&mut self, root: &Path) -> Result<(), anyhow::Error> {
        self.schemas
            .extend(load_definitions_from_dir::<Schema>(&root.join(SCHEMAS_DIR))?);
        self.endpoints
            .extend(load_definitions_from_dir::<Endpoint>(&root.join(ENDPOINTS_DIR))?);
        self.response_wrappers
            .extend(load_definitions_from_dir::<ResponseWrapper>(&root.join(WRAPPERS_DIR))?);
        Ok(())
    }

    /// Paths worth watching for live reload, relative to the config file.
    pub fn watch_paths(config_file: &Path) -> Vec<PathBuf> {
        let root = config_root(config_file);
        vec![
            config_file.to_path_buf(),
            root.join(SCHEMAS_DIR),
            root.join(ENDPOINTS_DIR),
            root.join(WRAPPERS_DIR),
        ]
    }

    /// Everything the store needs, detached from server settings.
    pub fn definitions(&self) -> Definitions {
        Definitions {
            schemas: self.schemas.clone(),
            endpoints: self.endpoints.clone(),
            response_wrappers: self.response_wrappers.clone(),
        }
    }
}

fn config_root(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Read every JSON, YAML or TOML file in `dir` as one `T`. A missing
/// directory yields nothing.
fn load_definitions_from_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, anyhow::Error> {
    let mut items = Vec::new();
    let pattern = format!("{}/*", dir.display());
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
        }
    }
    paths.sort();

    for path in paths {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !matches!(ext, "json" | "yaml" | "yml" | "toml") {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        let item: T = match ext {
            "json" => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
            "toml" => toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        };
        tracing::debug!("Loaded definition from {}", path.display());
        items.push(item);
    }
    Ok(items)
}
