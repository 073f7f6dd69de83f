use clap::Parser;
use std::path::PathBuf;

/// Mockshape - schema-driven mock API server
#[derive(Parser, Debug, Clone)]
#[command(name = "mockshape", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "MOCKSHAPE_CONFIG", default_value = "mockshape.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "MOCKSHAPE_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "MOCKSHAPE_PORT")]
    pub port: Option<u16>,

    /// Maximum schema nesting depth during resolution
    #[arg(long, env = "MOCKSHAPE_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Resolve schemas on every request instead of caching them
    #[arg(long, env = "MOCKSHAPE_NO_CACHE")]
    pub no_cache: bool,

    /// Do not reload definitions when files change
    #[arg(long, env = "MOCKSHAPE_NO_WATCH")]
    pub no_watch: bool,
}
