use anyhow::{Context, Result};
use clap::Parser;
use std::env;

pub const DEFAULT_AUTH_SOURCE: &str = "login-admin";
pub const DEFAULT_USERID_ATTR: &str = "eduPersonPrincipalName";
pub const DEFAULT_METADATA_SET: &str = "saml20-sp-remote";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Auth source the fronting proxy must report.
    pub auth_source: String,
    /// Attribute whose first value is the user id.
    pub userid_attr: String,
    /// Metadata set the editor works on.
    pub metadata_set: String,
    /// Directory for the file-backed store.
    pub metadata_dir: String,
    /// When set, records are kept in SQLite instead of `metadata_dir`.
    pub database_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "SAML service provider metadata registry")]
pub struct Args {
    /// Host to bind to (overrides METAEDIT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides METAEDIT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Auth source name (overrides METAEDIT_AUTH_SOURCE)
    #[arg(long)]
    pub auth_source: Option<String>,

    /// User id attribute (overrides METAEDIT_USERID_ATTR)
    #[arg(long)]
    pub userid_attr: Option<String>,

    /// Metadata set name (overrides METAEDIT_METADATA_SET)
    #[arg(long)]
    pub metadata_set: Option<String>,

    /// Directory for metadata files (overrides METAEDIT_METADATA_DIR)
    #[arg(long)]
    pub metadata_dir: Option<String>,

    /// SQLite database URL (overrides METAEDIT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Settings the request handlers need.
#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub userid_attr: String,
    pub metadata_set: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            userid_attr: DEFAULT_USERID_ATTR.into(),
            metadata_set: DEFAULT_METADATA_SET.into(),
        }
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |key| env::var(key).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge CLI arguments over values looked up with `env`, then defaults.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_port = match env("METAEDIT_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing METAEDIT_PORT value `{}`", value))?,
            None => 3000,
        };
        let or_env = |arg: Option<String>, key: &str, default: &str| {
            arg.or_else(|| env(key)).unwrap_or_else(|| default.into())
        };

        // --- Merge ---
        Ok(Self {
            host: or_env(args.host, "METAEDIT_HOST", "0.0.0.0"),
            port: args.port.unwrap_or(env_port),
            auth_source: or_env(args.auth_source, "METAEDIT_AUTH_SOURCE", DEFAULT_AUTH_SOURCE),
            userid_attr: or_env(args.userid_attr, "METAEDIT_USERID_ATTR", DEFAULT_USERID_ATTR),
            metadata_set: or_env(
                args.metadata_set,
                "METAEDIT_METADATA_SET",
                DEFAULT_METADATA_SET,
            ),
            metadata_dir: or_env(args.metadata_dir, "METAEDIT_METADATA_DIR", "./data/metadata"),
            database_url: args
                .database_url
                .or_else(|| env("METAEDIT_DATABASE_URL"))
                .filter(|url| !url.is_empty()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            userid_attr: self.userid_attr.clone(),
            metadata_set: self.metadata_set.clone(),
        }
    }
}
