use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments, resolved once at
/// startup and handed to the storage client at construction.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub frontend_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP gateway for bucket uploads and signed downloads")]
pub struct Args {
    /// Host to bind to (overrides FILESHARE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket receiving uploads (overrides FILESHARE_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Storage region (overrides FILESHARE_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// S3-compatible endpoint URL, e.g. for MinIO (overrides FILESHARE_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory of prebuilt frontend assets (overrides FILESHARE_FRONTEND_DIR)
    #[arg(long)]
    pub frontend_dir: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILESHARE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 80,
            Err(err) => return Err(err).context("reading PORT"),
        };
        let env_bucket =
            env::var("FILESHARE_BUCKET").unwrap_or_else(|_| "ptolemaicfilesharing".into());
        let env_region = env::var("FILESHARE_REGION").unwrap_or_else(|_| "eu-north-1".into());
        let env_endpoint = env::var("FILESHARE_ENDPOINT").ok();
        let env_frontend =
            env::var("FILESHARE_FRONTEND_DIR").unwrap_or_else(|_| "frontend".into());

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket: args.bucket.unwrap_or(env_bucket),
            region: args.region.unwrap_or(env_region),
            endpoint: args.endpoint.or(env_endpoint),
            frontend_dir: args.frontend_dir.unwrap_or(env_frontend),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
