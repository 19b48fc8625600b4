//! remotefs CLI: operator tooling for remote storage policies.
//!
//! Reads process configuration from the environment (REMOTEFS_MODE,
//! REMOTEFS_SITE_URL, ...) and the storage policy from a JSON file.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use remotefs_cli::{build_driver, expiry_after, init_tracing, load_policy};
use remotefs_core::{Config, Entity, SourceArgs};
use remotefs_storage::{HmacSigner, StorageDriver};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "remotefs", about = "Remote storage policy tooling")]
struct Cli {
    /// Path to the storage policy JSON file
    #[arg(long, short)]
    policy: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an arbitrary slave URL with the node secret
    Sign {
        url: String,
        /// Seconds until the signature expires; omit for no expiry
        #[arg(long)]
        expires_in: Option<u64>,
    },
    /// Print the signed thumbnail URL of a stored file
    Thumb {
        /// Path of the file on the slave
        source: String,
        /// Thumbnail extension
        #[arg(long, default_value = "jpg")]
        ext: String,
        #[arg(long)]
        expires_in: Option<u64>,
    },
    /// Print the signed content URL of a stored file
    Source {
        /// Path of the file on the slave
        source: String,
        /// File name presented to the client
        #[arg(long)]
        name: String,
        /// Serve as attachment
        #[arg(long)]
        download: bool,
        /// Speed limit in bytes per second, 0 for unlimited
        #[arg(long, default_value = "0")]
        speed: u64,
        #[arg(long)]
        expires_in: Option<u64>,
    },
    /// Print the capabilities of the policy
    Capabilities,
    /// List objects on the slave
    List {
        #[arg(default_value = "")]
        path: String,
        #[arg(long)]
        recursive: bool,
    },
    /// Delete files on the slave
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Extract media metadata of a file on the slave
    Meta {
        path: String,
        ext: String,
    },
}

#[derive(Serialize)]
struct DeleteSummary {
    failed: BTreeMap<String, String>,
    error: Option<String>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let policy = load_policy(&cli.policy)?;

    match cli.command {
        Commands::Sign { url, expires_in } => {
            let signer = HmacSigner::new(policy.node.secret.clone());
            let signed = signer.sign_uri(&url, expiry_after(Utc::now(), expires_in)?)?;
            println!("{}", signed);
        }
        Commands::Thumb {
            source,
            ext,
            expires_in,
        } => {
            let driver = build_driver(policy, &config)?;
            let entity = Entity::new(0, source, 0);
            let url = driver
                .thumb(expiry_after(Utc::now(), expires_in)?, &ext, &entity)
                .await?;
            println!("{}", url);
        }
        Commands::Source {
            source,
            name,
            download,
            speed,
            expires_in,
        } => {
            let driver = build_driver(policy, &config)?;
            let args = SourceArgs {
                expire: expiry_after(Utc::now(), expires_in)?,
                is_download: download,
                speed,
                display_name: name,
            };
            let url = driver.source(&Entity::new(0, source, 0), &args).await?;
            println!("{}", url);
        }
        Commands::Capabilities => {
            let driver = build_driver(policy, &config)?;
            print_json(&driver.capabilities())?;
        }
        Commands::List { path, recursive } => {
            let driver = build_driver(policy, &config)?;
            let objects = driver
                .list(&path, recursive, &|n| eprintln!("listed {} objects", n))
                .await?;
            print_json(&objects)?;
        }
        Commands::Delete { paths } => {
            let driver = build_driver(policy, &config)?;
            let outcome = driver.delete(&paths).await;
            print_json(&DeleteSummary {
                failed: outcome.failed,
                error: outcome.error.map(|e| e.to_string()),
            })?;
        }
        Commands::Meta { path, ext } => {
            let driver = build_driver(policy, &config)?;
            print_json(&driver.media_meta(&path, &ext).await?)?;
        }
    }

    Ok(())
}
