//! Configuration module
//!
//! Process-level settings for a master or slave node: operating mode, the
//! public site address used to build callback URLs, and transport timeouts.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

const DEFAULT_SITE_URL: &str = "http://localhost:5212";
const SLAVE_TIMEOUT_SECS: u64 = 60;
const RPC_SIGN_TTL_SECS: u64 = 60;
/// RPC signatures are meant to be short-lived; a day is already generous.
const MAX_RPC_SIGN_TTL_SECS: u64 = 24 * 60 * 60;

/// Operating mode of the local process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeMode {
    /// Standalone / coordinating node.
    #[default]
    Master,
    /// Serving storage on behalf of a master.
    Slave,
}

impl FromStr for NodeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "master" => Ok(NodeMode::Master),
            "slave" => Ok(NodeMode::Slave),
            _ => Err(anyhow::anyhow!("Invalid node mode: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: NodeMode,
    pub site_url: String,
    pub slave_timeout_secs: u64,
    pub rpc_sign_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: NodeMode::Master,
            site_url: DEFAULT_SITE_URL.to_string(),
            slave_timeout_secs: SLAVE_TIMEOUT_SECS,
            rpc_sign_ttl_secs: RPC_SIGN_TTL_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let mode = match env::var("REMOTEFS_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => NodeMode::Master,
        };

        let site_url =
            env::var("REMOTEFS_SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());

        let slave_timeout_secs = parse_secs(
            "REMOTEFS_SLAVE_TIMEOUT_SECS",
            env::var("REMOTEFS_SLAVE_TIMEOUT_SECS").ok().as_deref(),
            SLAVE_TIMEOUT_SECS,
        )?;

        let rpc_sign_ttl_secs = parse_secs(
            "REMOTEFS_RPC_SIGN_TTL_SECS",
            env::var("REMOTEFS_RPC_SIGN_TTL_SECS").ok().as_deref(),
            RPC_SIGN_TTL_SECS,
        )?;

        let config = Config {
            mode,
            site_url,
            slave_timeout_secs,
            rpc_sign_ttl_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let site = Url::parse(&self.site_url).map_err(|e| {
            anyhow::anyhow!("REMOTEFS_SITE_URL is not a valid URL ({}): {}", self.site_url, e)
        })?;
        if site.cannot_be_a_base() {
            return Err(anyhow::anyhow!(
                "REMOTEFS_SITE_URL must be an absolute http(s) URL: {}",
                self.site_url
            ));
        }
        if self.slave_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REMOTEFS_SLAVE_TIMEOUT_SECS must be greater than 0"));
        }
        if self.rpc_sign_ttl_secs == 0 || self.rpc_sign_ttl_secs > MAX_RPC_SIGN_TTL_SECS {
            return Err(anyhow::anyhow!(
                "REMOTEFS_RPC_SIGN_TTL_SECS must be between 1 and {}",
                MAX_RPC_SIGN_TTL_SECS
            ));
        }
        Ok(())
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn slave_timeout(&self) -> Duration {
        Duration::from_secs(self.slave_timeout_secs)
    }

    pub fn rpc_sign_ttl(&self) -> Duration {
        Duration::from_secs(self.rpc_sign_ttl_secs)
    }
}

/// Seconds from an optional raw env value, `default` when unset.
fn parse_secs(name: &str, raw: Option<&str>, default: u64) -> Result<u64, anyhow::Error> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
    }
}
