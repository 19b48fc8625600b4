use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage policy types
///
/// Every policy is bound to exactly one backend driver. The discriminator is
/// also embedded in upload callback URLs so the master can route the slave's
/// completion call to the right handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Local,
    Remote,
    S3,
    Oss,
    Cos,
    OneDrive,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::Local => "local",
            PolicyType::Remote => "remote",
            PolicyType::S3 => "s3",
            PolicyType::Oss => "oss",
            PolicyType::Cos => "cos",
            PolicyType::OneDrive => "onedrive",
        }
    }
}

impl FromStr for PolicyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(PolicyType::Local),
            "remote" => Ok(PolicyType::Remote),
            "s3" => Ok(PolicyType::S3),
            "oss" => Ok(PolicyType::Oss),
            "cos" => Ok(PolicyType::Cos),
            "onedrive" => Ok(PolicyType::OneDrive),
            _ => Err(anyhow::anyhow!("Invalid policy type: {}", s)),
        }
    }
}

impl Display for PolicyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
