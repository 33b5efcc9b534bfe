use serde::{Deserialize, Serialize};

/// Symbolic schedule priority. Lower base value means scheduled sooner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric base value for the symbolic level. Total over the enum;
    /// priority aging decrements from here toward zero and resets back
    /// after a successful job creation.
    pub fn base_value(&self) -> u32 {
        match self {
            Priority::Critical => 0,
            Priority::High => 4,
            Priority::Medium => 8,
            Priority::Low => 12,
        }
    }
}

/// A parsed "lab/product" device target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub lab: String,
    pub product: String,
}

impl DeviceTarget {
    /// Parse a "lab/product" string. Entries without exactly one separator
    /// are malformed; callers skip them with a warning rather than fail.
    pub fn parse(target: &str) -> Option<Self> {
        let mut parts = target.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(lab), Some(product), None) if !lab.is_empty() && !product.is_empty() => {
                Some(Self {
                    lab: lab.to_string(),
                    product: product.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Test-type tag bits attached to a job at creation time.
pub mod test_type {
    /// Branch names could not be compared.
    pub const UNKNOWN: u32 = 1;
    /// Device and system images come from the same release version.
    pub const TOT: u32 = 1 << 1;
    /// Device and system images come from different release versions.
    pub const OTA: u32 = 1 << 2;
    /// The schedule requires a signed device build.
    pub const SIGNED: u32 = 1 << 3;
    /// The job was triggered manually rather than by the periodic cycle.
    pub const MANUAL: u32 = 1 << 4;
}

/// Extract the release version token from a manifest branch name, used to
/// decide whether a device/system image pair is top-of-tree or OTA.
///
/// Branch names look like "git_oc-mr1-release" or "git_pie-gsi"; the
/// version token is the first segment after the optional "git_" prefix.
pub fn branch_version(branch: &str) -> Option<String> {
    let trimmed = branch.strip_prefix("git_").unwrap_or(branch);
    let version = trimmed.split('-').next().unwrap_or_default();
    if version.is_empty()
        || !version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
    {
        return None;
    }
    Some(version.to_lowercase())
}
