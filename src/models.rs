use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub sender: String,
    pub body: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub sender: String,
    pub subject: String,
    pub preview: String,
    pub timestamp: String,
}

/// A triggered heuristic. Variants are declared in evaluation order so that
/// a `BTreeSet<Reason>` iterates in the order rules fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "Contains spam keywords")]
    SpamKeywords,
    #[serde(rename = "Suspicious content")]
    SuspiciousContent,
    #[serde(rename = "Suspicious sender number")]
    SuspiciousSenderNumber,
    #[serde(rename = "Suspicious sender domain")]
    SuspiciousSenderDomain,
    #[serde(rename = "Contains links")]
    Links,
    #[serde(rename = "Contains suspicious links")]
    SuspiciousLinks,
    #[serde(rename = "Urgency language detected")]
    Urgency,
    #[serde(rename = "Suspiciously short message")]
    ShortMessage,
    #[serde(rename = "Subject in all caps")]
    AllCapsSubject,
    #[serde(rename = "Excessive punctuation")]
    ExcessivePunctuation,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::SpamKeywords => "Contains spam keywords",
            Reason::SuspiciousContent => "Suspicious content",
            Reason::SuspiciousSenderNumber => "Suspicious sender number",
            Reason::SuspiciousSenderDomain => "Suspicious sender domain",
            Reason::Links => "Contains links",
            Reason::SuspiciousLinks => "Contains suspicious links",
            Reason::Urgency => "Urgency language detected",
            Reason::ShortMessage => "Suspiciously short message",
            Reason::AllCapsSubject => "Subject in all caps",
            Reason::ExcessivePunctuation => "Excessive punctuation",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of a classifier: a score in `0..=100` and the distinct reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub score: u8,
    pub reasons: Vec<Reason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTag {
    Low,
    Medium,
    High,
}

impl RiskTag {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTag::Low => "low",
            RiskTag::Medium => "medium",
            RiskTag::High => "high",
        }
    }
}

impl fmt::Display for RiskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskTag::Low),
            "medium" => Ok(RiskTag::Medium),
            "high" => Ok(RiskTag::High),
            other => Err(format!("unknown risk tag '{other}' (expected low, medium or high)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Network,
    Sms,
    Location,
    Camera,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAccessProfile {
    pub app_label: String,
    pub risk_tag: RiskTag,
    pub permissions: BTreeSet<Permission>,
}

impl AppAccessProfile {
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedMessage {
    pub message: MessageRecord,
    pub verdict: ScoredRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedEmail {
    pub email: EmailRecord,
    pub verdict: ScoredRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Healthy,
    Good,
    Fair,
    AttentionNeeded,
}

impl OverallStatus {
    pub fn label(self) -> &'static str {
        match self {
            OverallStatus::Healthy => "Healthy",
            OverallStatus::Good => "Good",
            OverallStatus::Fair => "Fair",
            OverallStatus::AttentionNeeded => "Attention Needed",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Device facts the overall status depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceVitals {
    pub battery_percent: Option<u8>,
    pub free_storage_bytes: Option<u64>,
    pub is_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub flagged_messages: Vec<FlaggedMessage>,
    pub flagged_emails: Vec<FlaggedEmail>,
    pub app_profiles: Vec<AppAccessProfile>,
    pub suspicious_connection_count: u32,
    pub warnings: Vec<String>,
    pub overall_status: OverallStatus,
}

pub const NOT_AVAILABLE: &str = "not available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_name: String,
    pub device_id: String,
    pub system_name: String,
    pub system_version: String,
    pub brand: String,
    pub model: String,
    pub app_version: String,
    pub build_number: String,
}

impl DeviceInfo {
    pub fn unavailable() -> Self {
        Self {
            device_name: NOT_AVAILABLE.to_string(),
            device_id: NOT_AVAILABLE.to_string(),
            system_name: NOT_AVAILABLE.to_string(),
            system_version: NOT_AVAILABLE.to_string(),
            brand: NOT_AVAILABLE.to_string(),
            model: NOT_AVAILABLE.to_string(),
            app_version: NOT_AVAILABLE.to_string(),
            build_number: NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    /// Charge level in `0..=100`.
    pub level_percent: u8,
    pub is_charging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStatus {
    pub total_bytes: u64,
    pub used_bytes: Option<u64>,
}

impl MemoryStatus {
    pub fn free_bytes(&self) -> Option<u64> {
        self.used_bytes
            .map(|used| self.total_bytes.saturating_sub(used))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub is_connected: bool,
    pub connection_type: String,
}

/// Everything the probe reported about the device, with `None` standing in
/// for readings that were unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub info: DeviceInfo,
    pub battery: Option<BatteryStatus>,
    pub memory: Option<MemoryStatus>,
    pub storage: Option<StorageStatus>,
    pub network: NetworkStatus,
}

impl DeviceSnapshot {
    pub fn vitals(&self) -> DeviceVitals {
        DeviceVitals {
            battery_percent: self.battery.map(|battery| battery.level_percent),
            free_storage_bytes: self.storage.map(|storage| storage.free_bytes),
            is_connected: self.network.is_connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub scan_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub device: DeviceSnapshot,
    pub report: HealthReport,
}
