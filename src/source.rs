//! Boundary between external record payloads and the classifier's records.
//!
//! Collaborators hand over records with loosely named fields (`message` or
//! `body`, `riskLevel` or `risk_tag`, ...). Everything is normalized here so
//! the classifiers only ever see [`MessageRecord`], [`EmailRecord`] and
//! `(label, RiskTag)` pairs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::SourceError;
use crate::models::{
    BatteryStatus, DeviceInfo, EmailRecord, MemoryStatus, MessageRecord, NetworkStatus, RiskTag,
    StorageStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(alias = "from", alias = "address")]
    pub sender: String,
    #[serde(alias = "message", alias = "text")]
    pub body: String,
    #[serde(default, alias = "date")]
    pub timestamp: String,
}

impl From<RawMessage> for MessageRecord {
    fn from(raw: RawMessage) -> Self {
        MessageRecord {
            sender: raw.sender,
            body: raw.body,
            timestamp: raw.timestamp,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmail {
    #[serde(alias = "from")]
    pub sender: String,
    pub subject: String,
    #[serde(default, alias = "snippet", alias = "body")]
    pub preview: String,
    #[serde(default, alias = "date")]
    pub timestamp: String,
}

impl From<RawEmail> for EmailRecord {
    fn from(raw: RawEmail) -> Self {
        EmailRecord {
            sender: raw.sender,
            subject: raw.subject,
            preview: raw.preview,
            timestamp: raw.timestamp,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawApp {
    #[serde(alias = "appLabel", alias = "appName", alias = "app_name", alias = "name")]
    pub app_label: String,
    #[serde(alias = "riskTag", alias = "riskLevel", alias = "risk_level", alias = "risk")]
    pub risk_tag: String,
}

impl TryFrom<RawApp> for (String, RiskTag) {
    type Error = SourceError;

    fn try_from(raw: RawApp) -> Result<Self, Self::Error> {
        let risk_tag = raw
            .risk_tag
            .parse::<RiskTag>()
            .map_err(|err| SourceError::InvalidRecord(format!("{}: {err}", raw.app_label)))?;
        Ok((raw.app_label, risk_tag))
    }
}

pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let records = match extension.as_deref() {
        Some("csv") => {
            let mut reader = csv::Reader::from_path(path)?;
            reader
                .deserialize::<T>()
                .collect::<Result<Vec<T>, csv::Error>>()?
        }
        Some("json") => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::debug!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

pub fn load_messages(path: &Path) -> Result<Vec<MessageRecord>, SourceError> {
    Ok(load_records::<RawMessage>(path)?
        .into_iter()
        .map(MessageRecord::from)
        .collect())
}

pub fn load_emails(path: &Path) -> Result<Vec<EmailRecord>, SourceError> {
    Ok(load_records::<RawEmail>(path)?
        .into_iter()
        .map(EmailRecord::from)
        .collect())
}

pub fn load_apps(path: &Path) -> Result<Vec<(String, RiskTag)>, SourceError> {
    load_records::<RawApp>(path)?
        .into_iter()
        .map(<(String, RiskTag)>::try_from)
        .collect()
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn sample_messages() -> Vec<MessageRecord> {
    let date = now_stamp();
    vec![
        MessageRecord {
            sender: "UNKNOWN".to_string(),
            body: "Congratulations! You have won $1000. Click here to claim: bit.ly/fake"
                .to_string(),
            timestamp: date.clone(),
        },
        MessageRecord {
            sender: "+1234567890".to_string(),
            body: "Urgent: Your account has been suspended. Verify now!".to_string(),
            timestamp: date,
        },
    ]
}

pub fn sample_emails() -> Vec<EmailRecord> {
    let date = now_stamp();
    vec![
        EmailRecord {
            sender: "winner@lottery.com".to_string(),
            subject: "CONGRATULATIONS!!! YOU WON $1,000,000!!!".to_string(),
            preview: "Click here to claim your prize now! Limited time offer!".to_string(),
            timestamp: date.clone(),
        },
        EmailRecord {
            sender: "security@bank.com".to_string(),
            subject: "URGENT: Verify Your Account Immediately".to_string(),
            preview: "Your account has been suspended. Click this link to verify: bit.ly/fake-bank"
                .to_string(),
            timestamp: date.clone(),
        },
        EmailRecord {
            sender: "deal@shopping.ru".to_string(),
            subject: "Act Now - 90% OFF Limited Time Sale!".to_string(),
            preview: "Get amazing deals! Buy now before it expires. Click here!".to_string(),
            timestamp: date,
        },
    ]
}

pub fn sample_apps() -> Vec<(String, RiskTag)> {
    vec![
        ("Social Media Apps".to_string(), RiskTag::Medium),
        ("Shopping Apps".to_string(), RiskTag::Low),
        ("Unknown/Unverified Apps".to_string(), RiskTag::High),
    ]
}

/// A whole device described in one JSON document. Missing readings are
/// reported as unavailable when the snapshot is scanned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub device_info: Option<DeviceInfo>,
    pub battery: Option<BatteryStatus>,
    pub memory: Option<MemoryStatus>,
    pub storage: Option<StorageStatus>,
    pub network: Option<NetworkStatus>,
    pub messages: Vec<RawMessage>,
    pub emails: Vec<RawEmail>,
    pub apps: Vec<RawApp>,
    pub suspicious_connections: Option<u32>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let snapshot = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(snapshot)
    }

    /// Demo device carrying the built-in sample records.
    pub fn sample() -> Self {
        Snapshot {
            device_info: Some(DeviceInfo {
                device_name: "Demo Phone".to_string(),
                device_id: "demo-0001".to_string(),
                system_name: "Android".to_string(),
                system_version: "14".to_string(),
                brand: "Generic".to_string(),
                model: "Demo 1".to_string(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                build_number: "1".to_string(),
            }),
            battery: Some(BatteryStatus {
                level_percent: 76,
                is_charging: false,
            }),
            memory: Some(MemoryStatus {
                total_bytes: 8 * 1024 * 1024 * 1024,
                used_bytes: Some(5 * 1024 * 1024 * 1024),
            }),
            storage: Some(StorageStatus {
                total_bytes: 128 * 1024 * 1024 * 1024,
                free_bytes: 42 * 1024 * 1024 * 1024,
            }),
            network: Some(NetworkStatus {
                is_connected: true,
                connection_type: "wifi".to_string(),
            }),
            messages: sample_messages()
                .into_iter()
                .map(|message| RawMessage {
                    sender: message.sender,
                    body: message.body,
                    timestamp: message.timestamp,
                })
                .collect(),
            emails: sample_emails()
                .into_iter()
                .map(|email| RawEmail {
                    sender: email.sender,
                    subject: email.subject,
                    preview: email.preview,
                    timestamp: email.timestamp,
                })
                .collect(),
            apps: sample_apps()
                .into_iter()
                .map(|(app_label, risk_tag)| RawApp {
                    app_label,
                    risk_tag: risk_tag.to_string(),
                })
                .collect(),
            suspicious_connections: Some(1),
        }
    }
}
