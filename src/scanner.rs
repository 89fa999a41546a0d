//! The scan pipeline.
//!
//! A scan walks the collaborators one step at a time: device metadata,
//! battery, memory, storage and network status, then messages, emails, the
//! app inventory and the suspicious connection sample. Device readings are
//! optional; when one fails the scan records it as unavailable and moves on.
//! A failed record feed is logged and contributes no records, so the scan
//! still completes with whatever the other collaborators supplied.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Thresholds;
use crate::error::{ProbeError, ScanError};
use crate::models::{
    BatteryStatus, DeviceInfo, DeviceSnapshot, EmailRecord, MemoryStatus, MessageRecord,
    NetworkStatus, RiskTag, ScanRecord, StorageStatus,
};
use crate::report;
use crate::source::Snapshot;

pub trait DeviceProbe {
    async fn device_info(&self) -> Result<DeviceInfo, ProbeError>;
    async fn battery(&self) -> Result<BatteryStatus, ProbeError>;
    async fn memory(&self) -> Result<MemoryStatus, ProbeError>;
    async fn storage(&self) -> Result<StorageStatus, ProbeError>;
    async fn network(&self) -> Result<NetworkStatus, ProbeError>;
}

pub trait SecurityFeed {
    async fn messages(&self) -> Result<Vec<MessageRecord>, ProbeError>;
    async fn emails(&self) -> Result<Vec<EmailRecord>, ProbeError>;
    async fn apps(&self) -> Result<Vec<(String, RiskTag)>, ProbeError>;
    async fn suspicious_connections(&self) -> Result<u32, ProbeError>;
}

fn reading<T>(result: Result<T, ProbeError>, field: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(field, error = %err, "reading not available");
            None
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct Scanner<P, F> {
    probe: P,
    feed: F,
    thresholds: Thresholds,
    in_flight: Mutex<()>,
    latest: Mutex<Option<ScanRecord>>,
}

impl<P: DeviceProbe, F: SecurityFeed> Scanner<P, F> {
    pub fn new(probe: P, feed: F, thresholds: Thresholds) -> Self {
        Self {
            probe,
            feed,
            thresholds,
            in_flight: Mutex::new(()),
            latest: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Runs one full scan. Overlapping calls are rejected with
    /// [`ScanError::AlreadyRunning`] and leave the stored report untouched.
    pub async fn scan(&self) -> Result<ScanRecord, ScanError> {
        let _running = self
            .in_flight
            .try_lock()
            .map_err(|_| ScanError::AlreadyRunning)?;

        info!("device health scan started");

        let device = self.read_device().await;

        info!("scanning messages for spam");
        let messages = reading(self.feed.messages().await, "messages").unwrap_or_default();

        info!("scanning emails for spam");
        let emails = reading(self.feed.emails().await, "emails").unwrap_or_default();

        info!("checking app data access");
        let apps = reading(self.feed.apps().await, "app inventory").unwrap_or_default();

        info!("sampling suspicious network activity");
        let connections = reading(self.feed.suspicious_connections().await, "network activity")
            .unwrap_or(0);

        let report = report::build_report(
            &messages,
            &emails,
            &apps,
            connections,
            device.vitals(),
            &self.thresholds,
        );

        let record = ScanRecord {
            scan_id: Uuid::new_v4(),
            scanned_at: Utc::now(),
            device,
            report,
        };

        *self.latest.lock().await = Some(record.clone());
        info!(
            scan_id = %record.scan_id,
            status = %record.report.overall_status,
            warnings = record.report.warnings.len(),
            "device health scan complete"
        );
        Ok(record)
    }

    async fn read_device(&self) -> DeviceSnapshot {
        let info = reading(self.probe.device_info().await, "device info")
            .unwrap_or_else(DeviceInfo::unavailable);
        let battery = reading(self.probe.battery().await, "battery");
        let memory = reading(self.probe.memory().await, "memory");
        let storage = reading(self.probe.storage().await, "storage");
        let network = reading(self.probe.network().await, "network")
            .map(|status| NetworkStatus {
                is_connected: status.is_connected,
                connection_type: capitalize(&status.connection_type),
            })
            .unwrap_or_else(|| NetworkStatus {
                is_connected: false,
                connection_type: "Unknown".to_string(),
            });

        DeviceSnapshot {
            info,
            battery,
            memory,
            storage,
            network,
        }
    }

    /// Report of the last completed scan.
    #[allow(dead_code)]
    pub async fn latest(&self) -> Option<ScanRecord> {
        self.latest.lock().await.clone()
    }
}

fn unavailable(field: &str) -> ProbeError {
    ProbeError::InputUnavailable(field.to_string())
}

impl DeviceProbe for Snapshot {
    async fn device_info(&self) -> Result<DeviceInfo, ProbeError> {
        self.device_info.clone().ok_or_else(|| unavailable("device info"))
    }

    async fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        self.battery.ok_or_else(|| unavailable("battery"))
    }

    async fn memory(&self) -> Result<MemoryStatus, ProbeError> {
        self.memory.ok_or_else(|| unavailable("memory"))
    }

    async fn storage(&self) -> Result<StorageStatus, ProbeError> {
        self.storage.ok_or_else(|| unavailable("storage"))
    }

    async fn network(&self) -> Result<NetworkStatus, ProbeError> {
        self.network.clone().ok_or_else(|| unavailable("network"))
    }
}

impl SecurityFeed for Snapshot {
    async fn messages(&self) -> Result<Vec<MessageRecord>, ProbeError> {
        Ok(self.messages.iter().cloned().map(MessageRecord::from).collect())
    }

    async fn emails(&self) -> Result<Vec<EmailRecord>, ProbeError> {
        Ok(self.emails.iter().cloned().map(EmailRecord::from).collect())
    }

    async fn apps(&self) -> Result<Vec<(String, RiskTag)>, ProbeError> {
        let apps = self
            .apps
            .iter()
            .cloned()
            .map(<(String, RiskTag)>::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(apps)
    }

    async fn suspicious_connections(&self) -> Result<u32, ProbeError> {
        self.suspicious_connections
            .ok_or_else(|| unavailable("network activity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverallStatus, NOT_AVAILABLE};
    use crate::source::{RawApp, RawMessage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    fn quiet_snapshot() -> Snapshot {
        Snapshot {
            messages: Vec::new(),
            emails: Vec::new(),
            apps: Vec::new(),
            suspicious_connections: Some(0),
            ..Snapshot::sample()
        }
    }

    #[tokio::test]
    async fn sample_scan_flags_sample_records() {
        let scanner = Scanner::new(Snapshot::sample(), Snapshot::sample(), Thresholds::default());
        let record = scanner.scan().await.unwrap();

        assert_eq!(record.report.flagged_messages.len(), 2);
        assert_eq!(record.report.flagged_emails.len(), 2);
        assert_eq!(record.report.app_profiles.len(), 3);
        assert_eq!(record.device.network.connection_type, "Wifi");
        assert_eq!(record.report.overall_status, OverallStatus::AttentionNeeded);
        assert_eq!(scanner.latest().await, Some(record));
    }

    #[tokio::test]
    async fn quiet_device_is_healthy() {
        let scanner = Scanner::new(quiet_snapshot(), quiet_snapshot(), Thresholds::default());
        let record = scanner.scan().await.unwrap();
        assert_eq!(record.report.overall_status, OverallStatus::Healthy);
        assert!(record.report.warnings.is_empty());
    }

    #[tokio::test]
    async fn missing_readings_become_unavailable() {
        let probe = Snapshot::default();
        let scanner = Scanner::new(probe, quiet_snapshot(), Thresholds::default());
        let record = scanner.scan().await.unwrap();

        assert_eq!(record.device.info.device_name, NOT_AVAILABLE);
        assert!(record.device.battery.is_none());
        assert!(record.device.storage.is_none());
        assert!(!record.device.network.is_connected);
        assert_eq!(
            record.report.warnings,
            vec!["Device is offline - cannot verify network security"]
        );
        assert_eq!(record.report.overall_status, OverallStatus::Good);
    }

    #[tokio::test]
    async fn missing_connection_sample_counts_as_zero() {
        let feed = Snapshot {
            suspicious_connections: None,
            ..quiet_snapshot()
        };
        let scanner = Scanner::new(quiet_snapshot(), feed, Thresholds::default());
        let record = scanner.scan().await.unwrap();
        assert_eq!(record.report.suspicious_connection_count, 0);
    }

    #[tokio::test]
    async fn consecutive_scans_replace_the_report() {
        let scanner = Scanner::new(quiet_snapshot(), quiet_snapshot(), Thresholds::default());
        let first = scanner.scan().await.unwrap();
        let second = scanner.scan().await.unwrap();

        assert_ne!(first.scan_id, second.scan_id);
        assert_eq!(first.report, second.report);
        assert_eq!(scanner.latest().await.map(|r| r.scan_id), Some(second.scan_id));
    }

    struct FlakyFeed {
        inner: Snapshot,
        fail_emails: AtomicBool,
    }

    impl SecurityFeed for FlakyFeed {
        async fn messages(&self) -> Result<Vec<MessageRecord>, ProbeError> {
            self.inner.messages().await
        }

        async fn emails(&self) -> Result<Vec<EmailRecord>, ProbeError> {
            if self.fail_emails.load(Ordering::SeqCst) {
                return Err(ProbeError::InputUnavailable("mailbox".to_string()));
            }
            self.inner.emails().await
        }

        async fn apps(&self) -> Result<Vec<(String, RiskTag)>, ProbeError> {
            self.inner.apps().await
        }

        async fn suspicious_connections(&self) -> Result<u32, ProbeError> {
            self.inner.suspicious_connections().await
        }
    }

    #[tokio::test]
    async fn unavailable_mailbox_still_completes_the_scan() {
        let feed = FlakyFeed {
            inner: Snapshot::sample(),
            fail_emails: AtomicBool::new(false),
        };
        let scanner = Scanner::new(Snapshot::sample(), feed, Thresholds::default());
        let first = scanner.scan().await.unwrap();
        assert_eq!(first.report.flagged_emails.len(), 2);

        scanner.feed().fail_emails.store(true, Ordering::SeqCst);
        let second = scanner.scan().await.unwrap();
        assert!(second.report.flagged_emails.is_empty());
        assert_eq!(second.report.flagged_messages.len(), 2);
        assert_eq!(second.report.app_profiles.len(), 3);
        assert!(!second
            .report
            .warnings
            .iter()
            .any(|warning| warning.contains("spam email")));
        assert_eq!(scanner.latest().await.map(|r| r.scan_id), Some(second.scan_id));
    }

    #[tokio::test]
    async fn invalid_app_record_leaves_inventory_empty() {
        let feed = Snapshot {
            apps: vec![RawApp {
                app_label: "Odd".to_string(),
                risk_tag: "extreme".to_string(),
            }],
            ..quiet_snapshot()
        };
        let scanner = Scanner::new(quiet_snapshot(), feed, Thresholds::default());
        let record = scanner.scan().await.unwrap();
        assert!(record.report.app_profiles.is_empty());
        assert_eq!(record.report.overall_status, OverallStatus::Healthy);
    }

    struct GatedFeed {
        inner: Snapshot,
        started: Notify,
        release: Notify,
    }

    impl SecurityFeed for GatedFeed {
        async fn messages(&self) -> Result<Vec<MessageRecord>, ProbeError> {
            self.started.notify_one();
            self.release.notified().await;
            self.inner.messages().await
        }

        async fn emails(&self) -> Result<Vec<EmailRecord>, ProbeError> {
            self.inner.emails().await
        }

        async fn apps(&self) -> Result<Vec<(String, RiskTag)>, ProbeError> {
            self.inner.apps().await
        }

        async fn suspicious_connections(&self) -> Result<u32, ProbeError> {
            self.inner.suspicious_connections().await
        }
    }

    #[tokio::test]
    async fn overlapping_scan_is_rejected() {
        let feed = GatedFeed {
            inner: Snapshot {
                messages: vec![RawMessage {
                    sender: "BLOCKED".to_string(),
                    body: "claim now".to_string(),
                    timestamp: String::new(),
                }],
                ..quiet_snapshot()
            },
            started: Notify::new(),
            release: Notify::new(),
        };
        let scanner = Scanner::new(quiet_snapshot(), feed, Thresholds::default());

        let second = async {
            scanner.feed().started.notified().await;
            let result = scanner.scan().await;
            scanner.feed().release.notify_one();
            result
        };
        let (first, second) = tokio::join!(scanner.scan(), second);

        assert!(matches!(second, Err(ScanError::AlreadyRunning)));
        let first = first.unwrap();
        assert_eq!(first.report.flagged_messages.len(), 1);
        assert_eq!(scanner.latest().await.map(|r| r.scan_id), Some(first.scan_id));
    }
}
