use std::fmt::Write;

use crate::classify;
use crate::config::Thresholds;
use crate::models::{
    AppAccessProfile, DeviceVitals, EmailRecord, FlaggedEmail, FlaggedMessage, HealthReport,
    MessageRecord, OverallStatus, Permission, RiskTag, ScanRecord, NOT_AVAILABLE,
};

pub fn flag_messages(messages: &[MessageRecord], threshold: u8) -> Vec<FlaggedMessage> {
    messages
        .iter()
        .filter_map(|message| {
            let verdict = classify::classify_message(&message.sender, &message.body);
            (verdict.score > threshold).then(|| FlaggedMessage {
                message: message.clone(),
                verdict,
            })
        })
        .collect()
}

pub fn flag_emails(emails: &[EmailRecord], threshold: u8) -> Vec<FlaggedEmail> {
    emails
        .iter()
        .filter_map(|email| {
            let verdict = classify::classify_email(&email.sender, &email.subject, &email.preview);
            (verdict.score > threshold).then(|| FlaggedEmail {
                email: email.clone(),
                verdict,
            })
        })
        .collect()
}

fn high_risk_count(apps: &[AppAccessProfile]) -> usize {
    apps.iter()
        .filter(|app| app.risk_tag == RiskTag::High)
        .count()
}

pub fn generate_warnings(
    flagged_messages: usize,
    flagged_emails: usize,
    apps: &[AppAccessProfile],
    connection_sample: u32,
    vitals: &DeviceVitals,
    thresholds: &Thresholds,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if flagged_messages > 0 {
        warnings.push(format!("{flagged_messages} spam message(s) detected"));
    }

    if flagged_emails > 0 {
        warnings.push(format!("{flagged_emails} spam email(s) detected"));
    }

    let high_risk = high_risk_count(apps);
    if high_risk > 0 {
        warnings.push(format!("{high_risk} high-risk app(s) with data access"));
    }

    if connection_sample > thresholds.suspicious_connections {
        warnings.push("High number of suspicious network connections detected".to_string());
    }

    if !vitals.is_connected {
        warnings.push("Device is offline - cannot verify network security".to_string());
    }

    warnings
}

pub fn count_issues(report: &HealthReport, vitals: &DeviceVitals, thresholds: &Thresholds) -> usize {
    [
        vitals
            .battery_percent
            .is_some_and(|level| level < thresholds.low_battery_percent),
        vitals
            .free_storage_bytes
            .is_some_and(|free| free < thresholds.low_storage_bytes),
        !vitals.is_connected,
        !report.flagged_messages.is_empty(),
        !report.flagged_emails.is_empty(),
        high_risk_count(&report.app_profiles) > 0,
        report.suspicious_connection_count > thresholds.suspicious_connections,
    ]
    .into_iter()
    .filter(|issue| *issue)
    .count()
}

pub fn overall_status(issues: usize) -> OverallStatus {
    match issues {
        0 => OverallStatus::Healthy,
        1 => OverallStatus::Good,
        2 => OverallStatus::Fair,
        _ => OverallStatus::AttentionNeeded,
    }
}

pub fn build_report(
    messages: &[MessageRecord],
    emails: &[EmailRecord],
    apps: &[(String, RiskTag)],
    connection_sample: u32,
    vitals: DeviceVitals,
    thresholds: &Thresholds,
) -> HealthReport {
    let flagged_messages = flag_messages(messages, thresholds.message_score);
    let flagged_emails = flag_emails(emails, thresholds.email_score);
    let app_profiles: Vec<AppAccessProfile> = apps
        .iter()
        .map(|(label, risk_tag)| classify::classify_app_risk(label, *risk_tag))
        .collect();

    let warnings = generate_warnings(
        flagged_messages.len(),
        flagged_emails.len(),
        &app_profiles,
        connection_sample,
        &vitals,
        thresholds,
    );

    let mut report = HealthReport {
        flagged_messages,
        flagged_emails,
        app_profiles,
        suspicious_connection_count: connection_sample,
        warnings,
        overall_status: OverallStatus::Healthy,
    };
    report.overall_status = overall_status(count_issues(&report, &vitals, thresholds));

    tracing::debug!(
        messages = report.flagged_messages.len(),
        emails = report.flagged_emails.len(),
        apps = report.app_profiles.len(),
        status = %report.overall_status,
        "built health report"
    );
    report
}

/// Human-readable size with at most two decimals, capped at GB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn render_markdown(scan: &ScanRecord) -> String {
    let mut output = String::new();
    let device = &scan.device;
    let report = &scan.report;

    let _ = writeln!(output, "# Device Health Report");
    let _ = writeln!(
        output,
        "Scan {} completed {}",
        scan.scan_id,
        scan.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "**Overall status:** {}", report.overall_status);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Device");
    let _ = writeln!(output, "- Name: {}", device.info.device_name);
    let _ = writeln!(output, "- Brand / model: {} {}", device.info.brand, device.info.model);
    let _ = writeln!(
        output,
        "- OS: {} {}",
        device.info.system_name, device.info.system_version
    );
    let _ = writeln!(output, "- Device ID: {}", device.info.device_id);
    let _ = writeln!(
        output,
        "- App version: {} ({})",
        device.info.app_version, device.info.build_number
    );

    match device.battery {
        Some(battery) => {
            let _ = writeln!(
                output,
                "- Battery: {}% ({})",
                battery.level_percent,
                if battery.is_charging { "charging" } else { "not charging" }
            );
        }
        None => {
            let _ = writeln!(output, "- Battery: {NOT_AVAILABLE}");
        }
    }

    match device.memory {
        Some(memory) => {
            let used = memory
                .used_bytes
                .map_or_else(|| NOT_AVAILABLE.to_string(), format_bytes);
            let free = memory
                .free_bytes()
                .map_or_else(|| NOT_AVAILABLE.to_string(), format_bytes);
            let _ = writeln!(
                output,
                "- Memory: {} total, {} used, {} free",
                format_bytes(memory.total_bytes),
                used,
                free
            );
        }
        None => {
            let _ = writeln!(output, "- Memory: {NOT_AVAILABLE}");
        }
    }

    match device.storage {
        Some(storage) => {
            let _ = writeln!(
                output,
                "- Storage: {} free of {}",
                format_bytes(storage.free_bytes),
                format_bytes(storage.total_bytes)
            );
        }
        None => {
            let _ = writeln!(output, "- Storage: {NOT_AVAILABLE}");
        }
    }

    let _ = writeln!(
        output,
        "- Network: {} ({})",
        if device.network.is_connected { "connected" } else { "offline" },
        device.network.connection_type
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Security Warnings");
    if report.warnings.is_empty() {
        let _ = writeln!(output, "No security warnings.");
    } else {
        for warning in &report.warnings {
            let _ = writeln!(output, "- {warning}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Spam Messages");
    if report.flagged_messages.is_empty() {
        let _ = writeln!(output, "No spam messages detected.");
    } else {
        for flagged in &report.flagged_messages {
            let reasons: Vec<&str> = flagged.verdict.reasons.iter().map(|r| r.as_str()).collect();
            let _ = writeln!(
                output,
                "- {} (score {}): {} [{}]",
                flagged.message.sender,
                flagged.verdict.score,
                flagged.message.body,
                reasons.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Spam Emails");
    if report.flagged_emails.is_empty() {
        let _ = writeln!(output, "No spam emails detected.");
    } else {
        for flagged in &report.flagged_emails {
            let reasons: Vec<&str> = flagged.verdict.reasons.iter().map(|r| r.as_str()).collect();
            let _ = writeln!(
                output,
                "- {} (score {}): {} [{}]",
                flagged.email.sender,
                flagged.verdict.score,
                flagged.email.subject,
                reasons.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## App Data Access");
    if report.app_profiles.is_empty() {
        let _ = writeln!(output, "No apps inspected.");
    } else {
        let _ = writeln!(output, "| App | Risk | Network | SMS | Location | Camera |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for app in &report.app_profiles {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                app.app_label,
                app.risk_tag,
                yes_no(app.has(Permission::Network)),
                yes_no(app.has(Permission::Sms)),
                yes_no(app.has(Permission::Location)),
                yes_no(app.has(Permission::Camera))
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Suspicious network connections: {}",
        report.suspicious_connection_count
    );

    output
}
