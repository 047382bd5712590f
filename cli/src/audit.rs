//! JSONL audit trail.
//!
//! Every command that touches a portfolio appends one JSON object per line
//! to the audit file.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use portfolio_pulse::UserId;
use portfolio_pulse::service::{ModelComparison, RebalanceReport, ScoreReport, UploadReport};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn log_uploaded(audit: &mut AuditLog, source_file: &str, report: &UploadReport) -> Result<()> {
    audit.log(
        "uploaded",
        serde_json::json!({
            "user": report.user_id.as_str(),
            "file": source_file,
            "holdings": report.holdings.len(),
            "total_value": report.total_value,
        }),
    )
}

pub fn log_scored(audit: &mut AuditLog, user: &UserId, report: &ScoreReport) -> Result<()> {
    audit.log(
        "scored",
        serde_json::json!({
            "user": user.as_str(),
            "pulse_score": report.pulse_score,
            "grade": report.grade.symbol(),
        }),
    )
}

pub fn log_compared(audit: &mut AuditLog, user: &UserId, report: &ModelComparison) -> Result<()> {
    let tracking: serde_json::Map<String, serde_json::Value> = report
        .models
        .iter()
        .map(|m| (m.model_key.clone(), serde_json::json!(m.tracking_error)))
        .collect();
    audit.log(
        "compared",
        serde_json::json!({
            "user": user.as_str(),
            "expected_return": report.user_expected_return,
            "volatility": report.user_volatility,
            "tracking_error": tracking,
        }),
    )
}

pub fn log_rebalance(audit: &mut AuditLog, user: &UserId, report: &RebalanceReport) -> Result<()> {
    let adjustments: Vec<_> = report
        .adjustments
        .iter()
        .map(|a| {
            serde_json::json!({
                "ticker": a.ticker,
                "action": a.action.to_string(),
                "weight_diff": a.weight_diff,
                "notional_change": a.notional_change,
            })
        })
        .collect();
    audit.log(
        "rebalance_suggested",
        serde_json::json!({
            "user": user.as_str(),
            "target_model": report.target_model_key,
            "adjustments": adjustments,
        }),
    )
}
