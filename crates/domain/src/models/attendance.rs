//! Attendance log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An append-only record of a successful check-in scan.
///
/// Exactly one row is written per successful check-in transition; rejected
/// repeat scans are not logged (they surface as conflicts in the request
/// logs instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceLog {
    pub id: i64,
    pub ticket_id: i64,
    /// Staff or admin user who performed the scan.
    pub scanned_by: Uuid,
    pub scan_time: DateTime<Utc>,
    pub location: Option<String>,
    pub device_info: Option<String>,
}
