//! Attendance log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the attendance_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceLogEntity {
    pub id: i64,
    pub ticket_id: i64,
    pub scanned_by: Uuid,
    pub scan_time: DateTime<Utc>,
    pub location: Option<String>,
    pub device_info: Option<String>,
}

impl From<AttendanceLogEntity> for domain::models::AttendanceLog {
    fn from(entity: AttendanceLogEntity) -> Self {
        Self {
            id: entity.id,
            ticket_id: entity.ticket_id,
            scanned_by: entity.scanned_by,
            scan_time: entity.scan_time,
            location: entity.location,
            device_info: entity.device_info,
        }
    }
}
