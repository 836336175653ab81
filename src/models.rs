use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub const WORKING: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Accepts full names and three-letter abbreviations, ignoring case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_ascii_lowercase();
                lowered == name || (lowered.len() == 3 && name.starts_with(&lowered))
            })
            .ok_or_else(|| format!("unknown weekday '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Cancelled,
    Postponed,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Cancelled,
        AttendanceStatus::Postponed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Cancelled => "Cancelled",
            AttendanceStatus::Postponed => "Postponed",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown attendance status '{value}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub alias: Option<String>,
    pub teacher: String,
    pub location: String,
    pub category: String,
    pub term: String,
    pub nature: String,
    pub slot: String,
    pub credits: f64,
}

impl Course {
    /// Short label for a grid cell: the alias when set, otherwise the code.
    pub fn display_label(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.trim().is_empty() => alias,
            _ => &self.code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: String,
    pub day: Weekday,
    pub time_slot: String,
    pub course_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub course_code: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub user_id: String,
}

/// Command to log one attendance outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub course_code: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub course_code: String,
    pub date: Option<NaiveDate>,
    pub status: AttendanceStatus,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkAttendanceResponse {
    pub message: String,
    pub record: AttendanceRecord,
    pub stat: crate::stats::AttendanceStat,
}

/// One row of the flat attendance log, with the course name resolved.
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub course_code: String,
    pub course_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize)]
pub struct TimetableResponse {
    pub time_slots: Vec<String>,
    pub days: Vec<Weekday>,
    pub grid: crate::projector::TimetableGrid,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub attendance_by_course: crate::projector::AttendanceByCourse,
    pub stats: crate::stats::AttendanceStats,
}
