use crate::models::{AttendanceRecord, AttendanceStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-course attendance summary. `percentage` keeps full precision; rounding
/// happens in [`format_percentage`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStat {
    pub present_count: u64,
    pub absent_count: u64,
    pub cancelled_count: u64,
    pub postponed_count: u64,
    pub percentage: f64,
}

impl Default for AttendanceStat {
    fn default() -> Self {
        Self {
            present_count: 0,
            absent_count: 0,
            cancelled_count: 0,
            postponed_count: 0,
            percentage: 100.0,
        }
    }
}

impl AttendanceStat {
    pub fn band(&self) -> Band {
        Band::from_percentage(self.percentage)
    }

    fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present_count = self.present_count.saturating_add(1),
            AttendanceStatus::Absent => self.absent_count = self.absent_count.saturating_add(1),
            AttendanceStatus::Cancelled => {
                self.cancelled_count = self.cancelled_count.saturating_add(1)
            }
            AttendanceStatus::Postponed => {
                self.postponed_count = self.postponed_count.saturating_add(1)
            }
        }
    }

    fn finish(&mut self) {
        let held = self.present_count + self.absent_count;
        self.percentage = if held == 0 {
            100.0
        } else {
            self.present_count as f64 * 100.0 / held as f64
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttendanceStats(BTreeMap<String, AttendanceStat>);

impl AttendanceStats {
    pub fn get(&self, course_code: &str) -> Option<&AttendanceStat> {
        self.0.get(course_code)
    }

    /// Courses without any records have not lost a class yet.
    pub fn get_or_default(&self, course_code: &str) -> AttendanceStat {
        self.0.get(course_code).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttendanceStat)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Critical,
    Warning,
    Healthy,
}

impl Band {
    /// Below 80 is critical, 80 through 90 inclusive is warning, above 90 is
    /// healthy.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 80.0 {
            Band::Critical
        } else if percentage <= 90.0 {
            Band::Warning
        } else {
            Band::Healthy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Critical => "critical",
            Band::Warning => "warning",
            Band::Healthy => "healthy",
        }
    }
}

pub fn compute_attendance_stats(records: &[AttendanceRecord]) -> AttendanceStats {
    let mut stats: BTreeMap<String, AttendanceStat> = BTreeMap::new();
    for record in records {
        stats
            .entry(record.course_code.clone())
            .or_default()
            .record(record.status);
    }
    for stat in stats.values_mut() {
        stat.finish();
    }
    AttendanceStats(stats)
}

pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}
