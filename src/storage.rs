use crate::errors::StoreError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, Course, NewAttendance, TimetableEntry, Weekday,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{error, info, warn};

/// Access to the three record collections. Implementations hand back
/// canonical models only; raw storage shapes never leave the store.
pub trait DataStore: Send + Sync + 'static {
    fn fetch_courses(&self) -> impl Future<Output = Result<Vec<Course>, StoreError>> + Send;

    fn fetch_timetable(
        &self,
    ) -> impl Future<Output = Result<Vec<TimetableEntry>, StoreError>> + Send;

    /// Records owned by `user_id`.
    fn fetch_attendance(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    /// Appends one record. Fails with [`StoreError::Duplicate`] when the user
    /// already has a record for that course on that date.
    fn insert_attendance(
        &self,
        new: NewAttendance,
    ) -> impl Future<Output = Result<AttendanceRecord, StoreError>> + Send;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawCourse {
    #[serde(alias = "course_code")]
    pub code: String,
    #[serde(default, alias = "full_name")]
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub teacher: String,
    #[serde(default, alias = "venue")]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub credits: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawTimetableEntry {
    #[serde(default)]
    pub id: String,
    pub day: String,
    #[serde(alias = "timeSlot")]
    pub time_slot: String,
    #[serde(alias = "courseCode", alias = "code")]
    pub course_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawAttendance {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "courseCode")]
    pub course_code: String,
    pub date: String,
    pub status: String,
    #[serde(default, alias = "userId")]
    pub user_id: String,
}

/// On-disk layout of the data file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub courses: Vec<RawCourse>,
    #[serde(default)]
    pub timetable: Vec<RawTimetableEntry>,
    #[serde(default)]
    pub attendance: Vec<RawAttendance>,
}

impl StoreData {
    pub fn courses(&self) -> Vec<Course> {
        let mut seen = HashSet::new();
        let mut courses = Vec::with_capacity(self.courses.len());
        for raw in &self.courses {
            let code = raw.code.trim();
            if code.is_empty() {
                warn!("skipping course without a code");
                continue;
            }
            if !seen.insert(code.to_string()) {
                warn!("skipping repeated course code {code}");
                continue;
            }
            let credits = if raw.credits.is_finite() && raw.credits >= 0.0 {
                raw.credits
            } else {
                warn!("course {code} has invalid credits {}, using 0", raw.credits);
                0.0
            };
            courses.push(Course {
                code: code.to_string(),
                name: raw.name.trim().to_string(),
                alias: raw
                    .alias
                    .as_deref()
                    .map(str::trim)
                    .filter(|alias| !alias.is_empty())
                    .map(str::to_string),
                teacher: raw.teacher.clone(),
                location: raw.location.clone(),
                category: raw.category.clone(),
                term: raw.term.clone(),
                nature: raw.nature.clone(),
                slot: raw.slot.clone(),
                credits,
            });
        }
        courses
    }

    pub fn timetable(&self) -> Vec<TimetableEntry> {
        self.timetable
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                let day = match raw.day.parse::<Weekday>() {
                    Ok(day) => day,
                    Err(err) => {
                        warn!("skipping timetable entry {index}: {err}");
                        return None;
                    }
                };
                Some(TimetableEntry {
                    id: fallback_id(&raw.id, index),
                    day,
                    time_slot: raw.time_slot.trim().to_string(),
                    course_code: raw.course_code.trim().to_string(),
                })
            })
            .collect()
    }

    pub fn attendance_for(&self, user_id: &str) -> Vec<AttendanceRecord> {
        self.attendance
            .iter()
            .enumerate()
            .filter(|(_, raw)| raw.user_id == user_id)
            .filter_map(|(index, raw)| {
                let date = match parse_date(&raw.date) {
                    Some(date) => date,
                    None => {
                        warn!("skipping attendance record {index}: bad date '{}'", raw.date);
                        return None;
                    }
                };
                let status = match raw.status.parse::<AttendanceStatus>() {
                    Ok(status) => status,
                    Err(err) => {
                        warn!("skipping attendance record {index}: {err}");
                        return None;
                    }
                };
                Some(AttendanceRecord {
                    id: fallback_id(&raw.id, index),
                    course_code: raw.course_code.trim().to_string(),
                    date,
                    status,
                    user_id: raw.user_id.clone(),
                })
            })
            .collect()
    }

    fn has_course(&self, code: &str) -> bool {
        self.courses.iter().any(|course| course.code.trim() == code)
    }

    fn is_marked(&self, new: &NewAttendance) -> bool {
        self.attendance.iter().any(|raw| {
            raw.user_id == new.user_id
                && raw.course_code.trim() == new.course_code
                && parse_date(&raw.date) == Some(new.date)
        })
    }

    /// One past the largest numeric id, or the lowest free id once the
    /// largest is `u64::MAX`.
    fn next_attendance_id(&self) -> u64 {
        let taken: HashSet<u64> = self
            .attendance
            .iter()
            .filter_map(|raw| raw.id.parse::<u64>().ok())
            .collect();
        match taken.iter().max() {
            None => 1,
            Some(&max) if max < u64::MAX => max + 1,
            Some(_) => (1..u64::MAX).find(|id| !taken.contains(id)).unwrap_or(0),
        }
    }
}

fn fallback_id(id: &str, index: usize) -> String {
    if id.trim().is_empty() {
        (index + 1).to_string()
    } else {
        id.to_string()
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // Timestamps like 2024-01-01T00:00:00Z still count as their calendar day.
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                StoreData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            StoreData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// Keeps the whole data file in memory and rewrites it after every insert.
pub struct JsonStore {
    data_path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonStore {
    pub fn new(data_path: PathBuf, data: StoreData) -> Self {
        Self {
            data_path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(data_path: PathBuf) -> Self {
        let data = load_data(&data_path).await;
        info!(
            courses = data.courses.len(),
            timetable = data.timetable.len(),
            attendance = data.attendance.len(),
            "loaded {}",
            data_path.display()
        );
        Self::new(data_path, data)
    }
}

impl DataStore for JsonStore {
    async fn fetch_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self.data.lock().await.courses())
    }

    async fn fetch_timetable(&self) -> Result<Vec<TimetableEntry>, StoreError> {
        Ok(self.data.lock().await.timetable())
    }

    async fn fetch_attendance(&self, user_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.data.lock().await.attendance_for(user_id))
    }

    async fn insert_attendance(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut data = self.data.lock().await;
        if !data.has_course(&new.course_code) {
            return Err(StoreError::UnknownCourse(new.course_code));
        }
        if data.is_marked(&new) {
            return Err(StoreError::Duplicate {
                course_code: new.course_code,
                date: new.date.to_string(),
            });
        }

        let record = AttendanceRecord {
            id: data.next_attendance_id().to_string(),
            course_code: new.course_code,
            date: new.date,
            status: new.status,
            user_id: new.user_id,
        };
        data.attendance.push(RawAttendance {
            id: record.id.clone(),
            course_code: record.course_code.clone(),
            date: record.date.to_string(),
            status: record.status.to_string(),
            user_id: record.user_id.clone(),
        });

        if let Err(err) = persist_data(&self.data_path, &data).await {
            data.attendance.pop();
            error!("failed to persist attendance: {err}");
            return Err(err);
        }

        info!(
            course = %record.course_code,
            date = %record.date,
            status = %record.status,
            "attendance marked"
        );
        Ok(record)
    }
}
