use crate::models::Weekday;
use crate::projector::{ProjectionConfig, SlotOrdering};
use std::{env, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub user_id: String,
    pub projection: ProjectionConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let user_id = env::var("APP_USER_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "local".to_string());

        let days = match env::var("TIMETABLE_DAYS") {
            Ok(value) => parse_days(&value).unwrap_or_else(|| {
                warn!("ignoring TIMETABLE_DAYS='{value}', showing the full week");
                Weekday::ALL.to_vec()
            }),
            Err(_) => Weekday::ALL.to_vec(),
        };

        let slot_ordering = match env::var("TIMETABLE_SLOTS") {
            Ok(value) => parse_slot_ordering(&value).unwrap_or_else(|| {
                warn!("ignoring empty TIMETABLE_SLOTS, using the canonical slots");
                SlotOrdering::canonical()
            }),
            Err(_) => SlotOrdering::canonical(),
        };

        Self {
            data_path: resolve_data_path(),
            port,
            user_id,
            projection: ProjectionConfig {
                slot_ordering,
                days,
            },
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

/// `weekdays`, `week`, or a comma separated list of day names.
pub fn parse_days(value: &str) -> Option<Vec<Weekday>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "weekdays" | "workweek" => return Some(Weekday::WORKING.to_vec()),
        "week" | "all" => return Some(Weekday::ALL.to_vec()),
        _ => {}
    }

    let mut days = Vec::new();
    for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let day = part.parse::<Weekday>().ok()?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    (!days.is_empty()).then_some(days)
}

/// `derived`, or a comma separated list of slot labels used as-is.
pub fn parse_slot_ordering(value: &str) -> Option<SlotOrdering> {
    if value.trim().eq_ignore_ascii_case("derived") {
        return Some(SlotOrdering::Derived);
    }

    let labels: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .collect();
    (!labels.is_empty()).then(|| SlotOrdering::fixed(labels))
}
