use crate::errors::StoreError;
use crate::projector::{Projection, ProjectionConfig, project};
use crate::storage::DataStore;
use std::sync::Arc;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub projection: Arc<ProjectionConfig>,
    pub default_user: Arc<str>,
}

// Derived Clone would demand `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            projection: Arc::clone(&self.projection),
            default_user: Arc::clone(&self.default_user),
        }
    }
}

impl<S: DataStore> AppState<S> {
    pub fn new(store: S, projection: ProjectionConfig, default_user: impl Into<String>) -> Self {
        let default_user: String = default_user.into();
        Self {
            store: Arc::new(store),
            projection: Arc::new(projection),
            default_user: Arc::from(default_user),
        }
    }

    pub fn user_or_default(&self, user_id: Option<&str>) -> String {
        user_id
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .unwrap_or(&*self.default_user)
            .to_string()
    }

    /// Fetches all three collections and projects them from scratch.
    pub async fn refresh(&self, user_id: &str) -> Result<Projection, StoreError> {
        let courses = self.store.fetch_courses().await?;
        let timetable = self.store.fetch_timetable().await?;
        let attendance = self.store.fetch_attendance(user_id).await?;
        Ok(project(&courses, &timetable, &attendance, &self.projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, Course, NewAttendance, TimetableEntry, Weekday};

    struct EmptyStore;

    impl DataStore for EmptyStore {
        async fn fetch_courses(&self) -> Result<Vec<Course>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_timetable(&self) -> Result<Vec<TimetableEntry>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_attendance(
            &self,
            _user_id: &str,
        ) -> Result<Vec<AttendanceRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert_attendance(
            &self,
            _new: NewAttendance,
        ) -> Result<AttendanceRecord, StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn blank_user_falls_back_to_default() {
        let state = AppState::new(EmptyStore, ProjectionConfig::default(), "local");
        assert_eq!(state.user_or_default(None), "local");
        assert_eq!(state.user_or_default(Some("  ")), "local");
        assert_eq!(state.user_or_default(Some(" ana ")), "ana");
    }

    #[tokio::test]
    async fn refresh_on_empty_store_gives_blank_grid() {
        let config = ProjectionConfig {
            days: vec![Weekday::Monday, Weekday::Tuesday],
            ..ProjectionConfig::default()
        };
        let state = AppState::new(EmptyStore, config, "local");
        let projection = state.refresh("local").await.unwrap();
        assert_eq!(projection.grid.len(), 20);
        assert!(projection.stats.is_empty());
    }
}
