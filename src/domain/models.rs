use crate::domain::timer::TimerState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type EntityId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub priority: Priority,
    /// Minutes.
    pub estimated_duration: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "task.title")?;
        if self.estimated_duration == 0 {
            return Err("task.estimated_duration must be > 0".to_string());
        }
        if self.completed != self.completed_at.is_some() {
            return Err("task.completed_at must be set exactly when task.completed".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub estimated_duration: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none() && self.estimated_duration.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Focus,
    Break,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Weak reference; the task may have been deleted since.
    #[serde(default)]
    pub task_id: Option<EntityId>,
    /// Planned length in seconds.
    pub duration: u32,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds counted down before the session was closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.status != SessionStatus::Completed
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(end_time) = self.end_time {
            if end_time < self.start_time {
                return Err("session.end_time must be >= session.start_time".to_string());
            }
        }
        if self.is_open() && self.end_time.is_some() {
            return Err("open session must not have an end_time".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DistractionType {
    SocialMedia,
    Email,
    Noise,
    Meeting,
    Other,
}

impl DistractionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SocialMedia => "social_media",
            Self::Email => "email",
            Self::Noise => "noise",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "social_media" | "social" => Some(Self::SocialMedia),
            "email" => Some(Self::Email),
            "noise" => Some(Self::Noise),
            "meeting" => Some(Self::Meeting),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Distraction {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub distraction_type: DistractionType,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalysis {
    pub focus_quality: String,
    pub task_strategy: String,
    pub distraction_impact: String,
    pub time_optimization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub summary: String,
    pub achievements: Vec<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
    /// 0..=100
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_analysis: Option<String>,
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub notifications: bool,
    pub sound_enabled: bool,
    pub theme: Theme,
    pub ai_suggestions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            sound_enabled: true,
            theme: Theme::Light,
            ai_suggestions: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub notifications: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub ai_suggestions: Option<bool>,
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(value) = patch.notifications {
            self.notifications = value;
        }
        if let Some(value) = patch.sound_enabled {
            self.sound_enabled = value;
        }
        if let Some(value) = patch.theme {
            self.theme = value;
        }
        if let Some(value) = patch.ai_suggestions {
            self.ai_suggestions = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkHours {
    pub start: String,
    pub end: String,
}

impl WorkHours {
    pub fn validate(&self) -> Result<(), String> {
        validate_hhmm(&self.start, "user.work_hours.start")?;
        validate_hhmm(&self.end, "user.work_hours.end")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub work_hours: WorkHours,
    /// Minutes.
    pub break_duration: u32,
    /// Minutes.
    pub focus_session_duration: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            work_hours: WorkHours {
                start: "09:00".to_string(),
                end: "17:00".to_string(),
            },
            break_duration: 15,
            focus_session_duration: 25,
        }
    }
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), String> {
        self.work_hours.validate()?;
        if self.break_duration == 0 {
            return Err("user.break_duration must be > 0".to_string());
        }
        if self.focus_session_duration == 0 {
            return Err("user.focus_session_duration must be > 0".to_string());
        }
        Ok(())
    }

    pub fn default_minutes(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_session_duration,
            SessionType::Break => self.break_duration,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub work_hours_start: Option<String>,
    pub work_hours_end: Option<String>,
    pub break_duration: Option<u32>,
    pub focus_session_duration: Option<u32>,
}

impl UserProfile {
    pub fn merged(&self, patch: &UserPatch) -> UserProfile {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(start) = &patch.work_hours_start {
            next.work_hours.start = start.trim().to_string();
        }
        if let Some(end) = &patch.work_hours_end {
            next.work_hours.end = end.trim().to_string();
        }
        if let Some(minutes) = patch.break_duration {
            next.break_duration = minutes;
        }
        if let Some(minutes) = patch.focus_session_duration {
            next.focus_session_duration = minutes;
        }
        next
    }
}

/// Everything written to local storage, as one JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub user: UserProfile,
    pub tasks: Vec<Task>,
    pub sessions: Vec<Session>,
    pub distractions: Vec<Distraction>,
    pub settings: Settings,
    pub daily_summary: Option<DailySummary>,
    pub timer: TimerState,
}

impl Snapshot {
    /// The single open (active or paused) session, if any.
    pub fn current_session(&self) -> Option<&Session> {
        self.sessions.iter().rev().find(|session| session.is_open())
    }

    pub fn task(&self, id: EntityId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn max_id(&self) -> EntityId {
        let tasks = self.tasks.iter().map(|task| task.id);
        let sessions = self.sessions.iter().map(|session| session.id);
        let distractions = self.distractions.iter().map(|distraction| distraction.id);
        tasks.chain(sessions).chain(distractions).max().unwrap_or(0)
    }

    /// Checks a snapshot coming from outside the reducer, such as an imported backup.
    pub fn validate(&self) -> Result<(), String> {
        self.user.validate()?;
        let mut task_ids = HashSet::new();
        for task in &self.tasks {
            task.validate().map_err(|error| format!("task {}: {error}", task.id))?;
            if !task_ids.insert(task.id) {
                return Err(format!("duplicate task id {}", task.id));
            }
        }
        let mut session_ids = HashSet::new();
        for session in &self.sessions {
            session
                .validate()
                .map_err(|error| format!("session {}: {error}", session.id))?;
            if !session_ids.insert(session.id) {
                return Err(format!("duplicate session id {}", session.id));
            }
        }
        let mut distraction_ids = HashSet::new();
        for distraction in &self.distractions {
            if !distraction_ids.insert(distraction.id) {
                return Err(format!("duplicate distraction id {}", distraction.id));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    let mut split = value.split(':');
    let Some(hour_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    let Some(minute_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    if split.next().is_some() {
        return Err(format!("{field_name} must be HH:MM"));
    }

    let hour = hour_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    let minute = minute_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("{field_name} must be HH:MM"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_task() -> Task {
        Task {
            id: 1_771_228_800_000,
            title: "Write report".to_string(),
            priority: Priority::Medium,
            estimated_duration: 25,
            completed: false,
            created_at: fixed_time("2026-02-16T08:00:00Z"),
            completed_at: None,
        }
    }

    fn sample_session() -> Session {
        Session {
            id: 1_771_232_400_000,
            session_type: SessionType::Focus,
            task_id: Some(1_771_228_800_000),
            duration: 1500,
            status: SessionStatus::Completed,
            start_time: fixed_time("2026-02-16T09:00:00Z"),
            end_time: Some(fixed_time("2026-02-16T09:25:00Z")),
            actual_duration: Some(1500),
            paused_at: None,
            resumed_at: None,
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            tasks: vec![sample_task()],
            sessions: vec![sample_session()],
            distractions: vec![Distraction {
                id: 1_771_233_000_000,
                distraction_type: DistractionType::Email,
                description: "inbox ping".to_string(),
                timestamp: fixed_time("2026-02-16T09:10:00Z"),
                session_id: Some(1_771_232_400_000),
            }],
            daily_summary: Some(DailySummary {
                summary: "Good day".to_string(),
                achievements: vec!["Finished the report".to_string()],
                insights: vec![],
                recommendations: vec!["Start earlier".to_string()],
                detailed_analysis: None,
                score: 72,
                trend_analysis: Some("steady".to_string()),
                date: NaiveDate::from_ymd_opt(2026, 2, 16).expect("valid date"),
                generated_at: fixed_time("2026-02-16T18:00:00Z"),
            }),
            ..Snapshot::default()
        }
    }

    #[test]
    fn task_validate_rejects_empty_title() {
        let mut task = sample_task();
        task.title = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn task_validate_requires_completion_timestamp() {
        let mut task = sample_task();
        task.completed = true;
        assert!(task.validate().is_err());
        task.completed_at = Some(fixed_time("2026-02-16T10:00:00Z"));
        assert!(task.validate().is_ok());
    }

    #[test]
    fn snapshot_validate_rejects_duplicate_ids_and_bad_tasks() {
        assert!(sample_snapshot().validate().is_ok());

        let mut duplicated = sample_snapshot();
        let mut copy = sample_task();
        copy.title = "dup".to_string();
        duplicated.tasks.push(copy);
        assert!(duplicated.validate().unwrap_err().contains("duplicate task id"));

        let mut blank = sample_snapshot();
        blank.tasks[0].title = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut zero = sample_snapshot();
        zero.tasks[0].estimated_duration = 0;
        assert!(zero.validate().is_err());

        let mut sessions = sample_snapshot();
        sessions.sessions.push(sample_session());
        assert!(sessions.validate().is_err());
    }

    #[test]
    fn session_validate_rejects_reverse_time() {
        let mut session = sample_session();
        session.end_time = Some(fixed_time("2026-02-16T08:59:00Z"));
        assert!(session.validate().is_err());
    }

    #[test]
    fn user_profile_rejects_bad_work_hours() {
        let mut profile = UserProfile::default();
        assert!(profile.validate().is_ok());
        profile.work_hours.start = "25:00".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn current_session_is_the_open_history_entry() {
        let mut snapshot = sample_snapshot();
        assert!(snapshot.current_session().is_none());

        let mut open = sample_session();
        open.id += 1;
        open.status = SessionStatus::Paused;
        open.end_time = None;
        open.actual_duration = None;
        snapshot.sessions.push(open.clone());

        assert_eq!(snapshot.current_session(), Some(&open));
    }

    #[test]
    fn snapshot_uses_camel_case_top_level_fields() {
        let value = serde_json::to_value(sample_snapshot()).expect("serialize snapshot");
        let object = value.as_object().expect("object");
        for key in [
            "user",
            "tasks",
            "sessions",
            "distractions",
            "settings",
            "dailySummary",
            "timer",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(value["sessions"][0]["type"], "focus");
        assert_eq!(value["distractions"][0]["type"], "email");
    }

    #[test]
    fn partial_snapshot_fills_defaults() {
        let parsed: Snapshot =
            serde_json::from_str(r#"{"settings":{"theme":"dark"}}"#).expect("partial snapshot");
        assert_eq!(parsed.settings.theme, Theme::Dark);
        assert!(parsed.settings.notifications);
        assert_eq!(parsed.user.focus_session_duration, 25);
        assert!(parsed.tasks.is_empty());
    }

    #[test]
    fn distraction_type_parse_accepts_aliases() {
        assert_eq!(DistractionType::parse("social-media"), Some(DistractionType::SocialMedia));
        assert_eq!(DistractionType::parse(" EMAIL "), Some(DistractionType::Email));
        assert_eq!(DistractionType::parse(""), None);
    }

    fn arb_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (
            1u64..u64::MAX / 2,
            "[A-Za-z0-9 ]{1,40}",
            arb_priority(),
            1u32..600,
            prop::option::of(0i64..100_000),
        )
            .prop_map(|(id, title, priority, estimated_duration, completed_offset)| {
                let created_at = fixed_time("2026-02-16T08:00:00Z");
                Task {
                    id,
                    title,
                    priority,
                    estimated_duration,
                    completed: completed_offset.is_some(),
                    created_at,
                    completed_at: completed_offset
                        .map(|offset| created_at + chrono::Duration::seconds(offset)),
                }
            })
    }

    proptest! {
        #[test]
        fn snapshot_serde_roundtrip(tasks in prop::collection::vec(arb_task(), 0..8)) {
            let mut snapshot = sample_snapshot();
            snapshot.tasks = tasks;
            let raw = serde_json::to_string(&snapshot).expect("serialize snapshot");
            let restored: Snapshot = serde_json::from_str(&raw).expect("deserialize snapshot");
            prop_assert_eq!(restored, snapshot);
        }
    }
}
