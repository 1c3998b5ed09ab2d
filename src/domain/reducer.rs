use crate::domain::error::DomainError;
use crate::domain::models::{
    DailySummary, Distraction, DistractionType, EntityId, Priority, Session, SessionStatus,
    SessionType, SettingsPatch, Snapshot, Task, TaskPatch, UserPatch,
};
use crate::domain::timer::{TickOutcome, TimerPhase, TimerState};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UpdateUser(UserPatch),
    AddTask {
        title: String,
        priority: Priority,
        estimated_duration: u32,
    },
    UpdateTask {
        id: EntityId,
        patch: TaskPatch,
    },
    CompleteTask(EntityId),
    DeleteTask(EntityId),
    StartTimer {
        /// Seconds; `None` uses the profile default for `session_type`.
        duration: Option<u32>,
        session_type: SessionType,
        task_id: Option<EntityId>,
    },
    PauseTimer,
    ResumeTimer,
    StopTimer,
    ResetTimer,
    Tick,
    RecordDistraction {
        distraction_type: DistractionType,
        description: String,
    },
    SetDailySummary(DailySummary),
    UpdateSettings(SettingsPatch),
    LoadData(Snapshot),
    Wipe,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateUser(_) => "update_user",
            Self::AddTask { .. } => "add_task",
            Self::UpdateTask { .. } => "update_task",
            Self::CompleteTask(_) => "complete_task",
            Self::DeleteTask(_) => "delete_task",
            Self::StartTimer { .. } => "start_timer",
            Self::PauseTimer => "pause_timer",
            Self::ResumeTimer => "resume_timer",
            Self::StopTimer => "stop_timer",
            Self::ResetTimer => "reset_timer",
            Self::Tick => "tick_timer",
            Self::RecordDistraction { .. } => "record_distraction",
            Self::SetDailySummary(_) => "set_daily_summary",
            Self::UpdateSettings(_) => "update_settings",
            Self::LoadData(_) => "load_data",
            Self::Wipe => "wipe",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Unchanged,
    Updated,
    Task(Task),
    TaskDeleted(bool),
    Session(Session),
    /// Reset with nothing to close.
    TimerCleared,
    TimerTicked { time_left: u32 },
    TimerCompleted(Session),
    Distraction(Distraction),
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged | Self::TaskDeleted(false))
    }
}

/// Owns the in-memory snapshot; `reduce` is the only way to mutate it.
#[derive(Debug, Clone, Default)]
pub struct Store {
    snapshot: Snapshot,
    last_id: EntityId,
}

impl Store {
    pub fn new(mut snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        reconcile(&mut snapshot, now);
        let last_id = snapshot.max_id();
        Self { snapshot, last_id }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn reduce(&mut self, action: Action, now: DateTime<Utc>) -> Result<Outcome, DomainError> {
        match action {
            Action::UpdateUser(patch) => {
                let next = self.snapshot.user.merged(&patch);
                next.validate().map_err(DomainError::Validation)?;
                if next == self.snapshot.user {
                    return Ok(Outcome::Unchanged);
                }
                self.snapshot.user = next;
                Ok(Outcome::Updated)
            }
            Action::AddTask {
                title,
                priority,
                estimated_duration,
            } => self.add_task(title, priority, estimated_duration, now),
            Action::UpdateTask { id, patch } => self.update_task(id, patch),
            Action::CompleteTask(id) => self.complete_task(id, now),
            Action::DeleteTask(id) => {
                let before = self.snapshot.tasks.len();
                self.snapshot.tasks.retain(|task| task.id != id);
                Ok(Outcome::TaskDeleted(self.snapshot.tasks.len() != before))
            }
            Action::StartTimer {
                duration,
                session_type,
                task_id,
            } => self.start_timer(duration, session_type, task_id, now),
            Action::PauseTimer => self.pause_timer(now),
            Action::ResumeTimer => self.resume_timer(now),
            Action::StopTimer => {
                if self.snapshot.timer.phase() == TimerPhase::Idle {
                    return Err(DomainError::validation("timer is not running"));
                }
                let elapsed = self.snapshot.timer.counted_seconds(now);
                self.snapshot.timer.reset();
                Ok(self
                    .close_current_session(elapsed, now)
                    .map_or(Outcome::TimerCleared, Outcome::Session))
            }
            Action::ResetTimer => {
                let was_idle = self.snapshot.timer.phase() == TimerPhase::Idle;
                let elapsed = self.snapshot.timer.counted_seconds(now);
                self.snapshot.timer.reset();
                match self.close_current_session(elapsed, now) {
                    Some(session) => Ok(Outcome::Session(session)),
                    None if was_idle => Ok(Outcome::Unchanged),
                    None => Ok(Outcome::TimerCleared),
                }
            }
            Action::Tick => match self.snapshot.timer.tick(now) {
                TickOutcome::Idle => Ok(Outcome::Unchanged),
                TickOutcome::Running { time_left } => Ok(Outcome::TimerTicked { time_left }),
                TickOutcome::Completed { elapsed_seconds } => {
                    match self.close_current_session(elapsed_seconds, now) {
                        Some(session) => Ok(Outcome::TimerCompleted(session)),
                        None => Ok(Outcome::TimerCleared),
                    }
                }
            },
            Action::RecordDistraction {
                distraction_type,
                description,
            } => {
                let distraction = Distraction {
                    id: self.next_id(now),
                    distraction_type,
                    description: description.trim().to_string(),
                    timestamp: now,
                    session_id: self.snapshot.current_session().map(|session| session.id),
                };
                self.snapshot.distractions.push(distraction.clone());
                Ok(Outcome::Distraction(distraction))
            }
            Action::SetDailySummary(summary) => {
                self.snapshot.daily_summary = Some(summary);
                Ok(Outcome::Updated)
            }
            Action::UpdateSettings(patch) => {
                let before = self.snapshot.settings.clone();
                self.snapshot.settings.apply(&patch);
                if before == self.snapshot.settings {
                    return Ok(Outcome::Unchanged);
                }
                Ok(Outcome::Updated)
            }
            Action::LoadData(snapshot) => {
                snapshot.validate().map_err(DomainError::Validation)?;
                *self = Store::new(snapshot, now);
                Ok(Outcome::Updated)
            }
            Action::Wipe => {
                *self = Store::default();
                Ok(Outcome::Updated)
            }
        }
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> EntityId {
        let candidate = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = candidate.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    fn add_task(
        &mut self,
        title: String,
        priority: Priority,
        estimated_duration: u32,
        now: DateTime<Utc>,
    ) -> Result<Outcome, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        if estimated_duration == 0 {
            return Err(DomainError::validation("estimated duration must be > 0"));
        }

        let task = Task {
            id: self.next_id(now),
            title: title.to_string(),
            priority,
            estimated_duration,
            completed: false,
            created_at: now,
            completed_at: None,
        };
        self.snapshot.tasks.push(task.clone());
        Ok(Outcome::Task(task))
    }

    fn update_task(&mut self, id: EntityId, patch: TaskPatch) -> Result<Outcome, DomainError> {
        let title = match patch.title.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::validation("title must not be empty")),
            other => other.map(ToOwned::to_owned),
        };
        if patch.estimated_duration == Some(0) {
            return Err(DomainError::validation("estimated duration must be > 0"));
        }

        let Some(task) = self.snapshot.tasks.iter_mut().find(|task| task.id == id) else {
            return Err(DomainError::not_found(format!("task {id}")));
        };
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(estimated_duration) = patch.estimated_duration {
            task.estimated_duration = estimated_duration;
        }
        Ok(Outcome::Task(task.clone()))
    }

    fn complete_task(&mut self, id: EntityId, now: DateTime<Utc>) -> Result<Outcome, DomainError> {
        let Some(task) = self.snapshot.tasks.iter_mut().find(|task| task.id == id) else {
            return Err(DomainError::not_found(format!("task {id}")));
        };
        if task.completed {
            return Ok(Outcome::Unchanged);
        }
        task.completed = true;
        task.completed_at = Some(now);
        Ok(Outcome::Task(task.clone()))
    }

    fn start_timer(
        &mut self,
        duration: Option<u32>,
        session_type: SessionType,
        task_id: Option<EntityId>,
        now: DateTime<Utc>,
    ) -> Result<Outcome, DomainError> {
        if self.snapshot.timer.phase() != TimerPhase::Idle {
            return Err(DomainError::validation("timer must be idle before start"));
        }
        if self.snapshot.current_session().is_some() {
            return Err(DomainError::validation(
                "a session is still open; stop it before starting another",
            ));
        }
        if let Some(task_id) = task_id {
            if self.snapshot.task(task_id).is_none() {
                return Err(DomainError::not_found(format!("task {task_id}")));
            }
        }
        let duration = duration
            .unwrap_or_else(|| self.snapshot.user.default_minutes(session_type).saturating_mul(60));
        if duration == 0 {
            return Err(DomainError::validation("duration must be > 0"));
        }

        let session = Session {
            id: self.next_id(now),
            session_type,
            task_id,
            duration,
            status: SessionStatus::Active,
            start_time: now,
            end_time: None,
            actual_duration: None,
            paused_at: None,
            resumed_at: None,
        };
        self.snapshot.sessions.push(session.clone());
        self.snapshot.timer = TimerState::started(duration, session_type, task_id, now);
        Ok(Outcome::Session(session))
    }

    fn pause_timer(&mut self, now: DateTime<Utc>) -> Result<Outcome, DomainError> {
        if self.snapshot.timer.phase() != TimerPhase::Running {
            return Err(DomainError::validation("timer is not running"));
        }
        self.snapshot.timer.pause(now);
        let session = self.current_session_mut().map(|session| {
            session.status = SessionStatus::Paused;
            session.paused_at = Some(now);
            session.clone()
        });
        Ok(session.map_or(Outcome::Updated, Outcome::Session))
    }

    fn resume_timer(&mut self, now: DateTime<Utc>) -> Result<Outcome, DomainError> {
        if self.snapshot.timer.phase() != TimerPhase::Paused {
            return Err(DomainError::validation("timer is not paused"));
        }
        self.snapshot.timer.resume(now);
        let session = self.current_session_mut().map(|session| {
            session.status = SessionStatus::Active;
            session.resumed_at = Some(now);
            session.clone()
        });
        Ok(session.map_or(Outcome::Updated, Outcome::Session))
    }

    fn current_session_mut(&mut self) -> Option<&mut Session> {
        self.snapshot
            .sessions
            .iter_mut()
            .rev()
            .find(|session| session.is_open())
    }

    fn close_current_session(&mut self, elapsed: u32, now: DateTime<Utc>) -> Option<Session> {
        let session = self.current_session_mut()?;
        session.status = SessionStatus::Completed;
        session.end_time = Some(now.max(session.start_time));
        session.actual_duration = Some(elapsed);
        Some(session.clone())
    }
}

/// Brings a loaded snapshot back in line with the one-open-session rule.
fn reconcile(snapshot: &mut Snapshot, now: DateTime<Utc>) {
    snapshot.timer.rehydrate(now);
    let timer_idle = snapshot.timer.phase() == TimerPhase::Idle;
    let mut seen_open = false;
    for session in snapshot.sessions.iter_mut().rev() {
        if !session.is_open() {
            continue;
        }
        if timer_idle || seen_open {
            session.status = SessionStatus::Completed;
            session.end_time = Some(now.max(session.start_time));
        }
        seen_open = true;
    }
}
