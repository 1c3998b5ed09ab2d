use crate::application::ai_advisor::{AiAdvisor, ResultSource, SuggestionOutcome, SummaryOutcome};
use crate::application::bootstrap::{bootstrap_workspace, BootstrapResult};
use crate::application::timer_driver::{TickControl, TimerDriver};
use crate::domain::error::DomainError;
use crate::domain::insights::{DailyStats, TimeOfDay};
use crate::domain::models::{
    Distraction, DistractionType, EntityId, Priority, Session, SessionType, Settings,
    SettingsPatch, Snapshot, Task, TaskPatch, UserPatch, UserProfile,
};
use crate::domain::reducer::{Action, Outcome, Store};
use crate::domain::timer::TimerPhase;
use crate::infrastructure::config::{AppConfig, CredentialBackend};
use crate::infrastructure::credential_store::{
    CredentialStore, KeyringCredentialStore, LocalStorageCredentialStore,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notifier::{completion_message, CompletionNotifier, TerminalNotifier};
use crate::infrastructure::snapshot_repository::{export_snapshot, SnapshotRepository};
use crate::infrastructure::storage::{LocalStorage, SqliteLocalStorage};
use crate::infrastructure::text_generation_client::{
    ReqwestTextGenerationClient, TextGenerationClient,
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const KEYRING_SERVICE: &str = "focusmate.openai";

pub trait NowProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl NowProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Collaborators behind the state container.
pub struct Services {
    pub storage: Arc<dyn LocalStorage>,
    pub credentials: Arc<dyn CredentialStore>,
    pub text_client: Arc<dyn TextGenerationClient>,
    pub notifier: Arc<dyn CompletionNotifier>,
    pub now_provider: Arc<dyn NowProvider>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFlags {
    pub ai_suggestions: bool,
    pub daily_summary: bool,
}

#[derive(Debug, Clone, Copy)]
enum LoadingKind {
    AiSuggestions,
    DailySummary,
}

impl LoadingFlags {
    fn set(&mut self, kind: LoadingKind, value: bool) {
        match kind {
            LoadingKind::AiSuggestions => self.ai_suggestions = value,
            LoadingKind::DailySummary => self.daily_summary = value,
        }
    }
}

#[derive(Debug)]
struct RuntimeState {
    store: Store,
    loading: LoadingFlags,
}

/// Single state container: every mutation goes through [`AppState::dispatch`].
pub struct AppState {
    export_dir: PathBuf,
    config: AppConfig,
    timezone: Tz,
    repository: SnapshotRepository,
    credentials: Arc<dyn CredentialStore>,
    advisor: AiAdvisor,
    notifier: Arc<dyn CompletionNotifier>,
    now_provider: Arc<dyn NowProvider>,
    runtime: Mutex<RuntimeState>,
    driver: TimerDriver,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config = &bootstrap.config;
        let storage: Arc<dyn LocalStorage> =
            Arc::new(SqliteLocalStorage::new(&bootstrap.database_path));
        let credentials: Arc<dyn CredentialStore> = match config.credential_backend {
            CredentialBackend::LocalStorage => Arc::new(LocalStorageCredentialStore::new(
                storage.clone(),
                config.credential_key.clone(),
            )),
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new(
                KEYRING_SERVICE,
                config.credential_key.clone(),
            )),
        };
        let services = Services {
            storage,
            credentials,
            text_client: Arc::new(ReqwestTextGenerationClient::new(config.ai.base_url.clone())),
            notifier: Arc::new(TerminalNotifier),
            now_provider: Arc::new(SystemClock),
        };
        Self::with_services(bootstrap, services)
    }

    pub fn with_services(
        bootstrap: BootstrapResult,
        services: Services,
    ) -> Result<Self, InfraError> {
        let BootstrapResult {
            export_dir, config, ..
        } = bootstrap;
        let timezone = config.tz()?;
        let repository = SnapshotRepository::new(services.storage, config.storage_key.clone());
        let advisor = AiAdvisor::new(
            services.text_client,
            services.credentials.clone(),
            config.ai.clone(),
        );

        let loaded = repository.load();
        let store = Store::new(loaded.clone(), services.now_provider.now());
        if store.snapshot() != &loaded {
            tracing::info!("closed orphaned session state left by a previous run");
            if let Err(error) = repository.save(store.snapshot()) {
                tracing::warn!(%error, "failed to persist reconciled state");
            }
        }

        Ok(Self {
            export_dir,
            config,
            timezone,
            repository,
            credentials: services.credentials,
            advisor,
            notifier: services.notifier,
            now_provider: services.now_provider,
            runtime: Mutex::new(RuntimeState {
                store,
                loading: LoadingFlags::default(),
            }),
            driver: TimerDriver::default(),
        })
    }

    /// Replaces the environment-provided API key (tests, embedding).
    pub fn with_env_api_key(mut self, api_key: Option<String>) -> Self {
        self.advisor = self.advisor.with_env_api_key(api_key);
        self
    }

    pub fn with_driver(mut self, driver: TimerDriver) -> Self {
        self.driver = driver;
        self
    }

    pub fn driver(&self) -> &TimerDriver {
        &self.driver
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now_provider.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone).date_naive()
    }

    pub fn snapshot(&self) -> Result<Snapshot, InfraError> {
        Ok(self.lock_runtime()?.store.snapshot().clone())
    }

    pub fn loading(&self) -> Result<LoadingFlags, InfraError> {
        Ok(self.lock_runtime()?.loading)
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        tracing::info!(command, "{message}");
    }

    pub fn log_error(&self, command: &str, message: &str) {
        tracing::error!(command, "{message}");
    }

    fn lock_runtime(&self) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
        self.runtime
            .lock()
            .map_err(|error| InfraError::Persistence(format!("runtime lock poisoned: {error}")))
    }

    /// Runs one reducer step and persists the resulting snapshot.
    ///
    /// The write happens under the same lock as the update, so stored state
    /// never lags behind a later mutation.
    fn dispatch(&self, action: Action) -> Result<Outcome, InfraError> {
        let name = action.name();
        let now = self.now();
        let mut runtime = self.lock_runtime()?;
        let outcome = runtime.store.reduce(action, now)?;
        if outcome.changed() {
            self.persist(runtime.store.snapshot());
        }
        tracing::debug!(action = name, changed = outcome.changed(), "reduced");
        Ok(outcome)
    }

    fn persist(&self, snapshot: &Snapshot) {
        if let Err(error) = self.repository.save(snapshot) {
            tracing::warn!(%error, "failed to persist state; continuing in memory");
        }
    }

    fn begin_loading(&self, kind: LoadingKind) -> Result<LoadingGuard<'_>, InfraError> {
        self.lock_runtime()?.loading.set(kind, true);
        Ok(LoadingGuard { state: self, kind })
    }

    fn timer_status(&self, snapshot: &Snapshot, loading: LoadingFlags) -> TimerStatusResponse {
        let timer = &snapshot.timer;
        let phase = timer.phase();
        let time_left = match phase {
            TimerPhase::Idle => timer.time_left,
            _ => timer.remaining_at(self.now()),
        };
        TimerStatusResponse {
            phase: phase.as_str().to_string(),
            time_left,
            total_time: timer.total_time,
            session_type: (phase != TimerPhase::Idle).then_some(timer.session_type),
            task_id: timer.task_id,
            current_session: snapshot.current_session().cloned(),
            loading,
        }
    }

    fn current_status(&self) -> Result<TimerStatusResponse, InfraError> {
        let runtime = self.lock_runtime()?;
        Ok(self.timer_status(runtime.store.snapshot(), runtime.loading))
    }

    fn notify_completion(&self, session: &Session, settings: &Settings) {
        if settings.sound_enabled {
            if let Err(error) = self.notifier.play_sound() {
                tracing::warn!(%error, "completion sound failed");
            }
        }
        if settings.notifications {
            let (title, body) = completion_message(session);
            if let Err(error) = self.notifier.notify(&title, &body) {
                tracing::warn!(%error, "completion notification failed");
            }
        }
    }
}

/// Clears a loading flag however the guarded call ends.
struct LoadingGuard<'a> {
    state: &'a AppState,
    kind: LoadingKind,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut runtime) = self.state.runtime.lock() {
            runtime.loading.set(self.kind, false);
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStatusResponse {
    pub phase: String,
    pub time_left: u32,
    pub total_time: u32,
    pub session_type: Option<SessionType>,
    pub task_id: Option<EntityId>,
    pub current_session: Option<Session>,
    pub loading: LoadingFlags,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerTransitionResponse {
    /// Session closed by this transition, if any.
    pub closed_session: Option<Session>,
    pub completed: bool,
    pub timer: TimerStatusResponse,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyStatsResponse {
    pub date: NaiveDate,
    pub focus_minutes: u64,
    pub focus_sessions: usize,
    pub break_sessions: usize,
    pub completed_sessions: usize,
    pub average_focus_minutes: f64,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub completion_rate: f64,
    pub distractions: usize,
    pub distractions_by_type: BTreeMap<DistractionType, usize>,
    pub productivity_score: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportResponse {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CredentialStatusResponse {
    pub stored: bool,
    pub environment_override: bool,
    pub backend: CredentialBackend,
}

pub fn add_task_impl(
    state: &AppState,
    title: String,
    priority: Option<String>,
    estimated_duration: Option<u32>,
) -> Result<Task, InfraError> {
    let priority = priority
        .as_deref()
        .map(parse_priority)
        .transpose()?
        .unwrap_or_default();
    let estimated_duration = match estimated_duration {
        Some(minutes) => minutes,
        None => state.snapshot()?.user.focus_session_duration,
    };
    let Outcome::Task(task) = state.dispatch(Action::AddTask {
        title,
        priority,
        estimated_duration,
    })?
    else {
        return Err(unexpected_outcome("add_task"));
    };
    state.log_info("add_task", &format!("created task_id={}", task.id));
    Ok(task)
}

pub fn list_tasks_impl(state: &AppState) -> Result<Vec<Task>, InfraError> {
    Ok(state.snapshot()?.tasks)
}

pub fn update_task_impl(
    state: &AppState,
    task_id: EntityId,
    title: Option<String>,
    priority: Option<String>,
    estimated_duration: Option<u32>,
) -> Result<Task, InfraError> {
    let patch = TaskPatch {
        title,
        priority: priority.as_deref().map(parse_priority).transpose()?,
        estimated_duration,
    };
    if patch.is_empty() {
        return Err(DomainError::validation("nothing to update").into());
    }
    let Outcome::Task(task) = state.dispatch(Action::UpdateTask { id: task_id, patch })? else {
        return Err(unexpected_outcome("update_task"));
    };
    state.log_info("update_task", &format!("updated task_id={task_id}"));
    Ok(task)
}

pub fn complete_task_impl(state: &AppState, task_id: EntityId) -> Result<Task, InfraError> {
    match state.dispatch(Action::CompleteTask(task_id))? {
        Outcome::Task(task) => {
            state.log_info("complete_task", &format!("completed task_id={task_id}"));
            Ok(task)
        }
        Outcome::Unchanged => state
            .snapshot()?
            .task(task_id)
            .cloned()
            .ok_or_else(|| InfraError::from(DomainError::not_found(format!("task {task_id}")))),
        _ => Err(unexpected_outcome("complete_task")),
    }
}

pub fn delete_task_impl(state: &AppState, task_id: EntityId) -> Result<bool, InfraError> {
    let Outcome::TaskDeleted(removed) = state.dispatch(Action::DeleteTask(task_id))? else {
        return Err(unexpected_outcome("delete_task"));
    };
    if removed {
        state.log_info("delete_task", &format!("deleted task_id={task_id}"));
    }
    Ok(removed)
}

pub fn start_timer_impl(
    state: &AppState,
    minutes: Option<u32>,
    session_type: Option<String>,
    task_id: Option<EntityId>,
) -> Result<TimerStatusResponse, InfraError> {
    let session_type = session_type
        .as_deref()
        .map(parse_session_type)
        .transpose()?
        .unwrap_or_default();
    let outcome = state.dispatch(Action::StartTimer {
        duration: minutes.map(|value| value.saturating_mul(60)),
        session_type,
        task_id,
    })?;
    if let Outcome::Session(session) = &outcome {
        state.log_info(
            "start_timer",
            &format!(
                "started {} session_id={} duration={}s",
                session.session_type.as_str(),
                session.id,
                session.duration
            ),
        );
    }
    state.current_status()
}

pub fn pause_timer_impl(state: &AppState) -> Result<TimerStatusResponse, InfraError> {
    state.dispatch(Action::PauseTimer)?;
    state.driver.cancel();
    state.log_info("pause_timer", "paused");
    state.current_status()
}

pub fn resume_timer_impl(state: &AppState) -> Result<TimerStatusResponse, InfraError> {
    state.dispatch(Action::ResumeTimer)?;
    state.log_info("resume_timer", "resumed");
    state.current_status()
}

fn closing_transition(
    state: &AppState,
    command: &str,
    action: Action,
) -> Result<TimerTransitionResponse, InfraError> {
    let outcome = state.dispatch(action)?;
    state.driver.cancel();
    let closed_session = match outcome {
        Outcome::Session(session) => Some(session),
        _ => None,
    };
    if let Some(session) = &closed_session {
        state.log_info(
            command,
            &format!(
                "closed session_id={} actual={}s",
                session.id,
                session.actual_duration.unwrap_or_default()
            ),
        );
    }
    Ok(TimerTransitionResponse {
        closed_session,
        completed: false,
        timer: state.current_status()?,
    })
}

pub fn stop_timer_impl(state: &AppState) -> Result<TimerTransitionResponse, InfraError> {
    closing_transition(state, "stop_timer", Action::StopTimer)
}

/// Clears the timer and finalizes any open session.
pub fn reset_timer_impl(state: &AppState) -> Result<TimerTransitionResponse, InfraError> {
    closing_transition(state, "reset_timer", Action::ResetTimer)
}

pub fn timer_status_impl(state: &AppState) -> Result<TimerStatusResponse, InfraError> {
    state.current_status()
}

/// One timer step against the wall clock; fires the completion side effects.
pub fn tick_impl(state: &AppState) -> Result<TimerTransitionResponse, InfraError> {
    let outcome = state.dispatch(Action::Tick)?;
    let closed_session = match outcome {
        Outcome::TimerCompleted(session) => Some(session),
        _ => None,
    };
    if let Some(session) = &closed_session {
        state.driver.cancel();
        state.log_info(
            "tick",
            &format!(
                "completed {} session_id={}",
                session.session_type.as_str(),
                session.id
            ),
        );
        let settings = state.snapshot()?.settings;
        state.notify_completion(session, &settings);
    }
    Ok(TimerTransitionResponse {
        completed: closed_session.is_some(),
        closed_session,
        timer: state.current_status()?,
    })
}

/// Starts the periodic tick loop when the timer is running.
///
/// Returns whether a loop was started.
pub fn spawn_timer_driver(state: &Arc<AppState>) -> Result<bool, InfraError> {
    if state.snapshot()?.timer.phase() != TimerPhase::Running {
        return Ok(false);
    }
    let weak = Arc::downgrade(state);
    state.driver.start(move || {
        let Some(state) = weak.upgrade() else {
            return TickControl::Stop;
        };
        match tick_impl(&state) {
            Ok(response) if response.timer.phase == TimerPhase::Running.as_str() => {
                TickControl::Continue
            }
            Ok(_) => TickControl::Stop,
            Err(error) => {
                state.log_error("tick", &error.to_string());
                TickControl::Stop
            }
        }
    })?;
    Ok(true)
}

pub fn record_distraction_impl(
    state: &AppState,
    distraction_type: String,
    description: Option<String>,
) -> Result<Distraction, InfraError> {
    let distraction_type = DistractionType::parse(&distraction_type).ok_or_else(|| {
        DomainError::validation(format!(
            "unknown distraction type '{}'; expected social_media, email, noise, meeting or other",
            distraction_type.trim()
        ))
    })?;
    let Outcome::Distraction(distraction) = state.dispatch(Action::RecordDistraction {
        distraction_type,
        description: description.unwrap_or_default(),
    })?
    else {
        return Err(unexpected_outcome("record_distraction"));
    };
    state.log_info(
        "record_distraction",
        &format!(
            "recorded {} distraction_id={}",
            distraction.distraction_type.as_str(),
            distraction.id
        ),
    );
    Ok(distraction)
}

pub fn list_distractions_impl(
    state: &AppState,
    session_id: Option<EntityId>,
) -> Result<Vec<Distraction>, InfraError> {
    let distractions = state.snapshot()?.distractions;
    Ok(match session_id {
        Some(session_id) => distractions
            .into_iter()
            .filter(|distraction| distraction.session_id == Some(session_id))
            .collect(),
        None => distractions,
    })
}

pub fn settings_impl(state: &AppState) -> Result<Settings, InfraError> {
    Ok(state.snapshot()?.settings)
}

pub fn update_settings_impl(
    state: &AppState,
    patch: SettingsPatch,
) -> Result<Settings, InfraError> {
    if state.dispatch(Action::UpdateSettings(patch))?.changed() {
        state.log_info("update_settings", "settings updated");
    }
    settings_impl(state)
}

pub fn update_profile_impl(state: &AppState, patch: UserPatch) -> Result<UserProfile, InfraError> {
    if state.dispatch(Action::UpdateUser(patch))?.changed() {
        state.log_info("update_profile", "profile updated");
    }
    Ok(state.snapshot()?.user)
}

pub fn daily_stats_impl(
    state: &AppState,
    date: Option<String>,
) -> Result<DailyStatsResponse, InfraError> {
    let date = resolve_date(state, date.as_deref())?;
    let stats = DailyStats::collect(&state.snapshot()?, date, state.timezone);
    Ok(DailyStatsResponse {
        date,
        focus_minutes: stats.focus_minutes().round() as u64,
        focus_sessions: stats.focus_session_count,
        break_sessions: stats.break_session_count,
        completed_sessions: stats.completed_session_count,
        average_focus_minutes: stats.average_focus_minutes(),
        completed_tasks: stats.completed_tasks.len(),
        pending_tasks: stats.pending_tasks.len(),
        completion_rate: stats.completion_rate(),
        distractions: stats.distractions.len(),
        productivity_score: stats.productivity_score(),
        distractions_by_type: stats.distractions_by_type,
    })
}

pub async fn generate_daily_summary_impl(
    state: &AppState,
    date: Option<String>,
) -> Result<SummaryOutcome, InfraError> {
    let date = resolve_date(state, date.as_deref())?;
    let stats = DailyStats::collect(&state.snapshot()?, date, state.timezone);
    let outcome = {
        let _loading = state.begin_loading(LoadingKind::DailySummary)?;
        let now = state.now();
        state
            .advisor
            .daily_summary(&stats, TimeOfDay::at(now, state.timezone), now)
            .await
    };
    state.dispatch(Action::SetDailySummary(outcome.summary.clone()))?;
    state.log_info(
        "generate_daily_summary",
        &format!(
            "summary for {date} source={:?} score={}",
            outcome.source, outcome.summary.score
        ),
    );
    Ok(outcome)
}

pub async fn focus_suggestions_impl(state: &AppState) -> Result<SuggestionOutcome, InfraError> {
    let snapshot = state.snapshot()?;
    if !snapshot.settings.ai_suggestions {
        return Ok(SuggestionOutcome {
            suggestions: Vec::new(),
            source: ResultSource::Disabled,
            notice: None,
        });
    }
    let current_task = snapshot
        .current_session()
        .and_then(|session| session.task_id)
        .and_then(|task_id| snapshot.task(task_id))
        .map(|task| task.title.clone());
    let outcome = {
        let _loading = state.begin_loading(LoadingKind::AiSuggestions)?;
        state
            .advisor
            .focus_suggestions(
                current_task.as_deref(),
                &snapshot.distractions,
                TimeOfDay::at(state.now(), state.timezone),
            )
            .await
    };
    state.log_info(
        "focus_suggestions",
        &format!(
            "{} suggestions source={:?}",
            outcome.suggestions.len(),
            outcome.source
        ),
    );
    Ok(outcome)
}

pub fn export_data_impl(state: &AppState) -> Result<ExportResponse, InfraError> {
    let snapshot = state.snapshot()?;
    let path = export_snapshot(&state.export_dir, state.today(), &snapshot)?;
    let path = path.display().to_string();
    state.log_info("export_data", &format!("exported to {path}"));
    Ok(ExportResponse { path })
}

/// Replaces all state with a previously exported backup.
pub fn import_data_impl(state: &AppState, path: &Path) -> Result<Snapshot, InfraError> {
    let raw = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str::<Snapshot>(&raw)?;
    state.driver.cancel();
    state.dispatch(Action::LoadData(snapshot))?;
    state.log_info("import_data", &format!("imported {}", path.display()));
    state.snapshot()
}

/// Deletes the stored blob and resets to defaults; the API key is kept.
pub fn wipe_data_impl(state: &AppState, confirmed: bool) -> Result<(), InfraError> {
    if !confirmed {
        return Err(DomainError::validation("wipe requires confirmation").into());
    }
    state.driver.cancel();
    {
        let mut runtime = state.lock_runtime()?;
        runtime.store.reduce(Action::Wipe, state.now())?;
        if let Err(error) = state.repository.clear() {
            tracing::warn!(%error, "failed to delete stored state");
        }
    }
    state.log_info("wipe_data", "all data cleared");
    Ok(())
}

pub fn set_api_key_impl(
    state: &AppState,
    api_key: String,
) -> Result<CredentialStatusResponse, InfraError> {
    state.credentials.save_api_key(&api_key)?;
    state.log_info("set_api_key", "api key stored");
    credential_status_impl(state)
}

pub fn credential_status_impl(state: &AppState) -> Result<CredentialStatusResponse, InfraError> {
    Ok(CredentialStatusResponse {
        stored: state.credentials.load_api_key()?.is_some(),
        environment_override: state.advisor.has_env_api_key(),
        backend: state.config.credential_backend,
    })
}

pub fn clear_api_key_impl(state: &AppState) -> Result<CredentialStatusResponse, InfraError> {
    state.credentials.delete_api_key()?;
    state.log_info("clear_api_key", "api key removed");
    credential_status_impl(state)
}

fn unexpected_outcome(command: &str) -> InfraError {
    InfraError::Persistence(format!("{command}: unexpected reducer outcome"))
}

fn parse_priority(value: &str) -> Result<Priority, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        _ => Err(DomainError::validation(format!("unsupported priority: {value}")).into()),
    }
}

fn parse_session_type(value: &str) -> Result<SessionType, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "focus" => Ok(SessionType::Focus),
        "break" => Ok(SessionType::Break),
        _ => Err(DomainError::validation(format!("unsupported session type: {value}")).into()),
    }
}

fn resolve_date(state: &AppState, value: Option<&str>) -> Result<NaiveDate, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|error| {
            InfraError::from(DomainError::validation(format!(
                "date must be YYYY-MM-DD: {error}"
            )))
        }),
        None => Ok(state.today()),
    }
}
