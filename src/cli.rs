use crate::application::commands::{
    add_task_impl, clear_api_key_impl, complete_task_impl, credential_status_impl,
    daily_stats_impl, delete_task_impl, export_data_impl, focus_suggestions_impl,
    generate_daily_summary_impl, import_data_impl, list_distractions_impl, list_tasks_impl,
    pause_timer_impl, record_distraction_impl, reset_timer_impl, resume_timer_impl,
    set_api_key_impl, settings_impl, spawn_timer_driver, start_timer_impl, stop_timer_impl,
    tick_impl, timer_status_impl, update_profile_impl, update_settings_impl, update_task_impl,
    wipe_data_impl, AppState,
};
use crate::domain::error::DomainError;
use crate::domain::models::{EntityId, SettingsPatch, Theme, UserPatch};
use crate::domain::timer::TimerPhase;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::logging::init_logging;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "focusmate")]
#[command(
    author,
    version,
    about = "Focus sessions, tasks and distraction tracking",
    long_about = None
)]
pub struct Cli {
    /// Workspace directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Focus and break timer
    Timer {
        #[command(subcommand)]
        command: TimerCommands,
    },
    /// Distraction log
    Distraction {
        #[command(subcommand)]
        command: DistractionCommands,
    },
    /// Generate the daily summary
    Summary {
        /// Day to summarize (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Ask for focus suggestions
    Suggest,
    /// Show statistics for a day
    Stats {
        /// Day to report (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Update the user profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage the text-generation API key
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },
    /// Write a dated backup of all data
    Export,
    /// Replace all data with a backup file
    Import {
        /// Backup file produced by `export`
        path: PathBuf,
    },
    /// Delete all data (the API key is kept)
    Wipe {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task
    Add {
        title: String,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// Estimated minutes (defaults to the focus session length)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// List tasks
    List,
    /// Edit a task
    Update {
        id: EntityId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Mark a task complete
    Complete { id: EntityId },
    /// Delete a task
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum TimerCommands {
    /// Start a session
    Start {
        /// Minutes (defaults to the profile length for the session type)
        #[arg(long)]
        minutes: Option<u32>,
        /// focus or break
        #[arg(long = "type")]
        session_type: Option<String>,
        /// Task the session works on
        #[arg(long)]
        task: Option<EntityId>,
    },
    Pause,
    Resume,
    /// Close the session early
    Stop,
    /// Clear the timer, closing any open session
    Reset,
    Status,
    /// Drive the countdown in the foreground until it ends
    Watch,
}

#[derive(Subcommand)]
enum DistractionCommands {
    /// Log a distraction (social_media, email, noise, meeting, other)
    Record {
        distraction_type: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List distractions
    List {
        #[arg(long)]
        session: Option<EntityId>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    Show,
    Set {
        /// light, dark or auto
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        ai_suggestions: Option<bool>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Set {
        #[arg(long)]
        name: Option<String>,
        /// HH:MM
        #[arg(long)]
        work_start: Option<String>,
        /// HH:MM
        #[arg(long)]
        work_end: Option<String>,
        #[arg(long)]
        break_minutes: Option<u32>,
        #[arg(long)]
        focus_minutes: Option<u32>,
    },
}

#[derive(Subcommand)]
enum CredentialCommands {
    Set { api_key: String },
    Status,
    Clear,
}

fn render<T: Serialize>(
    state: &AppState,
    command: &str,
    result: Result<T, InfraError>,
) -> Result<serde_json::Value, String> {
    let value = result.map_err(|error| state.command_error(command, &error))?;
    serde_json::to_value(value)
        .map_err(|error| state.command_error(command, &InfraError::from(error)))
}

/// A timer left running by a previous invocation is advanced before any command.
fn catch_up(state: &AppState) {
    let running = state
        .snapshot()
        .map(|snapshot| snapshot.timer.phase() == TimerPhase::Running)
        .unwrap_or(false);
    if running {
        if let Err(error) = tick_impl(state) {
            state.log_error("tick", &error.to_string());
        }
    }
}

fn parse_theme(value: Option<String>) -> Result<Option<Theme>, InfraError> {
    value
        .map(|raw| {
            Theme::parse(&raw).ok_or_else(|| {
                InfraError::from(DomainError::validation(format!("unsupported theme: {raw}")))
            })
        })
        .transpose()
}

async fn watch(state: &Arc<AppState>) -> Result<serde_json::Value, String> {
    let started = spawn_timer_driver(state)
        .map_err(|error| state.command_error("timer_watch", &error))?;
    if started {
        let period = state.driver().period();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    state.driver().cancel();
                    break;
                }
                _ = tokio::time::sleep(period) => {
                    if !state.driver().is_active() {
                        break;
                    }
                    if let Ok(status) = timer_status_impl(state) {
                        eprintln!("{} {}s left", status.phase, status.time_left);
                    }
                }
            }
        }
    }
    render(state, "timer_status", timer_status_impl(state))
}

async fn execute(state: &Arc<AppState>, command: Commands) -> Result<serde_json::Value, String> {
    match command {
        Commands::Task { command } => match command {
            TaskCommands::Add {
                title,
                priority,
                duration,
            } => render(state, "add_task", add_task_impl(state, title, priority, duration)),
            TaskCommands::List => render(state, "list_tasks", list_tasks_impl(state)),
            TaskCommands::Update {
                id,
                title,
                priority,
                duration,
            } => render(
                state,
                "update_task",
                update_task_impl(state, id, title, priority, duration),
            ),
            TaskCommands::Complete { id } => {
                render(state, "complete_task", complete_task_impl(state, id))
            }
            TaskCommands::Delete { id } => {
                render(state, "delete_task", delete_task_impl(state, id))
            }
        },
        Commands::Timer { command } => match command {
            TimerCommands::Start {
                minutes,
                session_type,
                task,
            } => render(
                state,
                "start_timer",
                start_timer_impl(state, minutes, session_type, task),
            ),
            TimerCommands::Pause => render(state, "pause_timer", pause_timer_impl(state)),
            TimerCommands::Resume => render(state, "resume_timer", resume_timer_impl(state)),
            TimerCommands::Stop => render(state, "stop_timer", stop_timer_impl(state)),
            TimerCommands::Reset => render(state, "reset_timer", reset_timer_impl(state)),
            TimerCommands::Status => render(state, "timer_status", timer_status_impl(state)),
            TimerCommands::Watch => watch(state).await,
        },
        Commands::Distraction { command } => match command {
            DistractionCommands::Record {
                distraction_type,
                description,
            } => render(
                state,
                "record_distraction",
                record_distraction_impl(state, distraction_type, description),
            ),
            DistractionCommands::List { session } => render(
                state,
                "list_distractions",
                list_distractions_impl(state, session),
            ),
        },
        Commands::Summary { date } => render(
            state,
            "generate_daily_summary",
            generate_daily_summary_impl(state, date).await,
        ),
        Commands::Suggest => render(
            state,
            "focus_suggestions",
            focus_suggestions_impl(state).await,
        ),
        Commands::Stats { date } => render(state, "daily_stats", daily_stats_impl(state, date)),
        Commands::Settings { command } => match command {
            SettingsCommands::Show => render(state, "settings", settings_impl(state)),
            SettingsCommands::Set {
                theme,
                notifications,
                sound,
                ai_suggestions,
            } => {
                let result = parse_theme(theme).and_then(|theme| {
                    update_settings_impl(
                        state,
                        SettingsPatch {
                            notifications,
                            sound_enabled: sound,
                            theme,
                            ai_suggestions,
                        },
                    )
                });
                render(state, "update_settings", result)
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                work_start,
                work_end,
                break_minutes,
                focus_minutes,
            } => render(
                state,
                "update_profile",
                update_profile_impl(
                    state,
                    UserPatch {
                        name,
                        work_hours_start: work_start,
                        work_hours_end: work_end,
                        break_duration: break_minutes,
                        focus_session_duration: focus_minutes,
                    },
                ),
            ),
        },
        Commands::Credential { command } => match command {
            CredentialCommands::Set { api_key } => {
                render(state, "set_api_key", set_api_key_impl(state, api_key))
            }
            CredentialCommands::Status => {
                render(state, "credential_status", credential_status_impl(state))
            }
            CredentialCommands::Clear => render(state, "clear_api_key", clear_api_key_impl(state)),
        },
        Commands::Export => render(state, "export_data", export_data_impl(state)),
        Commands::Import { path } => render(state, "import_data", import_data_impl(state, &path)),
        Commands::Wipe { yes } => render(state, "wipe_data", wipe_data_impl(state, yes)),
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(error) => {
                eprintln!("Error: failed to resolve current directory: {error}");
                return ExitCode::FAILURE;
            }
        },
    };

    if let Err(error) = init_logging(&root.join("logs")) {
        eprintln!("Error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    let state = match AppState::new(root) {
        Ok(state) => Arc::new(state),
        Err(error) => {
            tracing::error!(%error, "failed to initialize app state");
            return ExitCode::FAILURE;
        }
    };

    catch_up(&state);
    match execute(&state, cli.command).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("Error: {error}");
                ExitCode::FAILURE
            }
        },
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_timer_start_flags() {
        let cli = Cli::try_parse_from([
            "focusmate", "--root", "/tmp/fm", "timer", "start", "--minutes", "25", "--type",
            "focus", "--task", "7",
        ])
        .expect("parse");
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/fm")));
        match cli.command {
            Commands::Timer {
                command:
                    TimerCommands::Start {
                        minutes,
                        session_type,
                        task,
                    },
            } => {
                assert_eq!(minutes, Some(25));
                assert_eq!(session_type.as_deref(), Some("focus"));
                assert_eq!(task, Some(7));
            }
            _ => panic!("expected timer start"),
        }
    }

    #[test]
    fn wipe_requires_flag_to_confirm() {
        let cli = Cli::try_parse_from(["focusmate", "wipe"]).expect("parse");
        assert!(matches!(cli.command, Commands::Wipe { yes: false }));
    }

    #[test]
    fn theme_parsing_rejects_unknown_values() {
        assert_eq!(parse_theme(Some("dark".to_string())).expect("dark"), Some(Theme::Dark));
        assert!(parse_theme(Some("neon".to_string())).is_err());
        assert_eq!(parse_theme(None).expect("none"), None);
    }
}
