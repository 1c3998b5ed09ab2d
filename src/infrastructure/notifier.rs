use crate::domain::models::{Session, SessionType};
use crate::infrastructure::error::InfraError;
use std::io::Write;

/// Side effects fired when a countdown reaches zero. Both are best-effort.
pub trait CompletionNotifier: Send + Sync {
    fn play_sound(&self) -> Result<(), InfraError>;
    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl CompletionNotifier for TerminalNotifier {
    fn play_sound(&self) -> Result<(), InfraError> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "[{title}] {body}")?;
        Ok(())
    }
}

pub fn completion_message(session: &Session) -> (String, String) {
    let minutes = session.actual_duration.unwrap_or(session.duration) / 60;
    let title = format!("{} session complete", capitalized(session.session_type.as_str()));
    let body = match session.session_type {
        SessionType::Focus => {
            format!("Great work! {minutes} minutes of focus. Time for a break.")
        }
        SessionType::Break => {
            "Break is over. Ready to focus again?".to_string()
        }
    };
    (title, body)
}

fn capitalized(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SessionStatus;
    use chrono::{DateTime, Utc};

    #[test]
    fn focus_completion_message_mentions_minutes() {
        let start = DateTime::parse_from_rfc3339("2026-02-16T09:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        let session = Session {
            id: 1,
            session_type: SessionType::Focus,
            task_id: None,
            duration: 1500,
            status: SessionStatus::Completed,
            start_time: start,
            end_time: Some(start),
            actual_duration: Some(1500),
            paused_at: None,
            resumed_at: None,
        };
        let (title, body) = completion_message(&session);
        assert_eq!(title, "Focus session complete");
        assert!(body.contains("25 minutes"));
    }
}
