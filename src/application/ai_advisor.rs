use crate::domain::insights::{fallback_daily_summary, fallback_suggestions, DailyStats, TimeOfDay};
use crate::domain::models::{DailySummary, DetailedAnalysis, Distraction, Suggestion};
use crate::infrastructure::config::AiConfig;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::{GenerationError, Notice};
use crate::infrastructure::text_generation_client::{
    ChatMessage, CompletionRequest, TextGenerationClient,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const API_KEY_ENV: &str = "FOCUSMATE_API_KEY";
const RECENT_DISTRACTIONS: usize = 5;
const GENERAL_TASK: &str = "general productivity";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a productivity analyst. Reply with one JSON object \
only, matching the requested shape. Be specific, encouraging and grounded in the numbers given.";
const SUGGESTION_SYSTEM_PROMPT: &str =
    "You are a productivity coach. Reply with concise, actionable focus suggestions as JSON only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Generated,
    Fallback,
    /// AI suggestions are switched off in settings.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryOutcome {
    pub summary: DailySummary,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionOutcome {
    pub suggestions: Vec<Suggestion>,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSummary {
    summary: String,
    #[serde(default)]
    achievements: Vec<String>,
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    detailed_analysis: Option<DetailedAnalysis>,
    score: f64,
    #[serde(default)]
    trend_analysis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSuggestions {
    suggestions: Vec<Suggestion>,
}

/// Front for the text-generation service that always yields a usable result.
pub struct AiAdvisor {
    client: Arc<dyn TextGenerationClient>,
    credentials: Arc<dyn CredentialStore>,
    config: AiConfig,
    env_api_key: Option<String>,
}

impl AiAdvisor {
    pub fn new(
        client: Arc<dyn TextGenerationClient>,
        credentials: Arc<dyn CredentialStore>,
        config: AiConfig,
    ) -> Self {
        let env_api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self {
            client,
            credentials,
            config,
            env_api_key,
        }
    }

    pub fn with_env_api_key(mut self, api_key: Option<String>) -> Self {
        self.env_api_key = api_key.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn has_env_api_key(&self) -> bool {
        self.env_api_key.is_some()
    }

    fn api_key(&self) -> Result<String, GenerationError> {
        if let Some(api_key) = &self.env_api_key {
            return Ok(api_key.clone());
        }
        self.credentials
            .load_api_key()
            .map_err(|error| GenerationError::Credential(error.to_string()))?
            .ok_or(GenerationError::MissingCredential)
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: String,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            max_tokens,
            temperature: self.config.temperature,
        };
        self.client.complete(&api_key, &request).await
    }

    pub async fn daily_summary(
        &self,
        stats: &DailyStats,
        time_of_day: TimeOfDay,
        generated_at: DateTime<Utc>,
    ) -> SummaryOutcome {
        let generated = self
            .complete(
                SUMMARY_SYSTEM_PROMPT,
                summary_prompt(stats, time_of_day),
                self.config.summary_max_tokens,
            )
            .await
            .and_then(|content| parse_summary(&content, stats, generated_at));
        match generated {
            Ok(summary) => SummaryOutcome {
                summary,
                source: ResultSource::Generated,
                notice: None,
            },
            Err(error) => {
                tracing::warn!(
                    kind = ?error.kind(),
                    %error,
                    "daily summary generation failed; using local summary"
                );
                SummaryOutcome {
                    summary: fallback_daily_summary(stats, generated_at),
                    source: ResultSource::Fallback,
                    notice: Some(error.notice()),
                }
            }
        }
    }

    pub async fn focus_suggestions(
        &self,
        current_task: Option<&str>,
        distractions: &[Distraction],
        time_of_day: TimeOfDay,
    ) -> SuggestionOutcome {
        let recent = &distractions[distractions.len().saturating_sub(RECENT_DISTRACTIONS)..];
        let generated = self
            .complete(
                SUGGESTION_SYSTEM_PROMPT,
                suggestion_prompt(current_task.unwrap_or(GENERAL_TASK), recent, time_of_day),
                self.config.suggestion_max_tokens,
            )
            .await
            .and_then(|content| parse_suggestions(&content));
        match generated {
            Ok(suggestions) => SuggestionOutcome {
                suggestions,
                source: ResultSource::Generated,
                notice: None,
            },
            Err(error) => {
                tracing::warn!(
                    kind = ?error.kind(),
                    %error,
                    "focus suggestions failed; using defaults"
                );
                SuggestionOutcome {
                    suggestions: fallback_suggestions(),
                    source: ResultSource::Fallback,
                    notice: Some(error.notice()),
                }
            }
        }
    }
}

fn quoted_titles<'a>(titles: impl Iterator<Item = &'a str>) -> String {
    let joined = titles
        .map(|title| format!("\"{title}\""))
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

fn summary_prompt(stats: &DailyStats, time_of_day: TimeOfDay) -> String {
    let total_tasks = stats.completed_tasks.len() + stats.pending_tasks.len();
    let breakdown = stats
        .distractions_by_type
        .iter()
        .map(|(kind, count)| format!("{}: {count}", kind.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let distraction_rate = if stats.focus_seconds > 0 {
        stats.distractions.len() as f64 / (stats.focus_seconds as f64 / 3600.0)
    } else {
        0.0
    };
    format!(
        "Summarize this productivity day ({date}).\n\
         Sessions: {focus} focus, {breaks} break; {focus_minutes} focused minutes; \
         average focus session {average} minutes; analysed in the {time_of_day}.\n\
         Tasks: {completed} of {total_tasks} completed ({rate:.1}%), {efficiency:.2} tasks per focused hour.\n\
         Completed: {completed_titles}\nPending: {pending_titles}\n\
         Distractions: {distraction_count} ({breakdown}), {distraction_rate:.2} per focused hour.\n\
         Respond as JSON: {{\"summary\": string, \"achievements\": [string], \"insights\": [string], \
         \"recommendations\": [string], \"detailedAnalysis\": {{\"focusQuality\": string, \
         \"taskStrategy\": string, \"distractionImpact\": string, \"timeOptimization\": string}}, \
         \"score\": number 0-100, \"trendAnalysis\": string}}",
        date = stats.date,
        focus = stats.focus_session_count,
        breaks = stats.break_session_count,
        focus_minutes = stats.focus_minutes().round(),
        average = stats.average_focus_minutes().round(),
        time_of_day = time_of_day.as_str(),
        completed = stats.completed_tasks.len(),
        rate = stats.completion_rate(),
        efficiency = stats.focus_efficiency(),
        completed_titles =
            quoted_titles(stats.completed_tasks.iter().map(|task| task.title.as_str())),
        pending_titles =
            quoted_titles(stats.pending_tasks.iter().map(|task| task.title.as_str())),
        distraction_count = stats.distractions.len(),
        breakdown = if breakdown.is_empty() { "None".to_string() } else { breakdown },
    )
}

fn suggestion_prompt(task: &str, recent: &[Distraction], time_of_day: TimeOfDay) -> String {
    let recent_types = recent
        .iter()
        .map(|distraction| distraction.distraction_type.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Give 3 focus suggestions for someone working on \"{task}\".\n\
         Time of day: {time_of_day}. Recent distractions: {recent}.\n\
         Respond as JSON: {{\"suggestions\": [{{\"title\": string, \"description\": string, \"action\": string}}]}}",
        time_of_day = time_of_day.as_str(),
        recent = if recent_types.is_empty() { "None".to_string() } else { recent_types },
    )
}

/// Strips an optional Markdown code fence around a JSON answer.
pub fn strip_json_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_summary(
    content: &str,
    stats: &DailyStats,
    generated_at: DateTime<Utc>,
) -> Result<DailySummary, GenerationError> {
    let generated = serde_json::from_str::<GeneratedSummary>(strip_json_fence(content))
        .map_err(|error| GenerationError::MalformedResponse(error.to_string()))?;
    if generated.summary.trim().is_empty() {
        return Err(GenerationError::MalformedResponse(
            "summary text is empty".to_string(),
        ));
    }
    if !generated.score.is_finite() {
        return Err(GenerationError::MalformedResponse(
            "score is not a number".to_string(),
        ));
    }
    Ok(DailySummary {
        summary: generated.summary,
        achievements: generated.achievements,
        insights: generated.insights,
        recommendations: generated.recommendations,
        detailed_analysis: generated.detailed_analysis,
        score: generated.score.round().clamp(0.0, 100.0) as u8,
        trend_analysis: generated.trend_analysis,
        date: stats.date,
        generated_at,
    })
}

fn parse_suggestions(content: &str) -> Result<Vec<Suggestion>, GenerationError> {
    let generated = serde_json::from_str::<GeneratedSuggestions>(strip_json_fence(content))
        .map_err(|error| GenerationError::MalformedResponse(error.to_string()))?;
    if generated.suggestions.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "no suggestions returned".to_string(),
        ));
    }
    Ok(generated.suggestions)
}
