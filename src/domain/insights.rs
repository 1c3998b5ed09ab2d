use crate::domain::models::{
    DailySummary, DetailedAnalysis, Distraction, DistractionType, Session, SessionStatus,
    SessionType, Snapshot, Suggestion, Task,
};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            Self::Morning
        } else if hour < 17 {
            Self::Afternoon
        } else {
            Self::Evening
        }
    }

    pub fn at(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self::from_hour(now.with_timezone(&timezone).hour())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

/// Aggregates for one calendar day, as seen in the user's timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub sessions: Vec<Session>,
    pub completed_tasks: Vec<Task>,
    pub pending_tasks: Vec<Task>,
    pub distractions: Vec<Distraction>,
    pub focus_seconds: u64,
    pub focus_session_count: usize,
    pub break_session_count: usize,
    pub completed_session_count: usize,
    pub distractions_by_type: BTreeMap<DistractionType, usize>,
}

impl DailyStats {
    pub fn collect(snapshot: &Snapshot, date: NaiveDate, timezone: Tz) -> Self {
        let on_date = |time: DateTime<Utc>| time.with_timezone(&timezone).date_naive() == date;

        let sessions = snapshot
            .sessions
            .iter()
            .filter(|session| on_date(session.start_time))
            .cloned()
            .collect::<Vec<_>>();
        let completed_tasks = snapshot
            .tasks
            .iter()
            .filter(|task| task.completed_at.is_some_and(on_date))
            .cloned()
            .collect::<Vec<_>>();
        let pending_tasks = snapshot
            .tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect::<Vec<_>>();
        let distractions = snapshot
            .distractions
            .iter()
            .filter(|distraction| on_date(distraction.timestamp))
            .cloned()
            .collect::<Vec<_>>();

        let focus_seconds = sessions
            .iter()
            .filter(|session| {
                session.session_type == SessionType::Focus
                    && session.status == SessionStatus::Completed
            })
            .map(|session| u64::from(session.actual_duration.unwrap_or(session.duration)))
            .sum();
        let mut distractions_by_type = BTreeMap::new();
        for distraction in &distractions {
            *distractions_by_type
                .entry(distraction.distraction_type)
                .or_insert(0) += 1;
        }

        Self {
            date,
            focus_session_count: sessions
                .iter()
                .filter(|session| session.session_type == SessionType::Focus)
                .count(),
            break_session_count: sessions
                .iter()
                .filter(|session| session.session_type == SessionType::Break)
                .count(),
            completed_session_count: sessions
                .iter()
                .filter(|session| session.status == SessionStatus::Completed)
                .count(),
            sessions,
            completed_tasks,
            pending_tasks,
            distractions,
            focus_seconds,
            distractions_by_type,
        }
    }

    pub fn focus_minutes(&self) -> f64 {
        self.focus_seconds as f64 / 60.0
    }

    pub fn average_focus_minutes(&self) -> f64 {
        let lengths = self
            .sessions
            .iter()
            .filter(|session| session.session_type == SessionType::Focus)
            .map(|session| f64::from(session.actual_duration.unwrap_or(session.duration)))
            .collect::<Vec<_>>();
        if lengths.is_empty() {
            return 0.0;
        }
        lengths.iter().sum::<f64>() / lengths.len() as f64 / 60.0
    }

    /// Percentage of today's workload finished.
    pub fn completion_rate(&self) -> f64 {
        let total = self.completed_tasks.len() + self.pending_tasks.len();
        if total == 0 {
            return 0.0;
        }
        self.completed_tasks.len() as f64 / total as f64 * 100.0
    }

    /// Tasks finished per focused hour.
    pub fn focus_efficiency(&self) -> f64 {
        if self.focus_seconds == 0 {
            return 0.0;
        }
        self.completed_tasks.len() as f64 / (self.focus_seconds as f64 / 3600.0)
    }

    /// Dashboard score: focus 40, tasks 35, distraction-free 25.
    pub fn productivity_score(&self) -> u8 {
        let focus_score = (self.focus_seconds as f64 / 3600.0 * 10.0).min(40.0);
        let task_score = (self.completed_tasks.len() as f64 * 7.0).min(35.0);
        let distraction_penalty = (self.distractions.len() as f64 * 2.5).min(25.0);
        let score = focus_score + task_score + (25.0 - distraction_penalty);
        score.round().clamp(0.0, 100.0) as u8
    }
}

pub fn fallback_score(stats: &DailyStats) -> u8 {
    let raw = stats.completed_tasks.len() as f64 * 15.0 + stats.focus_minutes() * 1.5
        + stats.sessions.len() as f64 * 5.0
        - stats.distractions.len() as f64 * 2.0;
    raw.clamp(40.0, 95.0).round() as u8
}

/// Locally computed summary used whenever the text-generation service is unusable.
pub fn fallback_daily_summary(stats: &DailyStats, generated_at: DateTime<Utc>) -> DailySummary {
    let completed = stats.completed_tasks.len();
    let total = completed + stats.pending_tasks.len();
    let focus_minutes = stats.focus_minutes().round() as u64;
    let completion_rate = stats.completion_rate();
    let distractions = stats.distractions.len();
    let sessions = stats.sessions.len();

    let achievements = vec![
        if completed > 0 {
            format!("Successfully completed {completed} tasks")
        } else {
            "Maintained consistent focus tracking".to_string()
        },
        if stats.focus_seconds > 0 {
            format!("Accumulated {focus_minutes} minutes of focused work time")
        } else {
            "Started your productivity journey".to_string()
        },
        if sessions > 0 {
            format!("Completed {} productive sessions", stats.completed_session_count)
        } else {
            "Engaged with the focus system".to_string()
        },
    ];

    let insights = vec![
        format!(
            "Your task completion rate was {completion_rate:.1}%, {}",
            if completion_rate > 70.0 {
                "showing strong productivity"
            } else {
                "with room for improvement"
            }
        ),
        format!(
            "Focus efficiency: {:.2} tasks completed per hour of focused work",
            stats.focus_efficiency()
        ),
        if distractions > 3 {
            format!(
                "{distractions} distractions occurred, consider a distraction reduction strategy"
            )
        } else {
            "Maintained good focus with minimal distractions".to_string()
        },
        if sessions > 2 {
            "Session history shows consistent engagement".to_string()
        } else {
            "There is room for more regular focus sessions".to_string()
        },
    ];

    let recommendations = vec![
        if completion_rate < 50.0 {
            "Break down larger tasks into smaller, manageable chunks tomorrow".to_string()
        } else {
            "Maintain your current task completion momentum".to_string()
        },
        if distractions > 2 {
            "Identify and eliminate your top distraction sources".to_string()
        } else {
            "Continue your effective distraction management".to_string()
        },
        if focus_minutes < 120 {
            "Aim for longer focus sessions to build concentration stamina".to_string()
        } else {
            "Maintain your strong focus session duration".to_string()
        },
        "Plan your 3 most important tasks the evening before".to_string(),
    ];

    let detailed_analysis = DetailedAnalysis {
        focus_quality: format!(
            "Across {} focus sessions your concentration appears {}",
            stats.focus_session_count,
            if focus_minutes > 90 {
                "strong and sustained"
            } else {
                "to be developing; build longer sessions gradually"
            }
        ),
        task_strategy: format!(
            "Completing {completed} tasks shows {}",
            if completion_rate > 60.0 {
                "effective task management"
            } else {
                "room for better prioritisation and breakdown"
            }
        ),
        distraction_impact: format!(
            "With {distractions} distractions your focus was {}",
            if distractions < 3 {
                "well maintained"
            } else {
                "moderately challenged"
            }
        ),
        time_optimization: format!(
            "{focus_minutes} minutes of focus suggests {}",
            if focus_minutes > 120 {
                "a good time investment"
            } else {
                "an opportunity to increase daily focused work"
            }
        ),
    };

    DailySummary {
        summary: format!(
            "You completed {completed} out of {total} tasks ({completion_rate:.1}% completion rate) \
             and focused for {focus_minutes} minutes across {} focus sessions.",
            stats.focus_session_count
        ),
        achievements,
        insights,
        recommendations,
        detailed_analysis: Some(detailed_analysis),
        score: fallback_score(stats),
        trend_analysis: Some(format!(
            "Today's pattern shows {} with {}",
            if completion_rate > 70.0 {
                "strong task execution"
            } else {
                "developing productivity habits"
            },
            if focus_minutes > 90 {
                "solid focus commitment"
            } else {
                "room to extend focus periods"
            }
        )),
        date: stats.date,
        generated_at,
    }
}

pub fn fallback_suggestions() -> Vec<Suggestion> {
    vec![
        Suggestion {
            title: "Take a 5-minute break".to_string(),
            description: "Step away from your screen to refresh your mind".to_string(),
            action: "Stand up, stretch, or take a short walk".to_string(),
        },
        Suggestion {
            title: "Break down the task".to_string(),
            description: "Divide your current task into smaller, manageable steps".to_string(),
            action: "List 3 specific sub-tasks you can complete in the next hour".to_string(),
        },
        Suggestion {
            title: "Eliminate distractions".to_string(),
            description: "Remove or minimize potential interruptions".to_string(),
            action: "Close unnecessary browser tabs and put your phone in another room"
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;
    use chrono::Duration;
    use proptest::prelude::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 16).expect("valid date")
    }

    fn task(id: u64, completed_at: Option<DateTime<Utc>>) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            priority: Priority::Medium,
            estimated_duration: 30,
            completed: completed_at.is_some(),
            created_at: at("2026-02-16T07:00:00Z"),
            completed_at,
        }
    }

    fn focus_session(id: u64, start: DateTime<Utc>, seconds: u32) -> Session {
        Session {
            id,
            session_type: SessionType::Focus,
            task_id: None,
            duration: seconds,
            status: SessionStatus::Completed,
            start_time: start,
            end_time: Some(start + Duration::seconds(i64::from(seconds))),
            actual_duration: Some(seconds),
            paused_at: None,
            resumed_at: None,
        }
    }

    fn three_tasks_ninety_minutes() -> Snapshot {
        Snapshot {
            tasks: vec![
                task(1, Some(at("2026-02-16T10:00:00Z"))),
                task(2, Some(at("2026-02-16T11:00:00Z"))),
                task(3, Some(at("2026-02-16T12:00:00Z"))),
            ],
            sessions: vec![
                focus_session(10, at("2026-02-16T09:00:00Z"), 45 * 60),
                focus_session(11, at("2026-02-16T13:00:00Z"), 45 * 60),
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn collect_filters_by_local_calendar_date() {
        let mut snapshot = three_tasks_ninety_minutes();
        // 23:30 UTC on the 15th is already the 16th in Tokyo.
        snapshot
            .sessions
            .push(focus_session(12, at("2026-02-15T23:30:00Z"), 600));
        let utc = DailyStats::collect(&snapshot, day(), chrono_tz::UTC);
        let tokyo = DailyStats::collect(&snapshot, day(), chrono_tz::Asia::Tokyo);
        assert_eq!(utc.sessions.len(), 2);
        assert_eq!(tokyo.sessions.len(), 3);
    }

    #[test]
    fn fallback_summary_is_deterministic_for_known_day() {
        let stats = DailyStats::collect(&three_tasks_ninety_minutes(), day(), chrono_tz::UTC);
        assert_eq!(stats.focus_seconds, 90 * 60);
        assert_eq!(stats.completed_tasks.len(), 3);

        let generated_at = at("2026-02-16T18:00:00Z");
        let first = fallback_daily_summary(&stats, generated_at);
        let second = fallback_daily_summary(&stats, generated_at);
        assert_eq!(first, second);
        // 3*15 + 90*1.5 + 2*5 = 190, capped at 95.
        assert_eq!(first.score, 95);
        assert_eq!(first.date, day());
        assert!(first.summary.contains("3 out of 3 tasks"));
        assert!(first.summary.contains("90 minutes"));
    }

    #[test]
    fn fallback_summary_ignores_tasks_completed_on_other_days() {
        let mut snapshot = three_tasks_ninety_minutes();
        snapshot.tasks.push(task(4, Some(at("2026-02-15T16:00:00Z"))));
        snapshot.tasks.push(task(5, None));

        let stats = DailyStats::collect(&snapshot, day(), chrono_tz::UTC);
        assert_eq!(stats.completed_tasks.len(), 3);
        assert_eq!(stats.pending_tasks.len(), 1);
        let summary = fallback_daily_summary(&stats, at("2026-02-16T18:00:00Z"));
        assert!(summary.summary.contains("3 out of 4 tasks"));
    }

    #[test]
    fn empty_day_scores_floor() {
        let stats = DailyStats::collect(&Snapshot::default(), day(), chrono_tz::UTC);
        assert_eq!(fallback_score(&stats), 40);
        assert_eq!(stats.productivity_score(), 25);
        assert_eq!(stats.completion_rate(), 0.0);
    }

    #[test]
    fn productivity_score_weights_components() {
        let stats = DailyStats::collect(&three_tasks_ninety_minutes(), day(), chrono_tz::UTC);
        // 1.5h*10 = 15, 3*7 = 21, 25 - 0 = 25
        assert_eq!(stats.productivity_score(), 61);
    }

    #[test]
    fn time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
    }

    #[test]
    fn fallback_suggestions_are_fixed() {
        let suggestions = fallback_suggestions();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].title, "Take a 5-minute break");
    }

    proptest! {
        #[test]
        fn scores_stay_within_bounds(
            completed in 0usize..30,
            focus_minutes in 0u32..1_000,
            distractions in 0usize..80,
        ) {
            let mut snapshot = Snapshot::default();
            for id in 0..completed {
                snapshot.tasks.push(task(id as u64 + 1, Some(at("2026-02-16T10:00:00Z"))));
            }
            if focus_minutes > 0 {
                snapshot.sessions.push(focus_session(
                    500,
                    at("2026-02-16T00:30:00Z"),
                    focus_minutes * 60,
                ));
            }
            for id in 0..distractions {
                snapshot.distractions.push(Distraction {
                    id: 1_000 + id as u64,
                    distraction_type: DistractionType::Other,
                    description: String::new(),
                    timestamp: at("2026-02-16T12:00:00Z"),
                    session_id: None,
                });
            }
            let stats = DailyStats::collect(&snapshot, day(), chrono_tz::UTC);
            let fallback = fallback_score(&stats);
            prop_assert!((40..=95).contains(&fallback));
            prop_assert!(stats.productivity_score() <= 100);
        }
    }
}
