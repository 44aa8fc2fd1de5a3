use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalCategory {
    Learning,
    Exercise,
    #[serde(rename = "Team Work")]
    TeamWork,
    #[serde(rename = "Personal Growth")]
    PersonalGrowth,
}

impl GoalCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Learning => "Learning",
            Self::Exercise => "Exercise",
            Self::TeamWork => "Team Work",
            Self::PersonalGrowth => "Personal Growth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    #[serde(rename = "Not Done")]
    NotDone,
}

impl GoalStatus {
    /// Done is terminal; the other two states can move to each other or to Done.
    pub fn can_transition_to(self, next: GoalStatus) -> bool {
        match self {
            Self::InProgress => matches!(next, Self::Done | Self::NotDone),
            Self::NotDone => matches!(next, Self::InProgress | Self::Done),
            Self::Done => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncompleteReason {
    Time,
    Difficulty,
    Distraction,
    Other,
}

impl IncompleteReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Time => "Time",
            Self::Difficulty => "Difficulty",
            Self::Distraction => "Distraction",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    pub start_time: String,
    pub end_time: String,
    pub status: GoalStatus,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<IncompleteReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "Weekly Warrior")]
    WeeklyWarrior,
    #[serde(rename = "Perfect Day")]
    PerfectDay,
    #[serde(rename = "Streak Starter")]
    StreakStarter,
    #[serde(rename = "Goal Getter")]
    GoalGetter,
    #[serde(rename = "High Achiever")]
    HighAchiever,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserStats {
    pub streak: u32,
    pub badges: BTreeSet<Badge>,
    pub last_completed_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiLink {
    pub title: String,
    pub url: String,
}

/// Reflection payload exactly as the model is asked to return it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReflection {
    pub motivational_tip: String,
    #[serde(default)]
    pub youtube_links: Vec<AiLink>,
    #[serde(default)]
    pub article_links: Vec<AiLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NewGoalRequest {
    pub title: String,
    pub category: GoalCategory,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: GoalStatus,
}

#[derive(Debug, Deserialize)]
pub struct ReflectionRequest {
    pub reasons: BTreeMap<String, IncompleteReason>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub goals: Vec<Goal>,
    pub done_count: usize,
    pub total_count: usize,
    pub progress_percent: u32,
    pub reflect_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyPoint {
    pub name: String,
    pub date: NaiveDate,
    pub achieved: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub days: Vec<WeeklyPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderResponse {
    pub visible: bool,
    pub last_reflection_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReflectionOpenResponse {
    pub incomplete_goals: Vec<Goal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReflectionCloseResponse {
    pub recorded: bool,
    pub last_reflection_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: ChatTurn,
    pub history: Vec<ChatTurn>,
}
