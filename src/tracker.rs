//! The single owner of goal, stats and flow state.
//!
//! Every goal mutation ends in [`Tracker::on_goals_changed`], so stats and the
//! reminder are never observed stale.

use crate::ai::ReflectionItem;
use crate::chat::{ChatSession, ChatTicket};
use crate::models::{AiReflection, ChatTurn, Goal, GoalStatus, IncompleteReason, NewGoalRequest, UserStats};
use crate::reflection::{validate_reasons, ReflectionFlow};
use crate::reminder::Reminder;
use crate::stats::update_stats;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_START: &str = "09:00";
const DEFAULT_END: &str = "10:00";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("goal title must not be empty")]
    EmptyTitle,

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("goal '{0}' not found")]
    GoalNotFound(String),

    #[error("cannot change status from {from:?} to {to:?}")]
    InvalidTransition { from: GoalStatus, to: GoalStatus },

    #[error("mark at least one of today's goals as 'Not Done' to reflect")]
    NothingToReflect,

    #[error("reflection is not waiting for reasons; open it first")]
    ReflectionNotOpen,

    #[error("a reflection request is already in progress")]
    ReflectionInFlight,

    #[error("missing reason for: {0}")]
    MissingReasons(String),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("a chat request is already in progress")]
    ChatInFlight,

    #[error("response arrived for a request that is no longer current")]
    Superseded,
}

#[derive(Debug, Default)]
pub struct Tracker {
    goals: Vec<Goal>,
    stats: UserStats,
    last_reflection_date: Option<NaiveDate>,
    reminder: Reminder,
    reflection: ReflectionFlow,
    chat: ChatSession,
}

impl Tracker {
    /// Restores persisted slots and recomputes stats once, as a fresh page load would.
    pub fn restore(goals: Vec<Goal>, stats: UserStats, last_reflection_date: Option<NaiveDate>, now: NaiveDateTime) -> Self {
        let mut tracker = Self {
            goals,
            stats,
            last_reflection_date,
            ..Default::default()
        };
        tracker.on_goals_changed(now);
        tracker
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn last_reflection_date(&self) -> Option<NaiveDate> {
        self.last_reflection_date
    }

    pub fn reminder(&self) -> &Reminder {
        &self.reminder
    }

    pub fn reflection(&self) -> &ReflectionFlow {
        &self.reflection
    }

    pub fn chat_history(&self) -> &[ChatTurn] {
        self.chat.history()
    }

    pub fn incomplete_today(&self, today: NaiveDate) -> Vec<&Goal> {
        self.goals
            .iter()
            .filter(|goal| goal.date == today && goal.status == GoalStatus::NotDone)
            .collect()
    }

    pub fn add_goal(&mut self, request: NewGoalRequest, now: NaiveDateTime) -> Result<Goal, TrackerError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(TrackerError::EmptyTitle);
        }
        let start_time = parse_time(request.start_time.as_deref().unwrap_or(DEFAULT_START))?;
        let end_time = parse_time(request.end_time.as_deref().unwrap_or(DEFAULT_END))?;

        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            category: request.category,
            start_time,
            end_time,
            status: GoalStatus::InProgress,
            date: now.date(),
            reason: None,
        };
        self.goals.push(goal.clone());
        self.on_goals_changed(now);
        Ok(goal)
    }

    pub fn set_status(&mut self, id: &str, status: GoalStatus, now: NaiveDateTime) -> Result<Goal, TrackerError> {
        let goal = self
            .goals
            .iter_mut()
            .find(|goal| goal.id == id)
            .ok_or_else(|| TrackerError::GoalNotFound(id.to_string()))?;

        if !goal.status.can_transition_to(status) {
            return Err(TrackerError::InvalidTransition {
                from: goal.status,
                to: status,
            });
        }
        goal.status = status;
        let updated = goal.clone();
        self.on_goals_changed(now);
        Ok(updated)
    }

    pub fn delete_goal(&mut self, id: &str, now: NaiveDateTime) -> Result<Goal, TrackerError> {
        let index = self
            .goals
            .iter()
            .position(|goal| goal.id == id)
            .ok_or_else(|| TrackerError::GoalNotFound(id.to_string()))?;
        let removed = self.goals.remove(index);
        self.on_goals_changed(now);
        Ok(removed)
    }

    fn on_goals_changed(&mut self, now: NaiveDateTime) {
        self.stats = update_stats(&self.goals, &self.stats, now.date());
        self.check_reminder(now);
    }

    pub fn check_reminder(&mut self, now: NaiveDateTime) -> bool {
        self.reminder
            .evaluate(now, self.last_reflection_date, &self.goals);
        self.reminder.is_visible()
    }

    pub fn dismiss_reminder(&mut self) {
        self.reminder.hide();
    }

    pub fn open_reflection(&mut self, today: NaiveDate) -> Result<Vec<Goal>, TrackerError> {
        let incomplete: Vec<Goal> = self.incomplete_today(today).into_iter().cloned().collect();
        if incomplete.is_empty() {
            return Err(TrackerError::NothingToReflect);
        }
        self.reflection.open();
        self.reminder.hide();
        Ok(incomplete)
    }

    /// Validates reasons and hands out a ticket for the AI call. Goals are left untouched.
    pub fn begin_reflection(
        &mut self,
        reasons: &BTreeMap<String, IncompleteReason>,
        today: NaiveDate,
    ) -> Result<(u64, Vec<ReflectionItem>), TrackerError> {
        let incomplete = self.incomplete_today(today);
        validate_reasons(&incomplete, reasons)?;
        let items = incomplete
            .iter()
            .map(|goal| ReflectionItem {
                title: goal.title.clone(),
                category: goal.category,
                reason: reasons.get(&goal.id).copied(),
            })
            .collect();

        let ticket = self.reflection.begin()?;
        Ok((ticket, items))
    }

    /// Stores the feedback and, only now, records the submitted reasons on the goals.
    pub fn complete_reflection(
        &mut self,
        ticket: u64,
        reflection: AiReflection,
        reasons: &BTreeMap<String, IncompleteReason>,
        now: NaiveDateTime,
    ) -> Result<(), TrackerError> {
        self.reflection.complete(ticket, reflection)?;

        let today = now.date();
        for goal in self
            .goals
            .iter_mut()
            .filter(|goal| goal.date == today && goal.status == GoalStatus::NotDone)
        {
            if let Some(reason) = reasons.get(&goal.id) {
                goal.reason = Some(*reason);
            }
        }
        self.on_goals_changed(now);
        Ok(())
    }

    pub fn fail_reflection(&mut self, ticket: u64) -> bool {
        self.reflection.fail(ticket)
    }

    /// Records today as reflected only when feedback had arrived.
    pub fn close_reflection(&mut self, now: NaiveDateTime) -> bool {
        let recorded = self.reflection.close();
        if recorded {
            self.last_reflection_date = Some(now.date());
        }
        self.check_reminder(now);
        recorded
    }

    pub fn begin_chat(&mut self, query: &str) -> Result<ChatTicket, TrackerError> {
        self.chat.begin(query)
    }

    pub fn finish_chat(&mut self, ticket: u64, reply: Option<String>) -> Result<ChatTurn, TrackerError> {
        self.chat.finish(ticket, reply)
    }
}

fn parse_time(value: &str) -> Result<String, TrackerError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| TrackerError::InvalidTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Badge, GoalCategory};
    use crate::reflection::ReflectionPhase;
    use chrono::Duration;

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 12)
            .unwrap()
            .and_hms_opt(20, 30, 0)
            .unwrap()
    }

    fn request(title: &str) -> NewGoalRequest {
        NewGoalRequest {
            title: title.to_string(),
            category: GoalCategory::Exercise,
            start_time: None,
            end_time: None,
        }
    }

    #[test]
    fn add_goal_trims_title_and_applies_defaults() {
        let mut tracker = Tracker::default();
        let goal = tracker.add_goal(request("  Stretch  "), evening()).unwrap();
        assert_eq!(goal.title, "Stretch");
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert_eq!((goal.start_time.as_str(), goal.end_time.as_str()), ("09:00", "10:00"));
        assert_eq!(goal.date, evening().date());

        assert!(matches!(tracker.add_goal(request("   "), evening()), Err(TrackerError::EmptyTitle)));
        let mut bad = request("Swim");
        bad.start_time = Some("25:00".into());
        assert!(matches!(tracker.add_goal(bad, evening()), Err(TrackerError::InvalidTime(_))));
        assert_eq!(tracker.goals().len(), 1);
    }

    #[test]
    fn status_change_recomputes_stats_immediately() {
        let now = evening();
        let mut tracker = Tracker::restore(
            Vec::new(),
            UserStats {
                streak: 2,
                last_completed_date: Some(now.date() - Duration::days(1)),
                ..Default::default()
            },
            None,
            now,
        );
        let goal = tracker.add_goal(request("Run 5k"), now).unwrap();
        tracker.set_status(&goal.id, GoalStatus::Done, now).unwrap();

        assert_eq!(tracker.stats().streak, 3);
        assert!(tracker.stats().badges.contains(&Badge::StreakStarter));
        assert!(tracker.stats().badges.contains(&Badge::PerfectDay));

        let err = tracker.set_status(&goal.id, GoalStatus::NotDone, now).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
    }

    #[test]
    fn deleting_goals_keeps_badges() {
        let now = evening();
        let mut tracker = Tracker::default();
        let goal = tracker.add_goal(request("Push-ups"), now).unwrap();
        tracker.set_status(&goal.id, GoalStatus::Done, now).unwrap();
        tracker.delete_goal(&goal.id, now).unwrap();

        assert!(tracker.goals().is_empty());
        assert!(tracker.stats().badges.contains(&Badge::PerfectDay));
        assert!(matches!(tracker.delete_goal(&goal.id, now), Err(TrackerError::GoalNotFound(_))));
    }

    #[test]
    fn not_done_goal_in_the_evening_raises_reminder() {
        let now = evening();
        let mut tracker = Tracker::default();
        let goal = tracker.add_goal(request("Yoga"), now).unwrap();
        assert!(!tracker.reminder().is_visible());

        tracker.set_status(&goal.id, GoalStatus::NotDone, now).unwrap();
        assert!(tracker.reminder().is_visible());

        tracker.open_reflection(now.date()).unwrap();
        assert!(!tracker.reminder().is_visible());
    }

    #[test]
    fn reflection_date_recorded_only_after_feedback_and_close() {
        let now = evening();
        let mut tracker = Tracker::default();
        let goal = tracker.add_goal(request("Climb"), now).unwrap();
        tracker.set_status(&goal.id, GoalStatus::NotDone, now).unwrap();

        tracker.open_reflection(now.date()).unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert(goal.id.clone(), IncompleteReason::Time);

        let (ticket, items) = tracker.begin_reflection(&reasons, now.date()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].reason, Some(IncompleteReason::Time));
        assert!(tracker.fail_reflection(ticket));
        assert_eq!(tracker.reflection().phase(), &ReflectionPhase::Collecting);
        assert_eq!(tracker.last_reflection_date(), None);
        assert_eq!(tracker.goals()[0].reason, None);

        let (ticket, _) = tracker.begin_reflection(&reasons, now.date()).unwrap();
        tracker
            .complete_reflection(
                ticket,
                AiReflection {
                    motivational_tip: "Rest counts too.".into(),
                    youtube_links: Vec::new(),
                    article_links: Vec::new(),
                },
                &reasons,
                now,
            )
            .unwrap();
        assert_eq!(tracker.goals()[0].reason, Some(IncompleteReason::Time));
        assert_eq!(tracker.last_reflection_date(), None);

        assert!(tracker.close_reflection(now));
        assert_eq!(tracker.last_reflection_date(), Some(now.date()));
        assert!(!tracker.check_reminder(now));
    }

    #[test]
    fn reflection_needs_an_incomplete_goal() {
        let now = evening();
        let mut tracker = Tracker::default();
        tracker.add_goal(request("Read"), now).unwrap();
        assert!(matches!(tracker.open_reflection(now.date()), Err(TrackerError::NothingToReflect)));
    }
}
