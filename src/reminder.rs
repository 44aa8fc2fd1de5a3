use crate::models::{Goal, GoalStatus};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::time::Duration;

/// Local hour from which the end-of-day reminder may appear.
pub const REMINDER_HOUR: u32 = 20;
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReminderState {
    #[default]
    Hidden,
    Shown,
}

#[derive(Debug, Default)]
pub struct Reminder {
    state: ReminderState,
    shown_on: Option<NaiveDate>,
}

impl Reminder {
    pub fn state(&self) -> ReminderState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == ReminderState::Shown
    }

    /// Moves Hidden to Shown. Within a day hiding is an explicit action, but a
    /// reminder shown on an earlier day lapses at midnight.
    pub fn evaluate(&mut self, now: NaiveDateTime, last_reflection: Option<NaiveDate>, goals: &[Goal]) -> ReminderState {
        if self.shown_on != Some(now.date()) {
            self.hide();
        }
        if should_remind(now, last_reflection, goals) {
            self.state = ReminderState::Shown;
            self.shown_on = Some(now.date());
        }
        self.state
    }

    pub fn hide(&mut self) {
        self.state = ReminderState::Hidden;
        self.shown_on = None;
    }
}

pub fn should_remind(now: NaiveDateTime, last_reflection: Option<NaiveDate>, goals: &[Goal]) -> bool {
    let today = now.date();
    now.hour() >= REMINDER_HOUR
        && last_reflection != Some(today)
        && goals
            .iter()
            .any(|goal| goal.date == today && goal.status == GoalStatus::NotDone)
}
