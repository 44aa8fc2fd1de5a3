use crate::models::{Badge, Goal, GoalStatus, TodayResponse, UserStats, WeeklyPoint, WeeklyReport};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

const STREAK_STARTER_DAYS: u32 = 3;
const GOAL_GETTER_TOTAL: usize = 10;
const HIGH_ACHIEVER_DAILY: usize = 5;
const WEEKLY_WARRIOR_RATIO: f64 = 0.7;
const WEEK_DAYS: i64 = 7;

/// Recomputes streak and badges from the goal list and the previous stats.
///
/// The streak carries state that cannot be rebuilt from goals alone, so the
/// previous value is an input. Badges already earned are always kept.
pub fn update_stats(goals: &[Goal], previous: &UserStats, today: NaiveDate) -> UserStats {
    let yesterday = today - Duration::days(1);

    let todays: Vec<&Goal> = goals.iter().filter(|goal| goal.date == today).collect();
    let done_today = todays.iter().filter(|goal| is_done(goal)).count();
    let any_done_today = done_today > 0;

    let streak = if !any_done_today || previous.last_completed_date == Some(today) {
        previous.streak
    } else if previous.last_completed_date == Some(yesterday) {
        previous.streak.saturating_add(1)
    } else {
        1
    };

    let mut badges = previous.badges.clone();
    if streak >= STREAK_STARTER_DAYS {
        badges.insert(Badge::StreakStarter);
    }
    if !todays.is_empty() && done_today == todays.len() {
        badges.insert(Badge::PerfectDay);
    }
    if goals.iter().filter(|goal| is_done(goal)).count() >= GOAL_GETTER_TOTAL {
        badges.insert(Badge::GoalGetter);
    }
    if done_today >= HIGH_ACHIEVER_DAILY {
        badges.insert(Badge::HighAchiever);
    }
    if let Some(ratio) = weekly_done_ratio(goals, today) {
        if ratio >= WEEKLY_WARRIOR_RATIO {
            badges.insert(Badge::WeeklyWarrior);
        }
    }

    UserStats {
        streak,
        badges,
        last_completed_date: if any_done_today {
            Some(today)
        } else {
            previous.last_completed_date
        },
    }
}

/// Done fraction over the trailing week, `None` when the window holds no goals.
fn weekly_done_ratio(goals: &[Goal], today: NaiveDate) -> Option<f64> {
    let window_start = today - Duration::days(WEEK_DAYS - 1);
    let (done, total) = goals
        .iter()
        .filter(|goal| goal.date >= window_start && goal.date <= today)
        .fold((0usize, 0usize), |(done, total), goal| {
            (done + usize::from(is_done(goal)), total + 1)
        });

    if total == 0 {
        None
    } else {
        Some(done as f64 / total as f64)
    }
}

pub fn build_today(goals: &[Goal], today: NaiveDate) -> TodayResponse {
    let todays: Vec<Goal> = goals
        .iter()
        .filter(|goal| goal.date == today)
        .cloned()
        .collect();
    let done_count = todays.iter().filter(|goal| is_done(goal)).count();
    let total_count = todays.len();

    TodayResponse {
        date: today,
        reflect_enabled: reflect_enabled(goals, today),
        progress_percent: progress_percent(done_count, total_count),
        done_count,
        total_count,
        goals: todays,
    }
}

/// Whole-number share of today's goals that are done, truncated toward zero.
pub fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done * 100 / total) as u32
}

pub fn reflect_enabled(goals: &[Goal], today: NaiveDate) -> bool {
    goals
        .iter()
        .any(|goal| goal.date == today && goal.status == GoalStatus::NotDone)
}

pub fn build_weekly_report(goals: &[Goal], today: NaiveDate) -> WeeklyReport {
    let mut days = Vec::with_capacity(WEEK_DAYS as usize);
    for offset in (0..WEEK_DAYS).rev() {
        let date = today - Duration::days(offset);
        let (achieved, total) = goals
            .iter()
            .filter(|goal| goal.date == date)
            .fold((0usize, 0usize), |(achieved, total), goal| {
                (achieved + usize::from(is_done(goal)), total + 1)
            });

        days.push(WeeklyPoint {
            name: day_label(date.weekday()).to_string(),
            date,
            achieved,
            total,
            percentage: if total > 0 {
                achieved as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        });
    }

    WeeklyReport { days }
}

fn day_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

fn is_done(goal: &Goal) -> bool {
    goal.status == GoalStatus::Done
}
