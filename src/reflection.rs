use crate::models::{AiReflection, Goal, IncompleteReason};
use crate::tracker::TrackerError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReflectionPhase {
    #[default]
    Closed,
    Collecting,
    Loading,
    Ready(AiReflection),
}

/// End-of-day reflection flow.
///
/// Every open and close bumps the generation, so a ticket handed out by
/// [`ReflectionFlow::begin`] only applies to the flow instance it came from.
#[derive(Debug, Default)]
pub struct ReflectionFlow {
    phase: ReflectionPhase,
    generation: u64,
}

impl ReflectionFlow {
    pub fn phase(&self) -> &ReflectionPhase {
        &self.phase
    }

    pub fn open(&mut self) {
        self.generation += 1;
        self.phase = ReflectionPhase::Collecting;
    }

    pub fn begin(&mut self) -> Result<u64, TrackerError> {
        match self.phase {
            ReflectionPhase::Collecting => {
                self.phase = ReflectionPhase::Loading;
                Ok(self.generation)
            }
            ReflectionPhase::Loading => Err(TrackerError::ReflectionInFlight),
            ReflectionPhase::Closed | ReflectionPhase::Ready(_) => Err(TrackerError::ReflectionNotOpen),
        }
    }

    pub fn complete(&mut self, ticket: u64, reflection: AiReflection) -> Result<(), TrackerError> {
        if !self.is_pending(ticket) {
            return Err(TrackerError::Superseded);
        }
        self.phase = ReflectionPhase::Ready(reflection);
        Ok(())
    }

    /// Rolls a failed request back to reason collection. Stale tickets are ignored.
    pub fn fail(&mut self, ticket: u64) -> bool {
        if !self.is_pending(ticket) {
            return false;
        }
        self.phase = ReflectionPhase::Collecting;
        true
    }

    /// Returns whether the flow had received feedback before closing.
    pub fn close(&mut self) -> bool {
        let had_result = matches!(self.phase, ReflectionPhase::Ready(_));
        self.generation += 1;
        self.phase = ReflectionPhase::Closed;
        had_result
    }

    fn is_pending(&self, ticket: u64) -> bool {
        ticket == self.generation && self.phase == ReflectionPhase::Loading
    }
}

pub fn validate_reasons(
    incomplete: &[&Goal],
    reasons: &BTreeMap<String, IncompleteReason>,
) -> Result<(), TrackerError> {
    let missing: Vec<&str> = incomplete
        .iter()
        .filter(|goal| !reasons.contains_key(&goal.id))
        .map(|goal| goal.title.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrackerError::MissingReasons(missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalCategory, GoalStatus};
    use chrono::NaiveDate;

    fn reflection() -> AiReflection {
        AiReflection {
            motivational_tip: "Tomorrow is a fresh start.".into(),
            youtube_links: Vec::new(),
            article_links: Vec::new(),
        }
    }

    #[test]
    fn happy_path_records_result_on_close() {
        let mut flow = ReflectionFlow::default();
        flow.open();
        let ticket = flow.begin().unwrap();
        assert_eq!(flow.phase(), &ReflectionPhase::Loading);

        flow.complete(ticket, reflection()).unwrap();
        assert!(matches!(flow.phase(), ReflectionPhase::Ready(_)));
        assert!(flow.close());
        assert_eq!(flow.phase(), &ReflectionPhase::Closed);
    }

    #[test]
    fn failure_returns_to_collecting_and_close_records_nothing() {
        let mut flow = ReflectionFlow::default();
        flow.open();
        let ticket = flow.begin().unwrap();
        assert!(flow.fail(ticket));
        assert_eq!(flow.phase(), &ReflectionPhase::Collecting);
        assert!(!flow.close());
    }

    #[test]
    fn second_submission_while_loading_is_rejected() {
        let mut flow = ReflectionFlow::default();
        assert!(matches!(flow.begin(), Err(TrackerError::ReflectionNotOpen)));
        flow.open();
        flow.begin().unwrap();
        assert!(matches!(flow.begin(), Err(TrackerError::ReflectionInFlight)));
    }

    #[test]
    fn late_response_after_reopen_is_discarded() {
        let mut flow = ReflectionFlow::default();
        flow.open();
        let stale = flow.begin().unwrap();
        flow.close();
        flow.open();

        assert!(matches!(flow.complete(stale, reflection()), Err(TrackerError::Superseded)));
        assert!(!flow.fail(stale));
        assert_eq!(flow.phase(), &ReflectionPhase::Collecting);
    }

    #[test]
    fn every_incomplete_goal_needs_a_reason() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let make = |id: &str, title: &str| Goal {
            id: id.into(),
            title: title.into(),
            category: GoalCategory::Learning,
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            status: GoalStatus::NotDone,
            date,
            reason: None,
        };
        let a = make("a", "Flashcards");
        let b = make("b", "Essay draft");
        let incomplete = vec![&a, &b];

        let mut reasons = BTreeMap::new();
        reasons.insert("a".to_string(), IncompleteReason::Time);
        let err = validate_reasons(&incomplete, &reasons).unwrap_err();
        assert!(matches!(err, TrackerError::MissingReasons(ref titles) if titles == "Essay draft"));

        reasons.insert("b".to_string(), IncompleteReason::Other);
        assert!(validate_reasons(&incomplete, &reasons).is_ok());
    }
}
