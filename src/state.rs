use crate::ai::Assistant;
use crate::errors::AppError;
use crate::models::{
    AiReflection, ChatResponse, Goal, GoalStatus, IncompleteReason, NewGoalRequest, ReflectionCloseResponse,
    ReminderResponse,
};
use crate::reminder::POLL_INTERVAL;
use crate::storage::{load_slot, persist_slot, GOALS_SLOT, REFLECTION_SLOT, STATS_SLOT};
use crate::tracker::Tracker;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub tracker: Arc<Mutex<Tracker>>,
    pub assistant: Arc<dyn Assistant>,
}

impl AppState {
    pub fn new(data_dir: PathBuf, tracker: Tracker, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            data_dir,
            tracker: Arc::new(Mutex::new(tracker)),
            assistant,
        }
    }

    /// Reads the three slots and writes back the recomputed stats.
    pub async fn load(data_dir: PathBuf, assistant: Arc<dyn Assistant>) -> Result<Self, AppError> {
        let goals: Vec<Goal> = load_slot(&data_dir, GOALS_SLOT).await;
        let stats = load_slot(&data_dir, STATS_SLOT).await;
        let last_reflection = load_slot(&data_dir, REFLECTION_SLOT).await;

        info!(goals = goals.len(), "restored goal store");
        let tracker = Tracker::restore(goals, stats, last_reflection, now());
        persist_slot(&data_dir, STATS_SLOT, tracker.stats()).await?;

        Ok(Self::new(data_dir, tracker, assistant))
    }

    pub async fn add_goal(&self, request: NewGoalRequest, at: NaiveDateTime) -> Result<Goal, AppError> {
        let mut tracker = self.tracker.lock().await;
        let goal = tracker.add_goal(request, at)?;
        self.persist_goals(&tracker).await?;
        info!(id = %goal.id, category = goal.category.label(), "goal added");
        Ok(goal)
    }

    pub async fn set_status(&self, id: &str, status: GoalStatus, at: NaiveDateTime) -> Result<Goal, AppError> {
        let mut tracker = self.tracker.lock().await;
        let goal = tracker.set_status(id, status, at)?;
        self.persist_goals(&tracker).await?;
        Ok(goal)
    }

    pub async fn delete_goal(&self, id: &str, at: NaiveDateTime) -> Result<Goal, AppError> {
        let mut tracker = self.tracker.lock().await;
        let goal = tracker.delete_goal(id, at)?;
        self.persist_goals(&tracker).await?;
        Ok(goal)
    }

    pub async fn reminder(&self, at: NaiveDateTime) -> ReminderResponse {
        let mut tracker = self.tracker.lock().await;
        let visible = tracker.check_reminder(at);
        ReminderResponse {
            visible,
            last_reflection_date: tracker.last_reflection_date(),
        }
    }

    pub async fn dismiss_reminder(&self) {
        self.tracker.lock().await.dismiss_reminder();
    }

    pub async fn open_reflection(&self, at: NaiveDateTime) -> Result<Vec<Goal>, AppError> {
        Ok(self.tracker.lock().await.open_reflection(at.date())?)
    }

    /// The tracker lock is released while the assistant is working. Goals are only
    /// touched, and persisted, once feedback has arrived.
    pub async fn submit_reflection(
        &self,
        reasons: &BTreeMap<String, IncompleteReason>,
        at: NaiveDateTime,
    ) -> Result<AiReflection, AppError> {
        let (ticket, items) = self.tracker.lock().await.begin_reflection(reasons, at.date())?;
        let mut guard = InFlightGuard::new(&self.tracker, InFlight::Reflection(ticket));

        let result = self.assistant.reflect(&items).await;

        let mut tracker = self.tracker.lock().await;
        guard.disarm();
        match result {
            Ok(reflection) => {
                tracker.complete_reflection(ticket, reflection.clone(), reasons, at)?;
                self.persist_goals(&tracker).await?;
                info!(goals = items.len(), "reflection received");
                Ok(reflection)
            }
            Err(err) => {
                warn!("reflection request failed: {err}");
                tracker.fail_reflection(ticket);
                Err(err.into())
            }
        }
    }

    pub async fn close_reflection(&self, at: NaiveDateTime) -> Result<ReflectionCloseResponse, AppError> {
        let mut tracker = self.tracker.lock().await;
        let recorded = tracker.close_reflection(at);
        if recorded {
            persist_slot(&self.data_dir, REFLECTION_SLOT, &tracker.last_reflection_date()).await?;
        }
        Ok(ReflectionCloseResponse {
            recorded,
            last_reflection_date: tracker.last_reflection_date(),
        })
    }

    pub async fn send_chat(&self, query: &str) -> Result<ChatResponse, AppError> {
        let ticket = self.tracker.lock().await.begin_chat(query)?;
        let mut guard = InFlightGuard::new(&self.tracker, InFlight::Chat(ticket.id));

        let reply = match self.assistant.chat(&ticket.prior, &ticket.query).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("chat request failed: {err}");
                None
            }
        };

        let mut tracker = self.tracker.lock().await;
        guard.disarm();
        let reply = tracker.finish_chat(ticket.id, reply)?;
        Ok(ChatResponse {
            reply,
            history: tracker.chat_history().to_vec(),
        })
    }

    async fn persist_goals(&self, tracker: &Tracker) -> Result<(), AppError> {
        persist_slot(&self.data_dir, GOALS_SLOT, &tracker.goals()).await?;
        persist_slot(&self.data_dir, STATS_SLOT, tracker.stats()).await
    }
}

/// A request the tracker is waiting on while its lock is released.
enum InFlight {
    Chat(u64),
    Reflection(u64),
}

impl InFlight {
    fn abandon(self, tracker: &mut Tracker) {
        match self {
            InFlight::Chat(id) => {
                if tracker.finish_chat(id, None).is_ok() {
                    warn!("chat request abandoned before the reply arrived");
                }
            }
            InFlight::Reflection(id) => {
                if tracker.fail_reflection(id) {
                    warn!("reflection request abandoned before feedback arrived");
                }
            }
        }
    }
}

/// Settles an in-flight request when the caller's future is dropped mid-await,
/// so the flow never stays busy for a reply nobody will deliver.
struct InFlightGuard {
    tracker: Arc<Mutex<Tracker>>,
    pending: Option<InFlight>,
}

impl InFlightGuard {
    fn new(tracker: &Arc<Mutex<Tracker>>, pending: InFlight) -> Self {
        Self {
            tracker: Arc::clone(tracker),
            pending: Some(pending),
        }
    }

    fn disarm(&mut self) {
        self.pending = None;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if let Ok(mut tracker) = self.tracker.try_lock() {
            pending.abandon(&mut tracker);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let tracker = Arc::clone(&self.tracker);
                handle.spawn(async move {
                    pending.abandon(&mut *tracker.lock().await);
                });
            }
            Err(_) => warn!("in-flight request dropped outside the runtime"),
        }
    }
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Re-evaluates the reminder once a minute for the life of the server.
pub fn spawn_reminder_task(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        let mut was_visible = false;
        loop {
            interval.tick().await;
            let visible = state.tracker.lock().await.check_reminder(now());
            if visible && !was_visible {
                info!("daily reflection reminder is now showing");
            }
            was_visible = visible;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, ReflectionItem};
    use crate::chat::FALLBACK_REPLY;
    use crate::models::{ChatRole, ChatTurn, GoalCategory};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct ScriptedAssistant {
        fail: bool,
        seen_items: StdMutex<Vec<ReflectionItem>>,
        seen_history: StdMutex<Vec<ChatTurn>>,
    }

    #[async_trait]
    impl Assistant for ScriptedAssistant {
        async fn reflect(&self, items: &[ReflectionItem]) -> Result<AiReflection, AiError> {
            self.seen_items.lock().unwrap().extend_from_slice(items);
            if self.fail {
                return Err(AiError::MissingCredential);
            }
            Ok(AiReflection {
                motivational_tip: "One step at a time.".into(),
                youtube_links: Vec::new(),
                article_links: Vec::new(),
            })
        }

        async fn chat(&self, history: &[ChatTurn], query: &str) -> Result<String, AiError> {
            *self.seen_history.lock().unwrap() = history.to_vec();
            if self.fail {
                return Err(AiError::EmptyResponse);
            }
            Ok(format!("echo: {query}"))
        }
    }

    /// Never answers its first call, then answers normally.
    #[derive(Default)]
    struct StallingAssistant {
        calls: AtomicUsize,
    }

    impl StallingAssistant {
        async fn stall_first_call(&self) {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
        }

        async fn wait_for_call(&self) {
            while self.calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl Assistant for StallingAssistant {
        async fn reflect(&self, _items: &[ReflectionItem]) -> Result<AiReflection, AiError> {
            self.stall_first_call().await;
            Ok(AiReflection {
                motivational_tip: "Second time lucky.".into(),
                youtube_links: Vec::new(),
                article_links: Vec::new(),
            })
        }

        async fn chat(&self, _history: &[ChatTurn], query: &str) -> Result<String, AiError> {
            self.stall_first_call().await;
            Ok(format!("echo: {query}"))
        }
    }

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 3)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap()
    }

    async fn state_with(assistant: Arc<ScriptedAssistant>) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Tracker::default(), assistant);
        (dir, state)
    }

    async fn not_done_goal(state: &AppState, title: &str) -> Goal {
        let goal = state
            .add_goal(
                NewGoalRequest {
                    title: title.into(),
                    category: GoalCategory::Learning,
                    start_time: Some("08:30".into()),
                    end_time: Some("09:15".into()),
                },
                evening(),
            )
            .await
            .unwrap();
        state
            .set_status(&goal.id, GoalStatus::NotDone, evening())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let (dir, state) = state_with(Arc::new(ScriptedAssistant::default())).await;
        let goal = not_done_goal(&state, "Rust exercises").await;

        let stored: Vec<Goal> = load_slot(dir.path(), GOALS_SLOT).await;
        assert_eq!(stored, vec![goal.clone()]);

        state.delete_goal(&goal.id, evening()).await.unwrap();
        let stored: Vec<Goal> = load_slot(dir.path(), GOALS_SLOT).await;
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn failed_reflection_leaves_date_unset() {
        let assistant = Arc::new(ScriptedAssistant {
            fail: true,
            ..Default::default()
        });
        let (dir, state) = state_with(assistant.clone()).await;
        let goal = not_done_goal(&state, "Algorithms").await;

        state.open_reflection(evening()).await.unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert(goal.id.clone(), IncompleteReason::Difficulty);

        let err = state.submit_reflection(&reasons, evening()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(assistant.seen_items.lock().unwrap().len(), 1);

        assert_eq!(state.tracker.lock().await.goals()[0].reason, None);
        let stored: Vec<Goal> = load_slot(dir.path(), GOALS_SLOT).await;
        assert_eq!(stored[0].reason, None);

        let closed = state.close_reflection(evening()).await.unwrap();
        assert!(!closed.recorded);
        let stored: Option<NaiveDate> = load_slot(dir.path(), REFLECTION_SLOT).await;
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn unwritable_data_dir_does_not_wedge_reflection() {
        let dir = tempfile::tempdir().unwrap();
        let goal = Goal {
            id: "g-1".into(),
            title: "Write report".into(),
            category: GoalCategory::PersonalGrowth,
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            status: GoalStatus::NotDone,
            date: evening().date(),
            reason: None,
        };
        let tracker = Tracker::restore(vec![goal], Default::default(), None, evening());
        let assistant = Arc::new(ScriptedAssistant {
            fail: true,
            ..Default::default()
        });
        let state = AppState::new(dir.path().join("missing"), tracker, assistant.clone());

        state.open_reflection(evening()).await.unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert("g-1".to_string(), IncompleteReason::Distraction);

        for attempt in 1..=2 {
            let err = state.submit_reflection(&reasons, evening()).await.unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(assistant.seen_items.lock().unwrap().len(), attempt);
        }
    }

    #[tokio::test]
    async fn successful_reflection_persists_reasons() {
        let (dir, state) = state_with(Arc::new(ScriptedAssistant::default())).await;
        let goal = not_done_goal(&state, "Gym").await;

        state.open_reflection(evening()).await.unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert(goal.id.clone(), IncompleteReason::Other);
        state.submit_reflection(&reasons, evening()).await.unwrap();

        let stored: Vec<Goal> = load_slot(dir.path(), GOALS_SLOT).await;
        assert_eq!(stored[0].reason, Some(IncompleteReason::Other));
    }

    #[tokio::test]
    async fn dropped_reflection_request_can_be_resubmitted() {
        let assistant = Arc::new(StallingAssistant::default());
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Tracker::default(), assistant.clone());
        let goal = not_done_goal(&state, "Piano practice").await;

        state.open_reflection(evening()).await.unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert(goal.id.clone(), IncompleteReason::Time);

        let task = tokio::spawn({
            let state = state.clone();
            let reasons = reasons.clone();
            async move { state.submit_reflection(&reasons, evening()).await }
        });
        assistant.wait_for_call().await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let reflection = state.submit_reflection(&reasons, evening()).await.unwrap();
        assert_eq!(reflection.motivational_tip, "Second time lucky.");
    }

    #[tokio::test]
    async fn dropped_chat_request_does_not_block_the_next_one() {
        let assistant = Arc::new(StallingAssistant::default());
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Tracker::default(), assistant.clone());

        let task = tokio::spawn({
            let state = state.clone();
            async move { state.send_chat("first").await }
        });
        assistant.wait_for_call().await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let response = state.send_chat("second").await.unwrap();
        assert_eq!(response.reply.text, "echo: second");
        let texts: Vec<&str> = response.history.iter().map(|turn| turn.text.as_str()).collect();
        assert_eq!(texts, vec!["first", FALLBACK_REPLY, "second", "echo: second"]);
    }

    #[tokio::test]
    async fn successful_reflection_records_date_on_close() {
        let (dir, state) = state_with(Arc::new(ScriptedAssistant::default())).await;
        let goal = not_done_goal(&state, "Team retro notes").await;
        assert!(state.reminder(evening()).await.visible);

        state.open_reflection(evening()).await.unwrap();
        let mut reasons = BTreeMap::new();
        reasons.insert(goal.id.clone(), IncompleteReason::Time);
        let reflection = state.submit_reflection(&reasons, evening()).await.unwrap();
        assert_eq!(reflection.motivational_tip, "One step at a time.");

        let closed = state.close_reflection(evening()).await.unwrap();
        assert!(closed.recorded);
        assert_eq!(closed.last_reflection_date, Some(evening().date()));
        let stored: Option<NaiveDate> = load_slot(dir.path(), REFLECTION_SLOT).await;
        assert_eq!(stored, Some(evening().date()));
        assert!(!state.reminder(evening()).await.visible);
    }

    #[tokio::test]
    async fn chat_sends_prior_turns_and_falls_back_on_error() {
        let assistant = Arc::new(ScriptedAssistant::default());
        let (_dir, state) = state_with(assistant.clone()).await;

        let first = state.send_chat("hi").await.unwrap();
        assert_eq!(first.reply.text, "echo: hi");
        assert!(assistant.seen_history.lock().unwrap().is_empty());

        let second = state.send_chat("again").await.unwrap();
        assert_eq!(second.history.len(), 4);
        assert_eq!(assistant.seen_history.lock().unwrap().len(), 2);

        let failing = Arc::new(ScriptedAssistant {
            fail: true,
            ..Default::default()
        });
        let (_dir, state) = state_with(failing).await;
        let response = state.send_chat("anyone there?").await.unwrap();
        assert_eq!(response.reply.role, ChatRole::Model);
        assert_eq!(response.reply.text, FALLBACK_REPLY);
    }
}
