use crate::models::{ChatRole, ChatTurn};
use crate::tracker::TrackerError;

pub const FALLBACK_REPLY: &str = "Sorry, I am having trouble connecting. Please try again later.";

/// Conversation with the assistant for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<ChatTurn>,
    pending: Option<u64>,
    next_ticket: u64,
}

/// What an in-flight request needs: its ticket and the turns before the query.
#[derive(Debug)]
pub struct ChatTicket {
    pub id: u64,
    pub prior: Vec<ChatTurn>,
    pub query: String,
}

impl ChatSession {
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, query: &str) -> Result<ChatTicket, TrackerError> {
        if query.trim().is_empty() {
            return Err(TrackerError::EmptyQuery);
        }
        if self.pending.is_some() {
            return Err(TrackerError::ChatInFlight);
        }

        let prior = self.history.clone();
        self.history.push(ChatTurn {
            role: ChatRole::User,
            text: query.to_string(),
        });
        self.next_ticket += 1;
        self.pending = Some(self.next_ticket);

        Ok(ChatTicket {
            id: self.next_ticket,
            prior,
            query: query.to_string(),
        })
    }

    /// Appends the model turn, or the fallback text when the request failed.
    pub fn finish(&mut self, ticket: u64, reply: Option<String>) -> Result<ChatTurn, TrackerError> {
        if self.pending != Some(ticket) {
            return Err(TrackerError::Superseded);
        }
        self.pending = None;

        let turn = ChatTurn {
            role: ChatRole::Model,
            text: reply.unwrap_or_else(|| FALLBACK_REPLY.to_string()),
        };
        self.history.push(turn.clone());
        Ok(turn)
    }
}
