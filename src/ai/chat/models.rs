//! The core models for managing a stateful chat with an LLM.
use std::collections::VecDeque;
use std::time::Instant;

use crate::openai::{Message, Role};

/// Ordered history sent to the LLM as context. The first message is
/// always the system message and the rest is a sliding window of the
/// most recent `max_turns` user/assistant exchanges.
#[derive(Clone, Debug)]
pub struct Transcript {
    system: Message,
    history: VecDeque<Message>,
    max_turns: usize,
}

impl Transcript {
    pub fn new(system_message: &str, max_turns: usize) -> Self {
        Self {
            system: Message::new(Role::System, system_message),
            history: VecDeque::new(),
            max_turns: max_turns.max(1),
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.history.push_back(msg);
        while self.history.len() > self.max_turns * 2 {
            // Evict a whole exchange so the window starts on a user turn
            self.history.pop_front();
            if matches!(self.history.front(), Some(m) if m.role == Role::Assistant) {
                self.history.pop_front();
            }
        }
    }

    /// The full ordered context, system message first.
    pub fn snapshot(&self) -> Vec<Message> {
        std::iter::once(&self.system)
            .chain(self.history.iter())
            .cloned()
            .collect()
    }

    /// Same as `snapshot` with `next` appended, without recording it.
    pub fn snapshot_with(&self, next: &Message) -> Vec<Message> {
        let mut messages = self.snapshot();
        messages.push(next.clone());
        messages
    }

    /// Recorded exchanges in order, without the system message.
    pub fn messages(&self) -> &VecDeque<Message> {
        &self.history
    }

    /// Number of recorded messages. The system message isn't counted.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.system).chain(self.history.iter())
    }
}

/// Plain text history rendered on the chat page, alternating user
/// input and assistant output.
#[derive(Clone, Debug)]
pub struct DisplayLog {
    entries: VecDeque<String>,
    max_entries: usize,
}

impl DisplayLog {
    pub fn new(max_turns: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_turns.max(1) * 2,
        }
    }

    pub fn push(&mut self, entry: &str) {
        self.entries.push_back(entry.to_string());
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything kept for one chat session.
#[derive(Debug)]
pub struct Session {
    pub transcript: Transcript,
    pub display_log: DisplayLog,
    pub last_active: Instant,
}

impl Session {
    pub fn new(system_message: &str, max_turns: usize) -> Self {
        Self {
            transcript: Transcript::new(system_message, max_turns),
            display_log: DisplayLog::new(max_turns),
            last_active: Instant::now(),
        }
    }

    /// Record a completed exchange. Nothing is recorded for a turn
    /// that failed so the transcript always alternates.
    pub fn commit(&mut self, user_input: &str, reply: &str) {
        self.transcript.push(Message::new(Role::User, user_input));
        self.transcript.push(Message::new(Role::Assistant, reply));
        self.display_log.push(user_input);
        self.display_log.push(reply);
        self.last_active = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_starts_with_the_system_message() {
        let transcript = Transcript::new("Be brief.", 5);
        assert_eq!(
            transcript.snapshot(),
            vec![Message::new(Role::System, "Be brief.")]
        );
    }

    #[test]
    fn it_keeps_the_system_message_first_when_evicting() {
        let mut session = Session::new("Be brief.", 2);
        for i in 0..5 {
            session.commit(&format!("question {i}"), &format!("answer {i}"));
        }

        assert_eq!(session.transcript.len(), 4);
        let messages = session.transcript.snapshot();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], Message::new(Role::System, "Be brief."));
        assert_eq!(messages[1], Message::new(Role::User, "question 3"));
        assert_eq!(messages[2], Message::new(Role::Assistant, "answer 3"));
        assert_eq!(messages[4], Message::new(Role::Assistant, "answer 4"));
    }

    #[test]
    fn it_evicts_whole_exchanges() {
        let mut transcript = Transcript::new("sys", 1);
        transcript.push(Message::new(Role::User, "a"));
        transcript.push(Message::new(Role::Assistant, "b"));
        transcript.push(Message::new(Role::User, "c"));
        // A dangling user message evicts the complete previous exchange
        let roles: Vec<Role> = transcript.iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(
            transcript.messages().iter().collect::<Vec<_>>(),
            vec![&Message::new(Role::User, "c")]
        );
    }

    #[test]
    fn it_appends_without_recording() {
        let transcript = Transcript::new("sys", 3);
        let next = Message::new(Role::User, "hi");
        let context = transcript.snapshot_with(&next);
        assert_eq!(context.len(), 2);
        assert_eq!(context[1], next);
        assert!(transcript.is_empty());
    }

    #[test]
    fn it_alternates_display_log_entries() {
        let mut session = Session::new("sys", 10);
        session.commit("hello", "hi there");
        session.commit("how are you?", "fine");
        assert_eq!(
            session.display_log.entries(),
            vec!["hello", "hi there", "how are you?", "fine"]
        );
    }

    #[test]
    fn it_bounds_the_display_log() {
        let mut log = DisplayLog::new(1);
        log.push("one");
        log.push("two");
        log.push("three");
        assert_eq!(log.entries(), vec!["two", "three"]);
    }
}
