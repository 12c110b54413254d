//! The guided task-input flow.
//!
//! A draft walks through `Title → Description → DueDate → Confirmation`.
//! Transition logic is pure (text in, [`Step`] out) so it is testable
//! without the transport; the handlers in `bot::tasks` do the talking.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use planner_core::models::Task;

use crate::dates;

pub const CANCEL_KEYWORD: &str = "cancel";
pub const SKIP_KEYWORD: &str = "skip";
pub const YES_KEYWORD: &str = "yes";
pub const NO_KEYWORD: &str = "no";

/// Abandoned drafts are dropped after this long.
pub const DRAFT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Title,
    Description,
    DueDate,
    Confirmation,
}

/// In-progress, uncommitted task data for one chat.
#[derive(Debug, Clone)]
pub struct Draft {
    pub stage: Stage,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Set when the draft edits an existing task instead of creating one.
    pub edit_task_id: Option<Uuid>,
    started: Instant,
}

/// Outcome of feeding one message into the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Input rejected; ask again without advancing.
    Reprompt,
    /// Advanced to the description stage.
    AskDescription,
    /// Advanced to the due-date stage.
    AskDueDate,
    /// Advanced to confirmation; show the draft summary.
    AskConfirmation,
    /// Confirmed; commit the draft.
    Commit,
    /// Declined at confirmation; discard the draft.
    Discard,
    /// Cancel keyword; discard the draft.
    Cancelled,
}

impl Draft {
    pub fn new() -> Self {
        Self {
            stage: Stage::Title,
            title: String::new(),
            description: None,
            due_date: None,
            edit_task_id: None,
            started: Instant::now(),
        }
    }

    /// Seed a draft from an existing task; commits via update.
    pub fn editing(task: &Task) -> Self {
        Self {
            stage: Stage::Title,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            edit_task_id: Some(task.id),
            started: Instant::now(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.edit_task_id.is_some()
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() >= ttl
    }

    /// Feed one message into the flow. `offset_hours` is the user's UTC
    /// offset, applied when a due date is entered.
    pub fn submit(&mut self, text: &str, offset_hours: i32, now: DateTime<Utc>) -> Step {
        let text = text.trim();
        if text.eq_ignore_ascii_case(CANCEL_KEYWORD) {
            return Step::Cancelled;
        }
        match self.stage {
            Stage::Title => self.submit_title(text),
            Stage::Description => self.submit_description(text),
            Stage::DueDate => self.submit_due_date(text, offset_hours, now),
            Stage::Confirmation => Self::confirm(text),
        }
    }

    fn submit_title(&mut self, text: &str) -> Step {
        if text.is_empty() {
            return Step::Reprompt;
        }
        self.title = text.to_string();
        self.stage = Stage::Description;
        Step::AskDescription
    }

    fn submit_description(&mut self, text: &str) -> Step {
        self.description = if text.eq_ignore_ascii_case(SKIP_KEYWORD) {
            None
        } else {
            Some(text.to_string())
        };
        self.stage = Stage::DueDate;
        Step::AskDueDate
    }

    fn submit_due_date(&mut self, text: &str, offset_hours: i32, now: DateTime<Utc>) -> Step {
        if text.eq_ignore_ascii_case(SKIP_KEYWORD) {
            self.due_date = None;
        } else {
            let offset = chrono::Duration::hours(i64::from(offset_hours));
            let local_now = (now + offset).naive_utc();
            match dates::parse_due_date(text, local_now) {
                // The user typed local time; store UTC.
                Some(local) => {
                    self.due_date = Some(DateTime::from_naive_utc_and_offset(local - offset, Utc));
                }
                None => return Step::Reprompt,
            }
        }
        self.stage = Stage::Confirmation;
        Step::AskConfirmation
    }

    fn confirm(text: &str) -> Step {
        if text.eq_ignore_ascii_case(YES_KEYWORD) {
            Step::Commit
        } else if text.eq_ignore_ascii_case(NO_KEYWORD) {
            Step::Discard
        } else {
            Step::Reprompt
        }
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-chat draft storage with explicit expiry. Replaces what would
/// otherwise be a set of global mutable dictionaries.
pub struct DraftStore {
    drafts: Mutex<HashMap<i64, Draft>>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::with_ttl(DRAFT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            drafts: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Start (or restart) a flow for this chat.
    pub fn begin(&self, chat_id: i64, draft: Draft) {
        self.lock().insert(chat_id, draft);
    }

    pub fn get(&self, chat_id: i64) -> Option<Draft> {
        let mut drafts = self.lock();
        if drafts.get(&chat_id).is_some_and(|d| d.expired(self.ttl)) {
            drafts.remove(&chat_id);
        }
        drafts.get(&chat_id).cloned()
    }

    pub fn put(&self, chat_id: i64, draft: Draft) {
        self.lock().insert(chat_id, draft);
    }

    pub fn clear(&self, chat_id: i64) {
        self.lock().remove(&chat_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Draft>> {
        self.drafts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 12, 0, 0).unwrap()
    }

    fn submit(draft: &mut Draft, text: &str) -> Step {
        draft.submit(text, 0, now())
    }

    #[test]
    fn empty_title_does_not_advance() {
        let mut draft = Draft::new();
        assert_eq!(submit(&mut draft, "   "), Step::Reprompt);
        assert_eq!(draft.stage, Stage::Title);
    }

    #[test]
    fn full_create_flow() {
        let mut draft = Draft::new();
        assert_eq!(submit(&mut draft, "buy milk"), Step::AskDescription);
        assert_eq!(submit(&mut draft, "two liters"), Step::AskDueDate);
        assert_eq!(submit(&mut draft, "tomorrow"), Step::AskConfirmation);
        assert_eq!(submit(&mut draft, "yes"), Step::Commit);

        assert_eq!(draft.title, "buy milk");
        assert_eq!(draft.description.as_deref(), Some("two liters"));
        let due = draft.due_date.unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2025, 3, 13, 23, 59, 0).unwrap());
    }

    #[test]
    fn skip_keywords_leave_fields_empty() {
        let mut draft = Draft::new();
        submit(&mut draft, "title");
        assert_eq!(submit(&mut draft, "Skip"), Step::AskDueDate);
        assert_eq!(submit(&mut draft, "SKIP"), Step::AskConfirmation);
        assert!(draft.description.is_none());
        assert!(draft.due_date.is_none());
    }

    #[test]
    fn unparseable_date_reprompts_in_place() {
        let mut draft = Draft::new();
        submit(&mut draft, "title");
        submit(&mut draft, "skip");
        assert_eq!(submit(&mut draft, "whenever"), Step::Reprompt);
        assert_eq!(draft.stage, Stage::DueDate);
    }

    #[test]
    fn due_date_is_converted_to_utc() {
        let mut draft = Draft::new();
        submit(&mut draft, "title");
        submit(&mut draft, "skip");
        // User in UTC+3 types 15:00 local; stored as 12:00 UTC.
        assert_eq!(
            draft.submit("2025-03-20 15:00", 3, now()),
            Step::AskConfirmation
        );
        assert_eq!(
            draft.due_date.unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn confirmation_accepts_only_yes_or_no() {
        let mut draft = Draft::new();
        submit(&mut draft, "title");
        submit(&mut draft, "skip");
        submit(&mut draft, "skip");
        assert_eq!(submit(&mut draft, "maybe"), Step::Reprompt);
        assert_eq!(draft.stage, Stage::Confirmation);
        assert_eq!(submit(&mut draft, "No"), Step::Discard);
    }

    #[test]
    fn cancel_works_at_every_stage() {
        for inputs in [
            vec![],
            vec!["title"],
            vec!["title", "desc"],
            vec!["title", "desc", "tomorrow"],
        ] {
            let mut draft = Draft::new();
            for input in inputs {
                submit(&mut draft, input);
            }
            assert_eq!(submit(&mut draft, "Cancel"), Step::Cancelled);
        }
    }

    #[test]
    fn editing_seeds_from_task_and_targets_update() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: 1,
            title: "old title".into(),
            description: Some("old".into()),
            completed: false,
            due_date: None,
            created_at: now(),
        };
        let draft = Draft::editing(&task);
        assert!(draft.is_edit());
        assert_eq!(draft.edit_task_id, Some(task.id));
        assert_eq!(draft.title, "old title");
        assert_eq!(draft.stage, Stage::Title);
    }

    #[test]
    fn store_clears_and_replaces_drafts() {
        let store = DraftStore::new();
        store.begin(7, Draft::new());
        assert!(store.get(7).is_some());
        assert!(store.get(8).is_none());

        store.clear(7);
        assert!(store.get(7).is_none());
    }

    #[test]
    fn store_drops_expired_drafts() {
        let store = DraftStore::with_ttl(Duration::ZERO);
        store.begin(7, Draft::new());
        assert!(store.get(7).is_none());
    }
}
