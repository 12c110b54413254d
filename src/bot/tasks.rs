//! Task handlers: list/overdue views, button actions, and the add/edit
//! wizard flow.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use planner_core::models::{CreateTaskInput, Task, UpdateTaskInput};

use crate::views;
use crate::wizard::{Draft, Step};

use super::Bot;

const NOT_FOUND: &str = "Task not found. 😕";
const DID_NOT_GET_THAT: &str = "I didn't get that 🤔";

const DATE_PROMPT: &str = "Enter a due date and/or time:\n\
     • YYYY-MM-DD [HH:MM]\n\
     • DD.MM.YYYY [HH:MM]\n\
     • DD/MM/YYYY [HH:MM]\n\
     • HH:MM (for today/tomorrow)\n\
     • tomorrow\n\
     • day after tomorrow\n\
     • in N days\n\
     • or 'skip'";

impl Bot {
    pub(super) async fn start_add_task(&self, chat_id: i64) -> Result<()> {
        self.drafts.begin(chat_id, Draft::new());
        self.api
            .send_message(chat_id, "Enter the task title (or 'cancel'):", None)
            .await?;
        Ok(())
    }

    pub(super) async fn start_edit_task(&self, chat_id: i64, user_id: i64, id: Uuid) -> Result<()> {
        let Some(task) = self.db.get_task(user_id, id)? else {
            self.api.send_message(chat_id, NOT_FOUND, None).await?;
            return Ok(());
        };
        let prompt = format!("Current title: {}\nEnter the new title:", task.title);
        self.drafts.begin(chat_id, Draft::editing(&task));
        self.api.send_message(chat_id, &prompt, None).await?;
        Ok(())
    }

    pub(super) async fn list_tasks(&self, chat_id: i64, user_id: i64) -> Result<()> {
        let tasks = self.db.list_tasks(user_id)?;
        self.send_task_list(chat_id, user_id, tasks).await
    }

    pub(super) async fn list_overdue_tasks(&self, chat_id: i64, user_id: i64) -> Result<()> {
        let tasks = self.db.overdue_tasks(user_id, Utc::now())?;
        self.send_task_list(chat_id, user_id, tasks).await
    }

    async fn send_task_list(&self, chat_id: i64, user_id: i64, mut tasks: Vec<Task>) -> Result<()> {
        if tasks.is_empty() {
            self.api
                .send_message(chat_id, "No tasks found.", None)
                .await?;
            return Ok(());
        }
        let (sort, offset_hours) = self.effective_settings(user_id)?;
        views::sort_tasks(&mut tasks, sort);
        self.api
            .send_html(
                chat_id,
                &views::task_list_text(&tasks, offset_hours),
                Some(&views::task_list_keyboard(&tasks)),
            )
            .await?;
        Ok(())
    }

    pub(super) async fn delete_task(&self, chat_id: i64, user_id: i64, id: Uuid) -> Result<()> {
        let message = if self.db.delete_task(user_id, id)? {
            "Task deleted! 😎"
        } else {
            NOT_FOUND
        };
        self.api.send_message(chat_id, message, None).await?;
        Ok(())
    }

    pub(super) async fn toggle_task(&self, chat_id: i64, user_id: i64, id: Uuid) -> Result<()> {
        let message = match self.db.toggle_task(user_id, id)? {
            Some(true) => "Task marked as done. 😎",
            Some(false) => "Task marked as not done. 😎",
            None => NOT_FOUND,
        };
        self.api.send_message(chat_id, message, None).await?;
        Ok(())
    }

    /// Free text outside the menu: wizard input when a draft is active,
    /// otherwise a nudge towards the menu.
    pub(super) async fn handle_free_text(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<()> {
        let Some(mut draft) = self.drafts.get(chat_id) else {
            self.api
                .send_message(chat_id, "Start with 'Add task' from the menu.", None)
                .await?;
            return Ok(());
        };

        let (_, offset_hours) = self.effective_settings(user_id)?;
        match draft.submit(text, offset_hours, Utc::now()) {
            Step::Reprompt => {
                self.api
                    .send_message(chat_id, DID_NOT_GET_THAT, None)
                    .await?;
            }
            Step::AskDescription => {
                self.drafts.put(chat_id, draft);
                self.api
                    .send_message(chat_id, "Add a description (or send 'skip'):", None)
                    .await?;
            }
            Step::AskDueDate => {
                self.drafts.put(chat_id, draft);
                self.api.send_message(chat_id, DATE_PROMPT, None).await?;
            }
            Step::AskConfirmation => {
                let summary = draft_summary(&draft, offset_hours);
                self.drafts.put(chat_id, draft);
                self.api.send_message(chat_id, &summary, None).await?;
            }
            Step::Commit => {
                self.drafts.clear(chat_id);
                self.commit_draft(chat_id, user_id, draft).await?;
            }
            Step::Discard | Step::Cancelled => {
                self.drafts.clear(chat_id);
                let message = if draft.is_edit() {
                    "Changes discarded."
                } else {
                    "Task creation cancelled."
                };
                self.api.send_message(chat_id, message, None).await?;
            }
        }
        Ok(())
    }

    async fn commit_draft(&self, chat_id: i64, user_id: i64, draft: Draft) -> Result<()> {
        if let Some(task_id) = draft.edit_task_id {
            let updated = self.db.update_task(
                user_id,
                task_id,
                UpdateTaskInput {
                    title: draft.title,
                    description: draft.description,
                    due_date: draft.due_date,
                },
            )?;
            let message = if updated { "Task updated ✅" } else { NOT_FOUND };
            self.api.send_message(chat_id, message, None).await?;
        } else {
            self.db.create_task(CreateTaskInput {
                user_id,
                title: draft.title,
                description: draft.description,
                due_date: draft.due_date,
            })?;
            self.api.send_message(chat_id, "Task added! 😎", None).await?;
        }
        Ok(())
    }
}

/// The confirmation summary shows the due date in the user's local time,
/// exactly as it will appear in lists.
fn draft_summary(draft: &Draft, offset_hours: i32) -> String {
    let due = draft
        .due_date
        .map_or_else(|| "none".to_string(), |d| views::format_local(d, offset_hours));
    format!(
        "Title: {}\nDescription: {}\nDue: {}\n\nSave this task? (yes/no)",
        draft.title,
        draft.description.as_deref().unwrap_or("none"),
        due,
    )
}
