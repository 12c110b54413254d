//! Update dispatcher: routes incoming messages and button presses to the
//! task and settings handlers.

mod settings;
mod tasks;

use std::time::Duration;

use anyhow::{Context, Result};
use uuid::Uuid;

use planner_core::db::Database;
use planner_core::models::{SortType, DEFAULT_OFFSET_HOURS};

use crate::telegram::types::{CallbackQuery, Message, Update};
use crate::telegram::Api;
use crate::views;
use crate::wizard::DraftStore;

/// The bot and its collaborators, passed in explicitly at construction.
pub struct Bot {
    api: Api,
    db: Database,
    drafts: DraftStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskAction {
    Delete,
    Toggle,
    Edit,
}

/// `<action>_<id>` button payloads attached to each listed task.
fn parse_task_action(data: &str) -> Option<(TaskAction, Uuid)> {
    let (action, id) = data.split_once('_')?;
    let action = match action {
        "delete" => TaskAction::Delete,
        "toggle" => TaskAction::Toggle,
        "edit" => TaskAction::Edit,
        _ => return None,
    };
    Some((action, Uuid::parse_str(id).ok()?))
}

impl Bot {
    pub fn new(api: Api, db: Database) -> Self {
        Self {
            api,
            db,
            drafts: DraftStore::new(),
        }
    }

    /// Long-poll loop. Handler errors are logged and do not stop the loop.
    pub async fn run(&self) -> Result<()> {
        let me = self.api.get_me().await.context("credential check failed")?;
        tracing::info!(
            "bot @{} is running",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        let mut offset = 0i64;
        loop {
            let updates = match self.api.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!("polling failed: {e}");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Err(e) = self.handle_update(update).await {
                    tracing::error!("update handling failed: {e:#}");
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(message) = update.message {
            self.handle_message(message).await
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await
        } else {
            Ok(())
        }
    }

    async fn handle_message(&self, message: Message) -> Result<()> {
        let Some(text) = message.text else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        // Private chats: the chat id doubles as the user id.
        let user_id = message.from.map_or(chat_id, |u| u.id);
        tracing::debug!(chat_id, "message: {text}");

        match text.trim() {
            "/start" => {
                self.api
                    .send_message(
                        chat_id,
                        "Hi! I keep your to-do list. Pick an action:",
                        Some(&views::main_menu()),
                    )
                    .await?;
                Ok(())
            }
            "/menu" => {
                self.api
                    .send_message(chat_id, "Pick an action:", Some(&views::main_menu()))
                    .await?;
                Ok(())
            }
            "/help" | views::MENU_HELP => {
                self.api
                    .send_message(chat_id, &views::help_text(), None)
                    .await?;
                Ok(())
            }
            views::MENU_ADD => self.start_add_task(chat_id).await,
            views::MENU_LIST => self.list_tasks(chat_id, user_id).await,
            views::MENU_OVERDUE => self.list_overdue_tasks(chat_id, user_id).await,
            views::MENU_SETTINGS => self.show_settings(chat_id).await,
            other => self.handle_free_text(chat_id, user_id, other).await,
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<()> {
        self.api.answer_callback_query(&query.id).await?;

        let (Some(data), Some(message)) = (query.data, query.message) else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user_id = query.from.id;
        tracing::debug!(chat_id, "callback: {data}");

        if let Some(sort) = data.strip_prefix("set_sort_") {
            return self.set_sort(chat_id, user_id, sort).await;
        }
        if let Some(offset) = data.strip_prefix("set_timezone_") {
            return self.set_timezone(chat_id, user_id, offset).await;
        }
        match parse_task_action(&data) {
            Some((TaskAction::Delete, id)) => {
                self.delete_task(chat_id, user_id, id).await?;
                self.list_tasks(chat_id, user_id).await
            }
            Some((TaskAction::Toggle, id)) => {
                self.toggle_task(chat_id, user_id, id).await?;
                self.list_tasks(chat_id, user_id).await
            }
            Some((TaskAction::Edit, id)) => self.start_edit_task(chat_id, user_id, id).await,
            None => {
                self.api
                    .send_message(chat_id, "I didn't get that 🤔", None)
                    .await?;
                Ok(())
            }
        }
    }

    /// Sort preference and UTC offset, with defaults when the user has no
    /// settings row yet.
    fn effective_settings(&self, user_id: i64) -> Result<(SortType, i32)> {
        Ok(self
            .db
            .get_settings(user_id)?
            .map_or((SortType::default(), DEFAULT_OFFSET_HOURS), |s| {
                (s.sort, s.offset_hours())
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_action_payloads() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_task_action(&format!("delete_{id}")),
            Some((TaskAction::Delete, id))
        );
        assert_eq!(
            parse_task_action(&format!("toggle_{id}")),
            Some((TaskAction::Toggle, id))
        );
        assert_eq!(
            parse_task_action(&format!("edit_{id}")),
            Some((TaskAction::Edit, id))
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert_eq!(parse_task_action("delete_notauuid"), None);
        assert_eq!(parse_task_action("unknown_payload"), None);
        assert_eq!(parse_task_action("plain text"), None);
    }
}
