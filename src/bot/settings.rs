//! Settings handlers: sort order and timezone pickers.

use anyhow::Result;

use planner_core::models::SortType;

use crate::views;

use super::Bot;

impl Bot {
    pub(super) async fn show_settings(&self, chat_id: i64) -> Result<()> {
        self.api
            .send_message(
                chat_id,
                "Choose the default sort order and your timezone:",
                Some(&views::settings_keyboard()),
            )
            .await?;
        Ok(())
    }

    pub(super) async fn set_sort(&self, chat_id: i64, user_id: i64, value: &str) -> Result<()> {
        let Some(sort) = SortType::from_str(value) else {
            self.api
                .send_message(chat_id, "❌ Could not set the sort order.", None)
                .await?;
            return Ok(());
        };
        self.db.set_sort(user_id, sort)?;
        self.api
            .send_message(
                chat_id,
                &format!("✅ Sorting set: {}", views::sort_label(sort)),
                None,
            )
            .await?;
        Ok(())
    }

    pub(super) async fn set_timezone(&self, chat_id: i64, user_id: i64, value: &str) -> Result<()> {
        match value.parse::<i32>() {
            Ok(offset) if (-11..=12).contains(&offset) => {
                self.db.set_timezone(user_id, offset)?;
                self.api
                    .send_message(
                        chat_id,
                        &format!("✅ Timezone set: {}", views::format_offset(offset)),
                        None,
                    )
                    .await?;
            }
            _ => {
                self.api
                    .send_message(chat_id, "❌ Could not set the timezone.", None)
                    .await?;
            }
        }
        Ok(())
    }
}
