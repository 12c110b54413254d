//! Outbound message formatting and keyboards.

use chrono::{DateTime, Duration, Utc};

use planner_core::models::{SortType, Task};

use crate::telegram::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup, ReplyMarkup,
};

// Reply-keyboard menu labels; the dispatcher matches on these.
pub const MENU_ADD: &str = "➕ Add task";
pub const MENU_LIST: &str = "📋 My tasks";
pub const MENU_OVERDUE: &str = "⏰ Overdue tasks";
pub const MENU_SETTINGS: &str = "⚙️ Settings";
pub const MENU_HELP: &str = "ℹ️ Help";

pub fn main_menu() -> ReplyMarkup {
    let labels = [MENU_ADD, MENU_LIST, MENU_OVERDUE, MENU_SETTINGS, MENU_HELP];
    ReplyMarkup::Reply(ReplyKeyboardMarkup {
        keyboard: labels
            .iter()
            .map(|label| {
                vec![KeyboardButton {
                    text: (*label).to_string(),
                }]
            })
            .collect(),
        resize_keyboard: true,
    })
}

pub fn help_text() -> String {
    [
        "Available actions:",
        "- Add task: press 'Add task' and follow the steps (send 'cancel' to abort).",
        "- My tasks: press 'My tasks'.",
        "- Overdue tasks: press 'Overdue tasks'.",
        "- Manage tasks: use the buttons under the task list.",
        "- Settings: pick the default sort order and your timezone.",
    ]
    .join("\n")
}

/// Presentation order for the task list.
pub fn sort_tasks(tasks: &mut [Task], sort: SortType) {
    match sort {
        // Earliest due first, dateless tasks last; stable within ties.
        SortType::ByDate => tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
        SortType::ByStatus => tasks.sort_by_key(|t| t.completed),
        SortType::ByTitle => tasks.sort_by_key(|t| t.title.to_lowercase()),
    }
}

/// HTML body of the task list. Tasks must already be sorted.
pub fn task_list_text(tasks: &[Task], offset_hours: i32) -> String {
    let mut out = String::from("Your tasks:\n");
    for (i, task) in tasks.iter().enumerate() {
        let marker = if task.completed { " ✅" } else { "" };
        out.push_str(&format!(
            "\n{}. <b>{}</b>{}",
            i + 1,
            escape_html(&task.title),
            marker
        ));
        if let Some(description) = &task.description {
            out.push_str(&format!("\n    {}", escape_html(description)));
        }
        if let Some(due) = task.due_date {
            out.push_str(&format!("\n    due {}", format_local(due, offset_hours)));
        }
    }
    out
}

/// One row of action buttons per task, in list order.
pub fn task_list_keyboard(tasks: &[Task]) -> ReplyMarkup {
    let rows = tasks
        .iter()
        .map(|task| {
            let toggle_label = if task.completed { "🔄 Resume" } else { "✅ Done" };
            vec![
                InlineKeyboardButton::new("❌ Delete", format!("delete_{}", task.id)),
                InlineKeyboardButton::new(toggle_label, format!("toggle_{}", task.id)),
                InlineKeyboardButton::new("✏️ Edit", format!("edit_{}", task.id)),
            ]
        })
        .collect();
    ReplyMarkup::Inline(InlineKeyboardMarkup {
        inline_keyboard: rows,
    })
}

pub fn sort_label(sort: SortType) -> &'static str {
    match sort {
        SortType::ByDate => "📅 By date",
        SortType::ByStatus => "✅ By status",
        SortType::ByTitle => "🔤 By title",
    }
}

/// Sort picker row plus a UTC offset grid.
pub fn settings_keyboard() -> ReplyMarkup {
    let mut rows = vec![[SortType::ByDate, SortType::ByStatus, SortType::ByTitle]
        .iter()
        .map(|sort| {
            InlineKeyboardButton::new(sort_label(*sort), format!("set_sort_{}", sort.as_str()))
        })
        .collect::<Vec<_>>()];

    let mut row = Vec::new();
    for offset in -11..=12 {
        row.push(InlineKeyboardButton::new(
            format_offset(offset),
            format!("set_timezone_{offset}"),
        ));
        if row.len() == 6 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }

    ReplyMarkup::Inline(InlineKeyboardMarkup {
        inline_keyboard: rows,
    })
}

pub fn format_offset(offset_hours: i32) -> String {
    if offset_hours >= 0 {
        format!("UTC+{offset_hours}")
    } else {
        format!("UTC{offset_hours}")
    }
}

/// Render a stored UTC moment in the user's offset, `DD.MM.YYYY HH:MM`.
pub fn format_local(utc: DateTime<Utc>, offset_hours: i32) -> String {
    let local = utc + Duration::hours(i64::from(offset_hours));
    local.format("%d.%m.%Y %H:%M").to_string()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn task(title: &str, completed: bool, due: Option<DateTime<Utc>>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: 1,
            title: title.into(),
            description: None,
            completed,
            due_date: due,
            created_at: Utc::now(),
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn sort_by_date_puts_dateless_last() {
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let sooner = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let mut tasks = vec![
            task("none", false, None),
            task("later", false, Some(later)),
            task("sooner", false, Some(sooner)),
        ];
        sort_tasks(&mut tasks, SortType::ByDate);
        assert_eq!(titles(&tasks), ["sooner", "later", "none"]);
    }

    #[test]
    fn sort_by_status_puts_pending_first() {
        let mut tasks = vec![
            task("done", true, None),
            task("open", false, None),
        ];
        sort_tasks(&mut tasks, SortType::ByStatus);
        assert_eq!(titles(&tasks), ["open", "done"]);
    }

    #[test]
    fn sort_by_title_is_case_insensitive() {
        let mut tasks = vec![
            task("banana", false, None),
            task("Apple", false, None),
        ];
        sort_tasks(&mut tasks, SortType::ByTitle);
        assert_eq!(titles(&tasks), ["Apple", "banana"]);
    }

    #[test]
    fn list_text_escapes_and_localizes() {
        let due = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let mut t = task("a <b> task", false, Some(due));
        t.description = Some("one & two".into());
        let text = task_list_text(&[t], 3);
        assert!(text.contains("<b>a &lt;b&gt; task</b>"));
        assert!(text.contains("one &amp; two"));
        assert!(text.contains("due 20.03.2025 15:00"));
    }

    #[test]
    fn keyboard_carries_action_payloads() {
        let t = task("t", false, None);
        let ReplyMarkup::Inline(markup) = task_list_keyboard(std::slice::from_ref(&t)) else {
            panic!("expected inline keyboard");
        };
        let row = &markup.inline_keyboard[0];
        assert_eq!(row[0].callback_data, format!("delete_{}", t.id));
        assert_eq!(row[1].callback_data, format!("toggle_{}", t.id));
        assert_eq!(row[2].callback_data, format!("edit_{}", t.id));
    }

    #[test]
    fn completed_task_offers_resume() {
        let t = task("t", true, None);
        let ReplyMarkup::Inline(markup) = task_list_keyboard(std::slice::from_ref(&t)) else {
            panic!("expected inline keyboard");
        };
        assert_eq!(markup.inline_keyboard[0][1].text, "🔄 Resume");
    }

    #[test]
    fn offsets_format_with_sign() {
        assert_eq!(format_offset(3), "UTC+3");
        assert_eq!(format_offset(0), "UTC+0");
        assert_eq!(format_offset(-5), "UTC-5");
    }
}
