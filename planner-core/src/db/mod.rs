use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

mod schema;

const TASK_COLUMNS: &str = "id, user_id, title, description, completed, due_date, created_at";

/// Handle to the task store. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open database at {}", path.as_ref().display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs =
            ProjectDirs::from("", "", "planner").context("could not resolve a data directory")?;
        std::fs::create_dir_all(dirs.data_dir())?;
        Self::open(dirs.data_dir().join("planner.db"))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn()?.execute_batch(schema::SCHEMA)?;
        tracing::debug!("database schema applied");
        Ok(())
    }

    /// Health probe used by the background checker.
    pub fn check_connection(&self) -> Result<()> {
        self.conn()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database mutex poisoned"))
    }

    // --- tasks ---

    pub fn create_task(&self, input: CreateTaskInput) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title,
            description: input.description,
            completed: false,
            due_date: input.due_date,
            created_at: Utc::now(),
        };

        self.conn()?.execute(
            "INSERT INTO tasks (id, user_id, title, description, completed, due_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id.to_string(),
                task.user_id,
                task.title,
                task.description,
                task.completed,
                task.due_date.map(|d| d.to_rfc3339()),
                task.created_at.to_rfc3339(),
            ],
        )?;

        Ok(task)
    }

    pub fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY created_at"
        ))?;
        let tasks = stmt
            .query_map(params![user_id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Tasks with a due date strictly before `now` that are not completed.
    pub fn overdue_tasks(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        // RFC 3339 strings in UTC compare chronologically.
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND completed = 0 AND due_date IS NOT NULL AND due_date < ?2
             ORDER BY due_date"
        ))?;
        let tasks = stmt
            .query_map(params![user_id, now.to_rfc3339()], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn get_task(&self, user_id: i64, id: Uuid) -> Result<Option<Task>> {
        let task = self
            .conn()?
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND id = ?2"),
                params![user_id, id.to_string()],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Returns false when the task does not exist for this user.
    pub fn update_task(&self, user_id: i64, id: Uuid, input: UpdateTaskInput) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3
             WHERE user_id = ?4 AND id = ?5",
            params![
                input.title,
                input.description,
                input.due_date.map(|d| d.to_rfc3339()),
                user_id,
                id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Flips the completion flag and returns the new value, or None when not found.
    pub fn toggle_task(&self, user_id: i64, id: Uuid) -> Result<Option<bool>> {
        let conn = self.conn()?;
        let completed: Option<bool> = conn
            .query_row(
                "SELECT completed FROM tasks WHERE user_id = ?1 AND id = ?2",
                params![user_id, id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(completed) = completed else {
            return Ok(None);
        };
        conn.execute(
            "UPDATE tasks SET completed = ?1 WHERE user_id = ?2 AND id = ?3",
            params![!completed, user_id, id.to_string()],
        )?;
        Ok(Some(!completed))
    }

    pub fn delete_task(&self, user_id: i64, id: Uuid) -> Result<bool> {
        let changed = self.conn()?.execute(
            "DELETE FROM tasks WHERE user_id = ?1 AND id = ?2",
            params![user_id, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    // --- user settings ---

    pub fn get_settings(&self, user_id: i64) -> Result<Option<UserSettings>> {
        let settings = self
            .conn()?
            .query_row(
                "SELECT id, user_id, sort, timezone, notifications_enabled
                 FROM user_settings WHERE user_id = ?1",
                params![user_id],
                row_to_settings,
            )
            .optional()?;
        Ok(settings)
    }

    /// Creates the settings row on first use.
    pub fn set_sort(&self, user_id: i64, sort: SortType) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO user_settings (id, user_id, sort) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET sort = excluded.sort",
            params![Uuid::new_v4().to_string(), user_id, sort.as_str()],
        )?;
        Ok(())
    }

    /// Creates the settings row on first use.
    pub fn set_timezone(&self, user_id: i64, offset_hours: i32) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO user_settings (id, user_id, timezone) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET timezone = excluded.timezone",
            params![Uuid::new_v4().to_string(), user_id, offset_hours.to_string()],
        )?;
        Ok(())
    }
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let due_date: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Task {
        id: parse_uuid(0, &id)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        completed: row.get(4)?,
        due_date: due_date.map(|s| parse_timestamp(5, &s)).transpose()?,
        created_at: parse_timestamp(6, &created_at)?,
    })
}

fn row_to_settings(row: &Row) -> rusqlite::Result<UserSettings> {
    let id: String = row.get(0)?;
    let sort: String = row.get(2)?;
    Ok(UserSettings {
        id: parse_uuid(0, &id)?,
        user_id: row.get(1)?,
        sort: SortType::from_str(&sort).unwrap_or_default(),
        timezone: row.get(3)?,
        notifications_enabled: row.get(4)?,
    })
}

fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn make_task(db: &Database, user_id: i64, title: &str, due: Option<DateTime<Utc>>) -> Task {
        db.create_task(CreateTaskInput {
            user_id,
            title: title.into(),
            description: None,
            due_date: due,
        })
        .unwrap()
    }

    #[test]
    fn create_stores_title_and_defaults_to_pending() {
        let db = test_db();
        let task = make_task(&db, 1, "buy milk", None);
        assert_eq!(task.title, "buy milk");
        assert!(!task.completed);

        let fetched = db.get_task(1, task.id).unwrap().unwrap();
        assert_eq!(fetched.title, "buy milk");
        assert!(!fetched.completed);
        assert!(fetched.due_date.is_none());
    }

    #[test]
    fn tasks_are_scoped_by_user() {
        let db = test_db();
        let task = make_task(&db, 1, "mine", None);
        assert!(db.get_task(2, task.id).unwrap().is_none());
        assert!(!db.delete_task(2, task.id).unwrap());
        assert_eq!(db.list_tasks(2).unwrap().len(), 0);
    }

    #[test]
    fn toggle_twice_restores_state() {
        let db = test_db();
        let task = make_task(&db, 1, "t", None);
        assert_eq!(db.toggle_task(1, task.id).unwrap(), Some(true));
        assert_eq!(db.toggle_task(1, task.id).unwrap(), Some(false));
        assert!(!db.get_task(1, task.id).unwrap().unwrap().completed);
    }

    #[test]
    fn toggle_missing_task_returns_none() {
        let db = test_db();
        assert_eq!(db.toggle_task(1, Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn delete_removes_task() {
        let db = test_db();
        let task = make_task(&db, 1, "t", None);
        assert!(db.delete_task(1, task.id).unwrap());
        assert!(db.get_task(1, task.id).unwrap().is_none());
        assert!(!db.delete_task(1, task.id).unwrap());
    }

    #[test]
    fn update_rewrites_fields() {
        let db = test_db();
        let task = make_task(&db, 1, "old", None);
        let due = Utc::now() + Duration::days(3);
        let updated = db
            .update_task(
                1,
                task.id,
                UpdateTaskInput {
                    title: "new".into(),
                    description: Some("details".into()),
                    due_date: Some(due),
                },
            )
            .unwrap();
        assert!(updated);

        let fetched = db.get_task(1, task.id).unwrap().unwrap();
        assert_eq!(fetched.title, "new");
        assert_eq!(fetched.description.as_deref(), Some("details"));
        assert_eq!(fetched.due_date.map(|d| d.timestamp()), Some(due.timestamp()));
    }

    #[test]
    fn overdue_excludes_completed_future_and_dateless() {
        let db = test_db();
        let now = Utc::now();
        let late = make_task(&db, 1, "late", Some(now - Duration::hours(1)));
        let done = make_task(&db, 1, "done", Some(now - Duration::hours(2)));
        db.toggle_task(1, done.id).unwrap();
        make_task(&db, 1, "future", Some(now + Duration::days(1)));
        make_task(&db, 1, "no due", None);

        let overdue = db.overdue_tasks(1, now).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, late.id);
    }

    #[test]
    fn overdue_comparison_is_strict() {
        let db = test_db();
        let now = Utc::now();
        make_task(&db, 1, "exact", Some(now));
        assert!(db.overdue_tasks(1, now).unwrap().is_empty());
    }

    #[test]
    fn settings_are_created_lazily_and_upserted() {
        let db = test_db();
        assert!(db.get_settings(1).unwrap().is_none());

        db.set_sort(1, SortType::ByTitle).unwrap();
        let settings = db.get_settings(1).unwrap().unwrap();
        assert_eq!(settings.sort, SortType::ByTitle);
        assert_eq!(settings.timezone, "3");

        db.set_timezone(1, -5).unwrap();
        let settings = db.get_settings(1).unwrap().unwrap();
        // The sort choice survives the timezone update.
        assert_eq!(settings.sort, SortType::ByTitle);
        assert_eq!(settings.offset_hours(), -5);
    }

    #[test]
    fn open_creates_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.db");
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        make_task(&db, 1, "persisted", None);
        assert!(path.exists());
        assert_eq!(db.list_tasks(1).unwrap().len(), 1);
    }
}
