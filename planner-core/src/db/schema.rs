pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    due_date TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_settings (
    id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    sort TEXT NOT NULL DEFAULT 'by_status' CHECK (sort IN ('by_date', 'by_status', 'by_title')),
    timezone TEXT NOT NULL DEFAULT '3',
    notifications_enabled INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);

-- One settings row per user
CREATE UNIQUE INDEX IF NOT EXISTS idx_settings_user
    ON user_settings(user_id);
"#;
