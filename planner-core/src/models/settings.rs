use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback UTC offset (hours) when a user has not picked a timezone.
pub const DEFAULT_OFFSET_HOURS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: Uuid,
    pub user_id: i64,
    pub sort: SortType,
    /// UTC offset in whole hours, stored as text.
    pub timezone: String,
    pub notifications_enabled: bool,
}

impl UserSettings {
    pub fn offset_hours(&self) -> i32 {
        self.timezone.parse().unwrap_or(DEFAULT_OFFSET_HOURS)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    ByDate,
    #[default]
    ByStatus,
    ByTitle,
}

impl SortType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByDate => "by_date",
            Self::ByStatus => "by_status",
            Self::ByTitle => "by_title",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "by_date" => Some(Self::ByDate),
            "by_status" => Some(Self::ByStatus),
            "by_title" => Some(Self::ByTitle),
            _ => None,
        }
    }
}
