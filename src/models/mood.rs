use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moods a user can log, with their chart value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum MoodKind {
    Happy,
    Sad,
    Calm,
    Angry,
    Relaxed,
}

impl MoodKind {
    pub const ALL: [MoodKind; 5] = [
        MoodKind::Happy,
        MoodKind::Sad,
        MoodKind::Calm,
        MoodKind::Angry,
        MoodKind::Relaxed,
    ];

    pub fn value(self) -> i32 {
        match self {
            MoodKind::Sad => 1,
            MoodKind::Calm => 2,
            MoodKind::Happy => 3,
            MoodKind::Angry => 4,
            MoodKind::Relaxed => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodKind::Happy => "Happy",
            MoodKind::Sad => "Sad",
            MoodKind::Calm => "Calm",
            MoodKind::Angry => "Angry",
            MoodKind::Relaxed => "Relaxed",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }
}

impl fmt::Display for MoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodKind::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Invalid mood: {}", s))
    }
}

pub fn day_key(date: BsonDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(date.timestamp_millis())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Mood entry stored in the `moods` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub mood: MoodKind,
    pub mood_value: i32,
    pub date: BsonDateTime,
    /// UTC calendar day of `date` (`YYYY-MM-DD`), unique per user
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl Mood {
    pub fn new(user_id: String, mood: MoodKind, notes: String, date: BsonDateTime) -> Self {
        Self {
            id: None,
            user_id,
            mood,
            mood_value: mood.value(),
            date,
            day: day_key(date),
            notes,
            created_at: date,
            updated_at: date,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodResponse {
    pub id: String,
    pub user_id: String,
    pub mood: MoodKind,
    pub mood_value: i32,
    pub date: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Mood> for MoodResponse {
    fn from(mood: Mood) -> Self {
        MoodResponse {
            id: mood.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: mood.user_id,
            mood: mood.mood,
            mood_value: mood.mood_value,
            date: mood.date.try_to_rfc3339_string().unwrap_or_default(),
            notes: mood.notes,
            created_at: mood.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: mood.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// Latest mood value per weekday; 0 where nothing was logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct WeeklyMoods {
    #[serde(rename = "Mon")]
    pub mon: i32,
    #[serde(rename = "Tue")]
    pub tue: i32,
    #[serde(rename = "Wed")]
    pub wed: i32,
    #[serde(rename = "Thu")]
    pub thu: i32,
    #[serde(rename = "Fri")]
    pub fri: i32,
    #[serde(rename = "Sat")]
    pub sat: i32,
    #[serde(rename = "Sun")]
    pub sun: i32,
}

impl WeeklyMoods {
    pub fn slot_mut(&mut self, weekday: chrono::Weekday) -> &mut i32 {
        use chrono::Weekday::*;
        match weekday {
            Mon => &mut self.mon,
            Tue => &mut self.tue,
            Wed => &mut self.wed,
            Thu => &mut self.thu,
            Fri => &mut self.fri,
            Sat => &mut self.sat,
            Sun => &mut self.sun,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodRequest {
    pub user_id: Option<String>,
    pub mood: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodQuery {
    pub user_id: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
