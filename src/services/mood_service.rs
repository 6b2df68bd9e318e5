use crate::{
    database::{MongoDB, MOODS},
    models::{day_key, Mood, MoodKind, WeeklyMoods},
    services::auth_service::is_duplicate_key,
    utils::AppError,
};
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_document, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub connected: bool,
    pub database_name: String,
    pub collections: Vec<String>,
    pub moods_collection: bool,
    pub environment: String,
}

fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Start of the UTC day seven days before `now`.
pub fn week_start(now: DateTime<Utc>) -> BsonDateTime {
    let start = (now - Duration::days(7)).date_naive().and_time(NaiveTime::MIN).and_utc();
    to_bson(start)
}

/// Latest value per weekday; expects `moods` newest first.
pub fn aggregate_weekly(moods: &[Mood]) -> WeeklyMoods {
    let mut weekly = WeeklyMoods::default();
    let mut seen = [false; 7];

    for mood in moods {
        let Some(date) = Utc.timestamp_millis_opt(mood.date.timestamp_millis()).single() else {
            continue;
        };
        let weekday = date.weekday();
        let idx = weekday.num_days_from_monday() as usize;
        if !seen[idx] {
            seen[idx] = true;
            *weekly.slot_mut(weekday) = mood.mood_value;
        }
    }
    weekly
}

/// Page defaults to 1, limit to 10 and is capped at 50. Returns (page, limit, skip).
pub fn normalize_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64, u64) {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let limit = limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

pub fn require_user_id(user_id: Option<&str>) -> Result<&str, AppError> {
    user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("userId is required".to_string()))
}

pub async fn weekly_moods(db: &MongoDB, user_id: &str) -> Result<WeeklyMoods, AppError> {
    let since = week_start(Utc::now());
    log::info!("📅 Fetching moods since {} for user {}", since, user_id);

    let moods: Vec<Mood> = db
        .collection::<Mood>(MOODS)
        .find(doc! { "userId": user_id, "date": { "$gte": since } })
        .sort(doc! { "date": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(aggregate_weekly(&moods))
}

pub async fn today_mood(db: &MongoDB, user_id: &str) -> Result<Option<Mood>, AppError> {
    let day = day_key(BsonDateTime::now());
    Ok(db
        .collection::<Mood>(MOODS)
        .find_one(doc! { "userId": user_id, "day": day })
        .await?)
}

/// Fields written only when today's entry is created. The filter supplies `userId` and `day`.
pub fn insert_fields(entry: &Mood) -> Result<Document, AppError> {
    let mut fields = to_document(entry).map_err(|e| AppError::Internal(e.to_string()))?;
    fields.remove("userId");
    fields.remove("day");
    Ok(fields)
}

/// Upsert for today's entry: mood and timestamp always change,
/// notes only when given, everything else is set on insert.
pub fn today_update(fresh: &Mood, replace_notes: bool) -> Result<Document, AppError> {
    let mut set = doc! {
        "mood": fresh.mood.as_str(),
        "moodValue": fresh.mood_value,
        "updatedAt": fresh.updated_at,
    };
    if replace_notes {
        set.insert("notes", &fresh.notes);
    }

    let mut on_insert = insert_fields(fresh)?;
    for key in set.keys() {
        on_insert.remove(key);
    }

    Ok(doc! { "$set": set, "$setOnInsert": on_insert })
}

fn fresh_entry(user_id: &str, mood: MoodKind, notes: String) -> Mood {
    let mut entry = Mood::new(user_id.to_string(), mood, notes, BsonDateTime::now());
    entry.id = Some(ObjectId::new());
    entry
}

/// Atomic upsert on (userId, day); returns the document as it was before.
/// A concurrent insert of the same day surfaces as a duplicate key and is retried once, matching the winner.
async fn upsert_today(db: &MongoDB, entry: &Mood, update: Document) -> Result<Option<Mood>, AppError> {
    let collection = db.collection::<Mood>(MOODS);
    let filter = doc! { "userId": &entry.user_id, "day": &entry.day };

    let first = collection
        .find_one_and_update(filter.clone(), update.clone())
        .upsert(true)
        .return_document(ReturnDocument::Before)
        .await;

    match first {
        Ok(previous) => Ok(previous),
        Err(e) if is_duplicate_key(&e) => {
            log::debug!("🔁 Concurrent mood write for {} on {}, retrying", entry.user_id, entry.day);
            Ok(collection
                .find_one_and_update(filter, update)
                .upsert(true)
                .return_document(ReturnDocument::Before)
                .await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Stores today's mood unless one exists. Returns the entry and whether it already existed.
pub async fn add_mood(
    db: &MongoDB,
    user_id: &str,
    mood: MoodKind,
    notes: Option<String>,
) -> Result<(Mood, bool), AppError> {
    let entry = fresh_entry(user_id, mood, notes.unwrap_or_default());
    let update = doc! { "$setOnInsert": insert_fields(&entry)? };

    match upsert_today(db, &entry, update).await? {
        Some(existing) => {
            log::info!("ℹ️  User {} already has a mood ({}) for today", user_id, existing.mood);
            Ok((existing, true))
        }
        None => {
            log::info!("✅ Mood saved for user {}: {} ({})", user_id, mood, mood.value());
            Ok((entry, false))
        }
    }
}

/// Changes today's entry, or creates one. Returns the entry and whether it was created.
pub async fn update_today_mood(
    db: &MongoDB,
    user_id: &str,
    mood: MoodKind,
    notes: Option<String>,
) -> Result<(Mood, bool), AppError> {
    let notes = notes.filter(|n| !n.is_empty());
    let replace_notes = notes.is_some();
    let fresh = fresh_entry(user_id, mood, notes.unwrap_or_default());

    match upsert_today(db, &fresh, today_update(&fresh, replace_notes)?).await? {
        Some(mut existing) => {
            existing.mood = mood;
            existing.mood_value = mood.value();
            if replace_notes {
                existing.notes = fresh.notes;
            }
            existing.updated_at = fresh.updated_at;

            log::info!("✏️  Mood updated for user {}: {}", user_id, mood);
            Ok((existing, false))
        }
        None => {
            log::info!("✅ Mood saved for user {}: {} ({})", user_id, mood, mood.value());
            Ok((fresh, true))
        }
    }
}

pub async fn clear_moods(db: &MongoDB, user_id: &str) -> Result<u64, AppError> {
    let result = db
        .collection::<Mood>(MOODS)
        .delete_many(doc! { "userId": user_id })
        .await?;
    log::info!("🗑️  Cleared {} mood entries for user {}", result.deleted_count, user_id);
    Ok(result.deleted_count)
}

pub async fn mood_history(
    db: &MongoDB,
    user_id: &str,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<(Vec<Mood>, Pagination), AppError> {
    let (page, limit, skip) = normalize_paging(page, limit);
    let collection = db.collection::<Mood>(MOODS);

    let moods: Vec<Mood> = collection
        .find(doc! { "userId": user_id })
        .sort(doc! { "date": -1 })
        .skip(skip)
        .limit(limit as i64)
        .await?
        .try_collect()
        .await?;

    let total = collection.count_documents(doc! { "userId": user_id }).await?;
    Ok((moods, Pagination::new(total, page, limit)))
}

pub async fn database_status(db: &MongoDB, environment: &str) -> DatabaseStatus {
    let connected = db.ping().await;
    let collections = if connected {
        db.collection_names().await.unwrap_or_else(|e| {
            log::warn!("⚠️  Could not list collections: {}", e);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    DatabaseStatus {
        connected,
        database_name: db.database().name().to_string(),
        moods_collection: collections.iter().any(|c| c == MOODS),
        collections,
        environment: environment.to_string(),
    }
}

/// Deletes moods dated before `days` days ago.
pub async fn prune_older_than(db: &MongoDB, days: i64) -> Result<u64, AppError> {
    let cutoff = to_bson(Utc::now() - Duration::days(days));
    let result = db
        .collection::<Mood>(MOODS)
        .delete_many(doc! { "date": { "$lt": cutoff } })
        .await?;
    Ok(result.deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn mood(kind: MoodKind, when: &str) -> Mood {
        Mood::new("u1".into(), kind, String::new(), to_bson(at(when)))
    }

    #[test]
    fn test_week_start_is_seven_days_back() {
        assert_eq!(week_start(at("2024-03-14T09:00:00Z")), to_bson(at("2024-03-07T00:00:00Z")));
    }

    #[test]
    fn test_weekly_keeps_most_recent_per_day() {
        // Newest first, as the query sorts
        let moods = vec![
            mood(MoodKind::Relaxed, "2024-03-14T20:00:00Z"), // Thursday
            mood(MoodKind::Sad, "2024-03-14T08:00:00Z"),
            mood(MoodKind::Calm, "2024-03-11T12:00:00Z"), // Monday
        ];
        let weekly = aggregate_weekly(&moods);

        assert_eq!(weekly.thu, 5);
        assert_eq!(weekly.mon, 2);
        assert_eq!(weekly.sun, 0);
    }

    #[test]
    fn test_insert_fields_leave_filter_keys_out() {
        let entry = fresh_entry("u1", MoodKind::Happy, "slept well".into());
        let fields = insert_fields(&entry).unwrap();

        assert!(!fields.contains_key("userId"));
        assert!(!fields.contains_key("day"));
        assert_eq!(fields.get_object_id("_id").unwrap(), entry.id.unwrap());
        assert_eq!(fields.get_str("mood").unwrap(), "Happy");
        assert_eq!(fields.get_str("notes").unwrap(), "slept well");
    }

    #[test]
    fn test_today_update_keeps_notes_unless_given() {
        let fresh = fresh_entry("u1", MoodKind::Sad, String::new());
        let update = today_update(&fresh, false).unwrap();
        let set = update.get_document("$set").unwrap();
        let on_insert = update.get_document("$setOnInsert").unwrap();

        assert_eq!(set.get_str("mood").unwrap(), "Sad");
        assert_eq!(set.get_i32("moodValue").unwrap(), 1);
        assert!(!set.contains_key("notes"));
        assert_eq!(on_insert.get_str("notes").unwrap(), "");

        let fresh = fresh_entry("u1", MoodKind::Sad, "rough day".into());
        let update = today_update(&fresh, true).unwrap();
        assert_eq!(update.get_document("$set").unwrap().get_str("notes").unwrap(), "rough day");
        assert!(!update.get_document("$setOnInsert").unwrap().contains_key("notes"));
    }

    #[test]
    fn test_today_update_paths_do_not_overlap() {
        let fresh = fresh_entry("u1", MoodKind::Calm, "note".into());
        for replace_notes in [false, true] {
            let update = today_update(&fresh, replace_notes).unwrap();
            let set = update.get_document("$set").unwrap();
            let on_insert = update.get_document("$setOnInsert").unwrap();
            assert!(set.keys().all(|k| !on_insert.contains_key(k)));
        }
    }

    #[test]
    fn test_paging_defaults_and_cap() {
        assert_eq!(normalize_paging(None, None), (1, 10, 0));
        assert_eq!(normalize_paging(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(normalize_paging(Some(0), Some(500)), (1, 50, 0));
    }

    #[test]
    fn test_pagination_page_count() {
        assert_eq!(Pagination::new(21, 1, 10).pages, 3);
        assert_eq!(Pagination::new(0, 1, 10).pages, 0);
        assert_eq!(Pagination::new(20, 2, 10).pages, 2);
    }

    #[test]
    fn test_user_id_required() {
        assert!(require_user_id(None).is_err());
        assert!(require_user_id(Some("  ")).is_err());
        assert_eq!(require_user_id(Some("u1")).unwrap(), "u1");
    }
}
