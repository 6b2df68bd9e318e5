use crate::{
    database::{MongoDB, FEEDS},
    models::{default_author, CreateFeedRequest, FeedItem, Meditation},
    utils::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

pub const MEDITATIONS: [Meditation; 6] = [
    Meditation {
        title: "Yoga Nidra For Sleep",
        duration: "18 min",
        category: "Sleep",
        author: "Satvic Yoga",
        image: "https://cdn.pixabay.com/photo/2024/04/19/22/25/man-8707406_1280.png",
        description: "A deep relaxation yoga practice that helps calm the nervous system and promote deep sleep.",
        url: "https://youtu.be/uPSml_JQGVY?si=uAuuvPDMDQlV7az4",
    },
    Meditation {
        title: "Deep Sleep Guided Meditation",
        duration: "120 min",
        category: "Sleep",
        author: "Lauren Gale",
        image: "https://images.pexels.com/photos/8263101/pexels-photo-8263101.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2",
        description: "A long, guided meditation session to help you relax and fall into a deep and peaceful sleep.",
        url: "https://youtu.be/gnmlcfZdnBg?si=A1-zDZKzwSmkWp5v",
    },
    Meditation {
        title: "Breathing Into Sleep",
        duration: "30 min",
        category: "Sleep",
        author: "Ally Boothroyd",
        image: "https://images.pexels.com/photos/289586/pexels-photo-289586.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2",
        description: "This 30-minute guided sleep meditation combines gentle pranayama, deep relaxation, and ocean wave sounds to help you fall asleep quickly and overcome insomnia.",
        url: "https://youtu.be/1G2he0jYOl0?si=b0HrMUXJoqycxjPd",
    },
    Meditation {
        title: "Peaceful Sleep Meditation",
        duration: "7 min",
        category: "Sleep",
        author: "Tone It Up",
        image: "https://images.pexels.com/photos/8261185/pexels-photo-8261185.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2",
        description: "This evening meditation promotes relaxation, gratitude, and stress release, facilitating a peaceful transition into sleep and setting a positive tone for the next day.",
        url: "https://youtu.be/PZqvrttn7-c?si=TL0g5ApoQLeyDnsv",
    },
    Meditation {
        title: "Morning Yoga Flow",
        duration: "22 min",
        category: "Yoga",
        author: "Adriene",
        image: "https://images.pexels.com/photos/4056723/pexels-photo-4056723.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2",
        description: "This 21-minute breath-focused morning flow combines core activation, mobility exercises, and mindful movement to cultivate a peaceful mind, strong body, and positive mindset for the day ahead.",
        url: "https://youtu.be/LqXZ628YNj4?si=xt_7MZQOyGHjODUX",
    },
    Meditation {
        title: "Meditation for Focus",
        duration: "10 min",
        category: "Meditation",
        author: "Declutter The Mind",
        image: "https://i.imgur.com/M5qCCV4_d.webp?maxwidth=760&fidelity=grand",
        description: "This 10-minute voice-only guided meditation uses breath awareness and mindfulness to enhance concentration, clarity, and focus for improved productivity in work, school, or daily life.",
        url: "https://youtu.be/ausxoXBrmWs?si=SXMNeKsuMVvtOfxK",
    },
];

impl From<&Meditation> for FeedItem {
    fn from(m: &Meditation) -> Self {
        FeedItem {
            id: None,
            title: m.title.to_string(),
            author: m.author.to_string(),
            category: m.category.to_string(),
            duration: m.duration.to_string(),
            description: Some(m.description.to_string()),
            image: Some(m.image.to_string()),
            url: m.url.to_string(),
            created_at: BsonDateTime::now(),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validates the request; `Err` names the missing required fields.
pub fn build_feed_item(request: CreateFeedRequest) -> Result<FeedItem, AppError> {
    let title = present(request.title);
    let category = present(request.category);
    let duration = present(request.duration);
    let url = present(request.url);

    let missing: Vec<&str> = [
        ("title", title.is_none()),
        ("category", category.is_none()),
        ("duration", duration.is_none()),
        ("url", url.is_none()),
    ]
    .iter()
    .filter(|(_, absent)| *absent)
    .map(|(name, _)| *name)
    .collect();

    let (Some(title), Some(category), Some(duration), Some(url)) = (title, category, duration, url) else {
        return Err(AppError::InvalidRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    Ok(FeedItem {
        id: None,
        title,
        author: present(request.author).unwrap_or_else(default_author),
        category,
        duration,
        description: present(request.description),
        image: present(request.image),
        url,
        created_at: BsonDateTime::now(),
    })
}

pub async fn list(db: &MongoDB) -> Result<Vec<FeedItem>, AppError> {
    let cursor = db.collection::<FeedItem>(FEEDS).find(doc! {}).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn get_by_id(db: &MongoDB, id: &str) -> Result<FeedItem, AppError> {
    let oid = ObjectId::parse_str(id).map_err(|_| AppError::NotFound("Feed not found".to_string()))?;
    db.collection::<FeedItem>(FEEDS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Feed not found".to_string()))
}

pub async fn create(db: &MongoDB, mut item: FeedItem) -> Result<FeedItem, AppError> {
    let result = db.collection::<FeedItem>(FEEDS).insert_one(&item).await?;
    item.id = result.inserted_id.as_object_id();

    log::info!("📰 Feed item added: {}", item.title);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_defaults_to_unknown() {
        let item = build_feed_item(CreateFeedRequest {
            title: Some("Box breathing".into()),
            category: Some("Breathing".into()),
            duration: Some("5 min".into()),
            url: Some("https://example.com/box".into()),
            author: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(item.author, "Unknown");
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = build_feed_item(CreateFeedRequest {
            title: Some("Box breathing".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: category, duration, url");
    }

    #[test]
    fn test_meditation_catalogue() {
        assert_eq!(MEDITATIONS.len(), 6);
        assert!(MEDITATIONS.iter().all(|m| m.url.starts_with("https://")));

        let item = FeedItem::from(&MEDITATIONS[4]);
        assert_eq!(item.category, "Yoga");
        assert_eq!(item.author, "Adriene");
    }
}
