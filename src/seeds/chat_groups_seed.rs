use crate::database::{MongoDB, CHAT_GROUPS};
use crate::models::ChatGroup;
use crate::services::chat_group_service;
use crate::utils::AppError;
use mongodb::bson::{doc, Document};

pub const DEFAULT_GROUPS: [(&str, &str); 5] = [
    (
        "Mind Haven",
        "A peaceful space for mindfulness and mental wellness. Share experiences and support on your journey to peace.",
    ),
    (
        "Brighter Days",
        "Focus on positivity and hope. Share uplifting stories and encouragement for brighter days ahead.",
    ),
    (
        "Safe Space Chat",
        "A judgment-free zone where you can express yourself openly. Support and understanding for all.",
    ),
    (
        "Soulful Support",
        "Deep conversations about life challenges and growth. Connect with others on a meaningful level.",
    ),
    (
        "Rise Together",
        "Community for motivation and overcoming obstacles. Share victories and encourage each other to rise.",
    ),
];

pub fn build_default_groups() -> Vec<ChatGroup> {
    DEFAULT_GROUPS
        .iter()
        .map(|(name, description)| ChatGroup::new(name.to_string(), description.to_string()))
        .collect()
}

/// Creates the default groups, each with its welcome message, when the
/// collection is empty. Returns how many groups were created.
pub async fn seed_default_groups(db: &MongoDB) -> Result<usize, AppError> {
    let existing = db
        .collection::<Document>(CHAT_GROUPS)
        .count_documents(doc! {})
        .await?;

    if existing > 0 {
        log::info!("👥 Chat groups: {} already in DB, skipping seed", existing);
        return Ok(0);
    }

    log::info!("👥 Chat groups: seeding {} default groups...", DEFAULT_GROUPS.len());
    let mut created = 0;
    for group in build_default_groups() {
        let group = chat_group_service::insert_group(db, group).await?;
        log::info!("   ✅ {} ({})", group.name, group.members_label());
        created += 1;
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_MAX_MEMBERS;

    #[test]
    fn test_default_groups_start_empty() {
        let groups = build_default_groups();
        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| g.members_list.is_empty() && g.max_members == DEFAULT_MAX_MEMBERS));
        assert_eq!(groups[0].members_label(), "0/10");
        assert_eq!(groups[4].name, "Rise Together");
    }
}
