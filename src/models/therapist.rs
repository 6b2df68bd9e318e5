use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Therapist stored in the `therapists` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Therapist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_reviews: i32,
    pub description: String,
    pub experience: i32,
    #[serde(default)]
    pub clients_helped: i32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cal_com_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cal_com_event_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TherapistResponse {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub total_reviews: i32,
    pub description: String,
    pub experience: i32,
    pub clients_helped: i32,
    pub image_url: String,
    pub is_popular: bool,
    pub is_available: bool,
    pub cal_com_user_id: Option<String>,
    pub cal_com_event_type_id: Option<String>,
}

impl From<Therapist> for TherapistResponse {
    fn from(t: Therapist) -> Self {
        TherapistResponse {
            id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: t.name,
            specialty: t.specialty,
            rating: t.rating,
            total_reviews: t.total_reviews,
            description: t.description,
            experience: t.experience,
            clients_helped: t.clients_helped,
            image_url: t.image_url,
            is_popular: t.is_popular,
            is_available: t.is_available,
            cal_com_user_id: t.cal_com_user_id,
            cal_com_event_type_id: t.cal_com_event_type_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTherapistRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub description: Option<String>,
    pub experience: Option<i32>,
    pub rating: Option<f64>,
    pub total_reviews: Option<i32>,
    pub clients_helped: Option<i32>,
    pub image_url: Option<String>,
    pub is_popular: Option<bool>,
    pub is_available: Option<bool>,
    pub cal_com_user_id: Option<String>,
    pub cal_com_event_type_id: Option<String>,
}

impl CreateTherapistRequest {
    /// Names of required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.specialty) {
            missing.push("specialty");
        }
        if blank(&self.description) {
            missing.push("description");
        }
        if self.experience.is_none() {
            missing.push("experience");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let request = CreateTherapistRequest {
            name: Some("Dr. Lee".into()),
            specialty: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(request.missing_fields(), vec!["specialty", "description", "experience"]);
    }

    #[test]
    fn test_document_defaults() {
        let raw = mongodb::bson::doc! {
            "name": "Dr. Lee",
            "specialty": "Anxiety",
            "description": "CBT",
            "experience": 8,
        };
        let therapist: Therapist = mongodb::bson::from_document(raw).unwrap();
        assert!(therapist.is_available);
        assert!(!therapist.is_popular);
        assert_eq!(therapist.rating, 0.0);
    }
}
