use crate::{
    database::{MongoDB, THERAPISTS},
    models::{CreateTherapistRequest, Therapist},
    utils::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};

async fn find_sorted(db: &MongoDB, filter: Document, sort: Option<Document>) -> Result<Vec<Therapist>, AppError> {
    let collection = db.collection::<Therapist>(THERAPISTS);
    let cursor = match sort {
        Some(sort) => collection.find(filter).sort(sort).await?,
        None => collection.find(filter).await?,
    };
    Ok(cursor.try_collect().await?)
}

pub async fn list_all(db: &MongoDB) -> Result<Vec<Therapist>, AppError> {
    find_sorted(db, doc! {}, None).await
}

pub async fn list_popular(db: &MongoDB) -> Result<Vec<Therapist>, AppError> {
    find_sorted(db, doc! { "isPopular": true }, Some(doc! { "rating": -1 })).await
}

pub async fn list_available(db: &MongoDB) -> Result<Vec<Therapist>, AppError> {
    find_sorted(db, doc! { "isAvailable": true }, Some(doc! { "rating": -1 })).await
}

/// Case-insensitive literal match on name or specialty.
pub fn search_filter(keyword: &str) -> Document {
    let pattern = regex::escape(keyword.trim());
    doc! {
        "$or": [
            { "name": { "$regex": &pattern, "$options": "i" } },
            { "specialty": { "$regex": &pattern, "$options": "i" } },
        ]
    }
}

pub async fn search(db: &MongoDB, keyword: Option<&str>) -> Result<Vec<Therapist>, AppError> {
    let keyword = keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("keyword is required".to_string()))?;

    log::info!("🔍 Searching therapists for \"{}\"", keyword);
    find_sorted(db, search_filter(keyword), None).await
}

pub async fn get_by_id(db: &MongoDB, id: &str) -> Result<Therapist, AppError> {
    let oid = ObjectId::parse_str(id)
        .map_err(|_| AppError::InvalidRequest("Invalid therapist ID format".to_string()))?;

    db.collection::<Therapist>(THERAPISTS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Therapist not found".to_string()))
}

/// Builds the document to insert; `Err` carries the missing field names.
pub fn build_therapist(request: CreateTherapistRequest) -> Result<Therapist, Vec<&'static str>> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(missing);
    }

    let now = BsonDateTime::now();
    Ok(Therapist {
        id: None,
        name: request.name.unwrap_or_default().trim().to_string(),
        specialty: request.specialty.unwrap_or_default().trim().to_string(),
        rating: request.rating.unwrap_or(0.0),
        total_reviews: request.total_reviews.unwrap_or(0),
        description: request.description.unwrap_or_default(),
        experience: request.experience.unwrap_or_default(),
        clients_helped: request.clients_helped.unwrap_or(0),
        image_url: request.image_url.unwrap_or_default(),
        is_popular: request.is_popular.unwrap_or(false),
        is_available: request.is_available.unwrap_or(true),
        cal_com_user_id: request.cal_com_user_id,
        cal_com_event_type_id: request.cal_com_event_type_id,
        created_at: Some(now),
        updated_at: Some(now),
    })
}

pub async fn create(db: &MongoDB, mut therapist: Therapist) -> Result<Therapist, AppError> {
    let result = db
        .collection::<Therapist>(THERAPISTS)
        .insert_one(&therapist)
        .await?;
    therapist.id = result.inserted_id.as_object_id();

    log::info!("✅ Therapist created: {}", therapist.name);
    Ok(therapist)
}
