//! Image endpoints used by the flashcard client
//!
//! - `POST /api/find-best-image`: always answers (curated fallback at worst)
//! - `POST /api/validate-image`: needs the evaluator key
//! - `POST /api/validate-category`: needs the evaluator key
//! - `POST /api/find-better-image`: needs the evaluator key; 404 when nothing passes

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::services::PipelineError;
use crate::types::{CategoryItemValidation, ImageSearchResult, ImageValidation, WordRequest};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindBestImageRequest {
    pub category: String,
    pub word: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateImageRequest {
    pub image_url: String,
    pub english_word: String,
    #[serde(default)]
    pub german_translation: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub english: String,
    #[serde(default)]
    pub german: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCategoryRequest {
    pub vocabulary_items: Vec<VocabularyItem>,
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindBetterImageRequest {
    pub english_word: String,
    #[serde(default)]
    pub german_translation: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindBetterImageResponse {
    pub image_url: String,
    pub validation: ImageValidation,
}

fn require_word(word: &str) -> ApiResult<()> {
    if word.trim().is_empty() {
        return Err(ApiError::BadRequest("word must not be empty".to_string()));
    }
    Ok(())
}

fn require_image_url(url: &str) -> ApiResult<()> {
    if url.trim().is_empty() {
        return Err(ApiError::BadRequest("imageUrl must not be empty".to_string()));
    }
    Ok(())
}

/// POST /api/find-best-image
///
/// **Request:** `{"category": "animals", "word": "cat", "translation": "Katze"}`
/// **Response:** `{"bestImageUrl": "...", "confidence": 0.95, "reasoning": "...", "logicCheck": true}`
pub async fn find_best_image(
    State(state): State<AppState>,
    Json(payload): Json<FindBestImageRequest>,
) -> ApiResult<Json<ImageSearchResult>> {
    require_word(&payload.word)?;

    let request = WordRequest::new(payload.word.trim(), payload.translation, payload.category);
    let result = state.pipeline.find_best_image(&request).await;
    Ok(Json(result))
}

/// POST /api/validate-image
///
/// **Errors:**
/// - 400 Bad Request: empty word or URL, or evaluator key not configured
pub async fn validate_image(
    State(state): State<AppState>,
    Json(payload): Json<ValidateImageRequest>,
) -> ApiResult<Json<ImageValidation>> {
    require_word(&payload.english_word)?;
    require_image_url(&payload.image_url)?;

    let request = WordRequest::new(
        payload.english_word.trim(),
        payload.german_translation,
        payload.category,
    );
    let validation = state
        .pipeline
        .validate_image(&request, &payload.image_url)
        .await?;

    info!(
        word = %request.word,
        is_valid = validation.is_valid,
        confidence = validation.confidence,
        "Image validated"
    );
    Ok(Json(validation))
}

/// POST /api/validate-category
///
/// Items are validated one after another, in request order.
pub async fn validate_category(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCategoryRequest>,
) -> ApiResult<Json<Vec<CategoryItemValidation>>> {
    let mut items = Vec::with_capacity(payload.vocabulary_items.len());
    for item in payload.vocabulary_items {
        require_word(&item.english)?;
        require_image_url(&item.image_url)?;
        items.push((
            WordRequest::new(item.english.trim(), item.german, payload.category.clone()),
            item.image_url,
        ));
    }

    let results = state.pipeline.validate_category(&items).await?;

    info!(
        category = %payload.category,
        items = results.len(),
        invalid = results.iter().filter(|r| !r.validation.is_valid).count(),
        "Category validated"
    );
    Ok(Json(results))
}

/// POST /api/find-better-image
///
/// **Errors:**
/// - 400 Bad Request: empty word, or evaluator key not configured
/// - 404 Not Found: no search candidate passed the evaluator
pub async fn find_better_image(
    State(state): State<AppState>,
    Json(payload): Json<FindBetterImageRequest>,
) -> ApiResult<Json<FindBetterImageResponse>> {
    require_word(&payload.english_word)?;

    if !state.pipeline.status().evaluation_enabled {
        return Err(PipelineError::EvaluatorUnavailable.into());
    }

    let request = WordRequest::new(
        payload.english_word.trim(),
        payload.german_translation,
        payload.category,
    );

    match state.pipeline.find_better_image(&request).await {
        Some((image_url, validation)) => Ok(Json(FindBetterImageResponse {
            image_url,
            validation,
        })),
        None => Err(ApiError::NotFound(format!(
            "No better image found for '{}'",
            request.word
        ))),
    }
}

/// Build image routes
pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/api/find-best-image", post(find_best_image))
        .route("/api/validate-image", post(validate_image))
        .route("/api/validate-category", post(validate_category))
        .route("/api/find-better-image", post(find_better_image))
}
