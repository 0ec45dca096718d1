//! Image feed, generation and deletion handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use pixelmint_core::{Image, ImageId, Prompt, UserId};

use crate::auth::AuthUser;
use crate::clerk::Author;
use crate::error::ApiError;
use crate::state::AppState;
use crate::workflow;

/// Default and maximum feed length.
pub const MAX_FEED_LIMIT: usize = 100;

/// Feed query parameters.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Maximum number of images (default and cap: 100).
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FeedQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(MAX_FEED_LIMIT).min(MAX_FEED_LIMIT)
    }
}

/// A feed entry.
#[derive(Debug, Serialize)]
pub struct ImageView {
    /// The image record.
    #[serde(flatten)]
    pub image: Image,
    /// Author profile, when the user directory knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

/// Image creation request.
#[derive(Debug, Deserialize)]
pub struct CreateImageRequest {
    /// Prompt text (1 to 500 characters).
    pub prompt: String,
}

/// Deletion response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `true`.
    pub deleted: bool,
}

/// Global feed, newest first.
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<ImageView>>, ApiError> {
    let images = state.store.list_images(query.limit()).await?;
    Ok(Json(with_authors(&state, images).await))
}

/// The caller's images, newest first.
pub async fn list_my_images(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<Image>>, ApiError> {
    let images = state
        .store
        .list_images_by_author(&auth.user_id, query.limit())
        .await?;
    Ok(Json(images))
}

/// The caller's most recent image, or `null`.
pub async fn latest_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Option<Image>>, ApiError> {
    Ok(Json(state.store.latest_image_by_author(&auth.user_id).await?))
}

/// Generate a new image. Costs one credit.
///
/// The prompt is validated before the caller is authenticated.
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    auth: Result<AuthUser, ApiError>,
    body: Result<Json<CreateImageRequest>, JsonRejection>,
) -> Result<Json<Image>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let prompt = Prompt::parse(request.prompt).map_err(|e| ApiError::Validation(e.to_string()))?;
    let auth = auth?;

    let image = workflow::spawn_create_image(state, auth.user_id, prompt).await?;
    Ok(Json(image))
}

/// Delete one of the caller's images.
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let image_id: ImageId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid image id: {id}")))?;

    let image = state
        .store
        .get_image(&image_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image not found: {image_id}")))?;

    if image.author_id != auth.user_id {
        tracing::warn!(
            user_id = %auth.user_id,
            image_id = %image_id,
            "Refusing to delete another user's image"
        );
        return Err(ApiError::Forbidden);
    }

    state.store.delete_image(&image_id).await?;
    tracing::info!(user_id = %auth.user_id, image_id = %image_id, "Image deleted");

    Ok(Json(DeleteResponse { deleted: true }))
}

/// Attach author profiles when a directory is configured.
async fn with_authors(state: &AppState, images: Vec<Image>) -> Vec<ImageView> {
    let mut authors: HashMap<String, Author> = HashMap::new();

    if let Some(directory) = state.directory.as_deref() {
        let mut ids: Vec<UserId> = images.iter().map(|i| i.author_id.clone()).collect();
        ids.sort();
        ids.dedup();

        match directory.lookup(&ids).await {
            Ok(found) => {
                authors = found.into_iter().map(|a| (a.id.clone(), a)).collect();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Author lookup failed, serving feed without authors");
            }
        }
    }

    images
        .into_iter()
        .map(|image| {
            let author = authors.get(image.author_id.as_str()).cloned();
            ImageView { image, author }
        })
        .collect()
}
