use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use super::ApiError;
use crate::{
    AppState,
    models::{CreatePrompt, PageQuery, Prompt, PromptPage, PromptSearch, UpdatePrompt},
};

/// Create a prompt
///
/// Tags named in the request that do not exist yet are created.
#[cfg_attr(feature = "utoipa", utoipa::path(
    post,
    path = "/prompts",
    tag = "prompts",
    operation_id = "prompt_create",
    request_body = CreatePrompt,
    responses(
        (status = 201, description = "Prompt created", body = Prompt),
        (status = 422, description = "Invalid request", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.create", skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    input: Result<Json<CreatePrompt>, JsonRejection>,
) -> Result<(StatusCode, Json<Prompt>), ApiError> {
    let Json(input) = input?;
    let prompt = state.services.prompts.create(input).await?;
    Ok((StatusCode::CREATED, Json(prompt)))
}

/// List prompts, newest first
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/prompts",
    tag = "prompts",
    operation_id = "prompt_list",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of prompts", body = PromptPage),
        (status = 422, description = "skip or limit out of range", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.list", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PromptPage>, ApiError> {
    let Query(page) = query?;
    let page = state.services.prompts.list(page).await?;
    Ok(Json(page))
}

/// Get a prompt by ID
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_get",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Prompt found", body = Prompt),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.get", skip(state))]
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Prompt>, ApiError> {
    let Path(id) = id?;
    let prompt = state.services.prompts.get(id).await?;
    Ok(Json(prompt))
}

/// Update a prompt
///
/// Only the fields present in the body change. A `tags` list replaces the
/// prompt's tags; `null` or `[]` removes them all.
#[cfg_attr(feature = "utoipa", utoipa::path(
    put,
    path = "/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_update",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    request_body = UpdatePrompt,
    responses(
        (status = 200, description = "Prompt updated", body = Prompt),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
        (status = 422, description = "Invalid request", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.update", skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    input: Result<Json<UpdatePrompt>, JsonRejection>,
) -> Result<Json<Prompt>, ApiError> {
    let Path(id) = id?;
    let Json(input) = input?;
    let prompt = state.services.prompts.update(id, input).await?;
    Ok(Json(prompt))
}

/// Delete a prompt
///
/// Tags attached to the prompt are kept.
#[cfg_attr(feature = "utoipa", utoipa::path(
    delete,
    path = "/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_delete",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 204, description = "Prompt deleted"),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.delete", skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.services.prompts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search prompts
///
/// Text matches are case-insensitive substrings of the title, description or
/// full prompt. Every listed tag must be attached to a match.
#[cfg_attr(feature = "utoipa", utoipa::path(
    post,
    path = "/prompts/search",
    tag = "prompts",
    operation_id = "prompt_search",
    params(PageQuery),
    request_body = PromptSearch,
    responses(
        (status = 200, description = "Page of matching prompts", body = PromptPage),
        (status = 422, description = "Invalid request", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "api.prompts.search", skip(state, search))]
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
    search: Result<Json<PromptSearch>, JsonRejection>,
) -> Result<Json<PromptPage>, ApiError> {
    let Query(page) = query?;
    let Json(search) = search?;
    let page = state.services.prompts.search(search, page).await?;
    Ok(Json(page))
}
