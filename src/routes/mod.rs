mod error;
pub mod health;
pub mod prompts;

use axum::{
    Router,
    routing::{get, post},
};
pub use error::ApiError;

use crate::AppState;

/// Prompt management routes.
pub fn prompt_routes() -> Router<AppState> {
    Router::new()
        .route("/prompts", get(prompts::list).post(prompts::create))
        .route("/prompts/search", post(prompts::search))
        .route(
            "/prompts/{id}",
            get(prompts::get)
                .put(prompts::update)
                .delete(prompts::delete),
        )
}
