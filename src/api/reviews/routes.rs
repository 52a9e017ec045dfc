use crate::api::models::AppState;
use crate::api::reviews::handlers::{list_reviews_handler, submit_review_handler};
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_reviews_handler).post(submit_review_handler))
}
