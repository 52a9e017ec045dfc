use crate::api::models::*;
use crate::storage::TIMESTAMP_FORMAT;
use axum::{
    Json,
    extract::{Form, Query, State},
    http::StatusCode,
};
use chrono::Local;
use tracing::info;
use uuid::Uuid;

/// List reviews matching the query, best sentiment first.
pub async fn list_reviews_handler(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<ReviewItem>>, AppError> {
    let filter = query.into_filter()?;

    // Score every surviving review fresh; nothing is cached on the record
    let mut items: Vec<ReviewItem> = state
        .store
        .select(&filter)
        .into_iter()
        .map(|review| ReviewItem {
            review_id: review.review_id.clone(),
            review_body: review.review_body.clone(),
            location: review.location.clone(),
            timestamp: review.timestamp.clone(),
            sentiment: state.scorer.score(&review.review_body),
        })
        .collect();

    // Stable sort: ties keep store order
    items.sort_by(|a, b| b.sentiment.compound.total_cmp(&a.sentiment.compound));

    info!(returned = items.len(), "Listed reviews");

    Ok(Json(items))
}

/// Accept a review submission.
///
/// The review is scored and echoed back with a fresh id and timestamp but
/// never enters the store, so it does not show up in later listings.
pub async fn submit_review_handler(
    State(state): State<AppState>,
    Form(form): Form<SubmitReviewForm>,
) -> Result<(StatusCode, Json<SubmittedReview>), AppError> {
    form.validate().map_err(AppError::BadRequest)?;

    let location = form.location.unwrap_or_default();
    let review_body = form.review_body.unwrap_or_default();

    let sentiment = state.scorer.score(&review_body);
    let review_id = Uuid::new_v4().to_string();
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    info!(%review_id, %location, "Accepted review");

    Ok((
        StatusCode::CREATED,
        Json(SubmittedReview {
            review_id,
            review_body,
            location,
            timestamp,
            sentiment,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::models::AppState;
    use crate::api::reviews::routes;
    use crate::sentiment::VaderScorer;
    use crate::storage::{ReviewStore, TIMESTAMP_FORMAT};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SAMPLE_CSV: &str = "\
ReviewId,ReviewBody,Location,Timestamp
r1,The room had a bed.,\"Phoenix, Arizona\",2023-01-15 10:00:00
r2,Great stay! Wonderful staff.,\"Phoenix, Arizona\",2023-03-20 18:30:00
r3,Terrible experience. Awful.,\"Denver, Colorado\",2023-02-01 09:15:00
r4,The room had a bed.,\"Tucson, Arizona\",2023-02-10 12:00:00
r5,Nice pool.,\"Springfield, Illinois\",2023-04-01 08:00:00
";

    fn app() -> Router {
        let store = Arc::new(ReviewStore::from_reader(SAMPLE_CSV.as_bytes()).unwrap());
        let state = AppState {
            store,
            scorer: Arc::new(VaderScorer::new()),
        };
        routes().with_state(state)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_form(body: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn compounds(items: &Value) -> Vec<f64> {
        items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["sentiment"]["compound"].as_f64().unwrap())
            .collect()
    }

    fn ids(items: &Value) -> Vec<String> {
        items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["ReviewId"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn unfiltered_get_returns_everything_sorted_by_compound() {
        let (status, items) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.as_array().unwrap().len(), 5);

        let scores = compounds(&items);
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
        // Clearly positive text leads, clearly negative trails
        assert_eq!(ids(&items).first().map(String::as_str), Some("r2"));
        assert_eq!(ids(&items).last().map(String::as_str), Some("r3"));
    }

    #[tokio::test]
    async fn ties_keep_store_order() {
        // r1 and r4 share the same neutral body, so their scores tie
        let (_, items) = get_json("/").await;
        let ids = ids(&items);
        let pos_r1 = ids.iter().position(|id| id == "r1").unwrap();
        let pos_r4 = ids.iter().position(|id| id == "r4").unwrap();
        assert!(pos_r1 < pos_r4);
    }

    #[tokio::test]
    async fn sort_order_is_repeatable() {
        let (_, first) = get_json("/").await;
        let (_, second) = get_json("/").await;
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn location_filter_returns_only_that_location() {
        let (status, items) = get_json("/?location=Phoenix%2C%20Arizona").await;
        assert_eq!(status, StatusCode::OK);
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(
            items
                .iter()
                .all(|item| item["Location"] == "Phoenix, Arizona")
        );
    }

    #[tokio::test]
    async fn location_outside_allow_list_yields_empty_result() {
        // r5 has that exact location, but it is not a recognized one
        let (status, items) = get_json("/?location=Springfield%2C%20Illinois").await;
        assert_eq!(status, StatusCode::OK);
        assert!(items.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_date_excludes_earlier_reviews() {
        let (status, items) = get_json("/?start_date=2023-02-01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!ids(&items).contains(&"r1".to_string()));
        assert!(ids(&items).contains(&"r2".to_string()));
    }

    #[tokio::test]
    async fn malformed_start_date_is_a_bad_request() {
        let (status, body) = get_json("/?start_date=01-15-2023").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start_date"));
    }

    #[tokio::test]
    async fn post_with_missing_body_is_rejected() {
        let (status, body) = post_form("Location=Phoenix%2C+Arizona").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing required parameters 'ReviewBody' or 'Location'"
        );
    }

    #[tokio::test]
    async fn post_with_empty_body_is_rejected() {
        let (status, body) = post_form("Location=Phoenix%2C+Arizona&ReviewBody=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing required parameters 'ReviewBody' or 'Location'"
        );
    }

    #[tokio::test]
    async fn post_with_unknown_location_is_rejected() {
        let (status, body) =
            post_form("Location=Nowhere%2C+Nowhere&ReviewBody=Great+stay%21").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid location");
    }

    #[tokio::test]
    async fn valid_post_returns_created_review() {
        let (status, body) =
            post_form("Location=Phoenix%2C+Arizona&ReviewBody=Great+stay%21").await;
        assert_eq!(status, StatusCode::CREATED);

        assert!(!body["ReviewId"].as_str().unwrap().is_empty());
        assert_eq!(body["ReviewBody"], "Great stay!");
        assert_eq!(body["Location"], "Phoenix, Arizona");
        chrono::NaiveDateTime::parse_from_str(
            body["Timestamp"].as_str().unwrap(),
            TIMESTAMP_FORMAT,
        )
        .unwrap();
        assert!(body["Sentiment"]["compound"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn resubmitting_same_text_gives_new_id_same_scores() {
        let form = "Location=Phoenix%2C+Arizona&ReviewBody=Great+stay%21";
        let (_, first) = post_form(form).await;
        let (_, second) = post_form(form).await;

        assert_ne!(first["ReviewId"], second["ReviewId"]);
        assert_eq!(first["Sentiment"], second["Sentiment"]);
    }

    #[tokio::test]
    async fn submission_does_not_enter_the_store() {
        let store = Arc::new(ReviewStore::from_reader(SAMPLE_CSV.as_bytes()).unwrap());
        let state = AppState {
            store: store.clone(),
            scorer: Arc::new(VaderScorer::new()),
        };
        let app = routes().with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "Location=Phoenix%2C+Arizona&ReviewBody=Great+stay%21",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.len(), 5);
    }
}
