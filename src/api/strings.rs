use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use string_analysis_backend::analysis::{fingerprint, AnalyzedString};
use string_analysis_backend::db::StoreError;
use string_analysis_backend::filter::{QueryError, QueryErrorKind};
use string_analysis_backend::models::{
    InterpretedQuery, ListStringsQuery, NaturalLanguageQuery, NaturalLanguageResponse,
    StringListResponse, StringResponse,
};

use super::{error_response, internal_error, ApiError};
use crate::state::AppState;

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Duplicate(_) => {
            error_response(StatusCode::CONFLICT, "String already exists in the system")
        }
        other => internal_error(other),
    }
}

fn query_error(e: QueryError) -> ApiError {
    let (status, message) = match e.kind() {
        QueryErrorKind::Parse => (StatusCode::BAD_REQUEST, "Unable to parse natural language query"),
        QueryErrorKind::Conflict => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Query parsed but resulted in conflicting filters",
        ),
    };
    (
        status,
        Json(json!({
            "error": message,
            "detail": e.to_string(),
            "fields": e.fields(),
        })),
    )
}

/// POST /strings - 分析并保存字符串
pub async fn create_string(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StringResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Invalid request body or missing \"value\" field")
    })?;

    let value = match body.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid data type for \"value\" (must be string)",
            ))
        }
        None => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request body or missing \"value\" field",
            ))
        }
    };

    let record = AnalyzedString::new(value);
    state.store.insert(&record).await.map_err(store_error)?;

    Ok((StatusCode::CREATED, Json(StringResponse::from(&record))))
}

/// GET /strings/:string_value - 查询指定字符串
pub async fn get_string(
    State(state): State<Arc<AppState>>,
    Path(string_value): Path<String>,
) -> Result<Json<StringResponse>, ApiError> {
    let record = state
        .store
        .get(&fingerprint(&string_value))
        .await
        .map_err(store_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "String does not exist in the system"))?;

    Ok(Json(StringResponse::from(&record)))
}

/// GET /strings - 按结构化条件过滤
pub async fn list_strings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListStringsQuery>, QueryRejection>,
) -> Result<Json<StringListResponse>, ApiError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!("Rejected query parameters: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Invalid query parameter values or types")
    })?;

    let criteria = query
        .into_criteria()
        .map_err(|msg| error_response(StatusCode::BAD_REQUEST, msg))?;

    let records = state.store.filter(&criteria).await.map_err(store_error)?;
    let data: Vec<StringResponse> = records.iter().map(StringResponse::from).collect();

    Ok(Json(StringListResponse {
        count: data.len(),
        data,
        filters_applied: criteria,
    }))
}

/// GET /strings/filter-by-natural-language - 自然语言过滤
pub async fn filter_by_natural_language(
    State(state): State<Arc<AppState>>,
    query: Result<Query<NaturalLanguageQuery>, QueryRejection>,
) -> Result<Json<NaturalLanguageResponse>, ApiError> {
    let Query(query) = query.map_err(|_| {
        error_response(StatusCode::BAD_REQUEST, "Invalid query parameter values or types")
    })?;

    let text = query.query.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Missing \"query\" parameter"));
    }

    let max_len = state.config.query.max_query_length;
    if text.chars().count() > max_len {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Query is longer than {} characters", max_len),
        ));
    }

    let criteria = state.translator.translate(&text).map_err(|e| {
        tracing::info!("Natural language query rejected: {}", e);
        query_error(e)
    })?;

    let records = state.store.filter(&criteria).await.map_err(store_error)?;
    let data: Vec<StringResponse> = records.iter().map(StringResponse::from).collect();

    Ok(Json(NaturalLanguageResponse {
        count: data.len(),
        data,
        interpreted_query: InterpretedQuery {
            original: text,
            parsed_filters: criteria,
        },
    }))
}

/// DELETE /strings/:string_value - 删除字符串
pub async fn delete_string(
    State(state): State<Arc<AppState>>,
    Path(string_value): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store
        .delete(&fingerprint(&string_value))
        .await
        .map_err(store_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(StatusCode::NOT_FOUND, "String does not exist in the system"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use axum::{
        body::Body,
        http::{header, Request},
        Router,
    };
    use http_body_util::BodyExt;
    use string_analysis_backend::config::AppConfig;
    use string_analysis_backend::db::{self, StringStore};
    use string_analysis_backend::filter::{RuleSet, Translator};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let state = AppState::new(
            StringStore::new(pool),
            Translator::new(RuleSet::standard().unwrap()),
            AppConfig::default(),
        );
        router(Arc::new(state))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/strings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn seed(app: &Router, values: &[&str]) {
        for value in values {
            let (status, _) = send(app, post(&json!({ "value": value }).to_string())).await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    fn values(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["value"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_create_racecar() {
        let app = test_app().await;
        let (status, body) = send(&app, post(r#"{"value": "racecar"}"#)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], fingerprint("racecar").as_str());
        assert_eq!(body["properties"]["length"], 7);
        assert_eq!(body["properties"]["is_palindrome"], true);
        assert_eq!(body["properties"]["unique_characters"], 4);
        assert_eq!(body["properties"]["word_count"], 1);
        assert_eq!(body["properties"]["sha256_hash"], body["id"]);
        assert!(body["created_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let app = test_app().await;
        seed(&app, &["hello"]).await;
        let (status, body) = send(&app, post(r#"{"value": "hello"}"#)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_bad_bodies() {
        let app = test_app().await;
        assert_eq!(send(&app, post(r#"{}"#)).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(send(&app, post("not json")).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(
            send(&app, post(r#"{"value": 42}"#)).await.0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_create_empty_string() {
        let app = test_app().await;
        let (status, body) = send(&app, post(r#"{"value": ""}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["properties"]["length"], 0);
        assert_eq!(body["properties"]["is_palindrome"], true);
        assert_eq!(body["properties"]["character_frequency_map"], json!({}));
    }

    #[tokio::test]
    async fn test_get_string() {
        let app = test_app().await;
        seed(&app, &["hello world"]).await;

        let (status, body) = send(&app, get("/strings/hello%20world")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "hello world");
        assert_eq!(body["properties"]["word_count"], 2);

        let (status, _) = send(&app, get("/strings/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let app = test_app().await;
        seed(&app, &["racecar", "hello world", "level", "noon"]).await;

        let (status, body) = send(&app, get("/strings?is_palindrome=true&min_length=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(values(&body), vec!["racecar", "level"]);
        assert_eq!(body["count"], 2);
        assert_eq!(body["filters_applied"], json!({"is_palindrome": true, "min_length": 5}));

        let (_, body) = send(&app, get("/strings?contains_character=z")).await;
        assert_eq!(body["count"], 0);

        let (_, body) = send(&app, get("/strings?palindrome=false")).await;
        assert_eq!(values(&body), vec!["hello world"]);

        let (_, body) = send(&app, get("/strings")).await;
        assert_eq!(body["count"], 4);
        assert_eq!(body["filters_applied"], json!({}));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_parameters() {
        let app = test_app().await;
        for uri in [
            "/strings?min_length=5&max_length=3",
            "/strings?contains_character=ab",
            "/strings?min_length=abc",
            "/strings?is_palindrome=maybe",
        ] {
            let (status, body) = send(&app, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_natural_language_filter() {
        let app = test_app().await;
        seed(&app, &["racecar", "hello world", "level", "step on no pets"]).await;

        let (status, body) = send(
            &app,
            get("/strings/filter-by-natural-language?query=all%20single%20word%20palindromic%20strings"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(values(&body), vec!["racecar", "level"]);
        assert_eq!(body["interpreted_query"]["original"], "all single word palindromic strings");
        assert_eq!(
            body["interpreted_query"]["parsed_filters"],
            json!({"word_count": 1, "is_palindrome": true})
        );

        let (_, body) = send(
            &app,
            get("/strings/filter-by-natural-language?query=strings+longer+than+10+characters"),
        )
        .await;
        assert_eq!(values(&body), vec!["hello world", "step on no pets"]);
        assert_eq!(body["interpreted_query"]["parsed_filters"], json!({"min_length": 11}));
    }

    #[tokio::test]
    async fn test_natural_language_errors() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            get("/strings/filter-by-natural-language?query=gibberish%20query%20with%20no%20patterns"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, body) = send(
            &app,
            get("/strings/filter-by-natural-language?query=strings%20with%20exactly%202%20words%20and%20exactly%203%20words"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"], json!(["word_count"]));

        let (status, _) = send(
            &app,
            get("/strings/filter-by-natural-language?query=strings%20longer%20than%202%20words"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            get("/strings/filter-by-natural-language?query=strings%20containing%20a%20letter%20z"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interpreted_query"]["parsed_filters"], json!({"contains_character": "z"}));

        let (status, _) = send(&app, get("/strings/filter-by-natural-language")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let long_query = format!("/strings/filter-by-natural-language?query={}", "a".repeat(600));
        let (status, _) = send(&app, get(&long_query)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_string() {
        let app = test_app().await;
        seed(&app, &["bye"]).await;

        let (status, body) = send(&app, delete("/strings/bye")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, delete("/strings/bye")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get("/strings/bye")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }
}
