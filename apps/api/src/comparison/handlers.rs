//! Axum route handlers for resume version comparison.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::comparison::service::ComparisonResult;
use crate::errors::AppError;
use crate::models::resume_version::VersionHistoryEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default, rename = "versionId1", alias = "version_id_1")]
    pub version_id_1: Option<Uuid>,
    #[serde(default, rename = "versionId2", alias = "version_id_2")]
    pub version_id_2: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

/// POST /api/resume/versions/compare
pub async fn handle_compare(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonResult>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(id1), Some(id2)) = (request.version_id_1, request.version_id_2) else {
        return Err(AppError::BadRequest(
            "Both version IDs required".to_string(),
        ));
    };

    let result = state.comparison.compare(user.user_id, id1, id2).await?;
    Ok(Json(result))
}

/// GET /api/resume/versions/history?limit=N
pub async fn handle_history(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<VersionHistoryEntry>>, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let limit = match params.limit.as_deref() {
        Some(raw) => parse_limit(raw)?,
        None => state.config.history_default_limit,
    };

    let history = state.comparison.list_history(user.user_id, limit).await?;
    Ok(Json(history))
}

fn parse_limit(raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!(
            "limit must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::testing::create_token;
    use crate::comparison::service::{ComparisonService, OwnershipPolicy};
    use crate::comparison::store::testing::InMemoryVersionStore;
    use crate::config::Config;
    use crate::models::resume_version::ResumeVersion;
    use crate::routes::build_router;

    const SECRET: &str = "handler-test-secret";

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            jwt_secret: SECRET.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            diff_line_limit: 100,
            history_default_limit: 10,
            compare_ownership: OwnershipPolicy::Unrestricted,
        }
    }

    fn version(owner: Uuid, label: &str, content: &str, age_days: i64) -> ResumeVersion {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        ResumeVersion {
            id: Uuid::new_v4(),
            owner_id: owner,
            label: label.to_string(),
            content: content.to_string(),
            skills: Default::default(),
            match_score: None,
            created_at: base - Duration::days(age_days),
        }
    }

    fn app(versions: Vec<ResumeVersion>) -> Router {
        let config = test_config();
        let comparison = ComparisonService::new(
            Arc::new(InMemoryVersionStore::with_versions(versions)),
            config.diff_line_limit,
            config.compare_ownership,
        );
        build_router(AppState { config, comparison })
    }

    fn bearer(user: Uuid) -> String {
        format!(
            "Bearer {}",
            create_token(&user.to_string(), SECRET, Duration::minutes(5))
        )
    }

    fn compare_request(auth: Option<String>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/resume/versions/compare")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn history_request(auth: &str, query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/resume/versions/history{query}"))
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("5").unwrap(), 5);
        assert_eq!(parse_limit(" 12 ").unwrap(), 12);
        assert!(parse_limit("ten").is_err());
        assert!(parse_limit("0").is_err());
        assert!(parse_limit("-1").is_err());
    }

    #[tokio::test]
    async fn test_compare_ok() {
        let user = Uuid::new_v4();
        let v1 = version(user, "General", "Jane\nRust\n", 2);
        let v2 = version(user, "Fintech", "Jane\nRust\nSQL\n", 1);
        let body = json!({ "versionId1": v1.id, "versionId2": v2.id });

        let response = app(vec![v1, v2])
            .oneshot(compare_request(Some(bearer(user)), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["version1"]["version_name"], "General");
        assert_eq!(json["statistics"]["length_change"], 4);
        assert_eq!(json["differences"]["text_diff"][2]["type"], "added");
        assert_eq!(json["differences"]["text_diff"][2]["content"], "SQL\n");
    }

    #[tokio::test]
    async fn test_compare_accepts_snake_case_ids() {
        let user = Uuid::new_v4();
        let v1 = version(user, "a", "x", 2);
        let v2 = version(user, "b", "x", 1);
        let body = json!({ "version_id_1": v1.id, "version_id_2": v2.id });

        let response = app(vec![v1, v2])
            .oneshot(compare_request(Some(bearer(user)), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_compare_unknown_version_is_404() {
        let user = Uuid::new_v4();
        let v1 = version(user, "a", "x", 1);
        let body = json!({ "versionId1": v1.id, "versionId2": Uuid::new_v4() });

        let response = app(vec![v1])
            .oneshot(compare_request(Some(bearer(user)), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("differences").is_none());
    }

    #[tokio::test]
    async fn test_compare_missing_id_is_400() {
        let user = Uuid::new_v4();
        let body = json!({ "versionId1": Uuid::new_v4() });

        let response = app(vec![])
            .oneshot(compare_request(Some(bearer(user)), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_malformed_id_is_400() {
        let user = Uuid::new_v4();
        let body = json!({ "versionId1": "abc", "versionId2": "def" });

        let response = app(vec![])
            .oneshot(compare_request(Some(bearer(user)), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_without_token_is_401() {
        let body = json!({ "versionId1": Uuid::new_v4(), "versionId2": Uuid::new_v4() });
        let response = app(vec![])
            .oneshot(compare_request(None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_compare_with_bad_token_is_401() {
        let body = json!({ "versionId1": Uuid::new_v4(), "versionId2": Uuid::new_v4() });
        let response = app(vec![])
            .oneshot(compare_request(Some("Bearer not-a-jwt".to_string()), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_history_default_and_explicit_limit() {
        let user = Uuid::new_v4();
        let versions: Vec<ResumeVersion> = (0..12)
            .map(|i| version(user, &format!("v{i}"), "", i))
            .collect();
        let newest = versions[0].id;
        let router = app(versions);
        let auth = bearer(user);

        let response = router
            .clone()
            .oneshot(history_request(&auth, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 10);
        assert_eq!(json[0]["id"], newest.to_string());
        assert!(json[0].get("content").is_none());

        let response = router
            .oneshot(history_request(&auth, "?limit=3"))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[2]["version_name"], "v2");
    }

    #[tokio::test]
    async fn test_history_non_numeric_limit_is_400() {
        let user = Uuid::new_v4();
        let response = app(vec![])
            .oneshot(history_request(&bearer(user), "?limit=abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_malformed_query_is_json_400() {
        let user = Uuid::new_v4();
        let response = app(vec![])
            .oneshot(history_request(&bearer(user), "?limit=1&limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_history_only_lists_callers_versions() {
        let user = Uuid::new_v4();
        let mine = version(user, "mine", "", 1);
        let theirs = version(Uuid::new_v4(), "theirs", "", 0);
        let mine_id = mine.id;

        let response = app(vec![mine, theirs])
            .oneshot(history_request(&bearer(user), ""))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], mine_id.to_string());
    }
}
