use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{routes, AppState};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::projects::router(&state))
        .merge(routes::categories::router())
        .merge(routes::tasks::router(&state))
        .merge(routes::sources::router())
        .merge(routes::mappings::router())
        .merge(routes::tracker::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use db::DBService;
    use services::services::config::Config;
    use tower::ServiceExt;

    use crate::AppState;

    async fn setup_state() -> AppState {
        let db = DBService::new_with_url("sqlite::memory:").await.unwrap();
        AppState::with_parts(db, Config::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = super::router(setup_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "OK");
    }

    #[tokio::test]
    async fn unknown_project_is_404() {
        let app = super::router(setup_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/projects/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn project_create_and_fetch_round_trip() {
        let app = super::router(setup_state().await);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/projects")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Ops","description":"it ops"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let project_id = json["data"]["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/projects/{project_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "Ops");
    }

    #[tokio::test]
    async fn empty_project_name_is_rejected() {
        let app = super::router(setup_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/projects")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn csv_import_reports_per_row_errors() {
        let app = super::router(setup_state().await);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sources")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"remedy"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let source_id = json["data"]["id"].as_str().unwrap().to_string();

        let csv = "incident_id,priority\nINC001,P1\n,P2\nINC003,P3\n";
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/sources/{source_id}/import"))
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(csv))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["inserted"], 2);
        assert_eq!(json["data"]["rejected"], 1);
        assert_eq!(json["data"]["errors"][0]["row"], 2);
    }

    #[tokio::test]
    async fn duplicate_mapping_is_conflict() {
        let app = super::router(setup_state().await);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sources")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"remedy"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let source_id = json["data"]["id"].as_str().unwrap().to_string();

        let mapping = format!(
            r#"{{"source_id":"{source_id}","external_identity_value":"jdoe","internal_user_email":"jdoe@example.com"}}"#
        );
        let post_mapping = |body: String| {
            Request::builder()
                .method("POST")
                .uri("/api/mappings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let response = app.clone().oneshot(post_mapping(mapping.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(post_mapping(mapping)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn tracker_search_without_config_is_bad_request() {
        let app = super::router(setup_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/tracker/search?project_key=OPS&query=OPS-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
