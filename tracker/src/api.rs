use crate::config::{CorsConfig, Listener as ListenerConfig};
use crate::pipeline::Pipeline;
use crate::types::Trajectory;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid CORS origin {0}")]
    InvalidOrigin(String),
}

pub async fn serve(
    listener: &ListenerConfig,
    cors: &CorsConfig,
    pipeline: Pipeline,
) -> Result<(), ApiError> {
    let app = router(pipeline, cors)?;

    let addr = format!("{}:{}", listener.host, listener.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(pipeline: Pipeline, cors: &CorsConfig) -> Result<Router, ApiError> {
    Ok(Router::new()
        .route("/", get(status))
        .route("/windborne", get(windborne))
        .layer(cors_layer(cors)?)
        .with_state(pipeline))
}

/// Browsers may call with credentials from the configured origins only.
/// Credentials rule out wildcards, so methods and headers are mirrored.
fn cors_layer(cors: &CorsConfig) -> Result<CorsLayer, ApiError> {
    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            // `AllowOrigin::list` panics on a wildcard
            if origin.trim() == "*" {
                return Err(ApiError::InvalidOrigin(origin.clone()));
            }
            HeaderValue::from_str(origin).map_err(|_| ApiError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

async fn status() -> StatusResponse {
    StatusResponse {
        status: "Windborne tracker running",
    }
}

/// Upstream failures only ever mean missing data, so this always answers 200.
async fn windborne(State(pipeline): State<Pipeline>) -> Json<Vec<Trajectory>> {
    Json(pipeline.run().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::fetcher::SourceFetcher;
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(base_url: String) -> Router {
        let config = SourceConfig {
            base_url,
            timeout_secs: 2,
        };
        let pipeline = Pipeline::new(SourceFetcher::new(reqwest::Client::new(), &config));
        router(pipeline, &CorsConfig::default()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status() {
        let response = app("http://127.0.0.1:1".into())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status": "Windborne tracker running"})
        );
    }

    #[tokio::test]
    async fn test_windborne() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/00.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[[10.0, 20.0, 100.0]]"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/01.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[[9.0, 19.0, \"bad\"]]"))
            .mount(&mock_server)
            .await;

        let response = app(mock_server.uri())
            .oneshot(Request::get("/windborne").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let balloons = body.as_array().unwrap();
        assert_eq!(balloons.len(), 1);
        assert_eq!(balloons[0]["id"], "WB-1");
        assert_eq!(balloons[0]["color"], "#00ffea");

        let path = balloons[0]["path"].as_array().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0]["alt"], 0.0);
        assert_eq!(path[1]["alt"], 100.0);
        let older = path[0]["time"].as_i64().unwrap();
        let newer = path[1]["time"].as_i64().unwrap();
        assert_eq!(newer - older, 3_600_000);
    }

    #[tokio::test]
    async fn test_windborne_upstream_down() {
        // Nothing listens here, every fetch fails
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let response = app(format!("http://127.0.0.1:{port}"))
            .oneshot(Request::get("/windborne").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_cors() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/windborne")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = app("http://127.0.0.1:1".into()).oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let request = Request::get("/")
            .header(header::ORIGIN, "http://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app("http://127.0.0.1:1".into()).oneshot(request).await.unwrap();
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn test_invalid_origin() {
        let cors = CorsConfig {
            allowed_origins: vec!["http://bad\norigin".into()],
        };
        assert!(matches!(
            cors_layer(&cors).unwrap_err(),
            ApiError::InvalidOrigin(_)
        ));
    }

    #[test]
    fn test_wildcard_origin_is_an_error() {
        let cors = CorsConfig {
            allowed_origins: vec!["*".into()],
        };
        assert!(matches!(
            cors_layer(&cors).unwrap_err(),
            ApiError::InvalidOrigin(_)
        ));

        let config = SourceConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
        };
        let pipeline = Pipeline::new(SourceFetcher::new(reqwest::Client::new(), &config));
        assert!(router(pipeline, &cors).is_err());
    }
}
