//! Content API tools: `fetch_genre` and `fetch_story`.
//!
//! Both GET a random item from the genre/story content API. Failures are
//! never raised: they come back as `Error fetching <kind>: <message>` so the
//! model always receives usable tool text.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Genre,
    Story,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Story => "story",
        }
    }

    fn tool_name(&self) -> &'static str {
        match self {
            Self::Genre => "fetch_genre",
            Self::Story => "fetch_story",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Genre => "Fetches a random genre from the Genrenator API.",
            Self::Story => "Fetches a random story from the Genrenator API.",
        }
    }
}

pub struct ContentApiTool {
    kind: ContentKind,
    url: String,
    client: reqwest::Client,
}

impl ContentApiTool {
    pub fn new(kind: ContentKind, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            kind,
            url: format!("{}/{}/", base_url.trim_end_matches('/'), kind.as_str()),
            client,
        }
    }

    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))?
            .error_for_status()?;
        let data: Value = response.json().await.context("invalid JSON body")?;
        if is_falsy(&data) {
            bail!("No {} data found", self.kind.as_str());
        }
        Ok(match data {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

/// Empty or zero-like JSON values carry no content.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[async_trait]
impl Tool for ContentApiTool {
    fn name(&self) -> &str {
        self.kind.tool_name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<String> {
        Ok(match self.fetch().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("fetch_{} failed: {:#}", self.kind.as_str(), e);
                format!("Error fetching {}: {:#}", self.kind.as_str(), e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    /// Serve `app` on an ephemeral port and return its base URL.
    async fn spawn_api(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    fn tool(kind: ContentKind, base: &str) -> ContentApiTool {
        ContentApiTool::new(kind, base, reqwest::Client::new())
    }

    #[test]
    fn test_metadata() {
        let genre = tool(ContentKind::Genre, "http://localhost/api/");
        assert_eq!(genre.name(), "fetch_genre");
        assert_eq!(genre.url, "http://localhost/api/genre/");
        assert!(genre.parameters_schema()["properties"]
            .as_object()
            .unwrap()
            .is_empty());
        assert_eq!(tool(ContentKind::Story, "http://x").name(), "fetch_story");
    }

    #[test]
    fn test_falsy_values() {
        for value in [json!(null), json!(""), json!({}), json!([]), json!(false), json!(0)] {
            assert!(is_falsy(&value), "{value} should be falsy");
        }
        for value in [json!("doom jazz"), json!({"a": 1}), json!([1]), json!(true), json!(3)] {
            assert!(!is_falsy(&value), "{value} should be truthy");
        }
    }

    #[tokio::test]
    async fn test_returns_string_body() {
        let base = spawn_api(Router::new().route(
            "/genre/",
            get(|| async { Json(json!("triangle video game listening")) }),
        ))
        .await;
        let out = tool(ContentKind::Genre, &base).execute(json!({})).await.unwrap();
        assert_eq!(out, "triangle video game listening");
    }

    #[tokio::test]
    async fn test_object_body_is_rendered_as_json() {
        let base = spawn_api(Router::new().route(
            "/story/",
            get(|| async { Json(json!({"story": "a bard and a lich"})) }),
        ))
        .await;
        let out = tool(ContentKind::Story, &base).execute(json!({})).await.unwrap();
        assert_eq!(out, r#"{"story":"a bard and a lich"}"#);
    }

    #[tokio::test]
    async fn test_empty_body_is_error_text() {
        let base = spawn_api(Router::new().route("/genre/", get(|| async { Json(json!({})) }))).await;
        let out = tool(ContentKind::Genre, &base).execute(json!({})).await.unwrap();
        assert!(out.starts_with("Error fetching genre:"), "{out}");
        assert!(out.contains("No genre data found"));
    }

    #[tokio::test]
    async fn test_http_503_is_error_text() {
        let base = spawn_api(Router::new().route(
            "/genre/",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        let out = tool(ContentKind::Genre, &base).execute(json!({})).await.unwrap();
        assert!(out.starts_with("Error fetching genre: "), "{out}");
        assert!(out.contains("503"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let out = tool(ContentKind::Story, &base).execute(json!({})).await.unwrap();
        assert!(out.starts_with("Error fetching story: "), "{out}");
    }
}
