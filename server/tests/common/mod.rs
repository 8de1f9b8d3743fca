//! Shared helpers for server integration tests.

#![allow(dead_code)]

use formsync_server::{app, config::Config, db::Db, AppState};
use formsync_engine::ConflictStrategy;
use serde_json::{json, Value};

/// A server running on an ephemeral port for the duration of a test.
pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_strategy(strategy: ConflictStrategy) -> Self {
        Self::with_config(Config {
            conflict_strategy: strategy,
            ..Config::default()
        })
        .await
    }

    pub async fn with_config(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(AppState::new(Db::new_shared(), config));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Create a contact form and return its id.
    pub async fn create_contact_form(&self) -> String {
        let response = self
            .client
            .post(self.url("/api/forms"))
            .json(&contact_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

/// A form with a required name and email and an optional age.
pub fn contact_form() -> Value {
    json!({
        "title": "Contact",
        "published": true,
        "schema": {
            "elements": [
                {
                    "id": "details",
                    "type": "section",
                    "elements": [
                        {"id": "name", "type": "text", "label": "Name", "required": true,
                         "validation": [{"type": "minLength", "value": 2, "message": "Name is too short"}]},
                        {"id": "email", "type": "email", "label": "Email", "required": true}
                    ]
                },
                {"id": "age", "type": "number", "label": "Age",
                 "validation": [{"type": "min", "value": 18, "message": "Must be an adult"}]}
            ]
        }
    })
}
