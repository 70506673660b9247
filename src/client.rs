//! Blocking HTTP transport for the crash-analytics backend.
//!
//! One request per invocation: `describe`, `query`, `login`, or a raw object
//! fetch. The backend reports failures either as a bare string or as an
//! object with a `message` member; both normalize into [`ClientError::Api`]
//! here so nothing downstream branches on value shape.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::Credentials;
use crate::query::Query;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A backend-reported failure, already reduced to its message.
    #[error("{message}")]
    Api { message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ClientError {
    /// The `invalid token` failure gets a re-login hint at print time.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Api { message } if message == "invalid token")
    }
}

/// One attribute from a `describe` response.
#[derive(Clone, Debug, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub format: Option<String>,
}

/// Transport handle bound to one endpoint and, after login, one token.
pub struct ApiClient {
    endpoint: String,
    token: Option<String>,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(
        endpoint: &str,
        token: Option<&str>,
        insecure: bool,
    ) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
            http,
        })
    }

    /// Authenticate and return the credentials to persist.
    pub fn login(&self, username: &str, password: &str) -> Result<Credentials, ClientError> {
        let body = self.post(
            "/api/login",
            &[],
            &json!({"username": username, "password": password}),
        )?;
        serde_json::from_value(body.clone())
            .map_err(|_| ClientError::Shape(format!("login response: {body}")))
    }

    /// Fetch attribute metadata for a project.
    pub fn describe(&self, universe: &str, project: &str) -> Result<Vec<Attribute>, ClientError> {
        let body = self.post(
            "/api/describe",
            &[("universe", universe), ("project", project)],
            &json!({}),
        )?;
        let describe = body
            .get("describe")
            .cloned()
            .ok_or_else(|| ClientError::Shape("describe response missing 'describe'".to_string()))?;
        serde_json::from_value(describe)
            .map_err(|err| ClientError::Shape(format!("describe list: {err}")))
    }

    /// Issue the single aggregation query of this invocation and return the
    /// raw response body.
    pub fn query(&self, universe: &str, project: &str, query: &Query) -> Result<Value, ClientError> {
        self.post(
            "/api/query",
            &[("universe", universe), ("project", project)],
            &serde_json::to_value(query)
                .map_err(|err| ClientError::Shape(format!("query serialization: {err}")))?,
        )
    }

    /// Fetch one object's raw record.
    pub fn get_object(
        &self,
        universe: &str,
        project: &str,
        object: &str,
    ) -> Result<Value, ClientError> {
        self.post(
            "/api/get",
            &[
                ("universe", universe),
                ("project", project),
                ("object", object),
            ],
            &json!({}),
        )
    }

    fn post(
        &self,
        path: &str,
        params: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{path}", self.endpoint);
        debug!(%url, ?params, "request");

        let mut request = self.http.post(&url).query(params).json(body);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        debug!(%status, bytes = text.len(), "response");

        let parsed: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    message: format!("{status}"),
                });
            }
            Err(err) => return Err(ClientError::Shape(format!("response body: {err}"))),
        };

        if let Some(error) = parsed.get("error") {
            return Err(normalize_error(error));
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                message: format!("{status}"),
            });
        }
        Ok(parsed)
    }
}

/// Reduce the backend's duck-typed error value (bare string, or object with a
/// `message`) to one message.
fn normalize_error(error: &Value) -> ClientError {
    let message = match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("message").and_then(Value::as_str) {
            Some(msg) => msg.to_string(),
            None => error.to_string(),
        },
        other => other.to_string(),
    };
    ClientError::Api { message }
}
