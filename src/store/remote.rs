//! HTTP client for the remote fixture store.
//!
//! The remote store is a team-shared dashboard that accepts fixture
//! uploads and serves label searches. Its search is treated as
//! approximate: every replay candidate it returns is re-verified locally
//! by re-deriving the identity from the candidate's own arguments, so a
//! loose server match can never replay the wrong fixture.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Result, SnapError};
use crate::identity::{self, CallArgs};

/// Bound on every remote round trip.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
/// Page size requested from label searches.
const SEARCH_LIMIT: &str = "50";
/// Fixture collection path under the API base URL.
const FIXTURES_PATH: &str = "/api/fixtures";

/// Client for one remote fixture endpoint, authenticated by bearer token.
pub struct RemoteStore {
    client: Client,
    api_url: String,
    api_key: String,
}

impl RemoteStore {
    /// Build a client from settings.
    ///
    /// Returns `None` when no credential is configured or the HTTP client
    /// cannot be constructed; the remote tier is then absent and the
    /// recorder runs local-only.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())?
            .to_string();
        let client = match Client::builder().timeout(REMOTE_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Could not build remote store client: {}", e);
                return None;
            }
        };
        Some(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn fixtures_url(&self) -> String {
        format!("{}{}", self.api_url, FIXTURES_PATH)
    }

    /// Upload one fixture.
    pub fn put(
        &self,
        label: &str,
        call: &CallArgs,
        response: &Value,
        estimated_cost: f64,
    ) -> Result<()> {
        let body = json!({
            "name": label,
            "args": call.args,
            "kwargs": call.kwargs,
            "response": response,
            "estimated_cost": estimated_cost,
        });

        let resp = self
            .client
            .post(self.fixtures_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| SnapError::Remote(format!("upload failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SnapError::Remote(format!(
                "upload rejected: {}",
                resp.status()
            )));
        }
        debug!("Synced fixture '{}' to remote store", label);
        Ok(())
    }

    /// Search the remote store for `(label, identity)`.
    ///
    /// `Ok(None)` means nothing matched. Candidates whose name differs
    /// from `label`, whose arguments re-derive to a different identity,
    /// or which carry no response are skipped.
    pub fn get(&self, label: &str, identity_hex: &str) -> Result<Option<Value>> {
        let resp = self
            .client
            .get(self.fixtures_url())
            .bearer_auth(&self.api_key)
            .query(&[("search", label), ("limit", SEARCH_LIMIT)])
            .send()
            .map_err(|e| SnapError::Remote(format!("search failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SnapError::Remote(format!(
                "search rejected: {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .map_err(|e| SnapError::Remote(format!("bad search payload: {e}")))?;
        let candidates = body
            .get("fixtures")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for candidate in &candidates {
            if candidate.get("name").and_then(Value::as_str) != Some(label) {
                continue;
            }
            if identity::derive(&candidate_args(candidate)) != identity_hex {
                continue;
            }
            let Some(response) = candidate.get("response") else {
                continue;
            };
            debug!("Remote fixture hit for '{}' ({})", label, identity_hex);
            return Ok(Some(response.clone()));
        }
        Ok(None)
    }
}

/// Rebuild a candidate's arguments for identity re-derivation. Missing
/// fields count as empty, matching how empty calls are uploaded.
fn candidate_args(candidate: &Value) -> CallArgs {
    CallArgs {
        args: candidate
            .get("args")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        kwargs: candidate
            .get("kwargs")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncScope;

    fn settings_for(url: &str) -> Settings {
        let mut settings = Settings::default();
        settings
            .configure_sync("sk-test-key", SyncScope::Cloud, Some(url))
            .unwrap();
        settings
    }

    #[test]
    fn test_from_settings_requires_credential() {
        let settings = Settings::default();
        assert!(RemoteStore::from_settings(&settings).is_none());
    }

    #[test]
    fn test_put_posts_fixture() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/fixtures")
            .match_header("authorization", "Bearer sk-test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "name": "greet",
                "response": "Hello, Ann!",
                "estimated_cost": 0.002,
            })))
            .with_status(201)
            .with_body("{}")
            .create();

        let store = RemoteStore::from_settings(&settings_for(&server.url())).unwrap();
        let call = CallArgs::new().arg("Ann");
        store
            .put("greet", &call, &json!("Hello, Ann!"), 0.002)
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_put_surfaces_rejection() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/fixtures")
            .with_status(401)
            .create();

        let store = RemoteStore::from_settings(&settings_for(&server.url())).unwrap();
        let err = store
            .put("greet", &CallArgs::new(), &json!("x"), 0.002)
            .unwrap_err();
        assert!(matches!(err, SnapError::Remote(_)));
    }

    #[test]
    fn test_get_verifies_identity() {
        let call = CallArgs::new().arg("Ann").kwarg("greeting", "Hello");
        let identity = call.identity();

        // Server returns a loose match first; only the exact-identity
        // candidate may be replayed.
        let payload = json!({
            "fixtures": [
                {
                    "name": "greet",
                    "args": ["Zed"],
                    "kwargs": {},
                    "response": "Hello, Zed!",
                },
                {
                    "name": "greeting_helper",
                    "args": call.args.clone(),
                    "kwargs": call.kwargs.clone(),
                    "response": "wrong label",
                },
                {
                    "name": "greet",
                    "args": call.args.clone(),
                    "kwargs": call.kwargs.clone(),
                    "response": "Hello, Ann!",
                },
            ]
        });

        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/fixtures")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("search".into(), "greet".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(payload.to_string())
            .create();

        let store = RemoteStore::from_settings(&settings_for(&server.url())).unwrap();
        let got = store.get("greet", &identity).unwrap();
        assert_eq!(got, Some(json!("Hello, Ann!")));
        mock.assert();
    }

    #[test]
    fn test_get_miss_is_none() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/fixtures")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"fixtures": []}"#)
            .create();

        let store = RemoteStore::from_settings(&settings_for(&server.url())).unwrap();
        assert!(store.get("greet", "0123456789abcdef").unwrap().is_none());
    }

    #[test]
    fn test_get_server_error_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/fixtures")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create();

        let store = RemoteStore::from_settings(&settings_for(&server.url())).unwrap();
        let err = store.get("greet", "0123456789abcdef").unwrap_err();
        assert!(matches!(err, SnapError::Remote(_)));
    }
}
