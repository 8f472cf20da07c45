//! Token-lifecycle HTTP client (§4.3), grounded on
//! `daserver/dasdaemon/managers/requests_manager.py` from the original
//! source: fetch a token lazily, reuse it until `token_expiration_sec`
//! elapses, and invalidate it on a 403 so the next request fetches a fresh
//! one.

use std::time::{Duration, Instant};

use dasd_api_models::{TokenAuthRequest, TokenAuthResponse};
use dasd_config::HttpClientConfig;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{HttpError, HttpResult};

const AUTH_TOKEN_PATH: &str = "auth/api-token-auth/";

#[derive(Default)]
struct TokenState {
    token: Option<String>,
    created_at: Option<Instant>,
}

/// HTTP client shared by the consumer's stage workers: maintains a single
/// bearer token, refreshing it on expiry and invalidating it on a 403.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token_url: Url,
    username: String,
    password: String,
    token_expiration: Duration,
    state: Mutex<TokenState>,
}

impl Client {
    /// Build a client from `[http_client]`. The token endpoint is
    /// `<base_url>/auth/api-token-auth/`.
    pub fn new(config: &HttpClientConfig) -> HttpResult<Self> {
        let base_url = parse_url(&config.base_url)?;
        let token_url = base_url
            .join(AUTH_TOKEN_PATH)
            .map_err(|source| HttpError::InvalidUrl {
                value: config.base_url.clone(),
                source,
            })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token_url,
            username: config.username.clone(),
            password: config.password.clone(),
            token_expiration: Duration::from_secs(config.token_expiration_sec),
            state: Mutex::new(TokenState::default()),
        })
    }

    /// Resolve a path against this client's base URL.
    pub fn url(&self, path: &str) -> HttpResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| HttpError::InvalidUrl {
                value: path.to_string(),
                source,
            })
    }

    /// `GET path`, authenticated, returning the raw response.
    pub async fn get(&self, path: &str) -> HttpResult<Response> {
        let url = self.url(path)?;
        self.send(self.http.get(url)).await
    }

    /// `GET path`, authenticated, decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> HttpResult<T> {
        Ok(decode_ok(self.get(path).await?).await?)
    }

    /// `GET path` with a JSON body, authenticated, decoded as JSON. Used by
    /// the `/torrents/` listing endpoint, which distinguishes "every
    /// packaged torrent name" (no body) from "one torrent's chunk listing"
    /// (a `{torrent}` body) on the same route.
    pub async fn get_json_with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> HttpResult<T> {
        let url = self.url(path)?;
        let response = self.send(self.http.get(url).json(body)).await?;
        Ok(decode_ok(response).await?)
    }

    /// `POST path` with a JSON body, authenticated, decoded as JSON.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> HttpResult<T> {
        let url = self.url(path)?;
        let response = self.send(self.http.post(url).json(body)).await?;
        Ok(decode_ok(response).await?)
    }

    /// `DELETE path`, authenticated.
    pub async fn delete(&self, path: &str) -> HttpResult<Response> {
        let url = self.url(path)?;
        self.send(self.http.delete(url)).await
    }

    /// Stream `path` starting at byte `start` (inclusive), optionally bounded
    /// at `end` (inclusive), as a `206 Partial Content` response. Used by the
    /// package downloader to resume a chunk from its local size.
    pub async fn get_file_stream(&self, path: &str, start: u64, end: Option<u64>) -> HttpResult<Response> {
        let range = end.map_or_else(|| format!("bytes={start}-"), |end| format!("bytes={start}-{end}"));
        let url = self.url(path)?;
        let response = self
            .send(self.http.get(url).header(reqwest::header::RANGE, range))
            .await?;
        match response.status() {
            StatusCode::PARTIAL_CONTENT => Ok(response),
            StatusCode::NOT_FOUND => Err(HttpError::NotFound),
            status => Err(HttpError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }

    async fn send(&self, request: RequestBuilder) -> HttpResult<Response> {
        let token = self.refresh_token().await?;
        let response = request
            .header(reqwest::header::AUTHORIZATION, format!("Token {token}"))
            .send()
            .await?;

        if response.status() == StatusCode::FORBIDDEN {
            self.invalidate_token().await;
            return Err(HttpError::Forbidden);
        }

        Ok(response)
    }

    async fn refresh_token(&self) -> HttpResult<String> {
        let mut state = self.state.lock().await;
        let is_valid = state
            .created_at
            .is_some_and(|created| created.elapsed() <= self.token_expiration);

        if let (true, Some(token)) = (is_valid, state.token.as_ref()) {
            return Ok(token.clone());
        }

        let response = self
            .http
            .post(self.token_url.clone())
            .json(&TokenAuthRequest {
                username: self.username.clone(),
                password: self.password.clone(),
            })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(HttpError::TokenRequestFailed {
                status: response.status().as_u16(),
            });
        }

        let parsed: TokenAuthResponse = response
            .json()
            .await
            .map_err(|_| HttpError::MalformedTokenResponse)?;
        state.token = Some(parsed.token.clone());
        state.created_at = Some(Instant::now());
        Ok(parsed.token)
    }

    async fn invalidate_token(&self) {
        let mut state = self.state.lock().await;
        state.token = None;
        state.created_at = None;
    }
}

async fn decode_ok<T: DeserializeOwned>(response: Response) -> HttpResult<T> {
    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        StatusCode::NOT_FOUND => Err(HttpError::NotFound),
        status => Err(HttpError::UnexpectedStatus {
            status: status.as_u16(),
        }),
    }
}

fn parse_url(raw: &str) -> HttpResult<Url> {
    Url::parse(raw).map_err(|source| HttpError::InvalidUrl {
        value: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    fn config(base_url: String) -> HttpClientConfig {
        HttpClientConfig {
            base_url,
            timeout_secs: 5,
            token_expiration_sec: 3600,
            username: "dasd".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn fetches_token_once_and_reuses_it() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/api-token-auth/");
            then.status(200).json_body(serde_json::json!({"token": "abc123"}));
        });
        let echo_mock = server.mock(|when, then| {
            when.method(GET).path("/torrents/");
            then.status(200).json_body(serde_json::json!(["one"]));
        });

        let client = Client::new(&config(server.base_url())).unwrap();
        let _: Vec<String> = client.get_json("torrents/").await.unwrap();
        let _: Vec<String> = client.get_json("torrents/").await.unwrap();

        token_mock.assert_hits(1);
        echo_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn forbidden_response_invalidates_token_for_next_call() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/api-token-auth/");
            then.status(200).json_body(serde_json::json!({"token": "abc123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/torrents/");
            then.status(403);
        });

        let client = Client::new(&config(server.base_url())).unwrap();
        let err = client.get("torrents/").await.unwrap_err();
        assert!(matches!(err, HttpError::Forbidden));
        assert!(client.state.lock().await.token.is_none());
    }

    #[tokio::test]
    async fn get_with_body_sends_it_on_a_get_request() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/api-token-auth/");
            then.status(200).json_body(serde_json::json!({"token": "abc123"}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/torrents/")
                .json_body(serde_json::json!({"torrent": "example"}));
            then.status(200).json_body(serde_json::json!(["chunk.0000"]));
        });

        let client = Client::new(&config(server.base_url())).unwrap();
        let files: Vec<String> = client
            .get_json_with_body("torrents/", &serde_json::json!({"torrent": "example"}))
            .await
            .unwrap();
        assert_eq!(files, vec!["chunk.0000".to_string()]);
    }

    #[tokio::test]
    async fn ranged_stream_requires_partial_content() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/api-token-auth/");
            then.status(200).json_body(serde_json::json!({"token": "abc123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/download/chunk.tar.0000/");
            then.status(200).body("not partial");
        });

        let client = Client::new(&config(server.base_url())).unwrap();
        let err = client
            .get_file_stream("download/chunk.tar.0000/", 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::UnexpectedStatus { status: 200 }));
    }
}
