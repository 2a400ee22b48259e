//! Farcaster identity via the Quick-Auth `/api/me` endpoint.
//!
//! The endpoint verifies a Quick-Auth JWT and returns the user's profile.
//! Farcaster holds no check-in stats; a resolved identity only gives the
//! record its own storage scope (`fid:<fid>`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{endpoint, SourceKind, StatSource};
use crate::error::SourceError;

const SERVICE: &str = "farcaster";

/// Profile returned by `/api/me`, with the same fallbacks the endpoint uses
/// for users without a public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarcasterIdentity {
    pub fid: u64,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub bio: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub primary_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    fid: u64,
    #[serde(default)]
    primary_address: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    follower_count: Option<u64>,
    #[serde(default)]
    following_count: Option<u64>,
}

impl From<MeResponse> for FarcasterIdentity {
    fn from(me: MeResponse) -> Self {
        let fid = me.fid;
        let non_empty = |s: Option<String>| s.filter(|v| !v.is_empty());
        Self {
            fid,
            username: non_empty(me.username).unwrap_or_else(|| format!("user{fid}")),
            display_name: non_empty(me.display_name).unwrap_or_else(|| format!("User {fid}")),
            avatar: non_empty(me.avatar).unwrap_or_else(|| {
                format!("https://api.dicebear.com/7.x/avataaars/svg?seed={fid}")
            }),
            bio: me.bio.unwrap_or_default(),
            follower_count: me.follower_count.unwrap_or(0),
            following_count: me.following_count.unwrap_or(0),
            primary_address: non_empty(me.primary_address),
        }
    }
}

/// HTTP client for the identity endpoint.
pub struct FarcasterClient {
    client: Client,
    api_base: String,
}

impl FarcasterClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
        }
    }

    /// Resolve the identity behind a Quick-Auth bearer token.
    ///
    /// # Errors
    /// [`SourceError::Unauthorized`] on HTTP 401, [`SourceError::Status`] on
    /// other failures, [`SourceError::InvalidResponse`] if the body is not a
    /// profile.
    pub async fn me(&self, token: &str) -> Result<FarcasterIdentity, SourceError> {
        let url = endpoint(&self.api_base, "api/me")?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(SourceError::Unauthorized {
                    service: SERVICE.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(SourceError::Status {
                    service: SERVICE.to_string(),
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let body = resp.text().await?;
        let me: MeResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::InvalidResponse {
                service: SERVICE.to_string(),
                message: e.to_string(),
            })?;
        Ok(me.into())
    }
}

/// Identity-scoped local record. `identity = None` means the user is not
/// inside a Farcaster client (or the token was rejected).
#[derive(Debug, Clone, Default)]
pub struct FarcasterSource {
    identity: Option<FarcasterIdentity>,
}

impl FarcasterSource {
    pub fn new(identity: Option<FarcasterIdentity>) -> Self {
        Self { identity }
    }

    /// Resolve the identity; failures leave the source unavailable.
    pub async fn resolve(client: &FarcasterClient, token: Option<&str>) -> Self {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::debug!("no Quick-Auth token configured");
            return Self::default();
        };
        match client.me(token).await {
            Ok(identity) => {
                tracing::info!(
                    fid = identity.fid,
                    username = %identity.username,
                    "signed in with Farcaster"
                );
                Self::new(Some(identity))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Farcaster identity unavailable, using local record");
                Self::default()
            }
        }
    }

    pub fn identity(&self) -> Option<&FarcasterIdentity> {
        self.identity.as_ref()
    }
}

#[async_trait]
impl StatSource for FarcasterSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Farcaster
    }

    fn is_available(&self) -> bool {
        self.identity.is_some()
    }

    fn scope(&self) -> Option<String> {
        self.identity.as_ref().map(|id| format!("fid:{}", id.fid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "fid": 3621,
        "primaryAddress": "0x1234",
        "username": "gmfan",
        "displayName": "GM Fan",
        "avatar": "https://example.com/a.png",
        "bio": "says gm",
        "followerCount": 10,
        "followingCount": 4
    }"#;

    #[tokio::test]
    async fn me_parses_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/me")
            .match_header("authorization", "Bearer good-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PROFILE)
            .create_async()
            .await;

        let client = FarcasterClient::new(server.url());
        let identity = client.me("good-token").await.unwrap();
        mock.assert_async().await;

        assert_eq!(identity.fid, 3621);
        assert_eq!(identity.display_name, "GM Fan");
        assert_eq!(identity.follower_count, 10);
        assert_eq!(identity.primary_address.as_deref(), Some("0x1234"));
    }

    #[tokio::test]
    async fn me_fills_missing_profile_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/me")
            .with_status(200)
            .with_body(r#"{"fid": 77}"#)
            .create_async()
            .await;

        let identity = FarcasterClient::new(server.url()).me("t").await.unwrap();
        assert_eq!(identity.username, "user77");
        assert_eq!(identity.display_name, "User 77");
        assert!(identity.avatar.ends_with("seed=77"));
        assert_eq!(identity.primary_address, None);
    }

    #[tokio::test]
    async fn me_maps_401_to_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/me")
            .with_status(401)
            .with_body(r#"{"error": "Invalid token"}"#)
            .create_async()
            .await;

        let err = FarcasterClient::new(server.url()).me("bad").await.unwrap_err();
        assert!(matches!(err, SourceError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn me_rejects_non_profile_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/me")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let err = FarcasterClient::new(server.url()).me("t").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn resolve_without_token_is_unavailable() {
        let client = FarcasterClient::new("http://127.0.0.1:9");
        let source = FarcasterSource::resolve(&client, None).await;
        assert!(!source.is_available());
        assert_eq!(source.scope(), None);
    }

    #[tokio::test]
    async fn resolve_failure_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/api/me").with_status(500).create_async().await;

        let client = FarcasterClient::new(server.url());
        let source = FarcasterSource::resolve(&client, Some("token")).await;
        assert!(!source.is_available());
    }

    #[test]
    fn identity_scopes_the_record() {
        let source = FarcasterSource::new(Some(FarcasterIdentity {
            fid: 5,
            username: "five".into(),
            display_name: "Five".into(),
            avatar: String::new(),
            bio: String::new(),
            follower_count: 0,
            following_count: 0,
            primary_address: None,
        }));
        assert!(source.is_available());
        assert_eq!(source.scope().as_deref(), Some("fid:5"));
    }
}
