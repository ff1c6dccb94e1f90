//! In-memory stand-in for the vendor API used across the test modules.

use crate::error::{AppError, Result};
use crate::services::spotify::MusicApi;
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub endpoint: String,
    pub token: String,
    pub body: Option<Value>,
}

impl Call {
    /// Comma-separated `ids` query parameter, split.
    pub fn ids(&self) -> Vec<String> {
        parse(&self.endpoint)
            .query_pairs()
            .find(|(k, _)| k == "ids")
            .map(|(_, v)| v.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `uris` array of a JSON body.
    pub fn uris(&self) -> Vec<String> {
        self.body
            .as_ref()
            .and_then(|b| b.get("uris"))
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }
}

struct FakePlaylist {
    summary: Value,
    items: Vec<Value>,
}

pub struct FakeApi {
    page_size: usize,
    profiles: HashMap<String, Value>,
    liked: Vec<Value>,
    playlists: Vec<FakePlaylist>,
    artists: Vec<Value>,
    failures: Vec<(Method, String)>,
    calls: Mutex<Vec<Call>>,
    created: Mutex<usize>,
}

fn parse(endpoint: &str) -> Url {
    if endpoint.starts_with("http") {
        Url::parse(endpoint).expect("absolute url")
    } else {
        Url::parse(&format!("http://fake{}", endpoint)).expect("relative url")
    }
}

fn track(id: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:track:{}", id),
        "name": format!("Track {}", id),
        "is_local": false
    })
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            page_size: 50,
            profiles: HashMap::new(),
            liked: Vec::new(),
            playlists: Vec::new(),
            artists: Vec::new(),
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_profile(mut self, token: &str, user_id: &str) -> Self {
        self.profiles.insert(
            token.to_string(),
            json!({
                "id": user_id,
                "display_name": format!("User {}", user_id),
                "email": format!("{}@example.com", user_id),
                "product": "premium"
            }),
        );
        self
    }

    /// Liked tracks `t0..tN`, newest first as the vendor returns them.
    pub fn with_liked_tracks(mut self, count: usize) -> Self {
        self.liked = (0..count)
            .map(|i| json!({ "added_at": "2024-01-01T00:00:00Z", "track": track(&format!("t{}", i)) }))
            .collect();
        self
    }

    /// Playlist `id` owned by `owner` with tracks `{id}-0..{id}-N`.
    pub fn with_playlist(mut self, id: &str, owner: &str, tracks: usize) -> Self {
        let items = (0..tracks)
            .map(|i| json!({ "added_at": null, "track": track(&format!("{}-{}", id, i)) }))
            .collect();
        self.playlists.push(FakePlaylist {
            summary: json!({
                "id": id,
                "name": format!("Playlist {}", id),
                "description": format!("About {}", id),
                "public": true,
                "owner": { "id": owner, "display_name": owner },
                "tracks": { "total": tracks }
            }),
            items,
        });
        self
    }

    pub fn with_artists(mut self, count: usize) -> Self {
        self.artists = (0..count)
            .map(|i| json!({ "id": format!("a{}", i), "name": format!("Artist {}", i) }))
            .collect();
        self
    }

    /// Fail any `method` call whose endpoint contains `fragment`.
    pub fn failing_on(mut self, method: Method, fragment: &str) -> Self {
        self.failures.push((method, fragment.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls with `method` whose path starts with `path`.
    pub fn calls_to(&self, method: Method, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && parse(&c.endpoint).path().starts_with(path))
            .collect()
    }

    pub fn count_calls(&self, method: Method, path: &str) -> usize {
        self.calls_to(method, path).len()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != Method::GET)
            .collect()
    }

    fn offset_page(&self, items: &[Value], url: &Url) -> Value {
        let offset: usize = url
            .query_pairs()
            .find(|(k, _)| k == "offset")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).unwrap_or(&[]).to_vec();
        let next = (end < items.len())
            .then(|| format!("{}?offset={}&limit={}", url.path(), end, self.page_size));

        json!({ "items": page, "next": next, "total": items.len() })
    }

    fn cursor_page(&self, url: &Url) -> Value {
        let start = url
            .query_pairs()
            .find(|(k, _)| k == "after")
            .and_then(|(_, after)| self.artists.iter().position(|a| a["id"] == *after))
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = (start + self.page_size).min(self.artists.len());
        let page = self.artists[start..end].to_vec();
        let after = page.last().map(|a| a["id"].clone());
        let next = (end < self.artists.len()).then(|| "http://fake/me/following?type=artist".to_string());

        json!({
            "artists": {
                "items": page,
                "next": next,
                "cursors": { "after": after },
                "total": self.artists.len()
            }
        })
    }

    fn not_found(endpoint: &str) -> AppError {
        AppError::upstream(
            404,
            &json!({ "error": { "status": 404, "message": format!("No route for {}", endpoint) } })
                .to_string(),
        )
    }
}

#[async_trait]
impl MusicApi for FakeApi {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            body: body.clone(),
        });

        if self
            .failures
            .iter()
            .any(|(m, fragment)| *m == method && endpoint.contains(fragment.as_str()))
        {
            return Err(AppError::upstream(
                500,
                r#"{"error":{"status":500,"message":"Injected failure"}}"#,
            ));
        }

        let url = parse(endpoint);
        let segments: Vec<&str> = url.path().trim_start_matches('/').split('/').collect();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["me"]) => self.profiles.get(token).cloned().ok_or_else(|| {
                AppError::upstream(401, r#"{"error":{"status":401,"message":"Invalid access token"}}"#)
            }),
            ("GET", ["me", "tracks"]) => Ok(self.offset_page(&self.liked, &url)),
            ("GET", ["me", "playlists"]) => {
                let summaries: Vec<Value> = self.playlists.iter().map(|p| p.summary.clone()).collect();
                Ok(self.offset_page(&summaries, &url))
            }
            ("GET", ["playlists", id, "tracks"]) => self
                .playlists
                .iter()
                .find(|p| p.summary["id"] == *id)
                .map(|p| self.offset_page(&p.items, &url))
                .ok_or_else(|| Self::not_found(endpoint)),
            ("GET", ["me", "following"]) => Ok(self.cursor_page(&url)),
            ("POST", ["users", _, "playlists"]) => {
                let mut created = self.created.lock().unwrap();
                *created += 1;
                let name = body
                    .as_ref()
                    .and_then(|b| b.get("name"))
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok(json!({ "id": format!("new-{}", *created), "name": name }))
            }
            ("POST", ["playlists", _, "tracks"]) => Ok(json!({ "snapshot_id": "snap" })),
            ("PUT", ["me", "tracks"])
            | ("PUT", ["me", "following"])
            | ("DELETE", ["me", "tracks"])
            | ("DELETE", ["me", "following"])
            | ("DELETE", ["playlists", _, "followers"]) => Ok(Value::Null),
            _ => Err(Self::not_found(endpoint)),
        }
    }
}
