use crate::error::{AppError, Result};
use crate::services::spotify::MusicApi;
use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

/// How the vendor tells us where the next page lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// The page carries a complete `next` URL to follow as-is.
    NextUrl,
    /// The page carries `cursors.after`; the next request is the original
    /// endpoint with `after=<token>` appended.
    After,
}

#[derive(Debug, Clone)]
pub struct PageQuery {
    endpoint: String,
    container: Option<&'static str>,
    cursor: Cursor,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
    #[serde(default)]
    cursors: Option<Cursors>,
}

#[derive(Debug, Deserialize)]
struct Cursors {
    after: Option<String>,
}

impl PageQuery {
    pub fn next_url(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            container: None,
            cursor: Cursor::NextUrl,
        }
    }

    /// Cursor-in-query pagination where the page object is wrapped in
    /// `container` (e.g. `{"artists": {...}}`).
    pub fn after_cursor(endpoint: impl Into<String>, container: &'static str) -> Self {
        Self {
            endpoint: endpoint.into(),
            container: Some(container),
            cursor: Cursor::After,
        }
    }

    fn parse_page<T: DeserializeOwned>(&self, mut body: Value) -> Result<Page<T>> {
        let page = match self.container {
            Some(key) => body.get_mut(key).map(Value::take).ok_or_else(|| {
                AppError::ExternalApi(format!(
                    "Missing `{}` in page from {}",
                    key, self.endpoint
                ))
            })?,
            None => body,
        };

        serde_json::from_value(page).map_err(|e| {
            AppError::ExternalApi(format!("Malformed page from {}: {}", self.endpoint, e))
        })
    }

    fn follow<T>(&self, page: &Page<T>) -> Option<String> {
        let next = page.next.as_ref()?;
        match self.cursor {
            Cursor::NextUrl => Some(next.clone()),
            Cursor::After => {
                let after = page.cursors.as_ref()?.after.as_ref()?;
                let separator = if self.endpoint.contains('?') { '&' } else { '?' };
                Some(format!("{}{}after={}", self.endpoint, separator, after))
            }
        }
    }
}

/// Lazily walk every page of `query`, yielding items in vendor order.
///
/// Nothing is requested until the stream is polled, and each call starts a
/// fresh traversal from the first page. The first failing page ends the
/// stream with that error.
pub fn paginate<'a, T>(
    api: &'a dyn MusicApi,
    token: &'a str,
    query: PageQuery,
) -> impl Stream<Item = Result<T>> + Send + 'a
where
    T: DeserializeOwned + Send + 'static,
{
    try_stream! {
        let mut next = Some(query.endpoint.clone());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let body = api.call(Method::GET, &url, token, None).await?;
            let page: Page<T> = query.parse_page(body)?;
            pages += 1;
            next = query.follow(&page);

            for item in page.items {
                yield item;
            }
        }

        tracing::debug!("Fetched {} page(s) from {}", pages, query.endpoint);
    }
}

/// Drain [`paginate`] into memory.
pub async fn fetch_all<T>(api: &dyn MusicApi, token: &str, query: PageQuery) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    paginate(api, token, query).try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Artist, SavedTrack};
    use crate::services::testing::FakeApi;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_next_url_pagination_preserves_order() {
        let api = FakeApi::new().with_page_size(20).with_liked_tracks(45);

        let items: Vec<SavedTrack> =
            fetch_all(&api, "tok", PageQuery::next_url("/me/tracks?limit=50"))
                .await
                .unwrap();

        let ids: Vec<String> = items
            .iter()
            .map(|i| i.track.as_ref().unwrap().id.clone().unwrap())
            .collect();
        let expected: Vec<String> = (0..45).map(|i| format!("t{}", i)).collect();
        assert_eq!(ids, expected);

        // ceil(45 / 20) page requests
        assert_eq!(api.count_calls(Method::GET, "/me/tracks"), 3);
    }

    #[tokio::test]
    async fn test_empty_collection_makes_one_request() {
        let api = FakeApi::new();
        let items: Vec<SavedTrack> =
            fetch_all(&api, "tok", PageQuery::next_url("/me/tracks?limit=50"))
                .await
                .unwrap();
        assert!(items.is_empty());
        assert_eq!(api.count_calls(Method::GET, "/me/tracks"), 1);
    }

    #[tokio::test]
    async fn test_after_cursor_pagination() {
        let api = FakeApi::new().with_page_size(50).with_artists(120);

        let artists: Vec<Artist> = fetch_all(
            &api,
            "tok",
            PageQuery::after_cursor("/me/following?type=artist&limit=50", "artists"),
        )
        .await
        .unwrap();

        assert_eq!(artists.len(), 120);
        assert_eq!(artists[0].id, "a0");
        assert_eq!(artists[119].id, "a119");
        assert_eq!(api.count_calls(Method::GET, "/me/following"), 3);

        let calls = api.calls();
        assert_eq!(calls[0].endpoint, "/me/following?type=artist&limit=50");
        assert_eq!(calls[1].endpoint, "/me/following?type=artist&limit=50&after=a49");
        assert_eq!(calls[2].endpoint, "/me/following?type=artist&limit=50&after=a99");
    }

    #[tokio::test]
    async fn test_failing_page_aborts_fetch() {
        let api = FakeApi::new()
            .with_page_size(10)
            .with_liked_tracks(30)
            .failing_on(Method::GET, "offset=10");

        let result: Result<Vec<SavedTrack>> =
            fetch_all(&api, "tok", PageQuery::next_url("/me/tracks?limit=50")).await;

        match result {
            Err(AppError::Upstream { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert_eq!(api.count_calls(Method::GET, "/me/tracks"), 2);
    }

    #[tokio::test]
    async fn test_stream_is_lazy_and_restartable() {
        let api = FakeApi::new().with_page_size(10).with_liked_tracks(25);
        let query = PageQuery::next_url("/me/tracks?limit=50");

        let stream = paginate::<SavedTrack>(&api, "tok", query.clone());
        assert_eq!(api.calls().len(), 0);

        let first: Vec<_> = stream.take(5).collect().await;
        assert_eq!(first.len(), 5);
        assert_eq!(api.count_calls(Method::GET, "/me/tracks"), 1);

        let all: Vec<SavedTrack> = fetch_all(&api, "tok", query).await.unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(api.count_calls(Method::GET, "/me/tracks"), 4);
    }
}
