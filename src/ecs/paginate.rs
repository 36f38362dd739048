//! Pagination
//!
//! ECS list operations return one page of items plus an optional `nextToken`.
//! [`paginate`] hides the token bookkeeping behind a lazy stream.

use anyhow::Result;
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;

/// Result of one list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// Token for the following page. An empty token means there is none.
    fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|token| !token.is_empty())
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Stream every item of a paginated list call.
///
/// `fetch` is called with `None` for the first page and with the previous
/// page's token afterwards; any filters it needs are captured by the closure and
/// therefore sent unchanged with every page. Nothing is requested until the
/// stream is polled. The stream ends after the first page without a token
/// (regardless of how many items it held), or after the first error.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T>> + Send + 'a
where
    T: Send + 'a,
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page<T>>> + Send + 'a,
{
    stream::try_unfold((fetch, Cursor::Start), |(mut fetch, cursor)| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = fetch(token).await?;
        let cursor = match page.continuation() {
            Some(token) => Cursor::Next(token.to_string()),
            None => Cursor::Done,
        };

        let items = stream::iter(page.items.into_iter().map(Ok::<T, anyhow::Error>));
        Ok::<_, anyhow::Error>(Some((items, (fetch, cursor))))
    })
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Serve `pages` in order, recording the token each call received
    fn scripted(
        pages: Vec<Page<u32>>,
        calls: Arc<Mutex<Vec<Option<String>>>>,
    ) -> impl FnMut(Option<String>) -> futures::future::Ready<Result<Page<u32>>> {
        let mut pages = pages.into_iter();
        move |token| {
            calls.lock().unwrap().push(token);
            let page = pages.next().expect("requested a page past the last one");
            futures::future::ready(Ok(page))
        }
    }

    #[tokio::test]
    async fn test_follows_tokens_until_absent() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pages = vec![
            Page::new(vec![1, 2], Some("a".to_string())),
            Page::new(vec![], Some("b".to_string())),
            Page::new(vec![3], None),
        ];

        let items: Vec<u32> = paginate(scripted(pages, calls.clone()))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_token_ends_stream() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pages = vec![Page::new(vec![7], Some(String::new()))];

        let items: Vec<u32> = paginate(scripted(pages, calls.clone()))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec![7]);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_requested_until_polled() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stream = paginate(scripted(vec![Page::new(vec![1], None)], calls.clone()));
        assert!(calls.lock().unwrap().is_empty());
        drop(stream);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let mut served = 0;
        let stream = paginate(move |_token| {
            served += 1;
            let result = if served == 1 {
                Ok(Page::new(vec![1u32], Some("next".to_string())))
            } else {
                Err(anyhow::anyhow!("ThrottlingException: Rate exceeded"))
            };
            futures::future::ready(result)
        });
        let mut stream = std::pin::pin!(stream);

        assert_eq!(stream.try_next().await.unwrap(), Some(1));
        let err = stream.try_next().await.unwrap_err();
        assert!(err.to_string().contains("ThrottlingException"));
    }
}
