//! Page-token pagination shared by the list/search RPCs.

use std::future::Future;

use crate::error::ClientError;

/// Items of one page plus the token for the next, if any.
pub(crate) type Page<T> = (Vec<T>, Option<String>);

/// Fetch pages until the service stops returning a token.
///
/// `fetch` receives the token of the page to load (`None` for the first).
/// Any page error aborts the whole collection; nothing partial is returned.
pub(crate) async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ClientError>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let (page, next) = fetch(token.take()).await?;
        items.extend(page);

        match next {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(items),
        }
    }
}
