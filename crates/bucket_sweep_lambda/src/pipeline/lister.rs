use bucket_sweep_core::contract::ListPage;
use futures::stream::{self, Stream};

use crate::adapters::object_store::ObjectStore;
use crate::error::{StoreError, StoreResult};

enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Lazily lists every page under `prefix`, following continuation tokens
/// until the backend reports the listing is complete.
///
/// The stream ends after the first error. A backend that hands back the
/// token it was just given would loop forever, so that is reported as an
/// invalid response.
pub fn list_pages<'a, S>(
    store: &'a S,
    prefix: Option<&'a str>,
) -> impl Stream<Item = StoreResult<ListPage>> + Send + 'a
where
    S: ObjectStore + ?Sized,
{
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Exhausted => return Ok(None),
        };

        let page = store.list_page(prefix, token.as_deref()).await?;

        let next = match &page.next_continuation_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(StoreError::InvalidResponse(format!(
                    "listing returned the same continuation token twice: {next}"
                )));
            }
            Some(next) => Cursor::Next(next.clone()),
            None => Cursor::Exhausted,
        };

        Ok::<_, StoreError>(Some((page, next)))
    })
}
