use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::fetcher::PageSource;
use crate::types::Listing;

#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationLimits {
    /// Fail once this many pages have been fetched and a cursor is still pending.
    pub max_pages: Option<usize>,
}

/// Walk the listing from the first page until the API returns an empty cursor.
///
/// Pages are fetched one at a time; each cursor is only known once the previous
/// page has arrived. Any error discards everything gathered so far. A cursor
/// the API already handed out fails the traversal instead of looping forever.
pub async fn fetch_all_lives<S>(source: &S, limits: PaginationLimits) -> Result<Listing>
where
    S: PageSource + ?Sized,
{
    let mut listing = Listing::default();
    let mut consumed: HashSet<String> = HashSet::new();
    let mut cursor = String::new();

    loop {
        let envelope = source.fetch_page(&cursor).await?;
        listing.pages += 1;

        let next = envelope.next_cursor().to_string();
        let items = envelope.into_items();
        debug!(
            page = listing.pages,
            items = items.len(),
            next = %next,
            "listing page accumulated"
        );
        listing.items.extend(items);

        if next.is_empty() {
            break;
        }
        if !cursor.is_empty() {
            consumed.insert(std::mem::take(&mut cursor));
        }
        if consumed.contains(&next) {
            return Err(AppError::RepeatedCursor {
                cursor: next,
                page: listing.pages,
            });
        }
        if let Some(limit) = limits.max_pages {
            if listing.pages >= limit {
                return Err(AppError::PageLimit { limit, cursor: next });
            }
        }
        cursor = next;
    }

    info!(
        pages = listing.pages,
        items = listing.items.len(),
        adult = listing.items.iter().filter(|i| i.is_adult_content()).count(),
        untagged = listing.items.iter().filter(|i| !i.has_tags()).count(),
        "listing traversal complete"
    );
    Ok(listing)
}
