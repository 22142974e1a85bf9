// Pagination plumbing.
// Link-header parsing and the page-drain loop shared by interval fetches.

use std::future::Future;

use crate::error::Result;
use crate::model::Build;

/// Extract the next page number from a `Link` response header.
///
/// The upstream emits RFC 8288 style links; the last page carries no
/// `rel="next"` entry.
pub(crate) fn parse_next_page(link_header: Option<&str>) -> Option<u32> {
    let header = link_header?;
    for part in header.split(',') {
        let part = part.trim();
        if !part.contains(r#"rel="next""#) {
            continue;
        }
        let url = part.strip_prefix('<')?.split('>').next()?;
        for segment in url.split(['?', '&']) {
            if let Some(raw) = segment.strip_prefix("page=") {
                return raw.parse().ok();
            }
        }
    }
    None
}

/// Follow pages starting at 1 until the upstream reports no next page,
/// accumulating records in upstream order.
///
/// Any page failure aborts the whole drain; retries are the caller's
/// concern. A next-page value of zero is treated as "no next page".
pub(crate) async fn drain_pages<F, Fut>(mut fetch: F) -> Result<Vec<Build>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(Vec<Build>, Option<u32>)>>,
{
    let mut page = 1u32;
    let mut all = Vec::new();
    loop {
        let (batch, next) = fetch(page).await?;
        all.extend(batch);
        match next {
            Some(next) if next > 0 => page = next,
            _ => break,
        }
    }
    Ok(all)
}
