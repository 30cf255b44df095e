use tracing::{debug, warn};

use dwl_naturalize::naturalize_all;
use dwl_types::tags::keywords;
use dwl_types::{SeriesSummary, SeriesUid, StudyUid};

use crate::error::RetrieveResult;
use crate::request::RetrieveRequest;
use crate::session::RetrieveSession;

/// Study-level series listing as summaries, filtered and sorted per the
/// request. Entries without a series UID are skipped.
pub(crate) async fn list_series(
    session: &RetrieveSession,
    study: &StudyUid,
    request: &RetrieveRequest,
) -> RetrieveResult<Vec<SeriesSummary>> {
    let listing = session.transport().search_series(study).await?;
    let total = listing.len();
    let mut summaries: Vec<SeriesSummary> = Vec::with_capacity(total);
    for natural in naturalize_all(&listing) {
        let Some(series) = natural
            .get_str(keywords::SERIES_INSTANCE_UID)
            .map(SeriesUid::new)
            .filter(|uid| !uid.is_empty())
        else {
            warn!(%study, "series listing entry without SeriesInstanceUID skipped");
            continue;
        };
        if summaries.iter().any(|s| s.series == series) {
            continue;
        }
        summaries.push(SeriesSummary::from_dataset(study.clone(), series, &natural));
    }
    let arranged = request.arrange(summaries);
    debug!(%study, listed = total, kept = arranged.len(), "series listing arranged");
    Ok(arranged)
}
