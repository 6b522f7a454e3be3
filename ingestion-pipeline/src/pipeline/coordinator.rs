use common::storage::types::course::Course;
use futures::{stream, Stream, StreamExt};

use super::{error::DocumentError, IngestionPipeline};
use crate::utils::sources::DocumentId;

/// Run the per-document pipeline over a fixed-size worker pool.
///
/// Yields `(id, result)` in completion order; consumers must not assume
/// submission order. One document's failure is an item on the stream, never
/// a cancellation of its siblings; the pool bound is the primary defense
/// against overwhelming the rate-limited extraction service.
pub fn run<'a>(
    pipeline: &'a IngestionPipeline,
    ids: Vec<DocumentId>,
    pool_size: usize,
) -> impl Stream<Item = (DocumentId, Result<Course, DocumentError>)> + 'a {
    stream::iter(ids)
        .map(move |id| async move {
            let result = pipeline.process_document(&id).await;
            (id, result)
        })
        .buffer_unordered(pool_size)
}
