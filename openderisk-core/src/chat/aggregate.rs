//! Draining a chunk stream into a single answer

use crate::error::ClientError;
use futures::{Stream, TryStreamExt};

/// Concatenate every chunk in order; the first error aborts
pub async fn collect_text<S>(stream: S) -> Result<String, ClientError>
where
    S: Stream<Item = Result<String, ClientError>>,
{
    stream
        .try_fold(String::new(), |mut text, chunk| async move {
            text.push_str(&chunk);
            Ok(text)
        })
        .await
}
