use crate::ProviderError;
use crate::types::{ExtractionResult, TranscriptChunk};
use tracing::debug;

pub const DEFAULT_CONTEXT_TAIL: usize = 500;

/// The last `max_chars` characters of `content`.
pub fn context_tail(content: &str, max_chars: usize) -> &str {
    let count = content.chars().count();
    if count <= max_chars {
        return content;
    }
    let start = content
        .char_indices()
        .nth(count - max_chars)
        .map(|(pos, _)| pos)
        .unwrap_or(content.len());
    &content[start..]
}

/// Run `extract` over the chunks in order, handing each call the raw tail of
/// the previous chunk. The first failure ends the run.
pub fn extract_chunks<F>(
    chunks: &[TranscriptChunk],
    tail_chars: usize,
    mut extract: F,
) -> Result<Vec<ExtractionResult>, ProviderError>
where
    F: FnMut(&TranscriptChunk, &str) -> Result<ExtractionResult, ProviderError>,
{
    let (_, results) = chunks.iter().try_fold(
        ("", Vec::with_capacity(chunks.len())),
        |(context, mut results), chunk| {
            debug!(
                index = chunk.index,
                chars = chunk.end - chunk.start,
                context_chars = context.chars().count(),
                "extracting chunk"
            );
            results.push(extract(chunk, context)?);
            Ok::<_, ProviderError>((context_tail(&chunk.content, tail_chars), results))
        },
    )?;
    Ok(results)
}
