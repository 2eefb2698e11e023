use crate::PipelineError;
use crate::types::TranscriptChunk;

pub const DEFAULT_CHUNK_SIZE: usize = 2_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    size: usize,
    overlap: usize,
}

impl ChunkerConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self, PipelineError> {
        if size == 0 {
            return Err(PipelineError::Input(
                "chunk size must be greater than 0".into(),
            ));
        }
        if overlap >= size {
            return Err(PipelineError::Input(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split transcript text into ordered, overlapping windows.
///
/// Window `i` starts at `i * (size - overlap)`. A window that stops short of
/// the end of the text is pulled back to the last whitespace boundary that
/// still reaches the next window's start, so no character is left uncovered
/// and no window exceeds `size`.
pub fn chunk_transcript(
    text: &str,
    transcript_id: &str,
    config: &ChunkerConfig,
) -> Result<Vec<TranscriptChunk>, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::Input("transcript text is empty".into()));
    }

    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every character, plus one past the last.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(pos, _)| pos)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut offset = 0;
    loop {
        let hard_end = (offset + config.size).min(len);
        let end = if hard_end < len {
            nudge_to_boundary(&chars, offset + config.step(), hard_end)
        } else {
            hard_end
        };

        chunks.push(TranscriptChunk {
            transcript_id: transcript_id.to_string(),
            index: chunks.len(),
            start: offset,
            end,
            content: text[bounds[offset]..bounds[end]].to_string(),
        });

        if end >= len {
            break;
        }
        offset += config.step();
    }

    Ok(chunks)
}

/// Latest position in `floor..=end` that directly follows whitespace, or `end`.
fn nudge_to_boundary(chars: &[char], floor: usize, end: usize) -> usize {
    (floor.max(1)..=end)
        .rev()
        .find(|&pos| chars[pos - 1].is_whitespace())
        .unwrap_or(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(len: usize) -> String {
        const WORDS: [&str; 6] = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
        let mut out = String::new();
        let mut i = 0;
        while out.chars().count() < len {
            out.push_str(WORDS[i % WORDS.len()]);
            out.push(' ');
            i += 1;
        }
        out.chars().take(len).collect()
    }

    fn assert_covers(text: &str, chunks: &[TranscriptChunk], config: &ChunkerConfig) {
        let len = text.chars().count();
        assert_eq!(chunks.first().unwrap().start, 0);
        assert_eq!(chunks.last().unwrap().end, len);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.end - chunk.start <= config.size());
            let expected: String = text
                .chars()
                .skip(chunk.start)
                .take(chunk.end - chunk.start)
                .collect();
            assert_eq!(chunk.content, expected);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start <= pair[0].end, "gap between chunks");
        }
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let config = ChunkerConfig::default();
        let chunks = chunk_transcript("we agreed to ship friday", "t1", &config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "we agreed to ship friday");
        assert_eq!(chunks[0].transcript_id, "t1");
    }

    #[test]
    fn empty_text_is_rejected() {
        let config = ChunkerConfig::default();
        assert!(matches!(
            chunk_transcript("", "t1", &config),
            Err(PipelineError::Input(_))
        ));
        assert!(matches!(
            chunk_transcript("  \n\t ", "t1", &config),
            Err(PipelineError::Input(_))
        ));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(ChunkerConfig::new(100, 100).is_err());
        assert!(ChunkerConfig::new(0, 0).is_err());
        assert!(ChunkerConfig::new(100, 99).is_ok());
    }

    #[test]
    fn five_thousand_chars_make_three_chunks() {
        let config = ChunkerConfig::new(2_000, 200).unwrap();
        let text = words(5_000);
        let chunks = chunk_transcript(&text, "t1", &config).unwrap();
        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 1_800, 3_600]);
        assert_covers(&text, &chunks, &config);
    }

    #[test]
    fn cuts_land_after_whitespace() {
        let config = ChunkerConfig::new(50, 10).unwrap();
        let text = words(400);
        let chunks = chunk_transcript(&text, "t1", &config).unwrap();
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.content.ends_with(' '), "cut mid-word: {:?}", chunk.content);
        }
        assert_covers(&text, &chunks, &config);
    }

    #[test]
    fn unbroken_text_is_hard_cut() {
        let config = ChunkerConfig::new(10, 3).unwrap();
        let text = "x".repeat(25);
        let chunks = chunk_transcript(&text, "t1", &config).unwrap();
        assert!(chunks.iter().all(|c| c.end - c.start <= 10));
        assert_eq!(chunks[0].end, 10);
        assert_covers(&text, &chunks, &config);
    }

    #[test]
    fn coverage_holds_across_sizes_and_multibyte_text() {
        let samples = [
            words(1),
            words(999),
            words(3_333),
            "größe café naïve ünïcödé ".repeat(40),
            "日本語のテキスト 会議 議事録 ".repeat(30),
        ];
        let configs = [
            ChunkerConfig::new(7, 2).unwrap(),
            ChunkerConfig::new(64, 16).unwrap(),
            ChunkerConfig::new(500, 0).unwrap(),
            ChunkerConfig::new(2_000, 200).unwrap(),
        ];
        for text in &samples {
            for config in &configs {
                let chunks = chunk_transcript(text, "t1", config).unwrap();
                assert_covers(text, &chunks, config);
            }
        }
    }
}
