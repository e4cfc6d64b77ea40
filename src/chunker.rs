//! Text chunking strategies.
//!
//! Splits raw document text into the units that get embedded and indexed.
//! Two strategies: fixed-size character windows with overlap, and
//! sentence-grouped chunks that never split a sentence.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::config::ChunkingSettings;
use crate::core::errors::CoreError;

/// Chunking strategy, selected by name at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Consecutive windows of `size` characters, each window starting
    /// `size - overlap` characters after the previous one.
    Fixed { size: usize, overlap: usize },
    /// Groups of up to `max_sentences` consecutive sentences.
    Sentence { max_sentences: usize },
}

impl ChunkStrategy {
    /// Resolves a strategy name ("fixed" or "sentence") against the
    /// configured parameters. Unknown names are rejected before any
    /// network call happens.
    pub fn from_name(name: &str, cfg: &ChunkingSettings) -> Result<Self, CoreError> {
        match name {
            "fixed" => Ok(ChunkStrategy::Fixed {
                size: cfg.size,
                overlap: cfg.overlap,
            }),
            "sentence" => Ok(ChunkStrategy::Sentence {
                max_sentences: cfg.max_sentences,
            }),
            other => Err(CoreError::InvalidStrategy(other.to_string())),
        }
    }

    /// Name persisted in vector metadata and document records.
    pub fn name(&self) -> &'static str {
        match self {
            ChunkStrategy::Fixed { .. } => "fixed",
            ChunkStrategy::Sentence { .. } => "sentence",
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        match *self {
            ChunkStrategy::Fixed { size, overlap } => {
                if size == 0 {
                    return Err(CoreError::InvalidChunkParams(
                        "chunk size must be positive".to_string(),
                    ));
                }
                if overlap >= size {
                    // A window that advances by size - overlap <= 0 never
                    // terminates.
                    return Err(CoreError::InvalidChunkParams(format!(
                        "overlap ({overlap}) must be less than chunk size ({size})"
                    )));
                }
                Ok(())
            }
            ChunkStrategy::Sentence { max_sentences } => {
                if max_sentences == 0 {
                    return Err(CoreError::InvalidChunkParams(
                        "max sentences per chunk must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Splits `text` into ordered chunks under the given strategy.
///
/// Empty or whitespace-only input yields an empty sequence. Text with no
/// matching boundaries comes back as a single chunk.
pub fn chunk_text(text: &str, strategy: ChunkStrategy) -> Result<Vec<String>, CoreError> {
    strategy.validate()?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let chunks = match strategy {
        ChunkStrategy::Fixed { size, overlap } => chunk_fixed(text, size, overlap),
        ChunkStrategy::Sentence { max_sentences } => chunk_sentences(text, max_sentences),
    };
    Ok(chunks)
}

/// Fixed-size windows over characters (not bytes), so multi-byte text never
/// splits inside a code point. The final window may be shorter than `size`.
fn chunk_fixed(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }
    chunks
}

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex"))
}

/// Splits on sentence-terminal punctuation followed by whitespace, then
/// groups consecutive sentences. The trailing partial group is kept as-is.
fn chunk_sentences(text: &str, max_sentences: usize) -> Vec<String> {
    let trimmed = text.trim();

    let mut sentences = Vec::new();
    let mut last = 0;
    for boundary in sentence_boundary().find_iter(trimmed) {
        // The terminator is a single ASCII char, so +1 stays on a char
        // boundary.
        let sentence = trimmed[last..boundary.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = boundary.end();
    }
    let tail = trimmed[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
        .chunks(max_sentences)
        .map(|group| group.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(size: usize, overlap: usize) -> ChunkStrategy {
        ChunkStrategy::Fixed { size, overlap }
    }

    #[test]
    fn fixed_windows_cover_text_without_gaps() {
        let text: String = ('a'..='z').cycle().take(137).collect();
        let (size, overlap) = (40, 10);
        let chunks = chunk_text(&text, fixed(size, overlap)).unwrap();

        // Every window except the last is full-size.
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), size);
        }

        // Dropping the overlapped prefix of each later window reconstructs
        // the original text.
        let step = size - overlap;
        let mut rebuilt: String = chunks[0].chars().take(step).collect();
        for chunk in &chunks[1..chunks.len() - 1] {
            rebuilt.extend(chunk.chars().take(step));
        }
        rebuilt.push_str(chunks.last().unwrap());
        assert_eq!(rebuilt, text);

        let expected = (text.chars().count() + step - 1) / step;
        assert_eq!(chunks.len(), expected);
    }

    #[test]
    fn fixed_window_count_matches_advance() {
        let text = "x".repeat(100);
        let chunks = chunk_text(&text, fixed(50, 10)).unwrap();
        // starts at 0, 40, 80
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 20);
    }

    #[test]
    fn fixed_short_text_is_single_chunk() {
        let chunks = chunk_text("short", fixed(500, 50)).unwrap();
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn fixed_handles_multibyte_text() {
        let text = "日本語のテキスト".repeat(20);
        let chunks = chunk_text(&text, fixed(30, 5)).unwrap();
        assert!(chunks.len() > 1);
        let total: usize = chunks[0].chars().count();
        assert_eq!(total, 30);
    }

    #[test]
    fn fixed_rejects_bad_params() {
        assert!(matches!(
            chunk_text("text", fixed(50, 50)),
            Err(CoreError::InvalidChunkParams(_))
        ));
        assert!(matches!(
            chunk_text("text", fixed(0, 0)),
            Err(CoreError::InvalidChunkParams(_))
        ));
    }

    #[test]
    fn sentence_groups_never_split_sentences() {
        let text = "One is here. Two is here! Three is here? Four is here. Five.";
        let chunks = chunk_text(text, ChunkStrategy::Sentence { max_sentences: 2 }).unwrap();

        assert_eq!(
            chunks,
            vec![
                "One is here. Two is here!".to_string(),
                "Three is here? Four is here.".to_string(),
                "Five.".to_string(),
            ]
        );
    }

    #[test]
    fn sentence_without_boundaries_is_single_chunk() {
        let text = "no terminal punctuation at all";
        let chunks = chunk_text(text, ChunkStrategy::Sentence { max_sentences: 5 }).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn sentence_rejects_zero_group_size() {
        assert!(matches!(
            chunk_text("One. Two.", ChunkStrategy::Sentence { max_sentences: 0 }),
            Err(CoreError::InvalidChunkParams(_))
        ));
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(chunk_text("", fixed(100, 10)).unwrap().is_empty());
        assert!(chunk_text("   \n ", fixed(100, 10)).unwrap().is_empty());
        assert!(chunk_text("", ChunkStrategy::Sentence { max_sentences: 3 })
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        let cfg = ChunkingSettings::default();
        assert!(matches!(
            ChunkStrategy::from_name("semantic", &cfg),
            Err(CoreError::InvalidStrategy(_))
        ));

        let fixed = ChunkStrategy::from_name("fixed", &cfg).unwrap();
        assert_eq!(fixed, ChunkStrategy::Fixed { size: 500, overlap: 50 });
        assert_eq!(fixed.name(), "fixed");
    }
}
