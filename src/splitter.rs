//! Recursive text splitting
//!
//! Splits text into bounded chunks by recursively trying a prioritized
//! separator list (paragraph, line, word, character). Pieces that fit the
//! size bound are greedily merged back together; pieces that do not are
//! re-split on the next separator. Adjacent chunks can share a configurable
//! trailing/leading overlap.

use crate::errors::IngestError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Stock separator list, most-preferred first. The trailing empty string
/// means character-level splitting as the last resort.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Length-counting function for the chunk size bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthMeasure {
    /// Unicode scalar values
    #[default]
    Chars,
    /// UTF-8 bytes
    Bytes,
}

impl LengthMeasure {
    pub fn measure(&self, text: &str) -> usize {
        match self {
            LengthMeasure::Chars => text.chars().count(),
            LengthMeasure::Bytes => text.len(),
        }
    }
}

/// Configuration for text splitting
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Maximum chunk length, measured per `length`
    pub chunk_size: usize,
    /// Units shared between adjacent chunks
    pub chunk_overlap: usize,
    /// Length-counting function
    pub length: LengthMeasure,
    /// Separators to try, most-preferred first
    pub separators: Vec<String>,
    /// Treat separators as regex patterns instead of literals
    pub separator_is_regex: bool,
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            length: LengthMeasure::default(),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            separator_is_regex: false,
        }
    }

    pub fn with_length(mut self, length: LengthMeasure) -> Self {
        self.length = length;
        self
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn with_separator_is_regex(mut self, separator_is_regex: bool) -> Self {
        self.separator_is_regex = separator_is_regex;
        self
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::new(512, 0)
    }
}

/// A separator ready for matching
#[derive(Debug)]
enum Separator {
    /// Empty separator, splits into characters
    Chars,
    Literal(String),
    Pattern(Regex),
}

impl Separator {
    fn matches(&self, text: &str) -> bool {
        match self {
            Separator::Chars => true,
            Separator::Literal(s) => text.contains(s.as_str()),
            Separator::Pattern(re) => re.is_match(text),
        }
    }

    /// The text re-inserted between merged pieces. Pattern splits keep the
    /// matched span on the preceding piece, so they rejoin with nothing.
    fn join_str(&self) -> &str {
        match self {
            Separator::Literal(s) => s.as_str(),
            _ => "",
        }
    }

    fn split(&self, text: &str) -> Vec<String> {
        let pieces: Vec<String> = match self {
            Separator::Chars => text.chars().map(|c| c.to_string()).collect(),
            Separator::Literal(s) => text.split(s.as_str()).map(|p| p.to_string()).collect(),
            Separator::Pattern(re) => {
                // Cut at match ends so the matched text stays in the chunk
                let mut pieces = Vec::new();
                let mut last = 0;
                for m in re.find_iter(text) {
                    if m.end() == m.start() {
                        continue;
                    }
                    pieces.push(text[last..m.end()].to_string());
                    last = m.end();
                }
                if last < text.len() {
                    pieces.push(text[last..].to_string());
                }
                pieces
            }
        };
        pieces.into_iter().filter(|p| !p.is_empty()).collect()
    }
}

/// Recursive character splitter
#[derive(Debug)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    length: LengthMeasure,
    separators: Vec<Separator>,
}

impl RecursiveSplitter {
    /// Build a splitter, compiling separator patterns when configured.
    /// Overlap must be strictly smaller than the chunk size.
    pub fn new(config: SplitterConfig) -> Result<Self, IngestError> {
        if config.chunk_size == 0 {
            return Err(IngestError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(IngestError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let mut separators = Vec::with_capacity(config.separators.len());
        for raw in &config.separators {
            let separator = if raw.is_empty() {
                Separator::Chars
            } else if config.separator_is_regex {
                let re = Regex::new(raw).map_err(|e| IngestError::SeparatorPattern {
                    pattern: raw.clone(),
                    message: e.to_string(),
                })?;
                Separator::Pattern(re)
            } else {
                Separator::Literal(raw.clone())
            };
            separators.push(separator);
        }

        if separators.is_empty() {
            separators.push(Separator::Chars);
        }

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            length: config.length,
            separators,
        })
    }

    /// Split text into chunks within the size bound. A piece larger than the
    /// bound that no remaining separator can divide is emitted as-is.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunks = self.split_recursive(text, &self.separators);

        debug!(
            input_len = self.length.measure(text),
            chunk_count = chunks.len(),
            chunk_size = self.chunk_size,
            "Text split"
        );

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        // First separator that matches wins; the last one is the fallback
        let index = separators
            .iter()
            .position(|s| s.matches(text))
            .unwrap_or(separators.len() - 1);
        let separator = &separators[index];
        let remaining = &separators[index + 1..];

        let pieces = separator.split(text);
        let join = separator.join_str();

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for piece in pieces {
            if self.length.measure(&piece) <= self.chunk_size {
                good.push(piece);
            } else {
                if !good.is_empty() {
                    chunks.extend(self.merge(&good, join));
                    good.clear();
                }
                if remaining.is_empty() {
                    // Indivisible oversized piece, keep it whole
                    chunks.push(piece);
                } else {
                    chunks.extend(self.split_recursive(&piece, remaining));
                }
            }
        }

        if !good.is_empty() {
            chunks.extend(self.merge(&good, join));
        }

        chunks
    }

    /// Greedily merge size-conforming pieces into chunks, carrying the
    /// configured overlap forward as a sliding window.
    fn merge(&self, pieces: &[String], join: &str) -> Vec<String> {
        let join_len = self.length.measure(join);

        let mut chunks = Vec::new();
        let mut window: VecDeque<&String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = self.length.measure(piece);
            let extra = if window.is_empty() { 0 } else { join_len };

            if total + piece_len + extra > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window, join) {
                    chunks.push(chunk);
                }
                // Shrink until within the overlap budget and the new piece fits
                loop {
                    let extra = if window.is_empty() { 0 } else { join_len };
                    let fits = total + piece_len + extra <= self.chunk_size;
                    if window.is_empty() || (total <= self.chunk_overlap && fits) {
                        break;
                    }
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    let after = if window.is_empty() { 0 } else { join_len };
                    total = total.saturating_sub(self.length.measure(front) + after);
                }
                if window.is_empty() {
                    total = 0;
                }
            }

            window.push_back(piece);
            total += piece_len + if window.len() > 1 { join_len } else { 0 };
        }

        if let Some(chunk) = join_window(&window, join) {
            chunks.push(chunk);
        }

        chunks
    }
}

fn join_window(window: &VecDeque<&String>, join: &str) -> Option<String> {
    let joined = window
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(join);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(SplitterConfig::new(chunk_size, chunk_overlap)).unwrap()
    }

    fn prose(chars: usize) -> String {
        let mut text = String::new();
        let mut word = 0;
        while text.chars().count() < chars {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&format!("word{}", word));
            word += 1;
        }
        text.chars().take(chars).collect()
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(splitter(512, 0).split("").is_empty());
        assert!(splitter(512, 0).split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = splitter(512, 0).split("Hello world.");
        assert_eq!(chunks, vec!["Hello world.".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = prose(5000);
        for size in [64, 128, 512] {
            for chunk in splitter(size, 0).split(&text) {
                assert!(
                    chunk.chars().count() <= size,
                    "chunk of {} chars exceeds bound {}",
                    chunk.chars().count(),
                    size
                );
            }
        }
    }

    #[test]
    fn test_thousand_chars_at_512_gives_two_chunks() {
        let text = prose(1000);
        let chunks = splitter(512, 0).split(&text);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 512);
        }
    }

    #[test]
    fn test_content_round_trip_without_overlap() {
        let text = "First paragraph here.\n\nSecond paragraph follows.\nWith a second line. And more words to push past the bound.";
        let chunks = splitter(40, 0).split(text);
        let rejoined: String = chunks.concat();
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&rejoined), strip(text));
    }

    #[test]
    fn test_overlap_repeats_trailing_content() {
        let text = prose(300);
        let chunks = splitter(100, 30).split(&text);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            // The head of each chunk re-appears at the tail of the previous one
            let head: String = pair[1].chars().take(10).collect();
            assert!(
                pair[0].contains(&head),
                "no shared span between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let text = "alpha beta gamma\n\ndelta epsilon zeta";
        let chunks = splitter(20, 0).split(text);
        assert_eq!(
            chunks,
            vec!["alpha beta gamma".to_string(), "delta epsilon zeta".to_string()]
        );
    }

    #[test]
    fn test_oversized_token_emitted_whole() {
        // No character-level fallback configured, so the token is atomic
        let config = SplitterConfig::new(10, 0).with_separators(vec![" ".to_string()]);
        let splitter = RecursiveSplitter::new(config).unwrap();
        let token = "x".repeat(25);
        let chunks = splitter.split(&format!("tiny {} tail", token));
        assert!(chunks.contains(&token));
    }

    #[test]
    fn test_character_fallback_splits_long_tokens() {
        // Stock separators end with "", so long tokens are char-split
        let token = "y".repeat(25);
        let chunks = splitter(10, 0).split(&token);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_regex_separators() {
        let config = SplitterConfig::new(10, 0)
            .with_separators(vec![r"\d+".to_string()])
            .with_separator_is_regex(true);
        let splitter = RecursiveSplitter::new(config).unwrap();
        let chunks = splitter.split("one123two456three");
        assert_eq!(
            chunks,
            vec![
                "one123".to_string(),
                "two456".to_string(),
                "three".to_string()
            ]
        );
    }

    #[test]
    fn test_regex_split_preserves_content() {
        let config = SplitterConfig::new(8, 0)
            .with_separators(vec![r"\d+".to_string()])
            .with_separator_is_regex(true);
        let splitter = RecursiveSplitter::new(config).unwrap();
        let text = "one123two456three";
        let chunks = splitter.split(text);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let config = SplitterConfig::new(10, 0)
            .with_separators(vec!["[".to_string()])
            .with_separator_is_regex(true);
        let err = RecursiveSplitter::new(config).unwrap_err();
        assert!(matches!(err, IngestError::SeparatorPattern { .. }));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let err = RecursiveSplitter::new(SplitterConfig::new(100, 100)).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn test_byte_length_measure() {
        let config = SplitterConfig::new(8, 0).with_length(LengthMeasure::Bytes);
        let splitter = RecursiveSplitter::new(config).unwrap();
        for chunk in splitter.split("héllo wörld wide wéb") {
            assert!(chunk.len() <= 8);
        }
    }
}
