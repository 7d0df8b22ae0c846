//! Sentence segmentation and sentence-window chunking.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::types::Chunk;

pub const DEFAULT_SENTENCES_PER_CHUNK: usize = 5;
pub const DEFAULT_MIN_CHUNK_LENGTH: usize = 50;

/// Terminal punctuation, optional closing quotes/brackets, then whitespace or end of text.
static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["'\u{201D}\u{2019})\]]*(?:\s+|$)"#).unwrap());

/// Lowercased tokens whose trailing period never ends a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "inc.", "ltd.", "corp.", "co.",
    "llc.", "etc.", "vs.", "v.", "al.", "no.", "nos.", "vol.", "sec.", "art.", "fig.", "ref.",
    "para.", "cl.", "ch.", "pp.", "approx.", "ph.d.", "e.g.", "i.e.", "u.s.", "u.k.", "jan.",
    "feb.", "mar.", "apr.", "jun.", "jul.", "aug.", "sep.", "sept.", "oct.", "nov.", "dec.",
];

/// Splits prose into sentences.
pub trait SentenceSegmenter: Send + Sync {
    /// Return trimmed, non-empty sentences in document order.
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Punctuation-driven segmenter that skips abbreviations, initials and dotted
/// initialisms. Periods inside numbers (`3.2`, `1.5%`) are never followed by
/// whitespace and so never split.
///
/// A sentence that ends with a protected abbreviation is merged with the next one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSegmenter;

impl RegexSegmenter {
    fn is_protected(token: &str) -> bool {
        let word = token.trim_start_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            return false;
        }
        let lower = word.to_lowercase();
        if ABBREVIATIONS.contains(&lower.as_str()) {
            return true;
        }
        let mut chars = word.chars();
        // Single capital initial, "J."
        if let (Some(first), Some('.'), None) = (chars.next(), chars.next(), chars.next())
            && first.is_uppercase()
        {
            return true;
        }
        // Dotted initialism, "U.S.A."
        let parts: Vec<&str> = word.split('.').filter(|s| !s.is_empty()).collect();
        parts.len() >= 2
            && parts
                .iter()
                .all(|p| p.chars().count() == 1 && p.chars().all(char::is_alphabetic))
    }
}

impl SentenceSegmenter for RegexSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in BOUNDARY_RE.find_iter(text) {
            let punct = &text[m.start()..m.end()];
            if punct.starts_with('.') && !punct.starts_with("..") {
                let head = &text[start..=m.start()];
                let token = head.rsplit(char::is_whitespace).next().unwrap_or_default();
                if Self::is_protected(token) {
                    continue;
                }
            }
            let sentence = text[start..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_owned());
            }
            start = m.end();
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_owned());
        }
        sentences
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub sentences_per_chunk: usize,
    pub min_chunk_length: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            sentences_per_chunk: DEFAULT_SENTENCES_PER_CHUNK,
            min_chunk_length: DEFAULT_MIN_CHUNK_LENGTH,
        }
    }
}

/// Groups sentences into consecutive, non-overlapping windows.
///
/// Windows shorter than `min_chunk_length` characters are dropped, never merged
/// into a neighbour.
#[derive(Clone)]
pub struct SentenceChunker {
    config: ChunkerConfig,
    segmenter: Arc<dyn SentenceSegmenter>,
}

impl std::fmt::Debug for SentenceChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceChunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl SentenceChunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self::with_segmenter(config, Arc::new(RegexSegmenter))
    }

    #[must_use]
    pub fn with_segmenter(config: ChunkerConfig, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        Self { config, segmenter }
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let window = self.config.sentences_per_chunk.max(1);
        let sentences = self.segmenter.segment(text);

        sentences
            .chunks(window)
            .map(|group| group.join(" "))
            .filter(|chunk| chunk.chars().count() >= self.config.min_chunk_length)
            .collect()
    }

    /// Chunk `text` and number the kept chunks contiguously from zero.
    #[must_use]
    pub fn chunk_document(&self, document_id: i64, text: &str) -> Vec<Chunk> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                document_id,
                chunk_index,
                length: text.chars().count(),
                text,
            })
            .collect()
    }
}

/// Chunk `text` with the default segmenter.
#[must_use]
pub fn chunk(text: &str, sentences_per_chunk: usize, min_chunk_length: usize) -> Vec<String> {
    SentenceChunker::new(ChunkerConfig {
        sentences_per_chunk,
        min_chunk_length,
    })
    .chunk(text)
}
