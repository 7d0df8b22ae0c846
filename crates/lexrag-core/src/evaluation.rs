//! Heuristic quality metrics for retrieval results and generated answers.

use std::collections::HashSet;
use std::fmt::{self, Write as _};

use lexrag_llm::{Embedder, LlmError};
use lexrag_memory::RetrievalResult;
use serde::Serialize;

use crate::answer::AnswerResponse;

const HIGH_SCORE: f32 = 0.7;
const MEDIUM_SCORE: f32 = 0.5;
/// Answer-to-reference cosine similarity above which the answer counts as a match.
const MATCH_EXPECTED: f32 = 0.75;

const HIGH_CONFIDENCE_PHRASES: &[&str] = &[
    "explicitly states",
    "clearly indicates",
    "directly mentions",
    "according to",
    "states that",
    "specifies that",
];
const LOW_CONFIDENCE_PHRASES: &[&str] = &[
    "unclear",
    "not specified",
    "cannot determine",
    "may or may not",
    "insufficient information",
    "does not mention",
    "do not contain enough information",
    "does not contain enough information",
];
const GENERIC_PHRASES: &[&str] = &[
    "i cannot answer",
    "no information",
    "not found",
    "no relevant information",
    "unable to determine",
    "please rephrase",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Confidence of a grounded answer from its top similarity score. Any grounded
    /// answer is at least medium; no score means nothing was grounded.
    #[must_use]
    pub fn from_score(score: Option<f32>) -> Self {
        match score {
            Some(s) if s > HIGH_SCORE => Self::High,
            Some(_) => Self::Medium,
            None => Self::Low,
        }
    }

    /// Infer the level from hedging in the answer text. High-confidence phrasing
    /// wins over low, low over medium; plain answers count as medium.
    #[must_use]
    pub fn from_phrasing(answer: &str) -> Self {
        let lower = answer.to_lowercase();
        let has = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));
        if has(HIGH_CONFIDENCE_PHRASES) {
            Self::High
        } else if has(LOW_CONFIDENCE_PHRASES) {
            Self::Low
        } else {
            Self::Medium
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::Excellent,
            60..80 => Self::Good,
            40..60 => Self::Fair,
            _ => Self::Poor,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalMetrics {
    pub num_chunks: usize,
    pub avg_score: f32,
    pub max_score: f32,
    pub min_score: f32,
    pub score_range: f32,
    /// Score above 0.7.
    pub high_quality_chunks: usize,
    /// Score in (0.5, 0.7].
    pub medium_quality_chunks: usize,
    /// Score at or below 0.5.
    pub low_quality_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth_coverage: Option<f32>,
}

impl RetrievalMetrics {
    /// Score distribution of `results`; all zero when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[RetrievalResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        let max_score = scores.iter().copied().fold(f32::MIN, f32::max);
        let min_score = scores.iter().copied().fold(f32::MAX, f32::min);
        Self {
            num_chunks: scores.len(),
            avg_score: scores.iter().sum::<f32>() / scores.len() as f32,
            max_score,
            min_score,
            score_range: max_score - min_score,
            high_quality_chunks: scores.iter().filter(|&&s| s > HIGH_SCORE).count(),
            medium_quality_chunks: scores
                .iter()
                .filter(|&&s| s > MEDIUM_SCORE && s <= HIGH_SCORE)
                .count(),
            low_quality_chunks: scores.iter().filter(|&&s| s <= MEDIUM_SCORE).count(),
            ground_truth_coverage: None,
        }
    }

    /// Like [`RetrievalMetrics::from_results`], plus the share of `expected` passages
    /// found in the results. A passage counts when it contains, or is contained in,
    /// some retrieved text.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_ground_truth(results: &[RetrievalResult], expected: &[String]) -> Self {
        let mut metrics = Self::from_results(results);
        if !expected.is_empty() {
            let found = expected
                .iter()
                .filter(|gt| {
                    results
                        .iter()
                        .any(|r| r.text.contains(gt.as_str()) || gt.contains(r.text.as_str()))
                })
                .count();
            metrics.ground_truth_coverage = Some(found as f32 / expected.len() as f32);
        }
        metrics
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerMetrics {
    /// Length in characters.
    pub answer_length: usize,
    pub answer_word_count: usize,
    pub question_length: usize,
    pub confidence_level: ConfidenceLevel,
    /// Share of distinct answer words that also occur in the sources.
    pub context_word_overlap: f32,
    /// The answer refers to an `Excerpt N` label.
    pub has_citation: bool,
    pub is_generic: bool,
    /// Cosine similarity between the answer and a reference answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_to_expected: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches_expected: Option<bool>,
}

impl AnswerMetrics {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(question: &str, answer: &str, sources: &[RetrievalResult]) -> Self {
        let lower = answer.to_lowercase();
        let answer_words = words(&lower);
        let context_words: HashSet<String> = sources
            .iter()
            .flat_map(|s| words(&s.text.to_lowercase()))
            .collect();
        let context_word_overlap = if answer_words.is_empty() {
            0.0
        } else {
            answer_words.intersection(&context_words).count() as f32 / answer_words.len() as f32
        };

        Self {
            answer_length: answer.chars().count(),
            answer_word_count: answer.split_whitespace().count(),
            question_length: question.chars().count(),
            confidence_level: ConfidenceLevel::from_phrasing(answer),
            context_word_overlap,
            has_citation: lower.contains("excerpt"),
            is_generic: GENERIC_PHRASES.iter().any(|p| lower.contains(p)),
            similarity_to_expected: None,
            matches_expected: None,
        }
    }

    /// Compare `answer` with a reference answer in embedding space.
    ///
    /// # Errors
    ///
    /// Returns an error if either text cannot be embedded.
    pub async fn with_expected(
        mut self,
        embedder: &Embedder,
        answer: &str,
        expected: &str,
    ) -> Result<Self, LlmError> {
        let vectors = embedder
            .embed(&[answer.to_owned(), expected.to_owned()])
            .await?;
        let [a, b] = vectors.as_slice() else {
            return Err(LlmError::Other(format!(
                "expected 2 embeddings, got {}",
                vectors.len()
            )));
        };
        let similarity = cosine(a, b);
        self.similarity_to_expected = Some(similarity);
        self.matches_expected = Some(similarity > MATCH_EXPECTED);
        Ok(self)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm(a) * norm(b);
    if denom > f32::EPSILON { dot / denom } else { 0.0 }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Combine retrieval, answer and confidence into a 0-100 score.
///
/// Retrieval contributes up to 40, the answer up to 40, confidence up to 20.
#[must_use]
pub fn quality_score(
    retrieval: &RetrievalMetrics,
    answer: &AnswerMetrics,
    confidence: ConfidenceLevel,
) -> u32 {
    let mut score = 0;

    if retrieval.avg_score > 0.8 {
        score += 20;
    } else if retrieval.avg_score > 0.6 {
        score += 10;
    }
    score += match retrieval.high_quality_chunks {
        0 => 0,
        1 => 10,
        _ => 20,
    };

    if answer.answer_length > 100 {
        score += 10;
    }
    if !answer.is_generic {
        score += 15;
    }
    if answer.context_word_overlap > 0.3 {
        score += 15;
    }

    score += match confidence {
        ConfidenceLevel::High => 20,
        ConfidenceLevel::Medium => 10,
        ConfidenceLevel::Low => 0,
    };
    score
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub question: String,
    pub retrieval: RetrievalMetrics,
    pub answer: AnswerMetrics,
    pub confidence: ConfidenceLevel,
    pub score: u32,
    pub overall_quality: QualityGrade,
}

impl EvaluationReport {
    /// Evaluate one answered question. Confidence is bucketed from the response's
    /// top source score.
    #[must_use]
    pub fn evaluate(question: &str, response: &AnswerResponse) -> Self {
        let retrieval = RetrievalMetrics::from_results(&response.sources);
        let answer = AnswerMetrics::compute(question, &response.answer, &response.sources);
        let confidence = ConfidenceLevel::from_score(response.confidence);
        let score = quality_score(&retrieval, &answer, confidence);
        let report = Self {
            question: question.chars().take(100).collect(),
            retrieval,
            answer,
            confidence,
            score,
            overall_quality: QualityGrade::from_score(score),
        };
        tracing::info!(
            score,
            grade = %report.overall_quality,
            chunks = report.retrieval.num_chunks,
            "evaluation complete"
        );
        report
    }

    /// [`EvaluationReport::evaluate`] plus a comparison of the answer with `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer or the reference cannot be embedded.
    pub async fn evaluate_with_expected(
        question: &str,
        response: &AnswerResponse,
        expected: &str,
        embedder: &Embedder,
    ) -> Result<Self, LlmError> {
        let mut report = Self::evaluate(question, response);
        report.answer = report
            .answer
            .with_expected(embedder, &response.answer, expected)
            .await?;
        tracing::info!(
            similarity = ?report.answer.similarity_to_expected,
            "compared answer with expected answer"
        );
        Ok(report)
    }

    /// Human-readable multi-line report.
    #[must_use]
    pub fn render(&self) -> String {
        let rule = "=".repeat(70);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "RAG PIPELINE EVALUATION REPORT");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Question: {}", self.question);
        let _ = writeln!(
            out,
            "Overall Quality: {} ({}/100)",
            self.overall_quality.as_str().to_uppercase(),
            self.score
        );
        let _ = writeln!(out, "Confidence: {}", self.confidence);

        let r = &self.retrieval;
        let _ = writeln!(out, "\n--- RETRIEVAL METRICS ---");
        let _ = writeln!(out, "Chunks Retrieved: {}", r.num_chunks);
        let _ = writeln!(out, "Average Score: {:.3}", r.avg_score);
        let _ = writeln!(out, "High Quality Chunks: {}", r.high_quality_chunks);
        let _ = writeln!(out, "Medium Quality Chunks: {}", r.medium_quality_chunks);
        let _ = writeln!(out, "Low Quality Chunks: {}", r.low_quality_chunks);
        if let Some(coverage) = r.ground_truth_coverage {
            let _ = writeln!(out, "Ground Truth Coverage: {:.1}%", coverage * 100.0);
        }

        let a = &self.answer;
        let _ = writeln!(out, "\n--- ANSWER METRICS ---");
        let _ = writeln!(
            out,
            "Answer Length: {} chars ({} words)",
            a.answer_length, a.answer_word_count
        );
        let _ = writeln!(out, "Confidence Level: {}", a.confidence_level);
        let _ = writeln!(out, "Context Usage: {:.1}%", a.context_word_overlap * 100.0);
        let _ = writeln!(out, "Cites Excerpts: {}", yes_no(a.has_citation));
        let _ = writeln!(out, "Generic Answer: {}", yes_no(a.is_generic));
        if let Some(similarity) = a.similarity_to_expected {
            let _ = writeln!(out, "Similarity to Expected: {similarity:.3}");
        }
        if let Some(matches) = a.matches_expected {
            let _ = writeln!(out, "Matches Expected: {}", yes_no(matches));
        }
        let _ = write!(out, "{rule}");
        out
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}
