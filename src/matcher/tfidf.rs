//! TF-IDF relevance ranking of candidate skills.
//!
//! Each candidate becomes one document built from its `description`,
//! `keywords` and `skill` fields. For a prompt with tokens `q1..qn`:
//!
//! ```text
//! tf(t, d)   = occurrences of t in d
//! idf(t)     = 1 + ln(N / (1 + df(t)))
//! score(d)   = sum over qi of tf(qi, d) * idf(qi)
//! ```
//!
//! `df(t) <= N` keeps `idf` positive, so a score is zero exactly when the
//! document shares no token with the prompt.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

lazy_static! {
    /// Stop words dropped from documents (the prompt keeps them, they just never hit)
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "after", "all", "also", "am", "an", "and", "another", "any", "are", "as",
        "at", "be", "because", "been", "before", "being", "between", "both", "but", "by",
        "came", "can", "come", "could", "did", "do", "each", "for", "from", "get", "got", "has",
        "had", "he", "have", "her", "here", "him", "himself", "his", "how", "i", "if", "in",
        "into", "is", "it", "like", "make", "many", "me", "might", "more", "most", "much",
        "must", "my", "never", "now", "of", "on", "only", "or", "other", "our", "out", "over",
        "said", "same", "see", "should", "since", "some", "still", "such", "take", "than",
        "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
        "through", "to", "too", "under", "up", "very", "was", "way", "we", "well", "were",
        "what", "where", "which", "while", "who", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect();
}

pub const METHOD: &str = "tfidf";

// ============================================================================
// Candidates
// ============================================================================

/// `keywords` may arrive as one string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    Text(String),
    List(Vec<String>),
}

impl Keywords {
    fn joined(&self) -> String {
        match self {
            Keywords::Text(text) => text.clone(),
            Keywords::List(list) => list.join(" "),
        }
    }
}

/// A record to rank. Fields other than the three text fields are kept as-is
/// and echoed back with the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Keywords>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    pub fn new(skill: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            skill: Some(skill.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(Keywords::List(keywords));
        self
    }

    /// Composite document text: description, keywords, name.
    pub fn document(&self) -> String {
        [
            self.description.clone().unwrap_or_default(),
            self.keywords.as_ref().map(Keywords::joined).unwrap_or_default(),
            self.skill.clone().unwrap_or_default(),
        ]
        .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,

    #[serde(rename = "tfidfScore")]
    pub tfidf_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfIdfMetadata {
    pub total_candidates: usize,
    pub matched_candidates: usize,
    /// Wall-clock time of the ranking, informational only
    pub elapsed_ms: u64,
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfResult {
    pub matches: Vec<ScoredCandidate>,
    pub metadata: TfIdfMetadata,
}

/// Request body of the `tfidf` subcommand.
#[derive(Debug, Deserialize)]
pub struct TfIdfRequest {
    pub prompt: Option<String>,
    pub candidates: Option<Vec<Candidate>>,
}

// ============================================================================
// Corpus
// ============================================================================

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Term counts for each document, built fresh for every ranking.
#[derive(Debug)]
struct Corpus {
    documents: Vec<HashMap<String, usize>>,
}

impl Corpus {
    fn build<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let documents = texts
            .into_iter()
            .map(|text| {
                let mut counts = HashMap::new();
                for token in tokenize(text) {
                    if !STOP_WORDS.contains(token.as_str()) {
                        *counts.entry(token).or_insert(0) += 1;
                    }
                }
                counts
            })
            .collect();
        Self { documents }
    }

    fn tf(&self, term: &str, doc: usize) -> f64 {
        self.documents[doc].get(term).copied().unwrap_or(0) as f64
    }

    fn idf(&self, term: &str) -> f64 {
        let df = self.documents.iter().filter(|d| d.contains_key(term)).count();
        1.0 + (self.documents.len() as f64 / (1.0 + df as f64)).ln()
    }

    /// Score of every document against `query` tokens.
    fn scores(&self, query: &[String]) -> Vec<f64> {
        let mut idf_cache: HashMap<&str, f64> = HashMap::new();
        for term in query {
            idf_cache
                .entry(term.as_str())
                .or_insert_with(|| self.idf(term));
        }

        (0..self.documents.len())
            .map(|doc| {
                query
                    .iter()
                    .map(|term| self.tf(term, doc) * idf_cache[term.as_str()])
                    .sum()
            })
            .collect()
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Rank `candidates` against `prompt`.
///
/// Only candidates with a positive score are returned, highest first; equal
/// scores keep their input order.
pub fn match_candidates(prompt: &str, candidates: &[Candidate]) -> TfIdfResult {
    let start = Instant::now();

    let documents: Vec<String> = candidates.iter().map(Candidate::document).collect();
    let corpus = Corpus::build(documents.iter().map(String::as_str));
    let scores = corpus.scores(&tokenize(prompt));

    let mut matches: Vec<ScoredCandidate> = candidates
        .iter()
        .zip(scores)
        .filter(|(_, score)| *score > 0.0)
        .map(|(candidate, score)| ScoredCandidate {
            candidate: candidate.clone(),
            tfidf_score: score,
        })
        .collect();

    // Stable sort keeps input order among equal scores
    matches.sort_by(|a, b| {
        b.tfidf_score
            .partial_cmp(&a.tfidf_score)
            .unwrap_or(Ordering::Equal)
    });

    TfIdfResult {
        metadata: TfIdfMetadata {
            total_candidates: candidates.len(),
            matched_candidates: matches.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            method: METHOD.to_string(),
        },
        matches,
    }
}

/// Built-in corpus for `tfidf --test`.
pub fn sample_request() -> (String, Vec<Candidate>) {
    let plugin = |c: Candidate, name: &str| {
        let mut c = c;
        c.extra.insert("plugin".to_string(), Value::String(name.to_string()));
        c
    };
    (
        "버그를 수정하고 싶어요 - fix a bug".to_string(),
        vec![
            plugin(
                Candidate::new("frontend-dev-guidelines", "React and TypeScript development patterns"),
                "dev-guidelines",
            ),
            plugin(
                Candidate::new("error-tracking", "Error tracking and bug fixing with Sentry"),
                "dev-guidelines",
            ),
            plugin(
                Candidate::new("intelligent-task-router", "Task routing and classification"),
                "workflow-automation",
            ),
        ],
    )
}
