use crate::engine::SearchEngine;
use crate::error::{Result, SearchError};
use homemap_index::PreviewAccessor;
use homemap_protocol::{Answer, QueryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const PATH_WEIGHT: u32 = 3;
const PREVIEW_WEIGHT: u32 = 2;
const LEADING_BONUS: u32 = 1;

/// Characters that separate words inside normalized text.
const BOUNDARIES: [char; 5] = [' ', '/', '.', '_', '-'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReasonerConfig {
    /// Upper bound on candidate paths scored per query, across all tokens.
    pub candidate_limit: usize,
    /// Maximum characters of a result snippet.
    pub snippet_chars: usize,
    /// Characters of preview shown per document in the synthesis.
    pub context_chars: usize,
    /// Number of top results folded into the synthesis.
    pub synthesis_docs: usize,
    /// Number of results with a line in the trace.
    pub trace_results: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 5000,
            snippet_chars: 160,
            context_chars: 380,
            synthesis_docs: 3,
            trace_results: 10,
        }
    }
}

impl ReasonerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.candidate_limit == 0 {
            return Err(SearchError::InvalidConfig(
                "candidate_limit must be at least 1".to_string(),
            ));
        }
        if self.synthesis_docs > 0 && self.context_chars == 0 {
            return Err(SearchError::InvalidConfig(
                "context_chars must be positive when synthesis_docs is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lowercase `text`, turn anything outside `[a-z0-9_./ -]` into a space and
/// collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '.' | '/' | '-' | ' ' => c,
            _ => ' ',
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Whether `token` occurs in `haystack` at the start of a word.
fn matches_word(haystack: &str, token: &str) -> bool {
    haystack.match_indices(token).any(|(at, _)| {
        at == 0
            || haystack[..at]
                .chars()
                .next_back()
                .is_some_and(|c| BOUNDARIES.contains(&c))
    })
}

struct Scored {
    path: String,
    score: u32,
    preview: String,
    rationale: Vec<String>,
    summary: String,
}

/// Deterministic lexical scorer over a search engine and caller-supplied previews.
pub struct Reasoner<'e, 'a> {
    engine: &'e SearchEngine<'a>,
    config: ReasonerConfig,
}

impl<'e, 'a> Reasoner<'e, 'a> {
    pub fn new(engine: &'e SearchEngine<'a>) -> Self {
        Self::with_config(engine, ReasonerConfig::default())
    }

    pub fn with_config(engine: &'e SearchEngine<'a>, config: ReasonerConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Rank paths for `query`.
    ///
    /// Identical inputs produce identical output, including the trace. No
    /// match is an empty answer, not an error.
    pub fn answer(&self, query: &str, previews: &dyn PreviewAccessor, top_k: usize) -> Answer {
        let normalized = normalize(query);
        let tokens = tokenize(&normalized);
        let mut trace = vec![
            format!("Query: {normalized:?}"),
            format!("Tokens: [{}]", tokens.join(", ")),
        ];

        let candidates = self.candidates(&tokens);
        trace.push(format!("Scanned {} candidate paths", candidates.len()));

        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .filter_map(|path| score(path, &tokens, previews))
            .collect();
        let relevant = scored.len();
        // Stable: ties keep discovery order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(top_k);

        if relevant == 0 {
            trace.push("No relevant paths found.".to_string());
        } else if scored.len() < relevant {
            trace.push(format!("Kept {} of {relevant} relevant paths", scored.len()));
        }
        for hit in scored.iter().take(self.config.trace_results) {
            trace.push(format!("{} (score {}): {}", hit.path, hit.score, hit.summary));
        }
        if scored.len() > self.config.trace_results {
            trace.push(format!(
                "... {} more results",
                scored.len() - self.config.trace_results
            ));
        }

        let synthesis = self.synthesize(&scored);
        log::debug!(
            "Answered {normalized:?}: {} results from {} tokens",
            scored.len(),
            tokens.len()
        );

        Answer {
            query: query.to_string(),
            tokens,
            results: scored
                .into_iter()
                .map(|hit| QueryResult {
                    snippet: snippet(&hit.preview, self.config.snippet_chars),
                    path: hit.path,
                    score: hit.score,
                    rationale: hit.rationale,
                })
                .collect(),
            trace,
            synthesis,
        }
    }

    /// Paths matched lexically by any token, in discovery order, at most
    /// `candidate_limit` of them. Tokens are lowercase, so every path starting
    /// with a token is also a substring match.
    fn candidates(&self, tokens: &[String]) -> Vec<&'a str> {
        let limit = self.config.candidate_limit;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for token in tokens {
            if out.len() >= limit {
                break;
            }
            for path in self.engine.substring_search(token, limit) {
                if out.len() >= limit {
                    break;
                }
                if seen.insert(path) {
                    out.push(path);
                }
            }
        }
        out
    }

    fn synthesize(&self, scored: &[Scored]) -> String {
        let mut out = String::new();
        for hit in scored.iter().take(self.config.synthesis_docs) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", hit.path));
            let context = context_window(&hit.preview, self.config.context_chars);
            if !context.is_empty() {
                out.push_str(&context);
                out.push('\n');
            }
        }
        out
    }
}

fn score(path: &str, tokens: &[String], previews: &dyn PreviewAccessor) -> Option<Scored> {
    let norm_path = normalize(path);
    let preview = previews.preview(path).unwrap_or_default();
    let norm_preview = normalize(&preview);

    let mut total = 0;
    let mut in_path = Vec::new();
    let mut in_preview = Vec::new();
    let mut rationale = Vec::new();

    for token in tokens {
        let mut steps = Vec::new();
        if matches_word(&norm_path, token) {
            total += PATH_WEIGHT;
            steps.push(format!("+{PATH_WEIGHT} path"));
            in_path.push(token.as_str());
        }
        if matches_word(&norm_preview, token) {
            total += PREVIEW_WEIGHT;
            steps.push(format!("+{PREVIEW_WEIGHT} preview"));
            in_preview.push(token.as_str());
        }
        if norm_path.starts_with(token.as_str()) {
            total += LEADING_BONUS;
            steps.push(format!("+{LEADING_BONUS} leading"));
        }
        if !steps.is_empty() {
            rationale.push(format!("{token}: {}", steps.join(", ")));
        }
    }

    if total == 0 {
        return None;
    }

    let summary = match (in_path.is_empty(), in_preview.is_empty()) {
        (false, true) => format!("matched tokens {{{}}} in path", in_path.join(", ")),
        (true, false) => format!("matched tokens {{{}}} in preview", in_preview.join(", ")),
        _ => format!(
            "matched tokens {{{}}} in path, {{{}}} in preview",
            in_path.join(", "),
            in_preview.join(", ")
        ),
    };
    rationale.insert(0, summary.clone());

    Some(Scored {
        path: path.to_string(),
        score: total,
        preview,
        rationale,
        summary,
    })
}

/// First non-empty line of `preview`, at most `max_chars` characters.
fn snippet(preview: &str, max_chars: usize) -> String {
    preview
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(max_chars).collect())
        .unwrap_or_default()
}

fn context_window(preview: &str, max_chars: usize) -> String {
    let trimmed = preview.trim();
    let mut chars = trimmed.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
