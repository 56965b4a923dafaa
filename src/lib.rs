use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First-pass window radius on the raw stream.
pub const RAW_RADIUS: usize = 1000;
/// Escalation radius on the raw stream, used only when the first pass yields nothing.
pub const RAW_RADIUS_WIDE: usize = 3000;
/// Single-pass window radius on the block-flattened stream.
pub const BLOCK_RADIUS: usize = 500;
/// Window radius around a proximity-fallback span.
pub const PROXIMITY_RADIUS: usize = 500;
/// Maximum characters between keyword and indicator (and after it) in the fallback search.
pub const PROXIMITY_GAP: usize = 200;

const EXCERPT_CHARS: usize = 160;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("DocumentUnavailable: {0}")]
    Unavailable(String),
    #[error("ReadFailed: {0}")]
    Read(String),
}

/// Load the statute document from disk.
/// The source files circulate as windows-1252; try that first and fall back to
/// lossy UTF-8, so extraction never fails on decoding alone.
pub fn load_document(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::Unavailable(path.display().to_string()));
    }
    let bytes = std::fs::read(path).map_err(|e| DocumentError::Read(e.to_string()))?;
    match encoding_rs::WINDOWS_1252.decode_without_bom_handling_and_without_replacement(&bytes) {
        Some(text) => Ok(text.into_owned()),
        None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read keyword config: {0}")]
    Read(String),
    #[error("Failed to parse keyword config: {0}")]
    Parse(String),
    #[error("Invalid keyword config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub keywords: Vec<String>,
}

/// Load the ordered offense keyword list from a YAML file.
pub fn load_keywords(path: &Path) -> Result<Vec<String>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let cfg: KeywordConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let keywords: Vec<String> = cfg
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(ConfigError::Invalid("empty keyword list".into()));
    }
    Ok(keywords)
}

/// Built-in offense list used when no config file is given.
pub fn default_keywords() -> Vec<String> {
    [
        "Furto",
        "Roubo",
        "Homicídio doloso",
        "Estelionato",
        "Receptação",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("SelectorParse: {0}")]
    Selector(String),
}

/// Optional capability: flatten structured markup into block-delimited,
/// whitespace-normalized, lower-case text. The engine degrades to the raw
/// stream when the capability is absent or fails.
pub trait BlockFlatten {
    fn flatten(&self, markup: &str) -> Result<String, FlattenError>;
}

/// HTML block flattener over headings, paragraphs, list items and table cells.
pub struct HtmlBlocks;

impl BlockFlatten for HtmlBlocks {
    fn flatten(&self, markup: &str) -> Result<String, FlattenError> {
        let doc = scraper::Html::parse_document(markup);
        let sel = scraper::Selector::parse("h1,h2,h3,h4,h5,h6,p,li,td,th")
            .map_err(|e| FlattenError::Selector(e.to_string()))?;
        let mut blocks: Vec<String> = Vec::new();
        for el in doc.select(&sel) {
            // Concatenate text nodes without separators: inline tags may split a
            // word ("Fur<b>to</b>") and the block stream must rejoin it.
            let text = norm_ws(&el.text().collect::<String>());
            if !text.is_empty() {
                blocks.push(text.to_lowercase());
            }
        }
        Ok(blocks.join("\n"))
    }
}

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Immutable per-run snapshot: lower-case raw stream plus an optional
/// lower-case block-flattened stream.
#[derive(Debug, Clone)]
pub struct Document {
    raw: String,
    blocks: Option<String>,
}

impl Document {
    pub fn new(text: &str, flattener: Option<&dyn BlockFlatten>) -> Document {
        let raw = text.to_lowercase();
        let blocks = flattener.and_then(|f| f.flatten(text).ok());
        Document { raw, blocks }
    }

    pub fn raw_stream(&self) -> &str {
        &self.raw
    }

    pub fn block_stream(&self) -> Option<&str> {
        self.blocks.as_deref()
    }
}

/// Lazy iterator over the byte positions of a keyword in a stream.
/// Matching is case-insensitive substring matching, deliberately not
/// word-boundary aware.
pub struct Occurrences<'a> {
    stream: &'a str,
    needle: String,
    at: usize,
}

impl<'a> Iterator for Occurrences<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.needle.is_empty() || self.at > self.stream.len() {
            return None;
        }
        let found = self.stream[self.at..].find(&self.needle)?;
        let pos = self.at + found;
        self.at = pos + self.needle.len();
        Some(pos)
    }
}

/// Locate every occurrence of `keyword` in `stream`. Restartable: call again
/// for a fresh pass.
pub fn locate<'a>(stream: &'a str, keyword: &str) -> Occurrences<'a> {
    Occurrences { stream, needle: keyword.to_lowercase(), at: 0 }
}

/// Bounded substring around `pos`, clipped to the stream and snapped to char
/// boundaries.
pub fn window(stream: &str, pos: usize, radius: usize) -> &str {
    let start = floor_char_boundary(stream, pos.saturating_sub(radius));
    let end = floor_char_boundary(stream, pos.saturating_add(radius).min(stream.len()));
    &stream[start..end]
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// The cascade rule that produced a candidate, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Range,
    Anchored,
    Generic,
}

/// The window strategy an attempt originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    RawWindow { radius: usize },
    BlockWindow { radius: usize },
    ProximityWindow { radius: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyCandidate {
    pub months: u32,
    pub rule: Rule,
    pub method: Method,
    pub excerpt: String,
}

/// One diagnostic record per window tried. Observational only; never feeds
/// back into resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub method: Method,
    pub excerpt: String,
    pub rule: Option<Rule>,
    pub months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub keyword: String,
    pub chosen: Option<u32>,
    pub candidates: Vec<PenaltyCandidate>,
    pub trace: Vec<Attempt>,
}

static RANGE_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(\d+)\s*(?:a|até|-)\s*(\d+)\s*(anos|ano|meses|m[eê]s)").unwrap()
});

static ANCHORED_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:pena|reclus[aã]o|detenç[aã]o).{0,40}?(\d+)\s*(anos|ano|meses|m[eê]s)").unwrap()
});

static GENERIC_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(anos|ano|meses|m[eê]s)").unwrap()
});

fn months_value(digits: &str, unit: &str) -> Option<u32> {
    let n: u32 = digits.parse().ok()?;
    if unit.starts_with("ano") {
        n.checked_mul(12)
    } else {
        Some(n)
    }
}

/// Ordered pattern cascade over one window. First rule that matches wins;
/// minimization across windows happens at the resolver, not here.
///
/// 1. Range ("N a M anos"): takes the low bound, the statutory floor.
/// 2. Anchored: indicator term within 40 chars of digits + unit.
/// 3. Generic: any digits + unit. Broadest rule, prone to false positives;
///    accepted trade-off of the broadened-search design.
pub fn cascade(win: &str) -> Option<(u32, Rule)> {
    if let Some(c) = RANGE_RULE.captures(win) {
        if let Some(m) = months_value(&c[1], &c[3]) {
            return Some((m, Rule::Range));
        }
    }
    if let Some(c) = ANCHORED_RULE.captures(win) {
        if let Some(m) = months_value(&c[1], &c[2]) {
            return Some((m, Rule::Anchored));
        }
    }
    if let Some(c) = GENERIC_RULE.captures(win) {
        if let Some(m) = months_value(&c[1], &c[2]) {
            return Some((m, Rule::Generic));
        }
    }
    None
}

/// Last-resort span search: keyword, up to 200 chars, indicator term, up to
/// 200 chars. Returns a radius-500 window centered on the span, if any.
pub fn proximity_window<'a>(stream: &'a str, keyword: &str) -> Option<&'a str> {
    let needle = keyword.to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let pat = format!(
        r"(?s){}.{{0,{gap}}}?(?:pena|reclus[aã]o|detenç[aã]o).{{0,{gap}}}",
        regex::escape(&needle),
        gap = PROXIMITY_GAP
    );
    let re = Regex::new(&pat).ok()?;
    let m = re.find(stream)?;
    let mid = m.start() + (m.end() - m.start()) / 2;
    Some(window(stream, mid, PROXIMITY_RADIUS))
}

/// Minimum across all candidate values; nothing when the set is empty.
pub fn resolve(candidates: &[PenaltyCandidate]) -> Option<u32> {
    candidates.iter().map(|c| c.months).min()
}

fn excerpt_of(win: &str) -> String {
    match win.char_indices().nth(EXCERPT_CHARS) {
        Some((i, _)) => win[..i].to_string(),
        None => win.to_string(),
    }
}

fn run_pass(
    stream: &str,
    needle: &str,
    radius: usize,
    method: Method,
    candidates: &mut Vec<PenaltyCandidate>,
    trace: &mut Vec<Attempt>,
) -> bool {
    let mut matched_any = false;
    for pos in locate(stream, needle) {
        let win = window(stream, pos, radius);
        let outcome = cascade(win);
        let excerpt = excerpt_of(win);
        if let Some((months, rule)) = outcome {
            candidates.push(PenaltyCandidate { months, rule, method, excerpt: excerpt.clone() });
            matched_any = true;
        }
        trace.push(Attempt {
            method,
            excerpt,
            rule: outcome.map(|(_, r)| r),
            months: outcome.map(|(m, _)| m),
        });
    }
    matched_any
}

/// Run the full extraction pipeline for one keyword: raw windows (with radius
/// escalation), block windows when the stream exists, then the proximity
/// fallback when everything else came up empty.
pub fn extract_keyword(doc: &Document, keyword: &str) -> ExtractionResult {
    let needle = keyword.to_lowercase();
    let mut candidates: Vec<PenaltyCandidate> = Vec::new();
    let mut trace: Vec<Attempt> = Vec::new();

    let raw = doc.raw_stream();
    let first_pass = run_pass(
        raw,
        &needle,
        RAW_RADIUS,
        Method::RawWindow { radius: RAW_RADIUS },
        &mut candidates,
        &mut trace,
    );
    if !first_pass {
        run_pass(
            raw,
            &needle,
            RAW_RADIUS_WIDE,
            Method::RawWindow { radius: RAW_RADIUS_WIDE },
            &mut candidates,
            &mut trace,
        );
    }

    if let Some(blocks) = doc.block_stream() {
        run_pass(
            blocks,
            &needle,
            BLOCK_RADIUS,
            Method::BlockWindow { radius: BLOCK_RADIUS },
            &mut candidates,
            &mut trace,
        );
    }

    if candidates.is_empty() {
        if let Some(win) = proximity_window(raw, &needle) {
            let method = Method::ProximityWindow { radius: PROXIMITY_RADIUS };
            let outcome = cascade(win);
            let excerpt = excerpt_of(win);
            if let Some((months, rule)) = outcome {
                candidates.push(PenaltyCandidate { months, rule, method, excerpt: excerpt.clone() });
            }
            trace.push(Attempt {
                method,
                excerpt,
                rule: outcome.map(|(_, r)| r),
                months: outcome.map(|(m, _)| m),
            });
        }
    }

    let chosen = resolve(&candidates);
    ExtractionResult { keyword: keyword.to_string(), chosen, candidates, trace }
}

/// Extract penalties for every configured keyword, in input order. Each
/// keyword is processed independently over the immutable snapshot.
pub fn extract_penalties(doc: &Document, keywords: &[String]) -> Vec<ExtractionResult> {
    keywords.iter().map(|kw| extract_keyword(doc, kw)).collect()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SentenceFactors {
    pub judicial_circumstances: u32,
    pub aggravating: u32,
    pub attenuating: u32,
    pub increase_pct: f64,
    pub decrease_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceBreakdown {
    pub minimum_months: u32,
    pub base_months: f64,
    pub intermediate_months: f64,
    pub final_months: f64,
    pub years: u32,
    pub months: u32,
}

/// Three-phase dosimetry over a minimum penalty in months:
/// base, aggravating/attenuating adjustment, percentage increase/decrease.
pub fn compute_sentence(minimum_months: u32, f: &SentenceFactors) -> SentenceBreakdown {
    let base = minimum_months as f64 * (1.0 + f.judicial_circumstances as f64 / 8.0);
    let intermediate =
        base * (1.0 + f.aggravating as f64 / 6.0) * (1.0 - f.attenuating as f64 / 6.0);
    let final_months =
        (intermediate * (1.0 + f.increase_pct / 100.0) * (1.0 - f.decrease_pct / 100.0)).max(0.0);
    SentenceBreakdown {
        minimum_months,
        base_months: base,
        intermediate_months: intermediate,
        final_months,
        years: (final_months / 12.0) as u32,
        months: (final_months % 12.0) as u32,
    }
}
