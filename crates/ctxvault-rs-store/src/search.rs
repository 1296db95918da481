//! Tag filtering and ranked full-text search over a fresh `list()` snapshot.
//!
//! No index is kept. Each query reads the whole store, so results reflect
//! whatever mix of states concurrent writers left at read time.

use crate::error::StoreError;
use crate::store::RecordStore;
use ctxvault_rs_protocol::ContextRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Score added per query token found in the title.
pub const TITLE_WEIGHT: u32 = 10;
/// Score added per query token found in the content.
pub const CONTENT_WEIGHT: u32 = 1;
/// Result cap when a query does not set one.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Tag filter with pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagQuery {
    /// Any-match tag set. `None` keeps every record; `Some(vec![])` shares no
    /// tag with any record and so matches nothing.
    pub tags: Option<Vec<String>>,
    /// Page size; `None` uses the searcher default.
    pub limit: Option<usize>,
    /// Records to skip before the page starts.
    pub offset: usize,
}

impl TagQuery {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records sharing at least one of `tags`.
    pub fn any_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn matches(&self, record: &ContextRecord) -> bool {
        match &self.tags {
            None => true,
            Some(wanted) => record.tags.iter().any(|tag| wanted.contains(tag)),
        }
    }
}

/// Record field that full-text search can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Title,
    Content,
}

/// Options for `RecordSearcher::search_full_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullTextOptions {
    /// Result cap; `None` uses the searcher default.
    pub limit: Option<usize>,
    /// Fields to score; empty means both.
    pub fields: Vec<SearchField>,
}

impl FullTextOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_fields(mut self, fields: impl Into<Vec<SearchField>>) -> Self {
        self.fields = fields.into();
        self
    }

    fn includes(&self, field: SearchField) -> bool {
        self.fields.is_empty() || self.fields.contains(&field)
    }
}

/// A full-text hit and its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: ContextRecord,
    pub score: u32,
}

/// Query front end over a `RecordStore`.
#[derive(Clone)]
pub struct RecordSearcher {
    store: Arc<dyn RecordStore>,
    default_limit: usize,
}

impl RecordSearcher {
    /// Searcher with the stock result cap.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_default_limit(store, DEFAULT_SEARCH_LIMIT)
    }

    pub fn with_default_limit(store: Arc<dyn RecordStore>, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Filter by tags (any-match), then slice `[offset, offset + limit)`.
    pub fn search(&self, query: &TagQuery) -> Result<Vec<ContextRecord>, StoreError> {
        let limit = query.limit.unwrap_or(self.default_limit);
        let records: Vec<ContextRecord> = self
            .store
            .list()?
            .into_iter()
            .filter(|record| query.matches(record))
            .skip(query.offset)
            .take(limit)
            .collect();
        debug!(
            "tag search (tags={:?}, offset={}, limit={limit}, returned={})",
            query.tags,
            query.offset,
            records.len()
        );
        Ok(records)
    }

    /// Rank records against whitespace-separated `query` terms.
    ///
    /// A blank query returns nothing without touching the store.
    pub fn search_full_text(
        &self,
        query: &str,
        options: &FullTextOptions,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let limit = options.limit.unwrap_or(self.default_limit);
        let mut hits: Vec<ScoredRecord> = self
            .store
            .list()?
            .into_iter()
            .filter_map(|record| {
                let score = score_record(&record, &tokens, options);
                (score > 0).then_some(ScoredRecord { record, score })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.record.title.cmp(&b.record.title))
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        hits.truncate(limit);
        debug!(
            "full-text search (tokens={}, limit={limit}, returned={})",
            tokens.len(),
            hits.len()
        );
        Ok(hits)
    }
}

/// Lowercased whitespace-separated terms. Repeats are kept and each counts.
fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

fn score_record(record: &ContextRecord, tokens: &[String], options: &FullTextOptions) -> u32 {
    let title = options
        .includes(SearchField::Title)
        .then(|| record.title.to_lowercase());
    let content = options
        .includes(SearchField::Content)
        .then(|| record.content.to_lowercase());
    tokens
        .iter()
        .map(|token| {
            let mut score = 0;
            if title.as_deref().is_some_and(|title| title.contains(token.as_str())) {
                score += TITLE_WEIGHT;
            }
            if content
                .as_deref()
                .is_some_and(|content| content.contains(token.as_str()))
            {
                score += CONTENT_WEIGHT;
            }
            score
        })
        .sum()
}
