//! Query evaluation over an [`InvertedIndex`].
//!
//! [`SearchServer`] is the entry point: it owns the index and the ranking
//! configuration, parses raw queries, scores candidates with TF-IDF, filters
//! them, and returns the best few.
//!
//! Scoring runs in four steps:
//! 1. IDF for every plus term present in the index, `ln(N / df)`.
//! 2. Sum of `tf * idf` per document containing at least one plus term.
//! 3. Drop every document containing a minus term.
//! 4. Drop documents rejected by the caller's predicate.
//!
//! With [`ExecutionPolicy::Parallel`] step 2 is spread over plus terms with
//! rayon and lands in a [`ConcurrentMap`]; steps 3 and 4 always run on a
//! snapshot, sequentially.

use crate::concurrent_map::ConcurrentMap;
use crate::config::SearchConfig;
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::{InvertedIndex, WordFrequencies};
use crate::query::{parse_query, Query};
use crate::ranking::select_top;
use crate::tokenizer::StopWords;
use crate::{DocId, ExecutionPolicy};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Terms of a query found in one document, plus that document's status.
pub type MatchResult<'q> = (Vec<&'q str>, DocumentStatus);

#[derive(Debug, Clone, Default)]
pub struct SearchServer {
    index: InvertedIndex,
    config: SearchConfig,
}

impl SearchServer {
    /// Create a server from space separated stop words.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Ok(Self::from_index(InvertedIndex::new(StopWords::from_text(stop_words_text)?)))
    }

    pub fn from_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::from_index(InvertedIndex::new(StopWords::new(stop_words)?)))
    }

    fn from_index(index: InvertedIndex) -> Self {
        Self { index, config: SearchConfig::default() }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn add_document(
        &mut self,
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        self.index.add_document(id, text, status, ratings)
    }

    pub fn remove_document(&mut self, id: DocId) {
        self.index.remove_document(id);
    }

    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, id: DocId) {
        self.index.remove_document_with(policy, id);
    }

    pub fn word_frequencies(&self, id: DocId) -> &WordFrequencies {
        self.index.word_frequencies(id)
    }

    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.index.iter()
    }

    /// Best matches among [`DocumentStatus::Active`] documents.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Active)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn find_top_documents_by<F>(&self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_with<F>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: F,
    ) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let query = parse_query(raw_query, self.index.stop_words())?;
        let candidates = self.find_all_documents(policy, &query, predicate)?;
        let found = candidates.len();
        let top = select_top(
            candidates,
            self.config.relevance_epsilon,
            self.config.max_result_document_count,
        );
        tracing::trace!(?policy, found, returned = top.len(), "query evaluated");
        Ok(top)
    }

    /// Every document that matches `query` and passes `predicate`, unranked.
    pub fn find_all_documents<F>(
        &self,
        policy: ExecutionPolicy,
        query: &Query<'_>,
        predicate: F,
    ) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let relevance = match policy {
            ExecutionPolicy::Sequential => self.accumulate_sequential(query),
            ExecutionPolicy::Parallel => self.accumulate_parallel(query)?,
        };
        Ok(self.filter_candidates(relevance, query, predicate))
    }

    fn accumulate_sequential(&self, query: &Query<'_>) -> BTreeMap<DocId, f64> {
        let mut relevance = BTreeMap::new();
        for word in &query.plus_words {
            let (Some(postings), Some(idf)) =
                (self.index.postings(word), self.index.inverse_document_freq(word))
            else {
                continue;
            };
            for (&id, &tf) in postings {
                *relevance.entry(id).or_insert(0.0) += tf * idf;
            }
        }
        relevance
    }

    fn accumulate_parallel(&self, query: &Query<'_>) -> Result<BTreeMap<DocId, f64>> {
        let relevance = ConcurrentMap::<DocId, f64>::new(self.config.accumulator_bucket_count)?;
        query.plus_words.par_iter().for_each(|word| {
            let (Some(postings), Some(idf)) =
                (self.index.postings(word), self.index.inverse_document_freq(word))
            else {
                return;
            };
            for (&id, &tf) in postings {
                *relevance.access(id) += tf * idf;
            }
        });
        Ok(relevance.build_ordinary_map())
    }

    fn filter_candidates<F>(
        &self,
        mut relevance: BTreeMap<DocId, f64>,
        query: &Query<'_>,
        predicate: F,
    ) -> Vec<Document>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        for word in &query.minus_words {
            if let Some(postings) = self.index.postings(word) {
                for id in postings.keys() {
                    relevance.remove(id);
                }
            }
        }

        relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                let data = self.index.document_data(id)?;
                predicate(id, data.status, data.rating).then_some(Document {
                    id,
                    relevance,
                    rating: data.rating,
                    status: data.status,
                })
            })
            .collect()
    }

    /// Plus terms of `raw_query` present in document `id`, sorted.
    ///
    /// Empty when the document contains any minus term.
    pub fn match_document<'q>(&self, raw_query: &'q str, id: DocId) -> Result<MatchResult<'q>> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, id)
    }

    pub fn match_document_with<'q>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &'q str,
        id: DocId,
    ) -> Result<MatchResult<'q>> {
        let data = self.index.document_data(id).ok_or(SearchError::OutOfRange(id))?;
        let query = parse_query(raw_query, self.index.stop_words())?;
        let contains = |word: &&str| self.index.contains_word(id, word);

        let matched = match policy {
            ExecutionPolicy::Sequential => {
                if query.minus_words.iter().any(contains) {
                    Vec::new()
                } else {
                    query.plus_words.iter().copied().filter(contains).collect()
                }
            }
            ExecutionPolicy::Parallel => {
                if query.minus_words.par_iter().any(contains) {
                    Vec::new()
                } else {
                    let mut words: Vec<&str> =
                        query.plus_words.par_iter().copied().filter(contains).collect();
                    words.par_sort_unstable();
                    words.dedup();
                    words
                }
            }
        };
        Ok((matched, data.status))
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = <&'a InvertedIndex as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.index.iter()
    }
}
