use crate::document::{average_rating, DocumentData, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use crate::{DocId, ExecutionPolicy};
use rayon::prelude::*;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::iter::Copied;

/// Term -> term frequency within one document.
pub type WordFrequencies = BTreeMap<String, f64>;
/// Document -> term frequency, for one term.
pub type PostingList = BTreeMap<DocId, f64>;

static EMPTY_FREQUENCIES: WordFrequencies = BTreeMap::new();

/// The inverted index and document store.
///
/// `word_to_document_freqs` and `document_to_word_freqs` are two views of the
/// same data: a document appears in a term's posting list exactly when the term
/// appears in that document's frequency map. Every mutation keeps both in step.
/// There is no internal locking; mutation goes through `&mut self`.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    stop_words: StopWords,
    word_to_document_freqs: BTreeMap<String, PostingList>,
    document_to_word_freqs: BTreeMap<DocId, WordFrequencies>,
    documents: BTreeMap<DocId, DocumentData>,
    document_ids: BTreeSet<DocId>,
}

impl InvertedIndex {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words, ..Self::default() }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Index a document. Either the whole document goes in or nothing changes.
    pub fn add_document(
        &mut self,
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if id < 0 {
            return Err(SearchError::invalid(format!("document id {id} is negative")));
        }
        if self.documents.contains_key(&id) {
            return Err(SearchError::invalid(format!("document id {id} is already indexed")));
        }

        // validate everything before the first write
        let words = self.split_into_words_no_stop(text)?;

        let mut word_freqs = WordFrequencies::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for word in &words {
                *word_freqs.entry((*word).to_string()).or_insert(0.0) += inv_word_count;
            }
        }
        for (word, tf) in &word_freqs {
            self.word_to_document_freqs.entry(word.clone()).or_default().insert(id, *tf);
        }

        tracing::debug!(doc_id = id, terms = word_freqs.len(), %status, "document added");
        self.document_to_word_freqs.insert(id, word_freqs);
        self.documents.insert(id, DocumentData { rating: average_rating(ratings), status });
        self.document_ids.insert(id);
        Ok(())
    }

    /// Remove a document and every posting that references it. Unknown ids are ignored.
    pub fn remove_document(&mut self, id: DocId) {
        self.remove_document_with(ExecutionPolicy::Sequential, id);
    }

    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, id: DocId) {
        let Some(word_freqs) = self.document_to_word_freqs.remove(&id) else {
            return;
        };

        match policy {
            ExecutionPolicy::Sequential => {
                for word in word_freqs.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                        postings.remove(&id);
                        if postings.is_empty() {
                            self.word_to_document_freqs.remove(word);
                        }
                    }
                }
            }
            ExecutionPolicy::Parallel => {
                // detach the affected lists so each worker owns the one it edits
                let mut detached: Vec<(String, PostingList)> = word_freqs
                    .keys()
                    .filter_map(|word| self.word_to_document_freqs.remove_entry(word.as_str()))
                    .collect();
                detached.par_iter_mut().for_each(|(_, postings)| {
                    postings.remove(&id);
                });
                self.word_to_document_freqs
                    .extend(detached.into_iter().filter(|(_, postings)| !postings.is_empty()));
            }
        }

        self.documents.remove(&id);
        self.document_ids.remove(&id);
        tracing::debug!(doc_id = id, terms = word_freqs.len(), "document removed");
    }

    /// Frequencies of the document's terms; empty for an unknown id.
    pub fn word_frequencies(&self, id: DocId) -> &WordFrequencies {
        self.document_to_word_freqs.get(&id).unwrap_or(&EMPTY_FREQUENCIES)
    }

    pub fn document_count(&self) -> usize {
        self.document_ids.len()
    }

    pub fn contains_document(&self, id: DocId) -> bool {
        self.document_ids.contains(&id)
    }

    /// Live document ids in ascending order.
    pub fn iter(&self) -> Copied<btree_set::Iter<'_, DocId>> {
        self.document_ids.iter().copied()
    }

    pub fn document_data(&self, id: DocId) -> Option<DocumentData> {
        self.documents.get(&id).copied()
    }

    pub fn postings(&self, word: &str) -> Option<&PostingList> {
        self.word_to_document_freqs.get(word)
    }

    pub fn contains_word(&self, id: DocId, word: &str) -> bool {
        self.document_to_word_freqs
            .get(&id)
            .is_some_and(|freqs| freqs.contains_key(word))
    }

    /// ln(N / df). `None` when no live document contains the term.
    pub fn inverse_document_freq(&self, word: &str) -> Option<f64> {
        self.postings(word)
            .map(|postings| (self.document_count() as f64 / postings.len() as f64).ln())
    }

    fn split_into_words_no_stop<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::invalid(format!("word {word:?} contains a control character")));
            }
            if !self.is_stop_word(word) {
                words.push(word);
            }
        }
        Ok(words)
    }
}

impl<'a> IntoIterator for &'a InvertedIndex {
    type Item = DocId;
    type IntoIter = Copied<btree_set::Iter<'a, DocId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index_with(stop: &str) -> InvertedIndex {
        InvertedIndex::new(StopWords::from_text(stop).unwrap())
    }

    fn assert_consistent(index: &InvertedIndex) {
        for (word, postings) in &index.word_to_document_freqs {
            assert!(!postings.is_empty(), "empty posting list left for {word}");
            for (id, tf) in postings {
                assert_eq!(index.document_to_word_freqs[id].get(word), Some(tf));
            }
        }
        for (id, freqs) in &index.document_to_word_freqs {
            assert!(index.document_ids.contains(id));
            assert!(index.documents.contains_key(id));
            for word in freqs.keys() {
                assert!(index.word_to_document_freqs[word].contains_key(id));
            }
        }
        assert_eq!(index.documents.len(), index.document_ids.len());
        assert_eq!(index.document_to_word_freqs.len(), index.document_ids.len());
    }

    #[test]
    fn add_builds_both_views() {
        let mut index = index_with("in the");
        index.add_document(42, "cat in the city city", DocumentStatus::Active, &[1, 2, 3]).unwrap();

        let freqs = index.word_frequencies(42);
        assert_eq!(freqs.len(), 2);
        assert!((freqs["cat"] - 1.0 / 3.0).abs() < 1e-9);
        assert!((freqs["city"] - 2.0 / 3.0).abs() < 1e-9);
        assert!(index.postings("in").is_none());
        assert_eq!(index.document_data(42).unwrap().rating, 2);
        assert_consistent(&index);
    }

    #[test]
    fn rejects_bad_ids_without_side_effects() {
        let mut index = index_with("");
        index.add_document(1, "cat", DocumentStatus::Active, &[]).unwrap();

        let err = index.add_document(-1, "dog", DocumentStatus::Active, &[]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
        assert!(index.add_document(1, "dog", DocumentStatus::Active, &[]).is_err());

        assert_eq!(index.document_count(), 1);
        assert!(index.postings("dog").is_none());
    }

    #[test]
    fn control_character_rejects_whole_document() {
        let mut index = index_with("");
        let err = index
            .add_document(3, "big dog sk\x12ylark", DocumentStatus::Active, &[1])
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
        assert_eq!(index.document_count(), 0);
        assert!(index.postings("big").is_none());
        assert!(index.word_frequencies(3).is_empty());
    }

    #[test]
    fn stop_word_only_document_has_no_terms() {
        let mut index = index_with("in the");
        index.add_document(5, "in the", DocumentStatus::Active, &[]).unwrap();
        assert_eq!(index.document_count(), 1);
        assert!(index.word_frequencies(5).is_empty());
        assert!(index.postings("in").is_none());
    }

    #[test]
    fn remove_leaves_no_dangling_postings() {
        for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
            let mut index = index_with("");
            index.add_document(1, "funny pet and nasty rat", DocumentStatus::Active, &[7]).unwrap();
            index.add_document(2, "funny pet with curly hair", DocumentStatus::Active, &[1]).unwrap();

            index.remove_document_with(policy, 1);

            assert!(index.word_frequencies(1).is_empty());
            assert!(index.postings("rat").is_none());
            assert_eq!(index.postings("funny").unwrap().len(), 1);
            assert_eq!(index.iter().collect::<Vec<_>>(), vec![2]);
            assert_consistent(&index);
        }
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut index = index_with("");
        index.add_document(1, "cat", DocumentStatus::Active, &[]).unwrap();
        index.remove_document(99);
        index.remove_document_with(ExecutionPolicy::Parallel, -4);
        assert_eq!(index.document_count(), 1);
        assert_consistent(&index);
    }

    #[test]
    fn iterates_ids_ascending() {
        let mut index = index_with("");
        for id in [9, 3, 7] {
            index.add_document(id, "x", DocumentStatus::Active, &[]).unwrap();
        }
        assert_eq!((&index).into_iter().collect::<Vec<_>>(), vec![3, 7, 9]);
    }

    #[test]
    fn idf_uses_live_documents() {
        let mut index = index_with("");
        index.add_document(1, "cat", DocumentStatus::Active, &[]).unwrap();
        index.add_document(2, "dog", DocumentStatus::Active, &[]).unwrap();
        assert!((index.inverse_document_freq("cat").unwrap() - 2f64.ln()).abs() < 1e-12);
        assert!(index.inverse_document_freq("bird").is_none());
    }

    fn word() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d", "e", "the"]).prop_map(String::from)
    }

    proptest! {
        #[test]
        fn frequencies_sum_to_one_and_views_agree(
            docs in prop::collection::vec(prop::collection::vec(word(), 0..8), 1..12),
            removals in prop::collection::vec(0i32..12, 0..6),
            parallel in any::<bool>(),
        ) {
            let mut index = index_with("the");
            for (id, words) in docs.iter().enumerate() {
                index.add_document(id as DocId, &words.join(" "), DocumentStatus::Active, &[]).unwrap();
            }
            for id in &index.document_ids {
                let freqs = index.word_frequencies(*id);
                if !freqs.is_empty() {
                    let sum: f64 = freqs.values().sum();
                    prop_assert!((sum - 1.0).abs() < 1e-6);
                }
            }
            let policy = if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };
            for id in removals {
                index.remove_document_with(policy, id);
                prop_assert!(index.word_frequencies(id).is_empty());
            }
            assert_consistent(&index);
        }
    }
}
