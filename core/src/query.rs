use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use std::collections::BTreeSet;

/// A parsed query. Terms borrow from the raw query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: BTreeSet<&'a str>,
    pub minus_words: BTreeSet<&'a str>,
}

impl<'a> Query<'a> {
    pub fn is_empty(&self) -> bool {
        self.plus_words.is_empty() && self.minus_words.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
}

fn parse_query_word(text: &str) -> Result<QueryWord<'_>> {
    if text.is_empty() {
        return Err(SearchError::invalid("query word is empty"));
    }
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(SearchError::invalid(format!("query word {text:?} is invalid")));
    }
    Ok(QueryWord { data, is_minus })
}

/// Parse raw query text into plus and minus terms.
///
/// Stop words are dropped from both sets. A term given both ways is kept only
/// as a minus term.
pub fn parse_query<'a>(text: &'a str, stop_words: &StopWords) -> Result<Query<'a>> {
    let mut query = Query::default();
    for token in split_into_words(text) {
        let word = parse_query_word(token)?;
        if stop_words.contains(word.data) {
            continue;
        }
        if word.is_minus {
            query.minus_words.insert(word.data);
        } else {
            query.plus_words.insert(word.data);
        }
    }
    let Query { plus_words, minus_words } = &mut query;
    plus_words.retain(|word| !minus_words.contains(word));
    tracing::trace!(
        plus = query.plus_words.len(),
        minus = query.minus_words.len(),
        "query parsed"
    );
    Ok(query)
}
