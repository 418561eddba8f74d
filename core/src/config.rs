use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const RELEVANCE_EPSILON: f64 = 1e-6;
pub const ACCUMULATOR_BUCKET_COUNT: usize = 100;
/// One entry per minute of a day.
pub const REQUEST_HISTORY_CAPACITY: usize = 1440;

/// Tunables for ranking, parallel accumulation and request history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_result_document_count: usize,
    /// Relevance values closer than this are ranked by rating instead.
    pub relevance_epsilon: f64,
    pub accumulator_bucket_count: usize,
    pub request_history_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_result_document_count: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
            accumulator_bucket_count: ACCUMULATOR_BUCKET_COUNT,
            request_history_capacity: REQUEST_HISTORY_CAPACITY,
        }
    }
}

impl SearchConfig {
    /// Parse a JSON document; missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)
            .map_err(|e| SearchError::invalid(format!("bad search config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_result_document_count == 0 {
            return Err(SearchError::invalid("max_result_document_count must be positive"));
        }
        if !(self.relevance_epsilon.is_finite() && self.relevance_epsilon > 0.0) {
            return Err(SearchError::invalid("relevance_epsilon must be a positive number"));
        }
        if self.accumulator_bucket_count == 0 {
            return Err(SearchError::invalid("accumulator_bucket_count must be positive"));
        }
        if self.request_history_capacity == 0 {
            return Err(SearchError::invalid("request_history_capacity must be positive"));
        }
        Ok(())
    }
}
