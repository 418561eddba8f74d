use crate::document::{Document, DocumentStatus};
use crate::error::Result;
use crate::search::SearchServer;
use crate::DocId;
use std::collections::VecDeque;

/// Sliding window over the most recent search requests, counting the ones that
/// found nothing.
///
/// The window holds `request_history_capacity` entries from the server's
/// config; once full, each new request evicts the oldest.
pub struct RequestQueue<'s> {
    server: &'s SearchServer,
    requests: VecDeque<bool>,
    capacity: usize,
    no_result_requests: usize,
}

impl<'s> RequestQueue<'s> {
    pub fn new(server: &'s SearchServer) -> Self {
        let capacity = server.config().request_history_capacity;
        Self { server, requests: VecDeque::with_capacity(capacity), capacity, no_result_requests: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Active)
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, move |_, document_status, _| document_status == status)
    }

    /// Failed queries are returned to the caller and not recorded.
    pub fn add_find_request_by<F>(&mut self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let found = self.server.find_top_documents_by(raw_query, predicate)?;
        self.record(found.is_empty());
        Ok(found)
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == self.capacity {
            if let Some(true) = self.requests.pop_front() {
                self.no_result_requests -= 1;
            }
        }
        if empty {
            self.no_result_requests += 1;
        }
        self.requests.push_back(empty);
    }
}
