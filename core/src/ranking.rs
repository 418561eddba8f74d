use crate::document::Document;
use std::cmp::Ordering;

/// Order candidates best-first and keep at most `limit`.
///
/// Relevance decides first. Documents whose relevance lies within `epsilon` of
/// the first document of their band count as tied and are ordered by rating
/// (higher first), then by id (lower first).
pub fn select_top(mut documents: Vec<Document>, epsilon: f64, limit: usize) -> Vec<Document> {
    documents.sort_by(|lhs, rhs| {
        rhs.relevance
            .total_cmp(&lhs.relevance)
            .then_with(|| by_rating_then_id(lhs, rhs))
    });

    let mut start = 0;
    while start < documents.len() && start < limit {
        let leader = documents[start].relevance;
        let end = documents[start..]
            .iter()
            .position(|doc| (leader - doc.relevance).abs() >= epsilon)
            .map_or(documents.len(), |offset| start + offset);
        documents[start..end].sort_by(by_rating_then_id);
        start = end;
    }

    documents.truncate(limit);
    documents
}

fn by_rating_then_id(lhs: &Document, rhs: &Document) -> Ordering {
    rhs.rating.cmp(&lhs.rating).then_with(|| lhs.id.cmp(&rhs.id))
}
