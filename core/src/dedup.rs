use crate::search::SearchServer;
use crate::DocId;
use std::collections::BTreeSet;

/// Remove every document whose set of terms repeats an earlier document's.
///
/// Documents are visited in ascending id order, so the lowest id of each group
/// survives. Term frequencies and word order are ignored. Returns the removed ids,
/// ascending.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocId> {
    let mut seen: BTreeSet<Vec<&str>> = BTreeSet::new();
    let mut duplicates = Vec::new();

    for id in server.iter() {
        let words: Vec<&str> = server.word_frequencies(id).keys().map(String::as_str).collect();
        if !seen.insert(words) {
            tracing::info!(doc_id = id, "found duplicate document");
            duplicates.push(id);
        }
    }
    drop(seen);

    for &id in &duplicates {
        server.remove_document(id);
    }
    duplicates
}
