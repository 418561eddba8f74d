use crate::document::Document;
use crate::error::Result;
use crate::search::SearchServer;
use rayon::prelude::*;

/// Run every query against the server in parallel; results keep the query order.
///
/// Each query only reads the index, so no locking is involved. If any query is
/// malformed the whole batch fails with that query's error.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect()
}

/// Like [`process_queries`], flattened into one sequence in query order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    fn server() -> SearchServer {
        let mut server = SearchServer::new("and with").unwrap();
        let texts = [
            "funny pet and nasty rat",
            "funny pet with curly hair",
            "funny pet and not very nasty rat",
            "pet with rat and rat and rat",
            "nasty rat with curly hair",
        ];
        for (id, text) in texts.into_iter().enumerate() {
            server.add_document(id as i32 + 1, text, DocumentStatus::Active, &[1, 2]).unwrap();
        }
        server
    }

    #[test]
    fn results_follow_query_order() {
        let server = server();
        let queries = ["nasty rat -not", "not very funny nasty pet", "curly hair"];
        let results = process_queries(&server, &queries).unwrap();
        assert_eq!(results.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 5, 2]);
        for (query, result) in queries.iter().zip(&results) {
            assert_eq!(result, &server.find_top_documents(query).unwrap());
        }

        let joined = process_queries_joined(&server, &queries).unwrap();
        assert_eq!(joined.len(), 10);
        assert_eq!(joined, results.concat());
    }

    #[test]
    fn empty_batch() {
        let server = server();
        let queries: [&str; 0] = [];
        assert!(process_queries(&server, &queries).unwrap().is_empty());
    }

    #[test]
    fn malformed_query_fails_batch() {
        let server = server();
        assert!(process_queries(&server, &["rat", "--rat"]).is_err());
    }
}
