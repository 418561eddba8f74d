use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docsearch_core::{
    process_queries, process_queries_joined, remove_duplicates, DocId, Document, DocumentStatus,
    ExecutionPolicy, RequestQueue, SearchConfig, SearchServer,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One document as read from JSON / JSONL input.
#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Load documents into an in-memory TF-IDF index and query it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Input path: a JSON/JSONL file, a directory of them, or `-` for JSONL on stdin
    #[arg(long)]
    pub input: String,
    /// Space separated stop words
    #[arg(long, default_value = "")]
    pub stop_words: String,
    /// JSON file with search settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run queries one by one and print the top documents for each
    Search {
        #[command(flatten)]
        source: SourceArgs,
        /// Only return documents with this status
        #[arg(long, default_value = "active")]
        status: DocumentStatus,
        /// Score each query on the rayon thread pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Remove duplicate documents before searching
        #[arg(long, default_value_t = false)]
        dedup: bool,
        queries: Vec<String>,
    },
    /// Run all queries concurrently against active documents
    Batch {
        #[command(flatten)]
        source: SourceArgs,
        /// Print one flat list instead of one list per query
        #[arg(long, default_value_t = false)]
        joined: bool,
        queries: Vec<String>,
    },
    /// Show which query terms a document contains
    Match {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        id: DocId,
        #[arg(long, default_value_t = false)]
        parallel: bool,
        query: String,
    },
    /// Remove duplicate documents and print the ids that were dropped
    Dedup {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    results: &'a [Document],
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    id: DocId,
    status: DocumentStatus,
    words: &'a [&'a str],
}

#[derive(Serialize)]
struct DedupOutput<'a> {
    removed: &'a [DocId],
    remaining: usize,
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.command {
        Commands::Search { source, status, parallel, dedup, queries } => {
            let mut server = load_server(&source)?;
            if dedup {
                let removed = remove_duplicates(&mut server);
                tracing::info!(removed = removed.len(), "duplicates removed");
            }
            let policy = if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };
            search(&server, policy, status, &queries, out)
        }
        Commands::Batch { source, joined, queries } => {
            let server = load_server(&source)?;
            if joined {
                let results = process_queries_joined(&server, &queries[..])?;
                serde_json::to_writer(&mut *out, &results)?;
                writeln!(out)?;
            } else {
                for (query, results) in queries.iter().zip(process_queries(&server, &queries[..])?) {
                    write_json_line(out, &QueryOutput { query, results: &results })?;
                }
            }
            Ok(())
        }
        Commands::Match { source, id, parallel, query } => {
            let server = load_server(&source)?;
            let policy = if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };
            let (words, status) = server
                .match_document_with(policy, &query, id)
                .with_context(|| format!("matching document {id}"))?;
            write_json_line(out, &MatchOutput { id, status, words: &words })
        }
        Commands::Dedup { source } => {
            let mut server = load_server(&source)?;
            let removed = remove_duplicates(&mut server);
            write_json_line(out, &DedupOutput { removed: &removed, remaining: server.document_count() })
        }
    }
}

fn search<W: Write>(
    server: &SearchServer,
    policy: ExecutionPolicy,
    status: DocumentStatus,
    queries: &[String],
    out: &mut W,
) -> Result<()> {
    match policy {
        ExecutionPolicy::Sequential => {
            let mut queue = RequestQueue::new(server);
            for query in queries {
                let results = queue
                    .add_find_request_by_status(query, status)
                    .with_context(|| format!("query {query:?}"))?;
                write_json_line(out, &QueryOutput { query, results: &results })?;
            }
            tracing::info!(
                queries = queries.len(),
                no_result = queue.no_result_requests(),
                "search finished"
            );
        }
        ExecutionPolicy::Parallel => {
            for query in queries {
                let results = server
                    .find_top_documents_with(policy, query, |_, document_status, _| document_status == status)
                    .with_context(|| format!("query {query:?}"))?;
                write_json_line(out, &QueryOutput { query, results: &results })?;
            }
            tracing::info!(queries = queries.len(), "search finished");
        }
    }
    Ok(())
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Build a server from the source arguments: stop words, optional config, documents.
pub fn load_server(source: &SourceArgs) -> Result<SearchServer> {
    let mut server = SearchServer::new(&source.stop_words).context("invalid stop words")?;
    if let Some(path) = &source.config {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        server = server.with_config(SearchConfig::from_json(&json)?)?;
    }

    let docs = read_documents(&source.input)?;
    let mut rejected = 0usize;
    for doc in docs {
        if let Err(err) = server.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
            tracing::warn!(doc_id = doc.id, %err, "document skipped");
            rejected += 1;
        }
    }
    tracing::info!(num_docs = server.document_count(), rejected, "documents loaded");
    Ok(server)
}

/// Read documents from `-` (JSONL on stdin), a file, or a directory tree.
pub fn read_documents(input: &str) -> Result<Vec<InputDoc>> {
    if input == "-" {
        return read_jsonl(io::stdin().lock());
    }

    let mut docs = Vec::new();
    for file in collect_input_files(Path::new(input)) {
        let is_jsonl = file.extension().and_then(|s| s.to_str()) == Some("jsonl");
        let f = File::open(&file).with_context(|| format!("opening {}", file.display()))?;
        let reader = BufReader::new(f);
        let mut batch = if is_jsonl {
            read_jsonl(reader)
        } else {
            read_json(reader)
        }
        .with_context(|| format!("parsing {}", file.display()))?;
        docs.append(&mut batch);
    }
    Ok(docs)
}

/// Files to ingest, in a stable order. Directories contribute their `.json` and `.jsonl` files.
pub fn collect_input_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    }
    files
}

fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc =
            serde_json::from_str(&line).with_context(|| format!("line {}", line_no + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json<R: io::Read>(reader: R) -> Result<Vec<InputDoc>> {
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<InputDoc>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(docs)
}
