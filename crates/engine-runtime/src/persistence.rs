//! # Cold-Start Snapshot I/O
//!
//! The core is in-memory by contract; this module is the optional warm
//! restart path. Format: JSON lines, all nodes first, then all edges, one
//! object per line. Loading replays the file through the store's upsert
//! path, so mutation events fire exactly as for live topology ingestion.

use gs_01_graph_store::{GraphError, GraphStore};
use shared_types::{DependencyEdge, InfrastructureNode};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Snapshot save/load failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot line {line} malformed: {detail}")]
    Malformed { line: usize, detail: String },

    #[error("snapshot line {line} rejected by graph: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: GraphError,
    },
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum SnapshotLine {
    Edge(DependencyEdge),
    Node(InfrastructureNode),
}

/// Writes the current graph as JSON lines: nodes, then edges.
///
/// # Errors
///
/// I/O failures only; serialization of in-memory entities cannot fail.
pub fn save_graph(store: &GraphStore, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let snapshot = store.snapshot();
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    for node in snapshot.nodes() {
        let json = serde_json::to_string(node)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    for edge in snapshot.edges() {
        let json = serde_json::to_string(edge)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    writer.flush()?;

    info!(
        path = %path.as_ref().display(),
        nodes = snapshot.node_count(),
        edges = snapshot.edge_count(),
        "Graph snapshot saved"
    );
    Ok(())
}

/// Loads a JSON-lines snapshot into the store via upserts.
///
/// Returns `(nodes, edges)` loaded.
///
/// # Errors
///
/// The first malformed line or graph rejection aborts the load; earlier
/// lines stay applied.
pub fn load_graph(
    store: &GraphStore,
    path: impl AsRef<Path>,
) -> Result<(usize, usize), PersistenceError> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut nodes = 0;
    let mut edges = 0;
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let raw = line?;
        if raw.trim().is_empty() {
            continue;
        }
        let parsed: SnapshotLine =
            serde_json::from_str(&raw).map_err(|e| PersistenceError::Malformed {
                line: line_no,
                detail: e.to_string(),
            })?;
        match parsed {
            SnapshotLine::Node(node) => {
                store
                    .upsert_node(node)
                    .map_err(|source| PersistenceError::Rejected {
                        line: line_no,
                        source,
                    })?;
                nodes += 1;
            }
            SnapshotLine::Edge(edge) => {
                store
                    .upsert_edge(edge)
                    .map_err(|source| PersistenceError::Rejected {
                        line: line_no,
                        source,
                    })?;
                edges += 1;
            }
        }
    }

    info!(
        path = %path.as_ref().display(),
        nodes,
        edges,
        "Graph snapshot loaded"
    );
    Ok((nodes, edges))
}
