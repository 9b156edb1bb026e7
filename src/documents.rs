//! Sharded document store — deterministic shard addressing and blob
//! retrieval.
//!
//! Binary documents live outside the main store, partitioned across
//! shard files of 5000 ids each. The shard index is 1-based:
//! ids 0..4999 → shard 1, 5000..9999 → shard 2, and so on. The
//! addressing formula is load-bearing for existing data and must not
//! change.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::db::StoreError;

/// Number of document ids per shard file.
pub const SHARD_WIDTH: i64 = 5000;

/// 1-based shard index for a document id.
pub fn shard_index(document_id: i64) -> i64 {
    document_id / SHARD_WIDTH + 1
}

/// Path of the shard file holding `document_id`.
pub fn shard_path(base_dir: &Path, document_id: i64) -> PathBuf {
    base_dir.join(format!("clinic_blob{}.db", shard_index(document_id)))
}

/// Fetch a document's bytes from its shard.
///
/// The shard is opened read-only per call and dropped on return; a
/// missing shard file is a store failure, a missing row inside an
/// existing shard is a not-found.
pub fn fetch_document(base_dir: &Path, document_id: i64) -> Result<Vec<u8>, StoreError> {
    let path = shard_path(base_dir, document_id);
    if !path.exists() {
        return Err(StoreError::ShardUnavailable(path.display().to_string()));
    }

    let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let result = conn.query_row(
        "SELECT content FROM documents WHERE id = ?1",
        params![document_id],
        |row| row.get::<_, Vec<u8>>(0),
    );

    match result {
        Ok(bytes) => Ok(bytes),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound {
            entity: "document".into(),
            id: document_id,
        }),
        Err(e) => Err(e.into()),
    }
}
