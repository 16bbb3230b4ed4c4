pub mod tables;

use redb::{
    Database, Error as RedbError, ReadableMultimapTable, ReadableTable, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;

    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USERNAMES)?;
        let _ = write_txn.open_table(tables::SESSIONS)?;
        let _ = write_txn.open_table(tables::FRIENDSHIPS)?;
        let _ = write_txn.open_multimap_table(tables::FRIEND_INDEX)?;
        let _ = write_txn.open_table(tables::NOTIFICATIONS)?;
        let _ = write_txn.open_multimap_table(tables::USER_NOTIFICATIONS)?;
        let _ = write_txn.open_table(tables::COLLECTIONS)?;
        let _ = write_txn.open_table(tables::COLLECTION_ITEMS)?;
        let _ = write_txn.open_multimap_table(tables::COLLECTION_ITEM_INDEX)?;
        let _ = write_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;
        let _ = write_txn.open_multimap_table(tables::USER_APPROVALS)?;
        let _ = write_txn.open_table(tables::AUTO_COLLECT_RULES)?;
        let _ = write_txn.open_table(tables::FEEDBACK)?;
        let _ = write_txn.open_table(tables::SEQUENCES)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Serialize a record for storage
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

/// Deserialize a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Load and decode the record stored under `id`, if any
pub fn get_record<T, Table>(table: &Table, id: u64) -> Result<Option<T>>
where
    T: DeserializeOwned,
    Table: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(bytes) => Ok(Some(decode(bytes.value())?)),
        None => Ok(None),
    }
}

/// Collect every value stored under `key` in a multimap index
pub fn index_values<Index>(index: &Index, key: u64) -> Result<Vec<u64>>
where
    Index: ReadableMultimapTable<u64, u64>,
{
    let mut values = Vec::new();
    for value in index.get(key)? {
        values.push(value?.value());
    }
    Ok(values)
}

/// Allocate the next id of a sequence inside the caller's write transaction
pub fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut sequences = txn.open_table(tables::SEQUENCES)?;
    let next = sequences.get(sequence)?.map(|last| last.value()).unwrap_or(0) + 1;
    sequences.insert(sequence, next)?;
    Ok(next)
}
