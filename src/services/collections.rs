use chrono::Utc;

use crate::constants::ERR_EMPTY_NAME;
use crate::db::{self, get_record, index_values, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{Collection, CollectionItem, CollectionItemRecord, CollectionRecord};

/// Collections and their items
pub struct CollectionService {
    db: Db,
}

impl CollectionService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: u64,
        name: String,
        image: Option<String>,
    ) -> Result<Collection> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidParameters(ERR_EMPTY_NAME.to_string()));
        }

        let db = self.db.clone();

        let collection = tokio::task::spawn_blocking(move || -> Result<Collection> {
            let record = CollectionRecord {
                user_id,
                name,
                image,
                created_at: Utc::now().timestamp(),
            };

            let write_txn = db.begin_write()?;
            let id = db::next_id(&write_txn, "collections")?;
            {
                let mut collections = write_txn.open_table(tables::COLLECTIONS)?;
                let bytes = db::encode(&record)?;
                collections.insert(id, bytes.as_slice())?;
            }
            write_txn.commit()?;

            Ok(Collection::from_record(id, &record))
        })
        .await??;

        tracing::info!("Collection {} created by user {}", collection.id, user_id);

        Ok(collection)
    }

    /// Items of a collection owned by `user_id`
    pub async fn items(&self, user_id: u64, collection_id: u64) -> Result<Vec<CollectionItem>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<CollectionItem>> {
            let read_txn = db.begin_read()?;
            let collections = read_txn.open_table(tables::COLLECTIONS)?;

            match get_record::<CollectionRecord, _>(&collections, collection_id)? {
                Some(collection) if collection.user_id == user_id => {}
                _ => return Err(AppError::NotFound),
            }

            let index = read_txn.open_multimap_table(tables::COLLECTION_ITEM_INDEX)?;
            let items = read_txn.open_table(tables::COLLECTION_ITEMS)?;

            let mut result = Vec::new();
            for id in index_values(&index, collection_id)? {
                if let Some(record) = get_record::<CollectionItemRecord, _>(&items, id)? {
                    result.push(CollectionItem::from_record(id, &record));
                }
            }
            Ok(result)
        })
        .await?
    }
}
