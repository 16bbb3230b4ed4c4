//! Auto-collect approvals
//!
//! An ingestion collaborator proposes filing an upload into a collection;
//! the owner later approves (the upload becomes a collection item) or denies.
//! Either way the approval record is gone afterwards.

use std::sync::Arc;

use chrono::Utc;
use redb::ReadableTable;

use crate::cache::Cache;
use crate::constants::{auto_collects_key, ERR_EMPTY_NAME, ERR_INVALID_ACTION};
use crate::db::{self, get_record, index_values, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{
    ApprovalAction, AutoCollectApproval, AutoCollectApprovalRecord, AutoCollectRule,
    AutoCollectRuleRecord, Collection, CollectionItemRecord, CollectionRecord,
    NewAutoCollectRule, PendingApproval,
};

pub struct AutoCollectWorkflow {
    db: Db,
    cache: Arc<dyn Cache>,
}

impl AutoCollectWorkflow {
    pub fn new(db: Db, cache: Arc<dyn Cache>) -> Self {
        Self { db, cache }
    }

    /// Record a pending proposal to add `upload_id` to `collection_id`
    pub async fn propose(
        &self,
        user_id: u64,
        collection_id: u64,
        upload_id: u64,
        rule_id: Option<u64>,
    ) -> Result<AutoCollectApproval> {
        let db = self.db.clone();

        let approval = tokio::task::spawn_blocking(move || -> Result<AutoCollectApproval> {
            let record = AutoCollectApprovalRecord {
                user_id,
                collection_id,
                upload_id,
                rule_id,
                created_at: Utc::now().timestamp(),
            };

            let write_txn = db.begin_write()?;
            {
                let collections = write_txn.open_table(tables::COLLECTIONS)?;
                match get_record::<CollectionRecord, _>(&collections, collection_id)? {
                    Some(collection) if collection.user_id == user_id => {}
                    _ => {
                        tracing::warn!(
                            "Rejected proposal for user {} into collection {}",
                            user_id,
                            collection_id
                        );
                        return Err(AppError::NotFound);
                    }
                }
            }

            let id = db::next_id(&write_txn, "auto_collect_approvals")?;
            {
                let mut approvals = write_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;
                let bytes = db::encode(&record)?;
                approvals.insert(id, bytes.as_slice())?;

                let mut index = write_txn.open_multimap_table(tables::USER_APPROVALS)?;
                index.insert(user_id, id)?;
            }
            write_txn.commit()?;

            Ok(AutoCollectApproval::from_record(id, &record))
        })
        .await??;

        tracing::info!(
            "Auto-collect approval {} proposed: upload {} -> collection {}",
            approval.id,
            upload_id,
            collection_id
        );

        Ok(approval)
    }

    /// Load an approval owned by `user_id`
    pub async fn find(&self, user_id: u64, approval_id: u64) -> Result<AutoCollectApproval> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<AutoCollectApproval> {
            let read_txn = db.begin_read()?;
            let approvals = read_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;

            match get_record::<AutoCollectApprovalRecord, _>(&approvals, approval_id)? {
                Some(record) if record.user_id == user_id => {
                    Ok(AutoCollectApproval::from_record(approval_id, &record))
                }
                _ => Err(AppError::NotFound),
            }
        })
        .await?
    }

    /// Resolve an approval with `approve` or `deny`
    ///
    /// Approving creates the collection item before the approval is
    /// destroyed, in the same transaction; an approval that was already
    /// resolved is `NotFound` and creates nothing. Denying is idempotent.
    pub async fn act(
        &self,
        user_id: u64,
        approval: &AutoCollectApproval,
        action: &str,
    ) -> Result<bool> {
        let action = ApprovalAction::parse(action)
            .ok_or_else(|| AppError::InvalidParameters(ERR_INVALID_ACTION.to_string()))?;

        let db = self.db.clone();
        let approval = approval.clone();
        let approval_id = approval.id;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;

            if action == ApprovalAction::Approve {
                {
                    let approvals = write_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;
                    if approvals.get(approval.id)?.is_none() {
                        tracing::warn!("Approval {} was already resolved", approval.id);
                        return Err(AppError::NotFound);
                    }
                }

                let item = CollectionItemRecord {
                    collection_id: approval.collection_id,
                    attachment_id: approval.upload_id,
                    user_id,
                    created_at: Utc::now().timestamp(),
                };
                let item_id = db::next_id(&write_txn, "collection_items")?;
                let mut items = write_txn.open_table(tables::COLLECTION_ITEMS)?;
                let bytes = db::encode(&item)?;
                items.insert(item_id, bytes.as_slice())?;

                let mut item_index = write_txn.open_multimap_table(tables::COLLECTION_ITEM_INDEX)?;
                item_index.insert(approval.collection_id, item_id)?;
            }

            {
                let mut approvals = write_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;
                approvals.remove(approval.id)?;

                let mut index = write_txn.open_multimap_table(tables::USER_APPROVALS)?;
                index.remove(approval.user_id, approval.id)?;
            }
            write_txn.commit()?;

            Ok(())
        })
        .await??;

        tracing::info!(
            "Auto-collect approval {} resolved by user {}: {:?}",
            approval_id,
            user_id,
            action
        );

        Ok(true)
    }

    /// Pending approvals of a user joined with their collections
    ///
    /// Served from the materialized cache list when present; any miss or
    /// cache failure falls back to storage. The cached list may be stale.
    pub async fn list_pending(&self, user_id: u64) -> Result<Vec<PendingApproval>> {
        let key = auto_collects_key(user_id);

        match self.cache.get_json::<Vec<PendingApproval>>(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!("Serving {} from cache", key);
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unusable cache entry {}: {}", key, e),
        }

        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<PendingApproval>> {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(tables::USER_APPROVALS)?;
            let approvals = read_txn.open_table(tables::AUTO_COLLECT_APPROVALS)?;
            let collections = read_txn.open_table(tables::COLLECTIONS)?;

            let mut pending = Vec::new();
            for id in index_values(&index, user_id)? {
                let Some(record) = get_record::<AutoCollectApprovalRecord, _>(&approvals, id)?
                else {
                    continue;
                };
                let collection = get_record::<CollectionRecord, _>(&collections, record.collection_id)?
                    .map(|c| Collection::from_record(record.collection_id, &c));

                pending.push(PendingApproval {
                    approval: AutoCollectApproval::from_record(id, &record),
                    collection,
                });
            }
            Ok(pending)
        })
        .await?
    }

    pub async fn rules_for_user(&self, user_id: u64) -> Result<Vec<AutoCollectRule>> {
        self.load_rules(Some(user_id)).await
    }

    pub async fn all_rules(&self) -> Result<Vec<AutoCollectRule>> {
        self.load_rules(None).await
    }

    pub async fn create_rule(&self, rule: NewAutoCollectRule) -> Result<AutoCollectRule> {
        if rule.name.trim().is_empty() {
            return Err(AppError::InvalidParameters(ERR_EMPTY_NAME.to_string()));
        }

        let db = self.db.clone();

        let created = tokio::task::spawn_blocking(move || -> Result<AutoCollectRule> {
            let record = AutoCollectRuleRecord {
                user_id: rule.user_id,
                collection_id: rule.collection_id,
                name: rule.name.trim().to_string(),
                enabled: rule.enabled,
                require_approval: rule.require_approval,
                created_at: Utc::now().timestamp(),
            };

            let write_txn = db.begin_write()?;
            {
                let users = write_txn.open_table(tables::USERS)?;
                if users.get(record.user_id)?.is_none() {
                    return Err(AppError::UserNotFound);
                }

                let collections = write_txn.open_table(tables::COLLECTIONS)?;
                match get_record::<CollectionRecord, _>(&collections, record.collection_id)? {
                    Some(collection) if collection.user_id == record.user_id => {}
                    _ => return Err(AppError::NotFound),
                }
            }

            let id = db::next_id(&write_txn, "auto_collect_rules")?;
            {
                let mut rules = write_txn.open_table(tables::AUTO_COLLECT_RULES)?;
                let bytes = db::encode(&record)?;
                rules.insert(id, bytes.as_slice())?;
            }
            write_txn.commit()?;

            Ok(AutoCollectRule::from_record(id, &record))
        })
        .await??;

        tracing::info!(
            "Auto-collect rule {} created for user {}",
            created.id,
            created.user_id
        );

        Ok(created)
    }

    async fn load_rules(&self, user_id: Option<u64>) -> Result<Vec<AutoCollectRule>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<AutoCollectRule>> {
            let read_txn = db.begin_read()?;
            let rules = read_txn.open_table(tables::AUTO_COLLECT_RULES)?;

            let mut result = Vec::new();
            for entry in rules.iter()? {
                let (id, value) = entry?;
                let record: AutoCollectRuleRecord = db::decode(value.value())?;
                if user_id.map_or(true, |owner| owner == record.user_id) {
                    result.push(AutoCollectRule::from_record(id.value(), &record));
                }
            }
            Ok(result)
        })
        .await?
    }
}
