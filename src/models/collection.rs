use serde::{Deserialize, Serialize};

use crate::routes::timestamp_to_rfc3339;

/// Collection record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Owner
    pub user_id: u64,
    pub name: String,
    pub image: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub image: Option<String>,
    pub created_at: String,
}

impl Collection {
    pub fn from_record(id: u64, record: &CollectionRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            name: record.name.clone(),
            image: record.image.clone(),
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

/// Link between an uploaded attachment and a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionItemRecord {
    pub collection_id: u64,
    pub attachment_id: u64,
    /// User who added the item
    pub user_id: u64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: u64,
    pub collection_id: u64,
    pub attachment_id: u64,
    pub user_id: u64,
    pub created_at: String,
}

impl CollectionItem {
    pub fn from_record(id: u64, record: &CollectionItemRecord) -> Self {
        Self {
            id,
            collection_id: record.collection_id,
            attachment_id: record.attachment_id,
            user_id: record.user_id,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

/// Shape of an entry in the materialized `collections:{userId}` cache list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCache {
    pub id: u64,
    pub name: String,
    pub image: Option<String>,
    #[serde(default)]
    pub preview: Option<CollectionPreview>,
    #[serde(default)]
    pub items: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPreview {
    pub attachment: Option<PreviewAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewAttachment {
    pub attachment: String,
}

/// Collection shared by two users, as shown on a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutualCollection {
    pub id: u64,
    pub name: String,
    pub image: Option<String>,
    pub preview: Option<String>,
    pub items: u64,
}

impl From<CollectionCache> for MutualCollection {
    fn from(cached: CollectionCache) -> Self {
        Self {
            id: cached.id,
            name: cached.name,
            image: cached.image,
            preview: cached
                .preview
                .and_then(|p| p.attachment)
                .map(|a| a.attachment),
            items: cached.items,
        }
    }
}

/// Collections present in both cached lists, in the order of `mine`
pub fn mutual_collections(
    mine: Vec<CollectionCache>,
    theirs: &[CollectionCache],
) -> Vec<MutualCollection> {
    mine.into_iter()
        .filter(|collection| theirs.iter().any(|other| other.id == collection.id))
        .map(MutualCollection::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(id: u64, preview: Option<&str>) -> CollectionCache {
        CollectionCache {
            id,
            name: format!("collection {}", id),
            image: None,
            preview: preview.map(|p| CollectionPreview {
                attachment: Some(PreviewAttachment {
                    attachment: p.to_string(),
                }),
            }),
            items: id * 10,
        }
    }

    #[test]
    fn test_mutual_collections_intersects_by_id() {
        let mine = vec![cached(1, Some("a.png")), cached(2, None), cached(3, None)];
        let theirs = vec![cached(3, None), cached(1, None), cached(4, None)];

        let mutual = mutual_collections(mine, &theirs);
        let ids: Vec<u64> = mutual.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(mutual[0].preview.as_deref(), Some("a.png"));
        assert_eq!(mutual[1].preview, None);
        assert_eq!(mutual[1].items, 30);
    }

    #[test]
    fn test_collection_cache_tolerates_missing_fields() {
        let parsed: Vec<CollectionCache> =
            serde_json::from_str(r#"[{"id":5,"name":"x","image":null,"extra":true}]"#).unwrap();
        assert_eq!(parsed[0].id, 5);
        assert_eq!(parsed[0].items, 0);
        assert!(parsed[0].preview.is_none());
    }
}
