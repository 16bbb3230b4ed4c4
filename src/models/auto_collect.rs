use serde::{Deserialize, Serialize};

use crate::models::Collection;
use crate::routes::timestamp_to_rfc3339;

/// Pending proposal to file an upload into a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCollectApprovalRecord {
    pub user_id: u64,
    pub collection_id: u64,
    pub upload_id: u64,
    pub rule_id: Option<u64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCollectApproval {
    pub id: u64,
    pub user_id: u64,
    pub collection_id: u64,
    pub upload_id: u64,
    pub rule_id: Option<u64>,
    pub created_at: String,
}

impl AutoCollectApproval {
    pub fn from_record(id: u64, record: &AutoCollectApprovalRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            collection_id: record.collection_id,
            upload_id: record.upload_id,
            rule_id: record.rule_id,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

/// Approval joined with its target collection, as listed to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    #[serde(flatten)]
    pub approval: AutoCollectApproval,
    pub collection: Option<Collection>,
}

/// Human decision on a pending approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Deny,
}

impl ApprovalAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(ApprovalAction::Approve),
            "deny" => Some(ApprovalAction::Deny),
            _ => None,
        }
    }
}

/// Rule that routes matching uploads to a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCollectRuleRecord {
    pub user_id: u64,
    pub collection_id: u64,
    pub name: String,
    pub enabled: bool,
    /// Matches become pending approvals instead of being filed directly
    pub require_approval: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCollectRule {
    pub id: u64,
    pub user_id: u64,
    pub collection_id: u64,
    pub name: String,
    pub enabled: bool,
    pub require_approval: bool,
    pub created_at: String,
}

impl AutoCollectRule {
    pub fn from_record(id: u64, record: &AutoCollectRuleRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            collection_id: record.collection_id,
            name: record.name.clone(),
            enabled: record.enabled,
            require_approval: record.require_approval,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

/// Input for creating a rule
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAutoCollectRule {
    pub user_id: u64,
    pub collection_id: u64,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub require_approval: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(ApprovalAction::parse("approve"), Some(ApprovalAction::Approve));
        assert_eq!(ApprovalAction::parse("deny"), Some(ApprovalAction::Deny));
        assert_eq!(ApprovalAction::parse("APPROVE"), None);
        assert_eq!(ApprovalAction::parse(""), None);
        assert_eq!(ApprovalAction::parse("delete"), None);
    }

    #[test]
    fn test_pending_approval_flattens_into_one_object() {
        let pending = PendingApproval {
            approval: AutoCollectApproval {
                id: 4,
                user_id: 1,
                collection_id: 2,
                upload_id: 3,
                rule_id: None,
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
            collection: None,
        };

        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["uploadId"], 3);
        assert!(json["collection"].is_null());

        let back: PendingApproval = serde_json::from_value(json).unwrap();
        assert_eq!(back, pending);
    }
}
