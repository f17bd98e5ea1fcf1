//! DynamoDB entity store implementation.
//!
//! Implements the `EntityStore` trait from `groupsync_core::store` using
//! DynamoDB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;

use groupsync_core::group::{CredentialKey, Group, UserProfile};
use groupsync_core::store::{EntityStore, Result, StoreError, TransactOp};

use super::conversions::{group_to_item, item_to_group, item_to_profile, profile_to_item};
use super::error::{
    map_build_error, map_delete_item_error, map_get_item_error, map_put_item_error,
    map_query_error, map_transact_error, map_update_item_error,
};
use super::keys;

/// DynamoDB-based entity store.
///
/// Groups and profiles live in separate tables; invite-code lookups go
/// through a GSI on the groups table keyed by `invite_code`.
pub struct DynamoDbStore {
    client: Client,
    groups_table: String,
    profiles_table: String,
    invite_index: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table names.
    pub fn new(
        client: Client,
        groups_table: impl Into<String>,
        profiles_table: impl Into<String>,
        invite_index: impl Into<String>,
    ) -> Self {
        Self {
            client,
            groups_table: groups_table.into(),
            profiles_table: profiles_table.into(),
            invite_index: invite_index.into(),
        }
    }

    /// Creates a new store from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain and reads table names from
    /// `GROUPS_TABLE_NAME`, `PROFILES_TABLE_NAME` and
    /// `INVITE_CODE_INDEX_NAME` (with defaults matching the deployed stack).
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let groups_table =
            std::env::var("GROUPS_TABLE_NAME").unwrap_or_else(|_| "groupsync-groups".to_string());
        let profiles_table = std::env::var("PROFILES_TABLE_NAME")
            .unwrap_or_else(|_| "groupsync-profiles".to_string());
        let invite_index = std::env::var("INVITE_CODE_INDEX_NAME")
            .unwrap_or_else(|_| "invite_code-index".to_string());

        Ok(Self::new(client, groups_table, profiles_table, invite_index))
    }

    fn group_key(group_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(
            keys::GROUP_ID.to_string(),
            AttributeValue::S(group_id.to_string()),
        )])
    }

    fn profile_key(auth_sub: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(
            keys::AUTH_SUB.to_string(),
            AttributeValue::S(auth_sub.to_string()),
        )])
    }

    fn op_to_transact_item(&self, op: TransactOp) -> Result<TransactWriteItem> {
        let item = match op {
            TransactOp::CreateGroup(group) => {
                let put = Put::builder()
                    .table_name(&self.groups_table)
                    .set_item(Some(group_to_item(&group)))
                    .condition_expression("attribute_not_exists(group_id)")
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().put(put).build()
            }
            TransactOp::DeleteGroup { group_id } => {
                let delete = Delete::builder()
                    .table_name(&self.groups_table)
                    .set_key(Some(Self::group_key(&group_id)))
                    .condition_expression("attribute_exists(group_id)")
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().delete(delete).build()
            }
            TransactOp::AddGroupMember { group_id, user_id } => {
                // `members` is aliased because it is a DynamoDB reserved
                // word.
                let update = Update::builder()
                    .table_name(&self.groups_table)
                    .set_key(Some(Self::group_key(&group_id)))
                    .update_expression("ADD #members :user")
                    .condition_expression("attribute_exists(group_id)")
                    .expression_attribute_names("#members", keys::MEMBERS)
                    .expression_attribute_values(":user", AttributeValue::Ss(vec![user_id]))
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().update(update).build()
            }
            TransactOp::RemoveGroupMember { group_id, user_id } => {
                let update = Update::builder()
                    .table_name(&self.groups_table)
                    .set_key(Some(Self::group_key(&group_id)))
                    .update_expression("DELETE #members :user")
                    .condition_expression("attribute_exists(group_id)")
                    .expression_attribute_names("#members", keys::MEMBERS)
                    .expression_attribute_values(":user", AttributeValue::Ss(vec![user_id]))
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().update(update).build()
            }
            TransactOp::AddProfileMembership {
                auth_sub,
                group_id,
                owner,
            } => {
                let expression = if owner {
                    "ADD groups_member :group, groups_owner :group"
                } else {
                    "ADD groups_member :group"
                };
                let update = Update::builder()
                    .table_name(&self.profiles_table)
                    .set_key(Some(Self::profile_key(&auth_sub)))
                    .update_expression(expression)
                    .condition_expression("attribute_exists(auth_sub)")
                    .expression_attribute_values(":group", AttributeValue::Ss(vec![group_id]))
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().update(update).build()
            }
            TransactOp::RemoveProfileMembership { auth_sub, group_id } => {
                let update = Update::builder()
                    .table_name(&self.profiles_table)
                    .set_key(Some(Self::profile_key(&auth_sub)))
                    .update_expression("DELETE groups_member :group, groups_owner :group")
                    .condition_expression("attribute_exists(auth_sub)")
                    .expression_attribute_values(":group", AttributeValue::Ss(vec![group_id]))
                    .build()
                    .map_err(map_build_error)?;
                TransactWriteItem::builder().update(update).build()
            }
        };
        Ok(item)
    }
}

#[async_trait]
impl EntityStore for DynamoDbStore {
    async fn get_group(&self, group_id: &str, consistent: bool) -> Result<Option<Group>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.groups_table)
            .set_key(Some(Self::group_key(group_id)))
            .consistent_read(consistent)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, "Group", group_id))?;

        match result.item {
            Some(item) => Ok(Some(item_to_group(&item)?)),
            None => Ok(None),
        }
    }

    async fn get_group_by_invite_code(&self, code: &str) -> Result<Vec<Group>> {
        let result = self
            .client
            .query()
            .table_name(&self.groups_table)
            .index_name(&self.invite_index)
            .key_condition_expression("invite_code = :code")
            .expression_attribute_values(":code", AttributeValue::S(code.to_string()))
            .send()
            .await
            .map_err(map_query_error)?;

        let items = result.items.unwrap_or_default();
        items.iter().map(item_to_group).collect()
    }

    async fn update_group_name(&self, group_id: &str, name: &str) -> Result<Group> {
        // `name` is a DynamoDB reserved word.
        let result = self
            .client
            .update_item()
            .table_name(&self.groups_table)
            .set_key(Some(Self::group_key(group_id)))
            .update_expression("SET #name = :name")
            .condition_expression("attribute_exists(group_id)")
            .expression_attribute_names("#name", keys::NAME)
            .expression_attribute_values(":name", AttributeValue::S(name.to_string()))
            .return_values(aws_sdk_dynamodb::types::ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, "Group", group_id))?;

        let attributes = result
            .attributes
            .ok_or_else(|| StoreError::QueryFailed("UpdateItem returned no attributes".to_string()))?;
        item_to_group(&attributes)
    }

    async fn get_profile(&self, auth_sub: &str, consistent: bool) -> Result<Option<UserProfile>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.profiles_table)
            .set_key(Some(Self::profile_key(auth_sub)))
            .consistent_read(consistent)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, "UserProfile", auth_sub))?;

        match result.item {
            Some(item) => Ok(Some(item_to_profile(&item)?)),
            None => Ok(None),
        }
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.profiles_table)
            .set_item(Some(profile_to_item(profile)))
            .condition_expression("attribute_not_exists(auth_sub)")
            .send()
            .await
            .map_err(|e| map_put_item_error(e, "UserProfile", profile.auth_sub.clone()))?;

        Ok(())
    }

    async fn delete_profile(&self, auth_sub: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.profiles_table)
            .set_key(Some(Self::profile_key(auth_sub)))
            .condition_expression("attribute_exists(auth_sub)")
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, "UserProfile", auth_sub))?;

        Ok(())
    }

    async fn upsert_profile_credential(
        &self,
        auth_sub: &str,
        key: &CredentialKey,
        payload: &str,
    ) -> Result<()> {
        // The credentials map attribute is written at profile creation, so
        // the document path is always valid here.
        self.client
            .update_item()
            .table_name(&self.profiles_table)
            .set_key(Some(Self::profile_key(auth_sub)))
            .update_expression("SET credentials.#key = :payload")
            .condition_expression("attribute_exists(auth_sub)")
            .expression_attribute_names("#key", key.to_string())
            .expression_attribute_values(":payload", AttributeValue::S(payload.to_string()))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, "UserProfile", auth_sub))?;

        Ok(())
    }

    async fn remove_profile_credential(&self, auth_sub: &str, key: &CredentialKey) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.profiles_table)
            .set_key(Some(Self::profile_key(auth_sub)))
            .update_expression("REMOVE credentials.#key")
            .condition_expression("attribute_exists(auth_sub)")
            .expression_attribute_names("#key", key.to_string())
            .send()
            .await
            .map_err(|e| map_update_item_error(e, "UserProfile", auth_sub))?;

        Ok(())
    }

    async fn transact(&self, ops: Vec<TransactOp>) -> Result<()> {
        let items = ops
            .into_iter()
            .map(|op| self.op_to_transact_item(op))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_error)?;

        Ok(())
    }
}
