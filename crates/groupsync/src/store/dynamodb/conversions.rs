//! Conversions between domain types and DynamoDB items.
//!
//! Set-valued attributes use the native string-set type so membership
//! updates can be expressed as `ADD`/`DELETE` set operations. DynamoDB
//! forbids empty string sets, so the profile group sets are omitted when
//! empty and default to empty on read; `members` is never empty while a
//! group exists (the owner is always in it). The credentials map is
//! always materialized (an empty `M` is legal) so credential upserts can
//! use a document path unconditionally.

use std::collections::{BTreeSet, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;

use groupsync_core::group::{Group, UserProfile};
use groupsync_core::store::{Result, StoreError};

use super::keys;

pub fn group_to_item(group: &Group) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(
        keys::GROUP_ID.to_string(),
        AttributeValue::S(group.group_id.clone()),
    );
    item.insert(
        keys::INVITE_CODE.to_string(),
        AttributeValue::S(group.invite_code.clone()),
    );
    item.insert(keys::OWNER.to_string(), AttributeValue::S(group.owner.clone()));
    item.insert(keys::NAME.to_string(), AttributeValue::S(group.name.clone()));
    item.insert(
        keys::MEMBERS.to_string(),
        AttributeValue::Ss(group.members.iter().cloned().collect()),
    );
    item
}

pub fn item_to_group(item: &HashMap<String, AttributeValue>) -> Result<Group> {
    Ok(Group {
        group_id: get_s(item, keys::GROUP_ID)?,
        invite_code: get_s(item, keys::INVITE_CODE)?,
        owner: get_s(item, keys::OWNER)?,
        name: get_s(item, keys::NAME)?,
        members: get_ss(item, keys::MEMBERS)?,
    })
}

pub fn profile_to_item(profile: &UserProfile) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(
        keys::AUTH_SUB.to_string(),
        AttributeValue::S(profile.auth_sub.clone()),
    );
    if !profile.groups_member.is_empty() {
        item.insert(
            keys::GROUPS_MEMBER.to_string(),
            AttributeValue::Ss(profile.groups_member.iter().cloned().collect()),
        );
    }
    if !profile.groups_owner.is_empty() {
        item.insert(
            keys::GROUPS_OWNER.to_string(),
            AttributeValue::Ss(profile.groups_owner.iter().cloned().collect()),
        );
    }
    let credentials = profile
        .credentials
        .iter()
        .map(|(key, payload)| (key.to_string(), AttributeValue::S(payload.clone())))
        .collect();
    item.insert(keys::CREDENTIALS.to_string(), AttributeValue::M(credentials));
    item
}

pub fn item_to_profile(item: &HashMap<String, AttributeValue>) -> Result<UserProfile> {
    let mut profile = UserProfile::new(get_s(item, keys::AUTH_SUB)?);
    profile.groups_member = get_ss_or_empty(item, keys::GROUPS_MEMBER)?;
    profile.groups_owner = get_ss_or_empty(item, keys::GROUPS_OWNER)?;

    if let Some(value) = item.get(keys::CREDENTIALS) {
        let AttributeValue::M(map) = value else {
            return Err(invalid(keys::CREDENTIALS, "expected a map"));
        };
        for (raw_key, payload) in map {
            let key = raw_key
                .parse()
                .map_err(|e: String| StoreError::InvalidData(e))?;
            let AttributeValue::S(payload) = payload else {
                return Err(invalid(keys::CREDENTIALS, "expected string payloads"));
            };
            profile.credentials.insert(key, payload.clone());
        }
    }

    Ok(profile)
}

fn get_s(item: &HashMap<String, AttributeValue>, attr: &str) -> Result<String> {
    match item.get(attr) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(attr, "expected a string")),
        None => Err(invalid(attr, "missing attribute")),
    }
}

fn get_ss(item: &HashMap<String, AttributeValue>, attr: &str) -> Result<BTreeSet<String>> {
    match item.get(attr) {
        Some(AttributeValue::Ss(values)) => Ok(values.iter().cloned().collect()),
        Some(_) => Err(invalid(attr, "expected a string set")),
        None => Err(invalid(attr, "missing attribute")),
    }
}

fn get_ss_or_empty(item: &HashMap<String, AttributeValue>, attr: &str) -> Result<BTreeSet<String>> {
    match item.get(attr) {
        None => Ok(BTreeSet::new()),
        Some(_) => get_ss(item, attr),
    }
}

fn invalid(attr: &str, what: &str) -> StoreError {
    StoreError::InvalidData(format!("{attr}: {what}"))
}
