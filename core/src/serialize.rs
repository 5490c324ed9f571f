//! Outbound record serialization.
//!
//! # Design
//! A save request is an ordered parameter list, not a document: the service
//! reads `object` first, `key` second, and tolerates the rest only in a
//! stable order. `serialize` produces that envelope from a caller attribute
//! map — translate the keys, drop what the service refuses from clients,
//! normalize booleans to `1`/`0`, then reorder. Pure transform; the caller
//! transmits it.

use crate::error::Error;
use crate::translate::translate_attributes;
use crate::types::{AttributeMap, Value};

/// Fields the service rejects or silently ignores when a client sets them.
/// Names are post-translation wire names.
const PARAMS_TO_SKIP: &[&str] = &[
    "Date_Created",     // server-assigned
    "Last_Modified",    // server-assigned
    "organization_KEY", // comes from the session, never set by a client
    "Password",         // not writable through this endpoint
    "salsa_deleted",    // reserved
    "salesforce_id",    // reserved
];

/// Read responses duplicate each boolean under a `*_boolvalue` shadow key;
/// the write endpoint does not accept them.
const BOOL_SHADOW_SUFFIX: &str = "_boolvalue";

/// Build the transmission envelope for one record.
///
/// Errors with `MalformedRecord` when the map carries no `object` field,
/// and with `KeyCollision` when two input keys translate to the same wire
/// name.
pub fn serialize(attributes: &AttributeMap) -> Result<AttributeMap, Error> {
    let translated = translate_attributes(attributes)?;

    let mut filtered = AttributeMap::new();
    for (key, value) in translated.iter() {
        if PARAMS_TO_SKIP.contains(&key) || key.ends_with(BOOL_SHADOW_SUFFIX) {
            continue;
        }
        let value = match value {
            Value::Bool(true) => Value::Int(1),
            Value::Bool(false) => Value::Int(0),
            other => other.clone(),
        };
        filtered.insert(key, value);
    }

    let object = filtered.remove("object").ok_or_else(|| Error::MalformedRecord {
        reason: "missing required `object` field".to_string(),
    })?;
    let key = filtered.remove("key");

    // `object` first, `key` second, everything else in surviving order.
    let mut envelope = AttributeMap::new();
    envelope.insert("object", object);
    if let Some(key) = key {
        envelope.insert("key", key);
    }
    for (field, value) in filtered.iter() {
        envelope.insert(field, value.clone());
    }

    Ok(envelope)
}
