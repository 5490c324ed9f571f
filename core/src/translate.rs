//! Field-name translation to the service's wire capitalization.
//!
//! # Design
//! The service expects field names in a mixed capitalization scheme that no
//! general rule covers: `first_name` becomes `First_Name`, but
//! `supporter_key` becomes `supporter_KEY`, `mi` becomes `MI`, and custom
//! fields stay snake_case. `translate_key` encodes the scheme as an ordered
//! rule list, first match wins. The suffix and prefix rules run before the
//! standard-field table on purpose: `private_zip_plus_4` is a standard
//! field, yet takes the `private` prefix form.

use crate::error::Error;
use crate::types::AttributeMap;

/// The service's documented standard supporter fields. Names in this table
/// (and not caught by an earlier rule) are capitalized segment by segment;
/// everything else is treated as a caller-defined custom field and left
/// untouched.
const STANDARD_FIELDS: &[&str] = &[
    "supporter_key",
    "organization_key",
    "chapter_key",
    "last_modified",
    "date_created",
    "title",
    "first_name",
    "mi",
    "last_name",
    "suffix",
    "email",
    "password",
    "receive_email",
    "email_status",
    "email_preference",
    "soft_bounce_count",
    "hard_bounce_count",
    "last_bounce",
    "receive_phone_blasts",
    "phone",
    "cell_phone",
    "phone_provider",
    "work_phone",
    "pager",
    "home_fax",
    "work_fax",
    "street",
    "street_2",
    "street_3",
    "city",
    "state",
    "zip",
    "private_zip_plus_4",
    "county",
    "district",
    "country",
    "latitude",
    "longitude",
    "organization",
    "department",
    "occupation",
    "instant_messenger_service",
    "instant_messenger_name",
    "web_page",
    "alternative_email",
    "other_data_1",
    "other_data_2",
    "other_data_3",
    "notes",
    "source",
    "source_details",
    "source_tracking_code",
    "tracking_code",
    "status",
    "uid",
    "timezone",
    "language_code",
];

/// Translate one field name to its wire form. Pure and total; rules apply
/// in order, first match wins.
pub fn translate_key(key: &str) -> String {
    // `key`, `object`, and `tag` are request plumbing, never capitalized.
    if matches!(key, "key" | "object" | "tag") {
        return key.to_string();
    }

    // asdf_key -> asdf_KEY
    if key.ends_with("_key") {
        let mut parts: Vec<&str> = key.split('_').collect();
        let last = parts.pop().unwrap_or_default();
        return format!("{}_{}", parts.join("_"), last.to_uppercase());
    }

    // middle initial is a special case
    if key == "mi" {
        return "MI".to_string();
    }

    // uid is always lower case
    if key == "uid" {
        return key.to_string();
    }

    // private_ab_cd_1 -> PRIVATE_Ab_Cd_1
    if key.starts_with("private") {
        let mut parts = key.split('_');
        let first = parts.next().unwrap_or_default().to_uppercase();
        let rest: Vec<String> = parts.map(capitalize).collect();
        if rest.is_empty() {
            return first;
        }
        return format!("{}_{}", first, rest.join("_"));
    }

    // custom fields keep their snake_case
    if !STANDARD_FIELDS.contains(&key) {
        return key.to_string();
    }

    // all others are capitalized normally
    key.split('_').map(capitalize).collect::<Vec<_>>().join("_")
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Translate every key of `attributes`, preserving the relative order of
/// entries. Two input keys landing on the same wire name is a
/// configuration error and is rejected rather than silently collapsed.
pub fn translate_attributes(attributes: &AttributeMap) -> Result<AttributeMap, Error> {
    let mut translated = AttributeMap::new();
    let mut originals: Vec<(String, String)> = Vec::with_capacity(attributes.len());

    for (key, value) in attributes.iter() {
        let wire_key = translate_key(key);
        if let Some((first, _)) = originals.iter().find(|(_, t)| *t == wire_key) {
            return Err(Error::KeyCollision {
                first: first.clone(),
                second: key.to_string(),
                translated: wire_key,
            });
        }
        originals.push((key.to_string(), wire_key.clone()));
        translated.insert(wire_key, value.clone());
    }

    Ok(translated)
}
