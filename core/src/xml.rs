//! XML response parsing.
//!
//! # Design
//! The service answers every request with HTTP 200 and wraps both data and
//! failures in XML, so this module is the only place response bodies are
//! interpreted: `error_text` finds the embedded failure signal,
//! `item_attributes` flattens each `<item>` row into an attribute map with
//! lowercased keys, and `success_key` pulls the assigned key out of a save
//! acknowledgement. Read-side key order is preserved incidentally but is
//! not part of the contract.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Error;
use crate::types::AttributeMap;

/// The text of the first `<error>` element in `body`, if any. A body that
/// is not XML at all has no `<error>` element and reads as no error.
pub fn error_text(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut in_error = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"error" => in_error = true,
            Ok(Event::Empty(e)) if e.name().as_ref() == b"error" => return Some(String::new()),
            Ok(Event::Text(t)) if in_error => {
                return Some(t.unescape().ok()?.into_owned());
            }
            Ok(Event::End(e)) if in_error && e.name().as_ref() == b"error" => {
                return Some(String::new());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// The `key` attribute of the first `<success>` element in `body`, if any.
pub fn success_key(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.name().as_ref() == b"success" => {
                let attribute = e.try_get_attribute("key").ok()??;
                return Some(attribute.unescape_value().ok()?.into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse every `<item>` element in `body` into an attribute map: keys are
/// the item's child element names lowercased, values their text content.
pub fn item_attributes(body: &str) -> Result<Vec<AttributeMap>, Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<AttributeMap> = None;
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if current.is_none() {
                    if name == "item" {
                        current = Some(AttributeMap::new());
                    }
                } else if field.is_none() {
                    field = Some(name.to_lowercase());
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if let Some(map) = current.as_mut() {
                    if field.is_none() {
                        let name =
                            String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                        map.insert(name, "");
                    }
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let closes_field = field
                    .as_deref()
                    .is_some_and(|open| name.to_lowercase() == open);
                if closes_field {
                    let open_field = field.take().unwrap_or_default();
                    if let Some(map) = current.as_mut() {
                        map.insert(open_field, text.clone());
                    }
                } else if field.is_none() && name == "item" {
                    if let Some(map) = current.take() {
                        items.push(map);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}
