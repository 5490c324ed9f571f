//! Error types for the Salsa API client.
//!
//! # Design
//! The service answers HTTP 200 for everything, including failures, and
//! signals problems through an `<error>` element embedded in the XML body.
//! `Authentication` and `Remote` exist so callers can tell a rejected login
//! apart from a failed operation even though both arrive the same way on
//! the wire. Nothing here is retried or recovered internally.

use thiserror::Error;

use crate::types::AttributeMap;

/// Errors returned by the client, fetcher, and saver.
#[derive(Debug, Error)]
pub enum Error {
    /// The authenticate call came back with an `<error>` element.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// A fetch or save response contained an `<error>` element, or a save
    /// response lacked the expected `<success>` element.
    #[error("API returned an error: {message}")]
    Remote { message: String },

    /// A fetched item reported `result=error` in its own attributes. The
    /// full attribute map is attached for diagnostics.
    #[error("fetched item reported an error: {attributes:?}")]
    MalformedItem { attributes: AttributeMap },

    /// The record cannot be serialized for transmission.
    #[error("record cannot be saved: {reason}")]
    MalformedRecord { reason: String },

    /// Two distinct field names map to the same wire name. The rename rules
    /// are assumed injective over any one record; a collision is a
    /// configuration error, not something to resolve silently.
    #[error("field names `{first}` and `{second}` both translate to `{translated}`")]
    KeyCollision {
        first: String,
        second: String,
        translated: String,
    },

    /// The host's `Transport` implementation failed to complete the
    /// round-trip. Transport policy (TLS, timeouts, retries) lives with the
    /// host, so this is an opaque message.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body was not well-formed XML.
    #[error("malformed XML in response: {0}")]
    Xml(#[from] quick_xml::Error),
}
