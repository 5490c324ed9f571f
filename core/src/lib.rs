//! Synchronous client core for a Salsa-style CRM API.
//!
//! # Overview
//! The remote service speaks HTTP with cookie-based sessions and XML bodies,
//! and depends on two quirks this crate exists to get right: field names must
//! be rewritten into the service's idiosyncratic capitalization scheme, and
//! write requests must keep their parameters in a specific order. The crate
//! translates attribute maps to wire form, serializes ordered save envelopes,
//! parses fetch responses back into records, and drives both through a
//! session client.
//!
//! # Design
//! - `translate`, `serialize`, and `xml` are pure: attribute maps in,
//!   attribute maps out, no I/O.
//! - `SessionClient` holds the session state (lazy authentication, one
//!   cookie) and builds `HttpRequest` values; the actual round-trip is
//!   performed by a caller-supplied `Transport`, keeping the core
//!   deterministic and testable (ureq in the integration tests).
//! - The service answers HTTP 200 even on failure and embeds an `<error>`
//!   element instead; every response body is checked for it.
//! - Record types are described by a static `ObjectSchema` rather than a
//!   type hierarchy; `Record` is generic over the schema it carries.
//! - Single-threaded by design: one `SessionClient` per worker.

pub mod client;
pub mod error;
pub mod http;
pub mod serialize;
pub mod translate;
pub mod types;
pub mod xml;

pub use client::{ClientConfig, Credentials, Fetcher, Saver, SessionClient, MAX_RESULTS};
pub use error::Error;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use serialize::serialize;
pub use translate::{translate_attributes, translate_key};
pub use types::{AttributeMap, FieldKind, ObjectSchema, Record, Value, SUPPORTER};
