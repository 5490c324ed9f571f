//! Session client, collection fetcher, and record saver.
//!
//! # Design
//! `SessionClient` owns the cookie-based session: it authenticates lazily on
//! first use and reuses the cookie for its lifetime. One instance per worker
//! — the authenticate-then-request sequence is not atomic, so sharing an
//! instance across threads needs external locking. `Fetcher` and `Saver`
//! borrow a client and layer the query-building and envelope logic on top.
//!
//! The service reports failures as `<error>` elements inside HTTP 200
//! responses; every response body is checked before being handed back.

use tracing::{debug, warn};

use crate::error::Error;
use crate::http::{encode_params, HttpMethod, HttpRequest, Transport};
use crate::serialize::serialize;
use crate::translate::translate_attributes;
use crate::types::{AttributeMap, ObjectSchema, Record};
use crate::xml;

const AUTHENTICATE_ENDPOINT: &str = "/api/authenticate.sjs";
const GET_OBJECTS_ENDPOINT: &str = "/api/getObjects.sjs";
const GET_TAGGED_OBJECTS_ENDPOINT: &str = "/api/getTaggedObjects.sjs";
const SAVE_ENDPOINT: &str = "/save";

/// The service truncates every result set at this many rows. There is no
/// pagination here; callers must treat a full page as possibly incomplete.
pub const MAX_RESULTS: usize = 500;

/// Login credentials for the remote service.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Explicit client configuration. There are no environment-variable
/// fallbacks; the caller supplies everything.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(base_url: &str, email: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Credentials {
                email: email.to_string(),
                password: password.to_string(),
            },
        }
    }
}

/// Issues GET/POST requests carrying the session cookie.
///
/// Authentication happens lazily: the first `fetch` or `post` triggers it,
/// and `authenticate` itself is an idempotent no-op once a session exists.
#[derive(Debug)]
pub struct SessionClient<T: Transport> {
    config: ClientConfig,
    transport: T,
    authenticated: bool,
    cookie: String,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            authenticated: false,
            cookie: String::new(),
        }
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// The captured session cookie; empty until authenticated. The service
    /// rejects an empty cookie through the error path, not the transport.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Establish a session. No-op when already authenticated.
    pub fn authenticate(&mut self) -> Result<(), Error> {
        if self.authenticated {
            return Ok(());
        }

        debug!(endpoint = AUTHENTICATE_ENDPOINT, "authenticating session");
        let params = vec![
            ("email".to_string(), self.config.credentials.email.clone()),
            (
                "password".to_string(),
                self.config.credentials.password.clone(),
            ),
        ];
        let request = self.get_request(AUTHENTICATE_ENDPOINT, &params);
        let response = self.transport.execute(&request)?;

        if let Some(message) = xml::error_text(&response.body) {
            warn!(%message, "authentication rejected");
            return Err(Error::Authentication { message });
        }
        if let Some(cookie) = response.header("set-cookie") {
            self.cookie = cookie.to_string();
        }
        self.authenticated = true;
        Ok(())
    }

    /// GET `endpoint` with `params`, returning the raw XML body.
    pub fn fetch(&mut self, endpoint: &str, params: &[(String, String)]) -> Result<String, Error> {
        self.authenticate()?;
        let request = self.get_request(endpoint, params);
        debug!(url = %request.url, "GET");
        let response = self.transport.execute(&request)?;
        ensure_no_remote_error(&response.body)?;
        Ok(response.body)
    }

    /// POST `endpoint` with `params`, returning the raw XML body.
    ///
    /// The service reads POST parameters from the query string in the exact
    /// order supplied, so they are encoded positionally with an empty body.
    /// An `xml=true` flag is appended so the response comes back as XML.
    pub fn post(&mut self, endpoint: &str, params: &[(String, String)]) -> Result<String, Error> {
        self.authenticate()?;
        let mut params = params.to_vec();
        params.push(("xml".to_string(), "true".to_string()));
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: format!(
                "{}{}?{}",
                self.config.base_url,
                endpoint,
                encode_params(&params)
            ),
            headers: vec![("cookie".to_string(), self.cookie.clone())],
        };
        debug!(url = %request.url, "POST");
        let response = self.transport.execute(&request)?;
        ensure_no_remote_error(&response.body)?;
        Ok(response.body)
    }

    fn get_request(&self, endpoint: &str, params: &[(String, String)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!(
                "{}{}?{}",
                self.config.base_url,
                endpoint,
                encode_params(params)
            ),
            headers: vec![("cookie".to_string(), self.cookie.clone())],
        }
    }
}

fn ensure_no_remote_error(body: &str) -> Result<(), Error> {
    match xml::error_text(body) {
        Some(message) => Err(Error::Remote { message }),
        None => Ok(()),
    }
}

/// Pulls collections of one object type back from the service.
pub struct Fetcher<'a, T: Transport> {
    client: &'a mut SessionClient<T>,
    schema: &'static ObjectSchema,
}

impl<'a, T: Transport> Fetcher<'a, T> {
    /// Bind a fetcher to `schema`. The schema is validated once here;
    /// post-translation key collisions are configuration errors.
    pub fn new(
        client: &'a mut SessionClient<T>,
        schema: &'static ObjectSchema,
    ) -> Result<Self, Error> {
        schema.validate()?;
        Ok(Self { client, schema })
    }

    /// Fetch every record matching `filter`. Filter keys are translated to
    /// wire names and sent as repeated `condition` parameters in insertion
    /// order. At most [`MAX_RESULTS`] rows come back; a full page may mean
    /// the result set was truncated.
    pub fn fetch(&mut self, filter: &AttributeMap) -> Result<Vec<Record>, Error> {
        let params = self.query_params(filter, None)?;
        let body = self.client.fetch(GET_OBJECTS_ENDPOINT, &params)?;
        self.records(&body)
    }

    /// Like [`fetch`](Self::fetch), restricted to records carrying `tag`.
    pub fn tagged(&mut self, tag: &str, filter: &AttributeMap) -> Result<Vec<Record>, Error> {
        let params = self.query_params(filter, Some(tag))?;
        let body = self.client.fetch(GET_TAGGED_OBJECTS_ENDPOINT, &params)?;
        self.records(&body)
    }

    fn query_params(
        &self,
        filter: &AttributeMap,
        tag: Option<&str>,
    ) -> Result<Vec<(String, String)>, Error> {
        let translated = translate_attributes(filter)?;
        let mut params: Vec<(String, String)> = translated
            .iter()
            .map(|(field, value)| ("condition".to_string(), format!("{field}={value}")))
            .collect();
        params.push(("object".to_string(), self.schema.object_name.to_string()));
        if let Some(tag) = tag {
            params.push(("tag".to_string(), tag.to_string()));
        }
        Ok(params)
    }

    fn records(&self, body: &str) -> Result<Vec<Record>, Error> {
        let mut records = Vec::new();
        for attributes in xml::item_attributes(body)? {
            let failed = matches!(
                attributes.get("result"),
                Some(crate::types::Value::Text(s)) if s == "error"
            );
            if failed {
                return Err(Error::MalformedItem { attributes });
            }
            records.push(Record::new(self.schema, attributes));
        }
        Ok(records)
    }
}

/// Persists records to the service, one POST per record.
pub struct Saver<'a, T: Transport> {
    client: &'a mut SessionClient<T>,
}

impl<'a, T: Transport> Saver<'a, T> {
    pub fn new(client: &'a mut SessionClient<T>) -> Self {
        Self { client }
    }

    /// Serialize and submit one record, returning the service-assigned key.
    /// A response without a `<success>` element is a remote failure; the
    /// raw body rides along in the error for diagnostics.
    pub fn save(&mut self, attributes: &AttributeMap) -> Result<i64, Error> {
        let envelope = serialize(attributes)?;
        let object = envelope.get("object").map(ToString::to_string).unwrap_or_default();
        debug!(%object, "saving record");
        let params: Vec<(String, String)> = envelope
            .iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        let body = self.client.post(SAVE_ENDPOINT, &params)?;
        match xml::success_key(&body) {
            Some(key) => key.trim().parse().map_err(|_| Error::Remote {
                message: format!("unparseable success key in response: {body}"),
            }),
            None => Err(Error::Remote {
                message: format!("save returned no success element: {body}"),
            }),
        }
    }

    /// Save records strictly in order, best effort: the first failure
    /// propagates and the remaining records are never submitted. Prior
    /// successful saves are not rolled back.
    pub fn save_many(&mut self, records: &[AttributeMap]) -> Result<(), Error> {
        for attributes in records {
            self.save(attributes)?;
        }
        Ok(())
    }

    /// Apply `tag` to an existing record: a degenerate save carrying only
    /// `object`, `key`, and `tag`.
    pub fn tag(&mut self, object_name: &str, key: i64, tag: &str) -> Result<i64, Error> {
        let mut params = AttributeMap::new();
        params.insert("object", object_name);
        params.insert("key", key);
        params.insert("tag", tag);
        self.save(&params)
    }
}

impl Record {
    /// Save this record, injecting `object` from the schema. On success the
    /// assigned key is written back into `key` and the schema's key field
    /// (`supporter_key` for supporters).
    pub fn save<T: Transport>(&mut self, saver: &mut Saver<'_, T>) -> Result<i64, Error> {
        let mut outgoing = self.attributes().clone();
        outgoing.insert("object", self.object_name());
        let key = saver.save(&outgoing)?;
        self.set("key", key);
        self.set(self.schema().key_field(), key);
        Ok(key)
    }

    /// Tag this record on the service. Requires a remote key.
    pub fn tag<T: Transport>(&self, saver: &mut Saver<'_, T>, tag: &str) -> Result<i64, Error> {
        let key = self.key().ok_or_else(|| Error::MalformedRecord {
            reason: "record has no remote key to tag".to_string(),
        })?;
        saver.tag(self.object_name(), key, tag)
    }
}
