//! In-memory test double for the Salsa-style CRM API.
//!
//! Mimics the remote service's contract rather than sensible HTTP: every
//! response is 200 with an XML body, failures are `<error>` elements,
//! authentication is a session cookie from `/api/authenticate.sjs`, and the
//! save endpoint reads its parameters from the query string and insists
//! `object` comes first.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, RawQuery, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::RwLock};

/// Credentials the mock accepts.
pub const API_EMAIL: &str = "user@example.com";
pub const API_PASSWORD: &str = "correct_password";

/// The session cookie handed out on successful login. Clients echo the full
/// `Set-Cookie` value back, as the real service tolerates.
pub const SESSION_COOKIE: &str = "JSESSIONID=mock0001; Path=/";

/// The real service truncates result sets at this many rows.
pub const MAX_RESULTS: usize = 500;

const SERVER_TIMESTAMP: &str = "Fri Mar 14 2014 14:07:29 GMT-0400 (EDT)";

/// Fields the service assigns itself and rejects from clients.
const SERVER_ASSIGNED: &[&str] = &[
    "Date_Created",
    "Last_Modified",
    "organization_KEY",
    "Password",
    "salsa_deleted",
    "salesforce_id",
];

#[derive(Debug, Default, Clone)]
pub struct Supporter {
    pub key: i64,
    pub fields: Vec<(String, String)>,
    pub tags: Vec<String>,
}

#[derive(Default)]
pub struct Store {
    supporters: BTreeMap<i64, Supporter>,
    next_key: i64,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/authenticate.sjs", get(authenticate))
        .route("/api/getObjects.sjs", get(get_objects))
        .route("/api/getTaggedObjects.sjs", get(get_tagged_objects))
        .route("/save", post(save))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
struct AuthQuery {
    email: Option<String>,
    password: Option<String>,
}

async fn authenticate(Query(params): Query<AuthQuery>) -> Response {
    let ok = params.email.as_deref() == Some(API_EMAIL)
        && params.password.as_deref() == Some(API_PASSWORD);
    if !ok {
        return xml_error("Invalid login, please try again.");
    }
    (
        [
            (header::CONTENT_TYPE, "text/xml"),
            (header::SET_COOKIE, SESSION_COOKIE),
        ],
        "<?xml version=\"1.0\"?>\n<data><message>Successful Login</message></data>",
    )
        .into_response()
}

async fn get_objects(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    objects_response(db, headers, query, None).await
}

async fn get_tagged_objects(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let pairs = parse_query(query.as_deref());
    let Some(tag) = pairs.iter().find(|(k, _)| k == "tag").map(|(_, v)| v.clone()) else {
        return xml_error("Missing tag parameter");
    };
    objects_response(db, headers, query, Some(tag)).await
}

async fn objects_response(
    db: Db,
    headers: HeaderMap,
    query: Option<String>,
    tag: Option<String>,
) -> Response {
    if !authenticated(&headers) {
        return xml_error("Please authenticate first.");
    }
    let pairs = parse_query(query.as_deref());
    let object = pairs
        .iter()
        .find(|(k, _)| k == "object")
        .map(|(_, v)| v.as_str());
    if object != Some("supporter") {
        return xml_error("Unknown object requested");
    }
    let conditions: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "condition")
        .map(|(_, v)| v.as_str())
        .collect();

    let store = db.read().await;
    let mut items = String::new();
    let mut count = 0usize;
    for supporter in store.supporters.values() {
        if let Some(tag) = tag.as_deref() {
            if !supporter.tags.iter().any(|t| t == tag) {
                continue;
            }
        }
        if !conditions.iter().all(|c| condition_matches(supporter, c)) {
            continue;
        }
        if count == MAX_RESULTS {
            break;
        }
        items.push_str(&render_item(supporter));
        count += 1;
    }

    xml(format!(
        "<?xml version=\"1.0\"?>\n<data><supporter><count>{count}</count>{items}</supporter></data>"
    ))
}

async fn save(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !authenticated(&headers) {
        return xml_error("Please authenticate first.");
    }
    let pairs = parse_query(query.as_deref());

    // the real endpoint reads parameters positionally; object must lead
    match pairs.first() {
        Some((name, _)) if name == "object" => {}
        _ => return xml_error("object must be the first parameter"),
    }
    let object = pairs[0].1.as_str();
    if object != "supporter" {
        return xml_error(&format!("Unknown object type: {object}"));
    }
    if let Some((name, _)) = pairs
        .iter()
        .find(|(name, _)| SERVER_ASSIGNED.contains(&name.as_str()))
    {
        return xml_error(&format!("Field {name} may not be set by clients"));
    }

    let key: Option<i64> = pairs
        .iter()
        .find(|(k, _)| k == "key")
        .and_then(|(_, v)| v.parse().ok());
    let tag = pairs.iter().find(|(k, _)| k == "tag").map(|(_, v)| v.clone());
    let fields: Vec<(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "object" | "key" | "tag" | "xml"))
        .cloned()
        .collect();

    let mut store = db.write().await;
    let key = match key {
        Some(key) => key,
        None => {
            store.next_key += 1;
            store.next_key
        }
    };
    let supporter = store.supporters.entry(key).or_insert_with(|| {
        let mut supporter = Supporter {
            key,
            ..Supporter::default()
        };
        supporter
            .fields
            .push(("Date_Created".to_string(), SERVER_TIMESTAMP.to_string()));
        supporter
    });
    for (name, value) in fields {
        set_field(supporter, name, value);
    }
    set_field(
        supporter,
        "Last_Modified".to_string(),
        SERVER_TIMESTAMP.to_string(),
    );
    if let Some(tag) = tag {
        if !supporter.tags.contains(&tag) {
            supporter.tags.push(tag);
        }
    }

    xml(format!(
        "<?xml version=\"1.0\"?>\n<data><success key=\"{key}\">Object saved.</success></data>"
    ))
}

fn set_field(supporter: &mut Supporter, name: String, value: String) {
    match supporter.fields.iter_mut().find(|(n, _)| *n == name) {
        Some(entry) => entry.1 = value,
        None => supporter.fields.push((name, value)),
    }
}

fn authenticated(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookie| cookie.contains("JSESSIONID=mock0001"))
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

fn condition_matches(supporter: &Supporter, condition: &str) -> bool {
    let Some((field, expected)) = condition.split_once('=') else {
        return false;
    };
    if field == "key" || field == "supporter_KEY" {
        return supporter.key.to_string() == expected;
    }
    supporter
        .fields
        .iter()
        .any(|(name, value)| name == field && value == expected)
}

fn render_item(supporter: &Supporter) -> String {
    let mut item = String::from("<item>");
    item.push_str(&format!(
        "<key>{0}</key><supporter_KEY>{0}</supporter_KEY>",
        supporter.key
    ));
    for (name, value) in &supporter.fields {
        item.push_str(&format!("<{name}>{}</{name}>", escape(value)));
    }
    item.push_str("</item>");
    item
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn xml_error(message: &str) -> Response {
    xml(format!(
        "<?xml version=\"1.0\"?>\n<data><error>{}</error></data>",
        escape(message)
    ))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
