//! Full save/fetch lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives the whole client
//! surface over real HTTP: cookie authentication, ordered save envelopes,
//! condition-filtered fetches, tagging, and the embedded-error convention.
//! The `Transport` implementation here is the reference host-side adapter,
//! built on ureq with status-as-error disabled so the core interprets
//! bodies itself.

use salsa_core::{
    AttributeMap, ClientConfig, Error, Fetcher, HttpMethod, HttpRequest, HttpResponse, Saver,
    SessionClient, Transport, Value, SUPPORTER,
};

/// Executes `HttpRequest` values with ureq.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send_empty()
            }
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn save_and_fetch_lifecycle() {
    let base_url = start_server();

    // Step 1: bad credentials are rejected through the error path, not the
    // transport — the server still answers 200.
    let mut bad_client = SessionClient::new(
        ClientConfig::new(&base_url, mock_server::API_EMAIL, "wrong_password"),
        UreqTransport::new(),
    );
    let err = bad_client.authenticate().unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));

    let mut client = SessionClient::new(
        ClientConfig::new(&base_url, mock_server::API_EMAIL, mock_server::API_PASSWORD),
        UreqTransport::new(),
    );

    // Step 2: empty store.
    let mut fetcher = Fetcher::new(&mut client, &SUPPORTER).unwrap();
    assert!(fetcher.fetch(&AttributeMap::new()).unwrap().is_empty());

    // Step 3: save a supporter. The client-supplied timestamp must be
    // stripped before the wire — the server rejects it otherwise.
    let mut attributes = AttributeMap::new();
    attributes.insert("object", "supporter");
    attributes.insert("first_name", "John");
    attributes.insert("last_name", "Doe");
    attributes.insert("email", "john@example.com");
    attributes.insert("receive_email", true);
    attributes.insert("date_created", "Mon Jan 01 2001 00:00:00 GMT-0500 (EST)");
    attributes.insert("some_custom_field", "foo");
    let key = Saver::new(&mut client).save(&attributes).unwrap();
    assert_eq!(key, 1);

    let second = AttributeMap::from_iter([("object", "supporter"), ("first_name", "Jane")]);
    assert_eq!(Saver::new(&mut client).save(&second).unwrap(), 2);

    // Step 4: fetch with a condition filter and read typed fields back.
    let mut fetcher = Fetcher::new(&mut client, &SUPPORTER).unwrap();
    let records = fetcher
        .fetch(&AttributeMap::from_iter([("email", "john@example.com")]))
        .unwrap();
    assert_eq!(records.len(), 1);
    let mut record = records.into_iter().next().unwrap();
    assert_eq!(record.key(), Some(1));
    assert_eq!(record.integer("supporter_key"), Some(1));
    assert_eq!(record.text("first_name").as_deref(), Some("John"));
    assert_eq!(record.boolean("receive_email"), Some(true));
    assert_eq!(
        record.get("some_custom_field"),
        Some(&Value::Text("foo".into()))
    );
    // the server stamps timestamps itself; they parse as datetimes
    assert!(record.datetime("date_created").is_some());
    assert!(record.datetime("last_modified").is_some());

    // Step 5: round-trip. The fetched record carries server-assigned fields
    // and must still save cleanly — reserialization may not reintroduce them.
    record.set("city", "Schenectady");
    let same_key = record.save(&mut Saver::new(&mut client)).unwrap();
    assert_eq!(same_key, 1);

    let mut fetcher = Fetcher::new(&mut client, &SUPPORTER).unwrap();
    let records = fetcher
        .fetch(&AttributeMap::from_iter([("city", "Schenectady")]))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text("first_name").as_deref(), Some("John"));

    // Step 6: tag the record and fetch by tag.
    records[0].tag(&mut Saver::new(&mut client), "vip").unwrap();

    let mut fetcher = Fetcher::new(&mut client, &SUPPORTER).unwrap();
    let tagged = fetcher.tagged("vip", &AttributeMap::new()).unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].key(), Some(1));
    assert!(fetcher.tagged("donor", &AttributeMap::new()).unwrap().is_empty());

    // Step 7: an unknown object type surfaces as a remote error.
    let err = Saver::new(&mut client)
        .save(&AttributeMap::from_iter([("object", "widget")]))
        .unwrap_err();
    assert!(matches!(err, Error::Remote { .. }));

    // Step 8: both supporters are still there.
    let mut fetcher = Fetcher::new(&mut client, &SUPPORTER).unwrap();
    assert_eq!(fetcher.fetch(&AttributeMap::new()).unwrap().len(), 2);
}
