//! Verify the save pipeline against a complete supporter fixture.
//!
//! One record exercising every translation rule and filter at once: key
//! suffixes, the `mi` and `private` special cases, boolean shadows,
//! server-assigned fields, reserved flags, and custom fields. The envelope
//! is compared pair by pair because the wire order is part of the contract.

use salsa_core::{serialize, AttributeMap, Value};

fn full_supporter() -> AttributeMap {
    let mut input = AttributeMap::new();
    input.insert("supporter_key", "31337");
    input.insert("key", "31337");
    input.insert("organization_key", "1234");
    input.insert("chapter_key", "90210");
    input.insert("title", "Mr.");
    input.insert("first_name", "John");
    input.insert("mi", "Jacob");
    input.insert("last_name", "Jingleheimer Schmidt");
    input.insert("suffix", "IV");
    input.insert("email", "johnjacob@example.com");
    input.insert("receive_email", 1i64);
    input.insert("receive_phone_blasts", false);
    input.insert("receive_phone_blasts_boolvalue", false);
    input.insert("phone", "1234567890");
    input.insert("street", "123 Main St");
    input.insert("street_2", "Apt 404");
    input.insert("city", "Schenectady");
    input.insert("state", "NY");
    input.insert("zip", "12345");
    input.insert("private_zip_plus_4", "1111");
    input.insert("country", "USA");
    input.insert("source", "test");
    input.insert("status", "Active");
    input.insert("source_details", "foo123");
    input.insert("source_tracking_code", "foo123");
    input.insert("tracking_code", "abc123");
    input.insert("date_created", "Fri Mar 14 2014 14:07:29 GMT-0400 (EDT)");
    input.insert("last_modified", "Fri Mar 14 2014 13:54:10 GMT-0400 (EDT)");
    input.insert("district", "N/A");
    input.insert("language_code", "eng");
    input.insert("salsa_deleted", false);
    input.insert("salsa_deleted_boolvalue", false);
    input.insert("text", "asdf");
    input.insert("some_custom_field", "foo");
    input.insert("object", "supporter");
    input
}

#[test]
fn full_supporter_record_envelope() {
    let envelope = serialize(&full_supporter()).unwrap();

    let expected: Vec<(&str, Value)> = vec![
        ("object", Value::from("supporter")),
        ("key", Value::from("31337")),
        ("supporter_KEY", Value::from("31337")),
        ("chapter_KEY", Value::from("90210")),
        ("Title", Value::from("Mr.")),
        ("First_Name", Value::from("John")),
        ("MI", Value::from("Jacob")),
        ("Last_Name", Value::from("Jingleheimer Schmidt")),
        ("Suffix", Value::from("IV")),
        ("Email", Value::from("johnjacob@example.com")),
        ("Receive_Email", Value::Int(1)),
        ("Receive_Phone_Blasts", Value::Int(0)),
        ("Phone", Value::from("1234567890")),
        ("Street", Value::from("123 Main St")),
        ("Street_2", Value::from("Apt 404")),
        ("City", Value::from("Schenectady")),
        ("State", Value::from("NY")),
        ("Zip", Value::from("12345")),
        ("PRIVATE_Zip_Plus_4", Value::from("1111")),
        ("Country", Value::from("USA")),
        ("Source", Value::from("test")),
        ("Status", Value::from("Active")),
        ("Source_Details", Value::from("foo123")),
        ("Source_Tracking_Code", Value::from("foo123")),
        ("Tracking_Code", Value::from("abc123")),
        ("District", Value::from("N/A")),
        ("Language_Code", Value::from("eng")),
        ("text", Value::from("asdf")),
        ("some_custom_field", Value::from("foo")),
    ];

    let actual: Vec<(&str, &Value)> = envelope.iter().collect();
    let expected_refs: Vec<(&str, &Value)> =
        expected.iter().map(|(k, v)| (*k, v)).collect();
    assert_eq!(actual, expected_refs);
}

#[test]
fn serialization_is_a_fixpoint() {
    // Post-translation names hit no rename rule and the deny-listed fields
    // are already gone, so serializing an envelope changes nothing.
    let envelope = serialize(&full_supporter()).unwrap();
    let again = serialize(&envelope).unwrap();
    assert_eq!(again, envelope);
}
