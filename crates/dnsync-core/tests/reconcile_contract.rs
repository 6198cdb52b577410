//! Architectural Contract Test: Identity Resolution
//!
//! This test verifies how the engine maps caller records onto remote
//! records.
//!
//! Constraints verified:
//! - Records with an identity are addressed directly, without a listing
//! - Records without one are matched by (relative name, type)
//! - The zone is listed at most once per call, and only when needed
//! - Delete of an unmatched record is a no-op, not an error
//!
//! If this test fails, records may be duplicated or the wrong record edited.

mod common;

use common::*;
use dnsync_core::CallContext;
use dnsync_core::error::Error;
use dnsync_core::record::{Generic, Record, RemoteRecord};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn set_with_identity_edits_without_listing() {
    let transport = Arc::new(MockTransport::echoing());
    let engine = engine(transport.clone());

    let records = vec![a_record("www", "192.0.2.10", Some("rec-1"))];
    let set = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    assert_eq!(transport.call_count("list-records"), 0);
    assert_eq!(transport.call_count("add-record"), 0);
    assert_eq!(transport.call_count("edit-record"), 1);

    let edit = &transport.calls_to("edit-record")[0];
    assert_eq!(edit.params["id"], "rec-1");
    assert_eq!(edit.params["content"], "192.0.2.10");

    assert_eq!(set.len(), 1);
    assert_eq!(set[0].identity(), Some("rec-1"));
}

#[tokio::test]
async fn set_without_match_creates_record() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![]);
    let engine = engine(transport.clone());

    let records = vec![a_record("test", "192.0.2.1", None)];
    let set = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    assert_eq!(transport.call_count("list-records"), 1);
    assert_eq!(transport.call_count("add-record"), 1);
    assert_eq!(transport.call_count("edit-record"), 0);

    let add = &transport.calls_to("add-record")[0];
    assert_eq!(
        add.params,
        json!({
            "domain": "example.com",
            "type": "A",
            "name": "test",
            "content": "192.0.2.1",
            "ttl": 3600
        })
    );

    assert_eq!(set.len(), 1);
    assert_eq!(set[0].identity(), Some("new-1"));
    assert_eq!(set[0].name(), "test");
}

#[tokio::test]
async fn set_with_match_updates_found_identity() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![
        remote_a("42", "test", "192.0.2.1"),
        remote_a("43", "other", "192.0.2.2"),
    ]);
    let engine = engine(transport.clone());

    let records = vec![a_record("test.example.com", "198.51.100.7", None)];
    let set = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    assert_eq!(transport.call_count("add-record"), 0);
    let edits = transport.calls_to("edit-record");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].params["id"], "42");
    assert_eq!(edits[0].params["name"], "test");
    assert_eq!(edits[0].params["content"], "198.51.100.7");
    assert_eq!(set[0].identity(), Some("42"));
}

#[tokio::test]
async fn set_mixed_batch_lists_once() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "matched", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![
        a_record("keyed", "192.0.2.5", Some("7")),
        a_record("matched", "192.0.2.6", None),
        a_record("fresh", "192.0.2.7", None),
    ];
    let set = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    assert_eq!(transport.call_count("list-records"), 1);
    assert_eq!(transport.call_count("edit-record"), 2);
    assert_eq!(transport.call_count("add-record"), 1);

    let ids: Vec<_> = set.iter().filter_map(|r| r.identity()).collect();
    assert_eq!(ids, vec!["7", "42", "new-1"]);
}

#[tokio::test]
async fn set_match_on_generic_record_is_inconsistent() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![RemoteRecord {
        id: "99".to_string(),
        domain: "example.com".to_string(),
        rtype: "NS".to_string(),
        name: "sub".to_string(),
        content: "ns1.example.net".to_string(),
        ttl: 3600,
        ..Default::default()
    }]);
    let engine = engine(transport.clone());

    let records = vec![Record::Generic(Generic {
        name: "sub".to_string(),
        ttl: Duration::from_secs(3600),
        rtype: "NS".to_string(),
        data: "ns2.example.net".to_string(),
    })];
    let err = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect_err("generic match has no identity");

    assert!(err.completed.is_empty());
    assert!(matches!(err.error, Error::Inconsistent(_)));
    assert!(err.to_string().contains("missing ID for existing record sub|NS"));
    assert_eq!(transport.call_count("edit-record"), 0);
    assert_eq!(transport.call_count("add-record"), 0);
}

#[tokio::test]
async fn zone_trailing_dot_is_normalized() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "test", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![a_record("test.example.com.", "192.0.2.9", None)];
    engine
        .set_records(&CallContext::new(), "example.com.", &records)
        .await
        .expect("set succeeds");

    let list = &transport.calls_to("list-records")[0];
    assert_eq!(list.params, json!({ "domain": "example.com" }));
    let edit = &transport.calls_to("edit-record")[0];
    assert_eq!(edit.params["domain"], "example.com");
    assert_eq!(edit.params["id"], "42");
}

#[tokio::test]
async fn key_shaped_identity_is_treated_as_absent() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "test", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![a_record("test", "192.0.2.3", Some("test|A"))];
    engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    assert_eq!(transport.call_count("list-records"), 1);
    let edit = &transport.calls_to("edit-record")[0];
    assert_eq!(edit.params["id"], "42");
}

#[tokio::test]
async fn duplicate_keys_in_one_set_edit_same_record() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "test", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![
        a_record("test", "192.0.2.3", None),
        a_record("test", "192.0.2.4", None),
    ];
    let set = engine
        .set_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("set succeeds");

    let edits = transport.calls_to("edit-record");
    assert_eq!(edits.len(), 2);
    assert!(edits.iter().all(|c| c.params["id"] == "42"));
    assert_eq!(transport.call_count("add-record"), 0);
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn delete_without_match_is_noop() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "other", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![a_record("missing", "192.0.2.1", None)];
    let deleted = engine
        .delete_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("delete succeeds");

    assert!(deleted.is_empty());
    assert_eq!(transport.call_count("remove-record"), 0);
}

#[tokio::test]
async fn delete_with_identity_removes_directly() {
    let transport = Arc::new(MockTransport::echoing());
    let engine = engine(transport.clone());

    let records = vec![a_record("www", "192.0.2.1", Some("rec-9"))];
    let deleted = engine
        .delete_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("delete succeeds");

    assert_eq!(transport.call_count("list-records"), 0);
    let removes = transport.calls_to("remove-record");
    assert_eq!(removes.len(), 1);
    assert_eq!(
        removes[0].params,
        json!({ "domain": "example.com", "id": "rec-9" })
    );
    assert_eq!(deleted, records);
}

#[tokio::test]
async fn delete_by_key_returns_caller_record() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "test", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![a_record("test.example.com", "192.0.2.1", None)];
    let deleted = engine
        .delete_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("delete succeeds");

    let removes = transport.calls_to("remove-record");
    assert_eq!(removes.len(), 1);
    assert_eq!(removes[0].params["id"], "42");
    assert_eq!(deleted, records);
    assert_eq!(deleted[0].identity(), None);
}

#[tokio::test]
async fn delete_same_record_twice_removes_once() {
    let transport = Arc::new(MockTransport::echoing());
    transport.set_existing(vec![remote_a("42", "test", "192.0.2.1")]);
    let engine = engine(transport.clone());

    let records = vec![
        a_record("test", "192.0.2.1", Some("42")),
        a_record("test", "192.0.2.1", None),
    ];
    let deleted = engine
        .delete_records(&CallContext::new(), "example.com", &records)
        .await
        .expect("delete succeeds");

    assert_eq!(transport.call_count("remove-record"), 1);
    assert_eq!(deleted.len(), 1);
}

#[tokio::test]
async fn list_decodes_every_record() {
    let transport = Arc::new(MockTransport::new());
    transport.set_existing(vec![
        remote_a("1", "@", "192.0.2.1"),
        RemoteRecord {
            id: "2".to_string(),
            domain: "example.com".to_string(),
            rtype: "TXT".to_string(),
            name: "@".to_string(),
            content: "v=spf1 -all".to_string(),
            ttl: 300,
            ..Default::default()
        },
    ]);
    let engine = engine(transport.clone());

    let records = engine
        .list_records(&CallContext::new(), "example.com")
        .await
        .expect("list succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].record_type(), "A");
    assert_eq!(records[1].record_type(), "TXT");
    assert_eq!(records[1].ttl(), Duration::from_secs(300));
}

#[tokio::test]
async fn list_fails_whole_on_one_bad_record() {
    let transport = Arc::new(MockTransport::new());
    transport.set_existing(vec![
        remote_a("1", "@", "192.0.2.1"),
        remote_a("2", "www", "not-an-ip"),
    ]);
    let engine = engine(transport.clone());

    let err = engine
        .list_records(&CallContext::new(), "example.com")
        .await
        .expect_err("bad address fails the listing");

    assert!(matches!(err.root(), Error::Conversion(_)));
    let message = err.to_string();
    assert!(message.contains("failed to convert record"));
    assert!(message.contains("invalid A record IP address \"not-an-ip\""));
}

#[tokio::test]
async fn list_of_empty_zone_is_empty() {
    let transport = Arc::new(MockTransport::new());
    transport.set_response("list-records", json!({}));
    let engine = engine(transport.clone());

    let records = engine
        .list_records(&CallContext::new(), "example.com")
        .await
        .expect("list succeeds");

    assert!(records.is_empty());
}
