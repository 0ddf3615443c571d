//! Integration tests for resource proxies against a mock Wallaroo service

use httpmock::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use wallaroo_core::{
    Connection, ConnectionOptions, Error, ProxyState, Resource, ResourceRegistry, RevisionKind,
    RevisionSelector, User,
};

wallaroo_core::resource! {
    /// Queue with a server-maintained depth.
    struct Queue: "queue" {
        attributes: [name, durable],
        read_only: [depth],
    }
}

/// Connect to the mock server, optionally pinned with `(kind, value)`.
fn connect(server: &MockServer, pin: Option<(&str, &str)>) -> Arc<Connection> {
    let mut options = ConnectionOptions::from_pairs([
        ("host", server.host()),
        ("port", server.port().to_string()),
    ])
    .unwrap();
    if let Some((kind, value)) = pin {
        options = options.merge(ConnectionOptions::from_pairs([(kind, value)]).unwrap());
    }
    Connection::configure(options).unwrap()
}

#[test]
fn test_create_under_tag_sticks_to_commit() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(PUT)
            .path("/users/alice")
            .query_param("tag", "current")
            .header("content-type", "application/json")
            .json_body(json!({"name": "alice", "role": "admin"}));
        then.status(201).header("location", "/users/alice?commit=deadbeef");
    });

    let conn = connect(&server, Some(("tag", "current")));
    let mut user: User = conn.resource("alice").unwrap();
    user.set_role("admin").create().unwrap();

    create.assert();
    assert_eq!(conn.revision(), RevisionSelector::commit("deadbeef").unwrap());
    assert!(user.proxy_mut().url().as_str().ends_with("commit=deadbeef"));
    assert!(conn.build_url("/users/alice").as_str().ends_with("commit=deadbeef"));
    assert_eq!(user.proxy().state(), ProxyState::Persisted);
}

#[test]
fn test_create_under_branch_keeps_branch() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(PUT).path("/users/alice").query_param("branch", "dev");
        then.status(201).header("location", "/users/alice?commit=deadbeef");
    });

    let conn = connect(&server, Some(("branch", "dev")));
    let mut user: User = conn.resource("alice").unwrap();
    user.set_role("admin").create().unwrap();

    create.assert();
    let revision = conn.revision();
    assert_eq!(revision.kind(), RevisionKind::Branch);
    assert_eq!(revision.value(), "dev");
    assert_eq!(conn.revision_generation(), 0);
    assert!(user.proxy_mut().url().as_str().ends_with("branch=dev"));
}

#[test]
fn test_create_then_refresh_round_trip() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(PUT).path("/users/alice").query_param("tag", "current");
        then.status(201).header("location", "/users/alice?commit=abc123");
    });
    let fetch = server.mock(|when, then| {
        when.method(GET).path("/users/alice").query_param("commit", "abc123");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"name": "alice", "role": "admin", "password_hash": "xyz"}));
    });

    let conn = connect(&server, None);
    let mut user: User = conn.resource("alice").unwrap();
    user.set_role("admin").create().unwrap().refresh().unwrap();

    create.assert();
    fetch.assert();
    assert_eq!(
        Value::Object(user.proxy().attributes().clone()),
        json!({"name": "alice", "role": "admin"})
    );
    assert_eq!(user.proxy().state(), ProxyState::Cached);
}

#[test]
fn test_refresh_unsets_missing_attributes() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users/bob");
        then.status(200).json_body(json!({"name": "bob", "role": null}));
    });

    let conn = connect(&server, None);
    let mut user: User = conn.resource("bob").unwrap();
    user.set_role("stale");
    user.refresh().unwrap();

    assert_eq!(user.name(), Some(&Value::from("bob")));
    assert_eq!(user.role(), None);
}

#[test]
fn test_failed_refresh_leaves_cache_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users/alice");
        then.status(500).body("boom");
    });
    server.mock(|when, then| {
        when.method(GET).path("/users/carol");
        then.status(204);
    });
    server.mock(|when, then| {
        when.method(GET).path("/users/dave");
        then.status(200).body("not json");
    });

    let conn = connect(&server, None);

    let mut alice: User = conn.resource("alice").unwrap();
    alice.set_role("admin");
    let before = alice.proxy().attributes().clone();
    let err = alice.refresh().unwrap_err();
    assert!(matches!(&err, Error::Remote { status, body } if status.as_u16() == 500 && body == "boom"));
    assert_eq!(alice.proxy().attributes(), &before);
    assert_eq!(alice.proxy().state(), ProxyState::Dirty);

    let mut carol: User = conn.resource("carol").unwrap();
    let err = carol.refresh().unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(204));
    assert_eq!(carol.name(), Some(&Value::from("carol")));

    let mut dave: User = conn.resource("dave").unwrap();
    let err = dave.refresh().unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(dave.name(), Some(&Value::from("dave")));
}

#[test]
fn test_exists_only_false_on_404() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users/ghost");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/users/alice");
        then.status(200).json_body(json!({"name": "alice"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/users/broken");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/users/secret");
        then.status(403);
    });

    let conn = connect(&server, None);
    for (name, expected) in [("ghost", false), ("alice", true), ("broken", true), ("secret", true)] {
        let mut user: User = conn.resource(name).unwrap();
        assert_eq!(user.exists().unwrap(), expected, "exists() for {}", name);
    }
}

#[test]
fn test_failed_write_leaves_pin_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path("/users/alice");
        then.status(409)
            .header("location", "/users/alice?commit=ffff")
            .body("conflict");
    });

    let conn = connect(&server, None);
    let mut user: User = conn.resource("alice").unwrap();
    let err = user.set_role("admin").update().unwrap_err();

    assert!(matches!(&err, Error::Remote { body, .. } if body == "conflict"));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(conn.revision(), RevisionSelector::default());
    assert_eq!(conn.revision_generation(), 0);
    assert_eq!(user.proxy().state(), ProxyState::Dirty);
}

#[test]
fn test_write_without_location_keeps_pin() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PUT).path("/users/alice").query_param("commit", "0123abcd");
        then.status(204);
    });

    let conn = connect(&server, Some(("commit", "0123abcd")));
    let mut user: User = conn.resource("alice").unwrap();
    user.set_role("ops").update().unwrap();

    update.assert();
    assert_eq!(conn.revision(), RevisionSelector::commit("0123abcd").unwrap());
}

#[test]
fn test_pin_is_shared_between_proxies() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path("/users/alice");
        then.status(200).header("location", "http://wallaby/users/alice?commit=beef01");
    });
    let fetch_bob = server.mock(|when, then| {
        when.method(GET).path("/users/bob").query_param("commit", "beef01");
        then.status(200).json_body(json!({"name": "bob", "role": "reader"}));
    });

    let conn = connect(&server, None);
    let mut alice: User = conn.resource("alice").unwrap();
    let mut bob: User = conn.resource("bob").unwrap();
    assert!(bob.proxy_mut().url().as_str().ends_with("tag=current"));

    alice.set_role("admin").create().unwrap();
    bob.refresh().unwrap();

    fetch_bob.assert();
    assert_eq!(bob.role(), Some(&Value::from("reader")));
}

#[test]
fn test_untyped_proxy() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/users/carol")
            .json_body(json!({"name": "carol", "role": "ops"}));
        then.status(200).header("location", "/users/carol?commit=c0ffee");
    });

    let conn = connect(&server, None);
    let mut proxy = conn.create_proxy("user", "carol").unwrap();
    proxy.set("role", "ops").unwrap();
    assert!(matches!(proxy.set("shoe_size", 44), Err(Error::UnknownAttribute { .. })));
    proxy.update().unwrap();

    update.assert();
    assert_eq!(conn.revision().value(), "c0ffee");

    let user: User = proxy.into_resource().unwrap();
    assert_eq!(user.role(), Some(&Value::from("ops")));
}

#[test]
fn test_list_users() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/users").query_param("tag", "current");
        then.status(200).json_body(json!({
            "alice": {"role": "admin"},
            "bob": {"role": "reader"}
        }));
    });

    let conn = connect(&server, None);
    let users = conn.list("user").unwrap();

    list.assert();
    assert_eq!(users.len(), 2);
    assert_eq!(users["alice"], json!({"role": "admin"}));
    assert_eq!(users.keys().collect::<Vec<_>>(), vec!["alice", "bob"]);
}

#[test]
fn test_list_surfaces_remote_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(403).body("secret required");
    });

    let conn = connect(&server, None);
    let err = conn.list("user").unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
    assert!(err.to_string().contains("secret required"));
}

#[test]
fn test_read_only_attribute_refreshes_but_rejects_set() {
    let server = MockServer::start();
    let fetch = server.mock(|when, then| {
        when.method(GET).path("/queues/orders").query_param("tag", "current");
        then.status(200)
            .json_body(json!({"name": "orders", "durable": true, "depth": 17}));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/queues/orders")
            .json_body(json!({"name": "orders", "durable": false, "depth": 17}));
        then.status(204);
    });

    let mut registry = ResourceRegistry::default();
    registry.register::<Queue>().unwrap();
    let options = ConnectionOptions::from_pairs([
        ("host", server.host()),
        ("port", server.port().to_string()),
    ])
    .unwrap();
    let conn = Connection::with_registry(options, registry).unwrap();
    let mut queue: Queue = conn.resource("orders").unwrap();

    assert!(Queue::schema().is_read_only("depth"));
    assert_eq!(queue.depth(), None);
    let err = queue.proxy_mut().set("depth", 3).unwrap_err();
    assert!(matches!(err, Error::ReadOnlyAttribute { kind: "queue", ref name } if name == "depth"));
    assert_eq!(queue.proxy().state(), ProxyState::Unbound);

    queue.refresh().unwrap();
    fetch.assert();
    assert_eq!(queue.depth(), Some(&json!(17)));
    assert_eq!(queue.durable(), Some(&json!(true)));

    queue.set_durable(false).update().unwrap();
    update.assert();
    assert_eq!(queue.depth(), Some(&json!(17)));
}
