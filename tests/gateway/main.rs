//! Integration tests for the table gateway.


use search_gateway::{
    BackendError, Condition, DefaultQueryFactory, Document, DocumentId, GatewayConfig,
    GatewayError, InMemoryConnection, QueryError, SearchConditionBuilder, SearchTableGateway,
    SortField, TableGateway, ValidationKind, WriteOptions,
};
use serde_json::json;
use support::{init_logging, Call, RecordingConnection};

fn users(connection: InMemoryConnection) -> SearchTableGateway<InMemoryConnection> {
    SearchTableGateway::from_config(connection, GatewayConfig::new("users", "user"))
}

fn recording(connection: RecordingConnection) -> SearchTableGateway<RecordingConnection> {
    SearchTableGateway::new(
        connection,
        DefaultQueryFactory,
        SearchConditionBuilder,
        "users",
        "user",
    )
}

fn seed(gateway: &impl TableGateway, people: &[(&str, i64)]) {
    for (name, age) in people {
        gateway
            .insert(
                Document::new().with("name", *name).with("age", *age),
                &WriteOptions::new(),
            )
            .unwrap();
    }
}

#[test]
fn document_lifecycle() {
    init_logging();
    let conn = InMemoryConnection::with_manual_refresh();
    let gateway = users(conn.clone());

    let id = gateway
        .insert(Document::new().with("name", "a"), &WriteOptions::new())
        .unwrap();

    // not searchable until the backend refreshes
    assert!(gateway.query_one(&Condition::id(id.as_str()), &[]).unwrap().is_none());
    conn.refresh().unwrap();
    let found = gateway
        .query_one(&Condition::id(id.as_str()), &[])
        .unwrap()
        .unwrap();
    assert_eq!(found, Document::new().with_id(id.clone()).with("name", "a"));

    gateway
        .update_one(
            Document::new().with_id(id.clone()).with("name", "b"),
            &WriteOptions::new(),
        )
        .unwrap();
    conn.refresh().unwrap();
    let found = gateway
        .query_one(&Condition::id(id.as_str()), &[])
        .unwrap()
        .unwrap();
    assert_eq!(found.to_value(), json!({"_id": id.as_str(), "name": "b"}));

    gateway
        .delete_one(&Document::new().with_id(id.clone()), &WriteOptions::new())
        .unwrap();
    conn.refresh().unwrap();
    assert!(gateway.query_one(&Condition::id(id.as_str()), &[]).unwrap().is_none());
}

#[test]
fn insert_uses_explicit_id_and_keeps_it_out_of_fields() {
    let gateway = recording(RecordingConnection::new());
    let id = gateway
        .insert(
            Document::from_value(json!({"_id": "x1", "name": "a"})).unwrap(),
            &WriteOptions::new(),
        )
        .unwrap();
    assert_eq!(id, DocumentId::from("x1"));

    match &gateway.connection().calls()[0] {
        Call::Insert {
            collection,
            document_type,
            fields,
            id,
            ..
        } => {
            assert_eq!(collection, "users");
            assert_eq!(document_type, "user");
            assert_eq!(id.as_ref().map(DocumentId::as_str), Some("x1"));
            assert!(!fields.contains_key("_id"));
            assert_eq!(fields.get("name"), Some(&json!("a")));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn insert_without_id_lets_backend_generate_one() {
    let gateway = recording(RecordingConnection::new());
    let id = gateway
        .insert(Document::new().with("name", "a"), &WriteOptions::new())
        .unwrap();
    assert_eq!(id.as_str(), "generated-1");
    assert!(matches!(
        &gateway.connection().calls()[0],
        Call::Insert { id: None, .. }
    ));
}

#[test]
fn update_and_delete_without_id_fail_before_any_call() {
    let gateway = recording(RecordingConnection::new());

    for data in [
        Document::new().with("name", "b"),
        Document::new().with_id("").with("name", "b"),
    ] {
        let err = gateway
            .update_one(data.clone(), &WriteOptions::new())
            .unwrap_err();
        match err {
            GatewayError::Validation(e) => {
                assert_eq!(e.kind, ValidationKind::Update);
                assert_eq!(e.document, data);
                assert_eq!(e.reason, "Primary key _id not provided");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = gateway.delete_one(&data, &WriteOptions::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            err,
            GatewayError::Validation(ref e) if e.kind == ValidationKind::Delete
        ));
    }

    assert!(gateway.connection().calls().is_empty());
}

#[test]
fn update_strips_id_and_forwards_fields() {
    let gateway = recording(RecordingConnection::new());
    gateway
        .update_one(
            Document::new().with_id("x1").with("name", "b"),
            &WriteOptions::new(),
        )
        .unwrap();

    match &gateway.connection().calls()[0] {
        Call::Update { id, fields, .. } => {
            assert_eq!(id.as_str(), "x1");
            assert_eq!(fields, json!({"name": "b"}).as_object().unwrap());
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn write_options_are_forwarded_unchanged() {
    let gateway = recording(RecordingConnection::new());
    let options = WriteOptions::new()
        .with("refresh", "wait_for")
        .with("wait_for_active_shards", 2)
        .with("x-custom", json!({"nested": [1, 2]}));

    gateway
        .insert(Document::new().with("a", 1), &options)
        .unwrap();
    gateway
        .update_one(Document::new().with_id("x").with("a", 2), &options)
        .unwrap();
    gateway
        .delete_one(&Document::new().with_id("x"), &options)
        .unwrap();

    for call in gateway.connection().calls() {
        let forwarded = match call {
            Call::Insert { options, .. }
            | Call::Update { options, .. }
            | Call::Delete { options, .. } => options,
            other => panic!("unexpected call {:?}", other),
        };
        assert_eq!(forwarded, options);
    }
}

#[test]
fn query_all_without_limit_applies_no_pagination() {
    let gateway = recording(RecordingConnection::new());
    gateway
        .query_all(&Condition::all(), &[], 0, 10, &[])
        .unwrap();

    let request = gateway.connection().last_search();
    assert_eq!(request.limit, None);
    assert_eq!(request.offset, None);
    assert!(request.query.is_match_all());
    assert!(request.sort.is_empty());
}

#[test]
fn query_all_passes_window_and_order_through() {
    let gateway = recording(RecordingConnection::new());
    let order = vec![SortField::desc("age"), SortField::asc("name")];
    gateway
        .query_all(&Condition::eq("name", "a"), &order, 5, 10, &["friends"])
        .unwrap();

    let request = gateway.connection().last_search();
    assert_eq!(request.collection, "users");
    assert_eq!(request.limit, Some(5));
    assert_eq!(request.offset, Some(10));
    assert_eq!(request.sort, order);
    assert_eq!(request.query.as_value(), &json!({"term": {"name": "a"}}));
}

#[test]
fn query_all_filters_sorts_and_pages() {
    let gateway = users(InMemoryConnection::new());
    seed(
        &gateway,
        &[("ann", 31), ("bob", 17), ("cid", 45), ("dee", 22), ("eve", 38)],
    );

    let adults = gateway
        .query_all(
            &Condition::gte("age", 18),
            &[SortField::desc("age")],
            2,
            1,
            &[],
        )
        .unwrap();
    let names: Vec<_> = adults.iter().map(|d| d.get("name").unwrap().clone()).collect();
    assert_eq!(names, vec![json!("eve"), json!("ann")]);
    assert!(adults.iter().all(|d| d.id().is_some()));

    let none = gateway
        .query_all(&Condition::gt("age", 100), &[], 0, 0, &[])
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn query_one_returns_none_when_nothing_matches() {
    let gateway = users(InMemoryConnection::new());
    seed(&gateway, &[("ann", 31)]);
    assert!(gateway
        .query_one(&Condition::eq("name", "zed"), &[])
        .unwrap()
        .is_none());
    assert!(gateway
        .query_one(&Condition::eq("name", "ann"), &[])
        .unwrap()
        .is_some());
}

#[test]
fn query_one_asks_for_a_single_hit() {
    let hit = Document::new().with_id("x1").with("name", "a");
    let gateway = recording(RecordingConnection::new().with_hits(vec![
        hit.clone(),
        Document::new().with_id("x2").with("name", "a"),
    ]));

    let found = gateway
        .query_one(&Condition::eq("name", "a"), &["profile"])
        .unwrap();
    assert_eq!(found, Some(hit));

    let request = gateway.connection().last_search();
    assert_eq!(request.limit, Some(1));
    assert_eq!(request.offset, None);
}

#[test]
fn aggregate_count_is_monotonic_under_added_constraints() {
    let gateway = users(InMemoryConnection::new());
    seed(&gateway, &[("ann", 31), ("bob", 17), ("cid", 45)]);

    let all = gateway.aggregate_count("", &Condition::all()).unwrap();
    assert_eq!(all, "3");

    for cond in [
        Condition::gte("age", 18),
        Condition::is_in("name", ["bob", "zed"]),
        Condition::and([Condition::gte("age", 18), Condition::lt("age", 40)]),
        Condition::not(Condition::all()),
    ] {
        let filtered: u64 = gateway.aggregate_count("name", &cond).unwrap().parse().unwrap();
        assert!(filtered <= 3);
    }
    assert_eq!(gateway.aggregate_count("", &Condition::gte("age", 18)).unwrap(), "2");
}

#[test]
fn aggregate_count_counts_every_match() {
    let gateway = recording(RecordingConnection::new().with_count(7));
    let count = gateway
        .aggregate_count("email", &Condition::eq("active", true))
        .unwrap();
    assert_eq!(count, "7");

    match &gateway.connection().calls()[0] {
        Call::Count { collection, query } => {
            assert_eq!(collection, "users");
            assert_eq!(query.as_value(), &json!({"term": {"active": true}}));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn delete_all_returns_backend_total() {
    let gateway = users(InMemoryConnection::new());
    seed(&gateway, &[("ann", 31), ("bob", 17), ("cid", 45)]);

    let deleted = gateway.delete_all(&Condition::gte("age", 18)).unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(gateway.aggregate_count("*", &Condition::all()).unwrap(), "1");
}

#[test]
fn delete_all_reaches_documents_of_every_type() {
    let conn = InMemoryConnection::new();
    let legacy =
        SearchTableGateway::from_config(conn.clone(), GatewayConfig::new("users", "legacy"));
    let current = SearchTableGateway::from_config(conn, GatewayConfig::new("users", "_doc"));
    legacy
        .insert(Document::new().with("name", "ann"), &WriteOptions::new())
        .unwrap();

    assert_eq!(current.aggregate_count("*", &Condition::all()).unwrap(), "1");
    assert_eq!(current.delete_all(&Condition::all()).unwrap(), 1);
    assert_eq!(current.aggregate_count("*", &Condition::all()).unwrap(), "0");
    assert!(legacy
        .query_all(&Condition::all(), &[], 0, 0, &[])
        .unwrap()
        .is_empty());
}

#[test]
fn delete_all_counts_only_documents_still_stored() {
    let conn = InMemoryConnection::with_manual_refresh();
    let gateway = users(conn.clone());
    let first = gateway
        .insert(Document::new().with("name", "ann"), &WriteOptions::new())
        .unwrap();
    gateway
        .insert(Document::new().with("name", "bob"), &WriteOptions::new())
        .unwrap();
    conn.refresh().unwrap();

    gateway
        .delete_one(&Document::new().with_id(first), &WriteOptions::new())
        .unwrap();
    assert_eq!(gateway.delete_all(&Condition::all()).unwrap(), 1);
    assert_eq!(conn.stored_count("users"), 0);
}

#[test]
fn delete_all_sends_native_query_body() {
    let gateway = recording(RecordingConnection::new().with_delete_response(json!({"total": 3})));
    assert_eq!(gateway.delete_all(&Condition::all()).unwrap(), 3);

    match &gateway.connection().calls()[0] {
        Call::DeleteByQuery {
            collection,
            document_type,
            body,
        } => {
            assert_eq!(collection, "users");
            assert_eq!(document_type, "user");
            assert_eq!(body, &json!({"query": {"match_all": {}}}));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn delete_all_without_total_reports_zero() {
    init_logging();
    for response in [json!([]), json!(null), json!({"deleted": 4})] {
        let gateway = recording(RecordingConnection::new().with_delete_response(response));
        assert_eq!(gateway.delete_all(&Condition::eq("a", 1)).unwrap(), 0);
    }
}

#[test]
fn unsupported_operations_always_fail() {
    let gateway = recording(RecordingConnection::new());
    let any = Condition::eq("a", 1);

    let results = [
        gateway.update_all(&Document::new().with("a", 2), &any).map(|n| n.to_string()),
        gateway.aggregate("age", "sum", &any),
        gateway.aggregate_sum("age", &any),
        gateway.aggregate_average("age", &Condition::all()),
        gateway.aggregate_min("age", &any),
        gateway.aggregate_max("", &Condition::all()),
    ];
    for result in results {
        assert!(result.unwrap_err().is_not_implemented());
    }
    assert!(gateway.connection().calls().is_empty());
}

#[test]
fn unsupported_condition_fails_before_io() {
    let gateway = recording(RecordingConnection::new());
    let cond = Condition::from_value(json!(["near", "location", "52.1,4.3"]));

    assert!(matches!(
        gateway.query_one(&cond, &[]),
        Err(GatewayError::Condition(_))
    ));
    assert!(matches!(
        gateway.query_all(&cond, &[], 0, 0, &[]),
        Err(GatewayError::Condition(_))
    ));
    assert!(matches!(
        gateway.aggregate_count("*", &cond),
        Err(GatewayError::Condition(_))
    ));
    assert!(matches!(
        gateway.delete_all(&cond),
        Err(GatewayError::Condition(_))
    ));
    assert!(gateway.connection().calls().is_empty());
}

#[test]
fn backend_failures_are_wrapped_with_context() {
    let conn = InMemoryConnection::new();
    let gateway = users(conn.clone());

    conn.fail_next(BackendError::Timeout("search took 30s".into())).unwrap();
    match gateway.query_all(&Condition::all(), &[], 0, 0, &[]) {
        Err(GatewayError::QueryExecution {
            operation,
            collection,
            source,
        }) => {
            assert_eq!(operation, "query_all");
            assert_eq!(collection, "users");
            assert_eq!(
                source,
                QueryError::Backend(BackendError::Timeout("search took 30s".into()))
            );
        }
        other => panic!("unexpected result {:?}", other),
    }

    conn.fail_next(BackendError::Unavailable("connection refused".into())).unwrap();
    let err = gateway.aggregate_count("*", &Condition::all()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "aggregate_count on users failed: backend unavailable: connection refused"
    );

    conn.fail_next(BackendError::MalformedQuery("bad".into())).unwrap();
    assert!(matches!(
        gateway.delete_all(&Condition::all()),
        Err(GatewayError::QueryExecution { operation: "delete_all", .. })
    ));

    conn.fail_next(BackendError::Other("disk full".into())).unwrap();
    assert!(matches!(
        gateway.insert(Document::new().with("a", 1), &WriteOptions::new()),
        Err(GatewayError::QueryExecution { operation: "insert", .. })
    ));
}

#[test]
fn update_and_delete_of_missing_document_surface_not_found() {
    let gateway = users(InMemoryConnection::new());

    let err = gateway
        .update_one(Document::new().with_id("ghost").with("a", 1), &WriteOptions::new())
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::NotFound {
            collection: "users".into(),
            id: "ghost".into()
        }
    );

    let err = gateway
        .delete_one(&Document::new().with_id("ghost"), &WriteOptions::new())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn gateway_is_shared_across_threads() {
    let gateway = users(InMemoryConnection::new());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let gateway = &gateway;
            scope.spawn(move || {
                for n in 0..25 {
                    gateway
                        .insert(
                            Document::new().with("worker", worker).with("n", n),
                            &WriteOptions::new(),
                        )
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(gateway.aggregate_count("*", &Condition::all()).unwrap(), "100");
    assert_eq!(
        gateway
            .aggregate_count("*", &Condition::eq("worker", 2))
            .unwrap(),
        "25"
    );
}

#[test]
fn gateway_from_json_config() {
    let config = GatewayConfig::from_json(r#"{"collection_name": "orders"}"#).unwrap();
    let gateway = SearchTableGateway::from_config(InMemoryConnection::new(), config);
    assert_eq!(gateway.collection_name(), "orders");
    assert_eq!(gateway.document_type(), "_doc");
}
