//! Conditions evaluated end to end: abstract condition -> native query -> in-memory backend.

use search_gateway::{
    Condition, Document, GatewayConfig, InMemoryConnection, SearchTableGateway, SortField,
    TableGateway, WriteOptions,
};
use serde_json::json;

fn catalog() -> SearchTableGateway<InMemoryConnection> {
    let gateway = SearchTableGateway::from_config(
        InMemoryConnection::new(),
        GatewayConfig::new("products", "_doc"),
    );
    for product in [
        json!({
            "_id": "p1", "name": "red apple", "price": 3,
            "tags": ["fruit", "red"], "stock": 10
        }),
        json!({"_id": "p2", "name": "green apple", "price": 4, "tags": ["fruit"], "stock": 0}),
        json!({"_id": "p3", "name": "banana", "price": 2, "tags": ["fruit", "yellow"]}),
        json!({
            "_id": "p4", "name": "red pepper", "price": 5,
            "tags": ["vegetable", "red"], "stock": null
        }),
        json!({"_id": "p5", "name": "carrot", "price": 1, "tags": ["vegetable"], "stock": 7}),
    ] {
        gateway
            .insert(Document::from_value(product).unwrap(), &WriteOptions::new())
            .unwrap();
    }
    gateway
}

fn ids(gateway: &impl TableGateway, cond: Condition) -> Vec<String> {
    gateway
        .query_all(&cond, &[SortField::asc("price")], 0, 0, &[])
        .unwrap()
        .into_iter()
        .map(|d| d.id().unwrap().to_string())
        .collect()
}

#[test]
fn equality_and_membership() {
    let g = catalog();
    assert_eq!(ids(&g, Condition::eq("tags", "red")), ["p1", "p4"]);
    assert_eq!(ids(&g, Condition::is_in("price", [1, 5])), ["p5", "p4"]);
    assert_eq!(ids(&g, Condition::not_in("tags", ["fruit"])), ["p5", "p4"]);
    assert_eq!(ids(&g, Condition::ne("tags", "fruit")), ["p5", "p4"]);
    assert_eq!(ids(&g, Condition::is_in("_id", ["p2", "p3"])), ["p3", "p2"]);
}

#[test]
fn hash_conditions() {
    let g = catalog();
    assert_eq!(
        ids(&g, Condition::from_value(json!({"tags": "red", "price": 3}))),
        ["p1"]
    );
    assert_eq!(
        ids(&g, Condition::from_value(json!({"stock": null}))),
        ["p3", "p4"]
    );
    assert!(ids(&g, Condition::from_value(json!({"_id": null}))).is_empty());
}

#[test]
fn ranges() {
    let g = catalog();
    assert_eq!(ids(&g, Condition::gt("price", 3)), ["p2", "p4"]);
    assert_eq!(ids(&g, Condition::lte("price", 2)), ["p5", "p3"]);
    assert_eq!(ids(&g, Condition::between("price", 2, 4)), ["p3", "p1", "p2"]);
    assert_eq!(
        ids(&g, Condition::from_value(json!(["not between", "price", 2, 4]))),
        ["p5", "p4"]
    );
}

#[test]
fn patterns_and_presence() {
    let g = catalog();
    assert_eq!(ids(&g, Condition::like("name", "apple")), ["p1", "p2"]);
    assert_eq!(ids(&g, Condition::like("name", "red%")), ["p1", "p4"]);
    assert_eq!(ids(&g, Condition::exists("stock")), ["p5", "p1", "p2"]);
}

#[test]
fn logical_composition() {
    let g = catalog();
    let cheap_fruit_or_red = Condition::or([
        Condition::and([Condition::eq("tags", "fruit"), Condition::lt("price", 4)]),
        Condition::eq("tags", "red"),
    ]);
    assert_eq!(ids(&g, cheap_fruit_or_red), ["p3", "p1", "p4"]);

    let not_in_stock = Condition::not(Condition::gt("stock", 0));
    assert_eq!(ids(&g, not_in_stock), ["p3", "p2", "p4"]);
}

#[test]
fn empty_condition_matches_everything() {
    let g = catalog();
    for cond in [
        Condition::all(),
        Condition::from_value(json!({})),
        Condition::from_value(json!([])),
        Condition::and([]),
    ] {
        assert_eq!(ids(&g, cond).len(), 5);
    }
}
