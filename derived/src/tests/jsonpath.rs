use crate::query::{JsonPath, QueryBackend, QueryError};
use serde_json::{json, Value};

fn people() -> Value {
    json!({
        "people": [
            {"name": "Alice", "age": 30, "email": "alice@example.com"},
            {"name": "Bob", "age": 40},
            {"name": "Cindy", "age": 50, "email": "cindy@example.org"}
        ],
        "store": {
            "book": [
                {"title": "A", "price": 8.95},
                {"title": "B", "price": 12.99},
                {"title": "C", "price": 22.99}
            ],
            "bicycle": {"price": 19.95}
        },
        "error_counts": {"5xx": 13, "4xx": 2}
    })
}

fn list(expression: &str) -> Vec<Value> {
    JsonPath.evaluate_list(expression, &people()).unwrap()
}

#[test]
fn test_child_and_index() {
    assert_eq!(list("$.people[0].name"), vec![json!("Alice")]);
    assert_eq!(list("$.people[-1].name"), vec![json!("Cindy")]);
    assert_eq!(list("$.people[7].name"), Vec::<Value>::new());
}

#[test]
fn test_wildcard_in_document_order() {
    assert_eq!(
        list("$.people[*].age"),
        vec![json!(30), json!(40), json!(50)]
    );
    assert_eq!(list("$.error_counts.*"), vec![json!(13), json!(2)]);
}

#[test]
fn test_quoted_member_names() {
    assert_eq!(list("$.error_counts['5xx']"), vec![json!(13)]);
    assert_eq!(list("$[\"error_counts\"][\"4xx\"]"), vec![json!(2)]);
}

#[test]
fn test_slices_and_unions() {
    assert_eq!(list("$.people[0:2].name"), vec![json!("Alice"), json!("Bob")]);
    assert_eq!(list("$.people[-2:].name"), vec![json!("Bob"), json!("Cindy")]);
    assert_eq!(list("$.people[::-1].age"), vec![json!(50), json!(40), json!(30)]);
    assert_eq!(list("$.people[0,2].name"), vec![json!("Alice"), json!("Cindy")]);
}

#[test]
fn test_slices_with_extreme_steps() {
    let doc = json!({"a": [1, 2, 3, 4, 5]});
    assert_eq!(
        JsonPath.evaluate_list("$.a[1:5:9223372036854775807]", &doc).unwrap(),
        vec![json!(2)]
    );
    assert_eq!(
        JsonPath.evaluate_list("$.a[::-9223372036854775808]", &doc).unwrap(),
        vec![json!(5)]
    );
}

#[test]
fn test_dashed_member_names() {
    let doc = json!({
        "vendor-name": "Acme",
        "people": [{"first-name": "x", "age": 3}, {"first-name": "y", "age": 4}]
    });
    assert_eq!(JsonPath.evaluate_list("$.vendor-name", &doc).unwrap(), vec![json!("Acme")]);
    assert_eq!(
        JsonPath.evaluate_list("$.people[?first-name == 'x'].age", &doc).unwrap(),
        vec![json!(3)]
    );
    assert_eq!(
        JsonPath.evaluate_list("$.people[*].age-1", &doc).unwrap(),
        vec![json!(2), json!(3)]
    );
}

#[test]
fn test_numbers_beyond_decimal_range() {
    let doc = json!({"a": [1e30, 2e30], "b": [1e-40, 3e-40]});
    assert_eq!(
        JsonPath.evaluate_list("$.a[*] * 2", &doc).unwrap(),
        vec![json!(2e30), json!(4e30)]
    );
    assert_eq!(
        JsonPath.evaluate_list("$.a[?@ > 1.5e30]", &doc).unwrap(),
        vec![json!(2e30)]
    );
    assert_eq!(
        JsonPath.evaluate_list("$.b[?@ > 2e-40]", &doc).unwrap(),
        vec![json!(3e-40)]
    );
}

#[test]
fn test_descendants() {
    assert_eq!(
        list("$..price"),
        vec![json!(8.95), json!(12.99), json!(22.99), json!(19.95)]
    );
}

#[test]
fn test_filters_with_bare_names() {
    assert_eq!(list("$.people[?age > 35].name"), vec![json!("Bob"), json!("Cindy")]);
    assert_eq!(list("$.people[?age < 45].name"), vec![json!("Alice"), json!("Bob")]);
    assert_eq!(list("$.people[?age = 40].name"), vec![json!("Bob")]);
    assert_eq!(list("$.people[?(@.age == 40)].name"), vec![json!("Bob")]);
}

#[test]
fn test_filter_logic_and_existence() {
    assert_eq!(list("$.people[?age > 35 & age < 45].name"), vec![json!("Bob")]);
    assert_eq!(
        list("$.people[?age < 35 or age > 45].name"),
        vec![json!("Alice"), json!("Cindy")]
    );
    assert_eq!(list("$.people[?email].name"), vec![json!("Alice"), json!("Cindy")]);
    assert_eq!(list("$.people[?!email].name"), vec![json!("Bob")]);
}

#[test]
fn test_filter_regex_and_strings() {
    assert_eq!(list("$.people[?email =~ /\\.org$/].name"), vec![json!("Cindy")]);
    assert_eq!(list("$.people[?name == 'Bob'].age"), vec![json!(40)]);
    assert_eq!(list("$.people[?name > 'B'].name"), vec![json!("Bob"), json!("Cindy")]);
}

#[test]
fn test_filter_on_missing_field_is_false() {
    assert_eq!(list("$.people[?height > 1].name"), Vec::<Value>::new());
}

#[test]
fn test_arithmetic_zips_equal_length_sets() {
    let doc = json!({"a": [{"x": 6, "y": 3}, {"x": 10, "y": 4}]});
    assert_eq!(
        JsonPath.evaluate_list("$.a[*].x / $.a[*].y", &doc).unwrap(),
        vec![json!(2), json!(2.5)]
    );
}

#[test]
fn test_arithmetic_on_mismatched_sets_is_empty() {
    let doc = json!({"a": [1, 2, 3], "b": [1, 2]});
    assert_eq!(
        JsonPath.evaluate_list("$.a[*] + $.b[*]", &doc).unwrap(),
        Vec::<Value>::new()
    );
    assert_eq!(
        JsonPath.evaluate_list("$.missing[*] * $.b[*]", &doc).unwrap(),
        Vec::<Value>::new()
    );
}

#[test]
fn test_arithmetic_with_parentheses_and_literals() {
    let doc = json!({"disk_usage": {"total": 500, "used": 480}});
    let free = JsonPath
        .evaluate_scalar("($.disk_usage.total - $.disk_usage.used) / $.disk_usage.total", &doc)
        .unwrap();
    assert_eq!(free, json!(0.04));
    assert_eq!(
        JsonPath.evaluate_scalar("$.disk_usage.used * 2 + 1", &doc).unwrap(),
        json!(961)
    );
}

#[test]
fn test_arithmetic_on_non_numbers_is_empty() {
    let doc = json!({"a": "text", "b": 2});
    assert_eq!(JsonPath.evaluate_list("$.a * $.b", &doc).unwrap(), Vec::<Value>::new());
}

#[test]
fn test_division_by_zero_is_an_error() {
    let doc = json!({"a": 1, "b": 0});
    assert!(matches!(
        JsonPath.evaluate_list("$.a / $.b", &doc),
        Err(QueryError::Evaluation(_))
    ));
}

#[test]
fn test_scalar_match_counts() {
    let doc = people();
    assert_eq!(
        JsonPath.evaluate_scalar("$.people[*].name", &doc),
        Err(QueryError::AmbiguousMatch(3))
    );
    assert_eq!(
        JsonPath.evaluate_scalar("$.nothing", &doc),
        Err(QueryError::NoMatch)
    );
}

#[test]
fn test_syntax_errors() {
    for bad in ["", "people", "$.", "$[", "$.a[?]", "$.a +", "$.a[1:2:3:4]"] {
        assert!(
            matches!(JsonPath.check(bad), Err(QueryError::Syntax(_))),
            "'{}' should not parse",
            bad
        );
    }
    for good in ["$", "$.a.b", "$..a", "$['a b']", "$.a[?(@.b)]", "($.a + 1) * 2"] {
        assert!(JsonPath.check(good).is_ok(), "'{}' should parse", good);
    }
}
