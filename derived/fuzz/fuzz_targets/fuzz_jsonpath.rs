#![no_main]

use derived::{QueryAdapter, QueryLanguage, QueryMode, ResourceLimits};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    if data.len() > ResourceLimits::default().max_expression_bytes {
        return;
    }
    if let Ok(expression) = std::str::from_utf8(data) {
        let adapter = QueryAdapter::new();
        let document = json!({
            "a": [1, 2.5, "3", {"b": [true, null]}],
            "c": {"d": {"e": -4}}
        });
        let _ = adapter.query(QueryLanguage::JsonPath, QueryMode::List, expression, &document);
        let _ = adapter.query(QueryLanguage::JsonPath, QueryMode::Scalar, expression, &document);
    }
});
