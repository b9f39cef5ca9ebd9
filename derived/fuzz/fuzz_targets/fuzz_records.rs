#![no_main]

use derived::{Engine, SentenceRecord};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let Ok(records) = serde_json::from_slice::<Vec<SentenceRecord>>(data) else {
        return;
    };
    if let Ok(engine) = Engine::from_records(records) {
        let _ = engine.derive(&json!({"values": [1, 2, 3], "name": "fuzz"}));
    }
});
