#![no_main]

use libfuzzer_sys::fuzz_target;
use observify::{SyncOptions, Value, create_reactive_model, synchronize};

// Input: two JSON documents separated by a NUL byte. The first builds the
// model, the second is merged into it twice. Merging must never touch the
// incoming tree, and positionally merging the model's own snapshot back into
// it must not change it.
fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    let mut parts = data.splitn(2, |b| *b == 0);
    let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
        return;
    };
    let (Ok(first), Ok(second)) = (
        serde_json::from_slice::<serde_json::Value>(first),
        serde_json::from_slice::<serde_json::Value>(second),
    ) else {
        return;
    };

    let options = SyncOptions::new()
        .with_array_key("items", "id")
        .with_array_key("0", "key");
    let Ok(model) = create_reactive_model(&Value::from(&first), &options) else {
        return;
    };
    let incoming = Value::from(&second);
    if synchronize(&model, &incoming, &options).is_err() {
        return;
    }
    let _ = synchronize(&model, &incoming, &options);
    assert_eq!(incoming.to_json(), second);

    let snapshot = model.to_json();
    let _ = synchronize(&model, &Value::from(&snapshot), &SyncOptions::new());
    assert_eq!(model.to_json(), snapshot);
});
