#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use observify::{SyncOptions, Value, create_reactive_model};
use serde_json::json;

#[derive(Arbitrary, Debug)]
enum ArrayOp {
    Push(i8),
    Pop,
    Shift,
    Unshift(Vec<i8>),
    Reverse,
    Sort,
    Splice { start: u8, delete: u8, insert: Vec<i8> },
    Remove(i8),
    Replace(i8, i8),
    Toggle(i8),
    Clear,
    Set(u8, i8),
}

// Every bridged operation notifies the array cell at most once and the
// cell keeps holding the same array instance.
fuzz_target!(|ops: Vec<ArrayOp>| {
    let Ok(model) = create_reactive_model(&Value::from(json!({ "list": [] })), &SyncOptions::new())
    else {
        return;
    };
    let Some(cell) = model.as_object().and_then(|o| o.cell("list")) else {
        return;
    };
    let list = cell.peek();
    let Some(array) = list.as_array() else {
        return;
    };
    let hits = Rc::new(Cell::new(0u64));
    let h = Rc::clone(&hits);
    let _sub = cell.subscribe(move |_| h.set(h.get() + 1));

    for op in ops.into_iter().take(256) {
        let before = hits.get();
        match op {
            ArrayOp::Push(v) => {
                array.push(i64::from(v));
            }
            ArrayOp::Pop => {
                array.pop();
            }
            ArrayOp::Shift => {
                array.shift();
            }
            ArrayOp::Unshift(values) => {
                array.unshift(values.into_iter().map(|v| Value::from(i64::from(v))));
            }
            ArrayOp::Reverse => array.reverse(),
            ArrayOp::Sort => array.sort_by(|a, b| a.as_i64().cmp(&b.as_i64())),
            ArrayOp::Splice { start, delete, insert } => {
                array.splice(
                    usize::from(start),
                    usize::from(delete),
                    insert.into_iter().map(|v| Value::from(i64::from(v))),
                );
            }
            ArrayOp::Remove(v) => {
                array.remove(&Value::from(i64::from(v)));
            }
            ArrayOp::Replace(old, new) => {
                array.replace(&Value::from(i64::from(old)), i64::from(new));
            }
            ArrayOp::Toggle(v) => {
                array.toggle(i64::from(v));
            }
            ArrayOp::Clear => array.clear(),
            ArrayOp::Set(index, v) => array.set(usize::from(index % 64), i64::from(v)),
        }
        assert!(hits.get() - before <= 1);
        assert!(cell.peek().same(&list));
    }
});
