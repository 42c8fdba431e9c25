//! Property-based invariant tests for observables and computed values.
//!
//! 1. The version counts exactly the writes that changed the value.
//! 2. Subscribers see every change, in order, and nothing else.
//! 3. A mutation bracket notifies once no matter how deeply it nests.
//! 4. A tracked computed value always agrees with a direct evaluation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use observify_reactive::{Computed, Observable};
use proptest::prelude::*;

// ═════════════════════════════════════════════════════════════════════════
// 1. Version counts changes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn version_counts_changes(writes in proptest::collection::vec(0u8..4, 0..40)) {
        let obs = Observable::new(0u8);
        let mut expected = 0u64;
        let mut last = 0u8;
        for value in writes {
            if value != last {
                expected += 1;
                last = value;
            }
            obs.set(value);
        }
        prop_assert_eq!(obs.version(), expected);
        prop_assert_eq!(obs.peek(), last);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Subscribers see exactly the changes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subscriber_sees_exact_change_sequence(writes in proptest::collection::vec(0i32..5, 0..40)) {
        let obs = Observable::new(0i32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.borrow_mut().push(*v));

        let mut expected = Vec::new();
        let mut last = 0;
        for value in writes {
            if value != last {
                expected.push(value);
                last = value;
            }
            obs.set(value);
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Nested brackets notify once
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nested_brackets_notify_once(depth in 1usize..8, pushes in 0usize..8) {
        let obs = Observable::new(Vec::<usize>::new());
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));

        for _ in 0..depth {
            obs.begin_mutation();
        }
        for i in 0..pushes {
            obs.update(|items| items.push(i));
        }
        prop_assert_eq!(hits.get(), 0);
        for _ in 0..depth {
            obs.end_mutation();
        }

        prop_assert_eq!(hits.get(), 1);
        prop_assert_eq!(obs.version(), 1);
        prop_assert_eq!(obs.peek().len(), pushes);
        prop_assert!(!obs.is_mutating());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Tracked computed agrees with direct evaluation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tracked_computed_matches_direct(
        steps in proptest::collection::vec((any::<bool>(), -50i64..50, -50i64..50), 1..30)
    ) {
        let switch = Observable::new(true);
        let a = Observable::new(0i64);
        let b = Observable::new(0i64);
        let picked = {
            let (switch, a, b) = (switch.clone(), a.clone(), b.clone());
            Computed::tracked(move || if switch.get() { a.get() } else { b.get() * 2 })
        };

        for (use_a, x, y) in steps {
            switch.set(use_a);
            a.set(x);
            b.set(y);
            let direct = if use_a { x } else { y * 2 };
            prop_assert_eq!(picked.get(), direct);
            // Only the branch taken is a dependency, plus the switch.
            prop_assert_eq!(picked.dependency_count(), 2);
        }
    }
}
