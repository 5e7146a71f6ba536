#![forbid(unsafe_code)]

//! Property-based invariant tests for `Observable`.
//!
//! 1. Version increments exactly once per value-changing `set`.
//! 2. Subscribers see exactly the sequence of distinct consecutive values.
//! 3. A dropped subscription never fires again.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use reled_reactive::Observable;

fn writes() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..4, 0..64)
}

proptest! {
    #[test]
    fn version_counts_effective_writes(seq in writes()) {
        let obs = Observable::new(0u8);
        let mut expected = 0u64;
        let mut current = 0u8;
        for v in seq {
            if v != current {
                expected += 1;
                current = v;
            }
            obs.set(v);
        }
        prop_assert_eq!(obs.version(), expected);
        prop_assert_eq!(obs.get(), current);
    }

    #[test]
    fn subscribers_see_distinct_transitions(seq in writes()) {
        let obs = Observable::new(0u8);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        let mut expected = Vec::new();
        let mut current = 0u8;
        for v in seq {
            if v != current {
                expected.push(v);
                current = v;
            }
            obs.set(v);
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn dropped_subscription_is_silent(seq in writes(), cut in 0usize..64) {
        let obs = Observable::new(0u8);
        let calls = Rc::new(RefCell::new(0usize));
        let calls_clone = Rc::clone(&calls);
        let mut sub = Some(obs.subscribe(move |_| *calls_clone.borrow_mut() += 1));

        let mut before_cut = 0usize;
        for (i, v) in seq.iter().enumerate() {
            if i == cut {
                before_cut = *calls.borrow();
                sub.take();
            }
            obs.set(*v);
        }
        if cut < seq.len() {
            prop_assert_eq!(*calls.borrow(), before_cut);
            prop_assert_eq!(obs.subscriber_count(), 0);
        }
    }
}
