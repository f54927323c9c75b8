// tests/property/registry_test.rs

//! Property-based tests for registry membership
//! Tests that any sequence of register/deregister calls matches a set model

use proptest::prelude::*;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use wsrelay::core::ConnectionRegistry;
use wsrelay::core::state::ClientConnection;

#[derive(Debug, Clone)]
enum Op {
    Register(u64),
    Deregister(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..20).prop_map(Op::Register),
        (0u64..20).prop_map(Op::Deregister),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_registry_matches_set_model(ops in prop::collection::vec(op_strategy(), 1..=200)) {
        let registry = ConnectionRegistry::new();
        let mut model = HashSet::new();
        let mut receivers = Vec::new();

        for op in ops {
            match op {
                Op::Register(id) => {
                    let (tx, rx) = mpsc::channel(1);
                    receivers.push(rx);
                    let addr = SocketAddr::from(([10, 0, 0, 1], 5000 + id as u16));
                    let inserted = registry.register(Arc::new(ClientConnection::new(id, addr, tx)));
                    prop_assert_eq!(inserted, model.insert(id));
                }
                Op::Deregister(id) => {
                    prop_assert_eq!(registry.deregister(id).is_some(), model.remove(&id));
                }
            }
            prop_assert_eq!(registry.len(), model.len());
        }

        let mut ids: Vec<u64> = registry.snapshot().iter().map(|c| c.id).collect();
        ids.sort();
        let mut expected: Vec<u64> = model.into_iter().collect();
        expected.sort();
        prop_assert_eq!(ids, expected);
    }
}
