// tests/property/identity_test.rs

//! Property-based tests for client identifier derivation

use proptest::prelude::*;
use std::net::SocketAddr;
use wsrelay::core::ClientId;
use wsrelay::core::identity::CLIENT_ID_LEN;

proptest! {
    #[test]
    fn test_identity_is_always_lowercase_hex_of_fixed_length(input in ".{0,200}") {
        let id = ClientId::derive(&input);
        prop_assert_eq!(id.as_str().len(), CLIENT_ID_LEN);
        prop_assert!(id.as_str().bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn test_identity_is_deterministic(input in ".{0,200}") {
        prop_assert_eq!(ClientId::derive(&input), ClientId::derive(&input));
    }

    #[test]
    fn test_distinct_addresses_yield_distinct_identities(
        a in (any::<[u8; 4]>(), any::<u16>()),
        b in (any::<[u8; 4]>(), any::<u16>()),
    ) {
        prop_assume!(a != b);
        let addr_a = SocketAddr::from(a).to_string();
        let addr_b = SocketAddr::from(b).to_string();
        prop_assert_ne!(ClientId::derive(&addr_a), ClientId::derive(&addr_b));
    }
}
