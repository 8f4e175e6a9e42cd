//! Tests for bean identity

use std::collections::HashSet;
use std::sync::Arc;

use beanwire_domain::BeanKey;

trait Greeter: Send + Sync {}

#[test]
fn test_keys_for_same_type_are_equal() {
    assert_eq!(BeanKey::of::<String>(), BeanKey::of::<String>());
    assert_eq!(
        BeanKey::of::<Arc<dyn Greeter>>(),
        BeanKey::of::<Arc<dyn Greeter>>()
    );
}

#[test]
fn test_qualifier_distinguishes_keys() {
    let mut keys = HashSet::new();
    keys.insert(BeanKey::of::<String>());
    keys.insert(BeanKey::qualified::<String>("a"));
    keys.insert(BeanKey::qualified::<String>("b"));
    keys.insert(BeanKey::qualified::<String>("a"));
    assert_eq!(keys.len(), 3);
}

#[test]
fn test_display_includes_qualifier() {
    let key = BeanKey::qualified::<u32>("port");
    assert_eq!(key.to_string(), "u32[port]");
    assert_eq!(BeanKey::of::<u32>().to_string(), "u32");
}

#[test]
fn test_is_checks_type() {
    let key = BeanKey::of::<u64>();
    assert!(key.is::<u64>());
    assert!(!key.is::<u32>());
    assert!(!key.is_qualified());
}
