use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// Identity token that travels with an object for its whole lifetime.
///
/// Embed one in a type (and return it from [`crate::Object::object_id`], or mark
/// the field `#[inspect(id)]` when deriving) to have every normalization of
/// that value report the same `__id`. A clone is a different object and
/// receives a fresh token.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn new() -> Self {
        Self(next_identity())
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ObjectId {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Per-normalization table of address-derived identities.
///
/// Keyed on address plus type name: a struct and its first field share an
/// address but never a type.
#[derive(Debug, Default)]
pub(crate) struct IdentityTable {
    assigned: HashMap<(usize, String), u64>,
}

impl IdentityTable {
    pub(crate) fn token_for(&mut self, address: usize, type_name: &str) -> u64 {
        *self
            .assigned
            .entry((address, type_name.to_string()))
            .or_insert_with(next_identity)
    }

    /// A token no other value in this or any later call will receive.
    pub(crate) fn fresh(&self) -> u64 {
        next_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_distinct_and_clones_are_new_objects() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a.get(), b.get());
        assert_ne!(a.clone().get(), a.get());
    }

    #[test]
    fn table_reuses_tokens_for_the_same_address_and_type() {
        let mut table = IdentityTable::default();
        let first = table.token_for(0x1000, "Node");
        assert_eq!(table.token_for(0x1000, "Node"), first);
        assert_ne!(table.token_for(0x1000, "Inner"), first);
        assert_ne!(table.token_for(0x2000, "Node"), first);
    }
}
