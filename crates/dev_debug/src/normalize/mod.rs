//! Value normalization: turns any [`Inspect`] value into a [`NormalizedNode`]
//! tree that serializes to the collector's JSON shape.
//!
//! Primitives pass through, collections recurse in order, and [`Object`]
//! implementors are expanded field by field with a visibility tag and an
//! identity token. Normalization never fails: unreadable values become
//! [`Marker::Error`] leaves.

mod identity;
mod inspect;
mod node;

use std::{
    borrow::Cow,
    collections::HashSet,
    fmt, mem,
    panic::{self, AssertUnwindSafe},
};

use crate::{config::NormalizeConfig, defaults::INSPECTION_PANICKED};

pub use identity::ObjectId;
pub use node::{Field, Marker, NormalizedNode, Scalar, StructuredObject, Visibility};

use identity::IdentityTable;

/// A value that can be normalized.
///
/// Implementations describe the value through the [`Normalizer`] building
/// blocks (`scalar`, `sequence`, `map`, `object`) rather than recursing on
/// their own, so depth and cycle guards apply uniformly.
pub trait Inspect {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode;

    /// Declared-but-never-assigned state. Unset values are left out of their
    /// parent structure entirely; anywhere else they read as `null`.
    fn is_unset(&self) -> bool {
        false
    }
}

/// A keyed structure with named, visibility-tagged fields.
pub trait Object {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Lifetime-stable identity, when the type carries one. Without it the
    /// identity is derived from the value's address for the current call.
    fn object_id(&self) -> Option<&ObjectId> {
        None
    }

    /// Reports every field, ancestors included (see [`Fields::parent`]).
    fn fields(&self, fields: &mut Fields<'_>);
}

/// Normalizes `value` with the default configuration.
pub fn normalize<T: Inspect + ?Sized>(value: &T) -> NormalizedNode {
    Normalizer::new(NormalizeConfig::default()).normalize(value)
}

#[derive(Debug)]
pub struct Normalizer {
    config: NormalizeConfig,
    depth: usize,
    on_path: HashSet<u64>,
    identities: IdentityTable,
    // Address ranges of by-value copies currently being inspected.
    detached: Vec<(usize, usize)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizeConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            config,
            depth: 0,
            on_path: HashSet::new(),
            identities: IdentityTable::default(),
            detached: Vec::new(),
        }
    }

    pub fn normalize<T: Inspect + ?Sized>(&mut self, value: &T) -> NormalizedNode {
        if let Some(max_depth) = self.config.max_depth {
            if self.depth > max_depth {
                return NormalizedNode::Marker(Marker::DepthLimit);
            }
        }

        self.depth += 1;
        let node = value.inspect(self);
        self.depth -= 1;
        node
    }

    pub fn scalar(&mut self, value: impl Into<Scalar>) -> NormalizedNode {
        NormalizedNode::Scalar(value.into())
    }

    pub fn null(&mut self) -> NormalizedNode {
        NormalizedNode::null()
    }

    pub fn error(&mut self, message: impl fmt::Display) -> NormalizedNode {
        NormalizedNode::Marker(Marker::Error {
            message: message.to_string(),
        })
    }

    pub fn sequence<'v, I, T>(&mut self, items: I) -> NormalizedNode
    where
        I: IntoIterator<Item = &'v T>,
        T: Inspect + ?Sized + 'v,
    {
        NormalizedNode::Sequence(items.into_iter().map(|item| self.normalize(item)).collect())
    }

    pub fn map<'v, I, K, V>(&mut self, entries: I) -> NormalizedNode
    where
        I: IntoIterator<Item = (K, &'v V)>,
        K: fmt::Display,
        V: Inspect + ?Sized + 'v,
    {
        NormalizedNode::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), self.normalize(value)))
                .collect(),
        )
    }

    /// Inspects a by-value copy of some stored state, such as the result of
    /// `Cell::get`.
    ///
    /// Objects inside the copy have no address of their own to key an
    /// identity on, so each of them receives a fresh token.
    pub fn detached<T: Inspect>(&mut self, copy: &T) -> NormalizedNode {
        let start = copy as *const T as usize;
        self.detached.push((start, start + mem::size_of::<T>()));
        let node = copy.inspect(self);
        self.detached.pop();
        node
    }

    pub fn object<O: Object + ?Sized>(&mut self, object: &O) -> NormalizedNode {
        let type_name = object.type_name().into_owned();
        let identity = match object.object_id() {
            Some(id) => id.get(),
            None => {
                let address = object as *const O as *const () as usize;
                // Zero-sized values all share one dangling address.
                if mem::size_of_val(object) == 0 || self.is_detached(address) {
                    self.identities.fresh()
                } else {
                    self.identities.token_for(address, &type_name)
                }
            }
        };

        if self.config.detect_cycles && !self.on_path.insert(identity) {
            return NormalizedNode::Marker(Marker::Circular {
                type_name,
                identity,
            });
        }

        let mut fields = Fields::new(self);
        object.fields(&mut fields);
        let fields = fields.finish();

        if self.config.detect_cycles {
            self.on_path.remove(&identity);
        }

        NormalizedNode::Object(StructuredObject {
            type_name,
            identity,
            fields,
        })
    }

    /// Runs `inspect`, turning a panic into an error leaf and restoring the
    /// traversal state it left behind.
    pub(crate) fn contained(
        &mut self,
        inspect: impl FnOnce(&mut Normalizer) -> NormalizedNode,
    ) -> NormalizedNode {
        let depth = self.depth;
        let on_path = self.on_path.clone();
        let detached = self.detached.len();
        match panic::catch_unwind(AssertUnwindSafe(|| inspect(self))) {
            Ok(node) => node,
            Err(_) => {
                self.depth = depth;
                self.on_path = on_path;
                self.detached.truncate(detached);
                self.error(INSPECTION_PANICKED)
            }
        }
    }

    fn is_detached(&self, address: usize) -> bool {
        self.detached
            .iter()
            .any(|&(start, end)| (start..end).contains(&address))
    }
}

struct Slot {
    level: usize,
    name: String,
    visibility: Visibility,
    value: Option<NormalizedNode>,
}

/// Field collector handed to [`Object::fields`].
///
/// A name is reported once: the declaration closest to the concrete type
/// (lowest `parent` nesting) wins, regardless of the order fields are visited.
pub struct Fields<'n> {
    normalizer: &'n mut Normalizer,
    level: usize,
    slots: Vec<Slot>,
}

impl<'n> Fields<'n> {
    fn new(normalizer: &'n mut Normalizer) -> Self {
        Self {
            normalizer,
            level: 0,
            slots: Vec::new(),
        }
    }

    pub fn field<T: Inspect + ?Sized>(
        &mut self,
        name: &str,
        visibility: Visibility,
        value: &T,
    ) -> &mut Self {
        let Some(index) = self.claim(name) else {
            return self;
        };
        let node = if value.is_unset() {
            None
        } else {
            Some(self.normalizer.normalize(value))
        };
        self.fill(index, name, visibility, node);
        self
    }

    /// Reports a field whose read may fail; failures become error leaves.
    pub fn try_field<T, E>(
        &mut self,
        name: &str,
        visibility: Visibility,
        value: Result<&T, E>,
    ) -> &mut Self
    where
        T: Inspect + ?Sized,
        E: fmt::Display,
    {
        match value {
            Ok(value) => self.field(name, visibility, value),
            Err(err) => {
                if let Some(index) = self.claim(name) {
                    let node = self.normalizer.error(err);
                    self.fill(index, name, visibility, Some(node));
                }
                self
            }
        }
    }

    /// Reports the fields of an ancestor structure embedded in this one.
    pub fn parent<P: Object + ?Sized>(&mut self, parent: &P) -> &mut Self {
        self.level += 1;
        parent.fields(self);
        self.level -= 1;
        self
    }

    fn claim(&mut self, name: &str) -> Option<usize> {
        match self.slots.iter().position(|slot| slot.name == name) {
            Some(index) if self.slots[index].level <= self.level => None,
            Some(index) => Some(index),
            None => {
                self.slots.push(Slot {
                    level: self.level,
                    name: name.to_string(),
                    visibility: Visibility::Public,
                    value: None,
                });
                Some(self.slots.len() - 1)
            }
        }
    }

    fn fill(
        &mut self,
        index: usize,
        name: &str,
        visibility: Visibility,
        value: Option<NormalizedNode>,
    ) {
        self.slots[index] = Slot {
            level: self.level,
            name: name.to_string(),
            visibility,
            value,
        };
    }

    fn finish(self) -> Vec<Field> {
        self.slots
            .into_iter()
            .filter_map(|slot| {
                slot.value.map(|value| Field {
                    name: slot.name,
                    visibility: slot.visibility,
                    value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, OnceCell, RefCell};
    use std::rc::Rc;

    use serde_json::json;

    struct Base {
        id: u32,
        name: &'static str,
    }

    impl Object for Base {
        fn type_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Base")
        }

        fn fields(&self, fields: &mut Fields<'_>) {
            fields
                .field("id", Visibility::Public, &self.id)
                .field("name", Visibility::Private, &self.name);
        }
    }

    struct Derived {
        base: Base,
        name: &'static str,
        cache: OnceCell<u32>,
    }

    impl Object for Derived {
        fn type_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Derived")
        }

        fn fields(&self, fields: &mut Fields<'_>) {
            fields
                .parent(&self.base)
                .field("name", Visibility::Protected, &self.name)
                .field("cache", Visibility::Private, &self.cache);
        }
    }

    impl Inspect for Derived {
        fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
            normalizer.object(self)
        }
    }

    fn derived() -> Derived {
        Derived {
            base: Base {
                id: 1,
                name: "base-name",
            },
            name: "derived-name",
            cache: OnceCell::new(),
        }
    }

    #[test]
    fn most_derived_field_wins_even_when_parent_is_visited_first() {
        let node = normalize(&derived());
        let object = node.as_object().unwrap();

        assert_eq!(object.fields.len(), 2);
        let name = object.field("name").unwrap();
        assert_eq!(name.visibility, Visibility::Protected);
        assert_eq!(name.value, NormalizedNode::from("derived-name"));
        assert_eq!(object.field("id").unwrap().value, NormalizedNode::from(1u32));
    }

    #[test]
    fn unset_fields_are_omitted_until_assigned() {
        let value = derived();
        assert!(normalize(&value).as_object().unwrap().field("cache").is_none());

        value.cache.set(9).unwrap();
        let node = normalize(&value);
        assert_eq!(
            node.as_object().unwrap().field("cache").unwrap().value,
            NormalizedNode::from(9u32)
        );
    }

    #[test]
    fn try_field_turns_read_failures_into_error_leaves() {
        struct Flaky;

        impl Object for Flaky {
            fn fields(&self, fields: &mut Fields<'_>) {
                fields
                    .try_field::<u8, _>("broken", Visibility::Public, Err("backend gone"))
                    .field("ok", Visibility::Public, &true);
            }
        }

        let node = Normalizer::default().object(&Flaky);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json["properties"],
            json!([
                {"visibility": "public", "name": "broken", "value": {"__type": "error", "message": "backend gone"}},
                {"visibility": "public", "name": "ok", "value": true}
            ])
        );
    }

    struct Link {
        label: &'static str,
        next: RefCell<Option<Rc<Link>>>,
    }

    impl Object for Link {
        fn type_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Link")
        }

        fn fields(&self, fields: &mut Fields<'_>) {
            fields
                .field("label", Visibility::Public, &self.label)
                .field("next", Visibility::Public, &self.next);
        }
    }

    impl Inspect for Link {
        fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
            normalizer.object(self)
        }
    }

    #[test]
    fn back_references_become_circular_markers() {
        let a = Rc::new(Link {
            label: "a",
            next: RefCell::new(None),
        });
        let b = Rc::new(Link {
            label: "b",
            next: RefCell::new(Some(Rc::clone(&a))),
        });
        *a.next.borrow_mut() = Some(Rc::clone(&b));

        let node = normalize(&a);
        let json = serde_json::to_value(&node).unwrap();
        let a_id = json["__id"].clone();
        let back = &json["properties"][1]["value"]["properties"][1]["value"];
        assert_eq!(back["__type"], "circular");
        assert_eq!(back["__class"], "Link");
        assert_eq!(back["__id"], a_id);

        *a.next.borrow_mut() = None;
    }

    #[test]
    fn shared_siblings_are_expanded_each_time() {
        let shared = Rc::new(Link {
            label: "shared",
            next: RefCell::new(None),
        });
        let pair = vec![Rc::clone(&shared), Rc::clone(&shared)];

        let node = normalize(&pair);
        let items = node.as_sequence().unwrap();
        let first = items[0].as_object().unwrap();
        let second = items[1].as_object().unwrap();
        assert_eq!(first.identity, second.identity);
        assert_eq!(first, second);
    }

    #[derive(Clone, Copy)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Object for Point {
        fn fields(&self, fields: &mut Fields<'_>) {
            fields
                .field("x", Visibility::Public, &self.x)
                .field("y", Visibility::Public, &self.y);
        }
    }

    impl Inspect for Point {
        fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
            normalizer.object(self)
        }
    }

    #[test]
    fn copies_read_out_of_cells_get_their_own_identities() {
        let start = Cell::new(Point { x: 0, y: 0 });
        let end = Cell::new(Point { x: 3, y: 4 });

        let node = normalize(&(&start, &end));
        let items = node.as_sequence().unwrap();
        let start_id = items[0].as_object().unwrap().identity;
        let end_id = items[1].as_object().unwrap().identity;
        assert_ne!(start_id, end_id);
        assert_eq!(
            items[1].as_object().unwrap().field("y").unwrap().value,
            NormalizedNode::from(4)
        );
    }

    struct Tag;

    impl Object for Tag {
        fn fields(&self, _fields: &mut Fields<'_>) {}
    }

    impl Inspect for Tag {
        fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
            normalizer.object(self)
        }
    }

    #[test]
    fn zero_sized_objects_are_not_merged() {
        let node = normalize(&vec![Tag, Tag]);
        let items = node.as_sequence().unwrap();
        assert_ne!(
            items[0].as_object().unwrap().identity,
            items[1].as_object().unwrap().identity
        );
    }

    #[test]
    fn depth_limit_replaces_values_past_the_limit() {
        let nested = vec![vec![vec![1]]];
        let config = NormalizeConfig {
            max_depth: Some(1),
            ..NormalizeConfig::default()
        };

        let node = Normalizer::new(config).normalize(&nested);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!([[{"__type": "depth_limit"}]])
        );
    }
}
