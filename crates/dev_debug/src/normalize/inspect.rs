use std::{
    borrow::Cow,
    cell::{Cell, OnceCell, RefCell},
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    fmt,
    path::{Path, PathBuf},
    rc::{self, Rc},
    sync::{self, Arc, Mutex, OnceLock, RwLock, TryLockError},
};

use serde_json::Value;

use super::{Inspect, NormalizedNode, Normalizer};

macro_rules! inspect_scalar {
    ($($ty:ty),+) => {
        $(
            impl Inspect for $ty {
                fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
                    normalizer.scalar(*self)
                }
            }
        )+
    };
}

inspect_scalar!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Inspect for () {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.null()
    }
}

impl Inspect for char {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.scalar(self.to_string())
    }
}

impl Inspect for str {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.scalar(self)
    }
}

impl Inspect for String {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.scalar(self.as_str())
    }
}

impl Inspect for Cow<'_, str> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.scalar(self.as_ref())
    }
}

impl Inspect for Path {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.scalar(self.to_string_lossy().into_owned())
    }
}

impl Inspect for PathBuf {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        self.as_path().inspect(normalizer)
    }
}

// Pointer-like wrappers are transparent: they neither add depth nor identity.
macro_rules! inspect_deref {
    ($($ty:ty),+) => {
        $(
            impl<T: Inspect + ?Sized> Inspect for $ty {
                fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
                    (**self).inspect(normalizer)
                }

                fn is_unset(&self) -> bool {
                    (**self).is_unset()
                }
            }
        )+
    };
}

inspect_deref!(&T, &mut T, Box<T>, Rc<T>, Arc<T>);

impl<T: Inspect + ?Sized> Inspect for rc::Weak<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.upgrade() {
            Some(strong) => strong.inspect(normalizer),
            None => normalizer.null(),
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for sync::Weak<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.upgrade() {
            Some(strong) => strong.inspect(normalizer),
            None => normalizer.null(),
        }
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self {
            Some(value) => value.inspect(normalizer),
            None => normalizer.null(),
        }
    }

    fn is_unset(&self) -> bool {
        self.as_ref().is_some_and(Inspect::is_unset)
    }
}

impl<T: Inspect> Inspect for OnceCell<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.get() {
            Some(value) => value.inspect(normalizer),
            None => normalizer.null(),
        }
    }

    fn is_unset(&self) -> bool {
        self.get().is_none()
    }
}

impl<T: Inspect> Inspect for OnceLock<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.get() {
            Some(value) => value.inspect(normalizer),
            None => normalizer.null(),
        }
    }

    fn is_unset(&self) -> bool {
        self.get().is_none()
    }
}

impl<T: Inspect + Copy> Inspect for Cell<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        let copy = self.get();
        normalizer.detached(&copy)
    }
}

impl<T: Inspect + ?Sized> Inspect for RefCell<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.try_borrow() {
            Ok(value) => value.inspect(normalizer),
            Err(err) => normalizer.error(err),
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for Mutex<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        // A panic escaping while the guard is alive would poison the host's lock.
        match self.try_lock() {
            Ok(value) => normalizer.contained(|normalizer| value.inspect(normalizer)),
            Err(TryLockError::Poisoned(poisoned)) => {
                let value = poisoned.into_inner();
                normalizer.contained(|normalizer| value.inspect(normalizer))
            }
            Err(TryLockError::WouldBlock) => normalizer.error("value is locked"),
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for RwLock<T> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self.try_read() {
            Ok(value) => normalizer.contained(|normalizer| value.inspect(normalizer)),
            Err(TryLockError::Poisoned(poisoned)) => {
                let value = poisoned.into_inner();
                normalizer.contained(|normalizer| value.inspect(normalizer))
            }
            Err(TryLockError::WouldBlock) => normalizer.error("value is write-locked"),
        }
    }
}

impl<T: Inspect> Inspect for [T] {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.sequence(self)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.sequence(self)
    }
}

macro_rules! inspect_sequence {
    ($($ty:ident),+) => {
        $(
            impl<T: Inspect> Inspect for $ty<T> {
                fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
                    normalizer.sequence(self)
                }
            }
        )+
    };
}

inspect_sequence!(Vec, VecDeque, LinkedList, BTreeSet);

impl<T: Inspect, S> Inspect for HashSet<T, S> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.sequence(self)
    }
}

impl<K: fmt::Display, V: Inspect> Inspect for BTreeMap<K, V> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.map(self)
    }
}

impl<K: fmt::Display, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        normalizer.map(self)
    }
}

macro_rules! inspect_tuple {
    ($($name:ident . $index:tt),+) => {
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
                let parts: Vec<&dyn Inspect> = vec![$(&self.$index as &dyn Inspect),+];
                normalizer.sequence(parts)
            }
        }
    };
}

inspect_tuple!(A.0);
inspect_tuple!(A.0, B.1);
inspect_tuple!(A.0, B.1, C.2);
inspect_tuple!(A.0, B.1, C.2, D.3);
inspect_tuple!(A.0, B.1, C.2, D.3, E.4);
inspect_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);

impl Inspect for Value {
    fn inspect(&self, normalizer: &mut Normalizer) -> NormalizedNode {
        match self {
            Value::Null => normalizer.null(),
            Value::Bool(value) => normalizer.scalar(*value),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    normalizer.scalar(value)
                } else if let Some(value) = number.as_u64() {
                    normalizer.scalar(value)
                } else {
                    normalizer.scalar(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(value) => normalizer.scalar(value.as_str()),
            Value::Array(items) => normalizer.sequence(items),
            Value::Object(entries) => normalizer.map(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use serde_json::json;

    fn as_json<T: Inspect + ?Sized>(value: &T) -> Value {
        serde_json::to_value(normalize(value)).unwrap()
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        assert_eq!(as_json(&42), json!(42));
        assert_eq!(as_json(&-7i8), json!(-7));
        assert_eq!(as_json(&1.5f64), json!(1.5));
        assert_eq!(as_json(&true), json!(true));
        assert_eq!(as_json("text"), json!("text"));
        assert_eq!(as_json(&'x'), json!("x"));
        assert_eq!(as_json(&()), json!(null));
        assert_eq!(as_json(&None::<u8>), json!(null));
    }

    #[test]
    fn keyed_collections_become_objects() {
        let mut map = BTreeMap::new();
        map.insert("b", vec![2, 3]);
        map.insert("a", vec![1]);
        assert_eq!(as_json(&map), json!({"a": [1], "b": [2, 3]}));
    }

    #[test]
    fn tuples_and_json_values_keep_their_shape() {
        assert_eq!(as_json(&("a", ("b", "c"))), json!(["a", ["b", "c"]]));
        let value = json!({"k": [1, "two", null, {"n": 2.5}]});
        assert_eq!(as_json(&value), value);
    }

    #[test]
    fn mutably_borrowed_cells_report_an_error_leaf() {
        let cell = RefCell::new(5);
        let _guard = cell.borrow_mut();
        assert_eq!(as_json(&cell)["__type"], "error");
    }

    #[test]
    fn held_mutex_reports_an_error_leaf_instead_of_blocking() {
        let mutex = Mutex::new(vec![1, 2]);
        assert_eq!(as_json(&mutex), json!([1, 2]));

        let _guard = mutex.lock().unwrap();
        assert_eq!(
            as_json(&mutex),
            json!({"__type": "error", "message": "value is locked"})
        );
    }

    #[test]
    fn once_cells_read_their_value_or_null() {
        let cell = OnceCell::new();
        assert_eq!(as_json(&cell), json!(null));
        cell.set("ready").unwrap();
        assert_eq!(as_json(&cell), json!("ready"));

        let lock = OnceLock::new();
        assert!(lock.is_unset());
        lock.set(vec![1, 2]).unwrap();
        assert!(!lock.is_unset());
        assert_eq!(as_json(&lock), json!([1, 2]));
    }

    struct Explodes;

    impl Inspect for Explodes {
        fn inspect(&self, _normalizer: &mut Normalizer) -> NormalizedNode {
            panic!("inspect failed");
        }
    }

    #[test]
    fn panic_under_a_mutex_guard_leaves_the_lock_unpoisoned() {
        let mutex = Mutex::new(Explodes);
        let pair = (&mutex, "after");
        assert_eq!(
            as_json(&pair),
            json!([{"__type": "error", "message": "inspection panicked"}, "after"])
        );
        assert!(!mutex.is_poisoned());
        assert!(mutex.try_lock().is_ok());
    }

    #[test]
    fn dropped_weak_references_read_as_null() {
        let strong = Rc::new(3);
        let weak = Rc::downgrade(&strong);
        assert_eq!(as_json(&weak), json!(3));
        drop(strong);
        assert_eq!(as_json(&weak), json!(null));
    }
}
