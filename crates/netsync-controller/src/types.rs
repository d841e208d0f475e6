//! Type-safe controller object ID wrappers.
//!
//! Every controller object is addressed by a UUID. The wrappers here carry
//! the object kind in the type so a port id can never be passed where a rule
//! id is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use uuid::Uuid;

/// Marker trait for controller object kinds.
pub trait ObjectKind: Send + Sync + 'static {
    /// Returns the object type name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe controller object ID.
///
/// ```
/// use netsync_controller::{PortId, RuleId};
///
/// let port = PortId::new();
/// let rule = RuleId::new();
/// assert_ne!(port.as_uuid(), rule.as_uuid());
/// // fn takes_port(p: PortId) {}
/// // takes_port(rule);  // Error: expected PortId, found RuleId
/// ```
pub struct ObjectId<T: ObjectKind> {
    raw: Uuid,
    _marker: PhantomData<T>,
}

impl<T: ObjectKind> ObjectId<T> {
    /// Allocates a fresh random id.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub const fn from_uuid(raw: Uuid) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.raw
    }
}

impl<T: ObjectKind> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ObjectKind> Copy for ObjectId<T> {}

impl<T: ObjectKind> Default for ObjectId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ObjectKind> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::type_name(), self.raw)
    }
}

impl<T: ObjectKind> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T: ObjectKind> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: ObjectKind> Eq for ObjectId<T> {}

impl<T: ObjectKind> PartialOrd for ObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ObjectKind> Ord for ObjectId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: ObjectKind> Hash for ObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: ObjectKind> std::str::FromStr for ObjectId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T: ObjectKind> Serialize for ObjectId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: ObjectKind> Deserialize<'de> for ObjectId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $id_alias:ident) => {
        #[doc = concat!("Marker type for ", $type_name, " objects.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Id of a ", $type_name, " object.")]
        pub type $id_alias = ObjectId<$name>;
    };
}

define_object_kind!(RouterKind, "Router", RouterId);
define_object_kind!(BridgeKind, "Bridge", BridgeId);
define_object_kind!(PortKind, "Port", PortId);
define_object_kind!(ChainKind, "RuleChain", ChainId);
define_object_kind!(RuleKind, "Rule", RuleId);
define_object_kind!(RouteKind, "Route", RouteId);
