use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::value::Value;

/// State used for all hashing operations (grouping, bucketing, join indexes,
/// distinct sets).
///
/// Seeds are fixed so that anything derived from hash iteration order is
/// reproducible between runs.
pub const HASH_RANDOM_STATE: RandomState = RandomState::with_seeds(0, 0, 0, 0);

/// Tuple of field values identifying a group, bucket or join partner.
pub type GroupKey = Vec<Value>;

/// Unordered map keyed by group key.
pub type KeyMap<V> = HashMap<GroupKey, V, RandomState>;

/// Map keyed by group key that remembers first-insertion order.
pub type OrderedKeyMap<V> = IndexMap<GroupKey, V, RandomState>;

/// Map keyed by a single value that remembers first-insertion order.
pub type OrderedValueMap<V> = IndexMap<Value, V, RandomState>;

/// Set of values, used for membership tests.
pub type ValueSet = HashSet<Value, RandomState>;

/// Set of group keys.
pub type KeySet = HashSet<GroupKey, RandomState>;

pub fn new_key_map<V>() -> KeyMap<V> {
    HashMap::with_hasher(HASH_RANDOM_STATE)
}

pub fn new_ordered_key_map<V>() -> OrderedKeyMap<V> {
    IndexMap::with_hasher(HASH_RANDOM_STATE)
}

pub fn new_ordered_value_map<V>() -> OrderedValueMap<V> {
    IndexMap::with_hasher(HASH_RANDOM_STATE)
}

pub fn new_value_set() -> ValueSet {
    HashSet::with_hasher(HASH_RANDOM_STATE)
}

pub fn new_key_set() -> KeySet {
    HashSet::with_hasher(HASH_RANDOM_STATE)
}
