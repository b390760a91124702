use std::fmt;
use std::sync::Arc;

use datatable_error::{DataTableError, Result};

use super::{Hierarchy, Node};
use crate::criterion::ValuePredicate;
use crate::hash::{ValueSet, new_value_set};
use crate::value::Value;

/// Predicate over a key and the subtree below it.
pub type BranchPredicate = Arc<dyn Fn(&Value, &Node) -> Result<bool> + Send + Sync>;

/// Selects keys at one level of a hierarchy.
#[derive(Clone)]
pub enum KeyCriterion {
    /// Every key.
    All,
    /// A single key.
    Key(Value),
    /// Keys between the bounds, inclusive.
    Range(Value, Value),
    /// Keys contained in the set.
    Set(ValueSet),
    /// Keys for which the predicate returns true.
    Predicate(ValuePredicate),
    /// Keys for which the predicate over key and subtree returns true.
    Branch(BranchPredicate),
}

impl KeyCriterion {
    pub fn key(value: impl Into<Value>) -> Self {
        KeyCriterion::Key(value.into())
    }

    pub fn range(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        KeyCriterion::Range(low.into(), high.into())
    }

    pub fn set<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut set = new_value_set();
        set.extend(values.into_iter().map(Into::into));
        KeyCriterion::Set(set)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        KeyCriterion::Predicate(Arc::new(move |key: &Value| -> Result<bool> { Ok(f(key)) }))
    }

    pub fn try_predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool> + Send + Sync + 'static,
    {
        KeyCriterion::Predicate(Arc::new(f))
    }

    pub fn branch<F>(f: F) -> Self
    where
        F: Fn(&Value, &Node) -> bool + Send + Sync + 'static,
    {
        KeyCriterion::Branch(Arc::new(move |key: &Value, node: &Node| -> Result<bool> {
            Ok(f(key, node))
        }))
    }

    pub fn try_branch<F>(f: F) -> Self
    where
        F: Fn(&Value, &Node) -> Result<bool> + Send + Sync + 'static,
    {
        KeyCriterion::Branch(Arc::new(f))
    }

    pub fn matches(&self, key: &Value, node: &Node) -> Result<bool> {
        Ok(match self {
            KeyCriterion::All => true,
            KeyCriterion::Key(k) => k == key,
            KeyCriterion::Range(low, high) => low <= key && key <= high,
            KeyCriterion::Set(set) => set.contains(key),
            KeyCriterion::Predicate(f) => f(key)?,
            KeyCriterion::Branch(f) => f(key, node)?,
        })
    }
}

impl fmt::Debug for KeyCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Self::Range(low, high) => f.debug_tuple("Range").field(low).field(high).finish(),
            Self::Set(set) => f.debug_tuple("Set").field(set).finish(),
            Self::Predicate(_) => write!(f, "Predicate(..)"),
            Self::Branch(_) => write!(f, "Branch(..)"),
        }
    }
}

impl Hierarchy {
    /// Hierarchy holding only the branches selected by `path`, one criterion
    /// per level starting at the top. Levels below the path are kept whole.
    ///
    /// Branches left without any leaf rows are dropped. A path longer than the
    /// hierarchy is deep is an error.
    pub fn subset(&self, path: &[KeyCriterion]) -> Result<Hierarchy> {
        if path.len() > self.depth() {
            return Err(DataTableError::InvalidKeyPath(format!(
                "path of length {} for hierarchy of depth {}",
                path.len(),
                self.depth()
            )));
        }
        self.subset_inner(path)
    }

    fn subset_inner(&self, path: &[KeyCriterion]) -> Result<Hierarchy> {
        let Some((criterion, rest)) = path.split_first() else {
            return Ok(self.clone());
        };

        let mut out = self.empty_like();
        for (key, node) in &self.children {
            if !criterion.matches(key, node)? {
                continue;
            }
            let node = match node {
                Node::Branch(h) if !rest.is_empty() => Node::Branch(h.subset_inner(rest)?),
                _ => node.clone(),
            };
            if !node.is_empty() {
                out.children.insert(key.clone(), node);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;
    use crate::table::Table;

    fn sample() -> Hierarchy {
        let t: Table = table!(["a", "b", "c"];
            [1, "x", 10],
            [1, "y", 11],
            [2, "x", 12],
            [3, "z", 13],
        );
        t.index(&["a", "b"], None).unwrap()
    }

    fn flat_c(h: &Hierarchy) -> Vec<i64> {
        h.rows()
            .iter()
            .filter_map(|r| r.get_or_null("c").as_i64())
            .collect()
    }

    #[test]
    fn single_key() {
        let h = sample().subset(&[KeyCriterion::key(1)]).unwrap();
        assert_eq!(vec![10, 11], flat_c(&h));
    }

    #[test]
    fn range_is_inclusive() {
        let h = sample().subset(&[KeyCriterion::range(2, 3)]).unwrap();
        assert_eq!(vec![12, 13], flat_c(&h));
    }

    #[test]
    fn path_prunes_empty_branches() {
        let h = sample()
            .subset(&[KeyCriterion::All, KeyCriterion::set(["x"])])
            .unwrap();
        assert_eq!(vec![10, 12], flat_c(&h));
        // Key 3 has no "x" branch so it's gone entirely.
        assert!(!h.contains_key(&Value::from(3)));
    }

    #[test]
    fn predicates() {
        let h = sample()
            .subset(&[KeyCriterion::predicate(|k| k.as_i64().is_some_and(|k| k != 2))])
            .unwrap();
        assert_eq!(vec![10, 11, 13], flat_c(&h));

        let h = sample()
            .subset(&[KeyCriterion::branch(|_, node| node.len() > 1)])
            .unwrap();
        assert_eq!(vec![10, 11], flat_c(&h));
    }

    #[test]
    fn predicate_error_is_returned() {
        let err = sample()
            .subset(&[
                KeyCriterion::All,
                KeyCriterion::try_predicate(|k| {
                    if k == &Value::from("z") {
                        Err(DataTableError::type_mismatch("unexpected z"))
                    } else {
                        Ok(true)
                    }
                }),
            ])
            .unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(ref m) if m == "unexpected z"));
    }

    #[test]
    fn missing_key_gives_empty() {
        let h = sample().subset(&[KeyCriterion::key(99)]).unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn path_too_long() {
        let path = [KeyCriterion::All, KeyCriterion::All, KeyCriterion::All];
        assert!(matches!(
            sample().subset(&path),
            Err(DataTableError::InvalidKeyPath(_))
        ));
    }
}
