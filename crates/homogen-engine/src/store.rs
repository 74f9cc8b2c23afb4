//! Memoized mini-app values for one engine run.

use indexmap::IndexMap;

use homogen_core::{CoefValue, HomogenError, Result};

/// Name -> computed value. Presence of a name means "evaluated".
///
/// Entries appear in evaluation order. A name is written at most once
/// unless it is invalidated first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    values: IndexMap<String, CoefValue>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CoefValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, CoefValue> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Record a freshly computed value.
    pub(crate) fn insert(&mut self, name: &str, value: CoefValue) -> Result<()> {
        if self.values.contains_key(name) {
            return Err(HomogenError::configuration(format!(
                "'{}' was already evaluated in this run",
                name
            )));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Forget a value so it can be computed again.
    pub(crate) fn invalidate(&mut self, name: &str) -> Option<CoefValue> {
        self.values.shift_remove(name)
    }

    /// Clone the values of `names`, in the order given.
    pub fn gather<'a, I>(&self, names: I) -> Result<IndexMap<String, CoefValue>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| match self.values.get(name) {
                Some(value) => Ok((name.to_string(), value.clone())),
                None => Err(HomogenError::configuration(format!(
                    "'{}' has no value in the result store",
                    name
                ))),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResultStore {
    type Item = (&'a String, &'a CoefValue);
    type IntoIter = indexmap::map::Iter<'a, String, CoefValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn written_once() {
        let mut store = ResultStore::new();
        store.insert("a", CoefValue::scalar(1.0)).unwrap();
        assert!(store.insert("a", CoefValue::scalar(2.0)).is_err());
        assert_eq!(store.get("a"), Some(&CoefValue::scalar(1.0)));
    }

    #[test]
    fn invalidate_allows_rewrite() {
        let mut store = ResultStore::new();
        store.insert("a", CoefValue::scalar(1.0)).unwrap();
        store.insert("b", CoefValue::scalar(2.0)).unwrap();
        assert_eq!(store.invalidate("a"), Some(CoefValue::scalar(1.0)));
        assert!(!store.contains("a"));
        store.insert("a", CoefValue::scalar(3.0)).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn gather_in_requested_order() {
        let mut store = ResultStore::new();
        store.insert("x", CoefValue::scalar(1.0)).unwrap();
        store.insert("y", CoefValue::vector(vec![1.0, 2.0])).unwrap();
        let got = store.gather(["y", "x"]).unwrap();
        assert_eq!(got.keys().collect::<Vec<_>>(), vec!["y", "x"]);
        assert!(store.gather(["z"]).is_err());
    }
}
