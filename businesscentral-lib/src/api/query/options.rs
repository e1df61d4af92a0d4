//! Ordered query option storage.

/// Option names understood by the query string grammar.
pub const FILTER: &str = "$filter";
pub const SELECT: &str = "$select";
pub const ORDER_BY: &str = "$orderby";
pub const TOP: &str = "$top";
pub const SKIP: &str = "$skip";
pub const COUNT: &str = "$count";
pub const EXPAND: &str = "$expand";
pub const APPLY: &str = "$apply";

/// Option name to rendered value, at most one value per name.
///
/// Keeps first-insertion order so rendering is deterministic. Replacing a
/// value keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    entries: Vec<(&'static str, String)>,
}

impl QueryOptions {
    /// Sets or replaces an option.
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Removes an option; a no-op if it is not set.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| *n != name);
    }

    /// Returns the value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the option is set.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates options in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(n, v)| (*n, v.as_str()))
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
