//! Ordering types for queries.

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Renders a single `$orderby` term.
    ///
    /// Ascending is the protocol default and carries no suffix.
    pub(crate) fn term(self, field: &str) -> String {
        match self {
            Direction::Asc => field.to_string(),
            Direction::Desc => format!("{} desc", field),
        }
    }
}
