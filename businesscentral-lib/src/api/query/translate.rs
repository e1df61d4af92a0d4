//! Predicate tree to `$filter` translation.

use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Weak;

use dashmap::DashMap;

use crate::error::QueryError;
use crate::model::Literal;
use crate::model::Number;

use super::expr::Expr;
use super::expr::StringFunction;

/// Upper bound on entries held by the shared translation cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

static SHARED_CACHE: LazyLock<TranslationCache> =
    LazyLock::new(|| TranslationCache::new(DEFAULT_CACHE_CAPACITY));

/// Translates a predicate tree into the filter grammar.
///
/// Comparisons and logical connectives are always parenthesized, so the
/// output never depends on operator precedence.
pub fn translate(expr: &Expr) -> Result<String, QueryError> {
    match expr {
        Expr::Comparison { op, left, right } => {
            let left = comparison_lhs(left)?;
            let right = operand(right)?;
            Ok(format!("({} {} {})", left, op.keyword(), right))
        }
        Expr::Logical { op, left, right } => Ok(format!(
            "({} {} {})",
            translate(left)?,
            op.keyword(),
            translate(right)?
        )),
        Expr::Not(inner) => Ok(format!("not ({})", translate(inner)?)),
        Expr::Member(path) => Ok(path.wire_path()),
        Expr::Literal(value) => literal(value),
        Expr::Call {
            method,
            receiver,
            argument,
        } => call(method, receiver, argument),
        Expr::In { item, set } => membership(item, set),
        Expr::Collection(_) => Err(QueryError::UnsupportedExpression(expr.describe())),
        Expr::Convert(inner) => translate(inner),
    }
}

fn comparison_lhs(expr: &Expr) -> Result<String, QueryError> {
    match expr.unwrap_convert() {
        Expr::Member(path) => Ok(path.wire_path()),
        Expr::Call {
            method,
            receiver,
            argument,
        } => call(method, receiver, argument),
        other => Err(QueryError::UnsupportedOperand(format!(
            "left side of a comparison must be a field or function call, found {}",
            other.describe()
        ))),
    }
}

fn operand(expr: &Expr) -> Result<String, QueryError> {
    match expr.unwrap_convert() {
        Expr::Member(path) => Ok(path.wire_path()),
        Expr::Literal(value) => literal(value),
        Expr::Call {
            method,
            receiver,
            argument,
        } => call(method, receiver, argument),
        other => Err(QueryError::UnsupportedOperand(other.describe())),
    }
}

fn call(method: &str, receiver: &Expr, argument: &Expr) -> Result<String, QueryError> {
    let function = StringFunction::from_method(method)
        .ok_or_else(|| QueryError::UnsupportedMethod(method.to_string()))?;
    Ok(format!(
        "{}({},{})",
        function.keyword(),
        operand(receiver)?,
        operand(argument)?
    ))
}

fn membership(item: &Expr, set: &Expr) -> Result<String, QueryError> {
    let values = match set.unwrap_convert() {
        Expr::Collection(values) => values,
        other => {
            return Err(QueryError::InvalidMembershipSet(format!(
                "expected a literal collection, found {}",
                other.describe()
            )));
        }
    };

    if values.is_empty() {
        return Err(QueryError::InvalidMembershipSet(
            "collection is empty".to_string(),
        ));
    }

    let rendered = values.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{} in ({})", operand(item)?, rendered.join(",")))
}

/// Formats a literal value for the filter grammar.
pub fn literal(value: &Literal) -> Result<String, QueryError> {
    match value {
        Literal::Null => Ok("null".to_string()),
        Literal::String(s) => Ok(escape_string(s)),
        Literal::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Literal::DateTime(dt) => Ok(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        Literal::Guid(g) => Ok(g.hyphenated().to_string()),
        Literal::Enum(name) => Ok(escape_string(name)),
        Literal::Number(n) => number(n),
        Literal::Binary(_) => Err(QueryError::UnsupportedLiteral(
            "binary values have no filter representation".to_string(),
        )),
    }
}

fn number(n: &Number) -> Result<String, QueryError> {
    if !n.is_finite() {
        return Err(QueryError::UnsupportedLiteral(format!(
            "non-finite number {}",
            n
        )));
    }
    Ok(n.to_string())
}

/// Quotes a string for the filter grammar, doubling internal single quotes.
pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Translation cache
// =============================================================================

/// Cache of translated filters keyed by predicate identity.
///
/// Entries are keyed by the address of the shared tree and hold a weak
/// reference to it. The weak reference keeps the allocation reserved, so an
/// address seen in the map always belongs to the tree it was translated
/// from. When the cache exceeds capacity, entries whose tree has been
/// dropped are pruned; if that frees nothing the cache is cleared.
///
/// Safe to populate from many threads at once.
#[derive(Debug)]
pub struct TranslationCache {
    entries: DashMap<usize, CacheEntry>,
    capacity: usize,
}

#[derive(Debug)]
struct CacheEntry {
    source: Weak<Expr>,
    filter: String,
}

impl TranslationCache {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the process-wide cache used by query builders.
    pub fn shared() -> &'static TranslationCache {
        &SHARED_CACHE
    }

    /// Returns the cached translation of `expr`, translating on a miss.
    ///
    /// Failed translations are not cached.
    pub fn get_or_translate(&self, expr: &Arc<Expr>) -> Result<String, QueryError> {
        let key = Arc::as_ptr(expr) as usize;

        if let Some(entry) = self.entries.get(&key)
            && std::ptr::eq(entry.source.as_ptr(), Arc::as_ptr(expr))
        {
            return Ok(entry.filter.clone());
        }

        let filter = translate(expr)?;

        self.entries.insert(
            key,
            CacheEntry {
                source: Arc::downgrade(expr),
                filter: filter.clone(),
            },
        );

        // Checked after the insert so racing writers cannot leave it over capacity.
        if self.entries.len() > self.capacity {
            self.prune();
        }

        Ok(filter)
    }

    fn prune(&self) {
        self.entries.retain(|_, entry| entry.source.strong_count() > 0);
        if self.entries.len() > self.capacity {
            log::debug!(
                "translation cache full ({} live entries), clearing",
                self.entries.len()
            );
            self.entries.clear();
        }
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
