//! Predicate expression trees.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::model::Literal;
use crate::model::MemberPath;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl ComparisonOp {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
        }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

impl LogicalOp {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// String functions the filter grammar understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFunction {
    /// `contains(receiver,argument)`
    Contains,
    /// `startswith(receiver,argument)`
    StartsWith,
    /// `endswith(receiver,argument)`
    EndsWith,
}

impl StringFunction {
    /// Resolves a method name (case-insensitive) to a string function.
    pub fn from_method(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "contains" => Some(StringFunction::Contains),
            "startswith" => Some(StringFunction::StartsWith),
            "endswith" => Some(StringFunction::EndsWith),
            _ => None,
        }
    }

    /// The method name a call node uses for this function.
    pub fn method_name(self) -> &'static str {
        match self {
            StringFunction::Contains => "Contains",
            StringFunction::StartsWith => "StartsWith",
            StringFunction::EndsWith => "EndsWith",
        }
    }

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            StringFunction::Contains => "contains",
            StringFunction::StartsWith => "startswith",
            StringFunction::EndsWith => "endswith",
        }
    }
}

/// A node of a predicate expression tree.
///
/// Trees are normally built through [`Field`](crate::model::Field) helpers
/// and [`Predicate`] combinators, which only produce translatable shapes.
/// Hand-built trees may contain shapes the filter grammar cannot express;
/// those fail translation with a [`QueryError`](crate::error::QueryError)
/// naming the offending node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Binary comparison: `(left op right)`.
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical connective: `(left and right)`.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Negation: `not (inner)`.
    Not(Box<Expr>),
    /// Access to a field of the queried record.
    Member(MemberPath),
    /// A constant.
    Literal(Literal),
    /// Method call on a receiver, e.g. `name.Contains("x")`.
    Call {
        method: String,
        receiver: Box<Expr>,
        argument: Box<Expr>,
    },
    /// Membership test: `item in (v1,v2,...)`.
    In { item: Box<Expr>, set: Box<Expr> },
    /// A captured collection of constants.
    Collection(Vec<Literal>),
    /// Type coercion wrapper; transparent when rendered.
    Convert(Box<Expr>),
}

impl Expr {
    /// Creates a comparison node.
    pub fn comparison(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a logical node.
    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a method call node.
    pub fn call(method: impl Into<String>, receiver: Expr, argument: Expr) -> Self {
        Expr::Call {
            method: method.into(),
            receiver: Box::new(receiver),
            argument: Box::new(argument),
        }
    }

    /// Creates a membership test node.
    pub fn membership(item: Expr, set: Expr) -> Self {
        Expr::In {
            item: Box::new(item),
            set: Box::new(set),
        }
    }

    /// Creates a member access node.
    pub fn member(path: impl Into<MemberPath>) -> Self {
        Expr::Member(path.into())
    }

    /// Creates a literal node.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Expr::Literal(value.into())
    }

    /// Wraps this node in a type coercion.
    pub fn convert(self) -> Self {
        Expr::Convert(Box::new(self))
    }

    /// Strips any number of coercion wrappers.
    pub fn unwrap_convert(&self) -> &Expr {
        let mut current = self;
        while let Expr::Convert(inner) = current {
            current = inner;
        }
        current
    }

    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Expr::Comparison { op, .. } => format!("comparison '{}'", op.keyword()),
            Expr::Logical { op, .. } => format!("logical '{}'", op.keyword()),
            Expr::Not(_) => "negation".to_string(),
            Expr::Member(path) => format!("member '{}'", path.wire_path()),
            Expr::Literal(value) => format!("{} literal", value.type_name()),
            Expr::Call { method, .. } => format!("call to '{}'", method),
            Expr::In { .. } => "membership test".to_string(),
            Expr::Collection(_) => "collection".to_string(),
            Expr::Convert(inner) => inner.describe(),
        }
    }
}

/// A boolean condition over records of type `E`.
///
/// Immutable once built and cheap to clone; clones share the same tree, so
/// a predicate reused across queries is translated once.
///
/// # Example
///
/// ```ignore
/// let filter = Customer::BALANCE.gt(0)
///     .and(Customer::COUNTRY.eq("US"));
/// // ((balance gt 0) and (country eq 'US'))
/// ```
pub struct Predicate<E> {
    expr: Arc<Expr>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self {
            expr: Arc::clone(&self.expr),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

impl<E> Predicate<E> {
    /// Wraps a raw expression tree.
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr: Arc::new(expr),
            _entity: PhantomData,
        }
    }

    /// Returns the root node.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub(crate) fn shared(&self) -> &Arc<Expr> {
        &self.expr
    }

    /// `(self and other)`
    pub fn and(self, other: Predicate<E>) -> Predicate<E> {
        self.combine(LogicalOp::And, other)
    }

    /// `(self or other)`
    pub fn or(self, other: Predicate<E>) -> Predicate<E> {
        self.combine(LogicalOp::Or, other)
    }

    /// `not (self)`
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate<E> {
        Predicate::from_expr(Expr::Not(Box::new(self.into_expr())))
    }

    fn combine(self, op: LogicalOp, other: Predicate<E>) -> Predicate<E> {
        Predicate::from_expr(Expr::logical(op, self.into_expr(), other.into_expr()))
    }

    fn into_expr(self) -> Expr {
        Arc::try_unwrap(self.expr).unwrap_or_else(|shared| (*shared).clone())
    }
}
