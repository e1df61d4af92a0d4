//! Field references and member paths

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::api::query::ComparisonOp;
use crate::api::query::Expr;
use crate::api::query::Predicate;
use crate::api::query::StringFunction;

use super::Literal;

/// The name of a field as declared locally and as sent on the wire.
///
/// Generated record definitions often rename fields (`number` locally,
/// `No` on the wire). Everything rendered into a request uses
/// [`FieldName::wire_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName {
    local: Cow<'static, str>,
    wire: Option<Cow<'static, str>>,
}

impl FieldName {
    /// Creates a field name whose wire name equals its local name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            local: name.into(),
            wire: None,
        }
    }

    /// Creates a field name with a distinct wire name.
    pub fn renamed(local: impl Into<Cow<'static, str>>, wire: impl Into<Cow<'static, str>>) -> Self {
        Self {
            local: local.into(),
            wire: Some(wire.into()),
        }
    }

    /// Returns the local identifier.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Returns the declared external name, falling back to the local one.
    pub fn wire_name(&self) -> &str {
        self.wire.as_deref().unwrap_or(&self.local)
    }
}

impl From<&'static str> for FieldName {
    fn from(name: &'static str) -> Self {
        FieldName::new(name)
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        FieldName::new(name)
    }
}

impl<E, T> From<Field<E, T>> for FieldName {
    fn from(field: Field<E, T>) -> Self {
        field.name()
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A path of one or more field segments, e.g. `address/city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    segments: Vec<FieldName>,
}

impl MemberPath {
    /// Creates a path from its segments.
    pub fn new(segments: impl IntoIterator<Item = FieldName>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[FieldName] {
        &self.segments
    }

    /// Renders the path using wire names, `/`-separated.
    pub fn wire_path(&self) -> String {
        self.segments
            .iter()
            .map(FieldName::wire_name)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl From<FieldName> for MemberPath {
    fn from(name: FieldName) -> Self {
        Self { segments: vec![name] }
    }
}

impl From<&'static str> for MemberPath {
    fn from(name: &'static str) -> Self {
        FieldName::new(name).into()
    }
}

/// A typed reference to field `T` of entity `E`.
///
/// Declared as associated constants next to the record definition, and used
/// to build predicates, orderings and projections without stringly-typed
/// field names.
///
/// # Example
///
/// ```
/// use businesscentral_lib::model::Field;
/// # struct Customer;
///
/// impl Customer {
///     pub const NUMBER: Field<Customer, String> = Field::renamed("number", "No");
///     pub const BALANCE: Field<Customer, i64> = Field::new("balance");
/// }
///
/// let rich = Customer::BALANCE.gt(10_000);
/// ```
pub struct Field<E, T> {
    local: &'static str,
    wire: Option<&'static str>,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> std::fmt::Debug for Field<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("local", &self.local)
            .field("wire", &self.wire)
            .finish()
    }
}

impl<E, T> From<Field<E, T>> for Expr {
    fn from(field: Field<E, T>) -> Self {
        field.member()
    }
}

impl<E, T> Field<E, T> {
    /// Declares a field whose wire name equals its local name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            local: name,
            wire: None,
            _marker: PhantomData,
        }
    }

    /// Declares a field with a distinct wire name.
    pub const fn renamed(local: &'static str, wire: &'static str) -> Self {
        Self {
            local,
            wire: Some(wire),
            _marker: PhantomData,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> FieldName {
        match self.wire {
            Some(wire) => FieldName::renamed(self.local, wire),
            None => FieldName::new(self.local),
        }
    }

    /// Returns the member-access node for this field.
    pub fn member(&self) -> Expr {
        Expr::Member(self.name().into())
    }

    /// `field eq null`
    pub fn is_null(self) -> Predicate<E> {
        self.compare(ComparisonOp::Eq, Literal::Null)
    }

    /// `field ne null`
    pub fn is_not_null(self) -> Predicate<E> {
        self.compare(ComparisonOp::Ne, Literal::Null)
    }

    fn compare(self, op: ComparisonOp, value: Literal) -> Predicate<E> {
        Predicate::from_expr(Expr::comparison(op, self.member(), Expr::Literal(value)))
    }
}

impl<E, T: Into<Literal>> Field<E, T> {
    /// `field eq value`
    pub fn eq(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Eq, to_literal::<T, _>(value))
    }

    /// `field ne value`
    pub fn ne(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Ne, to_literal::<T, _>(value))
    }

    /// `field gt value`
    pub fn gt(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Gt, to_literal::<T, _>(value))
    }

    /// `field ge value`
    pub fn ge(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Ge, to_literal::<T, _>(value))
    }

    /// `field lt value`
    pub fn lt(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Lt, to_literal::<T, _>(value))
    }

    /// `field le value`
    pub fn le(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(ComparisonOp::Le, to_literal::<T, _>(value))
    }

    /// `field in (v1,v2,...)`
    ///
    /// The values are captured eagerly; the set is always a literal
    /// collection.
    pub fn is_in<V: Into<T>>(self, values: impl IntoIterator<Item = V>) -> Predicate<E> {
        let set = values.into_iter().map(to_literal::<T, V>).collect();
        Predicate::from_expr(Expr::membership(self.member(), Expr::Collection(set)))
    }
}

impl<E> Field<E, String> {
    /// `contains(field,'value')`
    pub fn contains(self, value: impl Into<String>) -> Predicate<E> {
        self.string_call(StringFunction::Contains, value.into())
    }

    /// `startswith(field,'value')`
    pub fn starts_with(self, value: impl Into<String>) -> Predicate<E> {
        self.string_call(StringFunction::StartsWith, value.into())
    }

    /// `endswith(field,'value')`
    pub fn ends_with(self, value: impl Into<String>) -> Predicate<E> {
        self.string_call(StringFunction::EndsWith, value.into())
    }

    fn string_call(self, function: StringFunction, value: String) -> Predicate<E> {
        Predicate::from_expr(Expr::call(
            function.method_name(),
            self.member(),
            Expr::Literal(Literal::String(value)),
        ))
    }
}

fn to_literal<T: Into<Literal>, V: Into<T>>(value: V) -> Literal {
    let value: T = value.into();
    value.into()
}
