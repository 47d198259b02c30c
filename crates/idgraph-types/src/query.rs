//! Query parameters
//!
//! A query parameter is a plain immutable value: a name, an optional
//! owning kind, and a discriminator saying whether it constrains a role,
//! an attribute, or the relationship's label. Parameters are compared by
//! value; relationship-kind modules expose theirs as constants so callers
//! can build queries without knowing index structure.

use std::borrow::Cow;
use std::fmt;

use crate::attributes::AttributeValue;
use crate::error::{Error, Result};
use crate::schema::RelationshipKind;

/// What a parameter constrains on the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterTarget {
    /// A declared role of the kind being queried.
    Role,
    /// An attribute name.
    Attribute,
    /// The relationship's label.
    Name,
}

/// A named, strongly-typed handle used to constrain a query.
///
/// `kind` is `None` for universal parameters ([`NAME`], [`FROM`], [`TO`]
/// and unscoped attribute parameters); a `Some` kind restricts the
/// parameter to queries over that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    kind: Option<Cow<'static, str>>,
    name: Cow<'static, str>,
    target: ParameterTarget,
}

/// Universal parameter constraining the relationship's label.
pub const NAME: QueryParameter = QueryParameter {
    kind: None,
    name: Cow::Borrowed("name"),
    target: ParameterTarget::Name,
};

/// Universal parameter for the conventional `from` role.
pub const FROM: QueryParameter = QueryParameter::universal_role("from");

/// Universal parameter for the conventional `to` role.
pub const TO: QueryParameter = QueryParameter::universal_role("to");

impl QueryParameter {
    /// A role parameter usable with any kind that declares the role.
    pub const fn universal_role(name: &'static str) -> Self {
        Self {
            kind: None,
            name: Cow::Borrowed(name),
            target: ParameterTarget::Role,
        }
    }

    /// A role parameter scoped to one kind. Suitable for `const` items in
    /// a kind's module.
    pub const fn scoped_role(kind: &'static str, name: &'static str) -> Self {
        Self {
            kind: Some(Cow::Borrowed(kind)),
            name: Cow::Borrowed(name),
            target: ParameterTarget::Role,
        }
    }

    /// An attribute parameter scoped to one kind.
    pub const fn scoped_attribute(kind: &'static str, name: &'static str) -> Self {
        Self {
            kind: Some(Cow::Borrowed(kind)),
            name: Cow::Borrowed(name),
            target: ParameterTarget::Attribute,
        }
    }

    /// A role parameter built at runtime for the given kind.
    pub fn role(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: Some(Cow::Owned(kind.into())),
            name: Cow::Owned(name.into()),
            target: ParameterTarget::Role,
        }
    }

    /// An attribute parameter usable with any kind.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            kind: None,
            name: Cow::Owned(name.into()),
            target: ParameterTarget::Attribute,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> ParameterTarget {
        self.target
    }

    /// The kind this parameter is scoped to, if any.
    pub fn owning_kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Check that this parameter may constrain a query over `kind`.
    ///
    /// Fails with [`Error::SchemaMismatch`] when the parameter is scoped
    /// to a different kind, or when a role parameter names a role the
    /// kind does not declare.
    pub fn validate_for(&self, kind: &RelationshipKind) -> Result<()> {
        if let Some(owner) = self.owning_kind() {
            if owner != kind.type_id {
                return Err(self.mismatch(kind));
            }
        }
        if self.target == ParameterTarget::Role && !kind.has_role(&self.name) {
            return Err(self.mismatch(kind));
        }
        Ok(())
    }

    fn mismatch(&self, kind: &RelationshipKind) -> Error {
        Error::SchemaMismatch {
            parameter: self.name.to_string(),
            kind: kind.type_id.clone(),
        }
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}:{}", kind, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A value bound to a query parameter.
///
/// The variant must match the parameter's target: role parameters take
/// [`QueryValue::Identity`], the name parameter takes
/// [`QueryValue::Label`], attribute parameters take
/// [`QueryValue::Attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// An identity id, matched as a member of the role's binding set.
    Identity(String),
    /// A relationship label.
    Label(String),
    /// An exact attribute value.
    Attribute(AttributeValue),
}

impl QueryValue {
    /// Whether this value's shape fits the given parameter target.
    pub fn matches(&self, target: ParameterTarget) -> bool {
        matches!(
            (self, target),
            (QueryValue::Identity(_), ParameterTarget::Role)
                | (QueryValue::Label(_), ParameterTarget::Name)
                | (QueryValue::Attribute(_), ParameterTarget::Attribute)
        )
    }
}

impl From<AttributeValue> for QueryValue {
    fn from(value: AttributeValue) -> Self {
        QueryValue::Attribute(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Cardinality, RelationshipKind};

    fn authorization_kind() -> RelationshipKind {
        RelationshipKind::builder("authorization")
            .role("user", Cardinality::One)
            .role("application", Cardinality::One)
            .build()
    }

    #[test]
    fn test_universal_name_applies_to_any_kind() {
        NAME.validate_for(&authorization_kind()).unwrap();
        NAME.validate_for(&RelationshipKind::directed("grant")).unwrap();
    }

    #[test]
    fn test_from_to_require_declared_roles() {
        let directed = RelationshipKind::directed("grant");
        FROM.validate_for(&directed).unwrap();
        TO.validate_for(&directed).unwrap();

        // The authorization kind declares user/application only, so the
        // conventional from/to do not resolve against it.
        let err = FROM.validate_for(&authorization_kind()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_scoped_parameter_rejects_other_kind() {
        const USER: QueryParameter = QueryParameter::scoped_role("authorization", "user");
        USER.validate_for(&authorization_kind()).unwrap();
        let err = USER.validate_for(&RelationshipKind::directed("grant")).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_role_parameter_requires_declared_role() {
        let param = QueryParameter::role("authorization", "owner");
        let err = param.validate_for(&authorization_kind()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_parameters_compare_by_value() {
        let a = QueryParameter::role("authorization", "user");
        let b = QueryParameter::scoped_role("authorization", "user");
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_shapes() {
        assert!(QueryValue::Identity("id".into()).matches(ParameterTarget::Role));
        assert!(QueryValue::Label("authorized".into()).matches(ParameterTarget::Name));
        assert!(QueryValue::Attribute(AttributeValue::Text("at".into()))
            .matches(ParameterTarget::Attribute));
        assert!(!QueryValue::Label("authorized".into()).matches(ParameterTarget::Role));
    }
}
