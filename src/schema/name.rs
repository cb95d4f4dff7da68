//! Names and namespaces of named schemas.
//!
//! A full name is `namespace + "." + name`. Every component must match
//! `[A-Za-z_][A-Za-z0-9_]*`.

use std::fmt;

use crate::error::SchemaError;

/// Qualified name of a record, error, enum or fixed schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    name: String,
    namespace: Option<String>,
}

impl Name {
    /// Parse a possibly qualified name such as `com.example.User`.
    pub fn new(name: &str) -> Result<Self, SchemaError> {
        match name.rsplit_once('.') {
            Some((ns, simple)) => Self::with_namespace(simple, ns),
            None => {
                validate_identifier(name, "Name")?;
                Ok(Self {
                    name: name.to_string(),
                    namespace: None,
                })
            }
        }
    }

    /// Build a name from a simple name and a namespace.
    ///
    /// An empty namespace means the null namespace. If `name` is itself
    /// qualified, its own namespace wins.
    pub fn with_namespace(name: &str, namespace: &str) -> Result<Self, SchemaError> {
        if name.contains('.') {
            return Self::new(name);
        }
        validate_identifier(name, "Name")?;
        let namespace = if namespace.is_empty() {
            None
        } else {
            validate_namespace(namespace)?;
            Some(namespace.to_string())
        };
        Ok(Self {
            name: name.to_string(),
            namespace,
        })
    }

    /// Resolve `name` relative to an enclosing namespace.
    pub fn resolve(name: &str, enclosing: Option<&str>) -> Result<Self, SchemaError> {
        match enclosing {
            Some(ns) if !name.contains('.') => Self::with_namespace(name, ns),
            _ => Self::new(name),
        }
    }

    /// The simple (unqualified) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Validate that an identifier follows Avro naming rules.
///
/// Identifiers must start with `[A-Za-z_]` and contain only `[A-Za-z0-9_]`.
pub fn validate_identifier(ident: &str, context: &str) -> Result<(), SchemaError> {
    let mut chars = ident.chars();
    let first = chars
        .next()
        .ok_or_else(|| SchemaError::InvalidName(format!("{} cannot be empty", context)))?;

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(SchemaError::InvalidName(format!(
            "{} '{}' must start with a letter or underscore",
            context, ident
        )));
    }

    if let Some(bad) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(SchemaError::InvalidName(format!(
            "{} '{}' contains invalid character '{}'",
            context, ident, bad
        )));
    }

    Ok(())
}

/// Validate each dot-separated component of a namespace.
pub fn validate_namespace(namespace: &str) -> Result<(), SchemaError> {
    for component in namespace.split('.') {
        validate_identifier(component, "Namespace component")?;
    }
    Ok(())
}
