//! The model seam: named, typed attribute access.
//!
//! A model is an arbitrary application object; the proxy reads and writes
//! it exclusively through the [`Model`] trait. Attribute names are dotted
//! paths (`"address.city"`), letting one proxy reach into nested structures.
//!
//! [`Record`] is a map-backed implementation with nested children, useful
//! for tests, prototypes, and dynamically-shaped data.

use std::any::Any;
use std::collections::HashMap;

use crate::convert::Value;

/// Errors a model can raise while being read or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The attribute path does not resolve on this model.
    #[error("model has no attribute '{0}'")]
    UnknownAttribute(String),

    /// The model's setter rejected the value.
    #[error("attribute '{attribute}' rejected value: {message}")]
    Rejected {
        /// The attribute that rejected the write.
        attribute: String,
        /// The model's explanation.
        message: String,
    },
}

/// Named attribute access, as the proxy sees a model.
///
/// Implementations route dotted paths however fits their structure; the
/// proxy never interprets path segments itself.
pub trait Model: Send + Sync {
    /// Read an attribute. `None` when the path does not resolve.
    fn get_attribute(&self, path: &str) -> Option<Value>;

    /// Write an attribute through the model's own accessors.
    ///
    /// A rejection here is the model's business logic speaking; the proxy
    /// routes it to the registered write-error handler.
    fn set_attribute(&mut self, path: &str, value: Value) -> Result<(), ModelError>;

    /// The model as `Any`, for instance-type matching on model swaps.
    fn as_any(&self) -> &dyn Any;

    /// Human-readable type name for error messages.
    fn type_name(&self) -> &'static str;
}

/// A map-backed model with nested child records.
///
/// # Example
///
/// ```
/// use trellis::convert::Value;
/// use trellis::proxy::{Model, Record};
///
/// let mut person = Record::new();
/// person.set("name", Value::Str("Ada".into()));
///
/// let mut address = Record::new();
/// address.set("city", Value::Str("London".into()));
/// person.insert_child("address", address);
///
/// assert_eq!(
///     person.get_attribute("address.city"),
///     Some(Value::Str("London".into()))
/// );
/// ```
#[derive(Default)]
pub struct Record {
    values: HashMap<String, Value>,
    children: HashMap<String, Record>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a direct (non-dotted) attribute.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Read a direct attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Attach a child record reachable through dotted paths.
    pub fn insert_child(&mut self, name: impl Into<String>, child: Record) {
        self.children.insert(name.into(), child);
    }

    /// Borrow a child record.
    pub fn child(&self, name: &str) -> Option<&Record> {
        self.children.get(name)
    }

    fn resolve<'s, 'p>(&'s self, path: &'p str) -> Option<(&'s Record, &'p str)> {
        let mut record = self;
        let mut rest = path;
        while let Some((head, tail)) = rest.split_once('.') {
            record = record.children.get(head)?;
            rest = tail;
        }
        Some((record, rest))
    }

    fn resolve_mut<'s, 'p>(&'s mut self, path: &'p str) -> Option<(&'s mut Record, &'p str)> {
        let mut record = self;
        let mut rest = path;
        while let Some((head, tail)) = rest.split_once('.') {
            record = record.children.get_mut(head)?;
            rest = tail;
        }
        Some((record, rest))
    }
}

impl Model for Record {
    fn get_attribute(&self, path: &str) -> Option<Value> {
        let (record, leaf) = self.resolve(path)?;
        record.values.get(leaf).cloned()
    }

    fn set_attribute(&mut self, path: &str, value: Value) -> Result<(), ModelError> {
        let Some((record, leaf)) = self.resolve_mut(path) else {
            return Err(ModelError::UnknownAttribute(path.to_string()));
        };
        record.values.insert(leaf.to_string(), value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "Record"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_attributes() {
        let mut record = Record::new();
        record.set("age", Value::Int(40));
        assert_eq!(record.get_attribute("age"), Some(Value::Int(40)));
        assert_eq!(record.get_attribute("missing"), None);
    }

    #[test]
    fn test_dotted_paths() {
        let mut address = Record::new();
        address.set("city", Value::Str("Paris".into()));
        let mut person = Record::new();
        person.insert_child("address", address);

        assert_eq!(
            person.get_attribute("address.city"),
            Some(Value::Str("Paris".into()))
        );
        assert_eq!(person.get_attribute("address.street"), None);
        assert_eq!(person.get_attribute("office.city"), None);

        person
            .set_attribute("address.city", Value::Str("Lyon".into()))
            .unwrap();
        assert_eq!(
            person.get_attribute("address.city"),
            Some(Value::Str("Lyon".into()))
        );
    }

    #[test]
    fn test_set_through_missing_child_fails() {
        let mut person = Record::new();
        let err = person
            .set_attribute("address.city", Value::Str("Rome".into()))
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownAttribute("address.city".into()));
    }

    #[test]
    fn test_set_creates_leaf_attribute() {
        let mut record = Record::new();
        record.set_attribute("fresh", Value::Bool(true)).unwrap();
        assert_eq!(record.get_attribute("fresh"), Some(Value::Bool(true)));
    }
}
