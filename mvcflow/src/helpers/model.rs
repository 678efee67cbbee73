//! Models with an append-only snapshot history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// A copy of a model's fields at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Model identifier when the snapshot was taken.
    pub id: Option<Value>,
    /// The copied fields.
    pub fields: T,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

/// An identified set of fields plus the snapshots taken of them.
///
/// Fields are reachable through `Deref`/`DerefMut`. Snapshots own their
/// copy, so later mutation never alters one already taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model<T> {
    id: Option<Value>,
    fields: T,
    #[serde(default = "Vec::new")]
    states: Vec<Snapshot<T>>,
}

impl<T: Clone> Model<T> {
    /// Creates a model without an identifier.
    #[must_use]
    pub fn new(fields: T) -> Self {
        Self {
            id: None,
            fields,
            states: Vec::new(),
        }
    }

    /// Creates a model with an identifier.
    #[must_use]
    pub fn with_id(id: impl Into<Value>, fields: T) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(fields)
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Sets the identifier.
    pub fn set_id(&mut self, id: impl Into<Value>) {
        self.id = Some(id.into());
    }

    /// Appends a copy of the current fields to the history.
    pub fn snapshot(&mut self) {
        self.states.push(Snapshot {
            id: self.id.clone(),
            fields: self.fields.clone(),
            taken_at: Utc::now(),
        });
    }

    /// Returns the history in recording order.
    #[must_use]
    pub fn states(&self) -> &[Snapshot<T>] {
        &self.states
    }

    /// Consumes the model, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> T {
        self.fields
    }
}

impl<T: Default + Clone> Default for Model<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for Model<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

impl<T> DerefMut for Model<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct TestFields {
        foo: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_snapshot() {
        let mut model = Model::with_id(
            1,
            TestFields {
                foo: "baz".to_string(),
                tags: vec!["a".to_string()],
            },
        );
        assert!(model.states().is_empty());

        model.snapshot();
        assert_eq!(model.states().len(), 1);
        assert_eq!(model.states()[0].fields.foo, "baz");

        model.foo = "qux".to_string();
        model.tags.push("b".to_string());
        model.snapshot();

        assert_eq!(model.states().len(), 2);
        assert_eq!(model.states()[0].fields.foo, "baz");
        assert_eq!(model.states()[0].fields.tags, vec!["a"]);
        assert_eq!(model.states()[1].fields.foo, "qux");
        assert!(model.states()[0].taken_at <= model.states()[1].taken_at);
        assert_eq!(model.states()[1].id, Some(json!(1)));
    }

    #[test]
    fn test_default_model() {
        let mut model: Model<TestFields> = Model::default();
        assert!(model.id().is_none());
        model.set_id("abc");
        assert_eq!(model.id(), Some(&json!("abc")));
        assert_eq!(model.into_fields(), TestFields::default());
    }
}
