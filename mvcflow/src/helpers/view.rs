//! View data wrapper and the default view factory.

use crate::errors::MvcError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;

/// A renderable view.
///
/// Template engines implement this to turn the data bag into output.
#[async_trait]
pub trait ViewRender: Send + Sync + Debug {
    /// Returns the template identifier.
    fn file(&self) -> &str;

    /// Returns the data bag.
    fn data(&self) -> &Map<String, Value>;

    /// Returns the data bag mutably.
    fn data_mut(&mut self) -> &mut Map<String, Value>;

    /// Renders the view.
    async fn render(&self) -> Result<Value, MvcError>;
}

/// Builds the view returned by [`View::factory`].
pub type ViewFactory = Arc<dyn Fn(&str, Map<String, Value>) -> Box<dyn ViewRender> + Send + Sync>;

static DEFAULT_VIEW_FACTORY: RwLock<Option<ViewFactory>> = RwLock::new(None);

/// Replaces the factory behind [`View::factory`].
pub fn set_default_view_factory(factory: ViewFactory) {
    *DEFAULT_VIEW_FACTORY.write() = Some(factory);
}

/// Restores the base [`View`] as the factory product.
pub fn clear_default_view_factory() {
    *DEFAULT_VIEW_FACTORY.write() = None;
}

/// The base view: rendering returns the data bag unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// Template identifier.
    pub file: String,
    /// Values handed to the template.
    pub data: Map<String, Value>,
    /// Template used when `file` cannot be resolved.
    pub default_file: String,
}

impl View {
    /// Creates a view.
    #[must_use]
    pub fn new(file: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            file: file.into(),
            data,
            default_file: String::new(),
        }
    }

    /// Sets the fallback template.
    #[must_use]
    pub fn with_default_file(mut self, default_file: impl Into<String>) -> Self {
        self.default_file = default_file.into();
        self
    }

    /// Creates a view through the process-wide factory.
    ///
    /// Returns a base [`View`] unless [`set_default_view_factory`] installed
    /// another factory.
    #[must_use]
    pub fn factory(file: &str, data: Map<String, Value>) -> Box<dyn ViewRender> {
        let factory = DEFAULT_VIEW_FACTORY.read().clone();
        match factory {
            Some(factory) => factory(file, data),
            None => Box::new(Self::new(file, data)),
        }
    }
}

#[async_trait]
impl ViewRender for View {
    fn file(&self) -> &str {
        &self.file
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    async fn render(&self) -> Result<Value, MvcError> {
        Ok(Value::Object(self.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[derive(Debug)]
    struct UpperView(View);

    #[async_trait]
    impl ViewRender for UpperView {
        fn file(&self) -> &str {
            &self.0.file
        }

        fn data(&self) -> &Map<String, Value> {
            &self.0.data
        }

        fn data_mut(&mut self) -> &mut Map<String, Value> {
            &mut self.0.data
        }

        async fn render(&self) -> Result<Value, MvcError> {
            Ok(json!(format!("{}:{}", self.0.file, self.0.data.len()).to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_view_renders_data() {
        let view = View::new("student", data(json!({"name": "Alice"})));
        let output = view.render().await.unwrap();
        assert_eq!(output["name"], json!("Alice"));
    }

    #[test]
    fn test_view_defaults() {
        let view = View::default();
        assert_eq!(view.file, "");
        assert_eq!(view.default_file, "");
        assert_eq!(serde_json::to_string(&view.data).unwrap(), "{}");

        let view = View::new("a", Map::new()).with_default_file("fallback");
        assert_eq!(view.default_file, "fallback");
    }

    // Touches the process-wide factory, so every factory case lives here.
    #[tokio::test]
    async fn test_factory() {
        clear_default_view_factory();

        let tpl = View::factory("student", data(json!({"name": "Alice"})));
        assert_eq!(tpl.file(), "student");
        assert_eq!(tpl.render().await.unwrap()["name"], json!("Alice"));

        let mut tpl = View::factory("student", Map::new());
        tpl.data_mut().insert("club".to_string(), json!("art"));
        assert_eq!(tpl.render().await.unwrap()["club"], json!("art"));

        set_default_view_factory(Arc::new(|file: &str, data: Map<String, Value>| {
            Box::new(UpperView(View::new(file, data))) as Box<dyn ViewRender>
        }));
        let tpl = View::factory("student", data(json!({"name": "Alice"})));
        assert_eq!(tpl.render().await.unwrap(), json!("STUDENT:1"));

        clear_default_view_factory();
        let tpl = View::factory("student", Map::new());
        assert_eq!(tpl.render().await.unwrap(), json!({}));
    }
}
