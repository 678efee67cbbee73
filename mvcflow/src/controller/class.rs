//! Controller types: a name, an ordered mixin list and options.

use super::ControllerOptions;
use crate::errors::MvcError;
use crate::mixins::{Mixin, MixinChain};
use std::sync::Arc;

/// Name of the root controller type.
pub const BASE_CONTROLLER_NAME: &str = "Controller";

/// The type-level configuration shared by every controller instance of
/// one kind.
///
/// A subtype starts from a copy of its parent's mixin list and options and
/// appends to it. Once wrapped in an `Arc` the type can no longer change.
#[derive(Debug, Clone)]
pub struct ControllerType {
    name: String,
    mixins: MixinChain,
    options: ControllerOptions,
}

impl ControllerType {
    /// Creates a root type with no mixins.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mixins: MixinChain::new(),
            options: ControllerOptions::default(),
        }
    }

    /// Creates the base `Controller` type.
    #[must_use]
    pub fn base() -> Self {
        Self::new(BASE_CONTROLLER_NAME)
    }

    /// Creates a subtype inheriting this type's mixins and options.
    #[must_use]
    pub fn subtype(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mixins: self.mixins.clone(),
            options: self.options.clone(),
        }
    }

    /// Appends a mixin.
    #[must_use]
    pub fn with_mixin(mut self, mixin: Arc<dyn Mixin>) -> Self {
        self.mixins.add(mixin);
        self
    }

    /// Appends several mixins, in order.
    #[must_use]
    pub fn with_mixins(mut self, mixins: impl IntoIterator<Item = Arc<dyn Mixin>>) -> Self {
        for mixin in mixins {
            self.mixins.add(mixin);
        }
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the 404-suppression toggle.
    #[must_use]
    pub fn suppress_action_not_found(mut self, suppress: bool) -> Self {
        self.options.suppress_action_not_found = suppress;
        self
    }

    /// Validates the options and seals the type.
    pub fn build(self) -> Result<Arc<Self>, MvcError> {
        self.options.validate()?;
        Ok(Arc::new(self))
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attached mixins.
    #[must_use]
    pub fn mixins(&self) -> &MixinChain {
        &self.mixins
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }
}

impl Default for ControllerType {
    fn default() -> Self {
        Self::base()
    }
}
