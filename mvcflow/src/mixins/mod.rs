//! Mixins: stateless cross-cutting extensions of a controller type.

mod chain;

pub use chain::{Mixin, MixinChain};
