//! Concrete rulesets implementing [`crate::GameMode`].

mod tap;

pub use tap::TapMode;
