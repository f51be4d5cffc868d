// Domain layer - Core types, rules and editor models

pub mod crop;
pub mod errors;
pub mod model;
pub mod rules;
pub mod timeline;
