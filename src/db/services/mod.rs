//! Query layer over the entities. Every function here is scoped to an
//! owning user where the data model calls for it; handlers never filter
//! ownership themselves.

pub mod ingredient_service;
pub mod recipe_service;
pub mod tag_service;

pub use ingredient_service::*;
pub use recipe_service::*;
pub use tag_service::*;
