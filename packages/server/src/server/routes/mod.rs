// HTTP routes
pub mod admin;
pub mod health;
pub mod publications;

pub use admin::*;
pub use health::*;
pub use publications::*;
