pub mod models;

pub use models::Subscription;
