// Business domains
pub mod audit;
pub mod locations;
pub mod notifications;
pub mod publications;
pub mod subscriptions;
pub mod users;
