// Court and Tribunal Hearings - publication core
//
// Decides who may see a publication, finishes processing newly saved
// publications (PDF + subscriber emails) and keeps the admin audit trail.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
