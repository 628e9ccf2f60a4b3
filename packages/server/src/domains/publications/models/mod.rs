pub mod publication;

pub use publication::{Publication, Sensitivity};
