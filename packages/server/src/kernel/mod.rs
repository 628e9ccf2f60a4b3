//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod pdf_renderer;
pub mod test_dependencies;
pub mod traits;

pub use deps::{NotifyAdapter, PostgresStore, ServerDeps};
pub use pdf_renderer::{HttpPdfRenderer, PdfRendererRegistry};
pub use test_dependencies::TestDependencies;
pub use traits::*;
