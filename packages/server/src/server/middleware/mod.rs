// HTTP middleware
pub mod audit_trail;
pub mod jwt_auth;
pub mod publication_access;
pub mod system_admin;

pub use audit_trail::*;
pub use jwt_auth::*;
pub use publication_access::*;
pub use system_admin::*;
