pub mod access;
pub mod list_types;
pub mod models;
pub mod processor;

pub use access::{
    check_access, require_publication, require_publication_access,
    require_publication_data_access, AccessError, AccessScope, ForbiddenReason,
};
pub use list_types::{find_list_type, list_type_display_name, ListType, LIST_TYPES};
pub use models::{Publication, Sensitivity};
pub use processor::{
    process_publication_after_save, ProcessPublicationParams, ProcessPublicationResult,
    MAX_PDF_SIZE_BYTES,
};
