//! Who may see a publication.
//!
//! Sensitivity sets the ceiling; role and provenance narrow it:
//!
//! | Sensitivity | Metadata                         | Content                                   |
//! |-------------|----------------------------------|-------------------------------------------|
//! | PUBLIC      | everyone                         | everyone                                  |
//! | PRIVATE     | any signed-in user               | any signed-in user except internal admins |
//! | CLASSIFIED  | SYSTEM_ADMIN, or VERIFIED from the publication's provenance | same as metadata |

use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::common::{Bilingual, Locale, Principal, UserRole};
use crate::domains::publications::{Publication, Sensitivity};
use crate::kernel::ServerDeps;

/// Which view of a publication is being requested. `Data` is strictly narrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    Metadata,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Sensitivity or provenance rules out this user
    Sensitivity,
    /// Internal admins may not read private list content
    RoleRestricted,
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Publication id is missing or invalid")]
    BadRequest,

    #[error("Publication {0} not found")]
    NotFound(Uuid),

    #[error("Access to publication denied ({0:?})")]
    Forbidden(ForbiddenReason),

    #[error("Publication lookup failed: {0}")]
    Internal(#[source] anyhow::Error),
}

/// Title and body for an error page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage {
    pub title: Bilingual,
    pub message: Bilingual,
}

const BAD_REQUEST_PAGE: ErrorPage = ErrorPage {
    title: Bilingual::new("Bad request", "Cais gwael"),
    message: Bilingual::new(
        "The publication ID is missing or invalid.",
        "Mae ID y cyhoeddiad ar goll neu'n annilys.",
    ),
};

const NOT_FOUND_PAGE: ErrorPage = ErrorPage {
    title: Bilingual::new("Page not found", "Heb ddod o hyd i'r dudalen"),
    message: Bilingual::new(
        "The list you are looking for could not be found.",
        "Nid oedd modd dod o hyd i'r rhestr rydych yn chwilio amdani.",
    ),
};

const FORBIDDEN_PAGE: ErrorPage = ErrorPage {
    title: Bilingual::new("Access denied", "Mynediad wedi'i wrthod"),
    message: Bilingual::new(
        "You do not have permission to view this list.",
        "Nid oes gennych ganiatâd i weld y rhestr hon.",
    ),
};

const ROLE_RESTRICTED_PAGE: ErrorPage = ErrorPage {
    title: Bilingual::new("Access denied", "Mynediad wedi'i wrthod"),
    message: Bilingual::new(
        "Court and tribunal staff cannot view the content of private lists. \
         Contact the service desk if you need access.",
        "Ni all staff llys a thribiwnlys weld cynnwys rhestrau preifat. \
         Cysylltwch â'r ddesg gwasanaeth os oes arnoch angen mynediad.",
    ),
};

const INTERNAL_ERROR_PAGE: ErrorPage = ErrorPage {
    title: Bilingual::new(
        "Sorry, there is a problem with the service",
        "Mae'n ddrwg gennym, mae problem gyda'r gwasanaeth",
    ),
    message: Bilingual::new(
        "Please try again later.",
        "Rhowch gynnig arall arni yn nes ymlaen.",
    ),
};

impl AccessError {
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::BadRequest => 400,
            AccessError::NotFound(_) => 404,
            AccessError::Forbidden(_) => 403,
            AccessError::Internal(_) => 500,
        }
    }

    pub fn page(&self) -> ErrorPage {
        match self {
            AccessError::BadRequest => BAD_REQUEST_PAGE,
            AccessError::NotFound(_) => NOT_FOUND_PAGE,
            AccessError::Forbidden(ForbiddenReason::Sensitivity) => FORBIDDEN_PAGE,
            AccessError::Forbidden(ForbiddenReason::RoleRestricted) => ROLE_RESTRICTED_PAGE,
            AccessError::Internal(_) => INTERNAL_ERROR_PAGE,
        }
    }

    pub fn title(&self, locale: Locale) -> &'static str {
        self.page().title.get(locale)
    }

    pub fn message(&self, locale: Locale) -> &'static str {
        self.page().message.get(locale)
    }
}

/// Pure decision over the access matrix
pub fn check_access(
    publication: &Publication,
    principal: Option<&Principal>,
    scope: AccessScope,
) -> Result<(), ForbiddenReason> {
    match publication.sensitivity {
        Sensitivity::Public => Ok(()),
        Sensitivity::Private => {
            let principal = principal.ok_or(ForbiddenReason::Sensitivity)?;
            let internal_admin = principal.role.is_some_and(|role| role.is_internal_admin());
            if scope == AccessScope::Data && internal_admin {
                return Err(ForbiddenReason::RoleRestricted);
            }
            Ok(())
        }
        Sensitivity::Classified => match principal {
            Some(p) if p.is_system_admin() => Ok(()),
            Some(p) if p.has_role(UserRole::Verified) && p.provenance == publication.provenance => {
                Ok(())
            }
            _ => Err(ForbiddenReason::Sensitivity),
        },
    }
}

/// Load a publication and apply the access matrix. One store lookup per call.
pub async fn require_publication(
    publication_id: Option<&str>,
    principal: Option<&Principal>,
    scope: AccessScope,
    deps: &ServerDeps,
) -> Result<Publication, AccessError> {
    let publication_id = publication_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AccessError::BadRequest)?;
    let artefact_id = Uuid::parse_str(publication_id).map_err(|_| AccessError::BadRequest)?;

    let publication = match deps.publications.find_by_id(artefact_id).await {
        Ok(Some(publication)) => publication,
        Ok(None) => return Err(AccessError::NotFound(artefact_id)),
        Err(e) => {
            error!(artefact_id = %artefact_id, error = %e, "Publication lookup failed");
            return Err(AccessError::Internal(e));
        }
    };

    if let Some(p) = principal {
        if p.role.is_none() && publication.sensitivity == Sensitivity::Classified {
            warn!(user_id = %p.user_id, "Principal without a role requested a classified publication");
        }
    }

    check_access(&publication, principal, scope).map_err(|reason| {
        debug!(
            artefact_id = %artefact_id,
            sensitivity = %publication.sensitivity,
            ?scope,
            ?reason,
            "Publication access denied"
        );
        AccessError::Forbidden(reason)
    })?;

    Ok(publication)
}

/// Metadata view (list summaries, list pages)
pub async fn require_publication_access(
    publication_id: Option<&str>,
    principal: Option<&Principal>,
    deps: &ServerDeps,
) -> Result<Publication, AccessError> {
    require_publication(publication_id, principal, AccessScope::Metadata, deps).await
}

/// Content view (list data, downloads)
pub async fn require_publication_data_access(
    publication_id: Option<&str>,
    principal: Option<&Principal>,
    deps: &ServerDeps,
) -> Result<Publication, AccessError> {
    require_publication(publication_id, principal, AccessScope::Data, deps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Provenance;
    use crate::kernel::test_dependencies::test_publication;
    use crate::kernel::TestDependencies;

    fn principal(role: Option<UserRole>, provenance: Provenance) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: Some("user@example.com".to_string()),
            role,
            provenance,
        }
    }

    const ALL_ROLES: [Option<UserRole>; 5] = [
        None,
        Some(UserRole::Verified),
        Some(UserRole::InternalAdminLocal),
        Some(UserRole::InternalAdminCtsc),
        Some(UserRole::SystemAdmin),
    ];

    #[test]
    fn test_public_allows_everyone() {
        let publication = test_publication(Sensitivity::Public, Provenance::ManualUpload);
        for scope in [AccessScope::Metadata, AccessScope::Data] {
            assert!(check_access(&publication, None, scope).is_ok());
            for role in ALL_ROLES {
                let p = principal(role, Provenance::B2cIdam);
                assert!(check_access(&publication, Some(&p), scope).is_ok());
            }
        }
    }

    #[test]
    fn test_private_requires_authentication() {
        let publication = test_publication(Sensitivity::Private, Provenance::CftIdam);
        assert_eq!(
            check_access(&publication, None, AccessScope::Metadata),
            Err(ForbiddenReason::Sensitivity)
        );
    }

    #[test]
    fn test_private_data_denies_internal_admins() {
        let publication = test_publication(Sensitivity::Private, Provenance::CftIdam);
        for role in [UserRole::InternalAdminLocal, UserRole::InternalAdminCtsc] {
            let p = principal(Some(role), Provenance::Sso);
            assert!(check_access(&publication, Some(&p), AccessScope::Metadata).is_ok());
            assert_eq!(
                check_access(&publication, Some(&p), AccessScope::Data),
                Err(ForbiddenReason::RoleRestricted)
            );
        }
    }

    #[test]
    fn test_private_ignores_provenance() {
        let publication = test_publication(Sensitivity::Private, Provenance::CftIdam);
        let p = principal(Some(UserRole::Verified), Provenance::B2cIdam);
        assert!(check_access(&publication, Some(&p), AccessScope::Data).is_ok());
    }

    #[test]
    fn test_classified_requires_matching_provenance() {
        let publication = test_publication(Sensitivity::Classified, Provenance::CftIdam);

        let matching = principal(Some(UserRole::Verified), Provenance::CftIdam);
        let other = principal(Some(UserRole::Verified), Provenance::B2cIdam);

        for scope in [AccessScope::Metadata, AccessScope::Data] {
            assert!(check_access(&publication, Some(&matching), scope).is_ok());
            assert_eq!(
                check_access(&publication, Some(&other), scope),
                Err(ForbiddenReason::Sensitivity)
            );
        }
    }

    #[test]
    fn test_classified_always_allows_system_admin() {
        let publication = test_publication(Sensitivity::Classified, Provenance::CrimeIdam);
        let admin = principal(Some(UserRole::SystemAdmin), Provenance::Sso);
        assert!(check_access(&publication, Some(&admin), AccessScope::Data).is_ok());
    }

    #[test]
    fn test_classified_denies_internal_admins_and_anonymous() {
        let publication = test_publication(Sensitivity::Classified, Provenance::Sso);
        let local = principal(Some(UserRole::InternalAdminLocal), Provenance::Sso);
        let no_role = principal(None, Provenance::Sso);

        assert!(check_access(&publication, Some(&local), AccessScope::Metadata).is_err());
        assert!(check_access(&publication, Some(&no_role), AccessScope::Metadata).is_err());
        assert!(check_access(&publication, None, AccessScope::Metadata).is_err());
    }

    #[tokio::test]
    async fn test_missing_id_is_bad_request() {
        let deps = TestDependencies::new();
        let result = require_publication_access(None, None, &deps.server_deps()).await;
        assert!(matches!(result, Err(AccessError::BadRequest)));

        let result = require_publication_access(Some("  "), None, &deps.server_deps()).await;
        assert!(matches!(result, Err(AccessError::BadRequest)));
        assert_eq!(deps.publications.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_publication_is_not_found() {
        let deps = TestDependencies::new();
        let id = Uuid::new_v4().to_string();
        let result = require_publication_access(Some(&id), None, &deps.server_deps()).await;
        let err = result.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let deps = TestDependencies::new();
        deps.publications.fail_lookups();
        let id = Uuid::new_v4().to_string();

        let err = require_publication_data_access(Some(&id), None, &deps.server_deps())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Internal(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_allowed_publication_returned_after_single_lookup() {
        let deps = TestDependencies::new();
        let publication = test_publication(Sensitivity::Public, Provenance::ManualUpload);
        let id = publication.artefact_id;
        deps.publications.insert(publication);

        let found = require_publication_data_access(Some(&id.to_string()), None, &deps.server_deps())
            .await
            .unwrap();
        assert_eq!(found.artefact_id, id);
        assert_eq!(deps.publications.lookup_count(), 1);
    }

    #[test]
    fn test_forbidden_messages_are_distinct_and_bilingual() {
        let sensitivity = AccessError::Forbidden(ForbiddenReason::Sensitivity);
        let role = AccessError::Forbidden(ForbiddenReason::RoleRestricted);

        assert_eq!(sensitivity.status_code(), 403);
        assert_ne!(
            sensitivity.message(Locale::English),
            role.message(Locale::English)
        );
        assert_ne!(role.message(Locale::English), role.message(Locale::Welsh));
        assert_eq!(role.title(Locale::Welsh), "Mynediad wedi'i wrthod");
    }
}
