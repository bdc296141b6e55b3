//! Helpers shared across the dispatch services

use arteria_core::{ArteriaResult, AuthError, Credential, OrgDirectory, OrgId};

/// Resolve the caller's organization through the injected directory.
///
/// Authorization is recomputed on every call; there is no cached session
/// state anywhere in the services.
pub(crate) fn resolve_caller(
    directory: &OrgDirectory,
    caller: &Credential,
) -> ArteriaResult<OrgId> {
    Ok(directory.resolve(caller)?)
}

/// Require that the caller's organization owns the resource.
pub(crate) fn require_same_org(
    caller_org: &OrgId,
    owner_org: &OrgId,
    action: &'static str,
) -> ArteriaResult<()> {
    if caller_org != owner_org {
        return Err(AuthError::OrgMismatch {
            caller_org: caller_org.to_string(),
            owner_org: owner_org.to_string(),
            action,
        }
        .into());
    }
    Ok(())
}
