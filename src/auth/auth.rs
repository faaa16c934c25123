use crate::services::error::EditError;

/// Principal of the site administrator role, which holds every permission
pub const ADMINISTRATOR_PRPL: &str = "r/administrator";

pub fn is_administrator(prpls: &[String]) -> bool {
    prpls.iter().any(|p| p == ADMINISTRATOR_PRPL)
}

pub fn has_permission(prpls: &[String], permission: &str) -> bool {
    if is_administrator(prpls) {
        return true;
    }

    let permission_prpl = format!("p/{}", permission);
    prpls.iter().any(|p| p == &permission_prpl)
}

/// Allow the caller through only if it may manage documents
pub fn check_access(prpls: &[String], manage_permission: &str) -> Result<(), EditError> {
    if has_permission(prpls, manage_permission) {
        return Ok(());
    }
    Err(EditError::AccessDenied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prpls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn permission_or_administrator_is_required() {
        let perm = "administer firestore";
        assert!(check_access(&prpls(&["u/ada", "p/administer firestore"]), perm).is_ok());
        assert!(check_access(&prpls(&["u/root", "r/administrator"]), perm).is_ok());
        assert!(matches!(
            check_access(&prpls(&["u/bob", "r/editor", "p/edit content"]), perm),
            Err(EditError::AccessDenied)
        ));
        assert!(check_access(&[], perm).is_err());
    }
}
