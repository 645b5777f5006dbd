/*!
 * # Permissions
 *
 * Permission strings have the form `resource:action`. Document permissions
 * are derived from the document kind (`quotations:approve`,
 * `delivery_notes:send`); the constants below cover the fixed resources.
 */

/// Permission actions
pub struct Actions;

impl Actions {
    pub const READ: &'static str = "read";
    pub const CREATE: &'static str = "create";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
    pub const MANAGE: &'static str = "manage";
    pub const TRANSFER: &'static str = "transfer";
    pub const ALL: &'static str = "*";
}

/// Common permission string constants for compile-time safety
pub mod consts {
    // Reference data
    pub const REFERENCE_READ: &str = "reference:read";
    pub const REFERENCE_MANAGE: &str = "reference:manage";

    // Inventory
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_TRANSFER: &str = "inventory:transfer";

    // Dashboard
    pub const DASHBOARD_READ: &str = "dashboard:read";
}

/// Format a permission string
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

/// Whether a granted permission covers the required one. Supports
/// `resource:*` and the global `*`.
pub fn is_permission_implied(granted: &str, required: &str) -> bool {
    if granted == required || granted == Actions::ALL {
        return true;
    }

    match (granted.split_once(':'), required.split_once(':')) {
        (Some((granted_resource, Actions::ALL)), Some((required_resource, _))) => {
            granted_resource == required_resource
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_wildcard_matches() {
        assert!(is_permission_implied("quotations:read", "quotations:read"));
        assert!(is_permission_implied("quotations:*", "quotations:approve"));
        assert!(is_permission_implied("*", "imports:verify"));
        assert!(!is_permission_implied("quotations:*", "invoices:read"));
        assert!(!is_permission_implied("quotations:read", "quotations:update"));
    }

    #[test]
    fn format_joins_with_colon() {
        assert_eq!(
            format_permission("delivery_notes", Actions::DELETE),
            "delivery_notes:delete"
        );
    }
}
