//! Role-based authorization.
//!
//! Each role maps to a static allow-list of `"{resource}.{action}"`
//! permission keys. Admin holds the wildcard. Handlers must check the
//! permission before touching any repository; a denied check must not
//! produce any side effect.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

/// Everything a manager can do. Admin bypasses the table entirely.
const MANAGER_PERMISSIONS: &[&str] = &[
    "products.view",
    "products.create",
    "products.edit",
    "products.delete",
    "categories.view",
    "categories.create",
    "categories.edit",
    "categories.delete",
    "stock.view",
    "stock.adjust",
    "customers.view",
    "customers.create",
    "customers.edit",
    "customers.delete",
    "suppliers.view",
    "suppliers.create",
    "suppliers.edit",
    "suppliers.delete",
    "sales.view",
    "sales.create",
    "sales.edit",
    "sales.delete",
    "sales.update_status",
    "purchases.view",
    "purchases.create",
    "purchases.edit",
    "purchases.delete",
    "purchases.update_status",
    "invoices.view",
    "invoices.create",
    "invoices.edit",
    "invoices.delete",
    "payments.view",
    "payments.create",
    "activity.view",
];

const EMPLOYEE_PERMISSIONS: &[&str] = &[
    "products.view",
    "categories.view",
    "stock.view",
    "customers.view",
    "customers.create",
    "customers.edit",
    "sales.view",
    "sales.create",
    "purchases.view",
    "invoices.view",
    "payments.view",
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &["*"],
            Role::Manager => MANAGER_PERMISSIONS,
            Role::Employee => EMPLOYEE_PERMISSIONS,
        }
    }

    /// Check a `"{resource}.{action}"` permission key against this role.
    pub fn is_authorized(&self, permission: &str) -> bool {
        match self {
            Role::Admin => true,
            _ => self.permissions().iter().any(|p| *p == permission),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_wildcard() {
        assert!(Role::Admin.is_authorized("products.delete"));
        assert!(Role::Admin.is_authorized("users.create"));
        assert!(Role::Admin.is_authorized("anything.at_all"));
    }

    #[test]
    fn manager_cannot_manage_users() {
        assert!(Role::Manager.is_authorized("sales.update_status"));
        assert!(Role::Manager.is_authorized("invoices.create"));
        assert!(!Role::Manager.is_authorized("users.create"));
        assert!(!Role::Manager.is_authorized("users.delete"));
    }

    #[test]
    fn employee_is_mostly_read_only() {
        assert!(Role::Employee.is_authorized("sales.create"));
        assert!(Role::Employee.is_authorized("products.view"));
        assert!(!Role::Employee.is_authorized("products.delete"));
        assert!(!Role::Employee.is_authorized("sales.update_status"));
        assert!(!Role::Employee.is_authorized("stock.adjust"));
    }

    #[test]
    fn unknown_permission_is_denied() {
        assert!(!Role::Manager.is_authorized("nonexistent.permission"));
        assert!(!Role::Employee.is_authorized(""));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Manager, Role::Employee] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
