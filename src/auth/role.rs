//! Roles, capabilities and the role → capability table.
//!
//! # Design Decisions
//! - Both sets are closed enums so every `match` over them is exhaustive
//! - Wire names are snake_case and match the token `role` claim verbatim
//! - The table is built once at startup and shared via `Arc`; it is never
//!   mutated afterwards

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user role. Exactly one per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Manager,
    Support,
    KycAssociate,
    CaFinance,
    Developer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Manager,
        Role::Support,
        Role::KycAssociate,
        Role::CaFinance,
        Role::Developer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Manager => "manager",
            Role::Support => "support",
            Role::KycAssociate => "kyc_associate",
            Role::CaFinance => "ca_finance",
            Role::Developer => "developer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role claim names no known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A single permitted action or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Dashboard views
    ViewRevenue,
    ViewOrders,
    ViewBusinesses,
    ViewCustomers,
    ViewDeliveryPartners,
    ViewKycQueue,
    ViewSystemLogs,
    ViewApiAnalytics,

    // Actions
    ManageUsers,
    VerifyKyc,
    ManageBusinesses,
    ManageOrders,
    ViewFinancialReports,
    ManageNotifications,
}

impl Capability {
    pub const ALL: [Capability; 14] = [
        Capability::ViewRevenue,
        Capability::ViewOrders,
        Capability::ViewBusinesses,
        Capability::ViewCustomers,
        Capability::ViewDeliveryPartners,
        Capability::ViewKycQueue,
        Capability::ViewSystemLogs,
        Capability::ViewApiAnalytics,
        Capability::ManageUsers,
        Capability::VerifyKyc,
        Capability::ManageBusinesses,
        Capability::ManageOrders,
        Capability::ViewFinancialReports,
        Capability::ManageNotifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewRevenue => "view_revenue",
            Capability::ViewOrders => "view_orders",
            Capability::ViewBusinesses => "view_businesses",
            Capability::ViewCustomers => "view_customers",
            Capability::ViewDeliveryPartners => "view_delivery_partners",
            Capability::ViewKycQueue => "view_kyc_queue",
            Capability::ViewSystemLogs => "view_system_logs",
            Capability::ViewApiAnalytics => "view_api_analytics",
            Capability::ManageUsers => "manage_users",
            Capability::VerifyKyc => "verify_kyc",
            Capability::ManageBusinesses => "manage_businesses",
            Capability::ManageOrders => "manage_orders",
            Capability::ViewFinancialReports => "view_financial_reports",
            Capability::ManageNotifications => "manage_notifications",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable role → capability lookup. The only source of authorization truth.
#[derive(Debug, Clone)]
pub struct RolePermissionTable {
    grants: HashMap<Role, HashSet<Capability>>,
}

impl RolePermissionTable {
    /// Build the table from each role's grant list.
    pub fn new() -> Self {
        let grants = Role::ALL
            .iter()
            .map(|role| (*role, Self::grants_for(*role).iter().copied().collect()))
            .collect();
        Self { grants }
    }

    fn grants_for(role: Role) -> &'static [Capability] {
        use Capability::*;
        match role {
            Role::SuperAdmin => &Capability::ALL,
            Role::Manager => &[
                ViewOrders,
                ViewBusinesses,
                ViewDeliveryPartners,
                ManageBusinesses,
                ManageOrders,
            ],
            Role::Support => &[ViewOrders, ViewCustomers, ManageNotifications],
            Role::KycAssociate => &[ViewKycQueue, VerifyKyc],
            Role::CaFinance => &[ViewRevenue, ViewFinancialReports],
            Role::Developer => &[ViewSystemLogs, ViewApiAnalytics, ViewDeliveryPartners],
        }
    }

    /// True if `role` is granted `capability`.
    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.grants
            .get(&role)
            .map(|caps| caps.contains(&capability))
            .unwrap_or(false)
    }

    /// Capabilities held by `role`, in declaration order.
    pub fn capabilities(&self, role: Role) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|cap| self.allows(role, *cap))
            .collect()
    }
}

impl Default for RolePermissionTable {
    fn default() -> Self {
        Self::new()
    }
}
