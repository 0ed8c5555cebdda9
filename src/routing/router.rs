//! Route table.
//!
//! # Responsibilities
//! - Name every proxied operation as a closed set of routes
//! - Bind each route to its method, path template and backend service
//! - Decide, per route, whether responses may be cached
//!
//! # Design Decisions
//! - Immutable and `Copy`; no lookup structures needed at runtime
//! - Exhaustive matches: adding a route forces a caching decision
//! - Only idempotent reads are cacheable

use axum::http::Method;
use serde::Serialize;
use std::fmt;

/// Backend domains fronted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Account,
    Template,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 2] = [ServiceKind::Account, ServiceKind::Template];

    /// Name under which instances of this service are registered.
    pub fn registry_name(self) -> &'static str {
        match self {
            ServiceKind::Account => "account_service",
            ServiceKind::Template => "template_service",
        }
    }

    /// Whether a response body must parse as JSON before it is forwarded.
    pub fn expects_json(self) -> bool {
        match self {
            ServiceKind::Account => true,
            ServiceKind::Template => false,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.registry_name())
    }
}

/// Every operation the gateway forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    CreateAccount,
    AccountBalance,
    AccountTransactions,
    Deposit,
    Withdraw,
    ListTemplates,
    CreateTemplate,
    GetTemplate,
    UpdateTemplate,
    DeleteTemplate,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::CreateAccount,
        Route::AccountBalance,
        Route::AccountTransactions,
        Route::Deposit,
        Route::Withdraw,
        Route::ListTemplates,
        Route::CreateTemplate,
        Route::GetTemplate,
        Route::UpdateTemplate,
        Route::DeleteTemplate,
    ];

    pub fn method(self) -> Method {
        match self {
            Route::CreateAccount
            | Route::Deposit
            | Route::Withdraw
            | Route::CreateTemplate => Method::POST,
            Route::AccountBalance
            | Route::AccountTransactions
            | Route::ListTemplates
            | Route::GetTemplate => Method::GET,
            Route::UpdateTemplate => Method::PUT,
            Route::DeleteTemplate => Method::DELETE,
        }
    }

    /// Path template in router syntax.
    pub fn template(self) -> &'static str {
        match self {
            Route::CreateAccount => "/accounts",
            Route::AccountBalance => "/accounts/{id}/balance",
            Route::AccountTransactions => "/accounts/{id}/transactions",
            Route::Deposit => "/accounts/{id}/deposit",
            Route::Withdraw => "/accounts/{id}/withdraw",
            Route::ListTemplates | Route::CreateTemplate => "/templates",
            Route::GetTemplate | Route::UpdateTemplate | Route::DeleteTemplate => "/templates/{id}",
        }
    }

    pub fn service(self) -> ServiceKind {
        match self {
            Route::CreateAccount
            | Route::AccountBalance
            | Route::AccountTransactions
            | Route::Deposit
            | Route::Withdraw => ServiceKind::Account,
            Route::ListTemplates
            | Route::CreateTemplate
            | Route::GetTemplate
            | Route::UpdateTemplate
            | Route::DeleteTemplate => ServiceKind::Template,
        }
    }

    /// Whether responses may be served from or written to the cache.
    pub fn is_cacheable(self) -> bool {
        match self {
            Route::AccountBalance
            | Route::AccountTransactions
            | Route::ListTemplates
            | Route::GetTemplate => true,
            Route::CreateAccount
            | Route::Deposit
            | Route::Withdraw
            | Route::CreateTemplate
            | Route::UpdateTemplate
            | Route::DeleteTemplate => false,
        }
    }

    /// Dense index, used for per-route state.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short name for logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            Route::CreateAccount => "create_account",
            Route::AccountBalance => "account_balance",
            Route::AccountTransactions => "account_transactions",
            Route::Deposit => "deposit",
            Route::Withdraw => "withdraw",
            Route::ListTemplates => "list_templates",
            Route::CreateTemplate => "create_template",
            Route::GetTemplate => "get_template",
            Route::UpdateTemplate => "update_template",
            Route::DeleteTemplate => "delete_template",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn only_reads_are_cacheable() {
        for route in Route::ALL {
            if route.is_cacheable() {
                assert_eq!(route.method(), Method::GET, "{route} must be a read");
            }
        }
        assert!(!Route::CreateAccount.is_cacheable());
        assert!(!Route::Deposit.is_cacheable());
        assert!(!Route::Withdraw.is_cacheable());
        assert!(!Route::UpdateTemplate.is_cacheable());
        assert!(!Route::DeleteTemplate.is_cacheable());
    }

    #[test]
    fn method_and_template_pairs_are_unique() {
        let pairs: HashSet<_> = Route::ALL
            .iter()
            .map(|r| (r.method(), r.template()))
            .collect();
        assert_eq!(pairs.len(), Route::ALL.len());
    }

    #[test]
    fn indexes_are_dense() {
        for (i, route) in Route::ALL.iter().enumerate() {
            assert_eq!(route.index(), i);
        }
    }

    #[test]
    fn services_use_inventory_names() {
        assert_eq!(Route::Deposit.service().registry_name(), "account_service");
        assert_eq!(Route::GetTemplate.service().to_string(), "template_service");
        assert!(ServiceKind::Account.expects_json());
        assert!(!ServiceKind::Template.expects_json());
    }
}
