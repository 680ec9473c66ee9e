//! Main ledger-query client.
//!
//! Provides the primary [`LedgerClient`] for building queries against the
//! service's resource hierarchy.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::client::call::CallBuilder;
use crate::client::config::ClientConfig;
use crate::client::http::Dispatch;
use crate::client::url::UrlBuilder;
use crate::error::{Error, Result};
use crate::resources::{
    self, AccountRecord, ClaimableBalanceRecord, EffectRecord, EndpointDef, LedgerRecord,
    OperationRecord, PaymentRecord, TransactionRecord,
};

/// The ledger-query client.
///
/// Holds the shared HTTP executor and configuration; endpoint methods hand
/// out pre-configured [`CallBuilder`]s.
#[derive(Clone, Debug)]
pub struct LedgerClient {
    config: Arc<ClientConfig>,
    dispatch: Arc<Dispatch>,
}

impl LedgerClient {
    /// Create a client for the given service root with default
    /// configuration.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        Ok(Self::with_config(ClientConfig::new(base)))
    }

    /// Create a client with custom configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_default();
        let dispatch = Arc::new(Dispatch::new(http, config.request_timeout));
        LedgerClient {
            config: Arc::new(config),
            dispatch,
        }
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint<T>(&self, def: &'static EndpointDef) -> CallBuilder<T> {
        CallBuilder::new(
            UrlBuilder::new(self.config.base_url.clone()).segment(def.segment),
            def,
            Arc::clone(&self.dispatch),
            self.config.retry.clone(),
        )
    }

    pub fn accounts(&self) -> CallBuilder<AccountRecord> {
        self.endpoint(&resources::ACCOUNTS)
    }

    /// One account by id.
    pub fn account(&self, account_id: &str) -> CallBuilder<AccountRecord> {
        self.accounts().segment(account_id)
    }

    pub fn ledgers(&self) -> CallBuilder<LedgerRecord> {
        self.endpoint(&resources::LEDGERS)
    }

    /// One ledger by sequence number.
    pub fn ledger(&self, sequence: u32) -> CallBuilder<LedgerRecord> {
        self.ledgers().segment(&sequence.to_string())
    }

    pub fn transactions(&self) -> CallBuilder<TransactionRecord> {
        self.endpoint(&resources::TRANSACTIONS)
    }

    /// One transaction by hash.
    pub fn transaction(&self, hash: &str) -> CallBuilder<TransactionRecord> {
        self.transactions().segment(hash)
    }

    pub fn operations(&self) -> CallBuilder<OperationRecord> {
        self.endpoint(&resources::OPERATIONS)
    }

    /// One operation by id.
    pub fn operation(&self, operation_id: &str) -> CallBuilder<OperationRecord> {
        self.operations().segment(operation_id)
    }

    pub fn payments(&self) -> CallBuilder<PaymentRecord> {
        self.endpoint(&resources::PAYMENTS)
    }

    pub fn effects(&self) -> CallBuilder<EffectRecord> {
        self.endpoint(&resources::EFFECTS)
    }

    pub fn claimable_balances(&self) -> CallBuilder<ClaimableBalanceRecord> {
        self.endpoint(&resources::CLAIMABLE_BALANCES)
    }

    /// One claimable balance by id.
    pub fn claimable_balance(&self, balance_id: &str) -> CallBuilder<ClaimableBalanceRecord> {
        self.claimable_balances().segment(balance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::call::Order;

    fn client() -> LedgerClient {
        LedgerClient::new("https://query.example.org").unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        let err = LedgerClient::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_single_account_url() {
        let url = client().account("GABC").url().unwrap();
        assert_eq!(url.as_str(), "https://query.example.org/accounts/GABC");
    }

    #[test]
    fn test_ledger_by_sequence_url() {
        let url = client().ledger(421).url().unwrap();
        assert_eq!(url.as_str(), "https://query.example.org/ledgers/421");
    }

    #[test]
    fn test_payments_for_account_url() {
        let url = client()
            .payments()
            .for_account("GABC")
            .order(Order::Asc)
            .url()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://query.example.org/accounts/GABC/payments?order=asc"
        );
    }

    #[test]
    fn test_builders_from_one_client_are_independent(){
        let client = client();
        let a = client.operations().limit(5);
        let b = client.operations().limit(10);
        assert!(a.url().unwrap().as_str().contains("limit=5"));
        assert!(b.url().unwrap().as_str().contains("limit=10"));
    }
}
