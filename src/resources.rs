//! Endpoint catalog and typed resource records.
//!
//! Each endpoint is a plain configuration record — path segment, legal
//! filter dimensions, legal query flags — consumed by the generic
//! [`CallBuilder`](crate::client::CallBuilder). There is no per-endpoint
//! builder hierarchy; adding an endpoint means adding a table entry and a
//! record type.

use serde::Deserialize;
use serde_json::Value;

/// Static description of one server endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDef {
    /// Endpoint identity path component, e.g. `"operations"`.
    pub segment: &'static str,
    /// Filter dimensions this endpoint accepts (`account`, `ledger`, ...).
    /// At most one may be active on a builder.
    pub filters: &'static [&'static str],
    /// Endpoint-specific query flags, e.g. `include_failed`.
    pub flags: &'static [&'static str],
}

impl EndpointDef {
    #[inline]
    #[must_use]
    pub fn allows_filter(&self, name: &str) -> bool {
        self.filters.contains(&name)
    }

    #[inline]
    #[must_use]
    pub fn allows_flag(&self, name: &str) -> bool {
        self.flags.contains(&name)
    }
}

pub const ACCOUNTS: EndpointDef = EndpointDef {
    segment: "accounts",
    filters: &[],
    flags: &["signer", "sponsor", "asset"],
};

pub const LEDGERS: EndpointDef = EndpointDef {
    segment: "ledgers",
    filters: &[],
    flags: &[],
};

pub const TRANSACTIONS: EndpointDef = EndpointDef {
    segment: "transactions",
    filters: &["account", "ledger", "claimable_balance"],
    flags: &["include_failed"],
};

pub const OPERATIONS: EndpointDef = EndpointDef {
    segment: "operations",
    filters: &["account", "ledger", "transaction", "claimable_balance"],
    flags: &["include_failed", "join"],
};

pub const PAYMENTS: EndpointDef = EndpointDef {
    segment: "payments",
    filters: &["account", "ledger", "transaction"],
    flags: &["include_failed", "join"],
};

pub const EFFECTS: EndpointDef = EndpointDef {
    segment: "effects",
    filters: &["account", "ledger", "transaction", "operation"],
    flags: &[],
};

pub const CLAIMABLE_BALANCES: EndpointDef = EndpointDef {
    segment: "claimable_balances",
    filters: &[],
    flags: &["sponsor", "claimant", "asset"],
};

/// One balance line on an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    pub balance: String,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub account_id: String,
    pub paging_token: String,
    pub sequence: String,
    #[serde(default)]
    pub subentry_count: u32,
    #[serde(default)]
    pub last_modified_ledger: u32,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    pub paging_token: String,
    pub hash: String,
    #[serde(default)]
    pub prev_hash: Option<String>,
    pub sequence: u32,
    #[serde(default)]
    pub successful_transaction_count: u32,
    #[serde(default)]
    pub failed_transaction_count: u32,
    pub closed_at: String,
    /// Base64 blob, left undecoded for the external XDR bridge.
    #[serde(default)]
    pub header_xdr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub paging_token: String,
    #[serde(default)]
    pub successful: bool,
    pub hash: String,
    pub ledger: u32,
    pub created_at: String,
    pub source_account: String,
    #[serde(default)]
    pub fee_charged: Option<String>,
    #[serde(default)]
    pub operation_count: u32,
    #[serde(default)]
    pub memo_type: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    /// Base64 blobs, left undecoded for the external XDR bridge.
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
}

/// One operation of any kind. Kind-specific fields are optional and
/// populated only when the server sends them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    pub paging_token: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub type_i: u32,
    #[serde(default)]
    pub transaction_successful: bool,
    pub source_account: String,
    pub created_at: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Payment-shaped operations as served by the payments endpoint.
pub type PaymentRecord = OperationRecord;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EffectRecord {
    pub id: String,
    pub paging_token: String,
    pub account: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub type_i: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claimant {
    pub destination: String,
    #[serde(default)]
    pub predicate: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClaimableBalanceRecord {
    pub id: String,
    pub paging_token: String,
    pub asset: String,
    pub amount: String,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub last_modified_ledger: u32,
    #[serde(default)]
    pub claimants: Vec<Claimant>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_filter_legality() {
        assert!(OPERATIONS.allows_filter("account"));
        assert!(OPERATIONS.allows_filter("transaction"));
        assert!(!LEDGERS.allows_filter("account"));
        assert!(!ACCOUNTS.allows_filter("ledger"));
    }

    #[test]
    fn test_endpoint_flag_legality() {
        assert!(TRANSACTIONS.allows_flag("include_failed"));
        assert!(!EFFECTS.allows_flag("include_failed"));
        assert!(CLAIMABLE_BALANCES.allows_flag("claimant"));
    }

    #[test]
    fn test_account_record_deserialize() {
        let raw = json!({
            "id": "GABC",
            "account_id": "GABC",
            "paging_token": "GABC",
            "sequence": "123456789",
            "subentry_count": 2,
            "balances": [
                {"balance": "100.0000000", "asset_type": "native"}
            ],
            "unknown_future_field": true
        });
        let account: AccountRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(account.account_id, "GABC");
        assert_eq!(account.balances.len(), 1);
        assert_eq!(account.balances[0].asset_type, "native");
    }

    #[test]
    fn test_transaction_record_keeps_xdr_blobs_verbatim() {
        let raw = json!({
            "id": "tx1",
            "paging_token": "12884905984",
            "successful": true,
            "hash": "deadbeef",
            "ledger": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "source_account": "GABC",
            "envelope_xdr": "AAAAAgAAAAB=",
            "result_xdr": "AAAAAA=="
        });
        let tx: TransactionRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.envelope_xdr.as_deref(), Some("AAAAAgAAAAB="));
        assert_eq!(tx.result_xdr.as_deref(), Some("AAAAAA=="));
        assert!(tx.result_meta_xdr.is_none());
    }

    #[test]
    fn test_operation_record_payment_fields() {
        let raw = json!({
            "id": "op1",
            "paging_token": "100",
            "type": "payment",
            "type_i": 1,
            "transaction_successful": true,
            "source_account": "GABC",
            "created_at": "2024-01-01T00:00:00Z",
            "amount": "5.0000000",
            "from": "GABC",
            "to": "GDEF"
        });
        let op: OperationRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(op.kind, "payment");
        assert_eq!(op.amount.as_deref(), Some("5.0000000"));
    }
}
