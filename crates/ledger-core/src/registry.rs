//! Account/currency registries and the booked-ledger output types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::cost::Cost;
use crate::directive::{Metadata, SourceContext};
use crate::intern::InternedStr;
use crate::inventory::Inventory;

/// The lifecycle state of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountState {
    /// Account is open. `currencies` is empty iff any currency is allowed.
    Open {
        /// Allowed currencies; empty means unrestricted.
        currencies: Vec<InternedStr>,
        /// Metadata from the `open` directive.
        meta: Metadata,
    },
    /// Account has been closed.
    Closed {
        /// Metadata from the `close` directive.
        meta: Metadata,
    },
}

impl AccountState {
    /// `true` if the account is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// `true` if the account is currently closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// The metadata carried by whichever directive last changed this state.
    #[must_use]
    pub fn meta(&self) -> &Metadata {
        match self {
            Self::Open { meta, .. } | Self::Closed { meta } => meta,
        }
    }
}

/// Per-account lifecycle state, threaded through booking.
pub type AccountMap = BTreeMap<InternedStr, AccountState>;

/// Declared currencies (presence-only registry; duplicate declarations are a
/// load-time error, not represented here).
pub type CurrencyMap = BTreeMap<InternedStr, Metadata>;

/// Per-account holdings, threaded through booking. Each successful
/// transaction produces a new `InventoryMap` snapshot (via structural
/// sharing of unaffected entries) rather than mutating a shared one.
pub type InventoryMap = BTreeMap<InternedStr, Inventory>;

/// A posting as it appears in a booked transaction: always a concrete
/// amount, never a `CostSpec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedPosting {
    /// The account this posting affects.
    pub account: InternedStr,
    /// The posting's flag.
    pub flag: char,
    /// The posting's resolved amount.
    pub amount: Amount,
    /// The posting's resolved cost, if it is a lot.
    pub cost: Option<Cost>,
    /// Posting-level metadata.
    pub meta: Metadata,
}

impl fmt::Display for BookedPosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.account, self.amount)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}

/// A fully booked transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// Completion flag.
    pub flag: char,
    /// Optional payee.
    pub payee: Option<String>,
    /// Narration text.
    pub narration: String,
    /// Transaction-level metadata.
    pub meta: Metadata,
    /// Booked postings, in emission order.
    pub postings: Vec<BookedPosting>,
    /// Per-account inventory snapshot immediately before this transaction.
    pub inventories_before: InventoryMap,
    /// Per-account inventory snapshot immediately after this transaction.
    pub inventories_after: InventoryMap,
    /// Source context.
    pub source: SourceContext,
}

/// The final output of booking a ledger end-to-end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookedLedger {
    /// Time-ordered booked transactions.
    pub transactions: Vec<Transaction>,
    /// Final account registry.
    pub accounts: AccountMap,
    /// Final currency registry.
    pub currencies: CurrencyMap,
    /// Final per-account inventories.
    pub inventories: InventoryMap,
}
