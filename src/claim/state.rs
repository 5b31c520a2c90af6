//! Claim phases and the artifacts each phase carries.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::Points;

/// Where a claim attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClaimPhase {
    /// Reviewing the listing; nothing submitted yet.
    #[default]
    Details,
    /// Confirmed and waiting out the processing latency.
    Processing,
    /// Settled; the receipt is issued here and nowhere else.
    Success(ClaimReceipt),
    /// Interrupted; `retry` takes the claim back to `Details`.
    Failed,
}

impl ClaimPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimPhase::Details => "details",
            ClaimPhase::Processing => "processing",
            ClaimPhase::Success(_) => "success",
            ClaimPhase::Failed => "failed",
        }
    }

    pub fn receipt(&self) -> Option<&ClaimReceipt> {
        match self {
            ClaimPhase::Success(receipt) => Some(receipt),
            _ => None,
        }
    }
}

impl fmt::Display for ClaimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const CODE_PREFIX: &str = "CRES-";
const CODE_SUFFIX_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Proof of a settled claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Redemption code handed to the claimant.
    pub code: String,
    /// Opaque transaction label for support lookups.
    pub transaction_id: String,
}

impl ClaimReceipt {
    /// Issue a fresh receipt: a random redemption code plus a
    /// timestamp-derived transaction label.
    ///
    /// Codes are display tokens, not credentials; uniqueness comes from
    /// independent random generation, nothing is reserved or checked.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(CODE_PREFIX.len() + CODE_SUFFIX_LEN);
        code.push_str(CODE_PREFIX);
        for _ in 0..CODE_SUFFIX_LEN {
            code.push(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char);
        }

        let epoch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();

        Self {
            code,
            transaction_id: format!("TXN-{epoch_millis}"),
        }
    }
}

/// Contributor-credit events that follow a settled claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditNotice {
    /// The credit went up, naming the contributor and the points spent.
    Posted { contributor: String, amount: Points },
    /// The display window lapsed.
    Expired,
}
