//! Claim transaction state machine.
//!
//! A [`ClaimFlow`] walks one claim attempt through details, processing, and
//! settlement on simulated latencies. Resolutions run as scheduled tasks on
//! the Tokio runtime, guarded by cancellation tokens so a closed or failed
//! flow can never settle late.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Points;
use crate::model::{ListingId, RewardListing};

mod state;
pub use state::{ClaimPhase, ClaimReceipt, CreditNotice};

mod error;
pub use error::{ClaimAction, ClaimBlocker, ClaimError};

/// Simulated latencies for a claim's deferred resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTiming {
    /// Confirm to settlement.
    pub processing: Duration,
    /// Settlement to the contributor-credit notice.
    pub credit_notice: Duration,
    /// How long the notice stays up.
    pub notice_ttl: Duration,
}

impl Default for ClaimTiming {
    fn default() -> Self {
        Self {
            processing: Duration::from_millis(2500),
            credit_notice: Duration::from_millis(1500),
            notice_ttl: Duration::from_millis(5000),
        }
    }
}

/// One claim attempt against one listing.
///
/// The flow owns a snapshot of the listing and the claimant's balance; it
/// never mutates either. Phase changes are published on a watch channel,
/// contributor-credit notices on a separate event channel. Dropping the flow
/// cancels every pending timer, as does [`close`](ClaimFlow::close).
pub struct ClaimFlow {
    listing: RewardListing,
    balance: Points,
    timing: ClaimTiming,
    phase: Arc<watch::Sender<ClaimPhase>>,
    notice_tx: mpsc::UnboundedSender<CreditNotice>,
    notice_rx: Option<mpsc::UnboundedReceiver<CreditNotice>>,
    /// Parent token for the whole flow; cancelled on close and drop.
    flow_token: CancellationToken,
    /// Child token for the in-flight resolution, if one is pending.
    pending: Option<CancellationToken>,
    discarded: bool,
}

/// Public API
impl ClaimFlow {
    /// Begin a claim in the `Details` phase with the default latencies.
    ///
    /// Always succeeds, affordable or not; blockers are advisory.
    pub fn initiate(listing: RewardListing, balance: Points) -> Self {
        Self::initiate_with(listing, balance, ClaimTiming::default())
    }

    /// Begin a claim with explicit latencies.
    pub fn initiate_with(listing: RewardListing, balance: Points, timing: ClaimTiming) -> Self {
        let (phase, _) = watch::channel(ClaimPhase::Details);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            listing,
            balance,
            timing,
            phase: Arc::new(phase),
            notice_tx,
            notice_rx: Some(notice_rx),
            flow_token: CancellationToken::new(),
            pending: None,
            discarded: false,
        }
    }

    /// Submit the claim:
    /// - Valid only from `Details` on an open flow
    /// - Blockers are logged but not enforced; the caller owns that check
    /// - Moves to `Processing` and schedules the deferred settlement
    pub fn confirm(&mut self) -> Result<(), ClaimError> {
        self.ensure_open()?;
        let phase = self.phase();
        if phase != ClaimPhase::Details {
            return Err(ClaimError::InvalidTransition(
                ClaimAction::Confirm,
                phase.label(),
            ));
        }

        let blockers = self.blockers();
        if !blockers.is_empty() {
            warn!(
                listing = self.listing.id,
                ?blockers,
                "confirm forced past active blockers"
            );
        }

        self.phase.send_replace(ClaimPhase::Processing);
        info!(
            listing = self.listing.id,
            cost = %self.listing.cost,
            "claim confirmed"
        );

        let token = self.flow_token.child_token();
        self.pending = Some(token.clone());
        tokio::spawn(
            Resolution {
                token,
                timing: self.timing,
                listing: self.listing.id,
                contributor: self.listing.contributor.clone(),
                amount: self.listing.cost,
                phase: Arc::clone(&self.phase),
                notices: self.notice_tx.clone(),
            }
            .run(),
        );
        Ok(())
    }

    /// Mark the claim failed:
    /// - Valid from `Details` or `Processing` on an open flow
    /// - Checks and writes the phase in one step under the phase lock, so a
    ///   settlement racing the same deadline either lands first (and this
    ///   returns `InvalidTransition`) or never lands at all
    ///
    /// Nothing inside the flow fails on its own; this is the hook for
    /// whatever upstream condition the caller treats as a failure.
    pub fn fail(&mut self) -> Result<(), ClaimError> {
        self.ensure_open()?;
        let mut from = "";
        let failed = self.phase.send_if_modified(|phase| match phase {
            ClaimPhase::Details | ClaimPhase::Processing => {
                *phase = ClaimPhase::Failed;
                true
            }
            other => {
                from = other.label();
                false
            }
        });
        if !failed {
            return Err(ClaimError::InvalidTransition(ClaimAction::Fail, from));
        }

        self.cancel_pending();
        info!(listing = self.listing.id, "claim failed");
        Ok(())
    }

    /// Return a failed claim to `Details`, discarding partial state.
    pub fn retry(&mut self) -> Result<(), ClaimError> {
        self.ensure_open()?;
        let mut from = "";
        let reopened = self.phase.send_if_modified(|phase| match phase {
            ClaimPhase::Failed => {
                *phase = ClaimPhase::Details;
                true
            }
            other => {
                from = other.label();
                false
            }
        });
        if !reopened {
            return Err(ClaimError::InvalidTransition(ClaimAction::Retry, from));
        }

        self.cancel_pending();
        info!(listing = self.listing.id, "claim retried");
        Ok(())
    }

    /// Discard the flow and cancel every pending timer, the notice window
    /// included. Idempotent; a second close is a no-op.
    pub fn close(&mut self) {
        if self.discarded {
            return;
        }
        self.discarded = true;
        self.cancel_flow();
        info!(
            listing = self.listing.id,
            phase = %self.phase(),
            "claim closed"
        );
    }

    /// Current phase.
    pub fn phase(&self) -> ClaimPhase {
        self.phase.borrow().clone()
    }

    /// Watch receiver over phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ClaimPhase> {
        self.phase.subscribe()
    }

    /// The receipt, once settled.
    pub fn receipt(&self) -> Option<ClaimReceipt> {
        self.phase.borrow().receipt().cloned()
    }

    /// Stream of contributor-credit notices. Takeable once.
    pub fn notices(&mut self) -> Option<UnboundedReceiverStream<CreditNotice>> {
        self.notice_rx.take().map(UnboundedReceiverStream::new)
    }

    /// The listing snapshot this claim is against.
    pub fn listing(&self) -> &RewardListing {
        &self.listing
    }

    /// The balance snapshot taken at initiation.
    pub fn opening_balance(&self) -> Points {
        self.balance
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Advisory conditions against the snapshots, in display order.
    pub fn blockers(&self) -> Vec<ClaimBlocker> {
        let mut blockers = Vec::new();
        if !self.balance.covers(self.listing.cost) {
            blockers.push(ClaimBlocker::InsufficientBalance);
        }
        if !self.listing.is_in_stock() {
            blockers.push(ClaimBlocker::OutOfStock);
        }
        blockers
    }

    /// Whether a well-behaved caller should offer the confirm.
    pub fn can_confirm(&self) -> bool {
        !self.discarded && self.phase() == ClaimPhase::Details && self.blockers().is_empty()
    }
}

/// Private API
impl ClaimFlow {
    fn ensure_open(&self) -> Result<(), ClaimError> {
        if self.discarded {
            return Err(ClaimError::Discarded);
        }
        Ok(())
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Cancel the whole flow under the phase lock. The settlement re-checks
    /// its token under the same lock, so once this returns no resolution can
    /// publish a phase.
    fn cancel_flow(&self) {
        self.phase.send_if_modified(|_| {
            self.flow_token.cancel();
            false
        });
    }
}

impl Drop for ClaimFlow {
    fn drop(&mut self) {
        self.cancel_flow();
    }
}

/// One scheduled settlement: processing latency, then the receipt, then the
/// credit notice and its expiry. Each leg re-checks the token, and the
/// settlement writes its phase with a compare-and-set under the phase lock,
/// so a cancel or fail that races a timer still wins.
struct Resolution {
    token: CancellationToken,
    timing: ClaimTiming,
    listing: ListingId,
    contributor: String,
    amount: Points,
    phase: Arc<watch::Sender<ClaimPhase>>,
    notices: mpsc::UnboundedSender<CreditNotice>,
}

impl Resolution {
    async fn run(self) {
        if !self.sleep_through(self.timing.processing).await {
            return;
        }
        let receipt = ClaimReceipt::generate();
        let code = receipt.code.clone();
        let transaction = receipt.transaction_id.clone();
        // Token and phase re-checked under the lock: a fail or close that
        // slipped in after the sleep keeps this write from landing.
        let settled = self.phase.send_if_modified(|phase| {
            if self.token.is_cancelled() || *phase != ClaimPhase::Processing {
                return false;
            }
            *phase = ClaimPhase::Success(receipt);
            true
        });
        if !settled {
            return;
        }
        info!(
            listing = self.listing,
            code = %code,
            transaction = %transaction,
            "claim resolved"
        );

        if !self.sleep_through(self.timing.credit_notice).await {
            return;
        }
        debug!(
            listing = self.listing,
            contributor = %self.contributor,
            amount = %self.amount,
            "credit notice posted"
        );
        let _ = self.notices.send(CreditNotice::Posted {
            contributor: self.contributor.clone(),
            amount: self.amount,
        });

        if !self.sleep_through(self.timing.notice_ttl).await {
            return;
        }
        debug!(listing = self.listing, "credit notice expired");
        let _ = self.notices.send(CreditNotice::Expired);
    }

    /// Sleep the full duration; false if the claim was cancelled first.
    async fn sleep_through(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            // a cancel that raced the sleep still counts as cancelled
            _ = time::sleep(duration) => !self.token.is_cancelled(),
        }
    }
}
