//! Moderation ledger: report counts and the address ban set.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

/// Outcome of recording a report against an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Below the threshold: both parties go back to the pool.
    Requeue {
        /// The updated cumulative count for the address.
        count: u32,
    },
    /// The threshold was reached: the address is now banned.
    Banned,
}

/// Per-address report counts and the set of banned addresses.
///
/// Counts are keyed by network address, not peer id, so reconnecting with
/// a fresh id does not reset the tally. Counts only ever increase (no
/// decay) and the ban set is append-only for the process lifetime.
#[derive(Debug)]
pub struct ReportLedger {
    reports: HashMap<IpAddr, u32>,
    banned: HashSet<IpAddr>,
    threshold: u32,
}

impl ReportLedger {
    /// Create a ledger with the given ban threshold.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            reports: HashMap::new(),
            banned: HashSet::new(),
            threshold,
        }
    }

    /// Record one report against an address and return the outcome.
    ///
    /// Reaching the threshold bans the address; once banned, every further
    /// report keeps reporting `Banned` so callers can purge stragglers
    /// sharing the address.
    pub fn record_report(&mut self, addr: IpAddr) -> ReportOutcome {
        let count = self.reports.entry(addr).or_insert(0);
        *count = count.saturating_add(1);

        if *count >= self.threshold {
            self.banned.insert(addr);
            ReportOutcome::Banned
        } else {
            ReportOutcome::Requeue { count: *count }
        }
    }

    /// Directly ban an address, bypassing the report count.
    pub fn ban(&mut self, addr: IpAddr) {
        self.banned.insert(addr);
    }

    /// Whether an address is banned. Checked at admission, before any
    /// peer id is allocated.
    #[must_use]
    pub fn is_banned(&self, addr: IpAddr) -> bool {
        self.banned.contains(&addr)
    }

    /// Cumulative report count for an address.
    #[must_use]
    pub fn report_count(&self, addr: IpAddr) -> u32 {
        self.reports.get(&addr).copied().unwrap_or(0)
    }

    /// The configured ban threshold.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}
