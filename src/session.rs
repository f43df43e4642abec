//! Session claim store.
//!
//! Deduplicates pipeline runs per kiosk session. The kiosk front end retries
//! aggressively (reconnecting EventSource, double-submitted forms), so the
//! first stream for a session id claims it and every retry within the TTL
//! window is turned away instead of launching a second run.
//!
//! Key properties:
//! - `claim` returns true when the session is already claimed (duplicate)
//! - `release` extends the window rather than deleting, absorbing reconnects
//!   that arrive just after a run completes
//! - empty session ids are never claimable (no dedup without an identifier)
//! - expired entries are purged through an expiry-ordered heap on every
//!   operation, plus a periodic reaper, so the store stays bounded

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

/// How long a claimed session stays claimed after claim or release.
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// How often the background reaper sweeps expired claims.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

// ═══════════════════════════════════════════════════════════
// SessionClaims — TTL-bounded claim map
// ═══════════════════════════════════════════════════════════

/// TTL-bounded set of claimed session ids.
///
/// The map is authoritative; the heap is a purge index ordered by expiry.
/// An extended claim leaves a stale heap entry behind, which the purge
/// detects by re-checking the map before removal.
pub struct SessionClaims {
    ttl: Duration,
    expires: HashMap<String, Instant>,
    by_expiry: BinaryHeap<Reverse<(Instant, String)>>,
}

impl SessionClaims {
    /// Create an empty store with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    /// Create an empty store with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            expires: HashMap::new(),
            by_expiry: BinaryHeap::new(),
        }
    }

    /// Claim a session id. Returns true if the id is already claimed and
    /// unexpired, meaning the caller holds a duplicate request and must
    /// not run.
    ///
    /// An empty id is never claimable: callers without an identifier get no
    /// dedup protection but are always allowed through.
    pub fn claim(&mut self, session_id: &str) -> bool {
        self.claim_at(session_id, Instant::now())
    }

    /// Mark a session finished. Extends the claim window from now rather
    /// than deleting it, so an immediate retry of the same session is still
    /// treated as a duplicate.
    pub fn release(&mut self, session_id: &str) {
        self.release_at(session_id, Instant::now());
    }

    /// Remove every entry whose expiry is at or before `now`.
    /// Returns the number of entries removed. Called internally on every
    /// claim/release and externally by the reaper task.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(Reverse((expiry, _))) = self.by_expiry.peek() {
            if *expiry > now {
                break;
            }
            let Reverse((_, id)) = self
                .by_expiry
                .pop()
                .expect("peek returned an entry");
            // Stale heap entries for extended or already-purged claims are
            // skipped; only a genuinely expired map entry is removed.
            if let Some(current) = self.expires.get(&id) {
                if *current <= now {
                    self.expires.remove(&id);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Number of live (not yet purged) claims.
    pub fn len(&self) -> usize {
        self.expires.len()
    }

    /// Whether the store holds no claims.
    pub fn is_empty(&self) -> bool {
        self.expires.is_empty()
    }

    fn claim_at(&mut self, session_id: &str, now: Instant) -> bool {
        if session_id.is_empty() {
            return false;
        }
        self.purge_expired(now);
        if self.expires.contains_key(session_id) {
            return true;
        }
        self.insert(session_id, now + self.ttl);
        false
    }

    fn release_at(&mut self, session_id: &str, now: Instant) {
        if session_id.is_empty() {
            return;
        }
        self.purge_expired(now);
        self.insert(session_id, now + self.ttl);
    }

    fn insert(&mut self, session_id: &str, expiry: Instant) {
        self.expires.insert(session_id.to_string(), expiry);
        self.by_expiry
            .push(Reverse((expiry, session_id.to_string())));
    }
}

impl Default for SessionClaims {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Background reaper
// ═══════════════════════════════════════════════════════════

/// Spawn a task that periodically purges expired claims.
///
/// The per-operation purge already bounds the store under steady traffic;
/// the reaper covers idle periods where no claim ever triggers a purge.
pub fn spawn_reaper(store: Arc<Mutex<SessionClaims>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let removed = match store.lock() {
                Ok(mut claims) => claims.purge_expired(Instant::now()),
                Err(poisoned) => poisoned.into_inner().purge_expired(Instant::now()),
            };
            if removed > 0 {
                tracing::debug!(removed, "session reaper purged expired claims");
            }
        }
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    fn store() -> SessionClaims {
        SessionClaims::with_ttl(TTL)
    }

    #[test]
    fn first_claim_is_not_duplicate() {
        let mut claims = store();
        assert!(!claims.claim("session-1"));
    }

    #[test]
    fn second_claim_within_ttl_is_duplicate() {
        let mut claims = store();
        let t0 = Instant::now();

        assert!(!claims.claim_at("session-1", t0));
        assert!(claims.claim_at("session-1", t0 + Duration::from_secs(1)));
        assert!(claims.claim_at("session-1", t0 + TTL - Duration::from_secs(1)));
    }

    #[test]
    fn claim_after_expiry_is_not_duplicate() {
        let mut claims = store();
        let t0 = Instant::now();

        assert!(!claims.claim_at("session-1", t0));
        assert!(!claims.claim_at("session-1", t0 + TTL + Duration::from_secs(1)));
    }

    #[test]
    fn claim_exactly_at_expiry_is_not_duplicate() {
        let mut claims = store();
        let t0 = Instant::now();

        assert!(!claims.claim_at("session-1", t0));
        assert!(!claims.claim_at("session-1", t0 + TTL));
    }

    #[test]
    fn empty_session_id_is_never_claimed() {
        let mut claims = store();
        assert!(!claims.claim(""));
        assert!(!claims.claim(""));
        assert!(claims.is_empty());
    }

    #[test]
    fn release_extends_the_window() {
        let mut claims = store();
        let t0 = Instant::now();

        assert!(!claims.claim_at("session-1", t0));
        claims.release_at("session-1", t0 + Duration::from_secs(500));

        // Past the original expiry, still inside the extended window.
        assert!(claims.claim_at("session-1", t0 + TTL + Duration::from_secs(100)));
        // Past the extended window too.
        assert!(!claims.claim_at(
            "session-1",
            t0 + Duration::from_secs(500) + TTL + Duration::from_secs(1),
        ));
    }

    #[test]
    fn release_of_unclaimed_session_claims_it() {
        let mut claims = store();
        let t0 = Instant::now();

        claims.release_at("session-1", t0);
        assert!(claims.claim_at("session-1", t0 + Duration::from_secs(1)));
    }

    #[test]
    fn release_of_empty_id_is_ignored() {
        let mut claims = store();
        claims.release("");
        assert!(claims.is_empty());
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let mut claims = store();
        let t0 = Instant::now();

        claims.claim_at("old", t0);
        claims.claim_at("new", t0 + Duration::from_secs(300));
        assert_eq!(claims.len(), 2);

        let removed = claims.purge_expired(t0 + TTL + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert_eq!(claims.len(), 1);
        assert!(claims.claim_at("new", t0 + Duration::from_secs(301)));
    }

    #[test]
    fn stale_heap_entry_does_not_purge_extended_claim() {
        let mut claims = store();
        let t0 = Instant::now();

        claims.claim_at("session-1", t0);
        claims.release_at("session-1", t0 + Duration::from_secs(550));

        // The original heap entry expires here, the extension has not.
        let removed = claims.purge_expired(t0 + TTL + Duration::from_secs(10));
        assert_eq!(removed, 0);
        assert!(claims.claim_at("session-1", t0 + TTL + Duration::from_secs(20)));
    }

    #[test]
    fn distinct_sessions_claim_independently() {
        let mut claims = store();
        let t0 = Instant::now();

        assert!(!claims.claim_at("a", t0));
        assert!(!claims.claim_at("b", t0));
        assert!(claims.claim_at("a", t0 + Duration::from_secs(1)));
        assert!(claims.claim_at("b", t0 + Duration::from_secs(1)));
    }
}
