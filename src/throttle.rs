// src/throttle.rs
use dashmap::DashMap;
use rand::Rng;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Chance that a call also sweeps every ledger.
const SWEEP_PROBABILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Denied { retry_after_secs: u64 },
}

/// Sliding-window request counter keyed by account id.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    max_requests: usize,
    ledger: DashMap<String, VecDeque<Instant>>,
}

impl Throttle {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            ledger: DashMap::new(),
        }
    }

    pub fn check(&self, account_id: &str) -> ThrottleDecision {
        let now = Instant::now();
        let decision = self.check_at(account_id, now);
        if rand::thread_rng().gen_bool(SWEEP_PROBABILITY) {
            self.sweep(now);
        }
        decision
    }

    pub fn check_at(&self, account_id: &str, now: Instant) -> ThrottleDecision {
        let mut entry = self.ledger.entry(account_id.to_string()).or_default();
        let instants = entry.value_mut();
        prune(instants, now, self.window);

        if instants.len() >= self.max_requests {
            let retry_after_secs = instants
                .front()
                .map(|oldest| {
                    let reopens = *oldest + self.window;
                    let wait = reopens.saturating_duration_since(now);
                    ceil_secs(wait)
                })
                .unwrap_or(1)
                .max(1);
            return ThrottleDecision::Denied { retry_after_secs };
        }

        instants.push_back(now);
        ThrottleDecision::Allowed
    }

    /// Drops expired instants everywhere and forgets accounts with none left.
    pub fn sweep(&self, now: Instant) {
        self.ledger.retain(|_, instants| {
            prune(instants, now, self.window);
            !instants.is_empty()
        });
        tracing::debug!("Throttle sweep done, {} accounts tracked", self.ledger.len());
    }

    #[cfg(test)]
    pub fn tracked_accounts(&self) -> usize {
        self.ledger.len()
    }
}

fn prune(instants: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = instants.front() {
        if now.saturating_duration_since(*oldest) >= window {
            instants.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_the_request_after_the_limit() {
        let throttle = Throttle::new(Duration::from_secs(60), 3);
        let start = Instant::now();

        for i in 0..3 {
            let at = start + Duration::from_millis(i * 100);
            assert_eq!(throttle.check_at("a", at), ThrottleDecision::Allowed);
        }
        match throttle.check_at("a", start + Duration::from_millis(500)) {
            ThrottleDecision::Denied { retry_after_secs } => assert_eq!(retry_after_secs, 60),
            other => panic!("expected denial, got {other:?}"),
        }
        // Other accounts have their own ledger
        assert_eq!(throttle.check_at("b", start), ThrottleDecision::Allowed);
    }

    #[test]
    fn window_slides_past_the_oldest_request() {
        let throttle = Throttle::new(Duration::from_secs(10), 2);
        let start = Instant::now();

        assert_eq!(throttle.check_at("a", start), ThrottleDecision::Allowed);
        assert_eq!(throttle.check_at("a", start + Duration::from_secs(4)), ThrottleDecision::Allowed);
        assert_eq!(
            throttle.check_at("a", start + Duration::from_millis(9_500)),
            ThrottleDecision::Denied { retry_after_secs: 1 }
        );
        assert_eq!(throttle.check_at("a", start + Duration::from_secs(10)), ThrottleDecision::Allowed);
        assert_eq!(
            throttle.check_at("a", start + Duration::from_secs(11)),
            ThrottleDecision::Denied { retry_after_secs: 3 }
        );
    }

    #[test]
    fn sweep_forgets_idle_accounts() {
        let throttle = Throttle::new(Duration::from_secs(5), 10);
        let start = Instant::now();
        throttle.check_at("idle", start);
        throttle.check_at("busy", start + Duration::from_secs(4));

        throttle.sweep(start + Duration::from_secs(6));

        assert_eq!(throttle.tracked_accounts(), 1);
    }
}
