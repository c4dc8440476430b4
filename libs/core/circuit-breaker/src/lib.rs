// [libs/core/circuit-breaker/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CIRCUIT BREAKER REGISTRY
 * CLASIFICACIÓN: CORE RELIABILITY (ESTRATO L1)
 * RESPONSABILIDAD: CORTE DE LLAMADAS SALIENTES TRAS FALLOS SOSTENIDOS
 *
 * Three states per named circuit: CLOSED (calls flow), OPEN (calls
 * rejected outright), HALF_OPEN (one trial call allowed). The last 10
 * outcomes are kept in a ring buffer; five failures among them trips
 * the breaker. OPEN holds for a fixed cooldown before admitting a
 * single probe.
 * =================================================================
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

const OUTCOME_WINDOW: usize = 10;
const FAILURE_THRESHOLD: usize = 5;
const OPEN_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

struct Inner {
    state: CircuitState,
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            outcomes: VecDeque::with_capacity(OUTCOME_WINDOW),
            opened_at: None,
        }
    }

    fn record(&mut self, success: bool) {
        if self.outcomes.len() == OUTCOME_WINDOW {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);

        match self.state {
            CircuitState::HalfOpen => {
                if success {
                    self.state = CircuitState::Closed;
                    self.outcomes.clear();
                    self.opened_at = None;
                } else {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Closed => {
                let failures = self.outcomes.iter().filter(|outcome| !**outcome).count();
                if self.outcomes.len() == OUTCOME_WINDOW && failures >= FAILURE_THRESHOLD {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    fn allow(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let cooled_down = self
                    .opened_at
                    .map(|opened_at| opened_at.elapsed() >= OPEN_COOLDOWN)
                    .unwrap_or(true);
                if cooled_down {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// A single named breaker. Cheaply cloneable; clones share state.
pub struct CircuitBreaker {
    name: String,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Returns whether a call should be attempted right now. A `HalfOpen`
    /// transition out of `Open` is a one-shot permit: only the caller that
    /// observes the transition gets `true`.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let previous_state = inner.state;
        let allowed = inner.allow();
        if previous_state != inner.state {
            info!(circuit = %self.name, from = ?previous_state, to = ?inner.state, "circuit breaker transitioned");
        }
        allowed
    }

    pub fn record_success(&self) {
        self.inner.lock().unwrap().record(true);
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        let previous_state = inner.state;
        inner.record(false);
        if previous_state != inner.state {
            warn!(circuit = %self.name, from = ?previous_state, to = ?inner.state, "circuit breaker transitioned");
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// `(failure_count, window_size)` over the outcomes currently held in
    /// the ring buffer. Exposed for operator status endpoints.
    pub fn outcome_window(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        let failures = inner.outcomes.iter().filter(|outcome| !**outcome).count();
        (failures, inner.outcomes.len())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forces the breaker back to `Closed`, discarding recorded outcomes.
    /// Exposed for operator-initiated reset endpoints.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::new();
        info!(circuit = %self.name, "circuit breaker manually reset");
    }
}

/// Owns one `CircuitBreaker` per name, created lazily on first access.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, std::sync::Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, name: &str) -> std::sync::Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| std::sync::Arc::new(CircuitBreaker::new(name)))
            .clone()
    }

    pub fn snapshot(&self) -> Vec<(String, CircuitState)> {
        let breakers = self.breakers.lock().unwrap();
        breakers
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.state()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_below_failure_threshold() {
        let breaker = CircuitBreaker::new("source-client");
        for _ in 0..FAILURE_THRESHOLD - 1 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.allow());
    }

    #[test]
    fn trips_open_at_failure_threshold() {
        let breaker = CircuitBreaker::new("source-client");
        for _ in 0..FAILURE_THRESHOLD {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_probe_succeeds_and_closes() {
        let breaker = CircuitBreaker::new("source-client");
        for _ in 0..FAILURE_THRESHOLD {
            breaker.record_failure();
        }
        assert!(!breaker.allow());

        tokio::time::advance(OPEN_COOLDOWN + Duration::from_secs(1)).await;

        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_probe_failure_reopens() {
        let breaker = CircuitBreaker::new("source-client");
        for _ in 0..FAILURE_THRESHOLD {
            breaker.record_failure();
        }
        tokio::time::advance(OPEN_COOLDOWN + Duration::from_secs(1)).await;
        assert!(breaker.allow());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn registry_returns_the_same_breaker_for_the_same_name() {
        let registry = CircuitBreakerRegistry::new();
        let first = registry.get_or_create("notifier");
        first.record_failure();
        let second = registry.get_or_create("notifier");
        assert_eq!(second.state(), CircuitState::Closed);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }
}
