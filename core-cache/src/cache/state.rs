//! Load state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single load call.
///
/// ```text
/// Idle -> CheckingCache -> CacheHit -> Ready
///                       -> CacheMiss -> Fetching -> Assembling -> Persisting -> Ready
/// any non-terminal state -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    Idle,
    CheckingCache,
    CacheHit,
    CacheMiss,
    Fetching,
    Assembling,
    Persisting,
    Ready,
    Failed,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "Idle",
            LoadState::CheckingCache => "CheckingCache",
            LoadState::CacheHit => "CacheHit",
            LoadState::CacheMiss => "CacheMiss",
            LoadState::Fetching => "Fetching",
            LoadState::Assembling => "Assembling",
            LoadState::Persisting => "Persisting",
            LoadState::Ready => "Ready",
            LoadState::Failed => "Failed",
        }
    }

    /// `Ready` and `Failed` end the load.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Ready | LoadState::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: LoadState) -> bool {
        use LoadState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }

        matches!(
            (self, next),
            (Idle, CheckingCache)
                | (CheckingCache, CacheHit)
                | (CheckingCache, CacheMiss)
                | (CacheHit, Ready)
                | (CacheMiss, Fetching)
                | (Fetching, Assembling)
                | (Assembling, Persisting)
                | (Persisting, Ready)
        )
    }
}

impl Default for LoadState {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoadState::*;

    #[test]
    fn test_cache_hit_path() {
        assert!(Idle.can_transition_to(CheckingCache));
        assert!(CheckingCache.can_transition_to(CacheHit));
        assert!(CacheHit.can_transition_to(Ready));
    }

    #[test]
    fn test_cache_miss_path() {
        let path = [
            Idle,
            CheckingCache,
            CacheMiss,
            Fetching,
            Assembling,
            Persisting,
            Ready,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_states() {
        for state in [Idle, CheckingCache, CacheHit, CacheMiss, Fetching, Assembling, Persisting] {
            assert!(state.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(Ready.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Ready.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(CheckingCache));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert!(!Idle.can_transition_to(Fetching));
        assert!(!CacheHit.can_transition_to(Fetching));
        assert!(!Fetching.can_transition_to(Persisting));
        assert!(!CheckingCache.can_transition_to(Ready));
    }
}
