//! Single-slot warm-loading of model engines.
//!
//! At most one warm-load may be in flight process-wide. A second request
//! while one is active is a no-op success, not an error. The in-flight flag
//! lives behind a scoped guard that releases on drop, including when the
//! loading thread panics.

use crate::engines::EngineSet;
use std::sync::{Arc, Mutex};
use std::thread;

/// Coordinates the process-wide warm-load slot.
#[derive(Clone, Default)]
pub struct WarmupCoordinator {
    in_flight: Arc<Mutex<bool>>,
}

/// Scoped ownership of the warm-load slot. Dropping releases it.
pub struct WarmupGuard {
    in_flight: Arc<Mutex<bool>>,
}

impl Drop for WarmupGuard {
    fn drop(&mut self) {
        let mut flag = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        *flag = false;
    }
}

impl WarmupCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the warm-load slot.
    ///
    /// Returns `None` when a warm-load is already in flight; callers treat
    /// that as success, not an error.
    pub fn begin(&self) -> Option<WarmupGuard> {
        let mut flag = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if *flag {
            return None;
        }
        *flag = true;
        Some(WarmupGuard {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Whether a warm-load is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        *self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Kick off engine preloading on a background thread.
    ///
    /// Returns `true` when a new warm-load was started, `false` when one was
    /// already active (no-op). The loading runs sequentially through the
    /// engine set, entirely off the dispatch path.
    pub fn spawn_preload(&self, engines: EngineSet) -> bool {
        let Some(guard) = self.begin() else {
            return false;
        };

        thread::Builder::new()
            .name("warmup".to_string())
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = engines.preload() {
                    eprintln!("clinscribe: warm-load failed: {e}");
                }
            })
            .map(|_| true)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::llm::{MockGenerator, TextGenerator};
    use crate::engines::{MockDiarizer, MockSpeechEngine, PassthroughAligner};
    use crate::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn mock_engines() -> EngineSet {
        EngineSet {
            speech: Arc::new(MockSpeechEngine::new()),
            aligner: Arc::new(PassthroughAligner),
            diarizer: Arc::new(MockDiarizer::new()),
            generator: Arc::new(MockGenerator::new("gen")),
            verifier: Arc::new(MockGenerator::new("ver")),
        }
    }

    /// Generator whose preload blocks until released, for overlap testing.
    struct SlowPreload {
        release: Arc<Mutex<bool>>,
        preload_calls: Arc<AtomicUsize>,
    }

    impl TextGenerator for SlowPreload {
        fn generate(&self, _prompt: &str, _max_tokens: usize) -> Result<String> {
            Ok(String::new())
        }

        fn model_name(&self) -> &str {
            "slow"
        }

        fn preload(&self) -> Result<()> {
            self.preload_calls.fetch_add(1, Ordering::SeqCst);
            loop {
                if *self.release.lock().unwrap_or_else(|e| e.into_inner()) {
                    return Ok(());
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_begin_acquires_and_guard_releases() {
        let coordinator = WarmupCoordinator::new();
        assert!(!coordinator.is_in_flight());

        let guard = coordinator.begin().expect("slot should be free");
        assert!(coordinator.is_in_flight());
        assert!(coordinator.begin().is_none(), "second acquire is a no-op");

        drop(guard);
        assert!(!coordinator.is_in_flight());
        assert!(coordinator.begin().is_some(), "slot free again after drop");
    }

    #[test]
    fn test_spawn_preload_second_request_is_noop() {
        let coordinator = WarmupCoordinator::new();
        let release = Arc::new(Mutex::new(false));
        let preload_calls = Arc::new(AtomicUsize::new(0));

        let mut engines = mock_engines();
        engines.generator = Arc::new(SlowPreload {
            release: Arc::clone(&release),
            preload_calls: Arc::clone(&preload_calls),
        });

        assert!(coordinator.spawn_preload(engines.clone()));
        // Wait for the loader thread to reach the slow engine
        for _ in 0..200 {
            if preload_calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(coordinator.is_in_flight());

        // Second request while in flight: no-op, no second loader
        assert!(!coordinator.spawn_preload(engines));
        assert_eq!(preload_calls.load(Ordering::SeqCst), 1);

        *release.lock().unwrap() = true;
        for _ in 0..200 {
            if !coordinator.is_in_flight() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!coordinator.is_in_flight(), "slot released after loading");
    }

    #[test]
    fn test_slot_released_even_when_preload_fails() {
        let coordinator = WarmupCoordinator::new();
        let mut engines = mock_engines();
        engines.speech = Arc::new(MockSpeechEngine::new().with_failure());

        assert!(coordinator.spawn_preload(engines));
        for _ in 0..200 {
            if !coordinator.is_in_flight() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!coordinator.is_in_flight());
    }
}
