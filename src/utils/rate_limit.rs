// Sliding-window limiter for login attempts, keyed by normalized email.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct LoginAttemptLimiter {
    attempts: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginAttemptLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts: max_attempts.max(1),
            window,
        }
    }

    /// True when another failed attempt would still be inside the budget.
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut attempts = self.attempts.lock().await;
        let now = Instant::now();

        let allowed = match attempts.get_mut(key) {
            Some(entry) => {
                entry.retain(|&at| now.duration_since(at) < self.window);
                entry.len() < self.max_attempts
            }
            None => return true,
        };

        if attempts.get(key).is_some_and(|entry| entry.is_empty()) {
            attempts.remove(key);
        }

        allowed
    }

    pub async fn record_failure(&self, key: &str) {
        let mut attempts = self.attempts.lock().await;
        let now = Instant::now();

        // Keys whose window has emptied are swept here.
        attempts.retain(|_, entry| {
            entry.retain(|&at| now.duration_since(at) < self.window);
            !entry.is_empty()
        });
        attempts.entry(key.to_string()).or_default().push(now);
    }

    pub async fn reset(&self, key: &str) {
        self.attempts.lock().await.remove(key);
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_max_failures() {
        let limiter = LoginAttemptLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.is_allowed("a@test.io").await);
        limiter.record_failure("a@test.io").await;
        assert!(limiter.is_allowed("a@test.io").await);
        limiter.record_failure("a@test.io").await;
        assert!(!limiter.is_allowed("a@test.io").await);

        // Other keys are unaffected.
        assert!(limiter.is_allowed("b@test.io").await);
    }

    #[tokio::test]
    async fn reset_clears_the_window() {
        let limiter = LoginAttemptLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("a@test.io").await;
        assert!(!limiter.is_allowed("a@test.io").await);

        limiter.reset("a@test.io").await;
        assert!(limiter.is_allowed("a@test.io").await);
    }

    #[tokio::test]
    async fn old_attempts_expire() {
        let limiter = LoginAttemptLimiter::new(1, Duration::from_millis(20));
        limiter.record_failure("a@test.io").await;
        assert!(!limiter.is_allowed("a@test.io").await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.is_allowed("a@test.io").await);
    }

    #[tokio::test]
    async fn stale_keys_are_dropped() {
        let limiter = LoginAttemptLimiter::new(3, Duration::from_millis(200));
        for n in 0..100 {
            limiter.record_failure(&format!("user{}@test.io", n)).await;
        }
        assert_eq!(limiter.tracked_keys().await, 100);

        tokio::time::sleep(Duration::from_millis(300)).await;
        limiter.record_failure("fresh@test.io").await;
        assert_eq!(limiter.tracked_keys().await, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(limiter.is_allowed("fresh@test.io").await);
        assert_eq!(limiter.tracked_keys().await, 0);
    }
}
