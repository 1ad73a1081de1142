//! Retrying model client.
//!
//! [`ModelClient::invoke`] is the pipeline's only way to reach the model.
//! It retries with exponential backoff and reports final failure as `None`
//! rather than an error.

use crate::config::RetryPolicy;
use crate::error::ModelError;
use crate::model::transport::{ModelRequest, ModelTransport};
use std::time::Duration;
use tracing::{debug, warn};

/// Blocks between retry attempts.
pub trait Sleeper: Send {
    /// Waits for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Text-generation client with retry and backoff.
pub struct ModelClient {
    transport: Box<dyn ModelTransport>,
    sleeper: Box<dyn Sleeper>,
    model: String,
    policy: RetryPolicy,
}

impl ModelClient {
    /// Creates a client that sleeps on the calling thread between attempts.
    #[must_use]
    pub fn new(
        transport: Box<dyn ModelTransport>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper: Box::new(ThreadSleeper),
            model: model.into(),
            policy,
        }
    }

    /// Replaces the sleeper used for backoff waits.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invokes the model with the configured retry budget.
    ///
    /// Returns `None` once every attempt has failed.
    pub fn invoke(&self, prompt: &str) -> Option<String> {
        self.invoke_with_retries(prompt, self.policy.max_retries)
    }

    /// Invokes the model with an explicit retry budget (0 is treated as 1).
    pub fn invoke_with_retries(&self, prompt: &str, max_retries: u32) -> Option<String> {
        self.try_invoke(prompt, max_retries).ok()
    }

    /// Invokes the model, returning the last error after the final attempt.
    ///
    /// Attempt `n` (zero-based) that fails is followed by a wait of
    /// `unit * 2^n` unless it was the last attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the final failed attempt.
    pub fn try_invoke(&self, prompt: &str, max_retries: u32) -> Result<String, ModelError> {
        let attempts = RetryPolicy {
            max_retries,
            ..self.policy
        }
        .attempts();
        let request = ModelRequest::user(self.model.as_str(), prompt);
        let mut last_error = ModelError::EmptyOutput;

        for attempt in 0..attempts {
            debug!(attempt = attempt + 1, prompt_len = prompt.len(), model = %self.model, "calling model");

            match self.transport.send(&request).and_then(|r| r.into_text()) {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if attempt + 1 < attempts {
                        let wait = self.policy.delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            error = %err,
                            "model call failed; retrying in {wait:?}"
                        );
                        self.sleeper.sleep(wait);
                    } else {
                        warn!(
                            attempt = attempt + 1,
                            error = %err,
                            "model call failed; retry budget exhausted"
                        );
                    }
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::ModelResponse;
    use std::sync::{Arc, Mutex};

    /// Fails the first `failures` calls, then answers with `text`.
    struct FlakyTransport {
        failures: usize,
        calls: Arc<Mutex<usize>>,
        text: &'static str,
    }

    impl ModelTransport for FlakyTransport {
        fn send(&self, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.failures {
                Err(ModelError::Transport("connection reset".to_string()))
            } else {
                Ok(ModelResponse::text(self.text.to_string()))
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn client(failures: usize, max_retries: u32) -> (ModelClient, RecordingSleeper, Arc<Mutex<usize>>) {
        let calls = Arc::new(Mutex::new(0));
        let transport = FlakyTransport {
            failures,
            calls: Arc::clone(&calls),
            text: "SELECT 1",
        };
        let sleeper = RecordingSleeper::default();
        let client = ModelClient::new(
            Box::new(transport),
            "test-model",
            RetryPolicy::with_max_retries(max_retries),
        )
        .with_sleeper(Box::new(sleeper.clone()));
        (client, sleeper, calls)
    }

    #[test]
    fn test_first_attempt_success_does_not_wait() {
        let (client, sleeper, calls) = client(0, 3);
        assert_eq!(client.invoke("q").as_deref(), Some("SELECT 1"));
        assert!(sleeper.0.lock().unwrap().is_empty());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_recovers_after_failures_with_backoff() {
        let (client, sleeper, calls) = client(2, 3);
        assert_eq!(client.invoke("q").as_deref(), Some("SELECT 1"));
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_exhausted_budget_returns_none() {
        let (client, sleeper, calls) = client(10, 3);
        assert_eq!(client.invoke("q"), None);
        assert_eq!(*calls.lock().unwrap(), 3);
        // No wait after the final attempt
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_try_invoke_keeps_last_error() {
        let (client, _sleeper, _calls) = client(10, 2);
        let err = client.try_invoke("q", 2).unwrap_err();
        assert!(matches!(err, ModelError::Transport(_)));
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let (client, _sleeper, calls) = client(10, 0);
        assert_eq!(client.invoke_with_retries("q", 0), None);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_empty_output_is_retried() {
        struct BlankThenText(Arc<Mutex<usize>>);

        impl ModelTransport for BlankThenText {
            fn send(&self, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
                let mut n = self.0.lock().unwrap();
                *n += 1;
                let text = if *n == 1 { "" } else { "answer" };
                Ok(ModelResponse::text(text.to_string()))
            }
        }

        let sleeper = RecordingSleeper::default();
        let client = ModelClient::new(
            Box::new(BlankThenText(Arc::new(Mutex::new(0)))),
            "test-model",
            RetryPolicy::default(),
        )
        .with_sleeper(Box::new(sleeper.clone()));

        assert_eq!(client.invoke("q").as_deref(), Some("answer"));
        assert_eq!(sleeper.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_accessors() {
        let (client, _sleeper, _calls) = client(0, 5);
        assert_eq!(client.model(), "test-model");
        assert_eq!(client.policy().max_retries, 5);
    }
}
