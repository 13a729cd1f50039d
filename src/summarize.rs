use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use crate::{Error, Result};

pub const SUMMARY_PROMPT: &str = "You are a YouTube video summarizer. You will be taking the transcript text and summarizing the entire video, \
providing the important points as proper sub-headings in a concise manner (within 500 words). \
Please provide the summary of the text given here:\n";

/// How a generation call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    ModelNotFound,
    Credential,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerateFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A text-generation backend: prompt in, text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerateFailure>;

    /// Model name, for error messages
    fn model(&self) -> &str;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Retry on rate limits only, with linearly growing delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// What to do after `attempt` (1-based) failed with `kind`.
    ///
    /// The delay saturates at `Duration::MAX` instead of overflowing.
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::RateLimited if attempt < self.max_attempts => {
                RetryDecision::Retry(self.base_delay.saturating_mul(attempt))
            }
            _ => RetryDecision::GiveUp,
        }
    }
}

/// Summarizes transcript text through a [`TextGenerator`]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Summarize transcript text.
    ///
    /// The remote call is not idempotent: a retried request may be billed twice.
    pub async fn summarize(&self, transcript_text: &str) -> Result<String> {
        if transcript_text.trim().is_empty() {
            return Err(Error::InvalidInput("transcript text is empty".to_string()));
        }

        let prompt = format!("{SUMMARY_PROMPT}{transcript_text}");
        let mut attempt = 1;

        loop {
            debug!("Summarization attempt {attempt} with model {}", self.generator.model());
            let failure = match self.generator.generate(&prompt).await {
                Ok(text) => return Ok(text),
                Err(failure) => failure,
            };

            match self.policy.decide(attempt, failure.kind) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        "Rate limit exceeded, retrying in {}s (attempt {attempt}/{})",
                        delay.as_secs(),
                        self.policy.max_attempts
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => return Err(self.error_for(attempt, failure)),
            }
        }
    }

    fn error_for(&self, attempts: u32, failure: GenerateFailure) -> Error {
        match failure.kind {
            FailureKind::RateLimited => Error::RateLimited { attempts },
            FailureKind::ModelNotFound => Error::Configuration(format!(
                "model '{}' not found; check the model name and that the API is enabled: {}",
                self.generator.model(),
                failure.message
            )),
            FailureKind::Credential => Error::Configuration(failure.message),
            FailureKind::Other => Error::Upstream(failure.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<Vec<std::result::Result<String, GenerateFailure>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<std::result::Result<String, GenerateFailure>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerateFailure> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(GenerateFailure::new(FailureKind::Other, "script exhausted")))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn rate_limited() -> std::result::Result<String, GenerateFailure> {
        Err(GenerateFailure::new(FailureKind::RateLimited, "RATE_LIMIT_EXCEEDED"))
    }

    fn summarizer(generator: Arc<Scripted>, sleeper: Arc<RecordingSleeper>) -> Summarizer {
        Summarizer::new(generator).with_sleeper(sleeper)
    }

    #[test]
    fn test_policy_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, FailureKind::RateLimited),
            RetryDecision::Retry(Duration::from_secs(10))
        );
        assert_eq!(
            policy.decide(2, FailureKind::RateLimited),
            RetryDecision::Retry(Duration::from_secs(20))
        );
        assert_eq!(policy.decide(3, FailureKind::RateLimited), RetryDecision::GiveUp);
    }

    #[test]
    fn test_policy_never_retries_other_failures() {
        let policy = RetryPolicy::default();
        for kind in [FailureKind::ModelNotFound, FailureKind::Credential, FailureKind::Other] {
            assert_eq!(policy.decide(1, kind), RetryDecision::GiveUp);
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let generator = Scripted::new(vec![Ok("## Summary".to_string())]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        assert_eq!(s.summarize("some transcript").await.unwrap(), "## Summary");
        assert_eq!(generator.calls(), 1);
        assert!(sleeper.waits.lock().unwrap().is_empty());

        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.starts_with(SUMMARY_PROMPT));
        assert!(prompt.ends_with("some transcript"));
    }

    #[tokio::test]
    async fn test_two_rate_limits_then_success() {
        let generator = Scripted::new(vec![rate_limited(), rate_limited(), Ok("done".to_string())]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        assert_eq!(s.summarize("text").await.unwrap(), "done");
        assert_eq!(generator.calls(), 3);
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_secs(10), Duration::from_secs(20)]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let generator = Scripted::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Ok("never reached".to_string()),
        ]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        let err = s.summarize("text").await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { attempts: 3 }));
        assert_eq!(generator.calls(), 3);
        assert_eq!(sleeper.waits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_model_not_found_is_configuration_error() {
        let generator = Scripted::new(vec![Err(GenerateFailure::new(
            FailureKind::ModelNotFound,
            "models/gemini-pro is not found",
        ))]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        let err = s.summarize("text").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("scripted"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_failure_not_retried() {
        let generator = Scripted::new(vec![
            Err(GenerateFailure::new(FailureKind::Other, "500 internal")),
            Ok("never reached".to_string()),
        ]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        let err = s.summarize("text").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m == "500 internal"));
        assert_eq!(generator.calls(), 1);
        assert!(sleeper.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_then_other_failure() {
        let generator = Scripted::new(vec![
            rate_limited(),
            Err(GenerateFailure::new(FailureKind::Credential, "API key not valid")),
        ]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone());

        let err = s.summarize("text").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(generator.calls(), 2);
        assert_eq!(*sleeper.waits.lock().unwrap(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn test_empty_text_skips_call() {
        let generator = Scripted::new(vec![Ok("x".to_string())]);
        let s = summarizer(generator.clone(), Arc::new(RecordingSleeper::default()));

        assert!(matches!(s.summarize("   ").await, Err(Error::InvalidInput(_))));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_policy() {
        let generator = Scripted::new(vec![rate_limited(), rate_limited()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone()).with_policy(RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(5),
        });

        assert!(matches!(s.summarize("text").await, Err(Error::RateLimited { attempts: 2 })));
        assert_eq!(*sleeper.waits.lock().unwrap(), vec![Duration::from_millis(5)]);
    }

    #[test]
    fn test_policy_delay_saturates() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(u64::MAX),
        };
        assert_eq!(
            policy.decide(1, FailureKind::RateLimited),
            RetryDecision::Retry(Duration::from_secs(u64::MAX))
        );
        assert_eq!(policy.decide(2, FailureKind::RateLimited), RetryDecision::Retry(Duration::MAX));
    }

    #[tokio::test]
    async fn test_huge_base_delay_does_not_panic() {
        let generator = Scripted::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let s = summarizer(generator.clone(), sleeper.clone()).with_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(u64::MAX),
        });

        assert!(matches!(s.summarize("text").await, Err(Error::RateLimited { attempts: 3 })));
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_secs(u64::MAX), Duration::MAX]
        );
    }
}
