/*!
 * Mock provider for tests.
 *
 * - `MockBehavior::Found` always returns the given content
 * - `MockBehavior::NotFound` never finds a subtitle
 * - `MockBehavior::Failing` always fails with an API error
 */

use async_trait::async_trait;
use isolang::Language;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::SubtitleProvider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Return this SRT content for every request
    Found(String),
    /// Nothing available
    NotFound,
    /// Always fail
    Failing,
}

/// Provider answering from memory
#[derive(Debug)]
pub struct MockProvider {
    behavior: MockBehavior,
    request_count: AtomicUsize,
    requests: Mutex<Vec<(PathBuf, Language)>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Videos and languages asked for so far, in request order
    pub fn requests(&self) -> Vec<(PathBuf, Language)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SubtitleProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, video: &Path, language: Language) -> Result<Option<String>, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((video.to_path_buf(), language));

        match &self.behavior {
            MockBehavior::Found(content) => Ok(Some(content.clone())),
            MockBehavior::NotFound => Ok(None),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Service unavailable".to_string(),
            }),
        }
    }
}
