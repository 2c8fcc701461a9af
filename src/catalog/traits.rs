//! Trait definitions for the catalog's HTTP-JSON primitive.
//!
//! The resolver never talks to reqwest directly: it asks a [`JsonFetcher`]
//! for a parsed JSON body. Production code uses the
//! [`HttpInterfaceManager`](crate::transport::HttpInterfaceManager); tests
//! substitute the mocks below.

use async_trait::async_trait;
use serde_json::Value;

use super::domain::ResolveError;

/// Fetch a URL and parse the body as JSON.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url` with `Accept: application/json` and the given user agent.
    ///
    /// Returns `Ok(None)` when the API answers with no document (HTTP 404,
    /// empty body, or a literal `null`).
    async fn get_json(&self, url: &str, user_agent: &str) -> Result<Option<Value>, ResolveError>;
}

/// Mock fetchers for testing.
///
/// Return configurable responses and record every request.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;

    /// A request seen by [`MockFetcher`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SeenRequest {
        pub url: String,
        pub user_agent: String,
    }

    /// Mock fetcher that returns a predefined body.
    pub struct MockFetcher {
        /// Body to return
        pub body: Option<Value>,
        /// Error to return (takes precedence over body)
        pub error: Option<ResolveError>,
        /// Requests received, in order
        pub requests: Mutex<Vec<SeenRequest>>,
    }

    impl MockFetcher {
        /// Create a mock answering with the given JSON text.
        pub fn with_json(json: &str) -> Self {
            Self {
                body: serde_json::from_str(json).expect("valid mock JSON"),
                error: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock answering with no document.
        pub fn empty() -> Self {
            Self {
                body: None,
                error: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock that fails every request.
        pub fn with_error(error: ResolveError) -> Self {
            Self {
                body: None,
                error: Some(error),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// URLs requested so far.
        pub fn urls(&self) -> Vec<String> {
            self.requests.lock().iter().map(|r| r.url.clone()).collect()
        }

        /// Number of requests made so far.
        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl JsonFetcher for MockFetcher {
        async fn get_json(
            &self,
            url: &str,
            user_agent: &str,
        ) -> Result<Option<Value>, ResolveError> {
            self.requests.lock().push(SeenRequest {
                url: url.to_string(),
                user_agent: user_agent.to_string(),
            });
            if let Some(ref err) = self.error {
                return Err(err.clone());
            }
            Ok(self.body.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_records_requests() {
            let mock = MockFetcher::with_json("[]");
            let body = mock.get_json("https://api/x", "agent").await.unwrap();

            assert_eq!(body, Some(Value::Array(vec![])));
            assert_eq!(mock.urls(), vec!["https://api/x".to_string()]);
            assert_eq!(mock.requests.lock()[0].user_agent, "agent");
        }

        #[tokio::test]
        async fn test_mock_error() {
            let mock = MockFetcher::with_error(ResolveError::Http("boom".to_string()));
            assert!(mock.get_json("https://api/x", "agent").await.is_err());
            assert_eq!(mock.request_count(), 1);
        }
    }
}
