//! Offline image backend for demos and tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use facename_core::error::ProviderError;
use facename_core::traits::{ImageBackend, ImageRequest};

/// A 16x16 gradient PNG, base64-encoded.
pub const SAMPLE_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAIAAACQkWg2AAABlklEQVR42hXR4RiFMQiG4Q9hCEMIYQghhDCEEIbwIIQQQgghDOHs9Lu7662+72N8zA/5WB/6YR/7wz/OBx/xkR/10R/34/sGYzAHMlgDHdhgD3xwBgxikIMa9OCOByZjMicyWROd2GRPfHImTGKSk5r05M4HhCFMQYQlqGDCFlw4AkIIKZTQwpUHFmMxF7JYC13YYi98cRYsYpGLWvTirgeUoUxFlKWoYspWXDkKSiiplNLK1QeMYUxDjGWoYcY23DgGRhhplNHGtQc2YzM3slkb3dhmb3xzNmxik5va9ObuB5zhTEec5ahjznbcOQ5OOOmU0871Bw7jMA9yWAc92GEf/HAOHOKQhzr04Z4H/s95534HfCd5S77YL8gb/Zr/FZBQ0HDf679gBDOQYAUaWLADD0782yPIoIIObjyQjGQmkqxEE0t24snJ//BIMqmkk5sPFKOYhRSr0MKKXXhx6h8liiyq6OLWA81oZiPNarSxZjfenP4Hjyabarq5/cBlXOZFLuuiF7vsi1/O/a8Zl7zUpS/38gNq4ZAQAX6pcwAAAABJRU5ErkJggg==";

/// Image backend that answers without any network access.
///
/// Scripted failures are returned first, one per call; after that every call
/// gets the fixed response.
pub struct MockBackend {
    response: Value,
    failures: Mutex<VecDeque<ProviderError>>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ImageRequest>>,
}

impl MockBackend {
    /// Backend returning the sample PNG in the `artifacts` shape.
    pub fn new() -> Self {
        Self::with_fixed_response(json!({
            "artifacts": [{ "base64": SAMPLE_PNG_BASE64, "finishReason": "SUCCESS" }]
        }))
    }

    /// Backend that always returns `response`.
    pub fn with_fixed_response(response: Value) -> Self {
        Self {
            response,
            failures: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Fail the next calls with `failures`, in order.
    pub fn failing_first(self, failures: impl IntoIterator<Item = ProviderError>) -> Self {
        if let Ok(mut queue) = self.failures.lock() {
            queue.extend(failures);
        }
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ImageRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn request_image(&self, request: &ImageRequest) -> Result<Value, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        let failure = self.failures.lock().ok().and_then(|mut q| q.pop_front());
        match failure {
            Some(e) => Err(e),
            None => Ok(self.response.clone()),
        }
    }
}
