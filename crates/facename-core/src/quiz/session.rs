//! Ephemeral state handed from memorization to settings to results.

use super::{TestResults, TestSettings};

/// Values carried between quiz stages. Each setter replaces the previous
/// value; nothing is merged and nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    face_ids: Option<Vec<String>>,
    test_settings: Option<TestSettings>,
    test_results: Option<TestResults>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_face_ids(&mut self, face_ids: Vec<String>) {
        self.face_ids = Some(face_ids);
    }

    pub fn face_ids(&self) -> Option<&[String]> {
        self.face_ids.as_deref()
    }

    pub fn set_test_settings(&mut self, settings: TestSettings) {
        self.test_settings = Some(settings);
    }

    pub fn test_settings(&self) -> Option<&TestSettings> {
        self.test_settings.as_ref()
    }

    pub fn set_test_results(&mut self, results: TestResults) {
        self.test_results = Some(results);
    }

    pub fn test_results(&self) -> Option<&TestResults> {
        self.test_results.as_ref()
    }

    /// Back to settings for another attempt on the same faces.
    pub fn retry(&mut self) {
        self.test_results = None;
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
