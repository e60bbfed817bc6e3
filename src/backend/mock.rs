//! Mock backend for testing
//!
//! Scripted implementation of [`GenerationClient`] and [`ImageClient`].
//! Responses are served from FIFO queues; once a queue is exhausted the mock
//! falls back to its configured default behavior.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{Error, Result};

use super::{CompletionRequest, GenerationClient, ImageClient, ImageRequest};

// ─────────────────────────────────────────────────────────────────
// Mock Backend Configuration
// ─────────────────────────────────────────────────────────────────

/// What the mock does when a scripted queue runs dry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenExhausted {
    /// Serve a valid, distinct persona (text) or a mock URL (images)
    Succeed,
    /// Fail every call with a network error
    Fail,
}

/// Configuration for mock backend behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reported by `has_credentials`
    pub credentials: bool,

    /// Simulated latency per completion call
    pub completion_latency: Duration,

    pub completions_exhausted: WhenExhausted,
    pub images_exhausted: WhenExhausted,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            credentials: true,
            completion_latency: Duration::ZERO,
            completions_exhausted: WhenExhausted::Succeed,
            images_exhausted: WhenExhausted::Succeed,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────

/// Track method call counts for verification
#[derive(Debug, Default)]
struct CallCounts {
    complete: u32,
    generate_image: u32,
}

/// Scripted text and image client for tests
pub struct MockBackend {
    config: MockConfig,
    completions: Mutex<VecDeque<Result<String>>>,
    images: Mutex<VecDeque<Result<String>>>,
    call_counts: RwLock<CallCounts>,
    completion_requests: RwLock<Vec<CompletionRequest>>,
    image_requests: RwLock<Vec<ImageRequest>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A mock that always succeeds
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// A mock whose every text and image call fails
    pub fn failing() -> Self {
        Self::with_config(MockConfig {
            completions_exhausted: WhenExhausted::Fail,
            images_exhausted: WhenExhausted::Fail,
            ..Default::default()
        })
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            completions: Mutex::new(VecDeque::new()),
            images: Mutex::new(VecDeque::new()),
            call_counts: RwLock::new(CallCounts::default()),
            completion_requests: RwLock::new(Vec::new()),
            image_requests: RwLock::new(Vec::new()),
        }
    }

    /// Queue a raw completion text
    pub fn push_completion(&self, text: impl Into<String>) -> &Self {
        self.completions.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a completion failure
    pub fn push_completion_error(&self, error: Error) -> &Self {
        self.completions.lock().push_back(Err(error));
        self
    }

    /// Queue an image URL
    pub fn push_image(&self, url: impl Into<String>) -> &Self {
        self.images.lock().push_back(Ok(url.into()));
        self
    }

    /// Queue an image failure
    pub fn push_image_error(&self, error: Error) -> &Self {
        self.images.lock().push_back(Err(error));
        self
    }

    /// Get the number of times a method was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "complete" => counts.complete,
            "generate_image" => counts.generate_image,
            _ => 0,
        }
    }

    /// Every completion request received, in order
    pub fn completion_requests(&self) -> Vec<CompletionRequest> {
        self.completion_requests.read().clone()
    }

    /// Every image request received, in order
    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.read().clone()
    }

    /// Reset all call counts and recorded requests
    pub fn reset_counts(&self) {
        *self.call_counts.write() = CallCounts::default();
        self.completion_requests.write().clear();
        self.image_requests.write().clear();
    }

    /// A valid persona JSON document. Documents for different indices below
    /// 35 are never flagged as duplicates of each other.
    pub fn persona_response(index: usize) -> String {
        const FIRST: [&str; 12] = [
            "Maria", "Derek", "Priya", "Tom", "Lena", "Omar", "Grace", "Victor", "Hana", "Luis",
            "Nadia", "Owen",
        ];
        const LAST: [&str; 11] = [
            "Lopez", "Owens", "Shah", "Becker", "Fischer", "Haddad", "Wright", "Ivanov", "Sato",
            "Mendez", "Carter",
        ];
        const OCCUPATIONS: [&str; 5] = [
            "Procurement Manager",
            "Warehouse Supervisor",
            "Demand Planner",
            "Operations Director",
            "Logistics Analyst",
        ];
        const CITIES: [&str; 7] = [
            "Grand Rapids, Michigan",
            "Toledo, Ohio",
            "Chicago, Illinois",
            "Detroit, Michigan",
            "Milwaukee, Wisconsin",
            "Fort Wayne, Indiana",
            "Lansing, Michigan",
        ];

        let first = FIRST[index % FIRST.len()];
        let last = LAST[(index / FIRST.len() + index) % LAST.len()];
        let occupation = OCCUPATIONS[index % OCCUPATIONS.len()];
        let age_lo = 24 + (index * 7) % 29;
        let income_lo = 45 + (index * 13) % 90;

        serde_json::json!({
            "name": format!("{} {} - {}", first, last, occupation),
            "age_range": format!("{}-{}", age_lo, age_lo + 7),
            "occupation": occupation,
            "industry": "Manufacturing & Logistics",
            "education_level": "Bachelor's degree",
            "income_range": format!("${}k-${}k", income_lo, income_lo + 20),
            "location": CITIES[index % CITIES.len()],
            "description": format!(
                "{} at a regional manufacturer who wants stronger sourcing strategy and supplier negotiation skills.",
                occupation
            ),
            "program_category": "Supply Chain Management",
            "personality_traits": ["analytical", "pragmatic", "collaborative"],
            "values": ["efficiency", "integrity", "growth"],
            "goals": ["Move into a senior role", "Lead supplier strategy"],
            "pain_points": ["Supplier disruptions", "Limited training budget"],
            "preferred_channels": ["LinkedIn", "Email"]
        })
        .to_string()
    }
}

#[async_trait]
impl GenerationClient for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn has_credentials(&self) -> bool {
        self.config.credentials
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let call = {
            let mut counts = self.call_counts.write();
            counts.complete += 1;
            counts.complete as usize
        };
        self.completion_requests.write().push(request.clone());

        if !self.config.completion_latency.is_zero() {
            tokio::time::sleep(self.config.completion_latency).await;
        }

        let scripted = self.completions.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => match self.config.completions_exhausted {
                WhenExhausted::Succeed => Ok(Self::persona_response(call - 1)),
                WhenExhausted::Fail => Err(Error::network("mock://chat/completions", "connection refused")),
            },
        }
    }
}

#[async_trait]
impl ImageClient for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        self.call_counts.write().generate_image += 1;
        self.image_requests.write().push(request.clone());

        let scripted = self.images.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => match self.config.images_exhausted {
                WhenExhausted::Succeed => Ok(format!("mock://images/{}.png", request.persona_id)),
                WhenExhausted::Fail => Err(Error::image(Some(&request.persona_id), "service unavailable")),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
