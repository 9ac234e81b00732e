//! Scripted stand-in for the remote search API, used by fetcher and
//! coordinator tests.

use crate::api::{ApiError, EmoteRecord, Page, SearchApi};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted response for a (query, offset) request
pub(crate) enum MockResponse {
    Page(Vec<EmoteRecord>),
    RateLimited,
    Error,
}

/// Mock API replaying scripted responses and recording every call
pub(crate) struct MockApi {
    script: Mutex<HashMap<(String, usize), VecDeque<MockResponse>>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next response for a (query, offset) pair
    pub fn enqueue(&self, query: &str, offset: usize, response: MockResponse) {
        self.script
            .lock()
            .unwrap()
            .entry((query.to_string(), offset))
            .or_default()
            .push_back(response);
    }

    /// Total number of requests the mock has served
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests served for one (query, offset) pair
    pub fn calls_at(&self, query: &str, offset: usize) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, o)| q == query && *o == offset)
            .count()
    }
}

impl SearchApi for MockApi {
    async fn search_page(&self, query: &str, offset: usize) -> Result<Page, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), offset));

        let mut script = self.script.lock().unwrap();
        let response = script
            .get_mut(&(query.to_string(), offset))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unscripted request: {:?} offset {}", query, offset));

        match response {
            MockResponse::Page(records) => Ok(Page::Records(records)),
            MockResponse::RateLimited => Ok(Page::RateLimited),
            MockResponse::Error => Err(ApiError::Status {
                query: query.to_string(),
                offset,
                status: StatusCode::INTERNAL_SERVER_ERROR,
            }),
        }
    }
}

/// Build `count` records with ids unique from `offset` upward, spread over
/// a handful of codes
pub(crate) fn records(offset: usize, count: usize) -> Vec<EmoteRecord> {
    (0..count)
        .map(|i| EmoteRecord {
            code: format!("emote{}", (offset + i) % 7),
            id: format!("id{}", offset + i),
        })
        .collect()
}
