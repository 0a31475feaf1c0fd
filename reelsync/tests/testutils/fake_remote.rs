//! Deterministic in-process stand-in for the catalog API

use async_trait::async_trait;
use parking_lot::Mutex;
use reelsync::{Movie, PageResult, PagingError, PagingResult, PartitionKey, RemotePagedClient};
use std::collections::VecDeque;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Fetch { partition: PartitionKey, page: u32 },
    Search { query: String, page: u32 },
}

pub struct FakeRemote {
    total_pages: Mutex<u32>,
    page_size: Mutex<usize>,
    failures: Mutex<VecDeque<PagingError>>,
    calls: Mutex<Vec<RemoteCall>>,
    call_count: watch::Sender<usize>,
    gate: watch::Sender<bool>,
}

impl FakeRemote {
    /// Every listing has `total_pages` pages of `page_size` movies
    pub fn new(total_pages: u32, page_size: usize) -> Self {
        Self {
            total_pages: Mutex::new(total_pages),
            page_size: Mutex::new(page_size),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            call_count: watch::channel(0).0,
            gate: watch::channel(true).0,
        }
    }

    pub fn set_total_pages(&self, total_pages: u32) {
        *self.total_pages.lock() = total_pages;
    }

    /// The next call fails with `error` instead of answering
    pub fn fail_next(&self, error: PagingError) {
        self.failures.lock().push_back(error);
    }

    /// Calls block after being logged until [`FakeRemote::open_gate`]
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Pages requested for `partition`, in order
    pub fn fetched_pages(&self, partition: &PartitionKey) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Fetch { partition: p, page } if p == partition => Some(*page),
                _ => None,
            })
            .collect()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.call_count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    pub fn movie(tag: &str, page: u32, index: usize) -> Movie {
        Movie {
            id: u64::from(page) * 1_000 + index as u64,
            title: format!("{} p{} #{}", tag, page, index),
            overview: format!("Overview of {} page {}", tag, page),
            poster_path: Some(format!("/{}-{}.jpg", page, index)),
            backdrop_path: None,
            release_date: Some("2024-05-01".to_string()),
            vote_average: 7.5,
            vote_count: 100,
            original_language: Some("en".to_string()),
        }
    }

    async fn answer(&self, call: RemoteCall, tag: String, page: u32) -> PagingResult<PageResult> {
        self.calls.lock().push(call);
        self.call_count.send_modify(|count| *count += 1);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let total_pages = *self.total_pages.lock();
        let page_size = *self.page_size.lock();
        let items = if page <= total_pages {
            (0..page_size).map(|i| Self::movie(&tag, page, i)).collect()
        } else {
            Vec::new()
        };
        Ok(PageResult {
            items,
            page,
            total_pages,
            total_results: u64::from(total_pages) * page_size as u64,
        })
    }
}

#[async_trait]
impl RemotePagedClient for FakeRemote {
    async fn fetch_page(&self, partition: &PartitionKey, page: u32) -> PagingResult<PageResult> {
        let call = RemoteCall::Fetch {
            partition: partition.clone(),
            page,
        };
        self.answer(call, partition.to_string(), page).await
    }

    async fn search_page(&self, query: &str, language: &str, page: u32) -> PagingResult<PageResult> {
        let call = RemoteCall::Search {
            query: query.to_string(),
            page,
        };
        self.answer(call, format!("{}:{}", query, language), page).await
    }
}
