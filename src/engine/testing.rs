use crate::core::models::{AccountSnapshot, GrantResponse};
use crate::remote::{AccountClient, ClientError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn snapshot(points: i64) -> AccountSnapshot {
    AccountSnapshot {
        uid: "u1".to_string(),
        email: "a@b.com".to_string(),
        points,
        total_games: 0,
        invite_code: None,
        total_referrals: 0,
    }
}

/// Scripted client. Queued fetch results are consumed in order; once the
/// queue is empty every fetch returns `fallback_points`.
pub struct MockClient {
    fetches: Mutex<VecDeque<Result<AccountSnapshot, ClientError>>>,
    grant: Mutex<Result<GrantResponse, ClientError>>,
    fallback_points: i64,
    fetch_calls: AtomicUsize,
    grant_calls: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            fetches: Mutex::new(VecDeque::new()),
            grant: Mutex::new(Ok(GrantResponse {
                message: "points added".to_string(),
            })),
            fallback_points: 0,
            fetch_calls: AtomicUsize::new(0),
            grant_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_points(points: &[i64]) -> Self {
        let client = Self::new();
        for p in points {
            client.push_fetch(Ok(snapshot(*p)));
        }
        client
    }

    pub fn push_fetch(&self, result: Result<AccountSnapshot, ClientError>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    pub fn set_grant(&self, result: Result<GrantResponse, ClientError>) {
        *self.grant.lock().unwrap() = result;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn grant_calls(&self) -> usize {
        self.grant_calls.load(Ordering::SeqCst)
    }
}

pub fn unreachable() -> ClientError {
    ClientError::Network {
        detail: "connection refused".to_string(),
        unreachable: true,
    }
}

#[async_trait]
impl AccountClient for MockClient {
    async fn fetch_account(&self, _uid: &str) -> Result<AccountSnapshot, ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(snapshot(self.fallback_points)))
    }

    async fn grant_points(
        &self,
        _uid: &str,
        _email: &str,
        _device_id: &str,
    ) -> Result<GrantResponse, ClientError> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        self.grant.lock().unwrap().clone()
    }
}
