use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Number of `check` calls between two sweeps of idle clients.
const DEFAULT_SWEEP_INTERVAL: u64 = 256;

/// A simple rate limiter using a sliding window algorithm.
///
/// It tracks request timestamps for each unique ID (here the client IP address)
/// to determine if a new request is allowed.
pub struct RateLimiter {
    /// Stores timestamps of requests for each client ID.
    requests: HashMap<String, Vec<Instant>>,
    /// The maximum number of requests allowed within the `window`.
    limit: usize,
    /// The duration of the sliding window.
    window: Duration,
    /// Calls between sweeps of clients whose whole history expired.
    sweep_interval: u64,
    calls: u64,
}

impl RateLimiter {
    /// Creates a new `RateLimiter`.
    ///
    /// # Arguments
    ///
    /// * `limit` - The number of requests allowed per `window`.
    /// * `window` - The time duration of the sliding window.
    pub fn new(limit: usize, window: Duration) -> Self {
        RateLimiter {
            requests: HashMap::new(),
            limit,
            window,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            calls: 0,
        }
    }

    /// Sweeps idle clients every `interval` calls instead of the default.
    pub fn with_sweep_interval(mut self, interval: u64) -> Self {
        self.sweep_interval = interval.max(1);
        self
    }

    /// Checks if a request from a given ID is allowed.
    ///
    /// If the request is allowed, it's recorded and the function returns `true`.
    /// Otherwise, it returns `false`.
    pub fn check(&mut self, id: &str) -> bool {
        let now = Instant::now();
        let window = self.window;

        self.calls += 1;
        if self.calls % self.sweep_interval == 0 {
            self.sweep(now);
        }

        let client_requests = self.requests.entry(id.to_string()).or_default();
        client_requests.retain(|&t| now.duration_since(t) < window);
        if client_requests.len() < self.limit {
            client_requests.push(now);
            true
        } else {
            false
        }
    }

    /// Drops clients whose whole history fell out of the window.
    fn sweep(&mut self, now: Instant) {
        let window = self.window;
        self.requests.retain(|_, stamps| {
            stamps.retain(|&t| now.duration_since(t) < window);
            !stamps.is_empty()
        });
    }

    /// Number of clients currently tracked, idle ones included until the next sweep.
    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}
