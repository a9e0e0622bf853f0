//! A blocking connection pool, matching the synchronous `mysql` driver: no
//! async runtime, just OS threads blocking on a `Condvar` until a slot frees
//! up or the wait times out.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Checked out before use; `validate` lets the pool drop connections MySQL
/// has silently closed (`wait_timeout`) instead of handing out a dead one.
pub trait PooledConnection: Send {
    fn is_alive(&mut self) -> bool;
}

struct PoolState<C> {
    idle: Vec<C>,
    /// Connections currently checked out, tracked only by count — the pool
    /// never needs to reach into a connection it handed out.
    in_use: usize,
    closed: bool,
}

/// `pop`/`push`/`close`/`size`/`available` as a direct contract: callers
/// borrow a connection, use it, and must `push` it back (or drop it and let
/// the pool shrink) rather than holding it past its natural scope.
pub struct Pool<C> {
    state: Mutex<PoolState<C>>,
    not_empty: Condvar,
    capacity: usize,
}

impl<C: PooledConnection> Pool<C> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(capacity),
                in_use: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Seeds the pool with an already-open connection (e.g. right after
    /// the first `connect()` at startup).
    pub fn seed(&self, connection: C) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.idle.push(connection);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Blocks up to `timeout` for a connection. Returns a stale connection
    /// to the caller only if `is_alive()` says it should be retried — dead
    /// connections are dropped and the wait continues against the
    /// remaining deadline.
    pub fn pop(&self, timeout: Duration, mut connect: impl FnMut() -> Result<C>) -> Result<C> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().expect("pool mutex poisoned");

        loop {
            if state.closed {
                return Err(Error::ConnectionLost("pool is closed".to_string()));
            }

            while let Some(mut candidate) = state.idle.pop() {
                if candidate.is_alive() {
                    state.in_use += 1;
                    return Ok(candidate);
                }
                // Dead connection: shrink capacity usage and keep looking.
            }

            if state.in_use < self.capacity {
                state.in_use += 1;
                drop(state);
                return connect().inspect_err(|_| {
                    let mut state = self.state.lock().expect("pool mutex poisoned");
                    state.in_use -= 1;
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::PoolTimeout(timeout));
            }

            let (guard, result) = self
                .not_empty
                .wait_timeout(state, deadline - now)
                .expect("pool condvar poisoned");
            state = guard;
            if result.timed_out() && state.idle.is_empty() && state.in_use >= self.capacity {
                return Err(Error::PoolTimeout(timeout));
            }
        }
    }

    /// Returns a connection to the idle set and wakes one waiter.
    pub fn push(&self, connection: C) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.in_use = state.in_use.saturating_sub(1);
        if state.closed {
            drop(state);
            return;
        }
        state.idle.push(connection);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Marks a checked-out connection as discarded (e.g. it errored and
    /// can't be reused) without returning it to the idle set.
    pub fn discard(&self) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.in_use = state.in_use.saturating_sub(1);
        drop(state);
        self.not_empty.notify_one();
    }

    pub fn close(&self) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.closed = true;
        state.idle.clear();
        drop(state);
        self.not_empty.notify_all();
    }

    #[must_use]
    pub fn size(&self) -> usize {
        let state = self.state.lock().expect("pool mutex poisoned");
        state.idle.len() + state.in_use
    }

    #[must_use]
    pub fn available(&self) -> usize {
        let state = self.state.lock().expect("pool mutex poisoned");
        state.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeConnection {
        alive: bool,
    }

    impl PooledConnection for FakeConnection {
        fn is_alive(&mut self) -> bool {
            self.alive
        }
    }

    #[test]
    fn pop_reuses_idle_connection_without_reconnecting() {
        let pool = Pool::new(1);
        pool.seed(FakeConnection { alive: true });

        let mut connect_calls = 0;
        let conn = pool
            .pop(Duration::from_millis(50), || {
                connect_calls += 1;
                Ok(FakeConnection { alive: true })
            })
            .unwrap();
        assert_eq!(connect_calls, 0);
        pool.push(conn);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn pop_times_out_when_capacity_exhausted() {
        let pool: Pool<FakeConnection> = Pool::new(1);
        let _held = pool.pop(Duration::from_millis(10), || Ok(FakeConnection { alive: true })).unwrap();

        let result = pool.pop(Duration::from_millis(20), || Ok(FakeConnection { alive: true }));
        assert!(matches!(result, Err(Error::PoolTimeout(_))));
    }

    #[test]
    fn dead_idle_connections_are_not_handed_out() {
        let pool = Pool::new(1);
        pool.seed(FakeConnection { alive: false });

        let mut connect_calls = 0;
        let conn = pool
            .pop(Duration::from_millis(50), || {
                connect_calls += 1;
                Ok(FakeConnection { alive: true })
            })
            .unwrap();
        assert_eq!(connect_calls, 1);
        assert!(conn.alive);
    }
}
