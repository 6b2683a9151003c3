// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Start/stop coordination for background loops.
//!
//! A lifecycle moves `Idle -> Running -> Stopped` exactly once. Stopping
//! broadcasts on a watch channel that every registered loop selects on.

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopped,
}

pub struct LifeCycle {
    state: Mutex<State>,
    stop_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for LifeCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LifeCycle {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            state: Mutex::new(State::Idle),
            stop_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Transition Idle -> Running. Returns false if already running or
    /// stopped; a stopped lifecycle cannot be restarted.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if *state != State::Idle {
            return false;
        }
        *state = State::Running;
        true
    }

    /// Transition Running -> Stopped and signal every subscribed loop.
    /// Returns false unless the lifecycle was running.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if *state != State::Running {
            return false;
        }
        *state = State::Stopped;
        let _ = self.stop_tx.send(true);
        true
    }

    pub fn is_running(&self) -> bool {
        *self.state.lock() == State::Running
    }

    /// Receiver that resolves when `stop` fires.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Track a spawned loop so `wait` can join it on shutdown.
    pub fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().push(handle);
    }

    /// Wait for every registered loop to drain and exit.
    pub async fn wait(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_idempotent() {
        let lc = LifeCycle::new();
        assert!(lc.start());
        assert!(!lc.start());
        assert!(lc.is_running());
    }

    #[test]
    fn test_stop_then_start_fails() {
        let lc = LifeCycle::new();
        assert!(lc.start());
        assert!(lc.stop());
        assert!(!lc.stop());
        assert!(!lc.start());
        assert!(!lc.is_running());
    }

    #[test]
    fn test_stop_before_start_fails() {
        let lc = LifeCycle::new();
        assert!(!lc.stop());
    }

    #[tokio::test]
    async fn test_stop_signals_subscribers() {
        let lc = LifeCycle::new();
        lc.start();

        let mut stop_rx = lc.subscribe_stop();
        let handle = tokio::spawn(async move {
            stop_rx.changed().await.expect("stop channel closed");
        });
        lc.register(handle);

        lc.stop();
        lc.wait().await;
    }
}
