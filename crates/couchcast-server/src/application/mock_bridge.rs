//! Mock debug bridge for unit and integration testing.
//!
//! Implements [`BridgeTransport`] without an adb daemon.  Tests queue
//! failures for the next connect, device lookup, or send, then inspect the
//! call counters and the commands that reached the "device".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use couchcast_core::{ControlError, DeviceAddress};

use super::control_session::{BridgeClient, BridgeTransport, DeviceHandle, SendError};

#[derive(Default)]
struct MockState {
    connect_calls: AtomicUsize,
    device_calls: AtomicUsize,
    send_calls: AtomicUsize,
    connect_failures: Mutex<VecDeque<ControlError>>,
    device_failures: Mutex<VecDeque<ControlError>>,
    send_failures: Mutex<VecDeque<SendError>>,
    sent: Mutex<Vec<String>>,
    send_delay: Mutex<Option<Duration>>,
}

/// A scriptable in-memory [`BridgeTransport`].
///
/// Clones share state, so a test can keep one clone for assertions and hand
/// another to the session.  Calls succeed unless a failure was queued.
#[derive(Clone, Default)]
pub struct MockBridge {
    state: Arc<MockState>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `connect()` fail with `error`.
    pub fn fail_next_connect(&self, error: ControlError) {
        self.state
            .connect_failures
            .lock()
            .expect("lock poisoned")
            .push_back(error);
    }

    /// Makes the next device lookup fail with `error`.
    pub fn fail_next_device(&self, error: ControlError) {
        self.state
            .device_failures
            .lock()
            .expect("lock poisoned")
            .push_back(error);
    }

    /// Makes the next send fail with `message`.  Calls queue up in order.
    pub fn fail_next_send(&self, message: &str) {
        self.state
            .send_failures
            .lock()
            .expect("lock poisoned")
            .push_back(SendError::new(message));
    }

    /// Makes every send sleep for `delay` before answering.
    pub fn delay_sends(&self, delay: Duration) {
        *self.state.send_delay.lock().expect("lock poisoned") = Some(delay);
    }

    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }

    pub fn device_calls(&self) -> usize {
        self.state.device_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.state.send_calls.load(Ordering::SeqCst)
    }

    /// Commands that were sent successfully, in order.
    pub fn sent_commands(&self) -> Vec<String> {
        self.state.sent.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl BridgeTransport for MockBridge {
    async fn connect(&self) -> Result<Arc<dyn BridgeClient>, ControlError> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .state
            .connect_failures
            .lock()
            .expect("lock poisoned")
            .pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(Arc::new(MockClient {
                state: Arc::clone(&self.state),
            })),
        }
    }
}

struct MockClient {
    state: Arc<MockState>,
}

#[async_trait]
impl BridgeClient for MockClient {
    async fn device(&self, _address: &DeviceAddress) -> Result<Arc<dyn DeviceHandle>, ControlError> {
        self.state.device_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .state
            .device_failures
            .lock()
            .expect("lock poisoned")
            .pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(Arc::new(MockDevice {
                state: Arc::clone(&self.state),
            })),
        }
    }
}

struct MockDevice {
    state: Arc<MockState>,
}

#[async_trait]
impl DeviceHandle for MockDevice {
    async fn shell(&self, command: &str) -> Result<String, SendError> {
        self.state.send_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.send_delay.lock().expect("lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .state
            .send_failures
            .lock()
            .expect("lock poisoned")
            .pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        self.state
            .sent
            .lock()
            .expect("lock poisoned")
            .push(command.to_string());
        Ok(String::new())
    }
}
