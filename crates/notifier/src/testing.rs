//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::client::{DispatchOutcome, NotificationClient};

/// One recorded `send` call.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub token: String,
    pub title: String,
    pub text: String,
    pub at: Instant,
}

/// Client that records every call and replays scripted outcomes.
///
/// Once the script runs out every call succeeds. The first call for
/// `panic_token` panics; later calls for it behave normally.
#[derive(Default)]
pub(crate) struct RecordingClient {
    script: Mutex<VecDeque<DispatchOutcome>>,
    calls: Mutex<Vec<Call>>,
    panic_token: Mutex<Option<String>>,
}

impl RecordingClient {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: Vec<DispatchOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn panicking_on(token: &str) -> Self {
        Self {
            panic_token: Mutex::new(Some(token.to_string())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationClient for RecordingClient {
    async fn send(&self, token: &str, title: &str, text: &str) -> DispatchOutcome {
        self.calls.lock().unwrap().push(Call {
            token: token.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            at: Instant::now(),
        });
        let should_panic = {
            let mut panic_token = self.panic_token.lock().unwrap();
            if panic_token.as_deref() == Some(token) {
                panic_token.take();
                true
            } else {
                false
            }
        };
        if should_panic {
            panic!("simulated client failure");
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DispatchOutcome::Success)
    }
}
