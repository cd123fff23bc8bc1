//! Common test utilities - tracing setup and call recording

#![allow(dead_code)]

use std::sync::{Arc, Once};

use parking_lot::Mutex;
use protoclass::{ClassError, Hook, Instance, Value};

static TRACING: Once = Once::new();

/// Install a tracing subscriber once per test binary (honours RUST_LOG)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "protoclass=warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// One recorded invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub label: String,
    pub args: Vec<serde_json::Value>,
}

/// Records calls made through the methods and hooks it hands out
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A method value that records its label and data arguments
    pub fn method(&self, label: &str) -> Value {
        let calls = self.calls.clone();
        let label = label.to_string();
        Value::method(move |_this: &Instance, args: &[Value]| {
            calls.lock().push(Call {
                label: label.clone(),
                args: args.iter().filter_map(|a| a.as_data().cloned()).collect(),
            });
            Ok(Value::null())
        })
    }

    /// A hook that records its label
    pub fn hook(&self, label: &str) -> Hook {
        let calls = self.calls.clone();
        let label = label.to_string();
        Hook::direct(move |_this: &Instance| -> Result<(), ClassError> {
            calls.lock().push(Call {
                label: label.clone(),
                args: Vec::new(),
            });
            Ok(())
        })
    }

    pub fn called(&self, label: &str) -> bool {
        self.count(label) > 0
    }

    pub fn count(&self, label: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.label == label).count()
    }

    /// Labels in call order
    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.label.clone()).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}
