//! Test support utilities for lvm-core
//!
//! Provides MockRunner for unit testing the lifecycle driver and alias
//! invocation without requiring a real Docker/Podman runtime.

use async_trait::async_trait;
use lvm_provider::*;
use std::sync::{Arc, Mutex};

/// Records which methods were called on the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Create { image: String, cmd: Vec<String> },
    Run { id: String, detached: bool },
    Remove { id: String },
}

/// Configurable mock container runner for testing
pub struct MockRunner {
    pub provider_type: ProviderType,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    /// Last spec handed to `create`
    pub last_spec: Arc<Mutex<Option<InvocationSpec>>>,
    /// Result for create calls
    pub create_result: Arc<Mutex<Result<ContainerId>>>,
    /// Exit code reported by run calls
    pub run_exit_code: Arc<Mutex<i64>>,
    /// Error reported alongside the exit code (if Some)
    pub run_error: Arc<Mutex<Option<ProviderError>>>,
    /// Result for remove calls
    pub remove_result: Arc<Mutex<Result<()>>>,
}

impl MockRunner {
    /// Create a new mock runner with default success results
    pub fn new() -> Self {
        Self {
            provider_type: ProviderType::Docker,
            calls: Arc::new(Mutex::new(Vec::new())),
            last_spec: Arc::new(Mutex::new(None)),
            create_result: Arc::new(Mutex::new(Ok(ContainerId::new("mock_container_id")))),
            run_exit_code: Arc::new(Mutex::new(0)),
            run_error: Arc::new(Mutex::new(None)),
            remove_result: Arc::new(Mutex::new(Ok(()))),
        }
    }

    /// Make `run` report this exit code
    pub fn with_exit_code(self, code: i64) -> Self {
        *self.run_exit_code.lock().unwrap() = code;
        self
    }

    /// Make `run` report this error alongside its exit code
    pub fn with_run_error(self, error: ProviderError) -> Self {
        *self.run_error.lock().unwrap() = Some(error);
        self
    }

    /// Make `create` fail
    pub fn with_create_error(self, error: ProviderError) -> Self {
        *self.create_result.lock().unwrap() = Err(error);
        self
    }

    /// Make `remove` fail
    pub fn with_remove_error(self, error: ProviderError) -> Self {
        *self.remove_result.lock().unwrap() = Err(error);
        self
    }

    /// Record a call
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Check if a specific call was made
    pub fn was_called(&self, call: &MockCall) -> bool {
        self.calls.lock().unwrap().contains(call)
    }

    /// Number of remove calls made
    pub fn remove_count(&self) -> usize {
        self.get_calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Remove { .. }))
            .count()
    }

    /// Spec received by the last `create` call
    pub fn last_spec(&self) -> Option<InvocationSpec> {
        self.last_spec.lock().unwrap().clone()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to clone a Result<T> from an Arc<Mutex<Result<T>>>
fn clone_result<T: Clone>(r: &Arc<Mutex<Result<T>>>) -> Result<T> {
    let guard = r.lock().unwrap();
    match &*guard {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(clone_provider_error(e)),
    }
}

/// Clone a ProviderError (thiserror types don't implement Clone)
fn clone_provider_error(e: &ProviderError) -> ProviderError {
    match e {
        ProviderError::ConnectionError(s) => ProviderError::ConnectionError(s.clone()),
        ProviderError::ContainerNotFound(s) => ProviderError::ContainerNotFound(s.clone()),
        ProviderError::ImageNotFound(s) => ProviderError::ImageNotFound(s.clone()),
        ProviderError::RuntimeError(s) => ProviderError::RuntimeError(s.clone()),
        ProviderError::ConfigError(s) => ProviderError::ConfigError(s.clone()),
        ProviderError::Docker(e) => ProviderError::RuntimeError(e.to_string()),
        ProviderError::IoError(_) => ProviderError::RuntimeError("IO error (cloned)".into()),
    }
}

#[async_trait]
impl ContainerRunner for MockRunner {
    async fn create(&self, spec: &InvocationSpec) -> Result<ContainerId> {
        self.record(MockCall::Create {
            image: spec.image.clone(),
            cmd: spec.cmd.clone(),
        });
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        clone_result(&self.create_result)
    }

    async fn run(&self, id: &ContainerId, options: &RunOptions) -> RunOutcome {
        self.record(MockCall::Run {
            id: id.0.clone(),
            detached: options.detached,
        });
        let exit_code = *self.run_exit_code.lock().unwrap();
        match self.run_error.lock().unwrap().as_ref() {
            Some(err) => RunOutcome::failed(exit_code, clone_provider_error(err)),
            None => RunOutcome::exited(exit_code),
        }
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Remove { id: id.0.clone() });
        clone_result(&self.remove_result)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider_type: self.provider_type,
            api_version: "mock".to_string(),
        }
    }
}
