use guarantor_intake::error::AppError;
use guarantor_intake::intake::{
    GatewayError, IntakeGateway, SubmissionPayload, SubmissionReply, SubmissionResponse,
    ZipDirectory, ZipLookupResponse,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared state behind the sandbox endpoint. The submission log is append-only,
/// so a panic mid-push cannot leave it inconsistent and poisoning is ignored.
#[derive(Clone, Default)]
pub(crate) struct SandboxState {
    pub(crate) directory: Arc<ZipDirectory>,
    pub(crate) submissions: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl SandboxState {
    pub(crate) fn new(directory: ZipDirectory) -> Self {
        Self {
            directory: Arc::new(directory),
            submissions: Arc::default(),
        }
    }

    pub(crate) fn record(&self, payload: SubmissionPayload) -> usize {
        let mut guard = self
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.push(payload);
        guard.len()
    }
}

/// Gateway that never leaves the process: lookups hit a directory, submissions are kept.
#[derive(Clone, Default)]
pub(crate) struct InMemoryGateway {
    state: SandboxState,
}

impl InMemoryGateway {
    pub(crate) fn new(directory: ZipDirectory) -> Self {
        Self {
            state: SandboxState::new(directory),
        }
    }

    pub(crate) fn submissions(&self) -> Vec<SubmissionPayload> {
        self.state
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IntakeGateway for InMemoryGateway {
    async fn lookup_zip(&self, zip: &str) -> Result<ZipLookupResponse, GatewayError> {
        Ok(self.state.directory.response_for(zip))
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReply, GatewayError> {
        let received = self.state.record(payload.clone());
        Ok(SubmissionReply {
            status: 200,
            body: Some(SubmissionResponse {
                success: true,
                message: Some(format!("Received submission #{received}")),
            }),
        })
    }
}

pub(crate) fn load_directory(path: Option<&Path>) -> Result<ZipDirectory, AppError> {
    match path {
        Some(path) => Ok(ZipDirectory::from_path(path)?),
        None => Ok(ZipDirectory::sample()),
    }
}

/// Read a saved form: a JSON object keyed by `guarantors[i][field]` names.
pub(crate) fn read_form_fields(path: &Path) -> Result<Vec<(String, String)>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let object: Map<String, Value> = serde_json::from_str(&raw)?;
    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
