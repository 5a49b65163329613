use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use perch_api::{Api, JsonParser};
use perch_common::observability::{LogConfig, LogFormat};
use perch_config::ClientConfig;
use perch_http::{BoundRequest, RawResponse, Transport, TransportError};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "perch-tests",
            emit_stderr: true,
            format: if std::env::var("PERCH_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
            ..LogConfig::default()
        };

        perch_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Replays canned outcomes and records every request it was asked to send.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<BoundRequest>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<BoundRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Value of query parameter `key` on the `n`th request.
    pub fn query_param(&self, n: usize, key: &str) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        requests[n]
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &BoundRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
    }
}

pub fn ok(body: &str) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::new(200, body))
}

pub fn status(code: u16, body: &str) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::new(code, body))
}

pub fn net_err() -> Result<RawResponse, TransportError> {
    Err(TransportError::Network("connection reset by peer".into()))
}

pub fn api_with(config: ClientConfig, transport: Arc<ScriptedTransport>) -> Api {
    init_test_tracing();
    Api::with_parts(config, transport, JsonParser)
}
