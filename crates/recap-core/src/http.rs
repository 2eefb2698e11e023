use crate::ProviderError;
use std::thread;
use std::time::Duration;
use tracing::warn;
use ureq::{Agent, Error as UreqError};

const TIMEOUT_RESOLVE: Duration = Duration::from_secs(5);
const TIMEOUT_CONNECT: Duration = Duration::from_secs(5);
const TIMEOUT_SEND_REQUEST: Duration = Duration::from_secs(5);
const TIMEOUT_SEND_BODY: Duration = Duration::from_secs(15);
const TIMEOUT_RECV_RESPONSE_FLOOR: Duration = Duration::from_secs(10);

const RETRY_BASE_MS: u64 = 200;

pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: usize = 1;

/// Per-call limits for completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub call_timeout: Duration,
    pub max_retries: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

pub fn agent_for(config: &HttpConfig) -> Agent {
    // Completions stream nothing until done, so the response wait tracks the call budget.
    let recv_response = config.call_timeout.max(TIMEOUT_RECV_RESPONSE_FLOOR);
    let agent_config = Agent::config_builder()
        .timeout_global(Some(config.call_timeout + TIMEOUT_CONNECT))
        .timeout_per_call(Some(config.call_timeout))
        .timeout_resolve(Some(TIMEOUT_RESOLVE))
        .timeout_connect(Some(TIMEOUT_CONNECT))
        .timeout_send_request(Some(TIMEOUT_SEND_REQUEST))
        .timeout_send_body(Some(TIMEOUT_SEND_BODY))
        .timeout_recv_response(Some(recv_response))
        .timeout_recv_body(Some(config.call_timeout))
        .build();
    agent_config.into()
}

pub fn should_retry(err: &UreqError) -> bool {
    match err {
        UreqError::StatusCode(code) => *code == 429 || (500..=599).contains(code),
        UreqError::Timeout(_)
        | UreqError::Io(_)
        | UreqError::HostNotFound
        | UreqError::ConnectionFailed
        | UreqError::TooManyRedirects
        | UreqError::RedirectFailed => true,
        _ => false,
    }
}

pub fn retry_delay(attempt: usize) -> Duration {
    let shift = attempt.min(6) as u32;
    let delay = RETRY_BASE_MS.saturating_mul(1_u64 << shift);
    Duration::from_millis(delay)
}

/// POST a JSON body and return the response text, retrying transient failures.
pub fn post_json(
    agent: &Agent,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
    max_retries: usize,
) -> Result<String, ProviderError> {
    let mut attempt = 0;
    loop {
        let mut request = agent.post(url);
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        match request.send_json(body) {
            Ok(response) => {
                return response
                    .into_body()
                    .read_to_string()
                    .map_err(|e| ProviderError::Network(format!("{e}")));
            }
            Err(err) if should_retry(&err) && attempt < max_retries => {
                warn!(url, attempt, error = %err, "completion request failed; retrying");
                thread::sleep(retry_delay(attempt));
                attempt += 1;
            }
            Err(UreqError::StatusCode(code)) => {
                return Err(ProviderError::Failed(format!(
                    "completion endpoint returned status {code}"
                )));
            }
            Err(err) => return Err(ProviderError::Network(format!("{err}"))),
        }
    }
}
