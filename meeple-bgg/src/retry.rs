//! Retry with exponential backoff for every outbound request.
//!
//! A request is attempted up to `max_attempts` times. Between attempts the
//! caller sleeps for the current delay, which starts at `initial_delay` and
//! doubles after every failed attempt. HTTP 429, HTTP 5xx and transport
//! errors share the same attempt counter and delay. Any other non-success
//! status fails immediately.
//!
//! The sleep is a plain `tokio::time::sleep`, so dropping the future (for
//! example when an enclosing `tokio::time::timeout` fires) abandons the
//! pending wait and no further attempts are made.

use tokio::time::Duration;

use crate::error::BggError;
use crate::transport::Transport;

/// Attempt budget and initial delay for [`send_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

/// Send a GET through `transport`, retrying transient failures.
///
/// Returns the response body of the first successful attempt. Fails with
/// [`BggError::RateLimited`], [`BggError::ServerError`] or the last transport
/// error once the attempt budget is spent.
pub async fn send_with_retry<T: Transport>(
    transport: &T,
    policy: &RetryPolicy,
    path: &str,
    query: &[(&str, String)],
) -> Result<String, BggError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        let reason = match transport.get(path, query).await {
            Ok(resp) if resp.is_success() => return Ok(resp.body),
            Ok(resp) if resp.is_rate_limited() => {
                if attempt >= max_attempts {
                    return Err(BggError::RateLimited { attempts: attempt });
                }
                "rate limited (HTTP 429)".to_string()
            }
            Ok(resp) if resp.is_server_error() => {
                if attempt >= max_attempts {
                    return Err(BggError::ServerError {
                        status: resp.status,
                        attempts: attempt,
                    });
                }
                format!("server error (HTTP {})", resp.status)
            }
            Ok(resp) => {
                return Err(BggError::Rejected {
                    status: resp.status,
                    message: snippet(&resp.body),
                });
            }
            Err(e) if e.is_transient() => {
                if attempt >= max_attempts {
                    return Err(e);
                }
                e.to_string()
            }
            Err(e) => return Err(e),
        };

        log::debug!(
            "GET {}: attempt {}/{} failed: {}; retrying in {}s",
            path,
            attempt,
            max_attempts,
            reason,
            delay.as_secs_f32(),
        );
        tokio::time::sleep(delay).await;
        delay *= 2;
        attempt += 1;
    }
}

/// First 200 characters of a response body, for error messages.
fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
