//! Wire-level rendering of command results.
//!
//! The HTTP layer itself lives outside this crate. [`Response`] is what it
//! needs to write a reply: a status code, an optional `Location`, and body
//! bytes. Both a first create and its replay render as `202 Accepted` with the
//! same `Location` and body.

use serde::Serialize;
use tracing::warn;

use crate::{Error, Output, Result};

/// Status for a successful create or replay
pub const STATUS_ACCEPTED: u16 = 202;
/// Status for successful reads
pub const STATUS_OK: u16 = 200;

/// A rendered reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// `Location` header, set for creates
    pub location: Option<String>,
    /// JSON body
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Response {
    /// Render a command result
    pub fn from_result(result: Result<Output>) -> Self {
        match result {
            Ok(output) => Self::from_output(output),
            Err(err) => Self::from_error(&err),
        }
    }

    /// Render a successful output
    pub fn from_output(output: Output) -> Self {
        match output {
            Output::Created(result) | Output::Replayed(result) => Response {
                status: STATUS_ACCEPTED,
                location: Some(result.location),
                body: result.body,
            },
            Output::Pong { version } => {
                Self::json(STATUS_OK, &serde_json::json!({ "version": version }))
            }
            Output::Transaction(txn) => Self::json(STATUS_OK, &txn),
            Output::TransactionPage(page) => Self::json(STATUS_OK, &page),
        }
    }

    /// Render an error as `{"error": "..."}`
    pub fn from_error(err: &Error) -> Self {
        let message = err.to_string();
        Self::json(err.status_code(), &ErrorBody { error: &message })
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Response {
                status,
                location: None,
                body,
            },
            Err(e) => {
                warn!(target: "tally::executor", error = %e, "Failed to encode response body");
                Response {
                    status: 500,
                    location: None,
                    body: br#"{"error":"internal error"}"#.to_vec(),
                }
            }
        }
    }
}
