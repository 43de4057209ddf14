//! The Executor - single entry point to the ledger.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! [`Ledger`] and converts results to outputs.

use std::sync::Arc;

use tally_core::TransactionFilter;
use tally_engine::Ledger;
use tracing::debug;

use crate::{Command, Output, Response, Result};

/// The command executor - single entry point to the ledger.
///
/// The Executor holds a shared ledger and keeps no state of its own.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use tally_executor::{Command, Executor, TransactionRequest};
///
/// let executor = Executor::open_default()?;
///
/// let output = executor.execute(Command::CreateTransaction {
///     idempotency_key: Some("k123".into()),
///     request: TransactionRequest::new("A1", "A2", 10.0),
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    ledger: Arc<Ledger>,
}

impl Executor {
    /// Create a new executor over a shared ledger.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Create an executor over a ledger with default configuration.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Arc::new(Ledger::with_defaults()?)))
    }

    /// Execute a single command.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        debug!(target: "tally::executor", command = cmd.name(), "Executing command");
        match cmd {
            Command::Ping => Ok(Output::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),

            Command::CreateTransaction {
                idempotency_key,
                request,
            } => {
                let outcome = self
                    .ledger
                    .create_transaction(idempotency_key.as_deref(), &request)?;
                Ok(Output::from(outcome))
            }

            Command::GetTransaction { id } => {
                Ok(Output::Transaction(self.ledger.get_transaction(&id)?))
            }

            Command::ListTransactions {
                from_account_id,
                cursor,
                limit,
            } => {
                let filter = match from_account_id {
                    Some(account) => TransactionFilter::from_account(account),
                    None => TransactionFilter::all(),
                };
                let page =
                    self.ledger
                        .list_transactions(&filter, cursor.as_deref(), limit.as_deref())?;
                Ok(Output::TransactionPage(page))
            }
        }
    }

    /// Execute multiple commands sequentially.
    ///
    /// Results are returned in the same order as the commands; a failure does
    /// not stop later commands.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }

    /// Execute a command and render it for the HTTP layer.
    pub fn handle(&self, cmd: Command) -> Response {
        Response::from_result(self.execute(cmd))
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }
}

impl From<Ledger> for Executor {
    fn from(ledger: Ledger) -> Self {
        Self::new(Arc::new(ledger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tally_core::TransactionRequest;

    #[test]
    fn ping_reports_version() {
        let executor = Executor::open_default().unwrap();
        match executor.execute(Command::Ping).unwrap() {
            Output::Pong { version } => assert_eq!(version, env!("CARGO_PKG_VERSION")),
            other => panic!("expected Pong, got {:?}", other),
        }
    }

    #[test]
    fn execute_many_preserves_order_and_continues_after_errors() {
        let executor = Executor::open_default().unwrap();
        let results = executor.execute_many(vec![
            Command::GetTransaction {
                id: "missing".to_string(),
            },
            Command::CreateTransaction {
                idempotency_key: None,
                request: TransactionRequest::new("A1", "A2", 1.0),
            },
            Command::Ping,
        ]);

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0], Err(Error::TransactionNotFound { .. })));
        assert!(matches!(results[1], Ok(Output::Created(_))));
        assert!(matches!(results[2], Ok(Output::Pong { .. })));
    }

    #[test]
    fn blank_account_filter_lists_everything() {
        let executor = Executor::open_default().unwrap();
        for from in ["A1", "B2"] {
            executor
                .execute(Command::CreateTransaction {
                    idempotency_key: None,
                    request: TransactionRequest::new(from, "Z", 1.0),
                })
                .unwrap();
        }

        let output = executor
            .execute(Command::ListTransactions {
                from_account_id: Some("  ".to_string()),
                cursor: None,
                limit: None,
            })
            .unwrap();
        match output {
            Output::TransactionPage(page) => assert_eq!(page.items.len(), 2),
            other => panic!("expected page, got {:?}", other),
        }
    }
}
