// ODBC driver - the real call-based driver behind the emulation layer.
//
// - channel: commands sent to the connection worker
// - worker: the thread that owns the `odbc-api` environment, connection and statements
//
// Every call blocks the calling thread until the worker replies. Async callers should go through
// `SharedConnection` so the executor is not stalled.

mod channel;
mod worker;

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use tracing::debug;

use self::channel::{Command, Reply, reply_channel};
use self::worker::{OpenRequest, run_odbc_worker};
use super::{OdbcConnectionHandle, OdbcDriver, OdbcStatementHandle};
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// [`OdbcDriver`] backed by the system ODBC driver manager via `odbc-api`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdbcApiDriver;

impl OdbcApiDriver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl OdbcDriver for OdbcApiDriver {
    fn open(
        &self,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn OdbcConnectionHandle>, DbMakerError> {
        let worker = OdbcWorker::spawn(OpenRequest {
            dsn: dsn.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })?;
        debug!(dsn, "odbc connection opened");
        Ok(Box::new(OdbcApiConnection {
            worker: Arc::new(worker),
        }))
    }
}

struct OdbcWorker {
    sender: Sender<Command>,
    dsn: String,
}

impl OdbcWorker {
    fn spawn(request: OpenRequest) -> Result<Self, DbMakerError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (opened_tx, opened_rx) = reply_channel();
        let dsn = request.dsn.clone();
        thread::Builder::new()
            .name(format!("odbc-worker-{dsn}"))
            .spawn(move || run_odbc_worker(&request, opened_tx, &receiver))
            .map_err(|err| {
                DbMakerError::ConnectionError(format!("failed to spawn ODBC worker thread: {err}"))
            })?;

        opened_rx.recv().map_err(|_| {
            DbMakerError::ConnectionError("ODBC worker exited before connecting".into())
        })??;

        Ok(Self { sender, dsn })
    }

    fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, DbMakerError> {
        let (tx, rx) = reply_channel();
        let command = build(tx);
        let label = command.label();
        self.sender
            .send(command)
            .map_err(|_| DbMakerError::ConnectionError("ODBC worker closed".into()))?;
        rx.recv().map_err(|_| {
            DbMakerError::ConnectionError(format!("ODBC worker dropped during {label}"))
        })?
    }

    fn notify(&self, command: Command) {
        // The worker may already be gone during teardown; nothing to report then.
        let _ = self.sender.send(command);
    }
}

impl Drop for OdbcWorker {
    fn drop(&mut self) {
        self.notify(Command::Shutdown);
    }
}

impl fmt::Debug for OdbcWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcWorker").field("dsn", &self.dsn).finish()
    }
}

#[derive(Debug)]
struct OdbcApiConnection {
    worker: Arc<OdbcWorker>,
}

impl OdbcConnectionHandle for OdbcApiConnection {
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DbMakerError> {
        self.worker.request(|respond_to| Command::SetAutocommit {
            enabled,
            respond_to,
        })
    }

    fn commit(&mut self) -> Result<(), DbMakerError> {
        self.worker
            .request(|respond_to| Command::Commit { respond_to })
    }

    fn rollback(&mut self) -> Result<(), DbMakerError> {
        self.worker
            .request(|respond_to| Command::Rollback { respond_to })
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn OdbcStatementHandle>, DbMakerError> {
        let stmt_id = self.worker.request(|respond_to| Command::Prepare {
            sql: sql.to_string(),
            respond_to,
        })?;
        Ok(Box::new(OdbcApiStatement {
            worker: Arc::clone(&self.worker),
            stmt_id,
        }))
    }
}

#[derive(Debug)]
struct OdbcApiStatement {
    worker: Arc<OdbcWorker>,
    stmt_id: u64,
}

impl OdbcStatementHandle for OdbcApiStatement {
    fn execute(&mut self, params: &[RowValues]) -> Result<(), DbMakerError> {
        let params = params.iter().map(RowValues::to_driver_param).collect();
        self.worker.request(|respond_to| Command::Execute {
            stmt_id: self.stmt_id,
            params,
            respond_to,
        })
    }

    fn fetch_row(&mut self) -> Result<Option<CustomDbRow>, DbMakerError> {
        self.worker.request(|respond_to| Command::FetchRow {
            stmt_id: self.stmt_id,
            respond_to,
        })
    }

    fn row_count(&mut self) -> Result<i64, DbMakerError> {
        self.worker.request(|respond_to| Command::RowCount {
            stmt_id: self.stmt_id,
            respond_to,
        })
    }
}

impl Drop for OdbcApiStatement {
    fn drop(&mut self) {
        self.worker.notify(Command::CloseStatement {
            stmt_id: self.stmt_id,
        });
    }
}
