use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::DriverParam;

pub(super) type Reply<T> = SyncSender<Result<T, DbMakerError>>;

/// One-slot reply channel. The worker's send never blocks, and the caller's `recv` is a plain
/// thread block, so it is usable from inside an async runtime as well.
pub(super) fn reply_channel<T>() -> (Reply<T>, Receiver<Result<T, DbMakerError>>) {
    mpsc::sync_channel(1)
}

pub(super) enum Command {
    SetAutocommit {
        enabled: bool,
        respond_to: Reply<()>,
    },
    Commit {
        respond_to: Reply<()>,
    },
    Rollback {
        respond_to: Reply<()>,
    },
    Prepare {
        sql: String,
        respond_to: Reply<u64>,
    },
    Execute {
        stmt_id: u64,
        params: Vec<DriverParam>,
        respond_to: Reply<()>,
    },
    FetchRow {
        stmt_id: u64,
        respond_to: Reply<Option<CustomDbRow>>,
    },
    RowCount {
        stmt_id: u64,
        respond_to: Reply<i64>,
    },
    CloseStatement {
        stmt_id: u64,
    },
    Shutdown,
}

impl Command {
    pub(super) fn label(&self) -> &'static str {
        match self {
            Command::SetAutocommit { .. } => "set_autocommit",
            Command::Commit { .. } => "commit",
            Command::Rollback { .. } => "rollback",
            Command::Prepare { .. } => "prepare",
            Command::Execute { .. } => "execute",
            Command::FetchRow { .. } => "fetch_row",
            Command::RowCount { .. } => "row_count",
            Command::CloseStatement { .. } => "close_statement",
            Command::Shutdown => "shutdown",
        }
    }
}
