use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use odbc_api::parameter::{InputParameter, VarBinaryBox};
use odbc_api::{ConnectionOptions, Cursor, DataType, Environment, IntoParameter};
use tracing::trace;

use super::channel::{Command, Reply};
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::{DriverParam, RowValues};

pub(super) struct OpenRequest {
    pub(super) dsn: String,
    pub(super) username: String,
    pub(super) password: String,
}

/// Own the ODBC environment, connection and prepared statements on this thread.
///
/// `odbc-api` statements borrow their connection and cursors borrow their statement, so all of
/// them live in this stack frame; callers only ever hold statement ids.
pub(super) fn run_odbc_worker(
    request: &OpenRequest,
    opened: Reply<()>,
    receiver: &Receiver<Command>,
) {
    let env = match Environment::new() {
        Ok(env) => env,
        Err(err) => {
            let _ = opened.send(Err(DbMakerError::ConnectionError(format!(
                "failed to allocate ODBC environment: {err}"
            ))));
            return;
        }
    };
    let conn = match env.connect(
        &request.dsn,
        &request.username,
        &request.password,
        ConnectionOptions::default(),
    ) {
        Ok(conn) => conn,
        Err(err) => {
            let _ = opened.send(Err(DbMakerError::ConnectionError(format!(
                "odbc connect to `{}` failed: {err}",
                request.dsn
            ))));
            return;
        }
    };
    if opened.send(Ok(())).is_err() {
        return;
    }

    let mut statements = HashMap::new();
    let mut row_counts: HashMap<u64, i64> = HashMap::new();
    // Statement ids never leave this connection; u64 won't exhaust in practice.
    let mut next_stmt_id: u64 = 1;
    let mut pending: Option<Command> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };
        trace!(command = command.label(), "odbc worker");

        match command {
            Command::Shutdown => break,
            Command::SetAutocommit {
                enabled,
                respond_to,
            } => {
                let _ = respond_to.send(conn.set_autocommit(enabled).map_err(driver_error));
            }
            Command::Commit { respond_to } => {
                let _ = respond_to.send(conn.commit().map_err(driver_error));
            }
            Command::Rollback { respond_to } => {
                let _ = respond_to.send(conn.rollback().map_err(driver_error));
            }
            Command::Prepare { sql, respond_to } => match conn.prepare(&sql) {
                Ok(prepared) => {
                    let stmt_id = next_stmt_id;
                    next_stmt_id = next_stmt_id.saturating_add(1);
                    statements.insert(stmt_id, prepared);
                    let _ = respond_to.send(Ok(stmt_id));
                }
                Err(err) => {
                    let _ = respond_to.send(Err(driver_error(err)));
                }
            },
            Command::Execute {
                stmt_id,
                params,
                respond_to,
            } => {
                let Some(prepared) = statements.get_mut(&stmt_id) else {
                    let _ = respond_to.send(Err(unknown_statement(stmt_id)));
                    continue;
                };
                let params: Vec<Box<dyn InputParameter>> =
                    params.into_iter().map(input_parameter).collect();
                match prepared.execute(params.as_slice()) {
                    Ok(Some(mut cursor)) => {
                        let layout = match RowLayout::describe(&mut cursor) {
                            Ok(layout) => layout,
                            Err(err) => {
                                let _ = respond_to.send(Err(err));
                                continue;
                            }
                        };
                        row_counts.insert(stmt_id, -1);
                        let _ = respond_to.send(Ok(()));
                        // Hold the cursor until a command for anything else arrives.
                        pending =
                            run_cursor_loop(stmt_id, receiver, || fetch_one(&mut cursor, &layout));
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        let _ = respond_to.send(Err(driver_error(err)));
                        continue;
                    }
                }
                let count = prepared
                    .row_count()
                    .ok()
                    .flatten()
                    .and_then(|n| i64::try_from(n).ok())
                    .unwrap_or(-1);
                row_counts.insert(stmt_id, count);
                let _ = respond_to.send(Ok(()));
            }
            Command::FetchRow {
                stmt_id,
                respond_to,
            } => {
                // No cursor open for this statement (never executed, no result set, or closed by
                // a later command).
                let reply = if statements.contains_key(&stmt_id) {
                    Ok(None)
                } else {
                    Err(unknown_statement(stmt_id))
                };
                let _ = respond_to.send(reply);
            }
            Command::RowCount {
                stmt_id,
                respond_to,
            } => {
                let _ = respond_to.send(Ok(row_counts.get(&stmt_id).copied().unwrap_or(-1)));
            }
            Command::CloseStatement { stmt_id } => {
                statements.remove(&stmt_id);
                row_counts.remove(&stmt_id);
            }
        }
    }
}

fn input_parameter(param: DriverParam) -> Box<dyn InputParameter> {
    match param {
        DriverParam::Null => Box::new(None::<String>.into_parameter()),
        DriverParam::Text(text) => Box::new(Some(text).into_parameter()),
        DriverParam::Binary(bytes) => Box::new(VarBinaryBox::from_vec(bytes)),
    }
}

/// Serve fetches for one open cursor through `fetch`. Returns the first command that targets
/// anything else; the cursor is closed when this returns.
fn run_cursor_loop(
    stmt_id: u64,
    receiver: &Receiver<Command>,
    mut fetch: impl FnMut() -> Result<Option<CustomDbRow>, DbMakerError>,
) -> Option<Command> {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::FetchRow {
                stmt_id: id,
                respond_to,
            } if id == stmt_id => {
                let _ = respond_to.send(fetch());
            }
            Command::RowCount {
                stmt_id: id,
                respond_to,
            } if id == stmt_id => {
                let _ = respond_to.send(Ok(-1));
            }
            other => return Some(other),
        }
    }
    None
}

/// Column names plus which columns carry binary data, read once per cursor.
struct RowLayout {
    names: Arc<Vec<String>>,
    binary: Vec<bool>,
}

impl RowLayout {
    fn describe(cursor: &mut impl Cursor) -> Result<Self, DbMakerError> {
        let count = cursor.num_result_cols().map_err(driver_error)?;
        let count = u16::try_from(count).unwrap_or(0);
        let mut names = Vec::with_capacity(usize::from(count));
        let mut binary = Vec::with_capacity(usize::from(count));
        for col in 1..=count {
            names.push(cursor.col_name(col).map_err(driver_error)?);
            binary.push(matches!(
                cursor.col_data_type(col).map_err(driver_error)?,
                DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. }
            ));
        }
        Ok(Self {
            names: Arc::new(names),
            binary,
        })
    }
}

fn fetch_one(
    cursor: &mut impl Cursor,
    layout: &RowLayout,
) -> Result<Option<CustomDbRow>, DbMakerError> {
    let Some(mut row) = cursor.next_row().map_err(driver_error)? else {
        return Ok(None);
    };

    let mut values = Vec::with_capacity(layout.names.len());
    let mut buf = Vec::new();
    for (index, &binary) in layout.binary.iter().enumerate() {
        let col = u16::try_from(index + 1).map_err(|_| {
            DbMakerError::DriverExecutionError(format!("column index {} out of range", index + 1))
        })?;
        buf.clear();
        let present = if binary {
            row.get_binary(col, &mut buf).map_err(driver_error)?
        } else {
            row.get_text(col, &mut buf).map_err(driver_error)?
        };
        values.push(match (present, binary) {
            (false, _) => RowValues::Null,
            (true, true) => RowValues::Blob(buf.clone()),
            (true, false) => RowValues::Text(String::from_utf8_lossy(&buf).into_owned()),
        });
    }

    Ok(Some(CustomDbRow::new(Arc::clone(&layout.names), values)))
}

fn driver_error(err: odbc_api::Error) -> DbMakerError {
    DbMakerError::DriverExecutionError(err.to_string())
}

fn unknown_statement(stmt_id: u64) -> DbMakerError {
    DbMakerError::DriverExecutionError(format!("no prepared statement with id {stmt_id}"))
}
