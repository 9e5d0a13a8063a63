use crate::{
    driver::{Connection, ConnectionMetadata},
    error::DataAccessError,
    obs::sink::{self, MetricsEvent, TxPhase},
};
use std::sync::OnceLock;

/// Probe connection capabilities once per handler.
pub(crate) fn probe<C: Connection>(
    cell: &OnceLock<ConnectionMetadata>,
    connection: &C,
) -> ConnectionMetadata {
    *cell.get_or_init(|| {
        connection.metadata().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "metadata probe failed, assuming no transaction support");
            ConnectionMetadata::default()
        })
    })
}

pub(crate) fn begin<C: Connection>(
    connection: &C,
    metadata: ConnectionMetadata,
) -> Result<(), DataAccessError> {
    if metadata.supports_transactions {
        connection
            .set_auto_commit(false)
            .map_err(DataAccessError::transaction)?;
    }
    sink::record(MetricsEvent::Transaction {
        phase: TxPhase::Begin,
    });

    Ok(())
}

pub(crate) fn commit<C: Connection>(
    connection: &C,
    metadata: ConnectionMetadata,
) -> Result<(), DataAccessError> {
    let committed = if metadata.supports_transactions {
        connection.commit()
    } else {
        Ok(())
    };
    let restored = connection.set_auto_commit(true);
    sink::record(MetricsEvent::Transaction {
        phase: TxPhase::Commit,
    });

    committed.and(restored).map_err(DataAccessError::transaction)
}

pub(crate) fn rollback<C: Connection>(
    connection: &C,
    metadata: ConnectionMetadata,
) -> Result<(), DataAccessError> {
    let rolled_back = if metadata.supports_transactions {
        connection.rollback()
    } else {
        Ok(())
    };
    let restored = connection.set_auto_commit(true);
    sink::record(MetricsEvent::Transaction {
        phase: TxPhase::Rollback,
    });

    rolled_back.and(restored).map_err(DataAccessError::transaction)
}

/// Run `body`, wrapped in begin/commit when `metadata` is present.
///
/// On a failing body the rollback is attempted and its own failure is only
/// logged; the body's error is what the caller sees.
pub(crate) fn scoped<C, T>(
    connection: &C,
    metadata: Option<ConnectionMetadata>,
    body: impl FnOnce() -> Result<T, DataAccessError>,
) -> Result<T, DataAccessError>
where
    C: Connection,
{
    let Some(metadata) = metadata else {
        return body();
    };

    begin(connection, metadata)?;
    match body() {
        Ok(value) => {
            commit(connection, metadata)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = rollback(connection, metadata) {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
