//! Shared handler state: the store connection and environment flags.

use crate::config::Environment;
use crate::error::{translate_service_error, ApiError};
use ensgraph_core::{FriendService, FriendServiceError, SqliteGraphRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    environment: Environment,
}

impl AppState {
    pub fn new(conn: Connection, environment: Environment) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            environment,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn exposes_error_details(&self) -> bool {
        self.environment.exposes_error_details()
    }

    /// Runs one service operation on the blocking pool.
    ///
    /// Store access is serialized through the connection mutex; a service
    /// failure is translated to its HTTP category before returning.
    pub async fn with_service<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&FriendService<SqliteGraphRepository<'c>>) -> Result<T, FriendServiceError>
            + Send
            + 'static,
    {
        let db = Arc::clone(&self.db);
        let expose_details = self.exposes_error_details();

        let outcome = tokio::task::spawn_blocking(move || {
            // SQLite rolls back an interrupted transaction, so a poisoned
            // guard still holds a consistent connection.
            let conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            let service = FriendService::new(SqliteGraphRepository::new(&conn));
            operation(&service)
        })
        .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(translate_service_error(&err, expose_details)),
            Err(join_error) => Err(ApiError::unexpected(join_error.to_string(), expose_details)),
        }
    }
}
