//! Session database errors.

use derive_more::{Display, Error};

/// Which part of the session database failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// Bad repository settings, such as an empty path.
    #[display("configuration")]
    Config,
    /// Opening the SQLite file.
    #[display("connection")]
    Connection,
    /// Applying embedded schema migrations.
    #[display("migration")]
    Migration,
    /// A statement against `game_sessions`.
    #[display("query")]
    Query,
    /// Encoding or decoding the JSON move log.
    #[display("move log")]
    MoveLog,
    /// The blocking task running a repository call.
    #[display("background task")]
    Task,
}

/// Session database error, tagged with its kind and the line that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Session store {} error: {} ({}:{})", kind, message, file, line)]
pub struct DbError {
    kind: DbErrorKind,
    message: String,
    line: u32,
    file: &'static str,
}

impl DbError {
    /// Creates an error at the caller's location.
    #[track_caller]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// What failed.
    pub fn kind(&self) -> DbErrorKind {
        self.kind
    }

    /// Human-readable detail.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        let message = match &err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                format!("session id already exists: {}", err)
            }
            Error::NotFound => "session row vanished mid-operation".to_string(),
            _ => err.to_string(),
        };
        Self::new(DbErrorKind::Query, message)
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(DbErrorKind::MoveLog, err.to_string())
    }
}

impl From<tokio::task::JoinError> for DbError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(DbErrorKind::Task, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_kind_and_location() {
        let err = DbError::new(DbErrorKind::Config, "empty path");
        let text = err.to_string();
        assert!(text.starts_with("Session store configuration error: empty path ("));
        assert!(text.contains("error.rs:"));
        assert_eq!(err.kind(), DbErrorKind::Config);
    }

    #[test]
    fn test_move_log_errors_are_tagged() {
        let json = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err = DbError::from(json);
        assert_eq!(err.kind(), DbErrorKind::MoveLog);
    }
}
