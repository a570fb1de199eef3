use thiserror::Error;
use warp::http::StatusCode;

pub type FoodgramResult<T> = Result<T, FoodgramError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FoodgramError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Request has no identifiable requester")]
    RequestContext,
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Image(String),
    #[error("{0}")]
    Session(String),
    #[error("{0}")]
    Storage(String),
}

impl FoodgramError {
    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FoodgramError::Validation(_) | FoodgramError::Image(_) => StatusCode::BAD_REQUEST,
            FoodgramError::NotFound(_) => StatusCode::NOT_FOUND,
            FoodgramError::RequestContext => StatusCode::UNAUTHORIZED,
            FoodgramError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            FoodgramError::Session(_) | FoodgramError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl warp::reject::Reject for FoodgramError {}

// postgres SQLSTATE codes
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for FoodgramError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => match e.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Self::Validation(format!(
                    "Duplicate entry ({})",
                    e.constraint().unwrap_or("unique")
                )),
                Some(CHECK_VIOLATION) => Self::Validation(format!(
                    "Constraint violated ({})",
                    e.constraint().unwrap_or("check")
                )),
                Some(FOREIGN_KEY_VIOLATION) => Self::NotFound(format!(
                    "Referenced object doesn't exist ({})",
                    e.constraint().unwrap_or("foreign key")
                )),
                _ => Self::Storage(format!("{e}")),
            },
            sqlx::Error::RowNotFound => Self::NotFound(String::from("RowNotFound")),
            sqlx::Error::Configuration(e) => Self::Storage(format!("{e}")),
            sqlx::Error::Io(e) => Self::Storage(format!("{e}")),
            sqlx::Error::Tls(e) => Self::Storage(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::Storage(e),
            sqlx::Error::ColumnNotFound(e) => Self::Storage(e),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Storage(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::Storage(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::Storage(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Storage(String::from("Pool closed")),
            sqlx::Error::Migrate(e) => Self::Storage(format!("{e}")),
            e => Self::Storage(format!("{e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_client_statuses() {
        assert_eq!(
            FoodgramError::validation("cooking_time cannot be zero").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FoodgramError::not_found("Ingredient doesn't exist").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FoodgramError::RequestContext.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FoodgramError::PermissionDenied(String::new()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn message_is_reported_verbatim() {
        let error = FoodgramError::validation("already following");
        assert_eq!(error.to_string(), "already following");
    }

    #[test]
    fn converts_into_a_rejection_carrying_the_error() {
        fn reject(result: FoodgramResult<()>) -> Result<(), warp::Rejection> {
            result?;
            Ok(())
        }

        let rejection = reject(Err(FoodgramError::validation("not following"))).unwrap_err();
        assert_eq!(
            rejection.find::<FoodgramError>(),
            Some(&FoodgramError::validation("not following"))
        );
    }

    #[test]
    fn session_failures_are_server_errors() {
        let error = FoodgramError::Session(String::from("Failed to sign session"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Failed to sign session");
    }

    #[test]
    fn missing_row_is_not_found() {
        let error: FoodgramError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, FoodgramError::NotFound(_)));
    }
}
