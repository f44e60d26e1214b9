use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} {1} not found")]
    NotFound(&'static str, Uuid),
    #[error("Database error: {0}")]
    Persistence(#[from] diesel::result::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl CrmError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CrmError::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CrmError::Validation(_) => StatusCode::BAD_REQUEST,
            CrmError::NotFound(_, _) => StatusCode::NOT_FOUND,
            CrmError::Persistence(_) | CrmError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CrmError> for (StatusCode, String) {
    fn from(err: CrmError) -> Self {
        (err.status_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = CrmError::validation("company_name is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "company_name is required");
    }

    #[test]
    fn not_found_maps_to_404() {
        let id = Uuid::new_v4();
        let err = CrmError::NotFound("company", id);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn diesel_not_found_is_persistence_until_mapped() {
        let err: CrmError = diesel::result::Error::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
