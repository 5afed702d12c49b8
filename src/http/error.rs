use rouille::Response;

use crate::{preview::PreviewError, services::error::FetchError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unprocessable(String),
    BadGateway(String),
}

impl From<PreviewError> for ApiError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::InvalidInput(_) => ApiError::BadRequest(err.to_string()),

            PreviewError::Fetch(FetchError::NotFound { .. }) => {
                ApiError::NotFound(err.to_string())
            }

            PreviewError::Fetch(_) => ApiError::BadGateway(err.to_string()),

            PreviewError::Resolve(_) => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::BadGateway(_) => 502,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::BadGateway(msg) => msg,
        };
        Response::text(msg).with_status_code(status)
    }
}
