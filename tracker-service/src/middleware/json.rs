//! `axum::Json` with the extractor failure folded into the error
//! envelope. A malformed or ill-typed body otherwise surfaces as
//! axum's plain-text rejection instead of the JSON shape every other
//! failure uses.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use service_core::error::AppError;

pub struct Json<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => {
                let detail = anyhow::anyhow!(rejection.body_text());
                Err(match rejection {
                    // Well-formed JSON that fails to deserialize, an
                    // unknown enum string included.
                    JsonRejection::JsonDataError(_) => AppError::Unprocessable(detail),
                    _ => AppError::BadRequest(detail),
                })
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
