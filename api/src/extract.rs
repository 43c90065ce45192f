use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON body that may be left out entirely.
///
/// A request without a JSON content type yields `T::default()`. A body that is
/// sent but does not deserialize is a validation error.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(OptionalJson(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(OptionalJson(T::default())),
            Err(rejection) => Err(AppError::validation(rejection.body_text())),
        }
    }
}
