//! Custom Axum extractors
//!
//! Both reject with `ApiError::Input`, so bad client input is answered
//! before any handler (and any session) runs.

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;

use super::error::ApiError;
use crate::models::product::parse_product_id;
use crate::models::{ClientInputError, NewProduct, ProductId};

/// Extract and parse a product id from path
pub struct ProductIdPath(pub ProductId);

impl<S> FromRequestParts<S> for ProductIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ClientInputError::MalformedPath {
                reason: rejection.body_text(),
            })?;

        Ok(Self(parse_product_id(&raw)?))
    }
}

/// Decode a JSON body into a transient product
pub struct ProductBody(pub NewProduct);

impl<S> FromRequest<S> for ProductBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(product) = Json::<NewProduct>::from_request(req, state)
            .await
            .map_err(|rejection| ClientInputError::MalformedBody {
                reason: rejection.body_text(),
            })?;

        Ok(Self(product))
    }
}
