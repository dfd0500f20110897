//! Success envelopes shared by every module.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{data: ...}` for reads.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{ok: true, id?}` for mutations.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true, id: None }
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id.into()),
        }
    }
}

impl IntoResponse for Ack {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
