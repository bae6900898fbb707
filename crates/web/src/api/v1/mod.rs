use axum::{routing::on, Router};
use serde::Serialize;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

mod accounts;
mod jogs;
mod sessions;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .nest_service("/accounts", accounts::routes(state.clone()))
        .nest_service("/jogs", jogs::routes(state.clone()))
        .nest_service("/sessions", sessions::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Plain answer of the account and upload endpoints, serialized as
/// `"success"` or `"failure"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Outcome {
    Success,
    Failure,
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}
