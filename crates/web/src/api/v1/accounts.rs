use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use model::{account::Account, WithId};
use serde::Serialize;

use super::Outcome;
use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, VecResponse, METHOD_FILTER_ALL},
    store::Registration,
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(get_accounts).post(register))
        .route("/login/:uname/:pword", get(login))
        .route("/validate/:uname/:pword", get(validate))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_accounts(
    State(WebState { store, .. }): State<WebState>,
) -> Json<VecResponse<WithId<Account>>> {
    VecResponse::non_paginated(store.accounts().await).json()
}

async fn register(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { store, .. }): State<WebState>,
    Json(registration): Json<Registration>,
) -> RouteResult<Json<[Outcome; 1]>> {
    store
        .register(registration)
        .await
        .map(|_| Json([Outcome::Success]))
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn login(
    Path((uname, pword)): Path<(String, String)>,
    State(WebState { store, .. }): State<WebState>,
) -> Json<[Outcome; 1]> {
    let outcome = Outcome::from(store.login(&uname, &pword).await.is_some());
    log::debug!("login of '{uname}': {outcome:?}");
    Json([outcome])
}

#[derive(Debug, Serialize)]
struct Validation {
    result: Outcome,
}

async fn validate(
    Path((uname, pword)): Path<(String, String)>,
    State(WebState { store, .. }): State<WebState>,
) -> Json<[Validation; 1]> {
    Json([Validation {
        result: Outcome::from(store.login(&uname, &pword).await.is_some()),
    }])
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::{
        api::v1::tests::{unroutable_state as web_state, uri},
        store::tests::registration,
    };

    #[tokio::test]
    async fn register_then_login() {
        let state = web_state();

        let Json(outcome) = register(
            uri("/api/v1/accounts"),
            State(state.clone()),
            Json(registration("ada", "secret", "secret")),
        )
        .await
        .unwrap();
        assert_eq!(outcome, [Outcome::Success]);

        let Json(outcome) = login(
            Path(("ada".to_owned(), "secret".to_owned())),
            State(state.clone()),
        )
        .await;
        assert_eq!(outcome, [Outcome::Success]);

        let Json(outcome) = login(
            Path(("ada".to_owned(), "wrong".to_owned())),
            State(state.clone()),
        )
        .await;
        assert_eq!(outcome, [Outcome::Failure]);

        let Json([validation]) = validate(
            Path(("ada".to_owned(), "secret".to_owned())),
            State(state.clone()),
        )
        .await;
        assert_eq!(validation.result, Outcome::Success);
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let state = web_state();
        let error = register(
            uri("/api/v1/accounts"),
            State(state.clone()),
            Json(registration("ada", "secret", "typo")),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(error.requested_uri.as_deref(), Some("/api/v1/accounts"));

        let Json(accounts) = get_accounts(State(state)).await;
        assert!(accounts.data.is_empty());
    }

    #[tokio::test]
    async fn passwords_are_never_listed() {
        let state = web_state();
        state
            .store
            .register(registration("ada", "secret", "secret"))
            .await
            .unwrap();

        let Json(accounts) = get_accounts(State(state)).await;
        let json = serde_json::to_value(&accounts).unwrap();
        assert_eq!(json["data"][0]["uname"], "ada");
        assert_eq!(json["data"][0]["id"], 1);
        assert!(json["data"][0].get("pword").is_none());
    }
}
