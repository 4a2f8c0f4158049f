//! Session helpers so handlers never touch raw session keys.
//!
//! The session lives in an encrypted cookie. It holds the signed-in user's
//! profile and, between `/login` and `/authorize`, the pending OAuth state.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use brolly_auth::{AuthorizationRequest, UserProfile};
use futures_util::future::LocalBoxFuture;

use crate::error::PageResult;

pub(crate) const PROFILE_KEY: &str = "profile";
const OAUTH_STATE_KEY: &str = "oauth_state";
const PKCE_VERIFIER_KEY: &str = "pkce_verifier";

/// State saved when the browser is sent to the consent screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Per-request handle on the visitor's session.
#[derive(Clone)]
pub struct UserSession(Session);

impl UserSession {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Profile of the signed-in user, if any.
    ///
    /// A profile that no longer deserializes is treated as signed out.
    pub fn profile(&self) -> PageResult<Option<UserProfile>> {
        match self.0.get::<UserProfile>(PROFILE_KEY) {
            Ok(profile) => Ok(profile),
            Err(error) => {
                tracing::warn!("Discarding unreadable profile in session: {error}");
                self.0.remove(PROFILE_KEY);
                Ok(None)
            }
        }
    }

    /// Store the profile and issue a fresh session cookie.
    pub fn persist_profile(&self, profile: &UserProfile) -> PageResult<()> {
        self.0.insert(PROFILE_KEY, profile)?;
        self.0.renew();
        Ok(())
    }

    /// Remember the CSRF state and PKCE verifier for the callback.
    pub fn begin_login(&self, request: &AuthorizationRequest) -> PageResult<()> {
        self.0.insert(OAUTH_STATE_KEY, &request.csrf_state)?;
        self.0.insert(PKCE_VERIFIER_KEY, &request.pkce_verifier)?;
        Ok(())
    }

    /// Take the pending login out of the session; it can be used once.
    pub fn take_pending_login(&self) -> PageResult<Option<PendingLogin>> {
        let csrf_state = self.0.remove_as::<String>(OAUTH_STATE_KEY);
        let pkce_verifier = self.0.remove_as::<String>(PKCE_VERIFIER_KEY);

        Ok(match (csrf_state, pkce_verifier) {
            (Some(Ok(csrf_state)), Some(Ok(pkce_verifier))) => Some(PendingLogin {
                csrf_state,
                pkce_verifier,
            }),
            _ => None,
        })
    }

    /// Drop every key and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for UserSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(UserSession::new) })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::error::PageError;
    use actix_session::storage::CookieSessionStore;
    use actix_session::SessionMiddleware;
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build()
    }

    fn profile() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "name": "Ada Lovelace"
        }))
        .unwrap()
    }

    #[actix_web::test]
    async fn round_trips_profile() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: UserSession| async move {
                        session.persist_profile(&profile())?;
                        Ok::<_, PageError>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: UserSession| async move {
                        let email = session.profile()?.map(|p| p.email).unwrap_or_default();
                        Ok::<_, PageError>(HttpResponse::Ok().body(email))
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        let body = test::read_body(get_res).await;
        assert_eq!(body, "ada@example.com");
    }

    #[actix_web::test]
    async fn pending_login_is_single_use() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/begin",
                    web::get().to(|session: UserSession| async move {
                        session.begin_login(&AuthorizationRequest {
                            url: "https://example.com".into(),
                            csrf_state: "state-1".into(),
                            pkce_verifier: "verifier-1".into(),
                        })?;
                        Ok::<_, PageError>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/take",
                    web::get().to(|session: UserSession| async move {
                        let first = session.take_pending_login()?;
                        let second = session.take_pending_login()?;
                        assert!(second.is_none());
                        let state = first.map(|p| p.csrf_state).unwrap_or_default();
                        Ok::<_, PageError>(HttpResponse::Ok().body(state))
                    }),
                ),
        )
        .await;

        let begin =
            test::call_service(&app, test::TestRequest::get().uri("/begin").to_request()).await;
        let cookie = begin
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let take = test::call_service(
            &app,
            test::TestRequest::get().uri("/take").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(take).await, "state-1");
    }

    #[actix_web::test]
    async fn fresh_session_has_no_profile() {
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/get",
            web::get().to(|session: UserSession| async move {
                let signed_in = session.profile()?.is_some();
                Ok::<_, PageError>(HttpResponse::Ok().body(signed_in.to_string()))
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/get").to_request()).await;
        assert_eq!(test::read_body(res).await, "false");
    }
}
