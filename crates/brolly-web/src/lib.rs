//! HTTP front end: postcode forecasts and saved postcodes behind Google sign-in.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;

pub use error::{PageError, PageResult};
pub use middleware::RequestLog;
pub use session::UserSession;
pub use state::AppState;

use actix_session::{
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
    SessionMiddleware,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use brolly_core::ServerConfig;

/// Session cookie settings
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub ttl_days: u32,
}

impl SessionSettings {
    /// Derive the cookie key from the configured secret.
    ///
    /// An empty secret gets a random key, so sessions end on restart.
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        let key = if server.session_secret.is_empty() {
            tracing::warn!("No session secret configured, using a random key");
            Key::generate()
        } else {
            Key::try_from(server.session_secret.as_bytes())
                .context("Session secret must be at least 64 bytes")?
        };

        Ok(Self {
            key,
            cookie_name: server.cookie_name.clone(),
            cookie_secure: server.cookie_secure,
            ttl_days: server.session_ttl_days,
        })
    }

    fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(self.cookie_name.clone())
            .cookie_path("/".into())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .cookie_content_security(CookieContentSecurity::Private)
            .session_lifecycle(PersistentSession::default().session_ttl(
                actix_web::cookie::time::Duration::days(i64::from(self.ttl_days)),
            ))
            .build()
    }
}

/// Assemble the application with its session and logging middleware.
pub fn build_app(
    state: web::Data<AppState>,
    session: SessionSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(session.middleware())
        .wrap(RequestLog)
        .configure(routes::configure)
        .default_service(web::to(routes::not_found))
}

/// Bind the HTTP server on `host:port`.
///
/// The returned [`Server`] must be awaited to serve requests.
pub fn create_server(
    state: AppState,
    session: SessionSettings,
    host: &str,
    port: u16,
) -> Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || build_app(state.clone(), session.clone()))
        .bind((host, port))
        .with_context(|| format!("Failed to bind {host}:{port}"))?
        .run();

    tracing::info!("Listening on http://{}:{}", host, port);
    Ok(server)
}
