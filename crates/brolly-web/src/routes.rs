//! Page handlers.

use actix_web::http::header::{self, ContentType};
use actix_web::{get, post, web, HttpResponse};
use brolly_auth::OAuth2Provider;
use brolly_core::{AppError, AuthError};
use brolly_weather::{upcoming_hour_labels, Coordinates, HourlyForecast};
use chrono::Local;
use serde::Deserialize;

use crate::error::{PageError, PageResult};
use crate::session::UserSession;
use crate::state::AppState;
use crate::templates;

const CLOCK_JS: &str = include_str!("../static/scripts/clock.js");

/// Register every page on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(postcode_entry)
        .service(postcode_submit)
        .service(forecast)
        .service(login)
        .service(authorize)
        .service(logout)
        .service(user_page)
        .service(user_action)
        .service(clock_script);
}

/// Fallback for unknown routes.
pub async fn not_found() -> PageResult<HttpResponse> {
    Err(PageError::NotFound)
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

fn found(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn forecast_path(longitude: f64, latitude: f64) -> String {
    format!("/app/{longitude}/{latitude}")
}

fn parse_coordinates(lon: &str, lat: &str) -> Option<Coordinates> {
    let longitude: f64 = lon.parse().ok()?;
    let latitude: f64 = lat.parse().ok()?;

    let in_range = (-180.0..=180.0).contains(&longitude) && (-90.0..=90.0).contains(&latitude);
    in_range.then_some(Coordinates {
        longitude,
        latitude,
    })
}

fn oauth_failed(err: anyhow::Error) -> PageError {
    AppError::Auth(AuthError::OAuthFailed(format!("{err:#}"))).into()
}

fn profile_failed(err: anyhow::Error) -> PageError {
    AppError::Auth(AuthError::ProfileFailed(format!("{err:#}"))).into()
}

/// Resolve a postcode and send the browser to its forecast.
async fn redirect_to_forecast(state: &AppState, postcode: &str) -> PageResult<HttpResponse> {
    match state.lookup.resolve(postcode).await? {
        Some(c) => Ok(see_other(&forecast_path(c.longitude, c.latitude))),
        None => Err(PageError::InvalidPostcode(postcode.to_string())),
    }
}

#[get("/")]
async fn postcode_entry() -> HttpResponse {
    html(templates::postcode_entry())
}

#[derive(Debug, Deserialize)]
struct PostcodeForm {
    postcode: String,
}

#[post("/")]
async fn postcode_submit(
    state: web::Data<AppState>,
    form: web::Form<PostcodeForm>,
) -> PageResult<HttpResponse> {
    redirect_to_forecast(&state, form.postcode.trim()).await
}

#[get("/app/{lon}/{lat}")]
async fn forecast(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> PageResult<HttpResponse> {
    let (lon, lat) = path.into_inner();
    let coordinates = parse_coordinates(&lon, &lat).ok_or(PageError::NotFound)?;

    let (hourly, address) = tokio::join!(
        state.weather.hourly_forecast(coordinates),
        state.geocoder.reverse(coordinates)
    );
    let hourly = hourly?;
    let address = address?;

    let rows: Vec<(String, HourlyForecast)> = upcoming_hour_labels(&Local::now())
        .into_iter()
        .zip(hourly)
        .collect();

    Ok(html(templates::forecast(&address, &rows, state.weather.unit())))
}

#[get("/login")]
async fn login(state: web::Data<AppState>, session: UserSession) -> PageResult<HttpResponse> {
    let request = state.google.authorization_request().map_err(oauth_failed)?;
    session.begin_login(&request)?;

    tracing::debug!("Redirecting to identity provider");
    Ok(found(&request.url))
}

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[get("/authorize")]
async fn authorize(
    state: web::Data<AppState>,
    session: UserSession,
    query: web::Query<AuthorizeQuery>,
) -> PageResult<HttpResponse> {
    let query = query.into_inner();
    let pending = session.take_pending_login()?;

    if let Some(error) = query.error {
        return Err(PageError::SignInFailed(format!("provider returned {error}")));
    }

    let pending =
        pending.ok_or_else(|| PageError::SignInFailed("no sign-in in progress".to_string()))?;
    if query.state.as_deref() != Some(pending.csrf_state.as_str()) {
        tracing::warn!("OAuth state mismatch on callback");
        return Err(PageError::SignInFailed(AuthError::StateMismatch.to_string()));
    }
    let code = query
        .code
        .ok_or_else(|| PageError::SignInFailed("callback without a code".to_string()))?;

    let tokens = state
        .google
        .exchange_code(code, pending.pkce_verifier)
        .await
        .map_err(oauth_failed)?;

    let profile = state
        .google
        .user_info(&tokens.access_token)
        .await
        .map_err(profile_failed)?;

    session.persist_profile(&profile)?;
    tracing::info!("Signed in {}", profile.email);
    Ok(found("/user"))
}

#[get("/logout")]
async fn logout(session: UserSession) -> HttpResponse {
    session.clear();
    found("/")
}

#[get("/user")]
async fn user_page(state: web::Data<AppState>, session: UserSession) -> PageResult<HttpResponse> {
    let Some(profile) = session.profile()? else {
        return Ok(found("/login"));
    };

    let postcodes = state.store.get_postcodes(&profile.email).await?;
    Ok(html(templates::user_page(
        &profile.email,
        profile.display_name(),
        &postcodes,
    )))
}

#[derive(Debug, Deserialize)]
struct UserForm {
    button: String,
    #[serde(default, rename = "entered-postcode")]
    entered_postcode: String,
}

#[post("/user")]
async fn user_action(
    state: web::Data<AppState>,
    session: UserSession,
    form: web::Form<UserForm>,
) -> PageResult<HttpResponse> {
    let form = form.into_inner();

    match form.button.as_str() {
        "logout" => Ok(see_other("/logout")),
        "addpostcode" => {
            let Some(profile) = session.profile()? else {
                return Ok(see_other("/login"));
            };
            let postcode = form.entered_postcode.trim().to_uppercase();
            state.store.add_postcode(&profile.email, &postcode).await?;
            Ok(see_other("/user"))
        }
        // Any other value is one of the saved postcodes
        selected => redirect_to_forecast(&state, selected).await,
    }
}

#[get("/static/scripts/clock.js")]
async fn clock_script() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(CLOCK_JS)
}
