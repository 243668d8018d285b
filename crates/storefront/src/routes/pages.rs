//! Localized content page handlers.
//!
//! Locale resolution: explicit `?locale=` query, then the `PARAGLIDE_LOCALE`
//! cookie, then the default. A page missing in the resolved locale falls back
//! to the default locale before 404ing.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::content::{DEFAULT_LOCALE, Page, PageSection};
use crate::cookies;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for a page request.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub locale: Option<String>,
}

/// Locale selection form data.
#[derive(Debug, Deserialize)]
pub struct SetLocaleForm {
    pub locale: String,
}

/// A localized page as returned to clients.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub slug: String,
    pub locale: String,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: Option<NaiveDate>,
    pub sections: Vec<PageSection>,
}

impl From<&Page> for PageView {
    fn from(page: &Page) -> Self {
        Self {
            slug: page.slug.clone(),
            locale: page.locale.clone(),
            title: page.meta.title.clone(),
            description: page.meta.description.clone(),
            updated_at: page.meta.updated_at,
            sections: page.sections.clone(),
        }
    }
}

fn resolve_locale(query: Option<String>, jar: &CookieJar) -> String {
    query
        .or_else(|| jar.get(cookies::LOCALE).map(|c| c.value().to_owned()))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_owned())
}

/// `GET /pages/{slug}`
#[instrument(skip(state, jar))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> Result<Json<PageView>> {
    let locale = resolve_locale(query.locale, &jar);

    let page = state
        .content()
        .get_with_fallback(&locale, &slug)
        .ok_or_else(|| AppError::NotFound(format!("page not found: {slug}")))?;

    Ok(Json(PageView::from(page)))
}

/// `POST /locale`
///
/// Sets the `PARAGLIDE_LOCALE` cookie. Only locales the content store
/// actually carries are accepted.
#[instrument(skip(state, jar))]
pub async fn set_locale(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SetLocaleForm>,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    if !state.content().locales().contains(&form.locale) {
        return Err(AppError::BadRequest(format!(
            "unsupported locale: {}",
            form.locale
        )));
    }

    let jar = jar.add(cookies::locale(
        form.locale,
        state.config().cookies_secure(),
    ));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}
