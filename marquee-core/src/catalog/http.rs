//! Production [`CatalogClient`] over HTTPS with a cookie-backed session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::prelude::{Keyword, MediaKind, MediaListItem, MediaRef, Page};
use parking_lot::Mutex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::wire::{
    DiscoverParams, PageParams, RecommendationParams, SearchParams,
    WireErrorBody, WireKeyword, WirePage, WireTitle, join_ids,
};
use super::{CatalogClient, DiscoverQuery, SessionCookie};
use crate::error::{CatalogError, CatalogResult};

const NO_QUERY: &[(&str, &str)] = &[];

/// Connection settings for [`HttpCatalogClient`].
#[derive(Debug, Clone)]
pub struct HttpCatalogSettings {
    pub base_url: Url,
    /// Endpoint answering 200 for a live session and 401/403 otherwise.
    pub session_check_path: String,
    pub session_cookie_name: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl HttpCatalogSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            session_check_path: "account/session".to_string(),
            session_cookie_name: "session".to_string(),
            request_timeout: Duration::from_secs(15),
            user_agent: concat!("marquee/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

#[derive(Debug)]
pub struct HttpCatalogClient {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    settings: HttpCatalogSettings,
    /// Expiry observed in `Set-Cookie` headers, keyed by cookie name. The jar
    /// itself only exposes name/value pairs.
    expiries: Mutex<HashMap<String, Option<DateTime<Utc>>>>,
}

impl HttpCatalogClient {
    pub fn new(settings: HttpCatalogSettings) -> CatalogResult<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| CatalogError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            jar,
            base_url: normalize_base(&settings.base_url),
            settings,
            expiries: Mutex::new(HashMap::new()),
        })
    }

    /// Seed the jar with a cookie obtained elsewhere (for example from the
    /// sign-in flow or a credential store). Accepts `Set-Cookie` syntax.
    pub fn restore_cookie(&self, set_cookie: &str) {
        self.jar.add_cookie_str(set_cookie, &self.base_url);
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| {
                CatalogError::Transport(format!("invalid endpoint {path}: {err}"))
            })
    }

    fn remember_expiries(&self, response: &reqwest::Response) {
        let mut expiries = self.expiries.lock();
        for cookie in response.cookies() {
            let expires_at = cookie
                .max_age()
                .map(|age| SystemTime::now() + age)
                .or_else(|| cookie.expires())
                .map(DateTime::<Utc>::from);
            expiries.insert(cookie.name().to_string(), expires_at);
        }
    }

    async fn send<Q>(
        &self,
        method: Method,
        path: &str,
        query: &Q,
    ) -> CatalogResult<reqwest::Response>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "catalog request");
        let response = self.http.request(method, url).query(query).send().await?;
        self.remember_expiries(&response);
        Ok(response)
    }

    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> CatalogResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, path, query).await?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice::<T>(&body).map_err(CatalogError::from);
        }

        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: reqwest::Response) -> CatalogError {
    let status = response.status();
    let message = response
        .json::<WireErrorBody>()
        .await
        .ok()
        .and_then(|body| body.status_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    warn!(status = status.as_u16(), %message, "catalog request failed");
    CatalogError::from_status(status.as_u16(), message)
}

fn normalize_base(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn cookie_names(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('=').map(|(name, _)| name.trim()))
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    fn session_cookie(&self, name: &str) -> Option<SessionCookie> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        if !cookie_names(header).any(|candidate| candidate == name) {
            return None;
        }
        let expires_at = self.expiries.lock().get(name).copied().flatten();
        Some(SessionCookie {
            name: name.to_string(),
            expires_at,
        })
    }

    async fn is_authenticated(&self) -> CatalogResult<bool> {
        let response = self
            .send(Method::GET, &self.settings.session_check_path, NO_QUERY)
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        let params = SearchParams {
            query,
            page: page.max(1),
            include_adult: false,
        };
        let wire: WirePage<WireTitle> =
            self.get_json("search/multi", &params).await?;
        Ok(wire.into_page(MediaKind::Movie))
    }

    async fn discover(
        &self,
        query: &DiscoverQuery,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        let params = DiscoverParams {
            sort_by: "popularity.desc",
            include_adult: false,
            page: page.max(1),
            with_watch_providers: join_ids(&query.provider_ids, "|"),
            with_genres: join_ids(&query.genre_ids, ","),
            with_keywords: join_ids(&query.keyword_ids, "|"),
        };
        let path = format!("discover/{}", query.media_kind.as_str());
        let wire: WirePage<WireTitle> = self.get_json(&path, &params).await?;
        Ok(wire.into_page(query.media_kind))
    }

    async fn keyword_search(&self, query: &str) -> CatalogResult<Vec<Keyword>> {
        let params = SearchParams {
            query,
            page: 1,
            include_adult: false,
        };
        let wire: WirePage<WireKeyword> =
            self.get_json("search/keyword", &params).await?;
        Ok(wire.results.into_iter().map(Keyword::from).collect())
    }

    async fn recommendations(
        &self,
        seed: MediaRef,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        let params = RecommendationParams {
            media_type: kind.as_str(),
            page: page.max(1),
        };
        let path = format!("{}/{}/recommendations", seed.kind.as_str(), seed.id);
        let wire: WirePage<WireTitle> = self.get_json(&path, &params).await?;
        Ok(wire.into_page(kind))
    }

    async fn trending(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        let params = PageParams { page: page.max(1) };
        let path = format!("trending/{}/week", kind.as_str());
        let wire: WirePage<WireTitle> = self.get_json(&path, &params).await?;
        Ok(wire.into_page(kind))
    }

    async fn end_session(&self) -> CatalogResult<()> {
        let response = self
            .send(
                Method::DELETE,
                &self.settings.session_check_path,
                NO_QUERY,
            )
            .await?;
        let status = response.status();
        // An already dead session is fine to end.
        if !status.is_success()
            && status != StatusCode::UNAUTHORIZED
            && status != StatusCode::FORBIDDEN
        {
            return Err(error_from_response(response).await);
        }

        let name = &self.settings.session_cookie_name;
        self.restore_cookie(&format!("{name}=; Max-Age=0"));
        self.expiries.lock().remove(name);
        Ok(())
    }
}
