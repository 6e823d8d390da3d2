//! HTTP catalog client for The Movie Database.
//!
//! Feature-gated: the coordination core never needs a network catalog, but
//! a real deployment points the session facade at this implementation.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;

use super::{Catalog, CatalogError, CatalogResult};
use crate::model::{Card, CardDetail};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Client for the TMDB paged listing and detail endpoints.
#[derive(Clone)]
pub struct TmdbCatalog {
    client: Client,
    base_url: Arc<str>,
    bearer_token: Arc<str>,
}

impl TmdbCatalog {
    /// Build a client against the public TMDB API.
    pub fn new(bearer_token: impl Into<String>) -> CatalogResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, bearer_token)
    }

    /// Build a client against a custom base URL (proxies, test servers).
    pub fn with_base_url(
        base_url: &str,
        bearer_token: impl Into<String>,
    ) -> CatalogResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| transport("building http client", source))?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            bearer_token: Arc::from(bearer_token.into()),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        client: Client,
        url: String,
        token: Arc<str>,
    ) -> CatalogResult<T> {
        let response = client
            .get(&url)
            .bearer_auth(token.as_ref())
            .send()
            .await
            .map_err(|source| transport("sending catalog request", source))?
            .error_for_status()
            .map_err(|source| transport("catalog responded with an error status", source))?;
        response
            .json()
            .await
            .map_err(|source| transport("decoding catalog response", source))
    }
}

fn transport(
    message: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> CatalogError {
    CatalogError::Transport {
        message: message.to_string(),
        source: Box::new(source),
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    results: Vec<ListedMovie>,
}

#[derive(Debug, Deserialize)]
struct ListedMovie {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

impl From<ListedMovie> for Card {
    fn from(movie: ListedMovie) -> Self {
        Card {
            id: movie.id.to_string(),
            title: movie.title,
            summary: movie.overview,
            primary_image_path: movie.poster_path.unwrap_or_default(),
            secondary_image_path: movie.backdrop_path.unwrap_or_default(),
            score: movie.vote_average,
            date: movie.release_date,
            genre_ids: movie.genre_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    genres: Vec<DetailGenre>,
}

#[derive(Debug, Deserialize)]
struct DetailGenre {
    id: i64,
    name: String,
}

impl From<DetailResponse> for CardDetail {
    fn from(detail: DetailResponse) -> Self {
        CardDetail {
            card: Card {
                id: detail.id.to_string(),
                title: detail.title,
                summary: detail.overview,
                primary_image_path: detail.poster_path.unwrap_or_default(),
                secondary_image_path: detail.backdrop_path.unwrap_or_default(),
                score: detail.vote_average,
                date: detail.release_date,
                genre_ids: detail.genres.iter().map(|genre| genre.id).collect(),
            },
            genre_names: detail.genres.into_iter().map(|genre| genre.name).collect(),
        }
    }
}

impl Catalog for TmdbCatalog {
    fn fetch_page(&self, page: u32, locale: &str) -> BoxFuture<'static, CatalogResult<Vec<Card>>> {
        let url = format!(
            "{}/movie/popular?language={locale}&page={page}",
            self.base_url
        );
        let client = self.client.clone();
        let token = self.bearer_token.clone();
        async move {
            let listing: ListingResponse = Self::get_json(client, url, token).await?;
            Ok(listing.results.into_iter().map(Card::from).collect())
        }
        .boxed()
    }

    fn fetch_detail(
        &self,
        card_id: &str,
        locale: &str,
    ) -> BoxFuture<'static, CatalogResult<CardDetail>> {
        let url = format!("{}/movie/{card_id}?language={locale}", self.base_url);
        let client = self.client.clone();
        let token = self.bearer_token.clone();
        async move {
            let detail: DetailResponse = Self::get_json(client, url, token).await?;
            Ok(detail.into())
        }
        .boxed()
    }
}
