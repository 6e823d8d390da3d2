//! Movie catalog collaborator.
//!
//! The core treats the catalog as opaque: no assumption about a page's
//! stability across time, only that concurrent fetchers of the same page
//! receive the same ordered list within a few seconds. `ScriptedCatalog`
//! backs tests and the demo driver; an HTTP client for the real catalog
//! lives behind the `tmdb-catalog` feature.

#[cfg(feature = "tmdb-catalog")]
pub mod tmdb;

use std::collections::BTreeMap;
use std::error::Error;

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::model::{Card, CardDetail};

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error raised by catalog implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested page does not exist in this catalog.
    #[error("catalog page {page} out of range")]
    PageOutOfRange {
        /// Requested page number.
        page: u32,
    },
    /// The requested card is unknown to this catalog.
    #[error("card `{card_id}` not found in catalog")]
    UnknownCard {
        /// Requested card identifier.
        card_id: String,
    },
    /// Transport-level failure talking to the catalog service.
    #[error("catalog transport failure: {message}")]
    Transport {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Paged movie catalog with a detail endpoint.
pub trait Catalog: Send + Sync {
    /// Fetch the ordered cards of page `page` (1-based).
    fn fetch_page(&self, page: u32, locale: &str) -> BoxFuture<'static, CatalogResult<Vec<Card>>>;

    /// Fetch the resolved detail view of a single card.
    fn fetch_detail(
        &self,
        card_id: &str,
        locale: &str,
    ) -> BoxFuture<'static, CatalogResult<CardDetail>>;
}

/// Display name for a catalog genre identifier.
pub fn genre_name(id: i64) -> Option<&'static str> {
    let name = match id {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        36 => "History",
        27 => "Horror",
        10402 => "Music",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Science Fiction",
        10770 => "TV Movie",
        53 => "Thriller",
        10752 => "War",
        37 => "Western",
        _ => return None,
    };
    Some(name)
}

/// Deterministic in-memory catalog.
///
/// Pages are fixed at construction, so every fetcher of the same page sees
/// the same ordered list; exactly the stability window the coordination
/// core assumes of the real service.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCatalog {
    pages: BTreeMap<u32, Vec<Card>>,
}

impl ScriptedCatalog {
    /// Build a catalog from explicit page contents.
    pub fn new(pages: BTreeMap<u32, Vec<Card>>) -> Self {
        Self { pages }
    }

    /// Build `page_count` synthetic pages of `cards_per_page` cards each,
    /// with identifiers derived from page and position.
    pub fn generated(page_count: u32, cards_per_page: usize) -> Self {
        let genres = [28, 35, 18, 27, 878, 10749];
        let pages = (1..=page_count)
            .map(|page| {
                let cards = (0..cards_per_page)
                    .map(|index| {
                        let id = u64::from(page) * 1000 + index as u64;
                        Card {
                            id: id.to_string(),
                            title: format!("Feature #{id}"),
                            summary: format!("Synthetic catalog entry {id}."),
                            primary_image_path: format!("/posters/{id}.jpg"),
                            secondary_image_path: format!("/backdrops/{id}.jpg"),
                            score: 5.0 + (id % 50) as f64 / 10.0,
                            date: format!("20{:02}-01-01", id % 25),
                            genre_ids: vec![genres[(id % genres.len() as u64) as usize]],
                        }
                    })
                    .collect();
                (page, cards)
            })
            .collect();
        Self { pages }
    }
}

impl Catalog for ScriptedCatalog {
    fn fetch_page(&self, page: u32, _locale: &str) -> BoxFuture<'static, CatalogResult<Vec<Card>>> {
        let result = self
            .pages
            .get(&page)
            .cloned()
            .ok_or(CatalogError::PageOutOfRange { page });
        async move { result }.boxed()
    }

    fn fetch_detail(
        &self,
        card_id: &str,
        _locale: &str,
    ) -> BoxFuture<'static, CatalogResult<CardDetail>> {
        let found = self
            .pages
            .values()
            .flatten()
            .find(|card| card.id == card_id)
            .cloned();
        let result = match found {
            Some(card) => {
                let genre_names = card
                    .genre_ids
                    .iter()
                    .filter_map(|id| genre_name(*id))
                    .map(str::to_string)
                    .collect();
                Ok(CardDetail { card, genre_names })
            }
            None => Err(CatalogError::UnknownCard {
                card_id: card_id.to_string(),
            }),
        };
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_pages_are_stable_and_ordered() {
        let catalog = ScriptedCatalog::generated(3, 4);
        let first = catalog.fetch_page(2, "en-US").await.expect("page");
        let second = catalog.fetch_page(2, "en-US").await.expect("page");
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].id, "2000");
    }

    #[tokio::test]
    async fn out_of_range_page_is_an_error() {
        let catalog = ScriptedCatalog::generated(3, 4);
        let err = catalog.fetch_page(9, "en-US").await.expect_err("range");
        assert!(matches!(err, CatalogError::PageOutOfRange { page: 9 }));
    }

    #[tokio::test]
    async fn detail_resolves_genre_names() {
        let catalog = ScriptedCatalog::generated(1, 1);
        let detail = catalog.fetch_detail("1000", "en-US").await.expect("detail");
        assert_eq!(detail.card.id, "1000");
        assert!(!detail.genre_names.is_empty());

        let err = catalog
            .fetch_detail("nope", "en-US")
            .await
            .expect_err("unknown");
        assert!(matches!(err, CatalogError::UnknownCard { .. }));
    }
}
