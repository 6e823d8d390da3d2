//! Catalog collaborator shapes: the card summaries fetched per page and the
//! resolved detail view for a matched card.

use serde::{Deserialize, Serialize};

/// A single catalog item displayed to participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Stable catalog identifier.
    pub id: String,
    /// Title shown on the card face.
    pub title: String,
    /// Short synopsis.
    #[serde(default)]
    pub summary: String,
    /// Path of the primary artwork.
    #[serde(default)]
    pub primary_image_path: String,
    /// Path of the secondary artwork.
    #[serde(default)]
    pub secondary_image_path: String,
    /// Aggregate catalog rating.
    #[serde(default)]
    pub score: f64,
    /// Release date in the catalog's own format.
    #[serde(default)]
    pub date: String,
    /// Catalog genre identifiers.
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// A card plus the fields only the detail endpoint resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetail {
    /// The summary fields, identical to the paged listing.
    #[serde(flatten)]
    pub card: Card,
    /// Genre identifiers resolved to display names.
    #[serde(default)]
    pub genre_names: Vec<String>,
}
