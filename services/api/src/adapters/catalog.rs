//! services/api/src/adapters/catalog.rs
//!
//! Adapter for the Google Books volumes API. Implements the
//! `CatalogService` port and maps the raw volume payload to the core's
//! `CatalogItem` once, right here at the boundary.

use async_trait::async_trait;
use book_scout_core::domain::{CatalogItem, CatalogPage, Price};
use book_scout_core::ports::{CatalogService, PortError, PortResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Adapter over `GET {base}/volumes`.
#[derive(Clone)]
pub struct GoogleBooksAdapter {
    client: Client,
    base_url: String,
    language: String,
}

impl GoogleBooksAdapter {
    pub fn new(client: Client, base_url: String, language: String) -> Self {
        Self {
            client,
            base_url,
            language,
        }
    }
}

#[async_trait]
impl CatalogService for GoogleBooksAdapter {
    async fn search_volumes(
        &self,
        query: &str,
        start_index: u32,
        max_results: u32,
    ) -> PortResult<CatalogPage> {
        let url = format!("{}/volumes", self.base_url);
        debug!(query, start_index, max_results, "fetching catalog page");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("startIndex", &start_index.to_string()),
                ("maxResults", &max_results.to_string()),
                ("langRestrict", &self.language),
            ])
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "Google Books API error: {status}"
            )));
        }

        let payload: VolumesResponse = response
            .json()
            .await
            .map_err(|e| PortError::Malformed(e.to_string()))?;

        Ok(CatalogPage {
            total_items: payload.total_items.unwrap_or(0),
            items: payload
                .items
                .unwrap_or_default()
                .into_iter()
                .map(Volume::into_item)
                .collect(),
        })
    }
}

//=========================================================================================
// Wire DTOs
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    total_items: Option<u32>,
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
    #[serde(default)]
    sale_info: SaleInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
    categories: Option<Vec<String>>,
    page_count: Option<u32>,
    published_date: Option<String>,
    average_rating: Option<f32>,
    preview_link: Option<String>,
    info_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleInfo {
    list_price: Option<PriceInfo>,
    retail_price: Option<PriceInfo>,
    buy_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceInfo {
    amount: Option<f64>,
    currency_code: Option<String>,
}

impl Volume {
    /// Maps one raw volume to the pipeline's `CatalogItem`, applying the
    /// placeholder defaults and cover/price preference order.
    fn into_item(self) -> CatalogItem {
        let info = self.volume_info;
        let sale = self.sale_info;

        let cover_url = info.image_links.and_then(|links| {
            links
                .large
                .or(links.medium)
                .or(links.thumbnail)
                .or(links.small_thumbnail)
                .map(|url| url.replacen("http://", "https://", 1))
        });

        let genre = info
            .categories
            .and_then(|cats| cats.into_iter().find(|c| !c.is_empty()))
            .unwrap_or_else(|| "Sin categoría".to_string());

        let price = sale
            .list_price
            .or(sale.retail_price)
            .and_then(|p| {
                Some(Price {
                    amount: p.amount?,
                    currency_code: p.currency_code.unwrap_or_else(|| "USD".to_string()),
                })
            });

        CatalogItem {
            id: self.id,
            title: info.title.unwrap_or_else(|| "Sin título".to_string()),
            author: info
                .authors
                .filter(|a| !a.is_empty())
                .map(|a| a.join(", "))
                .unwrap_or_else(|| "Autor desconocido".to_string()),
            description: info.description,
            cover_url,
            genre: Some(genre),
            page_count: info.page_count,
            published_date: info.published_date,
            rating: info.average_rating,
            price,
            buy_url: sale.buy_link,
            preview_url: info.preview_link.or(info.info_link),
            matches_interests: false,
            recommendation_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "totalItems": 412,
        "items": [
            {
                "id": "abc123",
                "volumeInfo": {
                    "title": "El Nombre del Viento",
                    "authors": ["Patrick Rothfuss"],
                    "description": "Una historia épica.",
                    "imageLinks": {
                        "smallThumbnail": "http://books.example/small.jpg",
                        "thumbnail": "http://books.example/thumb.jpg"
                    },
                    "categories": ["Fantasía", "Aventura"],
                    "pageCount": 722,
                    "publishedDate": "2007",
                    "averageRating": 4.5,
                    "previewLink": "http://books.example/preview"
                },
                "saleInfo": {
                    "retailPrice": {"amount": 9.99, "currencyCode": "EUR"},
                    "buyLink": "http://books.example/buy"
                }
            },
            {
                "id": "bare",
                "volumeInfo": {}
            }
        ]
    }"#;

    #[test]
    fn maps_a_full_volume() {
        let payload: VolumesResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(payload.total_items, Some(412));
        let items: Vec<_> = payload
            .items
            .unwrap()
            .into_iter()
            .map(Volume::into_item)
            .collect();

        let book = &items[0];
        assert_eq!(book.id, "abc123");
        assert_eq!(book.title, "El Nombre del Viento");
        assert_eq!(book.author, "Patrick Rothfuss");
        // Preference order: no large/medium, so the thumbnail wins,
        // upgraded to https.
        assert_eq!(
            book.cover_url.as_deref(),
            Some("https://books.example/thumb.jpg")
        );
        assert_eq!(book.genre.as_deref(), Some("Fantasía"));
        assert_eq!(book.page_count, Some(722));
        let price = book.price.as_ref().unwrap();
        assert_eq!(price.amount, 9.99);
        assert_eq!(price.currency_code, "EUR");
    }

    #[test]
    fn bare_volume_gets_placeholder_defaults() {
        let payload: VolumesResponse = serde_json::from_str(SAMPLE).unwrap();
        let items: Vec<_> = payload
            .items
            .unwrap()
            .into_iter()
            .map(Volume::into_item)
            .collect();

        let book = &items[1];
        assert_eq!(book.title, "Sin título");
        assert_eq!(book.author, "Autor desconocido");
        assert_eq!(book.genre.as_deref(), Some("Sin categoría"));
        assert!(book.cover_url.is_none());
        assert!(book.price.is_none());
    }

    #[test]
    fn empty_response_is_an_empty_page() {
        let payload: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert_eq!(payload.total_items, Some(0));
        assert!(payload.items.is_none());
    }
}
