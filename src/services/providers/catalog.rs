/// HTTP catalog provider
///
/// Talks to a Spotify-style Web API with bearer authentication:
/// 1. Search: /v1/search?q=…&type=track → track summaries
/// 2. Metadata: /v1/tracks?ids=a,b → track summaries (null for unknown IDs)
/// 3. Features: /v1/audio-features?ids=a,b → feature bundles (null when not analysed)
///
/// Search results are cached in Redis; metadata and feature lookups are not.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{AudioFeatureVector, TrackFeatures, TrackSummary},
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
/// Most IDs the catalog accepts per bulk request
const MAX_IDS_PER_REQUEST: usize = 50;

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

impl From<ApiTrack> for TrackSummary {
    fn from(track: ApiTrack) -> Self {
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| "Unknown Artist".to_string());

        TrackSummary {
            id: track.id,
            name: track.name,
            artist,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    tracks: ApiPage,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    items: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTracksResponse {
    #[serde(default)]
    tracks: Vec<Option<ApiTrack>>,
}

#[derive(Debug, Deserialize)]
struct ApiAudioFeatures {
    id: String,
    #[serde(flatten)]
    features: AudioFeatureVector,
}

#[derive(Debug, Deserialize)]
struct ApiAudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<ApiAudioFeatures>>,
}

#[derive(Clone)]
pub struct HttpCatalogProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl HttpCatalogProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// GET a JSON document from the catalog, mapping non-2xx to `ExternalApi`
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "Catalog API request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Catalog API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn search_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<TrackSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::TrackSearch {
                query: query.to_string(),
                limit,
            },
            SEARCH_CACHE_TTL,
            async move {
                let page: ApiSearchResponse = self
                    .get_json(
                        "/v1/search",
                        &[
                            ("q", query.to_string()),
                            ("type", "track".to_string()),
                            ("limit", limit.to_string()),
                        ],
                    )
                    .await?;

                let tracks: Vec<TrackSummary> =
                    page.tracks.items.into_iter().map(TrackSummary::from).collect();

                tracing::info!(
                    query = %query,
                    results = tracks.len(),
                    provider = self.name(),
                    "Track search completed"
                );

                Ok::<_, AppError>(tracks)
            }
        )
    }

    async fn get_tracks(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackSummary>> {
        let mut tracks = Vec::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(MAX_IDS_PER_REQUEST) {
            let response: ApiTracksResponse = self
                .get_json("/v1/tracks", &[("ids", chunk.join(","))])
                .await?;
            tracks.extend(response.tracks.into_iter().flatten().map(TrackSummary::from));
        }

        Ok(tracks)
    }

    async fn get_features(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackFeatures>> {
        let mut features = Vec::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(MAX_IDS_PER_REQUEST) {
            let response: ApiAudioFeaturesResponse = self
                .get_json("/v1/audio-features", &[("ids", chunk.join(","))])
                .await?;
            features.extend(response.audio_features.into_iter().flatten().map(|f| {
                TrackFeatures {
                    track_id: f.id,
                    features: f.features,
                }
            }));
        }

        if features.len() < track_ids.len() {
            tracing::debug!(
                requested = track_ids.len(),
                returned = features.len(),
                provider = self.name(),
                "Some tracks have no audio features"
            );
        }

        Ok(features)
    }

    fn name(&self) -> &'static str {
        "http-catalog"
    }
}
