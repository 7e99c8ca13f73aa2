use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use uuid::Uuid;

use soundprint_api::{
    db::FeedbackStore,
    error::{AppError, AppResult},
    models::{
        AudioFeatureVector, ContextWeights, FeedbackEvent, RecommendationRecord, TrackFeatures,
        TrackSummary,
    },
    routes::{create_router, AppState},
    services::{
        providers::{CatalogProvider, ContextInterpreter},
        PipelineSettings,
    },
};

fn features(valence: f64, energy: f64, danceability: f64, acousticness: f64) -> AudioFeatureVector {
    AudioFeatureVector {
        valence,
        energy,
        danceability,
        acousticness,
        instrumentalness: 0.05,
        liveness: 0.12,
        speechiness: 0.05,
        tempo: 120.0,
        loudness: -7.0,
        mode: 1,
        key: 5,
        time_signature: 4,
    }
}

/// Catalog with a fixed track list; every search returns every track
struct FakeCatalog {
    tracks: Vec<(TrackSummary, AudioFeatureVector)>,
}

impl FakeCatalog {
    fn new() -> Self {
        let track = |id: &str, artist: &str, f: AudioFeatureVector| {
            (
                TrackSummary {
                    id: id.to_string(),
                    name: format!("Song {}", id),
                    artist: artist.to_string(),
                },
                f,
            )
        };

        Self {
            tracks: vec![
                track("ref", "Lumen", features(0.7, 0.6, 0.65, 0.3)),
                track("near", "Lumen", features(0.68, 0.62, 0.6, 0.32)),
                track("mid", "Harbor", features(0.4, 0.8, 0.7, 0.1)),
                track("far", "Quiet Rooms", features(0.1, 0.15, 0.2, 0.95)),
            ],
        }
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn search_tracks(&self, _query: &str, limit: usize) -> AppResult<Vec<TrackSummary>> {
        Ok(self.tracks.iter().take(limit).map(|(s, _)| s.clone()).collect())
    }

    async fn get_tracks(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackSummary>> {
        Ok(self
            .tracks
            .iter()
            .filter(|(s, _)| track_ids.contains(&s.id))
            .map(|(s, _)| s.clone())
            .collect())
    }

    async fn get_features(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackFeatures>> {
        Ok(self
            .tracks
            .iter()
            .filter(|(s, _)| track_ids.contains(&s.id))
            .map(|(s, f)| TrackFeatures {
                track_id: s.id.clone(),
                features: *f,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeInterpreter {
    weights: Option<ContextWeights>,
}

#[async_trait]
impl ContextInterpreter for FakeInterpreter {
    async fn interpret(
        &self,
        _text: &str,
        _prior_preferences: Option<Value>,
    ) -> AppResult<ContextWeights> {
        self.weights.ok_or_else(|| {
            AppError::ContextInterpretationUnavailable("interpreter offline".to_string())
        })
    }
}

#[derive(Default)]
struct InMemoryStore {
    feedback: Mutex<Vec<(Uuid, FeedbackEvent, Option<Uuid>)>>,
    recommendations: Mutex<HashMap<Uuid, RecommendationRecord>>,
    learned: Mutex<HashMap<(Uuid, String), ContextWeights>>,
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn get_feedback(&self, listener_id: Uuid, limit: i64) -> AppResult<Vec<FeedbackEvent>> {
        let feedback = self.feedback.lock().unwrap();
        Ok(feedback
            .iter()
            .rev()
            .filter(|(l, _, _)| *l == listener_id)
            .take(limit as usize)
            .map(|(_, e, _)| e.clone())
            .collect())
    }

    async fn record_feedback(
        &self,
        listener_id: Uuid,
        event: &FeedbackEvent,
        recommendation_id: Option<Uuid>,
    ) -> AppResult<()> {
        // Same guarantee as the foreign key on feedback_events
        if let Some(id) = recommendation_id {
            if !self.recommendations.lock().unwrap().contains_key(&id) {
                return Err(AppError::Internal(format!(
                    "feedback references unknown recommendation {}",
                    id
                )));
            }
        }

        self.feedback
            .lock()
            .unwrap()
            .push((listener_id, event.clone(), recommendation_id));
        Ok(())
    }

    async fn save_recommendation(&self, record: &RecommendationRecord) -> AppResult<()> {
        self.recommendations
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn get_recommendation(&self, id: Uuid) -> AppResult<Option<RecommendationRecord>> {
        Ok(self.recommendations.lock().unwrap().get(&id).cloned())
    }

    async fn learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
    ) -> AppResult<Option<ContextWeights>> {
        Ok(self
            .learned
            .lock()
            .unwrap()
            .get(&(listener_id, context_key.to_string()))
            .copied())
    }

    async fn save_learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
        weights: &ContextWeights,
    ) -> AppResult<()> {
        self.learned
            .lock()
            .unwrap()
            .insert((listener_id, context_key.to_string()), *weights);
        Ok(())
    }
}

fn create_test_server(
    interpreted: Option<ContextWeights>,
) -> (TestServer, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::default());
    let state = Arc::new(AppState {
        catalog: Arc::new(FakeCatalog::new()),
        interpreter: Arc::new(FakeInterpreter {
            weights: interpreted,
        }),
        store: store.clone(),
        settings: PipelineSettings::default(),
    });

    let server = TestServer::new(create_router(state)).unwrap();
    (server, store)
}

fn recommendation_body(listener_id: Uuid) -> Value {
    json!({
        "listener_id": listener_id,
        "reference_track_ids": ["ref"],
        "context": "Late night coding",
        "limit": 3
    })
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server(None);
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _) = create_test_server(None);

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("client-trace-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "client-trace-42");

    let generated = server.get("/health").await;
    let id = generated.header("x-request-id");
    assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_recommendations_rank_closest_track_first() {
    let (server, store) = create_test_server(Some(ContextWeights::neutral()));
    let listener_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(listener_id))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let tracks = body["tracks"].as_array().unwrap();

    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0]["track_id"], "near");
    // References are never recommended back
    assert!(tracks.iter().all(|t| t["track_id"] != "ref"));
    for track in tracks {
        let score = track["blended_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
    assert_eq!(body["reference_profile"]["track_count"], 1);

    let id: Uuid = serde_json::from_value(body["recommendation_id"].clone()).unwrap();
    let stored = store.recommendations.lock().unwrap().get(&id).cloned().unwrap();
    assert_eq!(stored.listener_id, listener_id);
    assert_eq!(stored.context_key, "late night coding");
    assert_eq!(stored.track_ids.len(), 3);
}

#[tokio::test]
async fn test_interpreter_outage_falls_back_to_neutral() {
    let (server, _) = create_test_server(None);

    let response = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(Uuid::new_v4()))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["context_weights"]["valence"], 0.5);
    assert_eq!(body["context_weights"]["tempo_modifier"], 1.0);
}

#[tokio::test]
async fn test_invalid_recommendation_requests() {
    let (server, _) = create_test_server(Some(ContextWeights::neutral()));

    let mut zero_limit = recommendation_body(Uuid::new_v4());
    zero_limit["limit"] = json!(0);
    server
        .post("/api/v1/recommendations")
        .json(&zero_limit)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let mut no_refs = recommendation_body(Uuid::new_v4());
    no_refs["reference_track_ids"] = json!([]);
    let response = server.post("/api/v1/recommendations").json(&no_refs).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("reference tracks"));
}

#[tokio::test]
async fn test_unknown_reference_tracks_are_insufficient() {
    let (server, _) = create_test_server(Some(ContextWeights::neutral()));

    let mut body = recommendation_body(Uuid::new_v4());
    body["reference_track_ids"] = json!(["missing"]);

    server
        .post("/api/v1/recommendations")
        .json(&body)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_recommendation_roundtrip() {
    let (server, _) = create_test_server(Some(ContextWeights::neutral()));

    let created: Value = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(Uuid::new_v4()))
        .await
        .json();
    let id = created["recommendation_id"].as_str().unwrap();

    let response = server.get(&format!("/api/v1/recommendations/{}", id)).await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["context_text"], "Late night coding");

    server
        .get(&format!("/api/v1/recommendations/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_is_accepted_and_learned() {
    let interpreted = ContextWeights::new(0.3, 0.9, 0.8, 0.2, 1.2);
    let (server, store) = create_test_server(Some(interpreted));
    let listener_id = Uuid::new_v4();

    let created: Value = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(listener_id))
        .await
        .json();
    let recommendation_id = created["recommendation_id"].clone();
    let track_id = created["tracks"][0]["track_id"].clone();

    server
        .post("/api/v1/feedback")
        .json(&json!({
            "listener_id": listener_id,
            "track_id": track_id,
            "signal": "upvote",
            "recommendation_id": recommendation_id
        }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    assert_eq!(store.feedback.lock().unwrap().len(), 1);

    // Reinforcement runs after the response
    let key = (listener_id, "late night coding".to_string());
    let mut learned = None;
    for _ in 0..50 {
        learned = store.learned.lock().unwrap().get(&key).copied();
        if learned.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(learned, Some(interpreted));
}

#[tokio::test]
async fn test_downvote_is_recorded_but_not_learned() {
    let (server, store) = create_test_server(Some(ContextWeights::neutral()));
    let listener_id = Uuid::new_v4();

    let created: Value = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(listener_id))
        .await
        .json();

    server
        .post("/api/v1/feedback")
        .json(&json!({
            "listener_id": listener_id,
            "track_id": created["tracks"][0]["track_id"],
            "signal": "downvote",
            "listen_seconds": 200.0,
            "recommendation_id": created["recommendation_id"]
        }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.feedback.lock().unwrap().len(), 1);
    assert!(store.learned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_for_unknown_track_is_not_found() {
    let (server, _) = create_test_server(None);

    server
        .post("/api/v1/feedback")
        .json(&json!({
            "listener_id": Uuid::new_v4(),
            "track_id": "nope",
            "signal": "skip",
            "listen_seconds": 3.0
        }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_with_unknown_recommendation_is_stored_unlinked() {
    let (server, store) = create_test_server(Some(ContextWeights::neutral()));
    let listener_id = Uuid::new_v4();

    server
        .post("/api/v1/feedback")
        .json(&json!({
            "listener_id": listener_id,
            "track_id": "near",
            "signal": "upvote",
            "recommendation_id": Uuid::new_v4()
        }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let feedback = store.feedback.lock().unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].0, listener_id);
    assert!(feedback[0].2.is_none());
    assert!(store.learned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_on_another_listeners_recommendation_is_unlinked() {
    let (server, store) = create_test_server(Some(ContextWeights::neutral()));

    let created: Value = server
        .post("/api/v1/recommendations")
        .json(&recommendation_body(Uuid::new_v4()))
        .await
        .json();

    let other_listener = Uuid::new_v4();
    server
        .post("/api/v1/feedback")
        .json(&json!({
            "listener_id": other_listener,
            "track_id": created["tracks"][0]["track_id"],
            "signal": "upvote",
            "recommendation_id": created["recommendation_id"]
        }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let feedback = store.feedback.lock().unwrap();
    assert_eq!(feedback.len(), 1);
    assert!(feedback[0].2.is_none());
    assert!(store.learned.lock().unwrap().is_empty());
}
