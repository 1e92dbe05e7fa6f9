//! Shared test harness: an in-memory backend with NASA sample content.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use contentstore::{ContentStore, ResourceRequest, Transport, TransportError};

pub const HOMEPAGE: &str = "homepage";
pub const MENU: &str = "menu";
pub const SPLASH: &str = "splash";

pub const DAILY_SHOW: &str = "daily-show";
pub const FEATURED_VIDEO: &str = "0db5528d4c3c7ae4d5f24cce1c9fae51";
pub const FEATURED_COLLECTION: &str = "51c12f4b70ff4a70925a1be26b8442af";
pub const MENU_COLLECTION: &str = "ab2d92ee98b6309299e92024a487d4c0";
pub const APRIL_VIDEO: &str = "42baaa6e1e9ce2bb6d96d53007656f02";

pub const MENU_ENTITIES: [&str; 6] = [
    "b99ab89d33c654277b739dadc53a2822",
    "42baaa6e1e9ce2bb6d96d53007656f02",
    "6dc9bd8ef8d8c1e1d9a3e1a4e4b2f2c0",
    "8a1e3e0f0d6f43b5a0c1c9a1b2d3e4f5",
    "c47f0e8d2b9a4c3d8e7f6a5b4c3d2e1f",
    "943af21ce037461b77c1752073c0a2a1",
];

pub const SEARCH_VIDEOS: [&str; 4] = [
    "e1a2b3c4d5e6f708192a3b4c5d6e7f80",
    "f1a2b3c4d5e6f708192a3b4c5d6e7f81",
    FEATURED_VIDEO,
    "a1a2b3c4d5e6f708192a3b4c5d6e7f82",
];

fn reference(id: &str, resource_type: &str) -> Value {
    json!({ "id": id, "type": resource_type })
}

fn video(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "video",
        "attributes": {
            "title": title,
            "description": format!("{} from the NASA archive", title),
            "url": format!("http://video.oddworks.io/NASA/{}.mp4", id),
            "duration": 60000,
            "images": [{ "url": format!("http://image.oddworks.io/NASA/{}.jpeg", id), "label": "thumbnail" }]
        }
    })
}

fn fixtures() -> Vec<Value> {
    let mut resources = vec![
        json!({
            "id": HOMEPAGE,
            "type": "view",
            "attributes": { "title": "Nasa Sample Homepage" },
            "relationships": {
                "promotion": { "data": reference(DAILY_SHOW, "promotion") },
                "featuredMedia": { "data": reference(FEATURED_VIDEO, "video") },
                "featuredCollections": { "data": [reference(FEATURED_COLLECTION, "collection")] }
            }
        }),
        json!({
            "id": MENU,
            "type": "view",
            "attributes": { "title": "Menu" },
            "relationships": {
                "items": {
                    "data": [
                        reference(FEATURED_VIDEO, "video"),
                        reference(MENU_COLLECTION, "collection")
                    ]
                }
            }
        }),
        json!({
            "id": SPLASH,
            "type": "view",
            "attributes": {
                "title": "Splash",
                "images": [{ "url": "http://image.oddworks.io/NASA/splash.png", "label": "splash" }]
            }
        }),
        json!({
            "id": DAILY_SHOW,
            "type": "promotion",
            "attributes": { "title": "The Daily Show", "url": "http://nasa.gov/daily" }
        }),
        json!({
            "id": FEATURED_COLLECTION,
            "type": "collection",
            "attributes": { "title": "Featured" },
            "relationships": {
                "entities": { "data": [reference(FEATURED_VIDEO, "video"), reference(APRIL_VIDEO, "video")] }
            }
        }),
        json!({
            "id": MENU_COLLECTION,
            "type": "collection",
            "attributes": { "title": "Space Station" },
            "relationships": {
                "entities": {
                    "data": MENU_ENTITIES.iter().map(|id| reference(id, "video")).collect::<Vec<_>>()
                }
            }
        }),
        video(FEATURED_VIDEO, "Earth Views"),
        json!({
            "id": APRIL_VIDEO,
            "type": "video",
            "attributes": {
                "title": "What's Up - April 2016",
                "url": "http://video.oddworks.io/NASA/whats-up-april-2016.mp4",
                "duration": 13000000,
                "images": [{ "url": "http://image.oddworks.io/NASA/space4.jpeg", "label": "thumbnail" }]
            }
        }),
        json!({
            "id": "earth-collection",
            "type": "collection",
            "attributes": { "title": "Earth Science" }
        }),
    ];

    for (i, id) in MENU_ENTITIES.iter().enumerate() {
        if *id != APRIL_VIDEO {
            resources.push(video(id, &format!("Space Station Episode {}", i + 1)));
        }
    }
    for (i, id) in SEARCH_VIDEOS.iter().enumerate() {
        if *id != FEATURED_VIDEO {
            resources.push(video(id, &format!("Earth Observatory {}", i + 1)));
        }
    }

    resources
}

/// In-memory backend that answers like the content API.
///
/// Resources are served by id regardless of the endpoint type, so callers
/// can provoke type mismatches.
pub struct ScriptedTransport {
    resources: Mutex<HashMap<String, Value>>,
    requests: AtomicUsize,
    log: Mutex<Vec<ResourceRequest>>,
    searches: Mutex<Vec<String>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        let resources = fixtures()
            .into_iter()
            .map(|value| (value["id"].as_str().unwrap_or_default().to_string(), value))
            .collect();

        Self {
            resources: Mutex::new(resources),
            requests: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    /// Serve `value` under `id`, replacing any fixture
    pub fn insert(&self, id: &str, value: Value) {
        self.resources.lock().unwrap().insert(id.to_string(), value);
    }

    /// Network round trips so far, config fetch excluded
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Count a request; failure is decided when the request starts
    async fn round_trip(&self) -> Result<(), TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.load(Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        Ok(())
    }

    fn lookup(&self, id: &str) -> Option<Value> {
        self.resources.lock().unwrap().get(id).cloned()
    }

    fn side_load(&self, primary: &[Value], include: &str) -> Vec<Value> {
        let mut seen: Vec<String> = primary
            .iter()
            .filter_map(|p| p["id"].as_str().map(str::to_string))
            .collect();
        let mut included = Vec::new();

        for resource in primary {
            for name in include.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let data = &resource["relationships"][name]["data"];
                let refs = match data {
                    Value::Array(refs) => refs.clone(),
                    Value::Null => Vec::new(),
                    single => vec![single.clone()],
                };
                for reference in refs {
                    let Some(id) = reference["id"].as_str() else {
                        continue;
                    };
                    if seen.iter().any(|s| s == id) {
                        continue;
                    }
                    if let Some(target) = self.lookup(id) {
                        seen.push(id.to_string());
                        included.push(target);
                    }
                }
            }
        }

        included
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_config(&self) -> Result<String, TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        Ok(json!({
            "data": {
                "id": "nasa-config",
                "type": "config",
                "attributes": {
                    "views": { "homepage": HOMEPAGE, "menu": MENU, "splash": SPLASH }
                }
            }
        })
        .to_string())
    }

    async fn fetch_resources(&self, request: &ResourceRequest) -> Result<String, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        self.round_trip().await?;

        let primary: Vec<Value> = request.ids.iter().filter_map(|id| self.lookup(id)).collect();
        let included = request
            .include
            .as_deref()
            .map(|include| self.side_load(&primary, include))
            .unwrap_or_default();

        let data = match (request.ids.len(), primary.first()) {
            (1, Some(single)) => single.clone(),
            (1, None) => Value::Null,
            _ => Value::Array(primary),
        };

        let mut body = json!({ "data": data });
        if !included.is_empty() {
            body["included"] = Value::Array(included);
        }
        Ok(body.to_string())
    }

    async fn search(&self, term: &str) -> Result<String, TransportError> {
        self.searches.lock().unwrap().push(term.to_string());
        self.round_trip().await?;

        let data: Vec<Value> = if term.eq_ignore_ascii_case("earth") {
            SEARCH_VIDEOS
                .iter()
                .chain(std::iter::once(&"earth-collection"))
                .filter_map(|id| self.lookup(id))
                .collect()
        } else {
            Vec::new()
        };

        Ok(json!({ "data": data }).to_string())
    }
}

/// A ready store over a fresh scripted backend
pub async fn ready_store() -> (Arc<ContentStore>, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(ContentStore::new(transport.clone()));
    store.initialize().await.unwrap();
    (store, transport)
}
