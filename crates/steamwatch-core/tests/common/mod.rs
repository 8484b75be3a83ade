//! Scripted collaborators shared by the reconciler and scheduler tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use steamwatch_core::{Delivery, DeliveryError, Reconciler, ReconcilerConfig, Tracker};
use steamwatch_store::MemoryStore;
use steamwatch_types::{Destination, ItemKind, TrackingRegistry};
use steamwatch_upstream::{ItemState, Lookup, UpstreamError, UpstreamSource};

/// What the scripted upstream answers for one item.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Found(i64),
    NoChange,
    NotFound,
    Transient,
    Hang,
}

/// Upstream whose answers are set per `(kind, id)`. Unscripted items fail
/// transiently.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<(ItemKind, String), Script>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, kind: ItemKind, id: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert((kind, id.to_owned()), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpstreamSource for ScriptedSource {
    async fn fetch(&self, kind: ItemKind, id: &str) -> Result<Lookup, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&(kind, id.to_owned()))
            .copied()
            .unwrap_or(Script::Transient);
        match script {
            Script::Found(ts) => Ok(Lookup::Found(ItemState {
                update_timestamp: ts,
                title: None,
            })),
            Script::NoChange => Ok(Lookup::NoChange),
            Script::NotFound => Ok(Lookup::NotFound),
            Script::Transient => Err(UpstreamError::Status {
                endpoint: "scripted",
                status: 503,
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Delivery that records every message and can be told some destinations
/// are gone or that sending fails.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<(Destination, String)>>,
    unresolvable: Mutex<HashSet<Destination>>,
    failing: AtomicBool,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_unresolvable(&self, destination: &Destination) {
        self.unresolvable
            .lock()
            .unwrap()
            .insert(destination.clone());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Destination, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Delivery for RecordingDelivery {
    async fn resolve(&self, destination: &Destination) -> Result<bool, DeliveryError> {
        Ok(!self.unresolvable.lock().unwrap().contains(destination))
    }

    async fn deliver(&self, destination: &Destination, message: &str) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("connection reset".to_owned()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.clone(), message.to_owned()));
        Ok(())
    }
}

/// Everything a reconciler test needs to inspect afterwards.
pub struct Harness {
    pub tracker: Tracker,
    pub store: Arc<MemoryStore>,
    pub source: Arc<ScriptedSource>,
    pub delivery: Arc<RecordingDelivery>,
    pub reconciler: Reconciler<Arc<ScriptedSource>, Arc<RecordingDelivery>>,
}

pub fn config() -> ReconcilerConfig {
    ReconcilerConfig {
        max_concurrent_fetches: 4,
        fetch_timeout: Duration::from_secs(5),
    }
}

pub fn harness(registry: TrackingRegistry) -> Harness {
    harness_with(registry, config())
}

pub fn harness_with(registry: TrackingRegistry, config: ReconcilerConfig) -> Harness {
    let store = Arc::new(MemoryStore::with_registry(registry));
    let tracker = Tracker::open(store.clone()).unwrap();
    let source = ScriptedSource::new();
    let delivery = RecordingDelivery::new();
    let reconciler = Reconciler::new(tracker.clone(), source.clone(), delivery.clone(), config);
    Harness {
        tracker,
        store,
        source,
        delivery,
        reconciler,
    }
}

pub fn dest() -> Destination {
    Destination::new("100", "1")
}
