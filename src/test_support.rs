//! In-memory doubles shared by the module tests: a scriptable host, memory
//! sinks/stores, and a buildable fake UI tree.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
};

use anyhow::{bail, Result};
use serde_json::Value;

use crate::host::{Capability, EventHandler, EventTopic, Host, HostEvent, Probe, SubscriptionId};
use crate::snapshot::{NodeHandle, SnapshotRecord, UiNode};
use crate::store::{RecordSink, SnapshotStore};

#[derive(Default)]
pub(crate) struct MemorySink {
    lines: Mutex<Vec<(i64, String)>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<(i64, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl RecordSink for MemorySink {
    fn append(&self, timestamp_ms: i64, value: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap()
            .push((timestamp_ms, value.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<SnapshotRecord>>,
}

impl MemoryStore {
    pub fn records(&self) -> Vec<SnapshotRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn insert(&self, record: &SnapshotRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Refuses the first insert, accepts the rest.
#[derive(Default)]
pub(crate) struct FailOnceStore {
    tripped: AtomicBool,
    records: Mutex<Vec<SnapshotRecord>>,
}

impl FailOnceStore {
    pub fn records(&self) -> Vec<SnapshotRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl SnapshotStore for FailOnceStore {
    fn insert(&self, record: &SnapshotRecord) -> Result<()> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            bail!("store write refused");
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Scriptable host: declared capabilities, canned probe answers, refusable
/// topics, and a live subscription table that tests can fire events into.
pub(crate) struct TestHost {
    api_level: u32,
    capabilities: HashSet<Capability>,
    probe_answers: HashMap<Probe, String>,
    refused_topics: HashSet<EventTopic>,
    next_id: AtomicU64,
    subscriptions: Mutex<HashMap<u64, (EventTopic, EventHandler)>>,
    subscribe_totals: Mutex<HashMap<EventTopic, usize>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            api_level: 34,
            capabilities: HashSet::new(),
            probe_answers: HashMap::new(),
            refused_topics: HashSet::new(),
            next_id: AtomicU64::new(1),
            subscriptions: Mutex::new(HashMap::new()),
            subscribe_totals: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_probe_answer(mut self, probe: Probe, answer: &str) -> Self {
        self.probe_answers.insert(probe, answer.to_string());
        self
    }

    pub fn refuse_topic(mut self, topic: EventTopic) -> Self {
        self.refused_topics.insert(topic);
        self
    }

    /// How many subscribes were ever issued for a topic, releases included.
    pub fn subscription_count(&self, topic: EventTopic) -> usize {
        self.subscribe_totals
            .lock()
            .unwrap()
            .get(&topic)
            .copied()
            .unwrap_or(0)
    }

    pub fn active_subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    /// Deliver an event to every live handler for a topic, on this thread.
    pub fn fire(&self, topic: EventTopic, event: HostEvent) {
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|(subscribed, _)| *subscribed == topic)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }
}

impl Host for TestHost {
    fn is_capability_available(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn probe(&self, probe: Probe) -> Option<String> {
        self.probe_answers.get(&probe).cloned()
    }

    fn subscribe(&self, topic: EventTopic, handler: EventHandler) -> Result<SubscriptionId> {
        if self.refused_topics.contains(&topic) {
            bail!("host refused subscription for {topic:?}");
        }
        *self
            .subscribe_totals
            .lock()
            .unwrap()
            .entry(topic)
            .or_insert(0) += 1;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, (topic, handler));
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        // Idempotent: unknown ids are fine.
        self.subscriptions.lock().unwrap().remove(&id.0);
        Ok(())
    }
}

/// Buildable fake UI node. Children are declared explicitly, including gaps
/// (`None`) the real host reports but cannot hand out; `invalidated` mimics a
/// node whose backing view is gone.
pub(crate) struct TestNode {
    id: i64,
    fields: BTreeMap<String, Value>,
    children: Vec<Option<NodeHandle>>,
    invalidated: bool,
}

impl TestNode {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
            children: Vec::new(),
            invalidated: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Option<NodeHandle>>) -> Self {
        self.children = children;
        self
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn invalidated(mut self) -> Self {
        self.invalidated = true;
        self
    }
}

impl UiNode for TestNode {
    fn identity(&self) -> i64 {
        self.id
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<NodeHandle> {
        self.children.get(index).cloned().flatten()
    }

    fn field(&self, name: &str) -> Option<Value> {
        if self.invalidated {
            return None;
        }
        self.fields.get(name).cloned()
    }
}
