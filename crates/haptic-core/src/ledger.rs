use std::collections::{HashMap, HashSet, VecDeque};

type DeliveryKey = (String, u64);

/// What the ledger makes of one timestamped delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sighting {
    Fresh,
    /// The same `(action, timestamp)` was already applied.
    Duplicate,
    /// Older than the newest delivery already applied for this action.
    Stale,
}

impl Sighting {
    pub fn is_fresh(self) -> bool {
        self == Sighting::Fresh
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sighting::Fresh => "fresh",
            Sighting::Duplicate => "duplicate",
            Sighting::Stale => "stale",
        }
    }
}

/// Remembers the last `capacity` `(action, timestamp)` pairs so a message
/// delivered twice (for example once directly and again through the durable
/// channel) is applied only once. Also keeps the newest timestamp applied
/// per action, so a copy that arrives after a newer one is dropped.
#[derive(Debug, Clone)]
pub struct DeliveryLedger {
    capacity: usize,
    order: VecDeque<DeliveryKey>,
    seen: HashSet<DeliveryKey>,
    newest: HashMap<String, f64>,
}

impl DeliveryLedger {
    /// A capacity of zero disables duplicate and staleness detection.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(1024)),
            seen: HashSet::with_capacity(capacity.min(1024)),
            newest: HashMap::new(),
        }
    }

    /// Record a delivery and classify it. Only fresh deliveries are recorded.
    pub fn observe(&mut self, action: &str, timestamp: f64) -> Sighting {
        if self.capacity == 0 {
            return Sighting::Fresh;
        }
        let key = (action.to_string(), timestamp.to_bits());
        if self.seen.contains(&key) {
            return Sighting::Duplicate;
        }
        if self.newest.get(action).is_some_and(|&newest| timestamp <= newest) {
            return Sighting::Stale;
        }
        if self.order.len() == self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
        self.newest.insert(action.to_string(), timestamp);
        self.seen.insert(key.clone());
        self.order.push_back(key);
        Sighting::Fresh
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
