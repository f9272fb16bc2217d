use parking_lot::RwLock;

use crate::message::{Operation, Snapshot};

/// Owns the local dictionary and applies committed operations to it.
#[derive(Debug, Default)]
pub(crate) struct Learner {
    data: RwLock<Snapshot>,
}

impl Learner {
    /// Puts always succeed. Deletes succeed only if the key was present.
    pub fn learn(&self, operation: Operation) -> bool {
        match operation {
        | Operation::Put { key, value } => {
            info!("learned PUT {} => {}", key, value);
            self.data.write().insert(key, value);
            true
        }
        | Operation::Delete { key } => {
            if self.data.write().remove(&key).is_some() {
                info!("learned DELETE {}", key);
                true
            } else {
                warn!("learned DELETE {}, but key not found", key);
                false
            }
        }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Independent copy of the current dictionary.
    pub fn snapshot(&self) -> Snapshot {
        self.data.read().clone()
    }

    /// Replaces the whole dictionary.
    pub fn install(&self, data: Snapshot) {
        *self.data.write() = data;
    }
}
