use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::Mutex;
use teloxide::types::Message;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterIdentity {
    pub id: u64,
    pub handle: Option<String>,
}

impl RequesterIdentity {
    pub fn from_message(message: &Message) -> Option<Self> {
        let user = message.from.as_ref()?;
        Some(RequesterIdentity {
            id: user.id.0,
            handle: user.username.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied,
}

fn normalize_handle(value: &str) -> String {
    value.trim().trim_start_matches('@').to_ascii_lowercase()
}

/// One grant per requester per calendar day, except for the privileged handle.
#[derive(Debug)]
pub struct AccessGate {
    privileged_handle: Option<String>,
    last_served: Mutex<HashMap<u64, NaiveDate>>,
}

impl AccessGate {
    pub fn new(privileged_handle: &str) -> Self {
        let privileged_handle = Some(normalize_handle(privileged_handle)).filter(|h| !h.is_empty());
        AccessGate {
            privileged_handle,
            last_served: Mutex::new(HashMap::new()),
        }
    }

    fn is_privileged(&self, requester: &RequesterIdentity) -> bool {
        match (&self.privileged_handle, &requester.handle) {
            (Some(privileged), Some(handle)) => normalize_handle(handle) == *privileged,
            _ => false,
        }
    }

    pub fn check(&self, requester: &RequesterIdentity, today: NaiveDate) -> AccessDecision {
        if self.is_privileged(requester) {
            info!("Privileged requester {} bypasses the daily limit", requester.id);
            return AccessDecision::Granted;
        }

        let mut last_served = self.last_served.lock();
        if last_served.get(&requester.id) == Some(&today) {
            return AccessDecision::Denied;
        }
        last_served.insert(requester.id, today);
        AccessDecision::Granted
    }

    pub fn tracked_requesters(&self) -> usize {
        self.last_served.lock().len()
    }
}
