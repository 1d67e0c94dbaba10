use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::core::constants::details;
use crate::core::types::LinkStatus;

enum Slot {
    Pending(watch::Receiver<Option<LinkStatus>>),
    Done(LinkStatus),
}

type Slots = Arc<Mutex<FxHashMap<String, Slot>>>;

/// Arena of checks started during one run, keyed by normalized link.
///
/// The first caller to claim a key becomes its owner and performs the
/// check; everyone else waits for the owner's result. A key is checked at
/// most once per run.
#[derive(Clone, Default)]
pub struct InFlight {
    slots: Slots,
}

pub enum Claim {
    /// Caller must perform the check and release the token with its result
    Owner(ClaimToken),
    /// Another task is checking this key
    Waiter(Waiter),
    /// Already resolved earlier in this run
    Done(LinkStatus),
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, key: &str) -> Claim {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(key) {
            Some(Slot::Done(status)) => Claim::Done(status.clone()),
            Some(Slot::Pending(receiver)) => Claim::Waiter(Waiter {
                receiver: receiver.clone(),
            }),
            None => {
                let (sender, receiver) = watch::channel(None);
                slots.insert(key.to_string(), Slot::Pending(receiver));
                Claim::Owner(ClaimToken {
                    key: key.to_string(),
                    sender: Some(sender),
                    slots: Arc::clone(&self.slots),
                })
            }
        }
    }

    /// Number of keys claimed so far.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ownership of one in-flight check.
///
/// Dropping the token without releasing it (the owning task was cancelled)
/// frees the key and wakes every waiter with an abandoned-check error.
pub struct ClaimToken {
    key: String,
    sender: Option<watch::Sender<Option<LinkStatus>>>,
    slots: Slots,
}

impl ClaimToken {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn release(mut self, status: LinkStatus) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(self.key.clone(), Slot::Done(status.clone()));
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(status));
        }
    }
}

impl Drop for ClaimToken {
    fn drop(&mut self) {
        if self.sender.is_some() {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.remove(&self.key);
        }
    }
}

pub struct Waiter {
    receiver: watch::Receiver<Option<LinkStatus>>,
}

impl Waiter {
    pub async fn wait(mut self) -> LinkStatus {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(status) => status
                .clone()
                .unwrap_or_else(|| LinkStatus::Error(details::CHECK_ABANDONED.to_string())),
            Err(_) => LinkStatus::Error(details::CHECK_ABANDONED.to_string()),
        }
    }
}
