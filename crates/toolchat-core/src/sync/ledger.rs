//! FlushLedger: which messages have been written to the store.

use std::collections::HashSet;

use toolchat_types::message::MessageId;

/// Identities of messages whose write has been issued.
///
/// An entry is claimed before the write is issued, so a second completion
/// for the same message is absorbed even while the first write is in flight.
/// A failed write keeps its claim; that message is not retried.
#[derive(Debug, Default)]
pub struct FlushLedger {
    flushed: HashSet<MessageId>,
}

impl FlushLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to write `id`. Returns `false` if it was already claimed.
    pub fn claim(&mut self, id: &MessageId) -> bool {
        self.flushed.insert(id.clone())
    }

    pub fn is_flushed(&self, id: &MessageId) -> bool {
        self.flushed.contains(id)
    }

    /// Mark messages loaded from the store as already written.
    pub fn mark_flushed<'a>(&mut self, ids: impl IntoIterator<Item = &'a MessageId>) {
        self.flushed.extend(ids.into_iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.flushed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flushed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut ledger = FlushLedger::new();
        let id = MessageId::from("a1");
        assert!(ledger.claim(&id));
        assert!(!ledger.claim(&id));
        assert!(ledger.is_flushed(&id));
    }

    #[test]
    fn test_unclaimed_is_not_flushed() {
        let mut ledger = FlushLedger::new();
        assert!(ledger.is_empty());
        assert!(!ledger.is_flushed(&MessageId::from("a1")));
        ledger.claim(&MessageId::from("a2"));
        assert!(!ledger.is_flushed(&MessageId::from("a1")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_hydrated_ids_cannot_be_claimed() {
        let mut ledger = FlushLedger::new();
        let ids = vec![MessageId::from("u1"), MessageId::from("a1")];
        ledger.mark_flushed(&ids);
        assert_eq!(ledger.len(), 2);
        assert!(ids.iter().all(|id| !ledger.claim(id)));
    }
}
