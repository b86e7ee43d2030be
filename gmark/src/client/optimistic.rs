// gmark/src/client/optimistic.rs
use crate::domain::content::ContentRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// The mutation is in flight
    Pending,
    /// The mutation succeeded; the overlay holds until settled
    Confirmed,
}

#[derive(Debug, Clone, Copy)]
struct Overlay {
    bookmarked: bool,
    ticket: u64,
    state: OverlayState,
}

#[derive(Debug, Default)]
struct State {
    next_ticket: u64,
    overlays: HashMap<(String, ContentRef), Overlay>,
}

/// Handle for one optimistic change, used to confirm or roll it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticTicket {
    owner: String,
    content: ContentRef,
    id: u64,
}

/// Local "is bookmarked" projection laid over cached server state.
///
/// It is set when a mutation is issued and does not depend on when (or
/// whether) the cache refetches. Only the latest change per item counts; a
/// rollback of an older change is ignored.
#[derive(Debug, Clone, Default)]
pub struct OptimisticStatus {
    state: Arc<Mutex<State>>,
}

impl OptimisticStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn apply(&self, owner: &str, content: ContentRef, bookmarked: bool) -> OptimisticTicket {
        let mut state = self.lock();
        state.next_ticket += 1;
        let id = state.next_ticket;
        state.overlays.insert(
            (owner.to_string(), content),
            Overlay {
                bookmarked,
                ticket: id,
                state: OverlayState::Pending,
            },
        );
        trace!("optimistic {} {} -> {}", owner, content, bookmarked);
        OptimisticTicket {
            owner: owner.to_string(),
            content,
            id,
        }
    }

    pub fn confirm(&self, ticket: &OptimisticTicket) {
        let mut state = self.lock();
        if let Some(overlay) = state
            .overlays
            .get_mut(&(ticket.owner.clone(), ticket.content))
            .filter(|overlay| overlay.ticket == ticket.id)
        {
            overlay.state = OverlayState::Confirmed;
        }
    }

    /// Undo a failed change; returns whether the overlay was removed.
    pub fn rollback(&self, ticket: &OptimisticTicket) -> bool {
        let mut state = self.lock();
        let key = (ticket.owner.clone(), ticket.content);
        match state.overlays.get(&key) {
            Some(overlay) if overlay.ticket == ticket.id => {
                state.overlays.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Drop a confirmed overlay once fresh server state has been read.
    pub fn settle(&self, owner: &str, content: ContentRef) {
        let mut state = self.lock();
        let key = (owner.to_string(), content);
        if state
            .overlays
            .get(&key)
            .is_some_and(|overlay| overlay.state == OverlayState::Confirmed)
        {
            state.overlays.remove(&key);
        }
    }

    pub fn overlay(&self, owner: &str, content: ContentRef) -> Option<(bool, OverlayState)> {
        self.lock()
            .overlays
            .get(&(owner.to_string(), content))
            .map(|overlay| (overlay.bookmarked, overlay.state))
    }

    /// The status to show: the overlay if one exists, else the cached value.
    pub fn project(&self, owner: &str, content: ContentRef, cached: Option<bool>) -> bool {
        self.overlay(owner, content)
            .map(|(bookmarked, _)| bookmarked)
            .or(cached)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentSource;

    fn item() -> ContentRef {
        ContentRef::new(1001, ContentSource::Items)
    }

    #[test]
    fn given_applied_change_then_projection_wins_over_cache() {
        let optimistic = OptimisticStatus::new();
        let ticket = optimistic.apply("alice", item(), true);

        assert!(optimistic.project("alice", item(), Some(false)));
        optimistic.confirm(&ticket);
        assert_eq!(
            optimistic.overlay("alice", item()),
            Some((true, OverlayState::Confirmed))
        );

        optimistic.settle("alice", item());
        assert!(!optimistic.project("alice", item(), Some(false)));
    }

    #[test]
    fn given_failed_change_when_rolled_back_then_cache_shows_again() {
        let optimistic = OptimisticStatus::new();
        let ticket = optimistic.apply("alice", item(), true);

        assert!(optimistic.rollback(&ticket));
        assert!(!optimistic.project("alice", item(), None));
        assert!(optimistic.project("alice", item(), Some(true)));
    }

    #[test]
    fn given_newer_change_when_older_rolled_back_then_newer_kept() {
        let optimistic = OptimisticStatus::new();
        let older = optimistic.apply("alice", item(), true);
        let _newer = optimistic.apply("alice", item(), false);

        assert!(!optimistic.rollback(&older));
        assert_eq!(
            optimistic.overlay("alice", item()),
            Some((false, OverlayState::Pending))
        );
    }

    #[test]
    fn given_pending_overlay_when_settled_then_kept() {
        let optimistic = OptimisticStatus::new();
        optimistic.apply("alice", item(), true);

        optimistic.settle("alice", item());
        assert!(optimistic.project("alice", item(), Some(false)));
        assert!(!optimistic.project("bob", item(), None));
    }
}
