// gmark/src/client/view.rs
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct ViewState {
    mounted: AtomicBool,
    latest: AtomicU64,
}

/// Sequence number of one request issued by a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// A mounted view's guard against late responses. A response is accepted
/// only if the view is still mounted and no newer request was issued.
///
/// Remounting means creating a new scope.
#[derive(Debug, Clone)]
pub struct ViewScope {
    state: Arc<ViewState>,
}

impl ViewScope {
    pub fn mount() -> Self {
        Self {
            state: Arc::new(ViewState {
                mounted: AtomicBool::new(true),
                latest: AtomicU64::new(0),
            }),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.state.mounted.store(false, Ordering::SeqCst);
    }

    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.state.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.is_mounted() && self.state.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!("Dropping response for superseded request {}", ticket.0);
            None
        }
    }

    /// Run a request and keep its result only if it is still wanted.
    pub async fn run<T, Fut>(&self, request: Fut) -> Option<T>
    where
        Fut: Future<Output = T>,
    {
        let ticket = self.begin();
        let value = request.await;
        self.accept(ticket, value)
    }
}
