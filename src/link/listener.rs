//! Line listeners.
//!
//! Listeners see every framed line, empty ones included, in arrival order.
//! Registration, removal and dispatch all take the same lock, so a listener
//! removed during dispatch sees no further lines once removal returns.
//!
//! A listener must not add or remove listeners on the set that is calling
//! it: the lock is held for the whole dispatch and is not reentrant. Hand
//! the change to another task or thread instead; it completes once the
//! current dispatch returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::protocol::{Message, escape_line};

/// Receives raw framed lines from the link reader.
///
/// Called on the dispatch worker with the set's lock held; keep it short
/// and never add or remove listeners from inside `on_line`.
pub trait LineListener: Send + Sync + 'static {
    /// Handle one line.
    fn on_line(&self, line: &[u8]);
}

impl<F> LineListener for F
where
    F: Fn(&[u8]) + Send + Sync + 'static,
{
    fn on_line(&self, line: &[u8]) {
        self(line)
    }
}

/// Handle returned by registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered set of listeners.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn LineListener>)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Arc<dyn LineListener>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a listener.
    pub fn add(&self, listener: Arc<dyn LineListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Registered listener count.
    pub fn len(&self) -> usize {
        self.listeners().len()
    }

    /// True if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners().is_empty()
    }

    /// Hand `line` to every listener in registration order.
    ///
    /// Holds the lock throughout, so `add` and `remove` called from a
    /// listener on this set deadlock.
    pub fn dispatch(&self, line: &[u8]) -> usize {
        let listeners = self.listeners();
        for (_, listener) in listeners.iter() {
            listener.on_line(line);
        }
        listeners.len()
    }
}

/// Decodes lines and forwards them onto an async channel.
///
/// Used to marshal hardware events onto a control actor's queue.
/// [`Message::None`] lines are not forwarded.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wrap an existing sender.
    pub fn from_sender(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }
}

impl LineListener for ChannelListener {
    fn on_line(&self, line: &[u8]) {
        let message = Message::decode(line);
        if message == Message::None {
            tracing::trace!(line = %escape_line(line), "ignoring unrecognised line");
            return;
        }
        if self.tx.send(message).is_err() {
            tracing::debug!("message receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_in_order_and_remove() {
        let set = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = seen.clone();
        let first = set.add(Arc::new(move |line: &[u8]| {
            s1.lock().unwrap().push((1, line.to_vec()));
        }));
        let s2 = seen.clone();
        set.add(Arc::new(move |line: &[u8]| {
            s2.lock().unwrap().push((2, line.to_vec()));
        }));

        assert_eq!(set.dispatch(b"^1.0"), 2);
        assert!(set.remove(first));
        assert!(!set.remove(first));
        assert_eq!(set.dispatch(b""), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(1, b"^1.0".to_vec()), (2, b"^1.0".to_vec()), (2, Vec::new())]
        );
    }

    #[test]
    fn test_closure_listener_counts() {
        let set = ListenerSet::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        set.add(Arc::new(move |_: &[u8]| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        set.dispatch(b"a");
        set.dispatch(b"b");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_channel_listener_decodes() {
        let (listener, mut rx) = ChannelListener::new();
        listener.on_line(b"zz");
        listener.on_line(b"#\x01\x02\x0330");
        let msg = rx.try_recv().unwrap();
        assert!(msg.is_button());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_listener_hands_removal_off_dispatch() {
        let set = Arc::new(ListenerSet::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let id_slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let weak = Arc::downgrade(&set);
        let counter = calls.clone();
        let slot = id_slot.clone();
        let id = set.add(Arc::new(move |_: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
            let (Some(set), Some(id)) = (weak.upgrade(), *slot.lock().unwrap()) else {
                return;
            };
            let done_tx = done_tx.clone();
            std::thread::spawn(move || {
                done_tx.send(set.remove(id)).unwrap();
            });
        }));
        *id_slot.lock().unwrap() = Some(id);

        assert_eq!(set.dispatch(b"^1.0"), 1);
        let removed = done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert!(removed);
        assert!(set.is_empty());
        assert_eq!(set.dispatch(b"^1.0"), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
