//! Cancellation scopes for AI calls started from a dialog.
//!
//! Each open dialog owns at most one in-flight call. Starting a new call in
//! the same dialog, or closing the dialog, cancels the previous one. A caller
//! holding a [`DialogTicket`] must check [`DialogTicket::is_cancelled`] before
//! applying a result; a cancelled call's result is discarded.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle for one call started through [`DialogRegistry::begin`].
#[derive(Debug, Clone)]
pub struct DialogTicket {
    dialog_id: Option<String>,
    generation: u64,
    token: CancellationToken,
}

impl DialogTicket {
    /// A ticket not tied to any dialog. Only cancelled by its own token.
    pub fn detached() -> Self {
        Self {
            dialog_id: None,
            generation: 0,
            token: CancellationToken::new(),
        }
    }

    pub fn dialog_id(&self) -> Option<&str> {
        self.dialog_id.as_deref()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Tracks the in-flight call of every open dialog.
#[derive(Debug, Default)]
pub struct DialogRegistry {
    inner: Mutex<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    next_generation: u64,
    open: HashMap<String, (u64, CancellationToken)>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a call in `dialog_id`, cancelling whatever that dialog had in
    /// flight. `None` gives a detached ticket.
    pub fn begin(&self, dialog_id: Option<&str>) -> DialogTicket {
        let Some(dialog_id) = dialog_id else {
            return DialogTicket::detached();
        };
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        reg.next_generation += 1;
        let generation = reg.next_generation;
        let token = CancellationToken::new();
        if let Some((_, previous)) = reg
            .open
            .insert(dialog_id.to_string(), (generation, token.clone()))
        {
            debug!("dialog {dialog_id}: superseding in-flight call");
            previous.cancel();
        }
        DialogTicket {
            dialog_id: Some(dialog_id.to_string()),
            generation,
            token,
        }
    }

    /// Close a dialog. Its in-flight call, if any, is cancelled. Returns
    /// whether anything was in flight.
    pub fn close(&self, dialog_id: &str) -> bool {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match reg.open.remove(dialog_id) {
            Some((_, token)) => {
                debug!("dialog {dialog_id}: closed, cancelling in-flight call");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Mark a call as done. The dialog entry is only removed if it still
    /// belongs to this ticket.
    pub fn finish(&self, ticket: &DialogTicket) {
        let Some(ref dialog_id) = ticket.dialog_id else {
            return;
        };
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if reg
            .open
            .get(dialog_id)
            .is_some_and(|(generation, _)| *generation == ticket.generation)
        {
            reg.open.remove(dialog_id);
        }
    }

    /// Number of dialogs with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .open
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_supersedes_the_first() {
        let reg = DialogRegistry::new();
        let first = reg.begin(Some("case-1"));
        let second = reg.begin(Some("case-1"));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(reg.in_flight(), 1);
    }

    #[test]
    fn close_cancels_in_flight_call() {
        let reg = DialogRegistry::new();
        let ticket = reg.begin(Some("d"));
        assert!(reg.close("d"));
        assert!(ticket.is_cancelled());
        assert!(!reg.close("d"));
    }

    #[test]
    fn dialogs_are_independent() {
        let reg = DialogRegistry::new();
        let a = reg.begin(Some("a"));
        let b = reg.begin(Some("b"));
        reg.close("a");
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
    }

    #[test]
    fn stale_finish_leaves_newer_call_registered() {
        let reg = DialogRegistry::new();
        let old = reg.begin(Some("d"));
        let new = reg.begin(Some("d"));
        reg.finish(&old);
        assert_eq!(reg.in_flight(), 1);
        reg.finish(&new);
        assert_eq!(reg.in_flight(), 0);
        assert!(!new.is_cancelled());
    }

    #[test]
    fn detached_tickets_are_not_tracked() {
        let reg = DialogRegistry::new();
        let ticket = reg.begin(None);
        assert!(ticket.dialog_id().is_none());
        assert_eq!(reg.in_flight(), 0);
        reg.finish(&ticket);
        assert!(!ticket.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_token_wakes_waiters() {
        let reg = DialogRegistry::new();
        let ticket = reg.begin(Some("d"));
        let token = ticket.token().clone();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        reg.close("d");
        waiter.await.unwrap();
        assert!(ticket.is_cancelled());
    }
}
