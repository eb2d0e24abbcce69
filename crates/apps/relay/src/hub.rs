//! Fan-out of relayed frames to every open session.

use std::sync::Arc;

use streaming::{encode, ProtocolError, ServerMessage};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A frame on its way to the other sessions. Encoded once, shared by all.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub from: Uuid,
    pub text: Arc<str>,
}

pub struct Hub {
    tx: broadcast::Sender<Relayed>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Registers a session. Frames published before this call are not seen.
    pub fn join(&self) -> broadcast::Receiver<Relayed> {
        self.tx.subscribe()
    }

    /// Broadcasts `msg` on behalf of session `from`; returns how many
    /// sessions (including the sender) were reached.
    pub fn publish(&self, from: Uuid, msg: &ServerMessage) -> Result<usize, ProtocolError> {
        let text: Arc<str> = encode(msg)?.into();
        // No receivers just means nobody is listening.
        Ok(self.tx.send(Relayed { from, text }).unwrap_or(0))
    }

    pub fn sessions(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn publish_reaches_every_joined_session() {
        let hub = Hub::new(8);
        let a = Uuid::new_v4();
        let mut rx_a = hub.join();
        let mut rx_b = hub.join();
        assert_eq!(hub.sessions(), 2);

        assert_eq!(hub.publish(a, &ServerMessage::ResetView).unwrap(), 2);

        let got = rx_b.try_recv().unwrap();
        assert_eq!(got.from, a);
        assert_eq!(&*got.text, r#"{"event":"resetView"}"#);
        // The sender sees its own frame and filters it by id.
        assert_eq!(rx_a.try_recv().unwrap().from, a);
    }

    #[test]
    fn publish_without_sessions_is_not_an_error() {
        let hub = Hub::new(8);
        assert_eq!(hub.publish(Uuid::new_v4(), &ServerMessage::StartCounting).unwrap(), 0);
    }

    #[test]
    fn late_joiner_gets_no_history() {
        let hub = Hub::new(8);
        let _keep = hub.join();
        hub.publish(Uuid::new_v4(), &ServerMessage::ResetView).unwrap();

        let mut late = hub.join();
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn slow_session_skips_instead_of_blocking() {
        let hub = Hub::new(2);
        let mut slow = hub.join();
        let from = Uuid::new_v4();
        for _ in 0..5 {
            hub.publish(from, &ServerMessage::ResetView).unwrap();
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(3))));
        assert!(slow.recv().await.is_ok());
    }
}
