//! Login → game credential handoff.
//!
//! Each game server owns a bounded queue drained by an intake task that
//! deposits into its [`CredentialLedger`]. The login server holds a
//! [`CertSender`] per game server (collected in a [`CertRouter`]) and never
//! touches a ledger directly.
//!
//! ```text
//! login handler ──deliver()──→ [ mpsc, bounded ] ──→ intake task ──deposit()──→ ledger
//!       ↑                                                  │
//!       └──────────────── oneshot ack ─────────────────────┘
//! ```
//!
//! `deliver` does not block on a full queue: it fails with
//! [`DeliveryError::ChannelFull`]. It does wait for the ack, so once it
//! returns `Ok` the credential is claimable on the game server.

use std::collections::HashMap;
use std::sync::Arc;

use mir_protocol::ServerId;
use tokio::sync::{mpsc, oneshot};

use crate::{Credential, CredentialLedger, DeliveryError, HandoffConfig, SessionError};

/// One queued deposit plus the channel its outcome goes back on.
#[derive(Debug)]
struct Delivery {
    credential: Credential,
    ack: oneshot::Sender<Result<(), SessionError>>,
}

/// The login server's handle to one game server's handoff queue.
///
/// Cheap to clone: it's an `mpsc::Sender` wrapper.
#[derive(Debug, Clone)]
pub struct CertSender {
    server_id: ServerId,
    sender: mpsc::Sender<Delivery>,
}

impl CertSender {
    /// The game server this sender delivers to.
    pub fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Enqueues a credential and waits until the game server has stored it.
    ///
    /// # Errors
    /// - [`DeliveryError::ChannelFull`]: the queue is at capacity
    /// - [`DeliveryError::Unreachable`]: the intake task is gone
    /// - [`DeliveryError::Rejected`]: the ledger refused the credential
    pub async fn deliver(&self, credential: Credential) -> Result<(), DeliveryError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let delivery = Delivery {
            credential,
            ack: ack_tx,
        };

        self.sender.try_send(delivery).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::ChannelFull(self.server_id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Unreachable(self.server_id),
        })?;

        ack_rx
            .await
            .map_err(|_| DeliveryError::Unreachable(self.server_id))?
            .map_err(|e| DeliveryError::Rejected(self.server_id, e))
    }
}

/// The game server's end of the handoff queue.
///
/// Consumed by [`CertIntake::run`], usually via [`spawn_intake`].
#[derive(Debug)]
pub struct CertIntake {
    ledger: Arc<CredentialLedger>,
    receiver: mpsc::Receiver<Delivery>,
}

impl CertIntake {
    /// Drains the queue into the ledger until every sender is dropped.
    pub async fn run(mut self) {
        let server_id = self.ledger.server_id();
        tracing::debug!(%server_id, "credential intake started");

        while let Some(Delivery { credential, ack }) = self.receiver.recv().await {
            let result = self.ledger.deposit(credential).await;
            // The login handler may have gone away; nothing to do then.
            let _ = ack.send(result);
        }

        tracing::debug!(%server_id, "credential intake stopped");
    }
}

/// Creates a handoff queue in front of `ledger` without starting the intake.
pub fn channel(ledger: Arc<CredentialLedger>, capacity: usize) -> (CertSender, CertIntake) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let cert_sender = CertSender {
        server_id: ledger.server_id(),
        sender,
    };
    (cert_sender, CertIntake { ledger, receiver })
}

/// Creates a handoff queue in front of `ledger` and spawns its intake task.
pub fn spawn_intake(ledger: Arc<CredentialLedger>, config: &HandoffConfig) -> CertSender {
    let (sender, intake) = channel(ledger, config.capacity);
    tokio::spawn(intake.run());
    sender
}

/// The login server's routing table: one [`CertSender`] per game server.
#[derive(Debug, Clone, Default)]
pub struct CertRouter {
    routes: HashMap<ServerId, CertSender>,
}

impl CertRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route, replacing any previous one for the same server.
    ///
    /// Returns `true` if a route was replaced.
    pub fn add_route(&mut self, sender: CertSender) -> bool {
        self.routes.insert(sender.server_id(), sender).is_some()
    }

    /// Delivers a credential to the server it was issued for.
    ///
    /// A missing route is reported as [`DeliveryError::Unreachable`].
    pub async fn deliver(&self, credential: Credential) -> Result<(), DeliveryError> {
        let server_id = credential.server_id;
        let sender = self
            .routes
            .get(&server_id)
            .ok_or(DeliveryError::Unreachable(server_id))?;
        sender.deliver(credential).await
    }
}
