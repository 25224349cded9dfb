//! In-memory [`Notifier`] implementation.

use std::sync::Arc;

use common::operations::Notify;
use tokio::sync::RwLock;
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{message, Message},
    infra::{notifier, Notifier},
};

/// In-memory [`Notifier`] recording every delivered [`Message`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Delivered [`Message`]s.
    delivered: Arc<RwLock<Vec<Message>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all the delivered [`Message`]s in the delivery order.
    pub async fn delivered(&self) -> Vec<Message> {
        self.delivered.read().await.clone()
    }
}

impl Notifier<Notify<Message>> for Memory {
    type Ok = message::DeliveryId;
    type Err = Traced<notifier::Error>;

    async fn execute(
        &self,
        Notify(msg): Notify<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        self.delivered.write().await.push(msg);
        Ok(Uuid::new_v4().to_string().into())
    }
}
