//! In-memory [`Storage`] implementation.

use std::sync::Arc;

use common::operations::Upload;
use tokio::sync::RwLock;
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::media,
    infra::{storage, Storage},
};

/// In-memory [`Storage`] keeping uploaded objects in a process memory.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored objects along with their [`media::Reference`]s.
    objects: Arc<RwLock<Vec<(media::Reference, storage::Object)>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns [`media::Reference`]s of all the stored objects in the order
    /// they were uploaded.
    pub async fn references(&self) -> Vec<media::Reference> {
        self.objects
            .read()
            .await
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }
}

impl Storage<Upload<storage::Object>> for Memory {
    type Ok = media::Reference;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Upload(object): Upload<storage::Object>,
    ) -> Result<Self::Ok, Self::Err> {
        let reference = media::Reference::new(format!(
            "memory://{}/{}",
            object.namespace,
            Uuid::new_v4().simple(),
        ));
        self.objects.write().await.push((reference.clone(), object));
        Ok(reference)
    }
}
