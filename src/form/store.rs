use crate::error::StoreError;
use crate::schema::MetadataPayload;
use std::cell::RefCell;
use std::future::Future;

/// The external persistence collaborator that receives saved metadata.
///
/// Implementations typically forward the payload to a remote update API. The form
/// never retries and never cancels a pending call.
pub trait MetadataStore {
    /// Writes `payload` for the item or package named by `identifier`.
    fn update_metadata(
        &self,
        identifier: &str,
        payload: &MetadataPayload,
    ) -> impl Future<Output = Result<(), StoreError>>;
}

/// A store that keeps every accepted payload in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    saved: RefCell<Vec<(String, MetadataPayload)>>,
    rejection: RefCell<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent updates fail with `message` until `accept_updates` is called.
    pub fn reject_updates(&self, message: impl Into<String>) {
        *self.rejection.borrow_mut() = Some(message.into());
    }

    pub fn accept_updates(&self) {
        *self.rejection.borrow_mut() = None;
    }

    /// All accepted updates, oldest first.
    pub fn saved(&self) -> Vec<(String, MetadataPayload)> {
        self.saved.borrow().clone()
    }

    pub fn last_saved(&self, identifier: &str) -> Option<MetadataPayload> {
        self.saved
            .borrow()
            .iter()
            .rev()
            .find(|(id, _)| id == identifier)
            .map(|(_, payload)| payload.clone())
    }
}

impl MetadataStore for InMemoryStore {
    async fn update_metadata(
        &self,
        identifier: &str,
        payload: &MetadataPayload,
    ) -> Result<(), StoreError> {
        if let Some(message) = self.rejection.borrow().clone() {
            return Err(StoreError::Rejected {
                identifier: identifier.to_string(),
                message,
            });
        }
        self.saved
            .borrow_mut()
            .push((identifier.to_string(), payload.clone()));
        Ok(())
    }
}
