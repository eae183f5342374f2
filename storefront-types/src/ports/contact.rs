//! Contact submission port.

use std::sync::Arc;

use crate::dto::ContactRequest;
use crate::error::SourceError;

#[async_trait::async_trait]
pub trait ContactGateway: Send + Sync + 'static {
    /// Delivers a contact message. `Ok` means the endpoint acknowledged it.
    async fn submit_contact(&self, req: ContactRequest) -> Result<(), SourceError>;
}

#[async_trait::async_trait]
impl<T: ContactGateway + ?Sized> ContactGateway for Arc<T> {
    async fn submit_contact(&self, req: ContactRequest) -> Result<(), SourceError> {
        (**self).submit_contact(req).await
    }
}
