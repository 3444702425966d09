pub mod inbound_service;
pub mod notification_service;
pub mod order_service;
pub mod queue_processor;
pub mod reminder_service;

#[cfg(test)]
pub(crate) mod testing;

use crate::domain::errors::DomainError;

/// Run a synchronous repository call on the blocking pool.
pub(crate) async fn blocking<R, F, T>(repo: &R, f: F) -> Result<T, DomainError>
where
    R: Clone + Send + 'static,
    F: FnOnce(&R) -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    let repo = repo.clone();
    actix_web::web::block(move || f(&repo))
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}
