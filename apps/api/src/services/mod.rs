//! Service layer.
//!
//! Services compose the repositories, the credential store and the token
//! issuer, and enforce the rules that span more than one table. Every public
//! operation runs under the configured deadline.

pub mod auth_service;
pub mod inventory_service;

pub use auth_service::{AuthService, LoginOutcome};
pub use inventory_service::InventoryService;

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceResult;

/// Runs `fut` under `deadline`; expiry drops the future (rolling back any
/// open transaction) and yields `StorageUnavailable`.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    tokio::time::timeout(deadline, fut).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ServiceError};

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let ok = with_deadline(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: ServiceResult<()> = with_deadline(Duration::from_secs(1), async {
            Err(ServiceError::not_found("Product", 3))
        })
        .await;
        assert_eq!(err.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let result: ServiceResult<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::StorageUnavailable);
    }
}
