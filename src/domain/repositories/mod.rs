//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: access to the per-aggregate repositories
//! - `DomainResult`: result type of every store and service call

use super::event::EventRepository;
use super::reservation::ReservationRepository;
use super::user::UserRepositoryInterface;
use crate::shared::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Services receive an `Arc<dyn RepositoryProvider>` at construction and
/// request only the store they need:
///
/// ```ignore
/// let event = repos.events().get("evt-1").await?;
/// let active = repos.reservations().count_where("evt-1", &ReservationStatus::ACTIVE).await?;
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn events(&self) -> &dyn EventRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn users(&self) -> &dyn UserRepositoryInterface;
}
