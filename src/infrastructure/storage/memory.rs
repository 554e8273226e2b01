//! In-memory repositories for development and testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, Event, EventFilter, EventPatch, EventRepository,
    EventStatus, GetUserDto, NewEvent, NewReservation, RepositoryProvider, Reservation,
    ReservationFilter, ReservationRepository, ReservationStatus, UpdateUserDto, User,
    UserRepositoryInterface,
};
use crate::shared::{validate_pagination, PaginatedResult};

// ── Events ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: DashMap<String, Event>,
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, new: NewEvent) -> DomainResult<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            location: new.location,
            date: new.date,
            capacity: new.capacity,
            status: new.status,
            image: new.image,
            created_at: now,
            updated_at: now,
        };
        self.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Event>> {
        Ok(self.events.get(id).map(|e| e.clone()))
    }

    async fn list(&self, filter: EventFilter) -> DomainResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(events)
    }

    async fn update(&self, id: &str, patch: EventPatch) -> DomainResult<Option<Event>> {
        let Some(mut entry) = self.events.get_mut(id) else {
            return Ok(None);
        };
        patch.apply_to(entry.value_mut(), Utc::now());
        Ok(Some(entry.clone()))
    }

    async fn update_status_if(
        &self,
        id: &str,
        from: EventStatus,
        to: EventStatus,
    ) -> DomainResult<Option<Event>> {
        let Some(mut entry) = self.events.get_mut(id) else {
            return Ok(None);
        };
        if entry.status != from {
            return Ok(None);
        }
        entry.status = to;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        Ok(self.events.remove(id).is_some())
    }
}

// ── Reservations ───────────────────────────────────────────────

/// Keeps a `(event_id, user_id)` index of non-canceled reservations so that
/// a second one for the same pair is rejected on insert.
#[derive(Default)]
pub struct InMemoryReservationRepository {
    reservations: DashMap<String, Reservation>,
    open_pairs: DashMap<(String, String), String>,
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, new: NewReservation) -> DomainResult<Reservation> {
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            event_id: new.event_id,
            user_id: new.user_id,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        if reservation.status != ReservationStatus::Canceled {
            let key = (reservation.event_id.clone(), reservation.user_id.clone());
            match self.open_pairs.entry(key) {
                Entry::Occupied(_) => {
                    return Err(DomainError::DuplicateReservation {
                        event_id: reservation.event_id,
                        user_id: reservation.user_id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(reservation.id.clone());
                }
            }
        }

        self.reservations
            .insert(reservation.id.clone(), reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn count_where(
        &self,
        event_id: &str,
        statuses: &[ReservationStatus],
    ) -> DomainResult<u64> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.event_id == event_id && statuses.contains(&r.status))
            .count() as u64)
    }

    async fn find_one(
        &self,
        event_id: &str,
        user_id: &str,
        exclude: &[ReservationStatus],
    ) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id && !exclude.contains(&r.status))
            .map(|r| r.value().clone()))
    }

    async fn list(&self, filter: ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let mut items: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> DomainResult<Option<Reservation>> {
        let Some(mut entry) = self.reservations.get_mut(id) else {
            return Ok(None);
        };
        self.set_status(entry.value_mut(), status)?;
        Ok(Some(entry.clone()))
    }

    async fn update_status_if(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<Option<Reservation>> {
        let Some(mut entry) = self.reservations.get_mut(id) else {
            return Ok(None);
        };
        if entry.status != from {
            return Ok(None);
        }
        self.set_status(entry.value_mut(), to)?;
        Ok(Some(entry.clone()))
    }
}

impl InMemoryReservationRepository {
    /// Caller holds the entry's shard lock.
    fn set_status(&self, entry: &mut Reservation, status: ReservationStatus) -> DomainResult<()> {
        let key = (entry.event_id.clone(), entry.user_id.clone());
        let was_open = entry.status != ReservationStatus::Canceled;
        let is_open = status != ReservationStatus::Canceled;

        if !was_open && is_open {
            match self.open_pairs.entry(key) {
                Entry::Occupied(_) => {
                    return Err(DomainError::DuplicateReservation {
                        event_id: entry.event_id.clone(),
                        user_id: entry.user_id.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry.id.clone());
                }
            }
        } else if was_open && !is_open {
            self.open_pairs.remove(&key);
        }

        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }
}

// ── Users ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.users.iter().any(|u| {
            u.email.eq_ignore_ascii_case(email) && Some(u.id.as_str()) != except_id
        })
    }
}

#[async_trait]
impl UserRepositoryInterface for InMemoryUserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        if self.email_taken(&dto.email, None) {
            return Err(DomainError::Conflict("Email already exists".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name: dto.full_name,
            email: dto.email,
            password_hash: dto.password_hash,
            role: dto.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let (page, limit) = validate_pagination(dto.page, dto.page_size);
        let search = dto.search.map(|s| s.to_lowercase());

        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| dto.role.map_or(true, |r| u.role == r))
            .filter(|u| {
                search.as_deref().map_or(true, |s| {
                    u.full_name.to_lowercase().contains(s) || u.email.to_lowercase().contains(s)
                })
            })
            .map(|u| u.value().clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = users.len() as u64;
        let items = users
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(PaginatedResult::new(items, total, page, limit))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn count_users(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        if let Some(email) = dto.email.as_deref() {
            if self.email_taken(email, Some(id)) {
                return Err(DomainError::Conflict("Email already exists".into()));
            }
        }
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(v) = dto.full_name {
            user.full_name = v;
        }
        if let Some(v) = dto.email {
            user.email = v;
        }
        if let Some(v) = dto.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = dto.role {
            user.role = v;
        }
        if let Some(v) = dto.is_active {
            user.is_active = v;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

// ── Provider ───────────────────────────────────────────────────

/// All in-memory stores behind one [`RepositoryProvider`].
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    events: InMemoryEventRepository,
    reservations: InMemoryReservationRepository,
    users: InMemoryUserRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn events(&self) -> &dyn EventRepository {
        &self.events
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepositoryInterface {
        &self.users
    }
}
