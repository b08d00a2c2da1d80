//! Ticket repository for database operations.
//!
//! Registration and check-in are the two mutating paths of the core; both
//! push their invariants into the database. Registration runs in a
//! transaction that locks the event row so the capacity count cannot race,
//! and check-in is a single conditional update so two concurrent scans of
//! the same token cannot both succeed.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{AttendanceLogEntity, TicketEntity};
use domain::models::ticket::generate_ticket_token;

/// Attempts at inserting a fresh check-in token before failing loudly.
const TOKEN_INSERT_ATTEMPTS: usize = 3;

/// Errors surfaced by the registration path.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Event not found")]
    EventNotFound,
    #[error("Event is full")]
    CapacityExceeded,
    #[error("Already registered for this event")]
    AlreadyRegistered,
    #[error("Could not allocate a unique check-in token")]
    TokenExhausted,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by the check-in path.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Ticket not found")]
    NotFound,
    /// The ticket was already checked in; carries the existing row so the
    /// caller can report the original check-in time (first scan wins).
    #[error("Already checked in")]
    AlreadyCheckedIn(Box<TicketEntity>),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Fields for a ticket to be created.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub price_paid: Option<Decimal>,
    pub price_tier: String,
    pub payment_status: String,
    pub is_member: bool,
    pub coupon_id: Option<i64>,
}

/// Aggregate statistics for an event's tickets.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EventStats {
    pub total_members: i64,
    pub checked_in_members: i64,
    pub paid_members: i64,
    pub payment_pending: i64,
    pub attendance_logs: i64,
    pub recent_checkins: i64,
}

/// One page of tickets for an event listing.
#[derive(Debug, Clone)]
pub struct TicketPage {
    pub tickets: Vec<TicketEntity>,
    pub next_cursor: Option<(DateTime<Utc>, i64)>,
}

/// Repository for ticket-related database operations.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Creates a new TicketRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a ticket by its check-in token.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<TicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, event_id, user_id, token, price_paid, price_tier, payment_status,
                   is_member, coupon_id, checked_in, checked_in_at, joined_at
            FROM tickets
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a member's ticket for an event.
    pub async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, event_id, user_id, token, price_paid, price_tier, payment_status,
                   is_member, coupon_id, checked_in, checked_in_at, joined_at
            FROM tickets
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Count tickets for an event.
    pub async fn count_for_event(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM tickets
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    /// Register a member for an event, creating one ticket.
    ///
    /// The whole operation runs in a transaction holding a row lock on the
    /// event, so the capacity check and the insert cannot race with other
    /// registrations for the same event.
    pub async fn register(
        &self,
        event_id: Uuid,
        ticket: NewTicket,
    ) -> Result<TicketEntity, RegistrationError> {
        let mut tx = self.pool.begin().await?;

        let capacity = lock_event_capacity(&mut tx, event_id).await?;
        if let Some(capacity) = capacity {
            let count = count_in_tx(&mut tx, event_id).await?;
            if count + 1 > i64::from(capacity) {
                return Err(RegistrationError::CapacityExceeded);
            }
        }

        // Friendly pre-check; the unique index on (event_id, user_id)
        // remains the authoritative guard.
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM tickets WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(ticket.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let entity = insert_with_fresh_token(&mut tx, event_id, &ticket).await?;
        tx.commit().await?;
        Ok(entity)
    }

    /// Register several members for an event in one transaction.
    ///
    /// Members who already hold a ticket are skipped; only the remaining
    /// registrations count against capacity. Either every remaining ticket
    /// is created or none are.
    pub async fn register_bulk(
        &self,
        event_id: Uuid,
        tickets: Vec<NewTicket>,
    ) -> Result<Vec<TicketEntity>, RegistrationError> {
        let mut tx = self.pool.begin().await?;

        let capacity = lock_event_capacity(&mut tx, event_id).await?;

        let user_ids: Vec<Uuid> = tickets.iter().map(|t| t.user_id).collect();
        let existing: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM tickets WHERE event_id = $1 AND user_id = ANY($2)")
                .bind(event_id)
                .bind(&user_ids)
                .fetch_all(&mut *tx)
                .await?;
        let existing: std::collections::HashSet<Uuid> =
            existing.into_iter().map(|row| row.0).collect();

        let mut seen = std::collections::HashSet::new();
        let fresh: Vec<&NewTicket> = tickets
            .iter()
            .filter(|t| !existing.contains(&t.user_id) && seen.insert(t.user_id))
            .collect();

        if let Some(capacity) = capacity {
            let count = count_in_tx(&mut tx, event_id).await?;
            if count + fresh.len() as i64 > i64::from(capacity) {
                return Err(RegistrationError::CapacityExceeded);
            }
        }

        let mut created = Vec::with_capacity(fresh.len());
        for ticket in fresh {
            created.push(insert_with_fresh_token(&mut tx, event_id, ticket).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Check a ticket in by token and append an attendance log row.
    ///
    /// The transition is a conditional update (`WHERE checked_in = false`),
    /// so exactly one of any number of concurrent scans succeeds; the rest
    /// observe `AlreadyCheckedIn` with the original timestamp. Rejected
    /// scans do not write a log row.
    pub async fn check_in(
        &self,
        token: &str,
        scanned_by: Uuid,
        location: Option<&str>,
        device_info: Option<&str>,
    ) -> Result<(TicketEntity, AttendanceLogEntity), CheckInError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, TicketEntity>(
            r#"
            UPDATE tickets
            SET checked_in = true, checked_in_at = $2
            WHERE token = $1 AND checked_in = false
            RETURNING id, event_id, user_id, token, price_paid, price_tier, payment_status,
                      is_member, coupon_id, checked_in, checked_in_at, joined_at
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = updated else {
            // Zero rows updated: distinguish an unknown token from a
            // repeat scan.
            drop(tx);
            return match self.find_by_token(token).await? {
                Some(existing) => Err(CheckInError::AlreadyCheckedIn(Box::new(existing))),
                None => Err(CheckInError::NotFound),
            };
        };

        let log = sqlx::query_as::<_, AttendanceLogEntity>(
            r#"
            INSERT INTO attendance_logs (ticket_id, scanned_by, scan_time, location, device_info)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, ticket_id, scanned_by, scan_time, location, device_info
            "#,
        )
        .bind(ticket.id)
        .bind(scanned_by)
        .bind(ticket.checked_in_at)
        .bind(location)
        .bind(device_info)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((ticket, log))
    }

    /// List an event's tickets, newest-registration last, cursor-paginated
    /// on (joined_at, id).
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<TicketPage, sqlx::Error> {
        // Fetch one extra row to detect whether another page exists. The
        // cursor predicate is only bound when a cursor exists; a sentinel
        // timestamp would fall outside the timestamptz range Postgres
        // accepts as a parameter.
        let mut tickets = match after {
            Some((after_time, after_id)) => {
                sqlx::query_as::<_, TicketEntity>(
                    r#"
                    SELECT id, event_id, user_id, token, price_paid, price_tier, payment_status,
                           is_member, coupon_id, checked_in, checked_in_at, joined_at
                    FROM tickets
                    WHERE event_id = $1 AND (joined_at, id) > ($2, $3)
                    ORDER BY joined_at ASC, id ASC
                    LIMIT $4
                    "#,
                )
                .bind(event_id)
                .bind(after_time)
                .bind(after_id)
                .bind(limit + 1)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TicketEntity>(
                    r#"
                    SELECT id, event_id, user_id, token, price_paid, price_tier, payment_status,
                           is_member, coupon_id, checked_in, checked_in_at, joined_at
                    FROM tickets
                    WHERE event_id = $1
                    ORDER BY joined_at ASC, id ASC
                    LIMIT $2
                    "#,
                )
                .bind(event_id)
                .bind(limit + 1)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let next_cursor = if tickets.len() as i64 > limit {
            tickets.truncate(limit as usize);
            tickets.last().map(|t| (t.joined_at, t.id))
        } else {
            None
        };

        Ok(TicketPage {
            tickets,
            next_cursor,
        })
    }

    /// Aggregate ticket and attendance statistics for an event.
    pub async fn get_event_stats(&self, event_id: Uuid) -> Result<EventStats, sqlx::Error> {
        let ticket_stats: (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE checked_in) as checked_in,
                COUNT(*) FILTER (WHERE price_paid > 0) as paid,
                COUNT(*) FILTER (WHERE payment_status = 'pending') as pending
            FROM tickets
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        let log_stats: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE al.scan_time >= $2) as recent
            FROM attendance_logs al
            JOIN tickets t ON t.id = al.ticket_id
            WHERE t.event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(Utc::now() - Duration::hours(24))
        .fetch_one(&self.pool)
        .await?;

        Ok(EventStats {
            total_members: ticket_stats.0,
            checked_in_members: ticket_stats.1,
            paid_members: ticket_stats.2,
            payment_pending: ticket_stats.3,
            attendance_logs: log_stats.0,
            recent_checkins: log_stats.1,
        })
    }
}

/// Lock the event row and return its capacity (None means unlimited).
async fn lock_event_capacity(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<i32>, RegistrationError> {
    let row: Option<(Option<i32>,)> =
        sqlx::query_as("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await?;
    row.map(|r| r.0).ok_or(RegistrationError::EventNotFound)
}

async fn count_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count.0)
}

/// Insert a ticket, generating a fresh token on each attempt.
///
/// A token collision is absorbed by `ON CONFLICT (token) DO NOTHING` (no
/// row returned) and retried up to the attempt bound; exhaustion is a loud
/// error rather than a silent assumption of uniqueness.
async fn insert_with_fresh_token(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    ticket: &NewTicket,
) -> Result<TicketEntity, RegistrationError> {
    for _ in 0..TOKEN_INSERT_ATTEMPTS {
        let token = generate_ticket_token();
        let inserted = sqlx::query_as::<_, TicketEntity>(
            r#"
            INSERT INTO tickets (event_id, user_id, token, price_paid, price_tier,
                                 payment_status, is_member, coupon_id, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (token) DO NOTHING
            RETURNING id, event_id, user_id, token, price_paid, price_tier, payment_status,
                      is_member, coupon_id, checked_in, checked_in_at, joined_at
            "#,
        )
        .bind(event_id)
        .bind(ticket.user_id)
        .bind(&token)
        .bind(ticket.price_paid)
        .bind(&ticket.price_tier)
        .bind(&ticket.payment_status)
        .bind(ticket.is_member)
        .bind(ticket.coupon_id)
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await?;

        match inserted {
            Some(entity) => return Ok(entity),
            None => {
                tracing::warn!(event_id = %event_id, "check-in token collision, retrying");
                continue;
            }
        }
    }
    Err(RegistrationError::TokenExhausted)
}
