//! Order state machine (订单状态机)
//!
//! Every status change funnels through [`apply_transition`]: the permission
//! table decides whether the actor may request the move, and the repository
//! compare-and-swap decides who wins when two actors race. The loser of a
//! race gets [`ErrorCode::TransitionConflict`], never a silent overwrite.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::db::repository::{orders, restaurants};

/// Minutes added on top of the preparation estimate when a vendor confirms.
pub const DELIVERY_WINDOW_MINUTES: i64 = 30;

/// Who is asking for a status change.
///
/// The id carried by each role variant is the authenticated user id; `System`
/// is reserved for background jobs and carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    Customer(i64),
    Vendor(i64),
    Driver(i64),
    Admin(i64),
    System,
}

impl TransitionActor {
    /// Role name as recorded in `order_status_history.actor_role`.
    pub fn role_str(&self) -> &'static str {
        match self {
            Self::Customer(_) => "customer",
            Self::Vendor(_) => "vendor",
            Self::Driver(_) => "driver",
            Self::Admin(_) => "admin",
            Self::System => "system",
        }
    }

    /// User id behind the actor, if any.
    pub fn actor_id(&self) -> Option<i64> {
        match self {
            Self::Customer(id) | Self::Vendor(id) | Self::Driver(id) | Self::Admin(id) => Some(*id),
            Self::System => None,
        }
    }
}

/// Whether `from -> to` is an edge of the lifecycle graph at all,
/// regardless of who asks.
pub fn is_defined(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    // Cancellation is reachable from every non-terminal state (admin row).
    if to == Cancelled {
        return !from.is_terminal();
    }
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, PickedUp)
            | (PickedUp, EnRoute)
            | (EnRoute, Delivered)
    )
}

/// The permission table: may `actor` move an order along `from -> to`?
///
/// Ownership (the customer owns the order, the vendor owns the restaurant,
/// the driver is assigned) is checked separately; this table only answers
/// what each role may do in principle.
pub fn is_allowed(from: OrderStatus, to: OrderStatus, actor: &TransitionActor) -> bool {
    use OrderStatus::*;
    use TransitionActor::*;

    // Admins may force-cancel anything still in flight, and nothing else.
    if let Admin(_) = actor {
        return to == Cancelled && !from.is_terminal();
    }

    match (from, to) {
        (Pending, Confirmed) => matches!(actor, Vendor(_)),
        (Pending, Cancelled) => matches!(actor, Customer(_) | Vendor(_) | System),
        (Confirmed, Preparing) => matches!(actor, Vendor(_)),
        (Confirmed, Cancelled) => matches!(actor, Customer(_) | Vendor(_) | System),
        (Preparing, Ready) => matches!(actor, Vendor(_)),
        (Ready, PickedUp) => matches!(actor, Driver(_)),
        (PickedUp, EnRoute) => matches!(actor, Driver(_)),
        (EnRoute, Delivered) => matches!(actor, Driver(_)),
        _ => false,
    }
}

/// A requested status change, fully described.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub order_id: i64,
    pub to: OrderStatus,
    pub actor: TransitionActor,
    /// Stored on the order when `to` is `cancelled`.
    pub cancellation_reason: Option<String>,
    /// Honored only when `to` is `confirmed`.
    pub estimated_preparation_minutes: Option<i64>,
    /// Free-form note for the history trail.
    pub notes: Option<String>,
}

impl TransitionRequest {
    pub fn new(order_id: i64, to: OrderStatus, actor: TransitionActor) -> Self {
        Self {
            order_id,
            to,
            actor,
            cancellation_reason: None,
            estimated_preparation_minutes: None,
            notes: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.cancellation_reason = Some(reason.into());
        self
    }

    pub fn with_preparation_minutes(mut self, minutes: Option<i64>) -> Self {
        self.estimated_preparation_minutes = minutes;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Apply one status change end to end.
///
/// Checks run in a fixed order: existence, ownership, edge validity,
/// role permission. Only then does the repository CAS run; a `false` swap
/// means the stored status moved between our read and the update, which
/// surfaces as a 409 conflict. A history row is appended after every
/// successful swap.
pub async fn apply_transition(pool: &SqlitePool, req: TransitionRequest) -> AppResult<Order> {
    let now = now_millis();

    let order = orders::find_by_id(pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::order_not_found(req.order_id))?;
    let from = order.status;

    check_ownership(pool, &order, &req.actor).await?;

    if from.is_terminal() || !is_defined(from, req.to) {
        return Err(AppError::invalid_transition(from.as_str(), req.to.as_str()));
    }
    if !is_allowed(from, req.to, &req.actor) {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            format!(
                "{} may not move an order from '{}' to '{}'",
                req.actor.role_str(),
                from,
                req.to
            ),
        ));
    }

    let mut fields = orders::TransitionFields::default();
    if req.to == OrderStatus::Cancelled {
        fields.cancellation_reason = req.cancellation_reason.clone();
    }
    if req.to == OrderStatus::Confirmed {
        fields.estimated_preparation_minutes = req.estimated_preparation_minutes;
        let prep = req.estimated_preparation_minutes.unwrap_or(0);
        fields.estimated_delivery_at = Some(now + (prep + DELIVERY_WINDOW_MINUTES) * 60_000);
    }

    let swapped = orders::transition_status(pool, req.order_id, from, req.to, &fields, now).await?;
    if !swapped {
        // Someone else moved the order between our read and the swap.
        return Err(AppError::transition_conflict(req.order_id));
    }

    orders::append_history(
        pool,
        &orders::NewHistoryEntry {
            order_id: req.order_id,
            actor_id: req.actor.actor_id(),
            actor_role: req.actor.role_str().to_string(),
            from_status: Some(from),
            to_status: req.to,
            notes: req.notes.or(req.cancellation_reason),
        },
        now,
    )
    .await?;

    tracing::info!(
        order_id = req.order_id,
        from = %from,
        to = %req.to,
        actor = req.actor.role_str(),
        "order transitioned"
    );

    orders::find_by_id(pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::order_not_found(req.order_id))
}

/// Resource-level guard: the actor must stand in the right relation to the
/// order before the permission table is even consulted.
async fn check_ownership(
    pool: &SqlitePool,
    order: &Order,
    actor: &TransitionActor,
) -> AppResult<()> {
    match actor {
        TransitionActor::Customer(id) => {
            if order.customer_id != *id {
                return Err(AppError::with_message(
                    ErrorCode::NotResourceOwner,
                    "order belongs to another customer",
                ));
            }
        }
        TransitionActor::Vendor(id) => {
            let owns = restaurants::find_by_id(pool, order.restaurant_id)
                .await?
                .map(|r| r.owner_id == *id)
                .unwrap_or(false);
            if !owns {
                return Err(AppError::with_message(
                    ErrorCode::NotResourceOwner,
                    "order belongs to another restaurant",
                ));
            }
        }
        TransitionActor::Driver(id) => {
            if order.driver_id != Some(*id) {
                return Err(AppError::with_message(
                    ErrorCode::NotResourceOwner,
                    "order is not assigned to this driver",
                ));
            }
        }
        TransitionActor::Admin(_) | TransitionActor::System => {}
    }
    Ok(())
}
