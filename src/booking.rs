//! Booking status workflow and badges.
//!
//! ```text
//! pending ──► confirmed ──► completed
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//! The professional confirms and completes. Either party may cancel.
//! `completed` and `cancelled` are terminal.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Which side of the booking is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingParty {
    Client,
    Professional,
}

impl BookingParty {
    /// The party `user_id` plays in `booking`, if any.
    pub fn of(booking: &Booking, user_id: &Uuid) -> Option<Self> {
        if &booking.professional_id == user_id {
            Some(Self::Professional)
        } else if &booking.client_id == user_id {
            Some(Self::Client)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("A {from} booking cannot become {to}")]
    NotAllowed {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("Only the professional can mark a booking {0}")]
    ProfessionalOnly(BookingStatus),
}

pub fn is_terminal(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Completed | BookingStatus::Cancelled)
}

/// Statuses reachable from `from` by anyone.
pub fn next_statuses(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
        BookingStatus::Confirmed => &[BookingStatus::Completed, BookingStatus::Cancelled],
        BookingStatus::Completed | BookingStatus::Cancelled => &[],
    }
}

/// Check a transition requested by `party`.
pub fn check_transition(
    party: BookingParty,
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), TransitionError> {
    if !next_statuses(from).contains(&to) {
        return Err(TransitionError::NotAllowed { from, to });
    }
    match (party, to) {
        (BookingParty::Client, BookingStatus::Confirmed | BookingStatus::Completed) => {
            Err(TransitionError::ProfessionalOnly(to))
        }
        _ => Ok(()),
    }
}

/// Actions `party` may take on a booking in `status`.
pub fn available_actions(party: BookingParty, status: BookingStatus) -> Vec<BookingStatus> {
    next_statuses(status)
        .iter()
        .copied()
        .filter(|&to| check_transition(party, status, to).is_ok())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Yellow,
    Blue,
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: BadgeTone,
}

pub fn status_badge(status: BookingStatus) -> StatusBadge {
    let (label, tone) = match status {
        BookingStatus::Pending => ("Pending", BadgeTone::Yellow),
        BookingStatus::Confirmed => ("Confirmed", BadgeTone::Blue),
        BookingStatus::Completed => ("Completed", BadgeTone::Green),
        BookingStatus::Cancelled => ("Cancelled", BadgeTone::Red),
    };
    StatusBadge { label, tone }
}

/// Booking as rendered in a list: the row, its badge and the actions the
/// viewer may take.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub badge: StatusBadge,
    pub actions: Vec<BookingStatus>,
}

impl BookingView {
    pub fn for_party(booking: Booking, party: BookingParty) -> Self {
        Self {
            badge: status_badge(booking.status),
            actions: available_actions(party, booking.status),
            booking,
        }
    }
}
