//! Outbound notification port.
//!
//! Notifications are fire-and-forget. `notify` must return without waiting
//! for delivery; callers log failures and carry on.

use std::fmt;

use crate::domain::{EmailAddress, TraceId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when handing a notification to the delivery channel.
    pub enum NotifierError {
        /// The outbound queue is at capacity.
        QueueFull => "notification queue is full",
        /// The delivery worker has stopped.
        Closed => "notification channel is closed",
        /// The delivery transport rejected the message.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Event that triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    BookingConfirmed,
    SpotReleased,
}

impl NotificationKind {
    /// Stable label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookingConfirmed => "booking_confirmed",
            Self::SpotReleased => "spot_released",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: EmailAddress,
    pub subject: String,
    pub body: String,
    /// Trace of the request that caused the message, for log correlation.
    pub trace_id: Option<TraceId>,
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Hand a notification off for delivery without waiting for it.
    fn notify(&self, notification: Notification) -> Result<(), NotifierError>;
}

/// Notifier that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifierError> {
        Ok(())
    }
}
