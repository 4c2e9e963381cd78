// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parkwise_domain::BookingStatus;

/// A lifecycle command against an existing booking.
///
/// Commands are the only way to request booking state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingCommand {
    /// The parking session started: `reserved -> active`.
    Activate,
    /// Record payment. Leaves status and capacity untouched.
    MarkPaid,
    /// Finish the session and give the slot back.
    Complete,
    /// Record payment, finish the session, give the slot back and book
    /// the amount as zone revenue, all in one step.
    MarkPaidAndComplete,
    /// Withdraw the booking and give the slot back.
    Cancel,
    /// The booked duration ran out without completion; give the slot back.
    Expire,
}

impl BookingCommand {
    /// Stable name used in logs and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::MarkPaid => "mark_paid",
            Self::Complete => "complete",
            Self::MarkPaidAndComplete => "mark_paid_and_complete",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
        }
    }

    /// The status this command moves a booking to, if it changes status.
    #[must_use]
    pub const fn target_status(&self) -> Option<BookingStatus> {
        match self {
            Self::Activate => Some(BookingStatus::Active),
            Self::MarkPaid => None,
            Self::Complete | Self::MarkPaidAndComplete => Some(BookingStatus::Completed),
            Self::Cancel => Some(BookingStatus::Cancelled),
            Self::Expire => Some(BookingStatus::Expired),
        }
    }

    /// True when applying the command changes the owning zone document.
    #[must_use]
    pub const fn touches_zone(&self) -> bool {
        match self.target_status() {
            Some(status) => status.is_terminal(),
            None => false,
        }
    }
}

impl std::fmt::Display for BookingCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
