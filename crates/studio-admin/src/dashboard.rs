//! Booking and contact statistics for the dashboard
//!
//! [`aggregate`] is pure; [`Dashboard`] fetches both collections, runs it and
//! publishes the result on a watch channel so a poller and a renderer can
//! share one snapshot.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use studio_client::CrudApi;
use studio_core::{Booking, BookingStatus, Contact, ContactStatus, utils::trailing_days};
use tokio::sync::watch;
use tracing::{debug, error};

/// Length of the daily booking series
pub const TRAILING_DAYS: u64 = 7;

/// Number of bookings listed as recent
pub const RECENT_BOOKINGS: usize = 5;

/// Bookings per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// `pending`
    pub pending: usize,
    /// `confirmed`
    pub confirmed: usize,
    /// `completed`
    pub completed: usize,
    /// `cancelled`
    pub cancelled: usize,
}

impl StatusCounts {
    const fn slot(&mut self, status: BookingStatus) -> Option<&mut usize> {
        match status {
            BookingStatus::Pending => Some(&mut self.pending),
            BookingStatus::Confirmed => Some(&mut self.confirmed),
            BookingStatus::Completed => Some(&mut self.completed),
            BookingStatus::Cancelled => Some(&mut self.cancelled),
            BookingStatus::Unknown => None,
        }
    }

    /// Count for one status; values outside the workflow are not counted
    #[must_use]
    pub const fn get(&self, status: BookingStatus) -> usize {
        match status {
            BookingStatus::Pending => self.pending,
            BookingStatus::Confirmed => self.confirmed,
            BookingStatus::Completed => self.completed,
            BookingStatus::Cancelled => self.cancelled,
            BookingStatus::Unknown => 0,
        }
    }
}

/// Bookings created on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Bookings created that day
    pub count: usize,
}

/// Everything the dashboard shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// All bookings
    pub total_bookings: usize,
    /// Bookings per status
    pub status: StatusCounts,
    /// Bookings per day, oldest first, ending today
    pub last_seven_days: Vec<DailyCount>,
    /// All contact messages
    pub total_contacts: usize,
    /// Messages still marked new
    pub unread_contacts: usize,
    /// Newest bookings first
    pub recent_bookings: Vec<Booking>,
}

/// Compute the dashboard figures as of `today`
#[must_use]
pub fn aggregate(bookings: &[Booking], contacts: &[Contact], today: NaiveDate) -> DashboardSnapshot {
    let mut status = StatusCounts::default();
    for booking in bookings {
        if let Some(count) = status.slot(booking.status) {
            *count += 1;
        }
    }

    let last_seven_days = trailing_days(today, TRAILING_DAYS)
        .into_iter()
        .map(|date| DailyCount {
            date,
            count: bookings
                .iter()
                .filter(|b| b.created_at.is_some_and(|at| at.date_naive() == date))
                .count(),
        })
        .collect();

    let mut recent: Vec<&Booking> = bookings.iter().collect();
    // Undated bookings sort last
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_bookings = recent
        .into_iter()
        .take(RECENT_BOOKINGS)
        .cloned()
        .collect();

    DashboardSnapshot {
        total_bookings: bookings.len(),
        status,
        last_seven_days,
        total_contacts: contacts.len(),
        unread_contacts: contacts
            .iter()
            .filter(|c| c.status == ContactStatus::New)
            .count(),
        recent_bookings,
    }
}

/// Dashboard data source
pub struct Dashboard {
    bookings: Arc<dyn CrudApi<Booking>>,
    contacts: Arc<dyn CrudApi<Contact>>,
    snapshot: watch::Sender<DashboardSnapshot>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Dashboard over the two collections
    #[must_use]
    pub fn new(bookings: Arc<dyn CrudApi<Booking>>, contacts: Arc<dyn CrudApi<Contact>>) -> Self {
        let (snapshot, _) = watch::channel(DashboardSnapshot::default());
        Self {
            bookings,
            contacts,
            snapshot,
        }
    }

    /// Fetch both collections and recompute
    ///
    /// A collection that fails to load counts as empty.
    pub async fn refresh(&self) -> DashboardSnapshot {
        self.refresh_as_of(Utc::now().date_naive()).await
    }

    /// [`Dashboard::refresh`] with an explicit "today"
    pub async fn refresh_as_of(&self, today: NaiveDate) -> DashboardSnapshot {
        let (bookings, contacts) = futures::join!(self.bookings.get_all(), self.contacts.get_all());

        let bookings = bookings.unwrap_or_else(|e| {
            error!(error = %e, "dashboard could not load bookings");
            Vec::new()
        });
        let contacts = contacts.unwrap_or_else(|e| {
            error!(error = %e, "dashboard could not load contacts");
            Vec::new()
        });

        let snapshot = aggregate(&bookings, &contacts, today);
        debug!(
            bookings = snapshot.total_bookings,
            contacts = snapshot.total_contacts,
            "dashboard refreshed"
        );
        self.snapshot.send_replace(snapshot.clone());
        snapshot
    }

    /// Most recent snapshot
    #[must_use]
    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Be notified of every new snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.subscribe()
    }
}
