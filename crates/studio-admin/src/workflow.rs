//! Status changes for bookings and contact messages
//!
//! Any status may be written over any other; [`BookingStatus::conventional_next`]
//! is only a hint for what to offer first. A successful change is announced
//! on the [`EventBus`].

use crate::error::{AdminError, AdminResult};
use crate::events::{AdminEvent, EventBus};
use crate::store::CollectionStore;
use std::collections::BTreeMap;
use studio_client::CrudApi;
use studio_core::{Booking, BookingStatus, Contact, ContactStatus};

impl CollectionStore<Booking> {
    /// Overwrite the status of booking `id` and publish `bookingUpdated`
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] for an unknown id or the backend
    /// failure; nothing is published on error.
    pub async fn set_status<A>(
        &mut self,
        api: &A,
        events: &EventBus,
        id: &str,
        status: BookingStatus,
    ) -> AdminResult<Booking>
    where
        A: CrudApi<Booking> + ?Sized,
    {
        let mut booking = self
            .find(id)
            .cloned()
            .ok_or_else(|| AdminError::missing("booking", id))?;
        booking.status = status;

        let updated = self.update(api, id, booking).await?;
        events.publish(AdminEvent::BookingUpdated { id: id.to_string() });
        Ok(updated)
    }

    /// Number of bookings in each workflow status; absent statuses count zero
    #[must_use]
    pub fn count_by_status(&self) -> BTreeMap<BookingStatus, usize> {
        let mut counts: BTreeMap<_, _> = BookingStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for booking in self.items() {
            if let Some(count) = counts.get_mut(&booking.status) {
                *count += 1;
            }
        }
        counts
    }

    /// Bookings currently in `status`
    pub fn with_status(&self, status: BookingStatus) -> impl Iterator<Item = &Booking> {
        self.items().iter().filter(move |b| b.status == status)
    }
}

impl CollectionStore<Contact> {
    /// Overwrite the status of contact `id` and publish `contactUpdated`
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] for an unknown id or the backend
    /// failure.
    pub async fn set_status<A>(
        &mut self,
        api: &A,
        events: &EventBus,
        id: &str,
        status: ContactStatus,
    ) -> AdminResult<Contact>
    where
        A: CrudApi<Contact> + ?Sized,
    {
        let mut contact = self
            .find(id)
            .cloned()
            .ok_or_else(|| AdminError::missing("contact", id))?;
        contact.status = status;

        let updated = self.update(api, id, contact).await?;
        events.publish(AdminEvent::ContactUpdated { id: id.to_string() });
        Ok(updated)
    }

    /// Messages still marked new
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items()
            .iter()
            .filter(|c| c.status == ContactStatus::New)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: Some(id.to_string()),
            name: format!("Client {id}"),
            status,
            ..Booking::default()
        }
    }

    #[test]
    fn test_count_by_status_includes_zeroes() {
        let mut store = CollectionStore::<Booking>::default();
        store.set_items(vec![
            booking("b1", BookingStatus::Pending),
            booking("b2", BookingStatus::Pending),
            booking("b3", BookingStatus::Cancelled),
        ]);

        let counts = store.count_by_status();
        assert_eq!(counts[&BookingStatus::Pending], 2);
        assert_eq!(counts[&BookingStatus::Confirmed], 0);
        assert_eq!(counts[&BookingStatus::Cancelled], 1);
        assert_eq!(store.with_status(BookingStatus::Pending).count(), 2);
    }

    #[test]
    fn test_unread_count() {
        let mut store = CollectionStore::<Contact>::default();
        store.set_items(vec![
            Contact {
                id: Some("c1".to_string()),
                status: ContactStatus::New,
                ..Contact::default()
            },
            Contact {
                id: Some("c2".to_string()),
                status: ContactStatus::Replied,
                ..Contact::default()
            },
        ]);

        assert_eq!(store.unread_count(), 1);
    }
}
