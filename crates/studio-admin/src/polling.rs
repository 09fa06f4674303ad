//! Background refresh loops
//!
//! A [`Poller`] runs a refresh on a fixed period, optionally only while its
//! page is visible and additionally whenever a matching [`AdminEvent`] is
//! published. Every loop is owned by a [`PollHandle`]; dropping the handle
//! cancels the loop, including a refresh that is still in flight, so no
//! result is applied after the owner has gone away.

use crate::dashboard::Dashboard;
use crate::events::{AdminEvent, EventBus};
use crate::store::CollectionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use studio_client::CrudApi;
use studio_core::Resource;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Whether the page owning a poller is on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Shown; timers run
    #[default]
    Visible,
    /// Hidden; timers pause
    Hidden,
}

/// Why a refresh is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Period elapsed (the first tick fires immediately)
    Tick,
    /// The page became visible again
    Visible,
    /// A matching event was published
    Event(AdminEvent),
}

type EventFilter = Box<dyn Fn(&AdminEvent) -> bool + Send + Sync>;

struct EventFeed {
    receiver: broadcast::Receiver<AdminEvent>,
    filter: EventFilter,
}

/// Builder for a refresh loop
pub struct Poller {
    period: Duration,
    visibility: Option<watch::Receiver<Visibility>>,
    events: Option<EventFeed>,
    token: CancellationToken,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("period", &self.period)
            .field("gated", &self.visibility.is_some())
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Refresh every `period`
    #[must_use]
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            visibility: None,
            events: None,
            token: CancellationToken::new(),
        }
    }

    /// Pause the timer while `visibility` reads hidden; becoming visible
    /// refreshes at once and restarts the period
    #[must_use]
    pub fn gated_on(mut self, visibility: watch::Receiver<Visibility>) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Also refresh on every event accepted by `filter`
    #[must_use]
    pub fn triggered_by<F>(mut self, receiver: broadcast::Receiver<AdminEvent>, filter: F) -> Self
    where
        F: Fn(&AdminEvent) -> bool + Send + Sync + 'static,
    {
        self.events = Some(EventFeed {
            receiver,
            filter: Box::new(filter),
        });
        self
    }

    /// Stop together with `parent`
    #[must_use]
    pub fn scoped_to(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    /// Start the loop on the current runtime
    pub fn spawn<F, Fut>(self, refresh: F) -> PollHandle
    where
        F: FnMut(Trigger) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        let task = tokio::spawn(self.run(refresh));
        PollHandle {
            token,
            task: Some(task),
        }
    }

    async fn run<F, Fut>(self, mut refresh: F)
    where
        F: FnMut(Trigger) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Self {
            period,
            mut visibility,
            mut events,
            token,
        } = self;

        let mut visible = visibility
            .as_ref()
            .is_none_or(|rx| *rx.borrow() == Visibility::Visible);
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick(), if visible => Trigger::Tick,
                change = visibility_change(&mut visibility) => {
                    let Some(now) = change else {
                        // Sender gone: keep the last known state
                        visibility = None;
                        continue;
                    };
                    let was_visible = std::mem::replace(&mut visible, now == Visibility::Visible);
                    if !visible || was_visible {
                        continue;
                    }
                    interval.reset();
                    Trigger::Visible
                }
                event = next_event(&mut events) => match event {
                    Some(event) => Trigger::Event(event),
                    None => {
                        events = None;
                        continue;
                    }
                },
            };

            trace!(?trigger, "poller refreshing");
            tokio::select! {
                () = token.cancelled() => break,
                () = refresh(trigger) => {}
            }
        }

        debug!("poller stopped");
    }
}

async fn visibility_change(rx: &mut Option<watch::Receiver<Visibility>>) -> Option<Visibility> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn next_event(feed: &mut Option<EventFeed>) -> Option<AdminEvent> {
    let Some(feed) = feed else {
        return std::future::pending().await;
    };
    loop {
        match feed.receiver.recv().await {
            Ok(event) if (feed.filter)(&event) => return Some(event),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "poller lagged behind events");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Owner of a running poller; dropping it stops the loop
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop the loop, abandoning any refresh in flight
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the loop has been told to stop
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the loop and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            debug!(error = %e, "poller task ended abnormally");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Reload `store` from `api` every `period`
pub fn spawn_collection_poller<T, A>(
    store: Arc<Mutex<CollectionStore<T>>>,
    api: Arc<A>,
    period: Duration,
) -> PollHandle
where
    T: Resource,
    A: CrudApi<T> + ?Sized + 'static,
{
    Poller::every(period).spawn(move |_| {
        let store = Arc::clone(&store);
        let api = Arc::clone(&api);
        async move {
            store.lock().await.load(api.as_ref()).await;
        }
    })
}

/// Refresh `dashboard` on its period while visible and on every event
pub fn spawn_dashboard_poller(
    dashboard: Arc<Dashboard>,
    period: Duration,
    visibility: watch::Receiver<Visibility>,
    events: &EventBus,
) -> PollHandle {
    Poller::every(period)
        .gated_on(visibility)
        .triggered_by(events.subscribe(), |_| true)
        .spawn(move |_| {
            let dashboard = Arc::clone(&dashboard);
            async move {
                dashboard.refresh().await;
            }
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<AtomicUsize>, impl FnMut(Trigger) -> std::future::Ready<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_period() {
        let (count, refresh) = counting();
        let _handle = Poller::every(Duration::from_secs(30)).spawn(refresh);

        time::sleep(Duration::from_secs(65)).await;

        // t = 0, 30, 60
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_pauses_and_visible_refreshes_immediately() {
        let (tx, rx) = watch::channel(Visibility::Hidden);
        let (count, refresh) = counting();
        let _handle = Poller::every(Duration::from_secs(60)).gated_on(rx).spawn(refresh);

        time::sleep(Duration::from_secs(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tx.send(Visibility::Visible).unwrap();
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Period restarts from the visibility change
        time::sleep(Duration::from_secs(58)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tx.send(Visibility::Hidden).unwrap();
        time::sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let (count, refresh) = counting();
        let handle = Poller::every(Duration::from_secs(30)).spawn(refresh);

        time::sleep(Duration::from_secs(1)).await;
        drop(handle);
        time::sleep(Duration::from_secs(120)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_in_flight_is_abandoned() {
        let finished = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&finished);
        let handle = Poller::every(Duration::from_secs(30)).spawn(move |_| {
            let seen = Arc::clone(&seen);
            async move {
                time::sleep(Duration::from_secs(10)).await;
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_secs(1)).await;
        handle.shutdown().await;
        time::sleep(Duration::from_secs(60)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_events_trigger_refresh() {
        let bus = EventBus::default();
        let triggers = Arc::new(recorder::Recorder::default());
        let log = Arc::clone(&triggers);
        let _handle = Poller::every(Duration::from_secs(3600))
            .triggered_by(bus.subscribe(), |e| matches!(e, AdminEvent::BookingUpdated { .. }))
            .spawn(move |trigger| {
                log.push(trigger);
                std::future::ready(())
            });

        time::sleep(Duration::from_millis(10)).await;
        bus.publish(AdminEvent::ContactUpdated { id: "c1".to_string() });
        bus.publish(AdminEvent::BookingUpdated { id: "b1".to_string() });
        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            triggers.take(),
            vec![
                Trigger::Tick,
                Trigger::Event(AdminEvent::BookingUpdated { id: "b1".to_string() })
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoped_poller_stops_with_parent() {
        let parent = CancellationToken::new();
        let (count, refresh) = counting();
        let handle = Poller::every(Duration::from_secs(30))
            .scoped_to(&parent)
            .spawn(refresh);

        time::sleep(Duration::from_secs(1)).await;
        parent.cancel();
        time::sleep(Duration::from_secs(90)).await;

        assert!(handle.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    mod recorder {
        use super::Trigger;
        use std::sync::Mutex;

        #[derive(Default)]
        pub struct Recorder(Mutex<Vec<Trigger>>);

        impl Recorder {
            pub fn push(&self, trigger: Trigger) {
                self.0.lock().unwrap().push(trigger);
            }

            pub fn take(&self) -> Vec<Trigger> {
                std::mem::take(&mut *self.0.lock().unwrap())
            }
        }
    }
}
