// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::traits::{ErrorEvent, Event};
use actix::prelude::*;
use bloom::{BloomFilter, ASMS};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{info, trace};

/// Subscription key matching every event type
pub const ALL_EVENTS: &str = "*";

/// Off by default. Seen ids live in a bloom filter, so with deduplication on a distinct
/// event can be dropped as a false positive and repeated identical events collapse into one.
#[derive(Default)]
pub struct EventBusConfig {
    /// Drop events whose id has already been published
    pub deduplicate: bool,
}

/// Notification sink for the ledger. Actors publish events by sending them to this bus and
/// observers subscribe either to a single event type or to [`ALL_EVENTS`].
///
/// Events reach subscribers in the order the bus receives them. With deduplication on, an
/// event whose id was seen before is dropped. Seen ids live in a bloom filter sized for a
/// million events at a 0.1% false positive rate.
pub struct EventBus<E: Event> {
    config: EventBusConfig,
    seen: BloomFilter,
    listeners: HashMap<String, Vec<Recipient<E>>>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            seen: BloomFilter::with_rate(0.001, 1_000_000),
            listeners: HashMap::new(),
        }
    }

    /// Start a collector that records everything published on `source`.
    pub fn history(source: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>> {
        let collector = HistoryCollector::<E>::default().start();
        source.do_send(Subscribe::new(ALL_EVENTS, collector.clone().recipient()));
        collector
    }

    fn listeners_for<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Recipient<E>> {
        [ALL_EVENTS, event_type]
            .into_iter()
            .filter_map(|key| self.listeners.get(key))
            .flatten()
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        let id = event.event_id();
        if self.config.deduplicate && self.seen.contains(&id) {
            trace!("Dropping duplicate {}", id);
            return;
        }

        let event_type = event.event_type();
        for listener in self.listeners_for(&event_type) {
            listener.do_send(event.clone());
        }

        info!(">>> {}", event);
        self.seen.insert(&id);
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        self.listeners
            .entry(msg.event_type)
            .or_default()
            .push(msg.listener);
    }
}

/// Every event received so far, oldest first.
#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct GetEvents<E: Event>(PhantomData<E>);

impl<E: Event> GetEvents<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Event> Default for GetEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Payloads of the error events received so far.
#[derive(Message)]
#[rtype(result = "Vec<E::Error>")]
pub struct GetErrors<E: ErrorEvent>(PhantomData<E>);

impl<E: ErrorEvent> GetErrors<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: ErrorEvent> Default for GetErrors<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ResetHistory;

/// Records the events it is subscribed to so tests can inspect them.
pub struct HistoryCollector<E: Event> {
    history: Vec<E>,
}

impl<E: Event> Default for HistoryCollector<E> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
        }
    }
}

impl<E: Event> Actor for HistoryCollector<E> {
    type Context = Context<Self>;
}

impl<E: Event> Handler<E> for HistoryCollector<E> {
    type Result = ();
    fn handle(&mut self, msg: E, _: &mut Self::Context) {
        self.history.push(msg);
    }
}

impl<E: Event> Handler<GetEvents<E>> for HistoryCollector<E> {
    type Result = Vec<E>;

    fn handle(&mut self, _: GetEvents<E>, _: &mut Context<Self>) -> Vec<E> {
        self.history.clone()
    }
}

impl<E: ErrorEvent> Handler<GetErrors<E>> for HistoryCollector<E> {
    type Result = Vec<E::Error>;

    fn handle(&mut self, _: GetErrors<E>, _: &mut Context<Self>) -> Self::Result {
        self.history
            .iter()
            .filter_map(|evt| evt.as_error())
            .cloned()
            .collect()
    }
}

impl<E: Event> Handler<ResetHistory> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, _: ResetHistory, _: &mut Context<Self>) {
        self.history.clear();
    }
}

/// Bus with a collector already subscribed to every event.
pub fn new_event_bus_with_history<E: Event>() -> (Addr<EventBus<E>>, Addr<HistoryCollector<E>>) {
    let bus = EventBus::<E>::default().start();
    let history = EventBus::history(&bus);
    (bus, history)
}
