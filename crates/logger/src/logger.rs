// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler};
use adm_events::{AdmEvent, ErrorEvent, Event, EventBus, Subscribe, ALL_EVENTS};
use std::marker::PhantomData;
use tracing::{error, info};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Writes every event published on the bus to the tracing output
pub struct SimpleLogger<E: EventLogging> {
    name: String,
    _p: PhantomData<E>,
}

impl<E: EventLogging> SimpleLogger<E> {
    pub fn attach(name: &str, bus: Addr<EventBus<E>>) -> Addr<Self> {
        let addr = Self {
            name: name.to_owned(),
            _p: PhantomData,
        }
        .start();
        bus.do_send(Subscribe::<E>::new(ALL_EVENTS, addr.clone().recipient()));
        info!(node=%name, "READY!");
        addr
    }
}

impl<E: EventLogging> Actor for SimpleLogger<E> {
    type Context = Context<Self>;
}

impl<E: EventLogging> Handler<E> for SimpleLogger<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) -> Self::Result {
        msg.log(&self.name);
    }
}

impl EventLogging for AdmEvent {
    fn log(&self, logger_name: &str) {
        if let Some(err) = self.as_error() {
            error!(me = logger_name, err_type = ?err.err_type, "{}", err.message);
            return;
        }

        match self.get_record_id() {
            Some(record_id) => {
                info!(me = logger_name, evt = %self, record_id = %record_id, "Event Broadcasted")
            }
            None => info!(me = logger_name, evt = %self, "Event Broadcasted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_events::{
        new_event_bus_with_history, AdmErrorType, GetEvents, RecordDecrypted, RecordId, TestEvent,
    };

    #[actix::test]
    async fn test_logger_receives_bus_events() -> anyhow::Result<()> {
        let (bus, history) = new_event_bus_with_history::<AdmEvent>();
        let logger = SimpleLogger::<AdmEvent>::attach("test", bus.clone());

        bus.send(AdmEvent::from(TestEvent::new("hello", 1))).await?;
        bus.send(AdmEvent::from(RecordDecrypted {
            record_id: RecordId(1),
        }))
        .await?;
        bus.send(AdmEvent::from_error(
            AdmErrorType::Security,
            anyhow::anyhow!("forged proof"),
        ))
        .await?;

        assert_eq!(history.send(GetEvents::new()).await?.len(), 3);
        assert!(logger.connected());
        Ok(())
    }
}
