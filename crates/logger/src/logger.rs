// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler};
use cb_events::{BridgeEvent, Event, EventBus, Subscribe};
use std::marker::PhantomData;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Install a global tracing subscriber honoring `RUST_LOG`, defaulting to
/// `info`.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Bus-attached actor that logs every event for one party session.
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
        bus.do_send(Subscribe::<E>::new(
            "*".to_string(),
            addr.clone().recipient(),
        ));
        info!(party=%name, "READY!");
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

impl EventLogging for BridgeEvent {
    fn log(&self, logger_name: &str) {
        match self {
            BridgeEvent::BridgeError { .. } => error!(event=%self, "ERROR!"),
            _ => match self.get_task_id() {
                Some(task_id) => {
                    info!(me = logger_name, evt = %self, task_id = %task_id, "Event Broadcasted")
                }
                None => info!(me = logger_name, evt = %self, "Event Broadcasted"),
            },
        };
    }
}
