// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod bridge_error;
mod die;
mod record_anchored;
mod shutdown;
mod task_created;
mod task_completed;
mod task_declined;
mod task_progress;
mod task_published;
mod test_event;

pub use bridge_error::*;
pub use die::*;
pub use record_anchored::*;
pub use shutdown::*;
pub use task_created::*;
pub use task_completed::*;
pub use task_declined::*;
pub use task_progress::*;
pub use task_published::*;
pub use test_event::*;

use crate::{ErrorEvent, Event, EventId, TaskId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Macro to help define From traits for BridgeEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for BridgeEvent {
                fn from(data: $variant) -> Self {
                    BridgeEvent::$variant {
                        id: EventId::hash(data.clone()),
                        data,
                    }
                }
            }
        )*
    };
}

/// Everything observable by a CipherBridge party: ledger commit events,
/// coordinator progress, errors and process control.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum BridgeEvent {
    TaskCreated {
        id: EventId,
        data: TaskCreated,
    },
    TaskCompleted {
        id: EventId,
        data: TaskCompleted,
    },
    TaskPublished {
        id: EventId,
        data: TaskPublished,
    },
    TaskDeclined {
        id: EventId,
        data: TaskDeclined,
    },
    RecordAnchored {
        id: EventId,
        data: RecordAnchored,
    },
    TaskProgress {
        id: EventId,
        data: TaskProgress,
    },
    BridgeError {
        id: EventId,
        data: BridgeError,
    },
    Shutdown {
        id: EventId,
        data: Shutdown,
    },
    /// This is a test event to use in testing
    TestEvent {
        id: EventId,
        data: TestEvent,
    },
}

impl BridgeEvent {
    pub fn get_id(&self) -> EventId {
        self.clone().into()
    }

    pub fn get_task_id(&self) -> Option<TaskId> {
        match self {
            BridgeEvent::TaskCreated { data, .. } => Some(data.task_id.clone()),
            BridgeEvent::TaskCompleted { data, .. } => Some(data.task_id.clone()),
            BridgeEvent::TaskPublished { data, .. } => Some(data.task_id.clone()),
            BridgeEvent::TaskDeclined { data, .. } => Some(data.task_id.clone()),
            BridgeEvent::TaskProgress { data, .. } => Some(data.task_id.clone()),
            _ => None,
        }
    }

    fn data_display(&self) -> String {
        match self {
            BridgeEvent::TaskCreated { data, .. } => format!("{}", data),
            BridgeEvent::TaskCompleted { data, .. } => format!("{}", data),
            BridgeEvent::TaskPublished { data, .. } => format!("{}", data),
            BridgeEvent::TaskDeclined { data, .. } => format!("{}", data),
            BridgeEvent::RecordAnchored { data, .. } => format!("{}", data),
            BridgeEvent::TaskProgress { data, .. } => format!("{}", data),
            BridgeEvent::BridgeError { data, .. } => format!("{}", data),
            BridgeEvent::Shutdown { data, .. } => format!("{:?}", data),
            BridgeEvent::TestEvent { data, .. } => format!("{:?}", data),
        }
    }
}

fn extract_event_name(debug_repr: &str) -> &str {
    let end = debug_repr
        .find(|c: char| !c.is_alphanumeric())
        .unwrap_or(debug_repr.len());
    &debug_repr[..end]
}

impl Event for BridgeEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self);
        extract_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for BridgeEvent {
    type Error = BridgeError;
    type ErrorType = BridgeErrorType;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            BridgeEvent::BridgeError { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, error: anyhow::Error) -> Self {
        BridgeEvent::from(BridgeError::new(err_type, error.to_string().as_str()))
    }
}

impl From<BridgeEvent> for EventId {
    fn from(value: BridgeEvent) -> Self {
        match value {
            BridgeEvent::TaskCreated { id, .. } => id,
            BridgeEvent::TaskCompleted { id, .. } => id,
            BridgeEvent::TaskPublished { id, .. } => id,
            BridgeEvent::TaskDeclined { id, .. } => id,
            BridgeEvent::RecordAnchored { id, .. } => id,
            BridgeEvent::TaskProgress { id, .. } => id,
            BridgeEvent::BridgeError { id, .. } => id,
            BridgeEvent::Shutdown { id, .. } => id,
            BridgeEvent::TestEvent { id, .. } => id,
        }
    }
}

impl Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.event_type(), self.data_display())
    }
}

impl_from_event!(
    TaskCreated,
    TaskCompleted,
    TaskPublished,
    TaskDeclined,
    RecordAnchored,
    TaskProgress,
    BridgeError,
    Shutdown,
    TestEvent
);
