use crate::connection::Connection;
use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info_span, Instrument, Span};
use volley_core::{CleanupError, RunConfig, ScenarioError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Worker state holds no {0}")]
    Missing(&'static str),
}

impl From<StateError> for ScenarioError {
    fn from(err: StateError) -> Self {
        ScenarioError::failed(err)
    }
}

/// Everything one worker owns for the duration of a run.
///
/// Created by the engine before workers start and handed back to it after they stop. Between
/// those points it is only ever touched by its own worker. The typed slot is reserved for the
/// benchmark's own hooks; the engine never looks inside it.
pub struct WorkerState {
    id: usize,
    config: Arc<RunConfig>,
    span: Span,
    connection: Arc<dyn Connection>,
    slot: Option<Box<dyn Any + Send>>,
}

impl WorkerState {
    pub fn new(id: usize, config: Arc<RunConfig>, connection: Arc<dyn Connection>) -> Self {
        Self {
            id,
            config,
            span: info_span!("worker", id),
            connection,
            slot: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Logging context of this worker.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn set_state<T: Any + Send>(&mut self, value: T) {
        self.slot = Some(Box::new(value));
    }

    pub fn has_state(&self) -> bool {
        self.slot.is_some()
    }

    pub fn state<T: Any>(&self) -> Result<&T, StateError> {
        self.slot
            .as_deref()
            .and_then(|slot| slot.downcast_ref())
            .ok_or(StateError::Missing(type_name::<T>()))
    }

    pub fn state_mut<T: Any>(&mut self) -> Result<&mut T, StateError> {
        self.slot
            .as_deref_mut()
            .and_then(|slot| slot.downcast_mut())
            .ok_or(StateError::Missing(type_name::<T>()))
    }

    /// Removes the slot's value if it holds a `T`. Any other value is left in place.
    pub fn take_state<T: Any>(&mut self) -> Option<T> {
        match self.slot.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.slot = Some(other);
                None
            }
        }
    }

    /// Closes the connection in this worker's span, logging any failure.
    pub(crate) fn close_connection(&self) -> impl Future<Output = ()> + Send + 'static {
        let connection = self.connection.clone();
        let span = self.span.clone();
        let id = self.id;
        async move {
            let res = connection.close().instrument(span.clone()).await;
            span.in_scope(|| match res {
                Ok(()) => debug!("Connection closed"),
                Err(source) => error!("{}", CleanupError::Close { id, source }),
            });
        }
    }
}

impl fmt::Debug for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerState")
            .field("id", &self.id)
            .field("has_state", &self.has_state())
            .finish_non_exhaustive()
    }
}
