//! Process-wide session holding the named models.
//!
//! [`initialize`] must precede every model call and [`finalize`] drops all
//! models. Calls outside that window fail with
//! [`ModelError::NotInitialized`]. Session calls made from inside a
//! [`with_model`] closure are rejected instead of waiting on the lock.

use std::cell::Cell;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::{ModelError, Result};
use crate::model::Model;

#[derive(Debug, Default)]
struct Session {
    models: Vec<Model>,
    current: Option<usize>,
}

impl Session {
    /// The current model. Without one, the unnamed model becomes current,
    /// created first if it does not exist.
    fn current_mut(&mut self) -> &mut Model {
        let idx = match self.current {
            Some(idx) => idx,
            None => {
                let idx = match self.models.iter().position(|m| m.name().is_empty()) {
                    Some(idx) => idx,
                    None => {
                        self.models.push(Model::new(""));
                        self.models.len() - 1
                    }
                };
                self.current = Some(idx);
                idx
            }
        };
        &mut self.models[idx]
    }
}

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

thread_local! {
    static IN_MODEL_CALL: Cell<bool> = const { Cell::new(false) };
}

/// Marks the running thread as inside a [`with_model`] closure.
struct ModelCall;

impl ModelCall {
    fn enter() -> Self {
        IN_MODEL_CALL.with(|c| c.set(true));
        ModelCall
    }
}

impl Drop for ModelCall {
    fn drop(&mut self) {
        IN_MODEL_CALL.with(|c| c.set(false));
    }
}

fn check_reentry() -> Result<()> {
    if IN_MODEL_CALL.with(Cell::get) {
        return Err(ModelError::invalid("session called from inside a with_model closure"));
    }
    Ok(())
}

fn lock() -> MutexGuard<'static, Option<Session>> {
    // A panic inside a model call cannot break the session's own invariants.
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
    check_reentry()?;
    match lock().as_mut() {
        Some(session) => f(session),
        None => Err(ModelError::NotInitialized),
    }
}

pub fn initialize() {
    if check_reentry().is_err() {
        warn!("initialize called from inside a model call, ignored");
        return;
    }
    let mut guard = lock();
    if guard.is_some() {
        warn!("session already initialized");
        return;
    }
    *guard = Some(Session::default());
    info!("session initialized");
}

pub fn finalize() -> Result<()> {
    check_reentry()?;
    let session = lock().take().ok_or(ModelError::NotInitialized)?;
    info!(models = session.models.len(), "session finalized");
    Ok(())
}

pub fn is_initialized() -> bool {
    // A running model call implies a live session.
    IN_MODEL_CALL.with(Cell::get) || lock().is_some()
}

/// Add an empty model and make it current.
pub fn add_model(name: &str) -> Result<()> {
    with_session(|s| {
        if s.models.iter().any(|m| m.name() == name) {
            return Err(ModelError::invalid(format!("model {name:?} already exists")));
        }
        s.models.push(Model::new(name));
        s.current = Some(s.models.len() - 1);
        info!(name, "model added");
        Ok(())
    })
}

pub fn set_current(name: &str) -> Result<()> {
    with_session(|s| {
        let idx = s
            .models
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| ModelError::UnknownModel { name: name.to_string() })?;
        s.current = Some(idx);
        Ok(())
    })
}

/// Name of the current model, `None` when no model is current.
pub fn current_model_name() -> Result<Option<String>> {
    with_session(|s| Ok(s.current.map(|idx| s.models[idx].name().to_string())))
}

pub fn list_models() -> Result<Vec<String>> {
    with_session(|s| Ok(s.models.iter().map(|m| m.name().to_string()).collect()))
}

/// Remove the current model. The next model call creates a fresh unnamed
/// one.
pub fn remove_model() -> Result<()> {
    with_session(|s| {
        let idx = s.current.take().ok_or_else(|| ModelError::UnknownModel {
            name: String::new(),
        })?;
        let removed = s.models.remove(idx);
        info!(name = removed.name(), "model removed");
        Ok(())
    })
}

/// Run `f` on the current model, creating an unnamed one if none exists.
/// Session calls made by `f` fail with [`ModelError::InvalidArgument`].
pub fn with_model<T>(f: impl FnOnce(&mut Model) -> Result<T>) -> Result<T> {
    with_session(|s| {
        let _call = ModelCall::enter();
        f(s.current_mut())
    })
}
