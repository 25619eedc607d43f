//! The session is process-wide, so every test here takes `SERIAL` first.

use std::sync::Mutex;

use brep_kernel::session;
use brep_kernel::{Dim, ModelError, Point3d};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> std::sync::MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    if session::is_initialized() {
        session::finalize().unwrap();
    }
    guard
}

#[test]
fn calls_outside_session_fail() {
    let _g = serial();
    assert!(!session::is_initialized());
    assert_eq!(
        session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None)),
        Err(ModelError::NotInitialized)
    );
    assert_eq!(session::add_model("t1"), Err(ModelError::NotInitialized));
    assert_eq!(session::finalize(), Err(ModelError::NotInitialized));
}

#[test]
fn unnamed_model_is_created_on_demand() {
    let _g = serial();
    session::initialize();
    let tag = session::with_model(|m| m.add_point(1.0, 2.0, 3.0, None, None)).unwrap();
    assert_eq!(tag, 1);
    assert_eq!(session::list_models().unwrap(), vec![String::new()]);
    session::finalize().unwrap();
    assert!(!session::is_initialized());
}

#[test]
fn models_are_independent() {
    let _g = serial();
    session::initialize();
    session::add_model("a").unwrap();
    session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, Some(7))).unwrap();
    session::add_model("b").unwrap();
    assert_eq!(session::current_model_name().unwrap().as_deref(), Some("b"));
    let tag = session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None)).unwrap();
    assert_eq!(tag, 1);

    session::set_current("a").unwrap();
    let value = session::with_model(|m| {
        m.synchronize();
        m.get_value(Dim::Point, 7, &[])
    })
    .unwrap();
    assert_eq!(value, Point3d::ORIGIN);

    assert_eq!(
        session::set_current("missing"),
        Err(ModelError::UnknownModel {
            name: "missing".into()
        })
    );
    assert!(session::add_model("a").is_err());
    session::finalize().unwrap();
}

#[test]
fn remove_drops_current_model() {
    let _g = serial();
    session::initialize();
    session::add_model("keep").unwrap();
    session::add_model("drop").unwrap();
    session::remove_model().unwrap();
    assert_eq!(session::list_models().unwrap(), vec!["keep".to_string()]);
    assert!(matches!(session::remove_model(), Err(ModelError::UnknownModel { .. })));
    session::finalize().unwrap();
}

#[test]
fn initialize_twice_keeps_models() {
    let _g = serial();
    session::initialize();
    session::add_model("first").unwrap();
    session::initialize();
    assert_eq!(session::list_models().unwrap(), vec!["first".to_string()]);
    session::finalize().unwrap();
}

#[test]
fn name_query_does_not_create_models() {
    let _g = serial();
    session::initialize();
    assert_eq!(session::current_model_name().unwrap(), None);
    assert!(session::list_models().unwrap().is_empty());

    session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None)).unwrap();
    session::remove_model().unwrap();
    assert_eq!(session::current_model_name().unwrap(), None);
    session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None)).unwrap();
    assert_eq!(session::current_model_name().unwrap().as_deref(), Some(""));
    assert_eq!(session::list_models().unwrap(), vec![String::new()]);
    session::finalize().unwrap();
}

#[test]
fn unnamed_model_is_reused_after_switching_away() {
    let _g = serial();
    session::initialize();
    session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, Some(3))).unwrap();
    session::add_model("named").unwrap();
    session::remove_model().unwrap();
    let tag = session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None)).unwrap();
    assert_eq!(tag, 4);
    assert_eq!(session::list_models().unwrap(), vec![String::new()]);
    session::finalize().unwrap();
}

#[test]
fn nested_session_calls_are_rejected() {
    let _g = serial();
    session::initialize();
    let nested = session::with_model(|_| session::add_model("inner"));
    assert!(matches!(nested, Err(ModelError::InvalidArgument { .. })));
    assert!(matches!(
        session::with_model(|_| session::with_model(|m| m.add_point(0.0, 0.0, 0.0, None, None))),
        Err(ModelError::InvalidArgument { .. })
    ));
    assert!(session::with_model(|_| Ok(session::is_initialized())).unwrap());
    // The session is usable again once the outer call returns.
    session::add_model("after").unwrap();
    assert_eq!(session::list_models().unwrap(), vec![String::new(), "after".to_string()]);
    session::finalize().unwrap();
}
