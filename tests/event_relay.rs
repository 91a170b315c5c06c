//! Integration tests for event delivery from the simulated core to
//! subscribers.

#![cfg(not(feature = "hardware"))]

use std::thread;
use std::time::Duration;

use mmcore::sys::sim;
use mmcore::{relay, DeliveryPolicy, PropertyChangedEvent, Session};

fn camera_session() -> Session {
    let session = Session::open().unwrap();
    session.load_device("Camera", "DemoCamera", "DCam").unwrap();
    session.load_device("Z", "DemoCamera", "DStage").unwrap();
    session.initialize_all_devices().unwrap();
    session
}

/// Raise a property change the way a device adapter thread would.
fn emit(session: &Session, value: &str) {
    // SAFETY: the session is open for the duration of the call.
    unsafe { sim::emit_property_changed(session.as_raw(), "Camera", "Exposure", value) };
}

#[test]
fn test_two_subscribers_receive_before_callback_returns() {
    let session = camera_session();
    let mut first = session.subscribe_property_changed(DeliveryPolicy::default());
    let mut second = session.subscribe_property_changed(DeliveryPolicy::default());

    thread::scope(|scope| {
        scope.spawn(|| emit(&session, "12.0000"));
    });

    let expected = PropertyChangedEvent {
        label: "Camera".into(),
        property: "Exposure".into(),
        value: "12.0000".into(),
    };
    assert_eq!(first.try_recv(), Some(expected.clone()));
    assert_eq!(second.try_recv(), Some(expected));
}

#[test]
fn test_property_change_through_session_is_relayed() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::default());

    session.set_property("Camera", "Binning", 2).unwrap();
    let event = events.try_recv().unwrap();
    assert_eq!((event.label.as_str(), event.property.as_str()), ("Camera", "Binning"));
    assert_eq!(event.value, "2");
}

#[test]
fn test_role_change_is_reported_as_core_property() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::default());

    session.set_camera_device("Camera").unwrap();
    let event = events.try_recv().unwrap();
    assert_eq!(event.label, "Core");
    assert_eq!(event.property, "Camera");
    assert_eq!(event.value, "Camera");
}

#[test]
fn test_stage_position_events() {
    let session = camera_session();
    let mut events = session.subscribe_stage_position_changed(DeliveryPolicy::default());

    session.set_position("Z", 3.5).unwrap();
    let event = events.try_recv().unwrap();
    assert_eq!(event.label, "Z");
    assert_eq!(event.position, 3.5);
}

#[test]
fn test_sequential_callbacks_arrive_in_order() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::Blocking { capacity: 1 });
    const COUNT: usize = 200;

    let received = thread::scope(|scope| {
        let consumer = scope.spawn(move || {
            let mut values = Vec::with_capacity(COUNT);
            while values.len() < COUNT {
                match events.blocking_recv() {
                    Some(event) => values.push(event.value),
                    None => break,
                }
            }
            values
        });
        for i in 0..COUNT {
            emit(&session, &i.to_string());
        }
        consumer.join().unwrap()
    });

    let expected: Vec<String> = (0..COUNT).map(|i| i.to_string()).collect();
    assert_eq!(received, expected);
}

#[test]
fn test_blocking_policy_waits_for_slow_subscriber() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::Blocking { capacity: 1 });

    thread::scope(|scope| {
        let producer = scope.spawn(|| {
            emit(&session, "a");
            emit(&session, "b");
        });
        // The second callback cannot return until "a" is taken.
        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());
        assert_eq!(events.blocking_recv().unwrap().value, "a");
        producer.join().unwrap();
    });
    assert_eq!(events.try_recv().unwrap().value, "b");
    assert_eq!(events.dropped(), 0);
}

#[test]
fn test_drop_newest_keeps_first_events() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::DropNewest { capacity: 3 });

    for i in 0..8 {
        emit(&session, &i.to_string());
    }
    let values: Vec<String> = events.drain().into_iter().map(|e| e.value).collect();
    assert_eq!(values, vec!["0", "1", "2"]);
    assert_eq!(events.dropped(), 5);
}

#[test]
fn test_drop_oldest_keeps_last_events_and_reports_skip() {
    let session = camera_session();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::DropOldest { capacity: 2 });

    for i in 0..6 {
        emit(&session, &i.to_string());
    }
    let values: Vec<String> = events.drain().into_iter().map(|e| e.value).collect();
    assert_eq!(values, vec!["4", "5"]);
    assert_eq!(events.dropped(), 4);
}

#[test]
fn test_callback_table_registered_once_per_session() {
    let session = camera_session();
    // SAFETY: the session is open.
    unsafe { sim::take_calls(session.as_raw()) };

    let _a = session.subscribe_property_changed(DeliveryPolicy::default());
    let _b = session.subscribe_property_changed(DeliveryPolicy::default());
    let _c = session.subscribe_stage_position_changed(DeliveryPolicy::default());

    let calls = unsafe { sim::take_calls(session.as_raw()) };
    assert_eq!(calls.iter().filter(|c| **c == "MM_RegisterCallback").count(), 1);
}

#[test]
fn test_sessions_are_isolated() {
    let a = camera_session();
    let b = camera_session();
    let mut events_a = a.subscribe_property_changed(DeliveryPolicy::default());
    let mut events_b = b.subscribe_property_changed(DeliveryPolicy::default());

    emit(&a, "1");
    assert_eq!(events_a.try_recv().unwrap().value, "1");
    assert!(events_b.try_recv().is_none());
}

#[test]
fn test_callback_after_close_is_noop() {
    let session = camera_session();
    let handle = session.handle();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::default());
    emit(&session, "before");
    session.close();

    // The freed address may already belong to another session, so only this
    // subscription's view is checked.
    let stale = PropertyChangedEvent {
        label: "Camera".into(),
        property: "Exposure".into(),
        value: "after".into(),
    };
    relay().publish(handle, stale);

    // Events delivered before close are still readable, then the stream ends.
    assert_eq!(events.try_recv().unwrap().value, "before");
    assert!(events.try_recv().is_none());
    assert_eq!(events.blocking_recv(), None);
}

#[tokio::test]
async fn test_async_receiver() {
    let session = std::sync::Arc::new(camera_session());
    let mut events = session.subscribe_property_changed(DeliveryPolicy::default());

    let setter = {
        let session = std::sync::Arc::clone(&session);
        tokio::task::spawn_blocking(move || {
            for exposure in [5.0, 6.0, 7.0] {
                session.set_property("Camera", "Exposure", exposure).unwrap();
            }
        })
    };

    let mut values = Vec::new();
    while values.len() < 3 {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        values.push(event.value);
    }
    setter.await.unwrap();
    assert_eq!(values, vec!["5.0000", "6.0000", "7.0000"]);
}
