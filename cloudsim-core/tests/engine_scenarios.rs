//! Multi-entity engine scenarios that need several modules wired together —
//! the concrete end-to-end scenarios named in `spec.md` §8.

use std::sync::{Arc, Mutex};

use cloudsim_core::prelude::*;

/// An entity that does nothing but immediately finish — used to pad out
/// scenarios that only care about one or two other entities' behavior.
struct Idle;

impl Entity for Idle {
    fn start(&mut self, _ctx: &mut EngineContext<'_>) {}
    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        ctx.wait(None);
    }
    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

/// Schedules one `SEND` to a fixed destination, once, from `start`, then
/// waits forever.
struct SenderOnce {
    destination: EntityId,
    delay: f64,
    tag: i64,
}

impl Entity for SenderOnce {
    fn start(&mut self, ctx: &mut EngineContext<'_>) {
        ctx.schedule(self.destination, self.delay, self.tag, Payload::none())
            .expect("non-negative delay");
    }
    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        ctx.wait(None);
    }
    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

/// Waits on SIM_ANY and records every event it receives into a shared log.
struct Receiver {
    log: Arc<Mutex<Vec<(f64, i64)>>>,
}

impl Receiver {
    fn new(log: Arc<Mutex<Vec<(f64, i64)>>>) -> Self {
        Self { log }
    }
}

impl Entity for Receiver {
    fn start(&mut self, ctx: &mut EngineContext<'_>) {
        ctx.wait(None);
    }
    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        if let Some(event) = ctx.take_event() {
            self.log.lock().unwrap().push((event.time, event.tag));
        }
        // A single-slot inbox only ever holds the one event that matched
        // while this entity was `Waiting`; further same-instant sends that
        // arrived after that match land in the deferred queue (`spec.md`
        // §4.2) because `run` only gets invoked once per main-loop
        // iteration. Drain them explicitly, the way a real entity would
        // call `select` to catch up before re-arming its wait.
        let id = ctx.self_id();
        while let Some(event) = ctx.select(id, |_| true) {
            self.log.lock().unwrap().push((event.time, event.tag));
        }
        ctx.wait(None);
    }
    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

/// Schedules three sends to a fixed destination from `start`, at given
/// `(delay, tag)` pairs, in the given order.
struct MultiSender {
    destination: EntityId,
    sends: Vec<(f64, i64)>,
}

impl Entity for MultiSender {
    fn start(&mut self, ctx: &mut EngineContext<'_>) {
        for &(delay, tag) in &self.sends {
            ctx.schedule(self.destination, delay, tag, Payload::none())
                .expect("non-negative delay");
        }
    }
    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        ctx.wait(None);
    }
    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

#[test]
fn empty_run_returns_zero_and_rejects_a_second_start() {
    let mut sim = SimInit::new().build().expect("positive min time between events");
    let clock = sim.start().expect("first start succeeds");
    assert_eq!(clock, 0.0);

    let err = sim.start().unwrap_err();
    assert_eq!(
        err,
        EngineError::IllegalState(IllegalStateKind::AlreadyStarted)
    );
}

#[test]
fn single_send_is_delivered_and_clock_ticks_fire_at_zero_and_five() {
    // spec.md §8 scenario 2.
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let ticks_cb = ticks.clone();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = SimInit::new()
        .add_entity(
            "a",
            SenderOnce {
                destination: 1,
                delay: 5.0,
                tag: 42,
            },
        )
        .add_entity("b", Receiver::new(log.clone()))
        .build()
        .unwrap();
    sim.add_clock_listener(move |t| ticks_cb.lock().unwrap().push(t));

    let clock = sim.start().unwrap();

    assert_eq!(clock, 5.0);
    assert_eq!(*log.lock().unwrap(), vec![(5.0, 42)]);
    assert_eq!(*ticks.lock().unwrap(), vec![0.0, 5.0]);
}

#[test]
fn same_time_batch_delivers_in_insertion_order_and_ticks_once_per_distinct_time() {
    // spec.md §8 scenario 3.
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let ticks_cb = ticks.clone();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = SimInit::new()
        .add_entity(
            "a",
            MultiSender {
                destination: 1,
                sends: vec![(3.0, 1), (3.0, 2), (7.0, 3)],
            },
        )
        .add_entity("b", Receiver::new(log.clone()))
        .build()
        .unwrap();
    sim.add_clock_listener(move |t| ticks_cb.lock().unwrap().push(t));

    let clock = sim.start().unwrap();

    assert_eq!(clock, 7.0);
    assert_eq!(*log.lock().unwrap(), vec![(3.0, 1), (3.0, 2), (7.0, 3)]);
    assert_eq!(*ticks.lock().unwrap(), vec![0.0, 3.0, 7.0]);
}

/// Reschedules a `SEND` to itself every 1.0 time unit, `max` times, so the
/// clock has something to advance against.
struct Heartbeat {
    count: i64,
    max: i64,
}

impl Entity for Heartbeat {
    fn start(&mut self, ctx: &mut EngineContext<'_>) {
        let id = ctx.self_id();
        ctx.schedule(id, 1.0, 0, Payload::none()).unwrap();
    }
    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        if ctx.take_event().is_some() {
            self.count += 1;
            if self.count < self.max {
                let id = ctx.self_id();
                ctx.schedule(id, 1.0, 0, Payload::none()).unwrap();
            }
        }
        ctx.wait(None);
    }
    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

#[test]
fn pause_at_a_future_time_blocks_until_external_resume() {
    // spec.md §8 scenario 5.
    let paused = Arc::new(Mutex::new(false));
    let paused_cb = paused.clone();

    let mut sim = SimInit::new()
        .add_entity("a", Heartbeat { count: 0, max: 20 })
        .build()
        .unwrap();
    sim.add_paused_listener(move || {
        *paused_cb.lock().unwrap() = true;
    });

    let controller = sim.controller();
    assert!(controller.pause(Some(10.0)));

    let resumer = controller.clone();
    let handle = std::thread::spawn(move || {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !resumer.is_paused() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        resumer.resume()
    });

    let clock = sim.start().unwrap();
    let resumed = handle.join().unwrap();

    assert!(resumed, "controller should have observed the engine paused");
    assert!(*paused.lock().unwrap());
    // The heartbeat keeps running after resume until it exhausts its 20
    // scheduled ticks; the pause itself only interrupts the loop midway.
    assert_eq!(clock, 20.0);
}

#[test]
fn canceling_a_scheduled_send_prevents_delivery() {
    // spec.md §8 scenario 6.
    struct CancelingSender {
        destination: EntityId,
    }
    impl Entity for CancelingSender {
        fn start(&mut self, ctx: &mut EngineContext<'_>) {
            ctx.schedule(self.destination, 10.0, 7, Payload::none())
                .unwrap();
            let canceled = ctx.cancel(|_| true);
            assert!(canceled.is_some());
        }
        fn run(&mut self, ctx: &mut EngineContext<'_>) {
            ctx.wait(None);
        }
        fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = SimInit::new()
        .add_entity("a", CancelingSender { destination: 1 })
        .add_entity("b", Receiver::new(log.clone()))
        .build()
        .unwrap();

    let clock = sim.start().unwrap();

    assert_eq!(clock, 0.0);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn scheduling_to_an_unregistered_destination_fails_synchronously() {
    // spec.md §7: "null destination" is a scheduling-time InvalidArgument,
    // not a silently-accepted send that piles up in the deferred queue.
    struct BadSender;
    impl Entity for BadSender {
        fn start(&mut self, ctx: &mut EngineContext<'_>) {
            let err = ctx.schedule(99, 1.0, 0, Payload::none()).unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidArgument(InvalidArgumentKind::UnknownDestination)
            );
            let err = ctx
                .schedule_first(99, 1.0, 0, Payload::none())
                .unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidArgument(InvalidArgumentKind::UnknownDestination)
            );
            // BROADCAST is always a valid destination, unknown ids aside.
            ctx.schedule(BROADCAST, 1.0, 0, Payload::none()).unwrap();
        }
        fn run(&mut self, ctx: &mut EngineContext<'_>) {
            ctx.wait(None);
        }
        fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
    }

    let mut sim = SimInit::new().add_entity("a", BadSender).build().unwrap();
    sim.start().unwrap();
}

#[test]
fn entity_ids_are_stable_insertion_indices() {
    let sim = SimInit::new()
        .add_entity("a", Idle)
        .add_entity("b", Idle)
        .add_entity("c", Idle)
        .build()
        .unwrap();

    assert_eq!(sim.get_entity_id("a"), Some(0));
    assert_eq!(sim.get_entity_id("b"), Some(1));
    assert_eq!(sim.get_entity_id("c"), Some(2));
    assert_eq!(sim.get_num_entities(), 3);
}

#[test]
fn processed_event_times_are_non_decreasing() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = seen.clone();

    let mut sim = SimInit::new()
        .add_entity(
            "a",
            MultiSender {
                destination: 1,
                sends: vec![(5.0, 1), (1.0, 2), (5.0, 3), (2.0, 4)],
            },
        )
        .add_entity("b", Receiver::new(Arc::new(Mutex::new(Vec::new()))))
        .build()
        .unwrap();
    sim.add_event_listener(move |e| seen_cb.lock().unwrap().push(e.time));

    sim.start().unwrap();

    let times = seen.lock().unwrap().clone();
    assert!(times.windows(2).all(|w| w[0] <= w[1]), "{times:?}");
}

/// With the `tracing` feature on, the engine and scheduler emit `debug!`/
/// `trace!` spans through every hook exercised above. Install a real
/// subscriber and drive a small run through it to confirm the instrumented
/// paths are actually reachable, not just present behind `#[cfg(...)]`.
#[cfg(feature = "tracing")]
#[test]
fn instrumented_paths_run_under_a_real_subscriber() {
    use tracing_subscriber::util::SubscriberInitExt;

    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .set_default();

    let mut sim = SimInit::new()
        .add_entity(
            "a",
            SenderOnce {
                destination: 1,
                delay: 2.0,
                tag: 1,
            },
        )
        .add_entity("b", Receiver::new(Arc::new(Mutex::new(Vec::new()))))
        .build()
        .unwrap();

    assert_eq!(sim.start().unwrap(), 2.0);
}
