use crate::priv_prelude::*;
use crate::error::ScheduleError;
use crate::sched::Scheduler;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn equal_times_fire_in_scheduling_order() {
    let mut sched = Scheduler::new();
    sched.schedule_at(Duration::from_millis(5), "b").unwrap();
    sched.schedule_at(Duration::from_millis(1), "a").unwrap();
    sched.schedule_at(Duration::from_millis(5), "c").unwrap();
    sched.schedule_at(Duration::from_millis(5), "d").unwrap();

    let mut fired = Vec::new();
    while let Some((at, item)) = sched.pop_until(Duration::from_secs(1)) {
        fired.push((at, item));
    }
    assert_eq!(fired, vec![
        (Duration::from_millis(1), "a"),
        (Duration::from_millis(5), "b"),
        (Duration::from_millis(5), "c"),
        (Duration::from_millis(5), "d"),
    ]);
    assert_eq!(sched.executed(), 4);
    assert!(sched.is_empty());
}

#[test]
fn cannot_schedule_in_the_past() {
    let mut sched = Scheduler::new();
    sched.schedule_at(Duration::from_millis(5), ()).unwrap();
    sched.pop_until(Duration::from_secs(1)).unwrap();
    assert_eq!(sched.now(), Duration::from_millis(5));

    let err = sched.schedule_at(Duration::from_millis(1), ()).unwrap_err();
    assert_eq!(err, ScheduleError::InPast {
        at: Duration::from_millis(1),
        now: Duration::from_millis(5),
    });
    // now is fine
    sched.schedule_at(Duration::from_millis(5), ()).unwrap();
    sched.schedule_in(Duration::ZERO, ()).unwrap();
    assert_eq!(sched.len(), 2);
}

#[test]
fn nothing_fires_after_stop() {
    let mut sched = Scheduler::new();
    sched.schedule_at(Duration::from_millis(5), 1).unwrap();
    sched.schedule_at(Duration::from_millis(15), 2).unwrap();

    assert_eq!(sched.pop_until(Duration::from_millis(10)), Some((Duration::from_millis(5), 1)));
    assert_eq!(sched.pop_until(Duration::from_millis(10)), None);
    sched.stop_at(Duration::from_millis(10));

    assert!(sched.is_stopped());
    assert_eq!(sched.now(), Duration::from_millis(10));
    assert_eq!(sched.len(), 1);
    assert_eq!(sched.pop_until(Duration::from_secs(1)), None);
    assert_eq!(
        sched.schedule_at(Duration::from_millis(20), 3),
        Err(ScheduleError::Stopped { at: Duration::from_millis(20) }),
    );
}

#[test]
fn simulator_stops_at_stop_time() {
    let mut sim = Simulator::new();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let fired_in_event = fired.clone();
    sim.schedule_at(Duration::from_millis(5), move |sim| {
        fired_in_event.borrow_mut().push(sim.now());
        let fired_later = fired_in_event.clone();
        sim.schedule_in(Duration::from_millis(20), move |sim| {
            fired_later.borrow_mut().push(sim.now());
            Ok(())
        })?;
        Ok(())
    }).unwrap();

    let stats = sim.run_until(Duration::from_millis(10)).unwrap();
    assert_eq!(*fired.borrow(), vec![Duration::from_millis(5)]);
    assert_eq!(stats.executed, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.stopped_at, Duration::from_millis(10));
    assert!(sim.is_stopped());

    match sim.schedule_in(Duration::ZERO, |_| Ok(())) {
        Err(SimError::Schedule(ScheduleError::Stopped { .. })) => (),
        res => panic!("unexpected result {:?}", res),
    }
}
