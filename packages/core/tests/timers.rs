//! Virtual-clock scheduler behavior.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use peregrine_core::{ManualScheduler, Scheduler};
use pretty_assertions::assert_eq;

type FiredLog = Rc<RefCell<Vec<&'static str>>>;

fn record(log: &FiredLog, name: &'static str) -> Box<dyn FnOnce()> {
    let log = log.clone();
    Box::new(move || log.borrow_mut().push(name))
}

#[test]
fn fires_in_deadline_order() {
    let scheduler = ManualScheduler::new();
    let fired: FiredLog = Rc::default();

    scheduler.delay(Duration::from_millis(30), record(&fired, "c"));
    scheduler.delay(Duration::from_millis(10), record(&fired, "a"));
    scheduler.delay(Duration::from_millis(20), record(&fired, "b"));

    scheduler.advance(Duration::from_millis(100));
    assert_eq!(*fired.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn only_due_timers_fire() {
    let scheduler = ManualScheduler::new();
    let fired: FiredLog = Rc::default();

    scheduler.delay(Duration::from_millis(10), record(&fired, "soon"));
    scheduler.delay(Duration::from_millis(50), record(&fired, "later"));

    scheduler.advance(Duration::from_millis(20));
    assert_eq!(*fired.borrow(), vec!["soon"]);

    scheduler.advance(Duration::from_millis(30));
    assert_eq!(*fired.borrow(), vec!["soon", "later"]);
}

#[test]
fn cancelled_timers_never_fire() {
    let scheduler = ManualScheduler::new();
    let fired: FiredLog = Rc::default();

    let handle = scheduler.delay(Duration::from_millis(10), record(&fired, "cancelled"));
    scheduler.delay(Duration::from_millis(10), record(&fired, "kept"));
    handle.cancel();

    scheduler.advance(Duration::from_millis(10));
    assert_eq!(*fired.borrow(), vec!["kept"]);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn cancel_after_fire_is_a_noop() {
    let scheduler = ManualScheduler::new();
    let fired: FiredLog = Rc::default();

    let handle = scheduler.delay(Duration::from_millis(5), record(&fired, "ran"));
    scheduler.advance(Duration::from_millis(5));
    handle.cancel();

    assert_eq!(*fired.borrow(), vec!["ran"]);
}

#[test]
fn callbacks_may_schedule_into_the_same_window() {
    let scheduler = Rc::new(ManualScheduler::new());
    let fired: FiredLog = Rc::default();

    let chained = record(&fired, "second");
    let inner = scheduler.clone();
    scheduler.delay(
        Duration::from_millis(10),
        Box::new({
            let fired = fired.clone();
            move || {
                fired.borrow_mut().push("first");
                inner.delay(Duration::from_millis(10), chained);
            }
        }),
    );

    scheduler.advance(Duration::from_millis(25));
    assert_eq!(*fired.borrow(), vec!["first", "second"]);
    assert_eq!(scheduler.now(), Duration::from_millis(25));
}

#[test]
fn ties_fire_in_schedule_order() {
    let scheduler = ManualScheduler::new();
    let fired: FiredLog = Rc::default();

    scheduler.delay(Duration::from_millis(10), record(&fired, "first"));
    scheduler.delay(Duration::from_millis(10), record(&fired, "second"));

    scheduler.advance(Duration::from_millis(10));
    assert_eq!(*fired.borrow(), vec!["first", "second"]);
}
