//! TokioScheduler against the paused tokio clock.
#![cfg(feature = "tokio")]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use peregrine_core::{Scheduler, TokioScheduler};

#[tokio::test(start_paused = true)]
async fn fires_after_the_duration() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let scheduler = TokioScheduler::new();
            let fired = Rc::new(Cell::new(false));
            let flag = fired.clone();

            scheduler.delay(Duration::from_millis(2000), Box::new(move || flag.set(true)));

            tokio::time::sleep(Duration::from_millis(1999)).await;
            assert!(!fired.get());

            tokio::time::sleep(Duration::from_millis(2)).await;
            assert!(fired.get());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn cancelled_delay_never_fires() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let scheduler = TokioScheduler::new();
            let fired = Rc::new(Cell::new(false));
            let flag = fired.clone();

            let handle =
                scheduler.delay(Duration::from_millis(100), Box::new(move || flag.set(true)));
            handle.cancel();

            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(!fired.get());
            assert!(handle.is_cancelled());
        })
        .await;
}
