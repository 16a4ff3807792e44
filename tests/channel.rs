mod common;

use common::{TIMEOUT, init_test_logging};
use concord::channel::{Process, ProcessState, for_each, map, sum};
use concord::{Error, Future, Manual, ProcessError, ThreadPoolBuilder, channel, join_all, spawn};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_channel_sum_pipeline() {
    init_test_logging();
    let pool = ThreadPoolBuilder::new().worker_threads(4).build();
    let executor = pool.executor();

    let (aggregate, receiver) = channel::<i32>(&executor);

    let results: Vec<Future<()>> = (0..10)
        .map(|n| {
            let sender = aggregate.clone();
            spawn(&executor, move || n).then(move |n| {
                sender.send(n);
                sender.close();
            })
        })
        .collect();

    aggregate.close();

    let printed = Arc::new(Mutex::new(Vec::new()));
    let p = printed.clone();

    let pipe = receiver | map(|x: i32| x) | sum() | for_each(move |x: i32| p.lock().push(x));
    let done = pipe.collect();

    join_all(&executor, results)
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap();
    done.wait_timeout(TIMEOUT).unwrap().unwrap();

    assert_eq!(*printed.lock(), vec![45]);
}

#[test]
fn test_sum_of_four_values() {
    let manual = Manual::new();
    let (sender, receiver) = channel::<i32>(&manual.executor());

    let total = (receiver | sum()).collect();
    for n in [1, 2, 3, 4] {
        sender.send(n);
    }
    sender.close();
    manual.run_until_idle();

    assert!(matches!(total.get_try(), Ok(Some(v)) if v == vec![10]));
}

#[test]
fn test_close_only_after_every_copy_closes() {
    init_test_logging();
    let manual = Manual::new();
    let (sender, receiver) = channel::<u32>(&manual.executor());
    let copies: Vec<_> = (0..5).map(|_| sender.clone()).collect();
    sender.close();

    let collected = receiver.collect();

    for (i, copy) in copies.into_iter().enumerate() {
        manual.run_until_idle();
        assert!(!collected.is_ready(), "closed early after {i} copies");

        copy.send(i as u32);
        copy.close();
    }

    manual.run_until_idle();
    assert!(matches!(collected.get_try(), Ok(Some(v)) if v == vec![0, 1, 2, 3, 4]));
}

#[test]
fn test_values_before_pipe_are_kept() {
    let manual = Manual::new();
    let (sender, receiver) = channel::<i32>(&manual.executor());

    sender.send(1);
    sender.send(2);
    manual.run_until_idle();

    let doubled = (receiver | map(|x: i32| x * 2)).collect();
    sender.send(3);
    sender.close();
    manual.run_until_idle();

    assert!(matches!(doubled.get_try(), Ok(Some(v)) if v == vec![2, 4, 6]));
}

/// Emits each value twice; violates its contract on a zero.
struct Stutter {
    pending: Vec<u8>,
    closed: bool,
}

impl Process for Stutter {
    type Input = u8;
    type Output = u8;

    fn await_value(&mut self, value: u8) -> Result<(), ProcessError> {
        if value == 0 {
            return Err(ProcessError::AwaitAfterClose);
        }
        self.pending.extend([value, value]);
        Ok(())
    }

    fn yield_value(&mut self) -> Result<u8, ProcessError> {
        self.pending.pop().ok_or(ProcessError::NothingToYield)
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn state(&self) -> ProcessState {
        match (self.pending.is_empty(), self.closed) {
            (false, _) => ProcessState::Yield,
            (true, true) => ProcessState::Closed,
            (true, false) => ProcessState::Await,
        }
    }
}

#[test]
fn test_custom_process_stage() {
    let manual = Manual::new();
    let (sender, receiver) = channel::<u8>(&manual.executor());

    let out = receiver
        .pipe(Stutter {
            pending: Vec::new(),
            closed: false,
        })
        .collect();

    sender.send(1);
    sender.send(2);
    sender.close();
    manual.run_until_idle();

    assert!(matches!(out.get_try(), Ok(Some(v)) if v == vec![1, 1, 2, 2]));
}

#[test]
fn test_stage_error_reaches_collect() {
    init_test_logging();
    let manual = Manual::new();
    let (sender, receiver) = channel::<u8>(&manual.executor());

    let out = (receiver
        | Stutter {
            pending: Vec::new(),
            closed: false,
        }
        | sum())
    .collect();

    sender.send(3);
    sender.send(0);
    sender.send(4);
    sender.close();
    manual.run_until_idle();

    assert!(matches!(
        out.get_try(),
        Err(Error::Process(ProcessError::AwaitAfterClose))
    ));
}
