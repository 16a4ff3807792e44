mod common;

use common::{TIMEOUT, init_test_logging};
use concord::{Error, ThreadPoolBuilder, default_executor, join_all, spawn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

#[test]
fn test_single_worker_thread() {
    init_test_logging();
    let pool = ThreadPoolBuilder::new().worker_threads(1).build();

    let result = spawn(&pool.executor(), || 42).wait_timeout(TIMEOUT);
    assert_eq!(result.unwrap().unwrap(), 42);
}

#[test]
fn test_worker_threads_stress() {
    let pool = ThreadPoolBuilder::new().worker_threads(8).build();
    let executor = pool.executor();
    let counter = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..100)
        .map(|_| {
            let counter = counter.clone();
            spawn(&executor, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    join_all(&executor, futures)
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_worker_threads_two_threads() {
    let pool = ThreadPoolBuilder::new().worker_threads(2).build();
    let executor = pool.executor();
    let completed = Arc::new(Mutex::new(HashSet::new()));

    let futures: Vec<_> = (0..20)
        .map(|i| {
            let completed = completed.clone();
            spawn(&executor, move || {
                completed.lock().unwrap().insert(i);
                i
            })
        })
        .collect();

    join_all(&executor, futures)
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap();

    let set = completed.lock().unwrap();
    assert_eq!(set.len(), 20);
    for i in 0..20 {
        assert!(set.contains(&i), "Task {} should have completed", i);
    }
}

#[test]
fn test_worker_threads_nested_spawns() {
    let pool = ThreadPoolBuilder::new().worker_threads(4).build();
    let executor = pool.executor();
    let results = Arc::new(Mutex::new(Vec::new()));

    let outer: Vec<_> = (0..4)
        .map(|i| {
            let results = results.clone();
            let inner_executor = executor.clone();

            spawn(&executor, move || {
                (0..5)
                    .map(|j| {
                        let results = results.clone();
                        spawn(&inner_executor, move || {
                            results.lock().unwrap().push(i * 10 + j);
                        })
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for group in join_all(&executor, outer)
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap()
    {
        join_all(&executor, group)
            .wait_timeout(TIMEOUT)
            .unwrap()
            .unwrap();
    }

    assert_eq!(results.lock().unwrap().len(), 20);
}

#[test]
fn test_continuations_run_in_registration_order() {
    init_test_logging();
    let pool = ThreadPoolBuilder::new().worker_threads(1).build();
    let executor = pool.executor();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let order = Arc::new(Mutex::new(Vec::new()));

    let upstream = spawn(&executor, move || {
        let _ = gate_rx.recv();
    });

    let continuations: Vec<_> = (0..4)
        .map(|i| {
            let order = order.clone();
            upstream.then(move |_| order.lock().unwrap().push(i))
        })
        .collect();

    gate_tx.send(()).unwrap();

    join_all(&executor, continuations)
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_worker_thread_names() {
    let pool = ThreadPoolBuilder::new()
        .worker_threads(2)
        .thread_name("named")
        .build();

    let name = spawn(&pool.executor(), || thread::current().name().map(String::from))
        .wait_timeout(TIMEOUT)
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(name.starts_with("named-"), "unexpected thread name {name}");
}

#[test]
fn test_panicking_task_does_not_kill_worker() {
    init_test_logging();
    let pool = ThreadPoolBuilder::new().worker_threads(1).build();
    let executor = pool.executor();

    let failed = spawn(&executor, || -> u8 { panic!("worker survives") });
    assert!(matches!(
        failed.wait_timeout(TIMEOUT).unwrap(),
        Err(Error::Panicked(_))
    ));

    let (tx, rx) = mpsc::channel();
    pool.spawn(move || {
        let _ = tx.send(thread::current().name().map(String::from));
    });
    assert!(rx.recv_timeout(TIMEOUT).is_ok());
}

#[test]
fn test_dropped_pool_breaks_queued_futures() {
    init_test_logging();
    let pool = ThreadPoolBuilder::new().worker_threads(1).build();
    let executor = pool.executor();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();

    let blocker = spawn(&executor, move || {
        let _ = started_tx.send(());
        let _ = gate_rx.recv();
    });
    started_rx.recv_timeout(TIMEOUT).unwrap();

    let queued = spawn(&executor, || 1);

    let releaser = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(20));
        let _ = gate_tx.send(());
    });
    drop(pool);
    releaser.join().unwrap();

    assert!(blocker.wait_timeout(TIMEOUT).unwrap().is_ok());
    assert!(matches!(
        queued.wait_timeout(TIMEOUT).unwrap(),
        Err(Error::BrokenPromise)
    ));
    assert!(matches!(
        spawn(&executor, || 2).wait_timeout(TIMEOUT).unwrap(),
        Err(Error::BrokenPromise)
    ));
}

#[test]
fn test_default_executor_runs_tasks() {
    let executor = default_executor();
    let f = spawn(&executor, || 6).then(|x| x * 7);

    assert_eq!(f.wait_timeout(TIMEOUT).unwrap().unwrap(), 42);
}

#[test]
#[should_panic(expected = "worker_threads must be > 0")]
fn test_worker_threads_zero_panics() {
    let _ = ThreadPoolBuilder::new().worker_threads(0).build();
}

#[test]
fn test_sequential_pools() {
    for n in 1..=4 {
        let pool = ThreadPoolBuilder::new().worker_threads(n).build();
        let result = spawn(&pool.executor(), move || n * 10).wait_timeout(TIMEOUT);
        assert_eq!(result.unwrap().unwrap(), n * 10);
        drop(pool);
    }
}
