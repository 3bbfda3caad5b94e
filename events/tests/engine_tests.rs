use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use events::{EngineConfig, EngineError, Event, EventEngine, EventHandler};

/// Handler that records the `seq` field of every payload it sees.
fn recorder() -> (EventHandler, Arc<Mutex<Vec<u64>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EventHandler = Arc::new(move |ev: &Event| -> anyhow::Result<()> {
        sink.lock().push(ev.payload["seq"].as_u64().unwrap_or(u64::MAX));
        Ok(())
    });
    (handler, seen)
}

fn seq(event_type: &str, n: u64) -> Event {
    Event::new(event_type, json!({ "seq": n }))
}

#[tokio::test]
async fn delivers_in_queue_order() {
    let engine = EventEngine::default();
    let (handler, seen) = recorder();
    engine.register("signal.buy_point", handler);

    engine.start().unwrap();
    for n in 0..200 {
        engine.put(seq("signal.buy_point", n)).unwrap();
    }
    engine.stop().await.unwrap();

    assert_eq!(*seen.lock(), (0..200).collect::<Vec<_>>());
    assert_eq!(engine.stats().dispatched, 200);
}

#[tokio::test]
async fn only_handlers_of_the_event_type_are_called() {
    let engine = EventEngine::default();
    let (buy, buy_seen) = recorder();
    let (sell, sell_seen) = recorder();
    engine.register("signal.buy_point", buy);
    engine.register("signal.sell_point", sell);

    engine.start().unwrap();
    engine.put(seq("signal.buy_point", 1)).unwrap();
    engine.put(seq("signal.unknown", 2)).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*buy_seen.lock(), vec![1]);
    assert!(sell_seen.lock().is_empty());
    assert_eq!(engine.stats().dispatched, 2);
}

#[tokio::test]
async fn every_handler_sees_each_event_once() {
    let engine = EventEngine::default();
    let (a, a_seen) = recorder();
    let (b, b_seen) = recorder();
    engine.register("tick", a.clone());
    engine.register("tick", a);
    engine.register("tick", b);

    engine.start().unwrap();
    engine.put(seq("tick", 7)).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*a_seen.lock(), vec![7]);
    assert_eq!(*b_seen.lock(), vec![7]);
}

#[tokio::test]
async fn stop_drains_events_queued_before_start() {
    let engine = EventEngine::default();
    let (handler, seen) = recorder();
    engine.register("tick", handler);

    for n in 0..10 {
        engine.put(seq("tick", n)).unwrap();
    }
    assert_eq!(engine.queue_size(), 10);

    engine.start().unwrap();
    engine.stop().await.unwrap();

    assert_eq!(seen.lock().len(), 10);
    assert_eq!(engine.queue_size(), 0);
}

#[tokio::test]
async fn failing_and_panicking_handlers_do_not_block_others() {
    let engine = EventEngine::default();
    let (good, seen) = recorder();

    engine.register(
        "tick",
        Arc::new(|_: &Event| -> anyhow::Result<()> { anyhow::bail!("push gateway down") }),
    );
    engine.register(
        "tick",
        Arc::new(|_: &Event| -> anyhow::Result<()> { panic!("subscriber bug") }),
    );
    engine.register("tick", good);

    engine.start().unwrap();
    engine.put(seq("tick", 1)).unwrap();
    engine.put(seq("tick", 2)).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*seen.lock(), vec![1, 2]);
    assert_eq!(engine.stats().handler_failures, 4);
}

#[tokio::test]
async fn full_queue_rejects_without_blocking() {
    let engine = EventEngine::new(EngineConfig { queue_capacity: 2 });
    let (handler, seen) = recorder();
    engine.register("tick", handler);

    engine.put(seq("tick", 0)).unwrap();
    engine.put(seq("tick", 1)).unwrap();
    assert_eq!(
        engine.put(seq("tick", 2)),
        Err(EngineError::QueueFull { capacity: 2 })
    );
    assert_eq!(engine.stats().rejected, 1);

    engine.start().unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*seen.lock(), vec![0, 1]);
}

#[tokio::test]
async fn lifecycle_errors_and_restart() {
    let engine = EventEngine::default();
    let (handler, seen) = recorder();
    engine.register("tick", handler);

    assert_eq!(engine.stop().await, Err(EngineError::NotRunning));

    engine.start().unwrap();
    assert_eq!(engine.start(), Err(EngineError::AlreadyRunning));
    assert!(engine.is_running());
    engine.put(seq("tick", 1)).unwrap();
    engine.stop().await.unwrap();
    assert!(!engine.is_running());

    engine.start().unwrap();
    engine.put(seq("tick", 2)).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*seen.lock(), vec![1, 2]);
}

#[tokio::test]
async fn handlers_registered_while_running_receive_later_events() {
    let engine = EventEngine::default();
    engine.start().unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let handler: EventHandler = Arc::new(move |_: &Event| -> anyhow::Result<()> {
        h.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    engine.register("tick", handler.clone());

    engine.put(Event::bare("tick")).unwrap();
    tokio::time::timeout(Duration::from_secs(1), async {
        while hits.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("running loop should deliver without a stop");

    engine.unregister("tick", &handler);
    engine.put(Event::bare("tick")).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_stop_keeps_queue_and_allows_restart() {
    let engine = EventEngine::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let slow: EventHandler = Arc::new(move |ev: &Event| -> anyhow::Result<()> {
        std::thread::sleep(Duration::from_millis(100));
        sink.lock().push(ev.payload["seq"].as_u64().unwrap_or(u64::MAX));
        Ok(())
    });
    engine.register("tick", slow);

    engine.start().unwrap();
    engine.put(seq("tick", 1)).unwrap();
    engine.put(seq("tick", 2)).unwrap();

    // Give up on stop while the loop is still busy with the slow handler.
    let cancelled = tokio::time::timeout(Duration::from_millis(10), engine.stop()).await;
    assert!(cancelled.is_err());
    assert!(!engine.is_running());
    assert_eq!(engine.start(), Err(EngineError::Stopping));

    tokio::time::timeout(Duration::from_secs(2), async {
        while engine.start().is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("receiver should come back once the old loop drains");

    engine.put(seq("tick", 3)).unwrap();
    engine.stop().await.unwrap();

    assert_eq!(*seen.lock(), vec![1, 2, 3]);
}

#[tokio::test]
async fn handlers_can_hand_slow_work_to_the_runtime() {
    let engine = EventEngine::default();
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();

    let handler: EventHandler = Arc::new(move |ev: &Event| -> anyhow::Result<()> {
        let done = done_tx.clone();
        let n = ev.payload["seq"].as_u64().unwrap_or(u64::MAX);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = done.send(n);
        });
        Ok(())
    });
    engine.register("tick", handler);

    engine.start().unwrap();
    engine.put(seq("tick", 4)).unwrap();
    engine.stop().await.unwrap();

    let n = tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
        .await
        .expect("spawned work should finish")
        .expect("sender alive");
    assert_eq!(n, 4);
}
