//! Deferred delivery of events fired from threads other than the dispatch thread.

use std::sync::{Arc, Barrier};
use std::thread;

use event_bus::{Event, EventBus, EventBusMode, EventId, Handler};
use object_pool::{ObjectPool, Poolable};
use parking_lot::Mutex;
use testing::with_watchdog;

#[derive(Default)]
struct Reading {
    sequence: usize,
}

impl Reading {
    const ID: EventId = 20;
}

impl Poolable for Reading {
    fn reset(&mut self) {
        self.sequence = 0;
    }
}

impl Event for Reading {
    fn id(&self) -> EventId {
        Self::ID
    }
}

#[test]
fn producers_deliver_in_fifo_order_per_thread() {
    const THREADS: usize = 4;
    const EVENTS_PER_THREAD: usize = 200;

    with_watchdog(|| {
        let bus = EventBus::<Reading, usize>::builder()
            .mode(EventBusMode::DEFAULT)
            .pool(ObjectPool::new())
            .build();

        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        bus.subscribe(
            Reading::ID,
            Handler::new(move |_, thread_index: &usize, reading: &Reading| {
                sink.lock().push((*thread_index, reading.sequence));
                Ok(())
            }),
        )
        .unwrap();

        let barrier = Arc::new(Barrier::new(THREADS));

        let workers: Vec<_> = (0..THREADS)
            .map(|thread_index| {
                let producer = bus.producer();
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    barrier.wait();

                    for sequence in 0..EVENTS_PER_THREAD {
                        let mut reading = producer.pool().acquire::<Reading>().unwrap();
                        reading.sequence = sequence;
                        producer.fire(thread_index, reading).unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(bus.event_count(), THREADS * EVENTS_PER_THREAD);

        bus.update().unwrap();

        assert_eq!(bus.event_count(), 0);

        let received = received.lock();
        assert_eq!(received.len(), THREADS * EVENTS_PER_THREAD);

        for thread_index in 0..THREADS {
            let sequences: Vec<_> = received
                .iter()
                .filter(|(sender, _)| *sender == thread_index)
                .map(|(_, sequence)| *sequence)
                .collect();

            assert_eq!(sequences, (0..EVENTS_PER_THREAD).collect::<Vec<_>>());
        }
    });
}

#[test]
fn dispatch_while_producers_are_firing() {
    const EVENTS: usize = 500;

    with_watchdog(|| {
        let bus = EventBus::<Reading, usize>::builder()
            .mode(EventBusMode::DEFAULT)
            .pool(ObjectPool::new())
            .build();

        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        bus.subscribe(
            Reading::ID,
            Handler::new(move |_, _, reading: &Reading| {
                sink.lock().push(reading.sequence);
                Ok(())
            }),
        )
        .unwrap();

        let producer = bus.producer();
        let worker = thread::spawn(move || {
            for sequence in 0..EVENTS {
                let mut reading = producer.pool().acquire::<Reading>().unwrap();
                reading.sequence = sequence;
                producer.fire(0, reading).unwrap();
            }
        });

        while !worker.is_finished() {
            bus.update().unwrap();
            thread::yield_now();
        }

        worker.join().unwrap();
        bus.update().unwrap();

        assert_eq!(*received.lock(), (0..EVENTS).collect::<Vec<_>>());

        // Every payload went back to the pool.
        let stats = bus.pool().stats::<Reading>().unwrap();
        assert_eq!(stats.acquired(), EVENTS);
        assert_eq!(stats.released(), EVENTS);
    });
}
