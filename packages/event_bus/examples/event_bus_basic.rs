//! Basic usage example for `EventBus`.
//!
//! This example subscribes handlers to an event, fires events from the dispatch thread and from
//! a worker thread and dispatches them once per tick with `update()`.

use std::thread;

use event_bus::{Event, EventBus, EventBusMode, EventId, Handler};

#[derive(Default)]
struct ScoreChanged {
    score: u32,
}

impl ScoreChanged {
    const ID: EventId = 1;
}

impl object_pool::Poolable for ScoreChanged {
    fn reset(&mut self) {
        self.score = 0;
    }
}

impl Event for ScoreChanged {
    fn id(&self) -> EventId {
        Self::ID
    }
}

fn main() {
    println!("=== EventBus Basic Example ===");

    let bus = EventBus::<ScoreChanged, &'static str>::new(EventBusMode::ALLOW_MULTI_HANDLER);

    bus.subscribe(
        ScoreChanged::ID,
        Handler::new(|_, sender: &&'static str, event: &ScoreChanged| {
            println!("Scoreboard: {} from {sender}", event.score);
            Ok(())
        }),
    )
    .unwrap();

    bus.subscribe(
        ScoreChanged::ID,
        Handler::new(|_, _, event: &ScoreChanged| {
            if event.score >= 100 {
                println!("Achievement unlocked!");
            }
            Ok(())
        }),
    )
    .unwrap();

    // Events fired on the dispatch thread wait for the next update.
    let mut event = bus.pool().acquire::<ScoreChanged>().unwrap();
    event.score = 40;
    bus.fire("main", event).unwrap();

    // Other threads fire through a producer.
    let producer = bus.producer();
    thread::spawn(move || {
        let mut event = producer.pool().acquire::<ScoreChanged>().unwrap();
        event.score = 120;
        producer.fire("worker", event).unwrap();
    })
    .join()
    .unwrap();

    println!("Queued events: {}", bus.event_count());
    bus.update().unwrap();
    println!("Queued events after update: {}", bus.event_count());

    // Immediate dispatch bypasses the queue.
    let mut event = bus.pool().acquire::<ScoreChanged>().unwrap();
    event.score = 7;
    bus.fire_now("main", event).unwrap();

    println!("Example completed successfully!");
}
