//! Basic usage example for `ObjectPool`.
//!
//! This example recycles message buffers through a pool, uses the untyped API that only knows a
//! `TypeId` and prints the pool's counters.

use std::any::TypeId;

use object_pool::{ObjectPool, Poolable};

#[derive(Default)]
struct Message {
    text: String,
}

impl Poolable for Message {
    fn reset(&mut self) {
        self.text.clear();
    }
}

fn main() {
    println!("=== ObjectPool Basic Example ===");

    let pool = ObjectPool::new();

    // Pre-warm the pool so the first acquisitions do not allocate.
    pool.add::<Message>(4);

    let mut message = pool.acquire::<Message>().unwrap();
    message.text.push_str("hello");
    println!("Acquired message: {:?}", message.text);

    pool.release(message).unwrap();

    // The released message was reset before it went back to the idle queue.
    let message = pool.acquire::<Message>().unwrap();
    println!("Reacquired message is empty: {}", message.text.is_empty());
    pool.release(message).unwrap();

    // Untyped callers only need the type identity once the type is registered.
    pool.register::<Message>();
    let untyped = pool.acquire_dyn(TypeId::of::<Message>()).unwrap();
    pool.release_dyn(untyped).unwrap();

    let stats = pool.stats::<Message>().unwrap();
    println!(
        "{}: idle {}, using {}, acquired {}, released {}, added {}",
        stats.type_name(),
        stats.idle(),
        stats.using(),
        stats.acquired(),
        stats.released(),
        stats.added()
    );

    println!("Example completed successfully!");
}
