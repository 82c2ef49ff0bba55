//! Basic usage example for `RangeMultiMap`.
//!
//! This example registers several values per key, walks a bucket node by node the way a
//! dispatcher would and shows that removed nodes are recycled across keys.

use range_multimap::RangeMultiMap;

fn main() {
    println!("=== RangeMultiMap Basic Example ===");

    let mut listeners = RangeMultiMap::new();

    listeners.add("damage", "health bar");
    listeners.add("damage", "combat log");
    listeners.add("heal", "health bar");
    listeners.add("damage", "achievements");

    for key in ["damage", "heal"] {
        let values: Vec<_> = listeners.values_of(&key).collect();
        println!("{key}: {values:?}");
    }

    // Walk one bucket through its nodes.
    let range = listeners.get(&"damage").unwrap();
    let mut next = Some(range.first());

    while let Some(node) = next {
        println!("Visiting {:?}", listeners.value(node).unwrap());
        next = listeners.successor(range, node).unwrap();
    }

    listeners.remove(&"damage", &"combat log");
    listeners.remove_all(&"heal");
    println!(
        "After removals: {} keys, {} idle nodes",
        listeners.len(),
        listeners.idle_node_count()
    );

    // A new key is built from the recycled nodes.
    listeners.add("level up", "fanfare");
    println!("Idle nodes after reuse: {}", listeners.idle_node_count());

    println!("Example completed successfully!");
}
