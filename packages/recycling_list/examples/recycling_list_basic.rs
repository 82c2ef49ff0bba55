//! Basic usage example for `RecyclingList`.
//!
//! This example shows how removed nodes are cached and handed out again by later insertions,
//! and how handles to removed nodes are rejected.

use recycling_list::RecyclingList;

fn main() {
    println!("=== RecyclingList Basic Example ===");

    let mut list = RecyclingList::new();

    let first = list.push_back("first".to_string());
    let last = list.push_back("last".to_string());
    list.insert_after(first, "middle".to_string()).unwrap();

    println!("Values: {:?}", list.iter().collect::<Vec<_>>());

    // Removing hands the value back and keeps the node for reuse.
    let removed = list.remove(last).unwrap();
    println!("Removed {removed:?}, idle nodes: {}", list.idle_len());

    // The handle of a removed node no longer refers to anything.
    println!("Stale handle rejected: {}", list.remove(last).is_err());

    // The next insertion reuses the cached node.
    list.push_front("new".to_string());
    println!(
        "After reuse: {:?}, idle nodes: {}",
        list.iter().collect::<Vec<_>>(),
        list.idle_len()
    );

    // Clearing caches every node; releasing the cache gives the memory back.
    list.clear();
    println!("After clear: len {}, idle nodes {}", list.len(), list.idle_len());

    list.clear_idle_nodes();
    println!("After clear_idle_nodes: idle nodes {}", list.idle_len());

    println!("Example completed successfully!");
}
