//! Basic link CRUD walkthrough.
//!
//! Runs against the in-memory backend so it works without the external
//! tool installed; swap in `CliBackend::new("example.links")` to drive
//! the real thing.

use links_db::{LinkStore, MemoryBackend};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let links = LinkStore::new(Box::new(MemoryBackend::new()));

    println!("=== Basic link operations ===\n");

    println!("1. Creating a link between entity 100 and entity 200...");
    let first = links.create_link(100, 200)?;
    println!("   Created {}\n", first);

    println!("2. Creating another link between entity 300 and entity 400...");
    let second = links.create_link(300, 400)?;
    println!("   Created {}\n", second);

    println!("3. Reading all links...");
    for link in links.all_links()? {
        println!("   - Link {}: {} -> {}", link.id, link.source, link.target);
    }
    println!();

    println!("4. Updating the first link to point at entity 500...");
    let updated = links.update_link(first.id, 100, 500)?;
    println!("   Updated {}\n", updated);

    println!("5. Deleting the second link...");
    links.delete_link(second.id)?;
    println!("   Deleted\n");

    println!("6. Final state:");
    for link in links.all_links()? {
        println!("   - Link {}: {} -> {}", link.id, link.source, link.target);
    }

    Ok(())
}
