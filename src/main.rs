use std::process::ExitCode;

use slotdb::common::{PageId, Result};
use slotdb::storage::disk::StorageManager;
use slotdb::tuple::Tuple;
use tracing_subscriber::EnvFilter;

fn run(db_path: &str) -> Result<()> {
    let storage = StorageManager::open(db_path)?;
    println!("Opened {} with {} page(s)", db_path, storage.num_pages());

    storage.extend_to(PageId::new(1))?;
    let page_id = PageId::new(1);
    let mut page = storage.load(page_id)?;

    let tuples = [
        Tuple::builder().int(1).float(1.5).string("Hello, World!").build(),
        Tuple::builder().int(2).float(2.5).string("This is SlotDB").build(),
        Tuple::builder().int(3).float(3.5).string("A slotted page store").build(),
    ];

    let mut slot_ids = Vec::new();
    for tuple in &tuples {
        let slot_id = page.add_tuple(tuple)?;
        println!("Inserted tuple at {}", slot_id);
        slot_ids.push(slot_id);
    }

    page.delete_tuple(slot_ids[1])?;
    println!("Deleted {}", slot_ids[1]);

    println!("\nPage stats:");
    println!("  - Tuple count: {}", page.tuple_count());
    println!("  - Used: {} bytes", page.used_bytes());
    println!("  - Free: {} bytes", page.free_bytes());

    storage.flush(page_id, &page)?;
    println!("\nFlushed {} to disk", page_id);

    let reloaded = storage.load(page_id)?;
    println!("\nReading back {}:", page_id);
    print!("{}", reloaded);

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slotdb=info")),
        )
        .init();

    println!("SlotDB - a slotted page storage engine");
    println!("======================================\n");

    let db_path = "demo.dat";
    let result = run(db_path);
    std::fs::remove_file(db_path).ok();

    match result {
        Ok(()) => {
            println!("\nDemo completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
