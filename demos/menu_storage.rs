//! Storing and materializing a hierarchical menu.

use links_db::{MemoryBackend, MenuStore, ROOT_PARENT};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let data_dir = tempfile::tempdir()?;
    let menus = MenuStore::open(data_dir.path(), Box::new(MemoryBackend::new()))?;

    let menu = vec![
        json!({"label": "Home", "icon": "house", "to": "/"}),
        json!({
            "label": "Admin",
            "icon": "gear",
            "items": [
                {"label": "Users", "to": "/admin/users"},
                {"label": "Settings", "to": "/admin/settings", "items": [
                    {"label": "Appearance", "to": "/admin/settings/appearance"}
                ]}
            ]
        }),
    ];

    println!("=== Menu storage ===\n");

    println!("1. Storing the menu structure...");
    let ids = menus.store_tree(&menu, ROOT_PARENT)?;
    println!("   Stored {} items: {:?}\n", ids.len(), ids);

    println!("2. Materializing it back from links + blobs...");
    let forest = menus.tree(ROOT_PARENT)?;
    println!("{}\n", serde_json::to_string_pretty(&forest)?);

    println!("3. Statistics: {:?}\n", menus.stats()?);

    println!("4. Deleting the Admin subtree...");
    menus.delete_item(ids[1])?;
    let remaining = menus.tree(ROOT_PARENT)?;
    println!("   {} root item(s) left\n", remaining.len());

    println!("5. Statistics after delete: {:?}", menus.stats()?);

    Ok(())
}
