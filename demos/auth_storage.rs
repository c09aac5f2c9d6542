//! User, token, and password lifecycle.

use links_db::{AuthStore, MemoryBackend};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let data_dir = tempfile::tempdir()?;
    let auth = AuthStore::open(data_dir.path(), Box::new(MemoryBackend::new()))?;

    println!("=== Auth storage ===\n");

    println!("1. Creating a user...");
    let user = auth.create_user(object(json!({
        "username": "ada",
        "email": "ada@example.com",
        "displayName": "Ada Lovelace"
    })))?;
    println!("   Created {}\n", user.user_id);

    println!("2. Issuing a token...");
    let token = auth.create_token(&user.user_id, object(json!({
        "apiKey": "key-1234",
        "permissions": ["read", "write"]
    })))?;
    println!("   Created {}\n", token.token_id);

    println!("3. Setting a password (twice; only the second survives)...");
    auth.set_password(&user.user_id, object(json!({"hash": "old", "algorithm": "argon2"})))?;
    auth.set_password(&user.user_id, object(json!({"hash": "new", "algorithm": "argon2"})))?;
    let active = auth.user_password(&user.user_id)?.expect("password was just set");
    println!("   Active password: {}\n", active.password_id);

    println!("4. Reverse lookups...");
    let by_name = auth.find_user_by_username("ada")?.expect("user exists");
    let by_key = auth.find_token_by_api_key("key-1234")?.expect("token exists");
    println!("   username 'ada' -> {}", by_name.user_id);
    println!("   apiKey 'key-1234' -> {}\n", by_key.token_id);

    println!("5. Statistics: {:?}\n", auth.stats()?);

    println!("6. Deleting the user (cascades to tokens and passwords)...");
    auth.delete_user(&user.user_id)?;
    println!("   Statistics after cascade: {:?}", auth.stats()?);

    Ok(())
}
