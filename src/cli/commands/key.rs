use crate::services::AuthService;

pub async fn cmd_key_create(auth: &dyn AuthService, name: &str) -> anyhow::Result<()> {
    let key = auth.create_api_key(name).await?;
    println!("✓ API key '{name}' created:");
    println!("{key}");
    Ok(())
}

pub async fn cmd_key_list(auth: &dyn AuthService) -> anyhow::Result<()> {
    let keys = auth.list_api_keys().await?;

    if keys.is_empty() {
        println!("No API keys. Create one with 'bookmarks key create <name>'");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<34} KEY", "ID", "NAME", "CREATED");
    println!("{:-<130}", "");
    for key in keys {
        println!(
            "{:<6} {:<24} {:<34} {}",
            key.id, key.name, key.created_at, key.key
        );
    }
    Ok(())
}

pub async fn cmd_key_delete(auth: &dyn AuthService, id: i32) -> anyhow::Result<()> {
    auth.delete_api_key(id).await?;
    println!("✓ API key {id} deleted");
    Ok(())
}
