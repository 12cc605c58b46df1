use crate::services::AuthService;

pub async fn cmd_user_set(
    auth: &dyn AuthService,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    if auth.user_exists(username).await? {
        auth.change_password(username, password).await?;
        println!("✓ Password changed for '{username}'");
    } else {
        let id = auth.add_user(username, password).await?;
        println!("✓ User '{username}' created (ID: {id})");
    }
    Ok(())
}

pub async fn cmd_user_delete(auth: &dyn AuthService, username: &str) -> anyhow::Result<()> {
    auth.remove_user(username).await?;
    println!("✓ User '{username}' deleted");
    Ok(())
}

pub async fn cmd_user_list(auth: &dyn AuthService) -> anyhow::Result<()> {
    let users = auth.list_users().await?;

    if users.is_empty() {
        println!("No users. Add one with 'bookmarks user set <username> <password>'");
        return Ok(());
    }

    println!("Users:");
    println!("{:-<40}", "");
    for username in users {
        println!("• {username}");
    }
    Ok(())
}
