//! Command implementations.
//!
//! Each command opens its own connection, talks to the service through the
//! core proxies, and writes plain `key: value` lines.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use wallaroo_core::{Connection, ConnectionOptions, Resource, User};

/// `list-users`: every user and its record.
pub fn list_users(options: ConnectionOptions, out: &mut impl Write) -> Result<()> {
    let conn = Connection::configure(options)?;
    let users = conn.list("user")?;
    tracing::debug!("listed {} users at {}", users.len(), conn.revision());
    for (name, record) in &users {
        writeln!(out, "{}: {}", name, display(record))?;
    }
    Ok(())
}

/// `show-user NAME`: the declared attributes of one user.
pub fn show_user(options: ConnectionOptions, name: &str, out: &mut impl Write) -> Result<()> {
    let conn = Connection::configure(options)?;
    let mut user: User = conn.resource(name)?;
    user.refresh()
        .with_context(|| format!("Failed to fetch user '{}'", name))?;
    for (key, value) in user.proxy().attributes() {
        writeln!(out, "{}: {}", key, display(value))?;
    }
    Ok(())
}

/// `set-user-role NAME ROLE`: grant `role`, creating the user if needed.
pub fn set_user_role(options: ConnectionOptions, name: &str, role: &str) -> Result<()> {
    let conn = Connection::configure(options)?;
    let mut user: User = conn.resource(name)?;

    if user.exists()? {
        user.refresh()?;
        user.set_role(role).update()?;
    } else {
        user.set_role(role).create()?;
    }
    tracing::info!("user {} now has role {} (at {})", name, role, conn.revision());
    Ok(())
}

/// Strings print bare; everything else prints as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
