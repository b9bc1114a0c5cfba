//! Interactive login
//!
//! The web API has no token endpoint for third-party tools, so login is
//! manual: open claude.ai, let the user copy the `sessionKey` cookie from the
//! browser's developer tools, validate it, and store it together with the
//! organization id discovered along the way.

use crate::client::ClaudeUsageClient;
use crate::config::Config;
use crate::display::print_usage_stats;
use crate::session::{AuthSession, SessionStore};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

const LOGIN_URL: &str = "https://claude.ai";

/// Strip whitespace and the quotes browsers add when copying cookie values
pub fn clean_session_key(raw: &str) -> Option<String> {
    let key = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line)
}

/// Walk the user through copying the session cookie and return the key
fn prompt_for_session_key() -> Result<String> {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           Claude Monitor Lite - Authentication            ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    prompt_line("Press Enter to open browser...")?;

    if let Err(e) = open::that(LOGIN_URL) {
        warn!(error = %e, "Failed to open browser");
        println!("Could not open a browser. Please visit {} manually.", LOGIN_URL);
    }

    println!();
    println!("Browser opened. Please follow these steps:");
    println!();
    println!("  1. Login to Claude if not already logged in");
    println!("  2. Open DevTools (F12 or Cmd+Option+I on Mac)");
    println!("  3. Go to: Application tab → Cookies → {}", LOGIN_URL);
    println!("  4. Find the 'sessionKey' cookie");
    println!("  5. Double-click the Value to select it, then copy");
    println!();

    let raw = prompt_line("Paste your sessionKey here: ")?;
    match clean_session_key(&raw) {
        Some(key) => Ok(key),
        None => bail!("no session key provided"),
    }
}

/// Run the full login flow and persist the validated session
pub async fn login(config: &Config, store: &SessionStore) -> Result<AuthSession> {
    let key = tokio::task::spawn_blocking(prompt_for_session_key)
        .await
        .context("Login prompt task failed")??;

    let mut session = AuthSession::new(key);
    store
        .save_session(&mut session)
        .context("Failed to save session")?;
    println!();
    println!("{}", "✓ Session saved successfully!".green());
    println!();

    let client = ClaudeUsageClient::new(
        session.session_key.clone(),
        config.monitor.api_base_url.as_str(),
        config.monitor.request_timeout(),
    )?;

    let snapshot = match client.test_session().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Session validation failed: {}", e);
            println!("The session key may be invalid. Please try again.");
            return Err(e).context("Session validation failed");
        }
    };

    session.organization_id = client.organization_id().map(str::to_string);
    if let Err(e) = store.save_session(&mut session) {
        warn!(error = %e, "Failed to save organization ID");
    }
    info!(organization = ?session.organization_id, "Login complete");

    println!("{}", "✓ Session validated successfully!".green());
    println!();
    print_usage_stats(&snapshot);

    Ok(session)
}
