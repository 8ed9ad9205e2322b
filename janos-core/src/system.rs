use anyhow::{Result, bail, ensure};
use tracing::info;

use crate::session::SessionManager;

/// Restart the peripheral. Nothing is collected; the link stays open.
pub async fn reboot(session: &mut SessionManager) -> Result<()> {
    session.ensure_link_free().await?;
    if !session.send("reboot").await {
        bail!("Failed to send reboot to {}", session.device());
    }
    info!("Reboot requested");
    Ok(())
}

pub async fn ping(session: &mut SessionManager, host: &str) -> Result<Vec<String>> {
    let host = host.trim();
    ensure!(!host.is_empty(), "No host given to ping");
    session
        .exchange(&format!("ping {host}"), session.config().response_window)
        .await
}

/// Raw `list_sd` output
pub async fn list_sd(session: &mut SessionManager) -> Result<Vec<String>> {
    session
        .exchange("list_sd", session.config().response_window)
        .await
}
