//! `dehasher set-key` and `dehasher clear-key`

use crate::state::AppState;
use dehasher_vault::DEHASHED_PROVIDER;

/// Seal and store the API key.
pub async fn set_key(key: &str, state: &AppState) -> anyhow::Result<()> {
    let keys = state.key_store().await?;
    keys.set_api_key(DEHASHED_PROVIDER, key).await?;
    println!("[+] API key stored");
    Ok(())
}

/// Remove the stored API key.
pub async fn clear_key(state: &AppState) -> anyhow::Result<()> {
    let keys = state.key_store().await?;
    if keys.clear_api_key(DEHASHED_PROVIDER).await? {
        println!("[+] API key removed");
    } else {
        println!("[-] No API key stored");
    }
    Ok(())
}
