use crate::error::{AppError, Result};
use crate::models::Account;
use anyhow::Context;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// The set of connected accounts, keyed by vendor user id.
///
/// When backed by a file, the whole set is rewritten as a JSON array after
/// every mutation and read back on startup.
pub struct AccountStore {
    accounts: RwLock<Vec<Account>>,
    path: Option<PathBuf>,
}

impl AccountStore {
    pub fn in_memory() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            path: None,
        }
    }

    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::in_memory());
        };

        let accounts = match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                let raw = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if raw.trim().is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_str(&raw)
                        .with_context(|| format!("Malformed account file {}", path.display()))?
                }
            }
            _ => Vec::new(),
        };

        tracing::info!("Loaded {} connected account(s)", accounts.len());

        Ok(Self {
            accounts: RwLock::new(accounts),
            path: Some(path),
        })
    }

    pub async fn list(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Account> {
        self.accounts.read().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn add(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.id == account.id) {
            return Err(AppError::Validation(format!(
                "Account {} is already connected",
                account.id
            )));
        }

        tracing::info!("Connected account {}", account.id);
        accounts.push(account);
        self.persist(&accounts).await
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Ok(false);
        }

        tracing::info!("Disconnected account {}", id);
        self.persist(&accounts).await?;
        Ok(true)
    }

    /// Swap in refreshed credentials. A missing refresh token keeps the old one.
    pub async fn update_tokens(
        &self,
        id: &str,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Account {} is not connected", id)))?;

        account.access_token = access_token;
        if refresh_token.is_some() {
            account.refresh_token = refresh_token;
        }
        let updated = account.clone();

        self.persist(&accounts).await?;
        Ok(updated)
    }

    /// Resolve the two ends of a transfer.
    pub async fn pair(&self, source_id: &str, target_id: &str) -> Result<(Account, Account)> {
        if source_id == target_id {
            return Err(AppError::Validation(
                "Source and target accounts must be different".to_string(),
            ));
        }

        let source = self.get(source_id).await;
        let target = self.get(target_id).await;
        match (source, target) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(AppError::Validation(
                "Please select both source and target accounts".to_string(),
            )),
        }
    }

    async fn persist(&self, accounts: &[Account]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(accounts).map_err(|e| AppError::Internal(e.into()))?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
