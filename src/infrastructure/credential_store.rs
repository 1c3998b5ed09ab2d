use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::LocalStorage;
use std::sync::{Arc, Mutex};

pub trait CredentialStore: Send + Sync {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError>;
    fn load_api_key(&self) -> Result<Option<String>, InfraError>;
    fn delete_api_key(&self) -> Result<(), InfraError>;
}

fn normalized(api_key: &str) -> Result<&str, InfraError> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() {
        return Err(InfraError::Credential("API key must not be empty".to_string()));
    }
    Ok(trimmed)
}

/// Plain-text entry next to the state blob, like the browser build.
#[derive(Clone)]
pub struct LocalStorageCredentialStore {
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl LocalStorageCredentialStore {
    pub fn new(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

impl CredentialStore for LocalStorageCredentialStore {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError> {
        self.storage
            .set_item(&self.key, normalized(api_key)?)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn load_api_key(&self) -> Result<Option<String>, InfraError> {
        let value = self
            .storage
            .get_item(&self.key)
            .map_err(|error| InfraError::Credential(error.to_string()))?;
        Ok(value.filter(|key| !key.trim().is_empty()))
    }

    fn delete_api_key(&self) -> Result<(), InfraError> {
        self.storage
            .remove_item(&self.key)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
    account_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, InfraError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError> {
        self.entry()?
            .set_password(normalized(api_key)?)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn load_api_key(&self) -> Result<Option<String>, InfraError> {
        match self.entry()?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }

    fn delete_api_key(&self) -> Result<(), InfraError> {
        match self.entry()?.delete_credential() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    api_key: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Mutex::new(Some(api_key.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, InfraError> {
        self.api_key
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError> {
        let api_key = normalized(api_key)?.to_string();
        *self.lock()? = Some(api_key);
        Ok(())
    }

    fn load_api_key(&self) -> Result<Option<String>, InfraError> {
        Ok(self.lock()?.clone())
    }

    fn delete_api_key(&self) -> Result<(), InfraError> {
        *self.lock()? = None;
        Ok(())
    }
}
