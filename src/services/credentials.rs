use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo_storage::Storage;

use crate::config::Config;
use crate::models::error::AppError;

/// Where the credential survives page reloads.
pub trait CredentialStorage {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), AppError>;
    fn remove(&self);
}

/// Browser `localStorage`, under [`Config::CREDENTIAL_STORAGE_KEY`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageBackend;

impl CredentialStorage for LocalStorageBackend {
    fn load(&self) -> Option<String> {
        gloo_storage::LocalStorage::get(Config::CREDENTIAL_STORAGE_KEY).ok()
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        gloo_storage::LocalStorage::set(Config::CREDENTIAL_STORAGE_KEY, token)
            .map_err(|e| AppError::StorageError(format!("Failed to save credential: {e}")))
    }

    fn remove(&self) {
        gloo_storage::LocalStorage::delete(Config::CREDENTIAL_STORAGE_KEY);
    }
}

/// Process-local storage, used off the browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<&'static str, String>>,
}

impl MemoryStorage {
    pub fn with_token(token: impl Into<String>) -> Self {
        let storage = Self::default();
        storage
            .items
            .borrow_mut()
            .insert(Config::CREDENTIAL_STORAGE_KEY, token.into());
        storage
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.items
            .borrow()
            .get(Config::CREDENTIAL_STORAGE_KEY)
            .cloned()
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        self.items
            .borrow_mut()
            .insert(Config::CREDENTIAL_STORAGE_KEY, token.to_string());
        Ok(())
    }

    fn remove(&self) {
        self.items.borrow_mut().remove(Config::CREDENTIAL_STORAGE_KEY);
    }
}

/// The single owner of the session credential.
///
/// Readers go through [`CredentialStore::token`]. Writes are limited to the
/// login/registration flow (`set`), logout (`clear`) and the HTTP client's
/// 401 handler (`clear`). Last writer wins. Subscribers hear about every
/// write, whichever of these made it.
pub struct CredentialStore {
    token: RefCell<Option<String>>,
    storage: Box<dyn CredentialStorage>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_id: Cell<u64>,
}

type Listener = Rc<dyn Fn(bool)>;

impl CredentialStore {
    /// Creates a store, picking up any credential already persisted.
    pub fn load(storage: impl CredentialStorage + 'static) -> Self {
        let token = storage.load().filter(|t| !t.is_empty());
        Self {
            token: RefCell::new(token),
            storage: Box::new(storage),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Stores the credential in memory and persists it.
    ///
    /// The in-memory value is updated even if persisting fails, so the
    /// current session keeps working; the error tells the caller the
    /// credential will not survive a reload.
    pub fn set(&self, token: impl Into<String>) -> Result<(), AppError> {
        let token = token.into();
        let persisted = self.storage.save(&token);
        *self.token.borrow_mut() = Some(token);
        self.notify();
        persisted
    }

    pub fn clear(&self) {
        self.token.borrow_mut().take();
        self.storage.remove();
        self.notify();
    }

    /// Calls `listener` with the new authenticated flag after every `set` or
    /// `clear`, until the returned subscription is dropped.
    pub fn subscribe(self: &Rc<Self>, listener: impl Fn(bool) + 'static) -> CredentialSubscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));

        CredentialSubscription {
            store: Rc::downgrade(self),
            id,
        }
    }

    fn notify(&self) {
        let authenticated = self.is_authenticated();
        // Listeners may unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            listener(authenticated);
        }
    }
}

/// Keeps a credential listener registered; dropping it unsubscribes.
pub struct CredentialSubscription {
    store: Weak<CredentialStore>,
    id: u64,
}

impl Drop for CredentialSubscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
