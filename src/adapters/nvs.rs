//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`PersistencePort`] for the session record: one
//! postcard-encoded [`PersistedState`] blob under namespace
//! `"roxyredlight"`, key `"state"`. ESP-IDF NVS commits are atomic per
//! `nvs_commit()`, so a power cut mid-save leaves the previous record.
//!
//! The simulation backend keeps blobs in a `HashMap` (dev/test only).

use log::{info, warn};

use crate::app::ports::{PersistedState, PersistencePort, StorageError};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const NAMESPACE: &str = "roxyredlight";
pub const STATE_KEY: &str = "state";

/// Upper bound on the record size; anything larger is corrupt.
const MAX_BLOB_SIZE: usize = 64;

pub struct NvsAdapter {
    /// `false` when flash init failed; every access then reports `IoError`.
    online: bool,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Initialise NVS flash. On a full or version-mismatched partition the
    /// partition is erased and re-initialised.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK as i32 {
            return Err(StorageError::IoError);
        }
        info!("NvsAdapter: ESP-IDF NVS initialised");
        Ok(Self { online: true })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, StorageError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self { online: true, store: HashMap::new() })
    }

    /// An adapter that persists nothing. Used when flash init fails so the
    /// device still runs, with counters lost at power-off.
    pub fn offline() -> Self {
        warn!("NvsAdapter: offline, session record will not persist");
        Self {
            online: false,
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    // ── Raw blob access ───────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn read_blob(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.store
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    pub fn read_blob(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let key_c = c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            let mut size: usize = 0;
            // First call: size only.
            let ret = unsafe {
                nvs_get_blob(handle, key_c.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH as i32);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, key_c.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });
        result.map_err(map_esp_err)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn write_blob(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        self.store.insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    pub fn write_blob(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        let key_c = c_name(key);
        let result = Self::with_nvs_handle(namespace, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key_c.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(map_esp_err)
    }
}

/// NVS names are limited to 15 characters plus NUL.
#[cfg(target_os = "espidf")]
fn c_name(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let bytes = name.as_bytes();
    let len = bytes.len().min(15);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

#[cfg(target_os = "espidf")]
fn map_esp_err(code: i32) -> StorageError {
    if code == ESP_ERR_NVS_NOT_FOUND as i32 {
        StorageError::NotFound
    } else if code == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        StorageError::Full
    } else if code == ESP_ERR_NVS_INVALID_LENGTH as i32 {
        StorageError::Corrupted
    } else {
        StorageError::IoError
    }
}

impl PersistencePort for NvsAdapter {
    fn load(&self) -> Result<PersistedState, StorageError> {
        if !self.online {
            return Err(StorageError::IoError);
        }
        let bytes = self.read_blob(NAMESPACE, STATE_KEY)?;
        let state: PersistedState = postcard::from_bytes(&bytes).map_err(|_| {
            warn!("NvsAdapter: stored record undecodable ({} bytes)", bytes.len());
            StorageError::Corrupted
        })?;
        info!("NvsAdapter: loaded record ({} bytes)", bytes.len());
        Ok(state)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        if !self.online {
            return Err(StorageError::IoError);
        }
        let bytes = postcard::to_allocvec(state).map_err(|_| StorageError::IoError)?;
        self.write_blob(NAMESPACE, STATE_KEY, &bytes)?;
        info!("NvsAdapter: record saved ({} bytes)", bytes.len());
        Ok(())
    }
}
