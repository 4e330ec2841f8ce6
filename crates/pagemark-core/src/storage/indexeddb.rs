//! IndexedDB storage implementation for WebAssembly.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

use super::{AnnotationSet, BoxFuture, Storage, StorageError, StorageResult};

const DB_NAME: &str = "pagemark";
const DB_VERSION: u32 = 1;
const STORE_NAME: &str = "annotations";

/// IndexedDB-based storage for WebAssembly.
///
/// Not Send/Sync: IndexedDB handles belong to the single browser thread.
pub struct IndexedDbStorage {
    /// Cached database connection.
    db: Rc<RefCell<Option<IdbDatabase>>>,
}

impl IndexedDbStorage {
    /// The connection is opened lazily on first use.
    pub fn new() -> Self {
        Self {
            db: Rc::new(RefCell::new(None)),
        }
    }

    async fn get_db(&self) -> StorageResult<IdbDatabase> {
        if let Some(db) = self.db.borrow().as_ref() {
            return Ok(db.clone());
        }

        let window = web_sys::window().ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        let idb_factory = window
            .indexed_db()
            .map_err(|e| StorageError::Other(format!("IndexedDB error: {e:?}")))?
            .ok_or_else(|| StorageError::Other("IndexedDB not available".to_string()))?;
        let open_request = idb_factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(|e| StorageError::Other(format!("Failed to open DB: {e:?}")))?;

        let onupgrade = Closure::once(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
            let Some(target) = event.target() else {
                log::error!("Upgrade event without target");
                return;
            };
            let request: IdbRequest = target.unchecked_into();
            let db: IdbDatabase = match request.result() {
                Ok(result) => result.unchecked_into(),
                Err(e) => {
                    log::error!("Upgrade request has no database: {e:?}");
                    return;
                }
            };
            if !db.object_store_names().contains(STORE_NAME) {
                if let Err(e) = db.create_object_store(STORE_NAME) {
                    log::error!("Failed to create object store: {e:?}");
                }
            }
        }) as Box<dyn FnOnce(_)>);
        open_request.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db = await_idb_request::<IdbDatabase>(&open_request).await?;
        *self.db.borrow_mut() = Some(db.clone());
        Ok(db)
    }

    fn get_store(&self, db: &IdbDatabase, mode: IdbTransactionMode) -> StorageResult<IdbObjectStore> {
        let transaction = db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(|e| StorageError::Other(format!("Transaction error: {e:?}")))?;
        transaction
            .object_store(STORE_NAME)
            .map_err(|e| StorageError::Other(format!("Store error: {e:?}")))
    }
}

impl Default for IndexedDbStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for IndexedDbStorage {
    fn save(&self, key: &str, set: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = set.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;
            let request = store
                .put_with_key(&JsValue::from_str(&json), &JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Put error: {e:?}")))?;
            await_idb_request::<JsValue>(&request).await?;
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let key = key.to_string();
        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;
            let request = store
                .get(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Get error: {e:?}")))?;
            let result = await_idb_request::<JsValue>(&request).await?;
            if result.is_undefined() || result.is_null() {
                return Err(StorageError::NotFound(key));
            }
            let json = result
                .as_string()
                .ok_or_else(|| StorageError::Serialization("Invalid stored data".to_string()))?;
            AnnotationSet::from_json(&json).map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;
            let request = store
                .delete(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Delete error: {e:?}")))?;
            await_idb_request::<JsValue>(&request).await?;
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;
            let request = store
                .get_all_keys()
                .map_err(|e| StorageError::Other(format!("GetAllKeys error: {e:?}")))?;
            let result = await_idb_request::<js_sys::Array>(&request).await?;
            Ok(result.iter().filter_map(|key| key.as_string()).collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;
            let request = store
                .count_with_key(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Count error: {e:?}")))?;
            let result = await_idb_request::<JsValue>(&request).await?;
            Ok(result.as_f64().unwrap_or(0.0) > 0.0)
        })
    }
}

/// Await an IndexedDB request through a Promise.
async fn await_idb_request<T: JsCast>(request: &IdbRequest) -> StorageResult<T> {
    use wasm_bindgen_futures::JsFuture;

    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let onsuccess = Closure::once(Box::new(move |event: web_sys::Event| {
            let result = event
                .target()
                .map(|target| target.unchecked_into::<IdbRequest>())
                .and_then(|request| request.result().ok())
                .unwrap_or(JsValue::UNDEFINED);
            if let Err(e) = resolve.call1(&JsValue::NULL, &result) {
                log::error!("Failed to resolve IndexedDB promise: {e:?}");
            }
        }) as Box<dyn FnOnce(_)>);

        let onerror = Closure::once(Box::new(move |_event: web_sys::Event| {
            if let Err(e) = reject.call1(&JsValue::NULL, &JsValue::from_str("IndexedDB request failed")) {
                log::error!("Failed to reject IndexedDB promise: {e:?}");
            }
        }) as Box<dyn FnOnce(_)>);

        request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        request.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    });

    JsFuture::from(promise)
        .await
        .map_err(|e| StorageError::Other(format!("IndexedDB request failed: {e:?}")))?
        .dyn_into::<T>()
        .map_err(|_| StorageError::Other("Type conversion failed".to_string()))
}
