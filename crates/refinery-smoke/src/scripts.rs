//! In-page JavaScript run through the driver's evaluation bridge.
//!
//! Every value is embedded as a JSON literal. The record-put script never
//! rejects at the protocol level: it settles to `{ ok, reason }` so the
//! reason string survives the round trip intact.

use crate::record::{ConversationRecord, StoreTarget};
use crate::result::SmokeResult;

/// Expression yielding the document's ready state
pub const READY_STATE: &str = "document.readyState";

/// Script writing one local-storage entry
pub fn set_local_storage(key: &str, value: &str) -> SmokeResult<String> {
    let key = serde_json::to_string(key)?;
    let value = serde_json::to_string(value)?;
    Ok(format!(
        "(() => {{ localStorage.setItem({key}, {value}); return true; }})()"
    ))
}

/// Script opening `target.database`, checking for `target.store`, and putting `record`
pub fn put_record(target: &StoreTarget, record: &ConversationRecord) -> SmokeResult<String> {
    let database = serde_json::to_string(&target.database)?;
    let store = serde_json::to_string(&target.store)?;
    let record = serde_json::to_string(record)?;
    Ok(format!(
        r#"new Promise((resolve, reject) => {{
    try {{
        const request = indexedDB.open({database});
        request.onsuccess = (event) => {{
            const db = event.target.result;
            if (!db.objectStoreNames.contains({store})) {{
                reject('Store ' + {store} + ' not found');
                return;
            }}
            const tx = db.transaction([{store}], 'readwrite');
            const req = tx.objectStore({store}).put({record});
            req.onsuccess = () => resolve();
            req.onerror = (e) => reject('Put failed: ' + e.target.error);
        }};
        request.onerror = (e) => reject('Open failed: ' + e.target.error);
    }} catch (e) {{
        reject('Exception: ' + e.message);
    }}
}}).then(() => ({{ ok: true }}), (reason) => ({{ ok: false, reason: String(reason) }}))"#
    ))
}
