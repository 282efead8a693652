//! Scripted in-process backend for engine tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::models::{CatalogRecord, WishlistRecord};
use crate::remote::{RemoteError, RemoteResult, WishlistRemote};

#[derive(Default)]
struct FakeState {
    records: BTreeMap<i64, WishlistRecord>,
    next_id: i64,
    online: bool,
    upsert_all_failures: u32,
    get_all_failures: u32,
    calls: Vec<&'static str>,
}

/// Holds one remote call open until released.
#[derive(Default)]
pub struct Pause {
    entered: Notify,
    release: Notify,
}

impl Pause {
    /// Wait until the paused call has been reached.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

pub struct FakeRemote {
    state: Mutex<FakeState>,
    pause: Mutex<Option<(&'static str, Arc<Pause>)>>,
}

impl FakeRemote {
    pub fn online() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 100,
                online: true,
                ..FakeState::default()
            }),
            pause: Mutex::new(None),
        }
    }

    pub fn offline() -> Self {
        let remote = Self::online();
        remote.set_online(false);
        remote
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    pub fn fail_upsert_all(&self, times: u32) {
        self.state.lock().unwrap().upsert_all_failures = times;
    }

    pub fn fail_get_all(&self, times: u32) {
        self.state.lock().unwrap().get_all_failures = times;
    }

    /// Store a record as if another device had created it.
    pub fn seed(&self, record: WishlistRecord) -> i64 {
        store_record(&mut self.state.lock().unwrap(), record).id.unwrap_or_default()
    }

    pub fn records(&self) -> Vec<WishlistRecord> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Hold the next `call` open until the returned pause is released.
    ///
    /// `get_all` pauses after reading the server list, `upsert` before
    /// storing the record.
    pub fn pause_on(&self, call: &'static str) -> Arc<Pause> {
        let pause = Arc::new(Pause::default());
        *self.pause.lock().unwrap() = Some((call, pause.clone()));
        pause
    }

    async fn hold(&self, call: &'static str) {
        let pause = {
            let mut slot = self.pause.lock().unwrap();
            if slot.as_ref().is_some_and(|(paused, _)| *paused == call) {
                slot.take().map(|(_, pause)| pause)
            } else {
                None
            }
        };
        if let Some(pause) = pause {
            pause.entered.notify_one();
            pause.release.notified().await;
        }
    }

    fn begin(&self, call: &'static str) -> RemoteResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.online {
            Ok(state)
        } else {
            Err(RemoteError::Unavailable(format!("{call}: connection refused")))
        }
    }
}

fn store_record(state: &mut FakeState, mut record: WishlistRecord) -> WishlistRecord {
    let id = record.server_id().unwrap_or_else(|| {
        state.next_id += 1;
        state.next_id
    });
    record.id = Some(id);
    state.records.insert(id, record.clone());
    record
}

#[async_trait]
impl WishlistRemote for FakeRemote {
    async fn get_all(&self) -> RemoteResult<Vec<WishlistRecord>> {
        let records: Vec<WishlistRecord> = {
            let mut state = self.begin("get_all")?;
            if state.get_all_failures > 0 {
                state.get_all_failures -= 1;
                return Err(RemoteError::Api {
                    status: 503,
                    message: "maintenance".to_string(),
                });
            }
            state.records.values().cloned().collect()
        };
        self.hold("get_all").await;
        Ok(records)
    }

    async fn upsert(&self, record: &WishlistRecord) -> RemoteResult<WishlistRecord> {
        self.hold("upsert").await;
        let mut state = self.begin("upsert")?;
        Ok(store_record(&mut state, record.clone()))
    }

    async fn upsert_all(&self, records: &[WishlistRecord]) -> RemoteResult<Vec<WishlistRecord>> {
        let mut state = self.begin("upsert_all")?;
        if state.upsert_all_failures > 0 {
            state.upsert_all_failures -= 1;
            return Err(RemoteError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(records
            .iter()
            .map(|record| store_record(&mut state, record.clone()))
            .collect())
    }

    async fn delete(&self, id: i64) -> RemoteResult<()> {
        let mut state = self.begin("delete")?;
        state.records.remove(&id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[i64]) -> RemoteResult<()> {
        let mut state = self.begin("delete_many")?;
        for id in ids {
            state.records.remove(id);
        }
        Ok(())
    }

    async fn purchase(&self, id: i64) -> RemoteResult<CatalogRecord> {
        let mut state = self.begin("purchase")?;
        let Some(record) = state.records.remove(&id) else {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("wishlist item {id} not found"),
            });
        };
        state.next_id += 1;
        Ok(CatalogRecord {
            id: Some(state.next_id),
            title: record.title,
            author: record.author,
            isbn: record.isbn,
            read: Some(false),
            ..CatalogRecord::default()
        })
    }
}
