//! Shared fixtures for the management-layer integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use studio_client::CrudApi;
use studio_core::{Error, GalleryItem, Resource, Result};

type Hook<T> = Box<dyn Fn(&mut Vec<T>) + Send + Sync>;

/// Requests seen by a [`MemoryApi`]
#[derive(Debug, Default)]
pub struct Calls {
    pub get_all: AtomicUsize,
    pub get: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [&self.get_all, &self.get, &self.create, &self.update, &self.delete]
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    pub fn mutations(&self) -> usize {
        [&self.create, &self.update, &self.delete]
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }
}

/// In-memory backend with the same semantics as the REST collections
pub struct MemoryApi<T> {
    items: Mutex<Vec<T>>,
    next_id: AtomicUsize,
    prefix: &'static str,
    fail: AtomicBool,
    fail_reads: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    after_update: Mutex<Option<Hook<T>>>,
    pub calls: Calls,
}

impl<T: Resource> MemoryApi<T> {
    pub fn new(prefix: &'static str, items: Vec<T>) -> Self {
        Self {
            next_id: AtomicUsize::new(items.len() + 1),
            items: Mutex::new(items),
            prefix,
            fail: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            read_delay: Mutex::new(None),
            after_update: Mutex::new(None),
            calls: Calls::default(),
        }
    }

    /// Make every request fail with a 500
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make only collection reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make collection reads take `delay` before answering
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Run `hook` on the stored items after every successful update,
    /// standing in for another admin session
    pub fn after_update(&self, hook: impl Fn(&mut Vec<T>) + Send + Sync + 'static) {
        *self.after_update.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn edit(&self, change: impl FnOnce(&mut Vec<T>)) {
        change(&mut self.items.lock().unwrap());
    }

    fn check(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

/// Records get their id through serde so one backend serves every type
fn with_id<T: Resource>(data: &T, id: &str) -> T {
    let mut value = serde_json::to_value(data).unwrap();
    value["id"] = serde_json::Value::String(id.to_string());
    serde_json::from_value(value).unwrap()
}

#[async_trait]
impl<T: Resource> CrudApi<T> for MemoryApi<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        self.check(&self.calls.get_all)?;
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        Ok(self.items())
    }

    async fn get(&self, id: &str) -> Result<T> {
        self.check(&self.calls.get)?;
        self.items()
            .into_iter()
            .find(|item| item.id() == Some(id))
            .ok_or_else(|| Error::NotFound {
                resource: format!("content/{}/{id}", T::PATH),
            })
    }

    async fn create(&self, data: &T) -> Result<T> {
        self.check(&self.calls.create)?;
        let id = format!("{}{}", self.prefix, self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = with_id(data, &id);
        self.items.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, data: &T) -> Result<T> {
        self.check(&self.calls.update)?;
        let updated = with_id(data, id);
        {
            let mut items = self.items.lock().unwrap();
            let slot = items
                .iter_mut()
                .find(|item| item.id() == Some(id))
                .ok_or_else(|| Error::NotFound {
                    resource: format!("content/{}/{id}", T::PATH),
                })?;
            *slot = updated.clone();
            if let Some(hook) = self.after_update.lock().unwrap().as_ref() {
                hook(&mut items);
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check(&self.calls.delete)?;
        self.items.lock().unwrap().retain(|item| item.id() != Some(id));
        Ok(())
    }
}

pub fn gallery_item(id: &str, title: &str, featured: bool) -> GalleryItem {
    GalleryItem {
        id: Some(id.to_string()),
        title: title.to_string(),
        featured,
        ..GalleryItem::default()
    }
}
