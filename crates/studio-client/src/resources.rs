//! Per-collection CRUD groups
//!
//! Every content type is served under `/content/<path>` with the same
//! collection (`GET`, `POST`) and item (`GET`, `PUT`, `DELETE /:id`)
//! semantics, so one generic group covers them all.

use crate::api_client::ApiClient;
use async_trait::async_trait;
use reqwest::Url;
use std::fmt;
use std::marker::PhantomData;
use studio_core::{
    AboutSection, Achievement, Booking, Category, Certificate, Contact, Error, GalleryItem,
    Resource, Result, Service, SiteSettings, Testimonial, TimelineEntry,
};
use tracing::info;

/// Remote store of record for one content type
///
/// Management stores talk to this trait rather than to HTTP directly.
#[async_trait]
pub trait CrudApi<T: Resource>: Send + Sync {
    /// Fetch the whole collection
    async fn get_all(&self) -> Result<Vec<T>>;

    /// Fetch one record
    async fn get(&self, id: &str) -> Result<T>;

    /// Create a record; the reply carries the server-assigned id
    async fn create(&self, data: &T) -> Result<T>;

    /// Overwrite a record
    async fn update(&self, id: &str, data: &T) -> Result<T>;

    /// Delete a record
    async fn delete(&self, id: &str) -> Result<()>;
}

/// HTTP implementation of [`CrudApi`] for one content type
pub struct ResourceApi<T> {
    client: ApiClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceApi<T> {
    /// Create a group on top of a shared client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    fn collection_path() -> String {
        format!("content/{}", T::PATH)
    }

    /// `content/<path>/<id>` with `id` escaped as a single segment
    fn item_path(id: &str) -> Result<String> {
        let mut url = Url::parse("http://backend.invalid/content")
            .map_err(|e| Error::Other(format!("Invalid item URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::Other("Invalid item URL".to_string()))?
            .push(T::PATH)
            .push(id);
        Ok(url.path().trim_start_matches('/').to_string())
    }
}

impl<T> Clone for ResourceApi<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> fmt::Debug for ResourceApi<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceApi")
            .field("path", &T::PATH)
            .field("base_url", &self.client.base_url())
            .finish()
    }
}

#[async_trait]
impl<T: Resource> CrudApi<T> for ResourceApi<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        self.client.get_json(&Self::collection_path()).await
    }

    async fn get(&self, id: &str) -> Result<T> {
        self.client.get_json(&Self::item_path(id)?).await
    }

    async fn create(&self, data: &T) -> Result<T> {
        let created: T = self.client.post_json(&Self::collection_path(), data).await?;
        info!(resource = T::PATH, id = created.id().unwrap_or_default(), "created {}", T::LABEL);
        Ok(created)
    }

    async fn update(&self, id: &str, data: &T) -> Result<T> {
        let updated = self.client.put_json(&Self::item_path(id)?, data).await?;
        info!(resource = T::PATH, id, "updated {}", T::LABEL);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&Self::item_path(id)?).await?;
        info!(resource = T::PATH, id, "deleted {}", T::LABEL);
        Ok(())
    }
}

impl ApiClient {
    /// CRUD group for any content type
    #[must_use]
    pub fn resource<T: Resource>(&self) -> ResourceApi<T> {
        ResourceApi::new(self.clone())
    }

    /// `/content/gallery`
    #[must_use]
    pub fn gallery(&self) -> ResourceApi<GalleryItem> {
        self.resource()
    }

    /// `/content/about`
    #[must_use]
    pub fn about(&self) -> ResourceApi<AboutSection> {
        self.resource()
    }

    /// `/content/achievements`
    #[must_use]
    pub fn achievements(&self) -> ResourceApi<Achievement> {
        self.resource()
    }

    /// `/content/timeline`
    #[must_use]
    pub fn timeline(&self) -> ResourceApi<TimelineEntry> {
        self.resource()
    }

    /// `/content/services`
    #[must_use]
    pub fn services(&self) -> ResourceApi<Service> {
        self.resource()
    }

    /// `/content/categories`
    #[must_use]
    pub fn categories(&self) -> ResourceApi<Category> {
        self.resource()
    }

    /// `/content/bookings`
    #[must_use]
    pub fn bookings(&self) -> ResourceApi<Booking> {
        self.resource()
    }

    /// `/content/contacts`
    #[must_use]
    pub fn contacts(&self) -> ResourceApi<Contact> {
        self.resource()
    }

    /// `/content/certificates`
    #[must_use]
    pub fn certificates(&self) -> ResourceApi<Certificate> {
        self.resource()
    }

    /// `/content/testimonials`
    #[must_use]
    pub fn testimonials(&self) -> ResourceApi<Testimonial> {
        self.resource()
    }

    /// `/content/settings`
    #[must_use]
    pub fn settings(&self) -> ResourceApi<SiteSettings> {
        self.resource()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_item_path_escapes_id() {
        assert_eq!(ResourceApi::<Category>::item_path("c1").unwrap(), "content/categories/c1");
        assert_eq!(
            ResourceApi::<GalleryItem>::item_path("a/b?c#d e").unwrap(),
            "content/gallery/a%2Fb%3Fc%23d%20e"
        );
    }
}
