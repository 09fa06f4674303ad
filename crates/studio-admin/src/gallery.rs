//! Featured flag handling for the gallery
//!
//! At most one gallery item is meant to be featured, but the backend does
//! not enforce it. Toggling here unfeatures the current item first (after
//! asking), then re-reads the collection and reports any second featured
//! item left behind by a concurrent session instead of fixing it.

use crate::dialog::Confirm;
use crate::error::{AdminError, AdminResult};
use crate::store::CollectionStore;
use studio_client::CrudApi;
use studio_core::{EntityId, GalleryItem, Resource};
use tracing::{info, warn};

/// Result of [`CollectionStore::set_featured`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureOutcome {
    /// `id` is now the featured item
    Featured {
        /// Gallery item id
        id: EntityId,
    },
    /// `id` was featured and no longer is
    Unfeatured {
        /// Gallery item id
        id: EntityId,
    },
    /// The user kept the current featured item
    Declined,
    /// The re-read collection has more than one featured item
    Conflict {
        /// Every featured id seen
        featured: Vec<EntityId>,
    },
}

impl CollectionStore<GalleryItem> {
    /// Featured items, in list order
    pub fn featured(&self) -> impl Iterator<Item = &GalleryItem> {
        self.items().iter().filter(|item| item.featured)
    }

    /// Toggle the featured flag of `id`
    ///
    /// Featuring an item while another is featured asks `confirm` first;
    /// declining changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] for an unknown id or the first
    /// backend failure. A failure after the previous item was unfeatured
    /// leaves nothing featured.
    pub async fn set_featured<A>(
        &mut self,
        api: &A,
        id: &str,
        confirm: &dyn Confirm,
    ) -> AdminResult<FeatureOutcome>
    where
        A: CrudApi<GalleryItem> + ?Sized,
    {
        let target = self
            .find(id)
            .cloned()
            .ok_or_else(|| AdminError::missing(GalleryItem::LABEL, id))?;

        let outcome = if target.featured {
            self.write_featured(api, target, false).await?;
            FeatureOutcome::Unfeatured { id: id.to_string() }
        } else {
            let previous: Vec<GalleryItem> = self
                .featured()
                .filter(|item| item.id() != Some(id))
                .cloned()
                .collect();

            if let Some(current) = previous.first() {
                let question = format!(
                    "'{}' is currently featured. Feature '{}' instead?",
                    current.title, target.title
                );
                if !confirm.confirm(&question) {
                    return Ok(FeatureOutcome::Declined);
                }
            }

            for item in previous {
                self.write_featured(api, item, false).await?;
            }
            self.write_featured(api, target, true).await?;
            FeatureOutcome::Featured { id: id.to_string() }
        };

        Ok(self.verify_featured(api, outcome).await)
    }

    async fn write_featured<A>(&mut self, api: &A, mut item: GalleryItem, featured: bool) -> AdminResult<()>
    where
        A: CrudApi<GalleryItem> + ?Sized,
    {
        let id = item
            .id
            .clone()
            .ok_or_else(|| AdminError::missing(GalleryItem::LABEL, ""))?;
        item.featured = featured;
        self.update(api, &id, item).await?;
        info!(id, featured, "gallery featured flag written");
        Ok(())
    }

    async fn verify_featured<A>(&mut self, api: &A, outcome: FeatureOutcome) -> FeatureOutcome
    where
        A: CrudApi<GalleryItem> + ?Sized,
    {
        match api.get_all().await {
            Ok(items) => self.set_items(items),
            Err(e) => {
                warn!(error = %e, "could not re-read gallery after toggling featured");
                return outcome;
            }
        }

        let featured: Vec<EntityId> = self
            .featured()
            .filter_map(|item| item.id.clone())
            .collect();
        if featured.len() > 1 {
            warn!(?featured, "more than one gallery item is featured");
            FeatureOutcome::Conflict { featured }
        } else {
            outcome
        }
    }
}
