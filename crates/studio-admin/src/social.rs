//! Ordered social links stored inside the site settings
//!
//! The list is kept sorted by `order`, and `order` always runs `0..n`
//! after every operation.

use crate::error::AdminResult;
use studio_client::CrudApi;
use studio_core::{Error, Resource, SiteSettings, SocialLink, utils::ensure_unique_name};
use tracing::info;

/// Social links being edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
    links: Vec<SocialLink>,
}

impl SocialLinks {
    /// Take links as stored, sorting by their `order` and renumbering
    #[must_use]
    pub fn from_links(links: Vec<SocialLink>) -> Self {
        let mut this = Self { links };
        this.normalize();
        this
    }

    /// Stable sort by `order`, then renumber from zero
    pub fn normalize(&mut self) {
        self.links.sort_by_key(|link| link.order);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (order, link) in (0_u32..).zip(self.links.iter_mut()) {
            link.order = order;
        }
    }

    /// Links in display order
    #[must_use]
    pub fn links(&self) -> &[SocialLink] {
        &self.links
    }

    /// Give the links back, e.g. to store them in settings
    #[must_use]
    pub fn into_links(self) -> Vec<SocialLink> {
        self.links
    }

    /// Number of links
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether there are no links
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn check_index(index: usize, upper: usize) -> studio_core::Result<()> {
        if index > upper {
            return Err(Error::validation(
                "order",
                format!("position {index} is out of range (0..={upper})"),
            ));
        }
        Ok(())
    }

    /// Insert `link` at `at`, or append when `at` is `None`
    ///
    /// # Errors
    ///
    /// Returns a validation error for a duplicate or empty name, an empty
    /// URL, or a position past the end.
    pub fn insert(&mut self, link: SocialLink, at: Option<usize>) -> studio_core::Result<()> {
        ensure_unique_name(&link.name, self.links.iter().map(|l| l.name.as_str()), None)?;
        if link.url.trim().is_empty() {
            return Err(Error::validation("url", "URL is required"));
        }
        let at = at.unwrap_or(self.links.len());
        Self::check_index(at, self.links.len())?;

        self.links.insert(at, link);
        self.renumber();
        Ok(())
    }

    /// Replace the link at `index`
    ///
    /// # Errors
    ///
    /// Returns a validation error for a clashing name or a bad index.
    pub fn update(&mut self, index: usize, link: SocialLink) -> studio_core::Result<()> {
        ensure_unique_name(&link.name, self.links.iter().map(|l| l.name.as_str()), Some(index))?;
        let slot = self
            .links
            .get_mut(index)
            .ok_or_else(|| Error::validation("order", format!("no link at position {index}")))?;
        *slot = link;
        self.renumber();
        Ok(())
    }

    /// Remove and return the link at `index`
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad index.
    pub fn remove(&mut self, index: usize) -> studio_core::Result<SocialLink> {
        if index >= self.links.len() {
            return Err(Error::validation("order", format!("no link at position {index}")));
        }
        let removed = self.links.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Move the link at `from` to position `to`
    ///
    /// # Errors
    ///
    /// Returns a validation error when either position is out of range.
    pub fn move_to(&mut self, from: usize, to: usize) -> studio_core::Result<()> {
        let last = self.links.len().saturating_sub(1);
        if self.links.is_empty() {
            return Err(Error::validation("order", "there are no links to move"));
        }
        Self::check_index(from, last)?;
        Self::check_index(to, last)?;

        let link = self.links.remove(from);
        self.links.insert(to, link);
        self.renumber();
        Ok(())
    }

    /// Swap with the previous link; the first link stays put
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad index.
    pub fn move_up(&mut self, index: usize) -> studio_core::Result<()> {
        self.move_to(index, index.saturating_sub(1))
    }

    /// Swap with the next link; the last link stays put
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad index.
    pub fn move_down(&mut self, index: usize) -> studio_core::Result<()> {
        let last = self.links.len().saturating_sub(1);
        self.move_to(index, index.saturating_add(1).min(last))
    }
}

/// Read the settings document, or defaults when none exists yet
///
/// # Errors
///
/// Returns the backend failure.
pub async fn load_settings<A>(api: &A) -> AdminResult<SiteSettings>
where
    A: CrudApi<SiteSettings> + ?Sized,
{
    Ok(api.get_all().await?.into_iter().next().unwrap_or_default())
}

/// Store `links` into `settings` and save the document
///
/// # Errors
///
/// Returns the backend failure.
pub async fn save_links<A>(
    api: &A,
    mut settings: SiteSettings,
    links: SocialLinks,
) -> AdminResult<SiteSettings>
where
    A: CrudApi<SiteSettings> + ?Sized,
{
    settings.social_links = links.into_links();
    let saved = match settings.id().map(str::to_string) {
        Some(id) => api.update(&id, &settings).await?,
        None => api.create(&settings).await?,
    };
    info!(count = saved.social_links.len(), "saved social links");
    Ok(saved)
}
