//! Page state for one content collection
//!
//! A [`CollectionStore`] owns the list shown on a management page, the
//! create/edit form, the delete confirmation and the inline status
//! banners. Every remote call goes through a [`CrudApi`], so the same store
//! drives both the HTTP backend and the in-memory one used in tests.

use crate::dialog::{Confirm, ConfirmDialog, Dialog};
use crate::error::{AdminError, AdminResult};
use studio_client::CrudApi;
use studio_core::{EntityId, Resource, utils::ensure_unique_name};
use tracing::{debug, error, warn};

/// Loading flag and inline banners of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStatus {
    /// A request is in flight
    pub loading: bool,
    /// Error banner
    pub error: Option<String>,
    /// Success banner
    pub success: Option<String>,
}

impl PageStatus {
    /// Start an action: banners from the previous one are dropped
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = None;
    }

    fn succeed(&mut self, message: String) {
        self.loading = false;
        self.success = Some(message);
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

/// Keeps `loading` raised while a request is in flight
///
/// Dropping the guard lowers the flag, so a cancelled request future does
/// not leave the page spinning.
struct InFlight<'a>(&'a mut PageStatus);

impl<'a> InFlight<'a> {
    fn begin(status: &'a mut PageStatus) -> Self {
        status.begin();
        Self(status)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.loading = false;
    }
}

/// What a store does after a successful mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Apply the server reply to the local list
    #[default]
    InPlace,
    /// Apply the reply, then reload the collection to verify it
    Refetch,
}

/// Which operation the open form will perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    /// New entity
    Create,
    /// Existing entity
    Edit(EntityId),
}

/// The open create/edit form
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer<T> {
    /// Create or edit
    pub mode: EditMode,
    /// Working copy of the form fields
    pub draft: T,
}

/// State of a management page for `T`
#[derive(Debug)]
pub struct CollectionStore<T: Resource> {
    items: Vec<T>,
    editor: Option<EditBuffer<T>>,
    form: Dialog,
    delete_dialog: ConfirmDialog<EntityId>,
    status: PageStatus,
    policy: RefreshPolicy,
    surface_load_errors: bool,
}

impl<T: Resource> Default for CollectionStore<T> {
    fn default() -> Self {
        Self::new(RefreshPolicy::default())
    }
}

impl<T: Resource> CollectionStore<T> {
    /// Empty store with the given refresh policy
    #[must_use]
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            items: Vec::new(),
            editor: None,
            form: Dialog::default(),
            delete_dialog: ConfirmDialog::default(),
            status: PageStatus::default(),
            policy,
            surface_load_errors: false,
        }
    }

    /// Show load failures in the error banner instead of only logging them
    #[must_use]
    pub const fn surfacing_load_errors(mut self) -> Self {
        self.surface_load_errors = true;
        self
    }

    /// Loaded entities in server order
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the list, e.g. with a snapshot fetched elsewhere
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Look up an entity by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == Some(id))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == Some(id))
    }

    /// Loading flag and banners
    #[must_use]
    pub const fn status(&self) -> &PageStatus {
        &self.status
    }

    /// Refresh policy in effect
    #[must_use]
    pub const fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Fetch the collection
    ///
    /// Returns `false` when the fetch failed; the list is then empty.
    pub async fn load<A>(&mut self, api: &A) -> bool
    where
        A: CrudApi<T> + ?Sized,
    {
        self.try_load(api).await.is_ok()
    }

    /// Fetch the collection and hand back the failure
    ///
    /// Behaves like [`CollectionStore::load`]; callers that must tell an
    /// empty list from a rejected session use this one.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the list is then empty.
    pub async fn try_load<A>(&mut self, api: &A) -> AdminResult<usize>
    where
        A: CrudApi<T> + ?Sized,
    {
        let result = {
            let _in_flight = InFlight::begin(&mut self.status);
            api.get_all().await
        };
        match result {
            Ok(items) => {
                debug!(resource = T::PATH, count = items.len(), "loaded collection");
                self.items = items;
                Ok(self.items.len())
            }
            Err(e) => {
                error!(resource = T::PATH, error = %e, "failed to load {}", T::LABEL);
                self.items.clear();
                if self.surface_load_errors {
                    self.status.error = Some(format!("Failed to load {}: {e}", T::PATH));
                }
                Err(e.into())
            }
        }
    }

    /// Create an entity and append the server's copy
    ///
    /// # Errors
    ///
    /// Returns a validation error for a duplicate name, or the backend
    /// failure. The list is unchanged on error and the banner is set.
    pub async fn create<A>(&mut self, api: &A, data: T) -> AdminResult<T>
    where
        A: CrudApi<T> + ?Sized,
    {
        self.status.begin();
        if let Err(e) = self.check_unique(&data, None) {
            return Err(self.fail(e));
        }

        match api.create(&data).await {
            Ok(created) => {
                self.items.push(created.clone());
                self.close_editor();
                self.refresh_after_mutation(api).await;
                self.status.succeed(format!("Created {}", T::LABEL));
                Ok(created)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Overwrite the entity with `id`
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] when `id` is not loaded, a validation
    /// error for a duplicate name, or the backend failure.
    pub async fn update<A>(&mut self, api: &A, id: &str, data: T) -> AdminResult<T>
    where
        A: CrudApi<T> + ?Sized,
    {
        self.status.begin();
        let Some(index) = self.position(id) else {
            return Err(self.fail(AdminError::missing(T::LABEL, id)));
        };
        if let Err(e) = self.check_unique(&data, Some(index)) {
            return Err(self.fail(e));
        }

        match api.update(id, &data).await {
            Ok(updated) => {
                if let Some(slot) = self.items.get_mut(index) {
                    *slot = updated.clone();
                }
                self.close_editor();
                self.refresh_after_mutation(api).await;
                self.status.succeed(format!("Updated {}", T::LABEL));
                Ok(updated)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Delete the entity with `id`
    ///
    /// Returns `false` without a request when `id` is not in the list.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the entity then stays in the list.
    pub async fn delete<A>(&mut self, api: &A, id: &str) -> AdminResult<bool>
    where
        A: CrudApi<T> + ?Sized,
    {
        self.status.begin();
        if self.position(id).is_none() {
            debug!(resource = T::PATH, id, "delete of unknown id ignored");
            self.status.loading = false;
            return Ok(false);
        }

        match api.delete(id).await {
            Ok(()) => {
                self.items.retain(|item| item.id() != Some(id));
                if matches!(&self.editor, Some(EditBuffer { mode: EditMode::Edit(open), .. }) if open == id)
                {
                    self.close_editor();
                }
                self.refresh_after_mutation(api).await;
                self.status.succeed(format!("Deleted {}", T::LABEL));
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Open an empty (or prefilled) create form
    pub fn begin_create(&mut self, draft: T) {
        self.editor = Some(EditBuffer {
            mode: EditMode::Create,
            draft,
        });
        self.form.open(format!("Add {}", T::LABEL));
    }

    /// Open the edit form for `id` with a copy of the entity
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] when `id` is not loaded.
    pub fn begin_edit(&mut self, id: &str) -> AdminResult<()> {
        let draft = self
            .find(id)
            .cloned()
            .ok_or_else(|| AdminError::missing(T::LABEL, id))?;
        self.form.open(format!("Edit {} '{}'", T::LABEL, draft.display_name()));
        self.editor = Some(EditBuffer {
            mode: EditMode::Edit(id.to_string()),
            draft,
        });
        Ok(())
    }

    /// The open form
    #[must_use]
    pub const fn editor(&self) -> Option<&EditBuffer<T>> {
        self.editor.as_ref()
    }

    /// The open form's draft, for editing fields
    pub fn draft_mut(&mut self) -> Option<&mut T> {
        self.editor.as_mut().map(|buffer| &mut buffer.draft)
    }

    /// The modal holding the form, with its title
    #[must_use]
    pub const fn form_dialog(&self) -> &Dialog {
        &self.form
    }

    /// Discard the open form
    pub fn close_editor(&mut self) {
        self.editor = None;
        self.form.close();
    }

    /// Save the open form through create or update
    ///
    /// On failure the form stays open with its draft.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NoEditor`] when no form is open, otherwise
    /// whatever `create` or `update` returns.
    pub async fn submit<A>(&mut self, api: &A) -> AdminResult<T>
    where
        A: CrudApi<T> + ?Sized,
    {
        let Some(buffer) = self.editor.take() else {
            return Err(AdminError::NoEditor { label: T::LABEL });
        };
        let title = self.form.title().to_string();

        let result = match &buffer.mode {
            EditMode::Create => self.create(api, buffer.draft.clone()).await,
            EditMode::Edit(id) => self.update(api, id, buffer.draft.clone()).await,
        };
        if result.is_err() {
            self.editor = Some(buffer);
            self.form.open(title);
        }
        result
    }

    /// Ask before deleting `id`
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Missing`] when `id` is not loaded.
    pub fn request_delete(&mut self, id: &str) -> AdminResult<()> {
        let name = self
            .find(id)
            .map(|item| item.display_name().to_string())
            .ok_or_else(|| AdminError::missing(T::LABEL, id))?;
        self.delete_dialog
            .request(format!("Delete {} '{name}'?", T::LABEL), id.to_string());
        Ok(())
    }

    /// The pending delete confirmation
    #[must_use]
    pub const fn delete_dialog(&self) -> &ConfirmDialog<EntityId> {
        &self.delete_dialog
    }

    /// Confirm the pending delete
    ///
    /// Returns `false` when nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns the backend failure from [`CollectionStore::delete`].
    pub async fn confirm_delete<A>(&mut self, api: &A) -> AdminResult<bool>
    where
        A: CrudApi<T> + ?Sized,
    {
        match self.delete_dialog.confirm() {
            Some(id) => self.delete(api, &id).await,
            None => Ok(false),
        }
    }

    /// Ask `confirm` and delete `id` when the user agrees
    ///
    /// Returns `false` without a request when `id` is not in the list.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Declined`] when the user says no, otherwise
    /// the backend failure.
    pub async fn delete_confirmed<A>(&mut self, api: &A, id: &str, confirm: &dyn Confirm) -> AdminResult<bool>
    where
        A: CrudApi<T> + ?Sized,
    {
        if self.request_delete(id).is_err() {
            debug!(resource = T::PATH, id, "delete of unknown id ignored");
            return Ok(false);
        }
        let message = self.delete_dialog.message().to_string();
        if !confirm.confirm(&message) {
            self.cancel_delete();
            return Err(AdminError::Declined {
                action: message.trim_end_matches('?').to_string(),
            });
        }
        self.confirm_delete(api).await
    }

    /// Dismiss the pending delete
    pub fn cancel_delete(&mut self) {
        self.delete_dialog.cancel();
    }

    fn check_unique(&self, candidate: &T, skip: Option<usize>) -> studio_core::Result<()> {
        if !T::UNIQUE_NAMES {
            return Ok(());
        }
        ensure_unique_name(
            candidate.display_name(),
            self.items.iter().map(Resource::display_name),
            skip,
        )
    }

    async fn refresh_after_mutation<A>(&mut self, api: &A)
    where
        A: CrudApi<T> + ?Sized,
    {
        if self.policy != RefreshPolicy::Refetch {
            return;
        }
        match api.get_all().await {
            Ok(items) => self.items = items,
            Err(e) => {
                warn!(resource = T::PATH, error = %e, "reload after change failed; keeping local copy");
            }
        }
    }

    fn fail(&mut self, error: impl Into<AdminError>) -> AdminError {
        let error = error.into();
        self.status.fail(error.to_string());
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::dialog::AutoConfirm;
    use backend::Backend;
    use pretty_assertions::assert_eq;
    use studio_core::{Category, Error, GalleryItem};

    mod backend {
        use super::*;
        use std::sync::Mutex;

        #[derive(Debug, Default)]
        pub struct Backend<T> {
            pub items: Mutex<Vec<T>>,
            pub fail: Mutex<bool>,
            pub requests: Mutex<usize>,
        }

        impl<T> Backend<T> {
            pub fn with(items: Vec<T>) -> Self {
                Self {
                    items: Mutex::new(items),
                    fail: Mutex::new(false),
                    requests: Mutex::new(0),
                }
            }

            pub fn check(&self) -> studio_core::Result<()> {
                *self.requests.lock().unwrap() += 1;
                if *self.fail.lock().unwrap() {
                    Err(Error::Http {
                        status: 500,
                        message: "boom".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    #[async_trait]
    impl CrudApi<Category> for Backend<Category> {
        async fn get_all(&self) -> studio_core::Result<Vec<Category>> {
            self.check()?;
            Ok(self.items.lock().unwrap().clone())
        }

        async fn get(&self, id: &str) -> studio_core::Result<Category> {
            self.check()?;
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id.as_deref() == Some(id))
                .cloned()
                .ok_or(Error::NotFound {
                    resource: id.to_string(),
                })
        }

        async fn create(&self, data: &Category) -> studio_core::Result<Category> {
            self.check()?;
            let mut items = self.items.lock().unwrap();
            let mut created = data.clone();
            created.id = Some(format!("c{}", items.len() + 1));
            items.push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: &str, data: &Category) -> studio_core::Result<Category> {
            self.check()?;
            let mut updated = data.clone();
            updated.id = Some(id.to_string());
            for item in self.items.lock().unwrap().iter_mut() {
                if item.id.as_deref() == Some(id) {
                    *item = updated.clone();
                }
            }
            Ok(updated)
        }

        async fn delete(&self, id: &str) -> studio_core::Result<()> {
            self.check()?;
            self.items
                .lock()
                .unwrap()
                .retain(|c| c.id.as_deref() != Some(id));
            Ok(())
        }
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: Some(id.to_string()),
            name: name.to_string(),
            description: None,
        }
    }

    fn named(name: &str) -> Category {
        Category {
            id: None,
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_load_failure_empties_list_quietly() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        assert!(store.load(&api).await);
        assert_eq!(store.items().len(), 1);

        *api.fail.lock().unwrap() = true;
        assert!(!store.load(&api).await);
        assert!(store.items().is_empty());
        assert_eq!(store.status().error, None);
    }

    #[tokio::test]
    async fn test_load_failure_can_be_surfaced() {
        let api = Backend::<Category>::default();
        *api.fail.lock().unwrap() = true;
        let mut store = CollectionStore::<Category>::default().surfacing_load_errors();

        assert!(!store.load(&api).await);
        assert!(store.status().error.as_deref().unwrap().contains("categories"));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected_without_request() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;
        let before = *api.requests.lock().unwrap();

        let error = store.create(&api, named("  weddings ")).await.unwrap_err();

        assert!(matches!(error, AdminError::Core(ref e) if e.is_validation()));
        assert_eq!(*api.requests.lock().unwrap(), before);
        assert_eq!(store.items().len(), 1);
        assert!(store.status().error.is_some());
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let api = Backend::with(vec![category("c1", "Weddings"), category("c2", "Portraits")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;

        store.update(&api, "c1", named("WEDDINGS")).await.unwrap();
        assert!(store.update(&api, "c1", named("portraits")).await.is_err());
        assert_eq!(store.items()[0].name, "WEDDINGS");
    }

    #[tokio::test]
    async fn test_submit_keeps_form_open_on_failure() {
        let api = Backend::<Category>::default();
        let mut store = CollectionStore::<Category>::default();
        store.begin_create(named("Events"));

        *api.fail.lock().unwrap() = true;
        assert!(store.submit(&api).await.is_err());
        assert_eq!(store.editor().unwrap().draft.name, "Events");
        assert!(store.items().is_empty());

        *api.fail.lock().unwrap() = false;
        let created = store.submit(&api).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("c1"));
        assert!(store.editor().is_none());
        assert_eq!(store.status().success.as_deref(), Some("Created category"));
    }

    #[tokio::test]
    async fn test_submit_without_form() {
        let api = Backend::<Category>::default();
        let mut store = CollectionStore::<Category>::default();

        assert!(matches!(
            store.submit(&api).await,
            Err(AdminError::NoEditor { label: "category" })
        ));
    }

    #[tokio::test]
    async fn test_edit_form_updates_entity() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;

        store.begin_edit("c1").unwrap();
        store.draft_mut().unwrap().description = Some("Ceremonies".to_string());
        store.submit(&api).await.unwrap();

        assert_eq!(store.items()[0].description.as_deref(), Some("Ceremonies"));
        assert!(store.begin_edit("nope").is_err());
    }

    #[tokio::test]
    async fn test_banners_cleared_by_next_action() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;

        assert!(store.create(&api, named("weddings")).await.is_err());
        assert!(store.status().error.is_some());

        store.create(&api, named("Events")).await.unwrap();
        assert_eq!(store.status().error, None);
        assert!(!store.status().loading);
    }

    #[tokio::test]
    async fn test_delete_confirmation_runs_once() {
        let api = Backend::with(vec![category("c1", "Weddings"), category("c2", "Events")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;

        store.request_delete("c1").unwrap();
        assert_eq!(store.delete_dialog().message(), "Delete category 'Weddings'?");
        assert!(store.confirm_delete(&api).await.unwrap());
        assert!(!store.confirm_delete(&api).await.unwrap());

        store.request_delete("c2").unwrap();
        store.cancel_delete();
        assert!(!store.confirm_delete(&api).await.unwrap());
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_entity() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;
        let before = *api.requests.lock().unwrap();

        let error = store
            .delete_confirmed(&api, "c1", &AutoConfirm(false))
            .await
            .unwrap_err();

        assert!(matches!(error, AdminError::Declined { .. }));
        assert_eq!(error.to_string(), "Delete category 'Weddings' was cancelled");
        assert_eq!(*api.requests.lock().unwrap(), before);
        assert!(!store.delete_dialog().is_open());
        assert_eq!(store.items().len(), 1);

        assert!(!store.delete_confirmed(&api, "zz", &AutoConfirm(true)).await.unwrap());
        assert!(store.delete_confirmed(&api, "c1", &AutoConfirm(true)).await.unwrap());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_form_dialog_follows_editor() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        store.load(&api).await;

        store.begin_edit("c1").unwrap();
        assert!(store.form_dialog().is_open());
        assert_eq!(store.form_dialog().title(), "Edit category 'Weddings'");

        *api.fail.lock().unwrap() = true;
        assert!(store.submit(&api).await.is_err());
        assert!(store.form_dialog().is_open());
        assert_eq!(store.form_dialog().title(), "Edit category 'Weddings'");

        *api.fail.lock().unwrap() = false;
        store.submit(&api).await.unwrap();
        assert!(!store.form_dialog().is_open());

        store.begin_create(named("Events"));
        assert_eq!(store.form_dialog().title(), "Add category");
        store.close_editor();
        assert!(!store.form_dialog().is_open());
    }

    #[tokio::test]
    async fn test_try_load_returns_the_failure() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::default();
        assert_eq!(store.try_load(&api).await.unwrap(), 1);

        *api.fail.lock().unwrap() = true;
        let error = store.try_load(&api).await.unwrap_err();
        assert!(matches!(error, AdminError::Core(Error::Http { status: 500, .. })));
        assert!(store.items().is_empty());
        assert!(!store.status().loading);
    }

    #[tokio::test]
    async fn test_refetch_policy_picks_up_server_state() {
        let api = Backend::with(vec![category("c1", "Weddings")]);
        let mut store = CollectionStore::<Category>::new(RefreshPolicy::Refetch);
        store.load(&api).await;

        // Someone else added a category meanwhile
        api.items.lock().unwrap().push(category("x9", "Studio"));
        store.update(&api, "c1", named("Weddings 2025")).await.unwrap();

        let names: Vec<_> = store.items().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Weddings 2025", "Studio"]);
    }

    #[test]
    fn test_unique_check_only_for_opted_in_types() {
        let mut store = CollectionStore::<GalleryItem>::default();
        store.set_items(vec![GalleryItem {
            id: Some("g1".to_string()),
            title: "Sunset".to_string(),
            ..GalleryItem::default()
        }]);
        let copy = GalleryItem {
            title: "Sunset".to_string(),
            ..GalleryItem::default()
        };

        assert!(store.check_unique(&copy, None).is_ok());
    }
}
