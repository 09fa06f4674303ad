//! Account page: profile, email, password and avatar
//!
//! Every successful change rewrites the cached `currentAdmin` entry so the
//! rest of the console sees the new values. A 401 from the backend ends
//! the session.

use crate::error::{AdminError, AdminResult};
use crate::image::{ImageField, ImageUploader};
use crate::store::PageStatus;
use async_trait::async_trait;
use studio_client::{ApiClient, Session, SessionStorage};
use studio_core::{
    AdminProfile, Error,
    types::{EmailChange, PasswordChange, UploadedImage},
    utils::{validate_email, validate_password},
};
use tracing::{info, warn};

/// Sends avatar files to the profile endpoint instead of the shared one
struct AvatarEndpoint(ApiClient);

#[async_trait]
impl ImageUploader for AvatarEndpoint {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> studio_core::Result<UploadedImage> {
        let profile = self.0.update_avatar(bytes, file_name).await?;
        Ok(UploadedImage {
            url: profile.avatar.unwrap_or_default(),
            id: profile.id,
        })
    }
}

/// State of the account page
#[derive(Debug)]
pub struct ProfilePage<S: SessionStorage> {
    client: ApiClient,
    session: Session<S>,
    profile: Option<AdminProfile>,
    avatar: ImageField,
    status: PageStatus,
}

impl<S: SessionStorage> ProfilePage<S> {
    /// Page over an authorized client; `max_image_bytes` caps avatar files
    #[must_use]
    pub fn new(client: ApiClient, session: Session<S>, max_image_bytes: u64) -> Self {
        Self {
            client,
            session,
            profile: None,
            avatar: ImageField::new(max_image_bytes),
            status: PageStatus::default(),
        }
    }

    /// Last profile fetched or written
    #[must_use]
    pub const fn profile(&self) -> Option<&AdminProfile> {
        self.profile.as_ref()
    }

    /// Avatar field, for its preview and error
    #[must_use]
    pub const fn avatar(&self) -> &ImageField {
        &self.avatar
    }

    /// Banners
    #[must_use]
    pub const fn status(&self) -> &PageStatus {
        &self.status
    }

    /// The session this page writes to
    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Fetch the profile and refresh the cached copy
    ///
    /// # Errors
    ///
    /// Returns the backend failure; on 401 the session is cleared first.
    pub async fn load(&mut self) -> AdminResult<AdminProfile> {
        self.begin();
        let result = self.client.profile().await;
        let profile = self.settle(result, None)?;
        if let Some(avatar) = &profile.avatar {
            self.avatar = ImageField::existing(self.avatar_cap(), avatar.clone());
        }
        Ok(profile)
    }

    /// Change the login email
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed address, or the backend
    /// failure.
    pub async fn change_email(&mut self, email: &str, current_password: &str) -> AdminResult<AdminProfile> {
        self.begin();
        if let Err(e) = validate_email(email) {
            return Err(self.fail(e));
        }

        let change = EmailChange {
            email: email.trim().to_string(),
            current_password: current_password.to_string(),
        };
        let result = self.client.update_email(&change).await;
        self.settle(result, Some("Email updated"))
    }

    /// Change the password
    ///
    /// # Errors
    ///
    /// Returns a validation error when the new password is shorter than six
    /// characters, differs from its confirmation, or equals the current
    /// one; otherwise the backend failure.
    pub async fn change_password(&mut self, current: &str, new: &str, confirmation: &str) -> AdminResult<()> {
        self.begin();
        if let Err(e) = validate_password(new, confirmation) {
            return Err(self.fail(e));
        }
        if new == current {
            return Err(self.fail(Error::validation(
                "password",
                "New password must differ from the current one",
            )));
        }

        let change = PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirmation.to_string(),
        };
        match self.client.update_password(&change).await {
            Ok(()) => {
                self.status.loading = false;
                self.status.success = Some("Password updated".to_string());
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace the avatar; the preview updates before the upload starts
    ///
    /// # Errors
    ///
    /// Returns [`studio_core::Error::FileSizeExceeded`] for an oversized
    /// file, or the backend failure.
    pub async fn change_avatar(&mut self, bytes: Vec<u8>, file_name: &str) -> AdminResult<AdminProfile> {
        self.begin();
        if let Err(e) = self.avatar.select(bytes, file_name) {
            return Err(self.fail(e));
        }

        let uploaded = match self.avatar.upload(&AvatarEndpoint(self.client.clone())).await {
            Ok(uploaded) => uploaded,
            Err(e) => return Err(self.fail(e)),
        };

        let mut profile = match self.profile.clone() {
            Some(profile) => profile,
            None => self.session.current_admin()?.unwrap_or_default(),
        };
        profile.avatar = Some(uploaded.url);
        self.settle(Ok(profile), Some("Avatar updated"))
    }

    fn begin(&mut self) {
        self.status = PageStatus {
            loading: true,
            ..PageStatus::default()
        };
    }

    const fn avatar_cap(&self) -> u64 {
        self.avatar.max_bytes()
    }

    fn settle(
        &mut self,
        result: studio_core::Result<AdminProfile>,
        success: Option<&str>,
    ) -> AdminResult<AdminProfile> {
        match result {
            Ok(profile) => {
                self.session.store_admin(&profile)?;
                self.profile = Some(profile.clone());
                self.status.loading = false;
                self.status.success = success.map(str::to_string);
                if success.is_some() {
                    info!(admin = %profile.email, "profile changed");
                }
                Ok(profile)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: impl Into<AdminError>) -> AdminError {
        let error = error.into();
        if error.is_unauthorized() {
            warn!("backend rejected the session; logging out");
            if let Err(e) = self.session.clear() {
                warn!(error = %e, "could not clear session");
            }
        }
        self.status.loading = false;
        self.status.error = Some(error.to_string());
        error
    }
}
