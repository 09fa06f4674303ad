//! Admin login, registration and profile endpoints

use crate::api_client::ApiClient;
use crate::upload::image_part;
use reqwest::{Method, multipart::Form};
use serde::Deserialize;
use studio_core::{
    AdminProfile, Error, Result,
    types::{Credentials, EmailChange, LoginResponse, PasswordChange, Registration},
    utils::validate_form,
};
use tracing::info;

const LOGIN_PATH: &str = "admin/login";
const REGISTER_PATH: &str = "admin/register";
const PROFILE_PATH: &str = "admin/profile";

/// Profile replies come either bare or as `{ "admin": {...} }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileReply {
    Nested { admin: AdminProfile },
    Bare(AdminProfile),
}

impl From<ProfileReply> for AdminProfile {
    fn from(reply: ProfileReply) -> Self {
        match reply {
            ProfileReply::Nested { admin } | ProfileReply::Bare(admin) => admin,
        }
    }
}

impl ApiClient {
    /// Log in and keep the returned token on this client
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, or an error if the
    /// request fails or the credentials are rejected.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        validate_form(credentials)?;

        let response: LoginResponse = self.post_json(LOGIN_PATH, credentials).await?;
        self.set_token(Some(response.token.clone()));

        info!(admin = %response.admin.email, "logged in");
        Ok(response)
    }

    /// Register a new admin account
    ///
    /// Backends that log the new account straight in reply with a token; in
    /// that case the token is kept and the login is returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, or an error if the
    /// request fails.
    pub async fn register(&self, registration: &Registration) -> Result<Option<LoginResponse>> {
        validate_form(registration)?;

        let reply: serde_json::Value = self.post_json(REGISTER_PATH, registration).await?;
        info!(username = %registration.username, "registered admin");

        Ok(serde_json::from_value::<LoginResponse>(reply)
            .ok()
            .inspect(|login| self.set_token(Some(login.token.clone()))))
    }

    /// Fetch the logged in admin
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    pub async fn profile(&self) -> Result<AdminProfile> {
        self.get_json::<ProfileReply>(PROFILE_PATH)
            .await
            .map(AdminProfile::from)
    }

    /// Change the login email
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed address, or an error if
    /// the request fails.
    pub async fn update_email(&self, change: &EmailChange) -> Result<AdminProfile> {
        validate_form(change)?;

        let profile: AdminProfile = self
            .put_json::<_, ProfileReply>(&format!("{PROFILE_PATH}/email"), change)
            .await?
            .into();

        info!(email = %profile.email, "updated admin email");
        Ok(profile)
    }

    /// Change the password
    ///
    /// # Errors
    ///
    /// Returns a validation error when the new password is too short, does
    /// not match its confirmation, or equals the current one; otherwise an
    /// error if the request fails.
    pub async fn update_password(&self, change: &PasswordChange) -> Result<()> {
        validate_form(change)?;
        if change.new_password == change.current_password {
            return Err(Error::validation(
                "new_password",
                "New password must differ from the current password",
            ));
        }

        self.put_unit(&format!("{PROFILE_PATH}/password"), change).await?;
        info!("updated admin password");
        Ok(())
    }

    /// Replace the avatar image
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn update_avatar(&self, bytes: Vec<u8>, file_name: &str) -> Result<AdminProfile> {
        let form = Form::new().part("avatar", image_part(bytes, file_name)?);
        let profile: AdminProfile = self
            .send_multipart::<ProfileReply>(Method::PUT, &format!("{PROFILE_PATH}/avatar"), form)
            .await?
            .into();

        info!(avatar = profile.avatar.as_deref().unwrap_or_default(), "updated admin avatar");
        Ok(profile)
    }
}
