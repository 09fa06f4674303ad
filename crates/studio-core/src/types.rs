//! Content entities and request payloads exchanged with the backend
//!
//! Every content record is a flat document identified by a server-assigned
//! string id. The backend speaks camelCase JSON and some deployments emit
//! the id as `_id`, so both spellings are accepted on input.

use crate::utils::EMAIL_REGEX;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Server-assigned entity identifier
pub type EntityId = String;

/// A record type managed through a `/content/<path>` collection
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection path segment under `/content/`
    const PATH: &'static str;

    /// Human readable singular name used in messages
    const LABEL: &'static str;

    /// Whether two records of this type may share a display name
    const UNIQUE_NAMES: bool = false;

    /// Server-assigned id, absent until the record has been created
    fn id(&self) -> Option<&str>;

    /// Name shown in lists and used for duplicate checks
    fn display_name(&self) -> &str;
}

macro_rules! impl_resource {
    ($ty:ty, $path:literal, $label:literal, $name:ident) => {
        impl_resource!($ty, $path, $label, $name, false);
    };
    ($ty:ty, $path:literal, $label:literal, $name:ident, $unique:literal) => {
        impl Resource for $ty {
            const PATH: &'static str = $path;
            const LABEL: &'static str = $label;
            const UNIQUE_NAMES: bool = $unique;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn display_name(&self) -> &str {
                &self.$name
            }
        }
    };
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Gallery entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Category name
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Image URL or path returned by the upload endpoint
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// Displayed preferentially on the public site; intended to be unique
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Offered service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Price, if published
    #[serde(default)]
    pub price: Option<f64>,
    /// Category name
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Image URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// Free-form duration such as "2 hours"
    #[serde(default)]
    pub duration: Option<String>,
}

/// Booking workflow state
///
/// Input is matched case-insensitively; a value outside the workflow reads
/// as [`BookingStatus::Unknown`] instead of failing the whole record, and a
/// `null` reads as the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Submitted, not yet handled
    #[default]
    Pending,
    /// Accepted by the business
    Confirmed,
    /// Delivered
    Completed,
    /// Called off
    Cancelled,
    /// Not a workflow state; never written back
    Unknown,
}

impl BookingStatus {
    /// All states, in workflow order
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Transitions the workflow expects from this state
    ///
    /// Nothing enforces these: any state can be written over any other.
    #[must_use]
    pub const fn conventional_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled | Self::Unknown => &[],
        }
    }

    /// Whether the stored value was outside the workflow
    #[must_use]
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map_or_else(Self::default, |raw| raw.parse().unwrap_or(Self::Unknown)))
    }
}

impl FromStr for BookingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::validation("status", format!("unknown booking status '{s}'")))
    }
}

/// Customer booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Customer name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Customer email
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Customer phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Requested service title
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: String,
    /// Requested appointment date as entered by the customer
    #[serde(default)]
    pub date: Option<String>,
    /// Customer message
    #[serde(default)]
    pub message: Option<String>,
    /// Workflow state
    #[serde(default, skip_serializing_if = "BookingStatus::is_unknown")]
    pub status: BookingStatus,
    /// Submission timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Contact message state, read as leniently as [`BookingStatus`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Not yet opened
    #[default]
    New,
    /// Opened by an admin
    Read,
    /// Answered
    Replied,
    /// Not a known state; never written back
    Unknown,
}

impl ContactStatus {
    /// All states
    pub const ALL: [Self; 3] = [Self::New, Self::Read, Self::Replied];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Replied => "replied",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the stored value was not a known state
    #[must_use]
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContactStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map_or_else(Self::default, |raw| raw.parse().unwrap_or(Self::Unknown)))
    }
}

impl FromStr for ContactStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::validation("status", format!("unknown contact status '{s}'")))
    }
}

/// Message submitted through the public contact form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Sender name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Sender email
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Sender phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Subject line
    #[serde(default)]
    pub subject: Option<String>,
    /// Body
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Handling state
    #[serde(default, skip_serializing_if = "ContactStatus::is_unknown")]
    pub status: ContactStatus,
    /// Submission timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Customer testimonial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Author name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Author role or company
    #[serde(default)]
    pub role: Option<String>,
    /// Quote
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Star rating, 1 to 5
    #[serde(default)]
    pub rating: Option<u8>,
    /// Author photo
    #[serde(default)]
    pub image: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Entry in the company history timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Year label, kept as text ("2019", "2020-2021")
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: String,
    /// Title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Certificate or award
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Issuing organisation
    #[serde(default)]
    pub issuer: Option<String>,
    /// Issue date as text
    #[serde(default)]
    pub date: Option<String>,
    /// Scan of the certificate
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
}

/// Content category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Unique name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

/// Headline figure on the about page ("500+ clients")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Displayed value
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,
}

/// Section of the about page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutSection {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Heading
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Body text
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Illustration
    #[serde(default)]
    pub image: Option<String>,
}

/// Link to a social profile rendered in the public site footer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    /// Network name ("Instagram")
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Profile URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Icon identifier
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    /// Zero-based position
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: u32,
}

/// Site-wide settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Site name
    #[serde(default, deserialize_with = "null_as_default")]
    pub site_name: String,
    /// Public contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Public phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address
    #[serde(default)]
    pub address: Option<String>,
    /// Footer links
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: Vec<SocialLink>,
}

impl_resource!(GalleryItem, "gallery", "gallery item", title);
impl_resource!(Service, "services", "service", title, true);
impl_resource!(Booking, "bookings", "booking", name);
impl_resource!(Contact, "contacts", "contact", name);
impl_resource!(Testimonial, "testimonials", "testimonial", name);
impl_resource!(TimelineEntry, "timeline", "timeline entry", title);
impl_resource!(Certificate, "certificates", "certificate", title);
impl_resource!(Category, "categories", "category", name, true);
impl_resource!(Achievement, "achievements", "achievement", title);
impl_resource!(AboutSection, "about", "about section", title);
impl_resource!(SiteSettings, "settings", "settings", site_name);

/// Admin account as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    /// Server id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Login name
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Email address
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Login form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Email address
    #[validate(regex(path = *EMAIL_REGEX, message = "Please enter a valid email address"))]
    pub email: String,
    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Registration {
    /// Login name
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    /// Email address
    #[validate(regex(path = *EMAIL_REGEX, message = "Please enter a valid email address"))]
    pub email: String,
    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Email change form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailChange {
    /// New email address
    #[validate(regex(path = *EMAIL_REGEX, message = "Please enter a valid email address"))]
    pub email: String,
    /// Current password, re-entered for confirmation
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
}

/// Password change form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Current password
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
    /// Repeat of the new password; never sent
    #[serde(skip_serializing)]
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Logged in account
    #[serde(alias = "user")]
    pub admin: AdminProfile,
}

/// Result of posting a file to the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Public URL or server-relative path
    #[serde(alias = "imageUrl", alias = "secure_url")]
    pub url: String,
    /// Storage id, when the backend reports one
    #[serde(default, alias = "publicId", alias = "public_id")]
    pub id: Option<String>,
}

/// Content collections the admin manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `/content/gallery`
    Gallery,
    /// `/content/about`
    About,
    /// `/content/achievements`
    Achievements,
    /// `/content/timeline`
    Timeline,
    /// `/content/services`
    Services,
    /// `/content/categories`
    Categories,
    /// `/content/bookings`
    Bookings,
    /// `/content/contacts`
    Contacts,
    /// `/content/certificates`
    Certificates,
    /// `/content/testimonials`
    Testimonials,
    /// `/content/settings`
    Settings,
}

impl ContentKind {
    /// Every managed collection
    pub const ALL: [Self; 11] = [
        Self::Gallery,
        Self::About,
        Self::Achievements,
        Self::Timeline,
        Self::Services,
        Self::Categories,
        Self::Bookings,
        Self::Contacts,
        Self::Certificates,
        Self::Testimonials,
        Self::Settings,
    ];

    /// Path segment under `/content/`
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Gallery => GalleryItem::PATH,
            Self::About => AboutSection::PATH,
            Self::Achievements => Achievement::PATH,
            Self::Timeline => TimelineEntry::PATH,
            Self::Services => Service::PATH,
            Self::Categories => Category::PATH,
            Self::Bookings => Booking::PATH,
            Self::Contacts => Contact::PATH,
            Self::Certificates => Certificate::PATH,
            Self::Testimonials => Testimonial::PATH,
            Self::Settings => SiteSettings::PATH,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ContentKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == wanted || kind.path().trim_end_matches('s') == wanted)
            .ok_or_else(|| crate::Error::validation("kind", format!("unknown content type '{s}'")))
    }
}
