//! Studio admin console
//!
//! Command line front end for managing the studio website content: log in
//! once, then list and edit every content collection, change booking and
//! contact statuses, curate the gallery and social links, and watch the
//! dashboard.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio_admin::{
    AdminError, CollectionStore, Confirm, Dashboard, DashboardSnapshot, EventBus, FeatureOutcome,
    ImageField, ProfilePage, SocialLinks, Visibility, menu, polling::spawn_dashboard_poller, social,
};
use studio_client::{ApiClient, CrudApi, ResourceApi, Session};
use studio_core::{
    AboutSection, Achievement, Booking, BookingStatus, Category, Certificate, Config, Contact,
    ContactStatus, ContentKind, GalleryItem, Resource, Service, SiteSettings, SocialLink,
    Testimonial, TimelineEntry,
    types::{Credentials, Registration},
};
use tokio::{signal, sync::watch};
use tracing::{info, warn};

/// Command line interface for the studio admin console
#[derive(Parser)]
#[command(
    name = "studio-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Content management console for the studio website",
    long_about = "Manage gallery items, services, bookings, contact messages and the rest of the studio website content through its REST backend."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an admin account
    Register {
        /// Display name
        username: String,

        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged in admin
    Whoami,

    /// Change account details
    Profile {
        /// Profile subcommand
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// Generic CRUD on any content collection
    Content {
        /// Content subcommand
        #[command(subcommand)]
        action: ContentCommands,
    },

    /// Gallery curation
    Gallery {
        /// Gallery subcommand
        #[command(subcommand)]
        action: GalleryCommands,
    },

    /// Booking workflow
    Bookings {
        /// Booking subcommand
        #[command(subcommand)]
        action: BookingCommands,
    },

    /// Contact message workflow
    Contacts {
        /// Contact subcommand
        #[command(subcommand)]
        action: ContactCommands,
    },

    /// Social links shown in the site footer
    Social {
        /// Social subcommand
        #[command(subcommand)]
        action: SocialCommands,
    },

    /// Upload an image and print its URL
    Upload {
        /// Image file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Booking and contact statistics
    Dashboard {
        /// Keep refreshing until Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },

    /// Print the effective configuration
    Config,

    /// Positions of the circular navigation menu
    Menu {
        /// Number of entries (defaults to the console pages)
        count: Option<usize>,

        /// Circle radius in pixels
        #[arg(short, long, default_value_t = menu::DEFAULT_RADIUS)]
        radius: f64,
    },
}

/// Account subcommands
#[derive(Subcommand)]
enum ProfileCommands {
    /// Change the login email
    Email {
        /// New email
        email: String,

        /// Current password (prompted when omitted)
        #[arg(long)]
        current_password: Option<String>,
    },

    /// Change the password (all values prompted)
    Password,

    /// Replace the avatar image
    Avatar {
        /// Image file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// JSON body for create and update
#[derive(Args)]
struct Payload {
    /// Inline JSON document
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    data: Option<String>,

    /// File holding the JSON document
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

/// Content subcommands
#[derive(Subcommand)]
enum ContentCommands {
    /// List a collection
    List {
        /// Collection, e.g. gallery or services
        kind: ContentKind,
    },

    /// Show one record
    Get {
        /// Collection
        kind: ContentKind,
        /// Record id
        id: String,
    },

    /// Create a record
    Create {
        /// Collection
        kind: ContentKind,
        #[command(flatten)]
        payload: Payload,
    },

    /// Overwrite a record
    Update {
        /// Collection
        kind: ContentKind,
        /// Record id
        id: String,
        #[command(flatten)]
        payload: Payload,
    },

    /// Delete a record
    Delete {
        /// Collection
        kind: ContentKind,
        /// Record id
        id: String,
    },
}

/// Gallery subcommands
#[derive(Subcommand)]
enum GalleryCommands {
    /// Toggle the featured flag of an item
    Feature {
        /// Gallery item id
        id: String,
    },
}

/// Booking subcommands
#[derive(Subcommand)]
enum BookingCommands {
    /// Set the status of a booking (pending, confirmed, completed, cancelled)
    Status {
        /// Booking id
        id: String,
        /// New status
        status: BookingStatus,
    },
}

/// Contact message subcommands
#[derive(Subcommand)]
enum ContactCommands {
    /// Set the status of a message (new, read, replied)
    Status {
        /// Contact id
        id: String,
        /// New status
        status: ContactStatus,
    },
}

/// Social link subcommands
#[derive(Subcommand)]
enum SocialCommands {
    /// Show the links in order
    List,

    /// Add a link
    Add {
        /// Network name, unique
        name: String,
        /// Profile URL
        url: String,
        /// Icon name
        #[arg(long, default_value = "")]
        icon: String,
        /// Position (appended when omitted)
        #[arg(long)]
        at: Option<usize>,
    },

    /// Remove the link at a position
    Remove {
        /// Position
        index: usize,
    },

    /// Move a link to another position
    Move {
        /// Current position
        from: usize,
        /// New position
        to: usize,
    },
}

/// Confirmation prompt on the terminal
struct StdinConfirm {
    assume_yes: bool,
}

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        if std::io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Run `$body` with `$ty` bound to the record type of a [`ContentKind`]
macro_rules! with_resource {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            ContentKind::Gallery => {
                type $ty = GalleryItem;
                $body
            }
            ContentKind::About => {
                type $ty = AboutSection;
                $body
            }
            ContentKind::Achievements => {
                type $ty = Achievement;
                $body
            }
            ContentKind::Timeline => {
                type $ty = TimelineEntry;
                $body
            }
            ContentKind::Services => {
                type $ty = Service;
                $body
            }
            ContentKind::Categories => {
                type $ty = Category;
                $body
            }
            ContentKind::Bookings => {
                type $ty = Booking;
                $body
            }
            ContentKind::Contacts => {
                type $ty = Contact;
                $body
            }
            ContentKind::Certificates => {
                type $ty = Certificate;
                $body
            }
            ContentKind::Testimonials => {
                type $ty = Testimonial;
                $body
            }
            ContentKind::Settings => {
                type $ty = SiteSettings;
                $body
            }
        }
    };
}

/// Main entry point for the admin console
///
/// # Errors
///
/// Returns error if configuration, logging or the command fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    studio_core::init_logging(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.base_url,
        "studio admin starting"
    );

    let client = ApiClient::from_config(&config.api)?;
    let session = Session::in_directory(&config.session.directory);

    let result = run(cli, &config, &client, session).await;
    if let Err(e) = &result
        && is_unauthorized(e)
    {
        warn!("session rejected by the backend");
        Session::in_directory(&config.session.directory).clear()?;
        bail!("Session expired or invalid, log in again ({e})");
    }
    result
}

fn is_unauthorized(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<AdminError>()
        .is_some_and(AdminError::is_unauthorized)
        || error
            .downcast_ref::<studio_core::Error>()
            .is_some_and(studio_core::Error::is_unauthorized)
}

/// Dispatch one command
///
/// # Errors
///
/// Returns error if the command fails
async fn run(cli: Cli, config: &Config, client: &ApiClient, session: Session) -> anyhow::Result<()> {
    let confirm = StdinConfirm { assume_yes: cli.yes };

    let command = match cli.command {
        Commands::Login { email, password } => {
            let password = password.map_or_else(|| prompt("Password"), Ok)?;
            let login = client.login(&Credentials { email, password }).await?;
            session.store_login(&login)?;
            println!("Logged in as {} <{}>", login.admin.username, login.admin.email);
            return Ok(());
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = password.map_or_else(|| prompt("Password"), Ok)?;
            let registration = Registration {
                username,
                email,
                password,
            };
            match client.register(&registration).await? {
                Some(login) => {
                    session.store_login(&login)?;
                    println!("Registered and logged in as {}", login.admin.username);
                }
                None => println!("Registered {}; log in to continue", registration.username),
            }
            return Ok(());
        }
        Commands::Logout => {
            session.clear()?;
            println!("Logged out");
            return Ok(());
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Commands::Menu { count, radius } => {
            let entries = match count {
                Some(count) => menu::layout((1..=count).map(|n| n.to_string()), radius),
                None => menu::console_menu(radius),
            };
            for entry in entries {
                println!("{:>14}  x={:>8.2}  y={:>8.2}", entry.label, entry.x, entry.y);
            }
            return Ok(());
        }
        other => other,
    };

    session
        .authorize(client)
        .context("Not logged in; run `studio-admin login <email>` first")?;

    match command {
        Commands::Whoami => {
            let admin = match session.current_admin()? {
                Some(admin) => admin,
                None => client.profile().await?,
            };
            print_json(&admin)?;
        }
        Commands::Profile { action } => {
            handle_profile_command(action, config, client.clone(), session).await?;
        }
        Commands::Content { action } => handle_content_command(action, client, &confirm).await?,
        Commands::Gallery {
            action: GalleryCommands::Feature { id },
        } => feature_gallery_item(client, &id, &confirm).await?,
        Commands::Bookings {
            action: BookingCommands::Status { id, status },
        } => {
            let (api, mut store) = loaded_store::<Booking>(client).await?;
            let booking = store.set_status(&api, &EventBus::default(), &id, status).await?;
            println!("Booking {id} is now {}", booking.status);
        }
        Commands::Contacts {
            action: ContactCommands::Status { id, status },
        } => {
            let (api, mut store) = loaded_store::<Contact>(client).await?;
            let contact = store.set_status(&api, &EventBus::default(), &id, status).await?;
            println!("Contact {id} is now {}", contact.status);
        }
        Commands::Social { action } => handle_social_command(action, client, &confirm).await?,
        Commands::Upload { file } => {
            let (bytes, name) = read_file(&file).await?;
            let mut field = ImageField::new(config.upload.max_image_bytes);
            field.select(bytes, &name)?;
            let uploaded = field.upload(client).await?;
            println!("{}", uploaded.url);
            if let Some(url) = field.display_url(&config.api.asset_base_url) {
                println!("{url}");
            }
        }
        Commands::Dashboard { watch } => show_dashboard(config, client, watch).await?,
        Commands::Login { .. }
        | Commands::Register { .. }
        | Commands::Logout
        | Commands::Config
        | Commands::Menu { .. } => {}
    }

    Ok(())
}

/// Handle account commands
///
/// # Errors
///
/// Returns error if validation or the backend call fails
async fn handle_profile_command(
    action: ProfileCommands,
    config: &Config,
    client: ApiClient,
    session: Session,
) -> anyhow::Result<()> {
    let mut page = ProfilePage::new(client, session, config.upload.max_image_bytes);
    page.load().await?;

    match action {
        ProfileCommands::Email {
            email,
            current_password,
        } => {
            let current = current_password.map_or_else(|| prompt("Current password"), Ok)?;
            let profile = page.change_email(&email, &current).await?;
            println!("Email changed to {}", profile.email);
        }
        ProfileCommands::Password => {
            let current = prompt("Current password")?;
            let new = prompt("New password")?;
            let confirmation = prompt("Confirm new password")?;
            page.change_password(&current, &new, &confirmation).await?;
            println!("Password changed");
        }
        ProfileCommands::Avatar { file } => {
            let (bytes, name) = read_file(&file).await?;
            let profile = page.change_avatar(bytes, &name).await?;
            println!("Avatar set to {}", profile.avatar.unwrap_or_default());
        }
    }
    Ok(())
}

/// Handle generic content commands
///
/// # Errors
///
/// Returns error if the payload is invalid or the backend call fails
async fn handle_content_command(
    action: ContentCommands,
    client: &ApiClient,
    confirm: &dyn Confirm,
) -> anyhow::Result<()> {
    match action {
        ContentCommands::List { kind } => with_resource!(kind, R => {
            print_json(&client.resource::<R>().get_all().await?)
        }),
        ContentCommands::Get { kind, id } => with_resource!(kind, R => {
            print_json(&client.resource::<R>().get(&id).await?)
        }),
        ContentCommands::Create { kind, payload } => {
            let value = payload.read().await?;
            with_resource!(kind, R => create_record::<R>(client, value).await)
        }
        ContentCommands::Update { kind, id, payload } => {
            let value = payload.read().await?;
            with_resource!(kind, R => update_record::<R>(client, &id, value).await)
        }
        ContentCommands::Delete { kind, id } => {
            with_resource!(kind, R => delete_record::<R>(client, &id, confirm).await)
        }
    }
}

/// Open the page store of `T` with its list loaded
///
/// A failed load is tolerated unless the backend rejected the session.
///
/// # Errors
///
/// Returns error if the backend answers 401
async fn loaded_store<T: Resource>(
    client: &ApiClient,
) -> anyhow::Result<(ResourceApi<T>, CollectionStore<T>)> {
    let api = client.resource::<T>();
    let mut store = CollectionStore::default().surfacing_load_errors();
    match store.try_load(&api).await {
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(_) => warn!(resource = T::PATH, "continuing without the current list"),
        Ok(_) => {}
    }
    Ok((api, store))
}

/// Create a record through its page store
///
/// # Errors
///
/// Returns error if the payload does not match the record type or the
/// create fails
async fn create_record<T: Resource>(client: &ApiClient, value: serde_json::Value) -> anyhow::Result<()> {
    let data: T = serde_json::from_value(value)
        .with_context(|| format!("Payload is not a valid {}", T::LABEL))?;
    let (api, mut store) = loaded_store::<T>(client).await?;
    let created = store.create(&api, data).await?;
    print_json(&created)
}

/// Update a record through its page store
///
/// # Errors
///
/// Returns error if the payload does not match the record type or the
/// update fails
async fn update_record<T: Resource>(
    client: &ApiClient,
    id: &str,
    value: serde_json::Value,
) -> anyhow::Result<()> {
    let data: T = serde_json::from_value(value)
        .with_context(|| format!("Payload is not a valid {}", T::LABEL))?;
    let (api, mut store) = loaded_store::<T>(client).await?;
    let updated = store.update(&api, id, data).await?;
    print_json(&updated)
}

/// Delete a record after confirmation
///
/// # Errors
///
/// Returns error if the delete fails
async fn delete_record<T: Resource>(client: &ApiClient, id: &str, confirm: &dyn Confirm) -> anyhow::Result<()> {
    let (api, mut store) = loaded_store::<T>(client).await?;
    match store.delete_confirmed(&api, id, confirm).await {
        Ok(true) => println!("Deleted {} {id}", T::LABEL),
        Ok(false) => println!("No {} with id {id}", T::LABEL),
        Err(declined @ AdminError::Declined { .. }) => println!("{declined}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Toggle the featured gallery item
///
/// # Errors
///
/// Returns error if the toggle fails or leaves two featured items
async fn feature_gallery_item(client: &ApiClient, id: &str, confirm: &dyn Confirm) -> anyhow::Result<()> {
    let (api, mut store) = loaded_store::<GalleryItem>(client).await?;
    match store.set_featured(&api, id, confirm).await? {
        FeatureOutcome::Featured { id } => println!("Featured {id}"),
        FeatureOutcome::Unfeatured { id } => println!("Unfeatured {id}"),
        FeatureOutcome::Declined => println!("Kept the current featured item"),
        FeatureOutcome::Conflict { featured } => {
            bail!(
                "Another session changed the gallery meanwhile; featured items are now: {}",
                featured.join(", ")
            );
        }
    }
    Ok(())
}

/// Handle social link commands
///
/// # Errors
///
/// Returns error if the edit is invalid or the settings cannot be saved
async fn handle_social_command(
    action: SocialCommands,
    client: &ApiClient,
    confirm: &dyn Confirm,
) -> anyhow::Result<()> {
    let api = client.settings();
    let settings = social::load_settings(&api).await?;
    let mut links = SocialLinks::from_links(settings.social_links.clone());

    match action {
        SocialCommands::List => {
            for link in links.links() {
                println!("{:>3}  {:<14} {}", link.order, link.name, link.url);
            }
            return Ok(());
        }
        SocialCommands::Add { name, url, icon, at } => {
            links.insert(
                SocialLink {
                    name,
                    url,
                    icon,
                    order: 0,
                },
                at,
            )?;
        }
        SocialCommands::Remove { index } => {
            let name = links
                .links()
                .get(index)
                .map(|link| link.name.clone())
                .with_context(|| format!("No link at position {index}"))?;
            if !confirm.confirm(&format!("Remove social link '{name}'?")) {
                println!("Cancelled");
                return Ok(());
            }
            links.remove(index)?;
        }
        SocialCommands::Move { from, to } => links.move_to(from, to)?,
    }

    let saved = social::save_links(&api, settings, links).await?;
    println!("Saved {} social links", saved.social_links.len());
    Ok(())
}

/// Print dashboard figures, once or until Ctrl+C
///
/// # Errors
///
/// Returns error if the output cannot be written
async fn show_dashboard(config: &Config, client: &ApiClient, follow: bool) -> anyhow::Result<()> {
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(client.bookings()),
        Arc::new(client.contacts()),
    ));

    if !follow {
        print_snapshot(&dashboard.refresh().await);
        return Ok(());
    }

    let mut snapshots = dashboard.subscribe();
    let (_visible, visibility) = watch::channel(Visibility::Visible);
    let bus = EventBus::default();
    let poller = spawn_dashboard_poller(
        Arc::clone(&dashboard),
        config.polling.dashboard_interval(),
        visibility,
        &bus,
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping dashboard");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot) {
    println!("Bookings: {}", snapshot.total_bookings);
    for status in BookingStatus::ALL {
        println!("  {:<10} {}", status.as_str(), snapshot.status.get(status));
    }
    println!("Last 7 days:");
    for day in &snapshot.last_seven_days {
        println!("  {}  {}", day.date, day.count);
    }
    println!(
        "Contacts: {} ({} unread)",
        snapshot.total_contacts, snapshot.unread_contacts
    );
    if !snapshot.recent_bookings.is_empty() {
        println!("Recent bookings:");
        for booking in &snapshot.recent_bookings {
            println!(
                "  {:<20} {:<10} {}",
                booking.name,
                booking.status.as_str(),
                booking.service
            );
        }
    }
    println!();
}

impl Payload {
    async fn read(&self) -> anyhow::Result<serde_json::Value> {
        let raw = match (&self.data, &self.file) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => bail!("Provide --data or --file"),
        };
        serde_json::from_str(&raw).context("Payload is not valid JSON")
    }
}

async fn read_file(path: &Path) -> anyhow::Result<(Vec<u8>, String)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok((bytes, name))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{label}: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
