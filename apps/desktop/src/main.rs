use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ApiGateway, AuthSessionManager, BookingManager, ClientError, EventCatalogManager,
    HttpApiGateway,
};
use shared::domain::{Booking, BookingId, Event, EventId};
use storage::{SessionStore, SqliteSessionStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "events-client", about = "Browse and book events")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides the configured API base url.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List events, optionally filtered and sorted.
    Events {
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Calendar day, e.g. 2024-05-01.
        #[arg(long)]
        date: Option<String>,
        /// date, title, price or availability.
        #[arg(long, default_value = "date")]
        sort: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    Logout,
    Whoami,
    Bookings,
    Book {
        #[arg(long)]
        event_id: String,
        #[arg(long, default_value_t = 1)]
        seats: u32,
    },
    Cancel {
        #[arg(long)]
        booking_id: String,
    },
}

struct App {
    auth: Arc<AuthSessionManager>,
    catalog: EventCatalogManager,
    bookings: BookingManager,
}

impl App {
    async fn start(cli: &Cli) -> Result<Self> {
        let mut settings = load_settings(&cli.config)?;
        if let Some(api_url) = &cli.api_url {
            settings.api_base_url = api_url.clone();
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
        tracing_subscriber::fmt().with_env_filter(filter).init();
        debug!(?settings, "loaded settings");

        let gateway: Arc<dyn ApiGateway> = Arc::new(match settings.request_timeout_seconds {
            Some(secs) => {
                HttpApiGateway::with_timeout(&settings.api_base_url, Duration::from_secs(secs))?
            }
            None => HttpApiGateway::new(&settings.api_base_url)?,
        });
        let database_url = normalize_database_url(&settings.session_database_url);
        let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(&database_url).await?);

        let auth = Arc::new(AuthSessionManager::new(gateway.clone(), store));
        auth.restore_session().await;

        Ok(Self {
            catalog: EventCatalogManager::new(gateway.clone()),
            bookings: BookingManager::new(gateway, auth.clone()),
            auth,
        })
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Events {
                query,
                category,
                date,
                sort,
            } => {
                self.catalog.fetch_all().await;
                if let Some(message) = self.catalog.error().await {
                    bail!("could not load events: {message}");
                }
                if let Some(query) = query {
                    self.catalog.set_text_query(query).await;
                }
                if let Some(category) = category {
                    self.catalog.set_category(category).await;
                }
                if let Some(date) = date {
                    self.catalog.set_date(date).await;
                }
                self.catalog.set_sort_key(sort.as_str()).await;

                let view = self.catalog.derived_view().await;
                if view.is_empty() {
                    println!("No events match.");
                }
                for event in &view {
                    println!("{}", format_event(event));
                }
            }
            Command::Login { email, password } => {
                let user = self.auth.login(&email, &password).await.map_err(report)?;
                println!("Signed in as {} <{}>", user.name, user.email);
            }
            Command::Register {
                name,
                email,
                password,
            } => {
                let user = self
                    .auth
                    .register(&name, &email, &password)
                    .await
                    .map_err(report)?;
                println!("Welcome, {}! You are signed in.", user.name);
            }
            Command::ResetPassword { email } => {
                let response = self.auth.reset_password(&email).await.map_err(report)?;
                if !response.success {
                    bail!("{}", response.message);
                }
                println!("{}", response.message);
            }
            Command::Logout => {
                self.auth.logout().await;
                println!("Signed out.");
            }
            Command::Whoami => match self.auth.current_user().await {
                Some(user) => println!("{} <{}> ({:?})", user.name, user.email, user.role),
                None => println!("Not signed in."),
            },
            Command::Bookings => {
                self.bookings.fetch_bookings().await;
                if let Some(message) = self.bookings.error().await {
                    bail!("could not load bookings: {message}");
                }
                let bookings = self.bookings.bookings().await;
                if bookings.is_empty() {
                    println!("No bookings yet.");
                }
                for booking in &bookings {
                    println!("{}", format_booking(booking));
                }
            }
            Command::Book { event_id, seats } => {
                let booking = self
                    .bookings
                    .create_booking(&EventId(event_id), seats)
                    .await
                    .map_err(report)?;
                println!("Booked: {}", format_booking(&booking));
            }
            Command::Cancel { booking_id } => {
                let booking = self
                    .bookings
                    .cancel_booking(&BookingId(booking_id))
                    .await
                    .map_err(report)?;
                println!("Cancelled: {}", format_booking(&booking));
            }
        }
        Ok(())
    }
}

fn report(err: ClientError) -> anyhow::Error {
    debug!("client error: {err:?}");
    anyhow::anyhow!(err.user_message())
}

fn format_event(event: &Event) -> String {
    format!(
        "{:<24} {:<28} {:<12} {:>8.2} {:>4}/{:<4} {}",
        event.id,
        event.title,
        event.date.get(..10).unwrap_or(&event.date),
        event.price,
        event.available_seats,
        event.total_seats,
        event.location
    )
}

fn format_booking(booking: &Booking) -> String {
    let title = booking
        .event
        .as_ref()
        .map(|event| event.title.as_str())
        .unwrap_or("-");
    format!(
        "{} {} x{} {:.2} [{:?}]",
        booking.id, title, booking.number_of_seats, booking.total_amount, booking.status
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = App::start(&cli).await?;
    app.run(cli.command).await
}
