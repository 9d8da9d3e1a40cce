use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, ClientSettings},
    AppController, CatalogView, ClientEvent, EventCard, NoticeKind, ToggleOutcome,
};
use shared::{domain::EventId, protocol::ChartKind};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

#[derive(Parser, Debug)]
#[command(about = "Command-line client for the event registration service")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List events, marking the ones the signed-in user is registered for
    Events,
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account; does not sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Register for an event, or unregister if already registered
    Toggle { event_id: i64 },
    Whoami,
    /// Print cache-busted URLs for the statistics charts
    Charts,
}

impl Cli {
    fn settings(&self) -> ClientSettings {
        let mut settings = load_settings();
        if let Some(server_url) = &self.server_url {
            settings.server_url = server_url.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            settings.data_dir = Some(data_dir.clone());
        }
        settings
    }
}

fn format_card(card: &EventCard) -> String {
    let marker = if card.registered { "[x]" } else { "[ ]" };
    format!(
        "{marker} #{} {} | {} | {} registered",
        card.id, card.name, card.date_label, card.registration_count
    )
}

fn print_notices(events: &mut Receiver<ClientEvent>) {
    loop {
        match events.try_recv() {
            Ok(ClientEvent::Notice(notice)) => match notice.kind {
                NoticeKind::Info => println!("{}", notice.message),
                NoticeKind::Error => eprintln!("{}", notice.message),
            },
            Ok(ClientEvent::StateChanged(_)) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let controller = AppController::from_settings(&cli.settings())?;
    let mut events = controller.subscribe_events();

    match cli.command {
        Command::Events => {
            controller.restore_session().await;
            controller.load_events().await;
            match controller.snapshot().await.catalog_view() {
                CatalogView::Message(message) => println!("{message}"),
                CatalogView::Cards(cards) => {
                    for card in &cards {
                        println!("{}", format_card(card));
                    }
                }
            }
        }
        Command::Login { username, password } => {
            let result = controller.login(&username, &password).await;
            print_notices(&mut events);
            let session = result?;
            println!("user_id={} username={}", session.id, session.username);
        }
        Command::Register { username, password } => {
            let result = controller.register(&username, &password).await;
            print_notices(&mut events);
            result?;
        }
        Command::Logout => {
            controller.restore_session().await;
            controller.logout().await;
            print_notices(&mut events);
        }
        Command::Toggle { event_id } => {
            controller.restore_session().await;
            let outcome = controller
                .toggle_event_registration(EventId(event_id))
                .await;
            print_notices(&mut events);
            match outcome {
                ToggleOutcome::Registered | ToggleOutcome::Unregistered => {}
                ToggleOutcome::LoginRequired => bail!("not logged in"),
                ToggleOutcome::AlreadyInFlight => bail!("event {event_id} is already being updated"),
                ToggleOutcome::Failed(err) => return Err(err.into()),
            }
        }
        Command::Whoami => match controller.restore_session().await {
            Some(session) => println!("user_id={} username={}", session.id, session.username),
            None => println!("not logged in"),
        },
        Command::Charts => {
            for kind in ChartKind::ALL {
                controller.reload_chart(kind).await;
            }
            let snapshot = controller.snapshot().await;
            for kind in ChartKind::ALL {
                if let Some(source) = snapshot.charts.get(kind) {
                    println!("{}: {}", kind.title(), source.url);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::Placeholder;

    #[test]
    fn parses_toggle_with_global_server_flag() {
        let cli = Cli::parse_from([
            "desktop",
            "--server-url",
            "http://127.0.0.1:5001",
            "toggle",
            "7",
        ]);
        assert!(matches!(cli.command, Command::Toggle { event_id: 7 }));
        assert_eq!(cli.settings().server_url, "http://127.0.0.1:5001");
    }

    #[test]
    fn login_requires_both_credentials() {
        assert!(Cli::try_parse_from(["desktop", "login", "--username", "alice"]).is_err());
        let cli = Cli::parse_from(["desktop", "login", "--username", "alice", "--password", "x"]);
        assert!(matches!(cli.command, Command::Login { .. }));
    }

    #[test]
    fn card_line_marks_registration() {
        let card = EventCard {
            id: EventId(1),
            name: "ZEPHYR 2025".into(),
            date_label: "March 15, 2025".into(),
            description: "Tech fest".into(),
            image_src: Placeholder::for_index(0).url(),
            fallback: Placeholder::for_index(0),
            registration_count: 12,
            registered: true,
            pending: false,
        };
        assert_eq!(
            format_card(&card),
            "[x] #1 ZEPHYR 2025 | March 15, 2025 | 12 registered"
        );
    }
}
