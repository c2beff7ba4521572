use std::time::Duration;

use clap::Parser;
use swipemail_protocol::ApiClient;
use swipemail_triage::app::ADVANCE_DELAY;
use swipemail_triage::queue::remaining_label;
use swipemail_triage::{Screen, Snapshot, SwipeDirection, SwipeOutcome, ToastKind, TriageApp};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "swipemail-triage", version, about = "Swipe through Gmail drafts awaiting review")]
struct Args {
    /// Gateway base URL
    #[arg(long, env = "SWIPEMAIL_SERVER", default_value = "http://localhost:3001")]
    server: String,

    /// Delay before the next card appears after an action, in milliseconds
    #[arg(long, default_value_t = ADVANCE_DELAY.as_millis() as u64)]
    advance_delay_ms: u64,

    /// Print the sign-in URL instead of opening a browser
    #[arg(long)]
    no_browser: bool,
}

const HELP: &str = "commands: send | flag | drag <dx> | refresh | login | check | logout | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "swipemail_triage=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = ApiClient::new(&args.server)?;
    let app = TriageApp::with_advance_delay(client, Duration::from_millis(args.advance_delay_ms));

    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    app.check_auth().await;
    write_frame(&mut stdout, &app.snapshot().await).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "send" | "s" | "right" => report(&mut stdout, app.swipe(SwipeDirection::Right).await).await?,
            "flag" | "f" | "left" => report(&mut stdout, app.swipe(SwipeDirection::Left).await).await?,
            "drag" => {
                let Some(dx) = words.next().and_then(|w| w.parse::<f64>().ok()) else {
                    stdout.write_all(b"usage: drag <dx>\n").await?;
                    continue;
                };
                if !app.begin_drag().await {
                    stdout.write_all(b"card is not draggable right now\n").await?;
                    continue;
                }
                app.drag_to(dx).await;
                match app.release_drag().await {
                    Some(outcome) => report(&mut stdout, outcome).await?,
                    None => app.settle().await,
                }
            }
            "refresh" | "r" => app.refresh().await,
            "login" => {
                if let Ok(url) = app.login().await {
                    if args.no_browser || open::that(&url).is_err() {
                        let msg = format!("Open this URL to sign in:\n  {}\n", url);
                        stdout.write_all(msg.as_bytes()).await?;
                    }
                    stdout
                        .write_all(b"After consenting, run `check` to continue.\n")
                        .await?;
                }
            }
            "check" => {
                app.check_auth().await;
            }
            // Paste the browser's return URL or its `?auth=...` query
            marker if marker.contains("auth=") => {
                let query = marker.split_once('?').map_or(marker, |(_, q)| q);
                app.handle_auth_marker(query).await;
            }
            "logout" => app.logout().await,
            "help" | "?" => {
                stdout.write_all(HELP.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                continue;
            }
            "quit" | "q" | "exit" => break,
            other => {
                let msg = format!("unknown command: {} ({})\n", other, HELP);
                stdout.write_all(msg.as_bytes()).await?;
                continue;
            }
        }

        write_frame(&mut stdout, &app.snapshot().await).await?;
    }

    Ok(())
}

async fn report(stdout: &mut tokio::io::Stdout, outcome: SwipeOutcome) -> std::io::Result<()> {
    let note = match outcome {
        SwipeOutcome::Busy => "an action is still in flight\n",
        SwipeOutcome::NoDraft => "no draft to act on\n",
        SwipeOutcome::Completed(_) | SwipeOutcome::Failed(_) => return Ok(()),
    };
    stdout.write_all(note.as_bytes()).await
}

async fn write_frame(stdout: &mut tokio::io::Stdout, snap: &Snapshot) -> std::io::Result<()> {
    let mut out = String::new();

    match &snap.screen {
        Screen::Loading => out.push_str("Loading...\n"),
        Screen::SignIn => {
            out.push_str("Not signed in. Run `login` to connect your Gmail account.\n");
        }
        Screen::Card(card) => {
            if let Some(counter) = remaining_label(snap.remaining) {
                out.push_str(&format!("[{}]\n", counter));
            }
            out.push_str(&format!("To: {}\n", card.to));
            out.push_str(&format!("Subject: {}\n\n", card.subject));
            out.push_str(&card.body);
            out.push_str("\n\n<- flag for review        send it! ->\n");
        }
        Screen::Empty => {
            out.push_str("All caught up! No drafts with the \"Review\" label found.\n");
            out.push_str("Label drafts \"Review\" in Gmail, then run `refresh`.\n");
        }
    }

    if let Some(toast) = &snap.toast {
        let tag = match toast.kind {
            ToastKind::Success => "ok",
            ToastKind::Warning => "note",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        out.push_str(&format!("({}) {}\n", tag, toast.message));
    }

    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await
}
