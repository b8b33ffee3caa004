use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argue_watch::api::{ArgumentApi, HttpArgumentApi};
use argue_watch::cli::{self, Args, Command, ViewCommand, VIEW_HELP};
use argue_watch::config::{Identity, WatchConfig};
use argue_watch::render::render;
use argue_watch::session::{SessionOptions, SessionView};
use argue_watch::stream::stream_url;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How long `watch --once` waits for the first snapshot or report.
const ONCE_WAIT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argue_watch=info,reconciler=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = WatchConfig::load(args.config.as_deref()).context("loading config")?;
    config.apply_overrides(args.overrides());
    config.validate().context("invalid config")?;
    let identity = config.identity()?;
    info!(
        api = %config.api_base(),
        user = %identity.user_id,
        guest = identity.guest,
        "argue-watch starting"
    );

    let api: Arc<dyn ArgumentApi> = Arc::new(
        HttpArgumentApi::new(&config, identity.clone()).context("building http client")?,
    );

    match args.command {
        Command::Watch {
            argument_id,
            once,
            redraw_ms,
        } => watch(api, &config, &identity, &argument_id, once, redraw_ms).await,
        Command::List => {
            let mine = api.my_arguments().await?;
            println!("credits: {}", mine.credits_balance);
            for (label, items) in [("active", &mine.active), ("past", &mine.past)] {
                println!("{label}:");
                for item in items {
                    println!("  {}  [{} | {}]  {}", item.id, item.status, item.phase, item.topic);
                }
            }
            Ok(())
        }
        Command::Create {
            topic,
            shape,
            win_condition,
            pace,
            evidence,
            composure,
            audience,
        } => {
            let request = cli::create_request(
                &topic,
                shape,
                win_condition,
                pace,
                evidence,
                composure,
                audience,
            );
            let argument = api.create_argument(&request).await?;
            println!("{}", argument.id);
            Ok(())
        }
        Command::Invite { argument_id, role } => {
            let invite = api.create_invite(&argument_id, role.into()).await?;
            println!("{} (expires {})", invite.url, invite.expires_at.to_rfc3339());
            Ok(())
        }
        Command::Join { argument_id, token } => {
            let joined = api.join(&argument_id, &token).await?;
            println!("joined {} as {}", joined.argument_id, joined.role);
            Ok(())
        }
        Command::Persona {
            argument_id,
            stance,
            defend_points,
            red_lines,
        } => {
            let persona = cli::persona(&stance, &defend_points, &red_lines);
            api.set_persona(&argument_id, &persona).await?;
            println!("persona saved");
            Ok(())
        }
        Command::Ready { argument_id } => {
            api.ready(&argument_id).await?;
            println!("ready locked in");
            Ok(())
        }
        Command::Start { argument_id } => {
            let started = api.start(&argument_id).await?;
            println!("{}: {:?}", started.argument_id, started.status);
            Ok(())
        }
        Command::React {
            argument_id,
            emoji,
            turn,
        } => {
            api.react(&argument_id, &emoji, turn).await?;
            Ok(())
        }
        Command::Report { argument_id } => {
            let report = api.report(&argument_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn watch(
    api: Arc<dyn ArgumentApi>,
    config: &WatchConfig,
    identity: &Identity,
    argument_id: &str,
    once: bool,
    redraw_ms: u64,
) -> Result<()> {
    let options = SessionOptions::from(config);
    let viewer = (!identity.guest).then_some(identity.user_id.as_str());

    if once {
        let view = SessionView::open(api, argument_id, options).await;
        let mut snapshots = view.snapshots();
        let _ = tokio::time::timeout(
            ONCE_WAIT,
            snapshots.wait_for(|s| {
                (s.session.is_some() || s.last_error.is_some()) && !s.report.is_in_flight()
            }),
        )
        .await;
        print!("{}", render(&view.current(), viewer));
        let stats = view.discard().await;
        debug!(?stats, "view discarded");
        return Ok(());
    }

    let url = stream_url(
        config.api_base(),
        argument_id,
        &identity.user_id,
        config.audience_token.as_deref(),
    )?;
    let view = SessionView::spawn(api, argument_id, options);
    let mut snapshots = view.snapshots();
    let _reader = view.attach_stream(url);
    if let Err(e) = view.reload().await {
        warn!(error = %e, "initial load failed");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut redraw = tokio::time::interval(Duration::from_millis(redraw_ms.max(16)));
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut dirty = true;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                dirty = true;
            }
            _ = redraw.tick() => {
                if dirty {
                    let text = render(&snapshots.borrow_and_update(), viewer);
                    print!("\x1b[2J\x1b[H{text}");
                    dirty = false;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("reading stdin")? else {
                    stdin_open = false;
                    continue;
                };
                match cli::parse_view_command(&line) {
                    None => {}
                    Some(Err(message)) => eprintln!("{message}\n{VIEW_HELP}"),
                    Some(Ok(ViewCommand::Quit)) => break,
                    Some(Ok(command)) => run_command(&view, command).await,
                }
            }
        }
    }

    let stats = view.discard().await;
    info!(
        applied = stats.applied,
        duplicates = stats.duplicates,
        malformed = stats.malformed,
        "watch finished"
    );
    Ok(())
}

/// Failures land in the view's error line, so they are only logged here.
async fn run_command(view: &SessionView, command: ViewCommand) {
    let result = match command {
        ViewCommand::Ready => view.ready().await,
        ViewCommand::Start => view.start().await,
        ViewCommand::Refresh => view.refresh().await,
        ViewCommand::React { emoji, turn_index } => view.react(&emoji, turn_index).await,
        ViewCommand::Invite(role) => view.invite(role).await.map(|invite| {
            eprintln!("invite ({role}): {}", invite.url);
        }),
        ViewCommand::Help => {
            eprintln!("{VIEW_HELP}");
            Ok(())
        }
        ViewCommand::Quit => Ok(()),
    };
    if let Err(e) = result {
        warn!(error = %e, "command failed");
    }
}
