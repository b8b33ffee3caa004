//! Command-line arguments and the commands accepted while watching.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use reconciler::model::{
    ArgumentControls, ArgumentShape, CreateArgumentRequest, EvidenceMode, InviteRole, PaceMode,
    PersonaSnapshot, WinCondition,
};

use crate::config::ConfigOverrides;

/// Watch and drive live arguments from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file (defaults to ./argue-watch.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Upstream API base URL (overrides ARGUE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// User id sent with every request (overrides ARGUE_USER_ID)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Display handle (overrides ARGUE_USER_HANDLE)
    #[arg(long, global = true)]
    pub user_handle: Option<String>,

    /// Spectator token (overrides ARGUE_AUDIENCE_TOKEN)
    #[arg(long, global = true)]
    pub audience_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            user_id: self.user_id.clone(),
            user_handle: self.user_handle.clone(),
            audience_token: self.audience_token.clone(),
            request_timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a live view of an argument
    Watch {
        argument_id: String,
        /// Skip the live stream; render the snapshot once and exit
        #[arg(long, default_value_t = false)]
        once: bool,
        /// Minimum milliseconds between redraws
        #[arg(long, default_value_t = 250)]
        redraw_ms: u64,
    },
    /// List your active and past arguments
    List,
    /// Create a new argument
    Create {
        topic: String,
        #[arg(long, value_enum, default_value_t = ShapeArg::QuickSkirmish)]
        shape: ShapeArg,
        #[arg(long, value_enum, default_value_t = WinArg::BeRight)]
        win_condition: WinArg,
        #[arg(long, value_enum, default_value_t = PaceArg::Normal)]
        pace: PaceArg,
        #[arg(long, value_enum, default_value_t = EvidenceArg::Freeform)]
        evidence: EvidenceArg,
        /// 0 (heated) to 100 (composed)
        #[arg(long, default_value_t = 45, value_parser = clap::value_parser!(u8).range(0..=100))]
        composure: u8,
        /// Allow spectators
        #[arg(long, default_value_t = false)]
        audience: bool,
    },
    /// Create an invite link
    Invite {
        argument_id: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Participant)]
        role: RoleArg,
    },
    /// Join with an invite token
    Join { argument_id: String, token: String },
    /// Set your persona
    Persona {
        argument_id: String,
        #[arg(long)]
        stance: String,
        /// Point to defend (repeatable)
        #[arg(long = "defend", required = true)]
        defend_points: Vec<String>,
        /// Line not to cross (repeatable)
        #[arg(long = "red-line")]
        red_lines: Vec<String>,
    },
    /// Mark yourself ready
    Ready { argument_id: String },
    /// Start the argument
    Start { argument_id: String },
    /// Send a reaction
    React {
        argument_id: String,
        emoji: String,
        #[arg(long)]
        turn: Option<u64>,
    },
    /// Print the post-argument report
    Report { argument_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    QuickSkirmish,
    ProperThrowdown,
    SlowBurn,
}

impl From<ShapeArg> for ArgumentShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::QuickSkirmish => Self::QuickSkirmish,
            ShapeArg::ProperThrowdown => Self::ProperThrowdown,
            ShapeArg::SlowBurn => Self::SlowBurn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WinArg {
    BeRight,
    FindOverlap,
    ExposeWeakPoints,
    UnderstandOtherSide,
}

impl From<WinArg> for WinCondition {
    fn from(arg: WinArg) -> Self {
        match arg {
            WinArg::BeRight => Self::BeRight,
            WinArg::FindOverlap => Self::FindOverlap,
            WinArg::ExposeWeakPoints => Self::ExposeWeakPoints,
            WinArg::UnderstandOtherSide => Self::UnderstandOtherSide,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaceArg {
    Fast,
    Normal,
    Dramatic,
}

impl From<PaceArg> for PaceMode {
    fn from(arg: PaceArg) -> Self {
        match arg {
            PaceArg::Fast => Self::Fast,
            PaceArg::Normal => Self::Normal,
            PaceArg::Dramatic => Self::Dramatic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvidenceArg {
    Freeform,
    ReceiptsPreferred,
}

impl From<EvidenceArg> for EvidenceMode {
    fn from(arg: EvidenceArg) -> Self {
        match arg {
            EvidenceArg::Freeform => Self::Freeform,
            EvidenceArg::ReceiptsPreferred => Self::ReceiptsPreferred,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Participant,
    Spectator,
}

impl From<RoleArg> for InviteRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Participant => Self::Participant,
            RoleArg::Spectator => Self::Spectator,
        }
    }
}

/// Build the create body from `create` flags.
pub fn create_request(
    topic: &str,
    shape: ShapeArg,
    win_condition: WinArg,
    pace: PaceArg,
    evidence: EvidenceArg,
    composure: u8,
    audience: bool,
) -> CreateArgumentRequest {
    CreateArgumentRequest {
        topic: topic.trim().to_string(),
        controls: ArgumentControls {
            argument_composure: composure,
            argument_shape: shape.into(),
            win_condition: win_condition.into(),
            audience_mode: audience,
            pace_mode: pace.into(),
            evidence_mode: evidence.into(),
            ..Default::default()
        },
    }
}

pub fn persona(stance: &str, defend_points: &[String], red_lines: &[String]) -> PersonaSnapshot {
    let clean = |items: &[String]| {
        items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    PersonaSnapshot {
        stance: stance.trim().to_string(),
        defend_points: clean(defend_points),
        red_lines: clean(red_lines),
    }
}

// ── In-session commands ─────────────────────────────────────────────

/// A line typed while a view is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Ready,
    Start,
    Refresh,
    React {
        emoji: String,
        turn_index: Option<u64>,
    },
    Invite(InviteRole),
    Quit,
    Help,
}

pub const VIEW_HELP: &str =
    "commands: /ready  /start  /refresh  /react <emoji> [turn]  /invite [spectator]  /quit";

/// Parse one input line. Blank lines yield `None`; anything unrecognized is
/// an error carrying the offending text.
pub fn parse_view_command(line: &str) -> Option<Result<ViewCommand, String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let command = match head {
        "/ready" => Ok(ViewCommand::Ready),
        "/start" => Ok(ViewCommand::Start),
        "/refresh" => Ok(ViewCommand::Refresh),
        "/quit" | "/q" => Ok(ViewCommand::Quit),
        "/help" | "/?" => Ok(ViewCommand::Help),
        "/invite" => match parts.next() {
            None | Some("participant") => Ok(ViewCommand::Invite(InviteRole::Participant)),
            Some("spectator") => Ok(ViewCommand::Invite(InviteRole::Spectator)),
            Some(other) => Err(format!("unknown invite role {other:?}")),
        },
        "/react" => match parts.next() {
            None => Err("usage: /react <emoji> [turn]".to_string()),
            Some(emoji) => match parts.next().map(str::parse::<u64>) {
                None => Ok(ViewCommand::React {
                    emoji: emoji.to_string(),
                    turn_index: None,
                }),
                Some(Ok(turn)) if turn >= 1 => Ok(ViewCommand::React {
                    emoji: emoji.to_string(),
                    turn_index: Some(turn),
                }),
                Some(_) => Err("turn must be a positive number".to_string()),
            },
        },
        other => Err(format!("unknown command {other:?}")),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_with_globals() {
        let args = Args::try_parse_from([
            "argue-watch",
            "watch",
            "arg-1",
            "--user-id",
            "u1",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.user_id.as_deref(), Some("u1"));
        assert_eq!(overrides.request_timeout_secs, Some(5));
        match args.command {
            Command::Watch {
                argument_id,
                once,
                redraw_ms,
            } => {
                assert_eq!(argument_id, "arg-1");
                assert!(!once);
                assert_eq!(redraw_ms, 250);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_flags() {
        let args = Args::try_parse_from([
            "argue-watch",
            "create",
            "  Is cereal soup?  ",
            "--shape",
            "slow-burn",
            "--evidence",
            "receipts-preferred",
            "--composure",
            "80",
        ])
        .unwrap();
        let Command::Create {
            topic,
            shape,
            win_condition,
            pace,
            evidence,
            composure,
            audience,
        } = args.command
        else {
            panic!("expected create");
        };
        let request = create_request(
            &topic,
            shape,
            win_condition,
            pace,
            evidence,
            composure,
            audience,
        );
        assert_eq!(request.topic, "Is cereal soup?");
        assert_eq!(request.controls.argument_shape, ArgumentShape::SlowBurn);
        assert_eq!(
            request.controls.evidence_mode,
            EvidenceMode::ReceiptsPreferred
        );
        assert_eq!(request.controls.argument_composure, 80);
        assert!(request.controls.guardrails.stay_on_topic);
    }

    #[test]
    fn test_composure_out_of_range_rejected() {
        let result =
            Args::try_parse_from(["argue-watch", "create", "t", "--composure", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_persona_trims_and_drops_blanks() {
        let p = persona(
            " pro ",
            &["  taste ".into(), "".into()],
            &["   ".into()],
        );
        assert_eq!(p.stance, "pro");
        assert_eq!(p.defend_points, vec!["taste".to_string()]);
        assert!(p.red_lines.is_empty());
    }

    #[test]
    fn test_parse_view_commands() {
        assert_eq!(parse_view_command("   "), None);
        assert_eq!(parse_view_command("/ready"), Some(Ok(ViewCommand::Ready)));
        assert_eq!(parse_view_command(" /q "), Some(Ok(ViewCommand::Quit)));
        assert_eq!(
            parse_view_command("/react 🔥 3"),
            Some(Ok(ViewCommand::React {
                emoji: "🔥".into(),
                turn_index: Some(3)
            }))
        );
        assert_eq!(
            parse_view_command("/invite spectator"),
            Some(Ok(ViewCommand::Invite(InviteRole::Spectator)))
        );
        assert!(matches!(parse_view_command("/react"), Some(Err(_))));
        assert!(matches!(parse_view_command("/react 🔥 0"), Some(Err(_))));
        assert!(matches!(parse_view_command("hello"), Some(Err(_))));
    }
}
