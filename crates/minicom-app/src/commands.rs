use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use thiserror::Error;

use minicom_chat::{ChatSession, PendingSend};
use minicom_types::{MessageStatus, SenderId};

use crate::render;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say { role: SenderId, text: String },
    Type { role: SenderId },
    Blur { role: SenderId },
    Open { thread: String },
    Read,
    Retry { message: String },
    SetOnline(bool),
    Threads,
    Show { role: SenderId },
    Reset,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}', try /help")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

fn parse_role(arg: &str) -> Option<SenderId> {
    match arg {
        "visitor" | "v" => Some(SenderId::Visitor),
        "agent" | "a" => Some(SenderId::Agent),
        _ => None,
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let role_arg = |usage: &'static str| parse_role(rest).ok_or(ParseError::Usage(usage));
        let required = |usage: &'static str| {
            if rest.is_empty() {
                Err(ParseError::Usage(usage))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match head {
            "/type" => Command::Type {
                role: role_arg("/type <visitor|agent>")?,
            },
            "/blur" => Command::Blur {
                role: role_arg("/blur <visitor|agent>")?,
            },
            "/open" => Command::Open {
                thread: required("/open <thread>")?,
            },
            "/read" => Command::Read,
            "/retry" => Command::Retry {
                message: required("/retry <message>")?,
            },
            "/offline" => Command::SetOnline(false),
            "/online" => Command::SetOnline(true),
            "/threads" => Command::Threads,
            "/show" if rest.is_empty() => Command::Show {
                role: SenderId::Visitor,
            },
            "/show" => Command::Show {
                role: role_arg("/show [visitor|agent]")?,
            },
            "/reset" => Command::Reset,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other if other.starts_with('/') => return Err(ParseError::Unknown(other.to_string())),
            other => match parse_role(other) {
                Some(role) => Command::Say {
                    role,
                    text: required("<visitor|agent> <text>")?,
                },
                None => return Err(ParseError::Unknown(other.to_string())),
            },
        };
        Ok(command)
    }
}

/// What the driver should do after a command
pub enum Outcome {
    Lines(Vec<String>),
    /// A send is in flight; report it when it settles
    Pending(PendingSend),
    Quit,
}

impl Outcome {
    fn line(line: impl Into<String>) -> Self {
        Outcome::Lines(vec![line.into()])
    }
}

/// The thread a side is currently writing to
async fn current_thread(session: &ChatSession, role: SenderId) -> Option<String> {
    match role {
        SenderId::Visitor => session.visitor_thread_id().await,
        SenderId::Agent => session.active_thread_id().await,
    }
}

/// Resolve a full id or an unambiguous prefix against the session's threads
async fn resolve_thread(session: &ChatSession, prefix: &str) -> Result<String> {
    let matches: Vec<String> = session
        .threads()
        .await
        .into_keys()
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => bail!("No thread matches '{}'", prefix),
        _ => bail!("'{}' matches {} threads", prefix, matches.len()),
    }
}

async fn find_failed(session: &ChatSession, prefix: &str) -> Option<String> {
    session
        .threads()
        .await
        .into_values()
        .flat_map(|thread| thread.messages)
        .find(|m| m.status == MessageStatus::Error && m.id.starts_with(prefix))
        .map(|m| m.id)
}

pub async fn execute(state: &AppState, command: Command) -> Result<Outcome> {
    let outcome = match command {
        Command::Say { role, text } => {
            let session = state.session(role);
            let pending = session
                .begin_send(&text, role)
                .await
                .ok_or_else(|| anyhow!("{} has no conversation to write to", role.label()))?;
            if let Some(thread_id) = current_thread(session, role).await {
                session.set_typing(&thread_id, false, role).await;
            }
            Outcome::Pending(pending)
        }
        Command::Type { role } => {
            let session = state.session(role);
            let thread_id = current_thread(session, role)
                .await
                .ok_or_else(|| anyhow!("{} has no conversation to type in", role.label()))?;
            session.set_typing(&thread_id, true, role).await;
            Outcome::line(format!("{} is typing…", role.label()))
        }
        Command::Blur { role } => {
            let session = state.session(role);
            if let Some(thread_id) = current_thread(session, role).await {
                session.blur(&thread_id, role).await;
            }
            Outcome::Lines(Vec::new())
        }
        Command::Open { thread } => {
            let thread_id = resolve_thread(&state.agent, &thread).await?;
            state.agent.set_active_thread_id(Some(thread_id.clone())).await;
            state.agent.mark_thread_read(&thread_id).await;
            show(&state.agent, SenderId::Agent).await?
        }
        Command::Read => {
            let thread_id = state
                .agent
                .active_thread_id()
                .await
                .ok_or_else(|| anyhow!("No active thread"))?;
            state.agent.mark_thread_read(&thread_id).await;
            Outcome::line(format!("Marked {} read", render::short_id(&thread_id)))
        }
        Command::Retry { message } => {
            for session in [&state.visitor, &state.agent] {
                if let Some(id) = find_failed(session, &message).await {
                    if let Some(pending) = session.begin_retry(&id).await {
                        return Ok(Outcome::Pending(pending));
                    }
                }
            }
            bail!("No failed message matches '{}'", message)
        }
        Command::SetOnline(online) => {
            state.network.set_online(online);
            Outcome::Lines(Vec::new())
        }
        Command::Threads => {
            let active = state.agent.active_thread_id().await;
            Outcome::Lines(render::inbox_lines(
                &state.agent.thread_list().await,
                &state.agent.typing_by_thread(),
                active.as_deref(),
            ))
        }
        Command::Show { role } => show(state.session(role), role).await?,
        Command::Reset => {
            state.reset().await?;
            Outcome::line("Chat data cleared.")
        }
        Command::Help => Outcome::line(render::HELP),
        Command::Quit => Outcome::Quit,
    };
    Ok(outcome)
}

async fn show(session: &ChatSession, role: SenderId) -> Result<Outcome> {
    let thread_id = current_thread(session, role)
        .await
        .ok_or_else(|| anyhow!("{} has no conversation yet", role.label()))?;
    let thread = session
        .store()
        .thread(&thread_id)
        .await
        .ok_or_else(|| anyhow!("Thread {} disappeared", thread_id))?;
    Ok(Outcome::Lines(render::thread_lines(
        &thread,
        &session.typing_by_thread(),
    )))
}
