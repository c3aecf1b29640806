//! Inbound event classification.
//!
//! Raw chat input is classified once, here, into an [`Event`]. Controllers only
//! ever see classified events and never re-parse text.

use crate::session::UserOp;
use arrbot_core::backend::MediaKind;
use arrbot_core::config::Entrypoints;
use arrbot_core::download::SpeedMode;
use std::fmt;

/// Workflow entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryCommand {
    /// Authenticate with the password.
    Auth,
    /// Add media, kind asked later.
    Add,
    /// Add a movie.
    Movie,
    /// Add a series.
    Series,
    /// Delete media.
    Delete,
    /// List every movie of an instance.
    AllMovies,
    /// List every series of an instance.
    AllSeries,
    /// Switch download speed limits.
    Speed,
    /// Subscribe to backend notifications.
    Notify,
    /// Show help.
    Help,
    /// Manage authenticated chats.
    Users,
    /// Cancel the active workflow.
    Stop,
}

impl EntryCommand {
    /// Every entry point, in help order.
    pub const ALL: [Self; 12] = [
        Self::Auth,
        Self::Add,
        Self::Movie,
        Self::Series,
        Self::Delete,
        Self::AllMovies,
        Self::AllSeries,
        Self::Speed,
        Self::Notify,
        Self::Users,
        Self::Help,
        Self::Stop,
    ];

    /// Configured command word.
    #[must_use]
    pub fn word(self, entrypoints: &Entrypoints) -> &str {
        match self {
            Self::Auth => &entrypoints.auth,
            Self::Add => &entrypoints.add,
            Self::Movie => &entrypoints.movie,
            Self::Series => &entrypoints.series,
            Self::Delete => &entrypoints.delete,
            Self::AllMovies => &entrypoints.all_movies,
            Self::AllSeries => &entrypoints.all_series,
            Self::Speed => &entrypoints.speed,
            Self::Notify => &entrypoints.notify,
            Self::Help => &entrypoints.help,
            Self::Users => &entrypoints.users,
            Self::Stop => &entrypoints.stop,
        }
    }

    /// Short description for command menus.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Auth => "Authenticate with the bot password",
            Self::Add => "Add a movie or series",
            Self::Movie => "Add a movie",
            Self::Series => "Add a series",
            Self::Delete => "Delete a movie or series",
            Self::AllMovies => "List all movies",
            Self::AllSeries => "List all series",
            Self::Speed => "Switch download speed limits",
            Self::Notify => "Receive download notifications",
            Self::Help => "Show help",
            Self::Users => "Manage authenticated users",
            Self::Stop => "Cancel the current conversation",
        }
    }

    /// Whether the bare word (without `/`) may be followed by arguments.
    const fn takes_arguments(self) -> bool {
        matches!(self, Self::Auth | Self::Movie | Self::Series)
    }
}

/// Inline button actions.
///
/// The token format is `name` or `name=value`, kept short for transport limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pick an instance by label.
    Instance(String),
    /// Pick the n-th offered root folder.
    Path(usize),
    /// Pick a quality profile by id.
    Quality(i64),
    /// Toggle one season.
    Season(u32),
    /// Select every season.
    AllSeasons,
    /// Deselect every season.
    NoSeasons,
    /// Add with the selected seasons and all future ones.
    CommitSeasons,
    /// Movie or series.
    Kind(MediaKind),
    /// Add the shown result.
    Add,
    /// Previous result.
    Prev,
    /// Next result.
    Next,
    /// Start over with a new search.
    New,
    /// Delete the shown item.
    Delete,
    /// End the conversation.
    Stop,
    /// Speed limit choice.
    Speed(SpeedMode),
    /// User administration operation.
    Users(UserOp),
}

impl Action {
    /// Parse a token; `None` for anything not produced by [`Action::to_string`].
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };

        match (name, value) {
            ("instance", Some(label)) if !label.is_empty() => Some(Self::Instance(label.to_string())),
            ("path", Some(index)) => index.parse().ok().map(Self::Path),
            ("quality", Some(id)) => id.parse().ok().map(Self::Quality),
            ("season", Some("all")) => Some(Self::AllSeasons),
            ("season", Some("none")) => Some(Self::NoSeasons),
            ("season", Some("commit")) => Some(Self::CommitSeasons),
            ("season", Some(n)) => n.parse().ok().map(Self::Season),
            ("kind", Some("movie")) => Some(Self::Kind(MediaKind::Movie)),
            ("kind", Some("series")) => Some(Self::Kind(MediaKind::Series)),
            ("speed", Some("normal")) => Some(Self::Speed(SpeedMode::Normal)),
            ("speed", Some("alternate")) => Some(Self::Speed(SpeedMode::Alternate)),
            ("users", Some("list")) => Some(Self::Users(UserOp::List)),
            ("users", Some("add")) => Some(Self::Users(UserOp::Add)),
            ("users", Some("revoke")) => Some(Self::Users(UserOp::Revoke)),
            ("add", None) => Some(Self::Add),
            ("prev", None) => Some(Self::Prev),
            ("next", None) => Some(Self::Next),
            ("new", None) => Some(Self::New),
            ("delete", None) => Some(Self::Delete),
            ("stop", None) => Some(Self::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(label) => write!(f, "instance={label}"),
            Self::Path(index) => write!(f, "path={index}"),
            Self::Quality(id) => write!(f, "quality={id}"),
            Self::Season(n) => write!(f, "season={n}"),
            Self::AllSeasons => f.write_str("season=all"),
            Self::NoSeasons => f.write_str("season=none"),
            Self::CommitSeasons => f.write_str("season=commit"),
            Self::Kind(MediaKind::Movie) => f.write_str("kind=movie"),
            Self::Kind(MediaKind::Series) => f.write_str("kind=series"),
            Self::Add => f.write_str("add"),
            Self::Prev => f.write_str("prev"),
            Self::Next => f.write_str("next"),
            Self::New => f.write_str("new"),
            Self::Delete => f.write_str("delete"),
            Self::Stop => f.write_str("stop"),
            Self::Speed(SpeedMode::Normal) => f.write_str("speed=normal"),
            Self::Speed(SpeedMode::Alternate) => f.write_str("speed=alternate"),
            Self::Users(UserOp::List) => f.write_str("users=list"),
            Self::Users(UserOp::Add) => f.write_str("users=add"),
            Self::Users(UserOp::Revoke) => f.write_str("users=revoke"),
        }
    }
}

/// A classified inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An entry command, with whatever followed the command word.
    Command {
        /// Which entry point.
        command: EntryCommand,
        /// Trimmed remainder of the message.
        args: String,
    },
    /// Free text.
    Text(String),
    /// A recognised button action.
    Action(Action),
    /// A button token that is not a known action.
    Stale(String),
}

impl Event {
    /// Whether this event cancels the conversation.
    #[must_use]
    pub fn is_stop(&self) -> bool {
        matches!(
            self,
            Self::Command {
                command: EntryCommand::Stop,
                ..
            } | Self::Action(Action::Stop)
        )
    }
}

/// Classifies raw input against the configured entry points.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    words: Vec<(String, EntryCommand)>,
}

impl EventClassifier {
    /// Classifier for the configured command words. `start` is an alias for help.
    #[must_use]
    pub fn new(entrypoints: &Entrypoints) -> Self {
        let mut words: Vec<(String, EntryCommand)> = EntryCommand::ALL
            .iter()
            .map(|&c| (c.word(entrypoints).to_lowercase(), c))
            .collect();
        words.push(("start".to_string(), EntryCommand::Help));
        Self { words }
    }

    /// Entry point for a command word, ignoring case.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<EntryCommand> {
        let word = word.to_lowercase();
        self.words
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, command)| *command)
    }

    /// Classify a text message.
    ///
    /// `/word args` and `/word@bot args` are commands. A bare word is a command
    /// only when it is the whole message, except for the add shortcuts
    /// (`movie <title>`, `series <title>`) and `auth <password>`.
    #[must_use]
    pub fn classify_text(&self, text: &str) -> Event {
        let text = text.trim();
        let (head, rest) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(head, rest)| (head, rest.trim()));

        let (explicit, word) = match head.strip_prefix('/') {
            Some(word) => (true, word.split('@').next().unwrap_or(word)),
            None => (false, head),
        };

        match self.lookup(word) {
            Some(command) if explicit || rest.is_empty() || command.takes_arguments() => {
                Event::Command {
                    command,
                    args: rest.to_string(),
                }
            }
            _ => Event::Text(text.to_string()),
        }
    }

    /// Classify a button token.
    #[must_use]
    pub fn classify_action(token: &str) -> Event {
        Action::parse(token).map_or_else(|| Event::Stale(token.to_string()), Event::Action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> EventClassifier {
        EventClassifier::new(&Entrypoints::default())
    }

    fn command(command: EntryCommand, args: &str) -> Event {
        Event::Command {
            command,
            args: args.to_string(),
        }
    }

    #[test]
    fn test_slash_commands_with_bot_suffix() {
        let c = classifier();
        assert_eq!(c.classify_text("/add"), command(EntryCommand::Add, ""));
        assert_eq!(c.classify_text("/Delete@arr_bot  Alien "), command(EntryCommand::Delete, "Alien"));
        assert_eq!(c.classify_text("/start"), command(EntryCommand::Help, ""));
        assert_eq!(c.classify_text("/allMovies"), command(EntryCommand::AllMovies, ""));
        assert_eq!(c.classify_text("/qbittorrent"), command(EntryCommand::Speed, ""));
    }

    #[test]
    fn test_bare_words() {
        let c = classifier();
        assert_eq!(c.classify_text("STOP"), command(EntryCommand::Stop, ""));
        assert_eq!(c.classify_text("movie The Thing"), command(EntryCommand::Movie, "The Thing"));
        assert_eq!(c.classify_text("auth hunter2"), command(EntryCommand::Auth, "hunter2"));
        assert_eq!(c.classify_text("help me please"), Event::Text("help me please".to_string()));
        assert_eq!(c.classify_text("  Alien  "), Event::Text("Alien".to_string()));
    }

    #[test]
    fn test_custom_entrypoints() {
        let entrypoints = Entrypoints {
            add: "request".to_string(),
            ..Entrypoints::default()
        };
        let c = EventClassifier::new(&entrypoints);

        assert_eq!(c.classify_text("/request"), command(EntryCommand::Add, ""));
        assert_eq!(c.classify_text("/add"), Event::Text("/add".to_string()));
    }

    #[test]
    fn test_action_tokens() {
        for action in [
            Action::Instance("4K = best".to_string()),
            Action::Path(2),
            Action::Quality(-1),
            Action::Season(0),
            Action::AllSeasons,
            Action::CommitSeasons,
            Action::Kind(MediaKind::Series),
            Action::Speed(SpeedMode::Alternate),
            Action::Users(UserOp::Revoke),
            Action::Stop,
        ] {
            assert_eq!(Action::parse(&action.to_string()), Some(action));
        }

        assert_eq!(EventClassifier::classify_action("path=x"), Event::Stale("path=x".to_string()));
        assert_eq!(EventClassifier::classify_action("instance="), Event::Stale("instance=".to_string()));
        assert!(EventClassifier::classify_action("stop").is_stop());
    }
}
