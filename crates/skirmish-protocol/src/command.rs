//! The command vocabulary.
//!
//! A command frame is the command's name as UTF-8 text, nothing else.
//! Commands that carry a payload (`turn`, `hand`) send it as a separate
//! codec-encoded frame after the server acknowledges the command.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// A request a peer can make of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Full state snapshot.
    Get,
    /// Submit a turn (two-step: ack, then the turn payload).
    Turn,
    /// Current turn hand-off info, answered immediately.
    RequestTurn,
    /// Like `RequestTurn`, but the server holds the reply until the caller
    /// holds the turn, the game ends, or the wait times out.
    WaitTurn,
    /// Commit a tie-break hand (two-step: ack, then the hand value).
    Hand,
    /// Compare committed hands.
    RpsWinner,
    /// Whether exactly one hand is committed.
    CheckRps,
    /// Mark the caller ready.
    Start,
    /// Reinitialize the match.
    Reset,
    /// Close the caller's session.
    Quit,
}

impl Command {
    /// Every command, in wire-table order.
    pub const ALL: [Command; 10] = [
        Command::Get,
        Command::Turn,
        Command::RequestTurn,
        Command::WaitTurn,
        Command::Hand,
        Command::RpsWinner,
        Command::CheckRps,
        Command::Start,
        Command::Reset,
        Command::Quit,
    ];

    /// The name sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::Turn => "turn",
            Command::RequestTurn => "request_turn",
            Command::WaitTurn => "wait_turn",
            Command::Hand => "hand",
            Command::RpsWinner => "rps_winner",
            Command::CheckRps => "check_rps",
            Command::Start => "start",
            Command::Reset => "reset",
            Command::Quit => "quit",
        }
    }

    /// Parses a raw command frame.
    pub fn from_frame(frame: &[u8]) -> Result<Self, ProtocolError> {
        std::str::from_utf8(frame)
            .map_err(|_| ProtocolError::NonUtf8Command)?
            .parse()
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
