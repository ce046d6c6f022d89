//! # Skirmish
//!
//! Authoritative server for a two-player, turn-based strategy match.
//!
//! Two peers connect over TCP, each gets a player number, and from then on
//! every question about the match ("whose turn is it?", "where is my
//! square?") and every change to it goes through one arbiter task. The
//! server decides; the clients only render.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let server = SkirmishServer::builder()
//!     .bind("0.0.0.0:5555")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ServerConfig, cipher_from_hex};
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

/// Everything needed to run a server or drive one from a test client.
pub mod prelude {
    pub use crate::{
        ServerConfig, SkirmishError, SkirmishServer, SkirmishServerBuilder,
        cipher_from_hex,
    };
    pub use skirmish_arbiter::{Roster, TurnRejection, UnitSpec};
    pub use skirmish_protocol::{
        Ack, Attack, Codec, Command, Hand, HandOutcome, JsonCodec, Location,
        Move, PerPlayer, PlayerNumber, Snapshot, Turn, TurnUpdate, UnitId,
    };
    pub use skirmish_transport::{
        Cipher, Connection, PlainCipher, TcpConnection,
    };
}
