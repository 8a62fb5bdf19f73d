//! Relay messages exchanged between the game master's client and the players'.
//!
//! The sending side wraps the macro to run and its arguments into a
//! [`RelayPayload`] addressed to every active user ([`Broadcast`]). The
//! receiving side resolves the payload against its [`MacroBook`] and hands the
//! script plus its [`GmContext`] back to the embedder as a [`Dispatch`].

mod book;
mod broadcast;
mod payload;

pub use book::{Dispatch, MacroBook, MacroEntry, MacroKind};
pub use broadcast::{Broadcast, User};
pub use payload::{GmContext, RelayPayload};

/// Socket channel shared by every client of the module.
pub const CHANNEL: &str = "module.custom-foundry";
/// The only action clients act upon.
pub const ACTION: &str = "executeMacroContentForPlayer";
/// Name of the macro the game master broadcasts to toggle the effect.
pub const PIXELATE_MACRO: &str = "pixelate";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed relay payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("ignoring relay action {0:?}")]
    UnknownAction(String),
    #[error("relay payload carries no macro id")]
    MissingMacroId,
    #[error("macro {0} not found")]
    UnknownMacro(String),
    #[error("macro {name} is not a script macro")]
    NotAScript { name: String },
}
