//! Chat assistant
//!
//! [`ChatSession`] owns the transcript; [`ChatRepl`] is the line-oriented
//! front end used by `fc chat`.

mod repl;
mod session;

pub use repl::ChatRepl;
pub use session::{ChatSession, ChatTurn};
