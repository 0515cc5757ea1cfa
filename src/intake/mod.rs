//! Loan intake conversation.
//!
//! The conversation is a linear sequence of [`Stage`]s advanced by
//! [`process_input`], a synchronous transition function with no I/O. Calls
//! to the identity backend and the reply provider are described as
//! [`Effect`]s and performed by the [`IntakeAgent`], which feeds their results
//! back in as completion inputs.

pub mod driver;
pub mod input;
pub mod machine;
pub mod messages;
pub mod session;
pub mod stage;
pub mod strings;

pub use driver::IntakeAgent;
pub use input::Input;
pub use machine::{Effect, Transition, greeting, process_input};
pub use messages::{BotMessage, MessageKind};
pub use session::{KycRecord, Language, PendingCall, Session, SessionId};
pub use stage::Stage;
