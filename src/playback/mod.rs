pub mod session;

pub use session::{
    LoadTicket, PlayAttempt, PlaybackSession, SelectOutcome, SessionCue, Toggle, TransportStatus,
};
