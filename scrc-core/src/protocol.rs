//! SCRC wire constants

/// Identification request body, sent after the bot id
pub const INIT_REQUEST: &str = "(init 0)";

/// Substring of the server's identification reply
pub const IDENTIFIED: &str = "identified";

/// Substring of a server shutdown message
pub const SHUTDOWN: &str = "shutdown";

/// Substring of a server restart message
pub const RESTART: &str = "restart";

/// Client message ending the current episode
pub const META_END: &str = "(meta 1)";

/// Receive buffer size; frames stay well under this
pub const MAX_DATAGRAM: usize = 1000;

/// Full identification request for a bot
pub fn init_message(bot_id: &str) -> String {
    format!("{}{}", bot_id, INIT_REQUEST)
}

/// Server messages that interrupt the racing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSignal {
    Shutdown,
    Restart,
}

impl ServerSignal {
    /// Classify a datagram; shutdown wins if both markers appear
    pub fn detect(message: &str) -> Option<Self> {
        if message.contains(SHUTDOWN) {
            Some(Self::Shutdown)
        } else if message.contains(RESTART) {
            Some(Self::Restart)
        } else {
            None
        }
    }
}

pub fn is_identified(message: &str) -> bool {
    message.contains(IDENTIFIED)
}
