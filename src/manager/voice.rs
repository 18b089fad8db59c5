use crate::gateway::VoiceServerUpdate;

/// Halves of the voice handshake collected from the chat gateway.
///
/// The chat platform sends the bot's voice state and the voice server in
/// either order; the node needs both in a single `voiceUpdate`.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingVoice {
    pub(crate) session_id: Option<String>,
    pub(crate) server: Option<VoiceServerUpdate>,
}

impl PendingVoice {
    /// Stores the session id. Returns whether it changed.
    pub(crate) fn set_session(&mut self, session_id: String) -> bool {
        if self.session_id.as_deref() == Some(session_id.as_str()) {
            return false;
        }
        self.session_id = Some(session_id);
        true
    }

    pub(crate) fn set_server(&mut self, server: VoiceServerUpdate) {
        self.server = Some(server);
    }

    /// Both halves, once present.
    pub(crate) fn ready(&self) -> Option<(String, VoiceServerUpdate)> {
        match (&self.session_id, &self.server) {
            (Some(session_id), Some(server)) => Some((session_id.clone(), server.clone())),
            _ => None,
        }
    }
}
