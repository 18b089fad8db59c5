/// Optional knobs of a `play` command. Unset fields are left to the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Position in milliseconds to start from.
    pub start_time: Option<u64>,
    /// Position in milliseconds to stop at.
    pub end_time: Option<u64>,
    pub volume: Option<u16>,
    /// Ignore the command if a track is already playing.
    pub no_replace: Option<bool>,
    /// Start paused.
    pub pause: Option<bool>,
}

impl PlayOptions {
    pub fn start_time(mut self, ms: u64) -> Self {
        self.start_time = Some(ms);
        self
    }

    pub fn end_time(mut self, ms: u64) -> Self {
        self.end_time = Some(ms);
        self
    }

    pub fn volume(mut self, volume: u16) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn no_replace(mut self, no_replace: bool) -> Self {
        self.no_replace = Some(no_replace);
        self
    }

    pub fn paused(mut self, pause: bool) -> Self {
        self.pause = Some(pause);
        self
    }
}
