#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Continuous playback cursor over the common timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    frame: f64,
    speed: f64,
    state: PlaybackState,
    frame_count: usize,
}

impl Playback {
    /// Starts playing at frame 0. `frame_count` must be non-zero.
    pub fn new(frame_count: usize, speed: f64) -> Self {
        Playback {
            frame: 0.0,
            speed: speed.max(0.0),
            state: PlaybackState::Playing,
            frame_count,
        }
    }

    /// Advance by `speed` frames when playing, wrapping at the end of the timeline.
    pub fn tick(&mut self) {
        if self.state == PlaybackState::Playing {
            self.frame = self.wrap(self.frame + self.speed);
        }
    }

    fn wrap(&self, frame: f64) -> f64 {
        // rem_euclid instead of a single subtraction so any speed stays in range
        frame.rem_euclid(self.frame_count as f64)
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            PlaybackState::Playing => PlaybackState::Stopped,
            PlaybackState::Stopped => PlaybackState::Playing,
        };
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the speed by `delta`; it never goes negative.
    pub fn adjust_speed(&mut self, delta: f64) {
        self.speed = (self.speed + delta).max(0.0);
    }

    /// Step whole frames: clamped at the start, wrapped past the end.
    pub fn step(&mut self, delta: i64) {
        let frame = (self.frame + delta as f64).max(0.0);
        self.frame = self.wrap(frame);
    }

    /// Jump to `frame` (e.g. picked on a graph), clamped into the timeline.
    pub fn seek(&mut self, frame: f64) {
        let last = self.frame_count.saturating_sub(1) as f64;
        self.frame = if frame.is_nan() || frame < 0.0 {
            0.0
        } else if frame >= self.frame_count as f64 {
            last
        } else {
            frame
        };
    }

    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Integer frame used for every pose lookup.
    pub fn frame_index(&self) -> usize {
        (self.frame as usize).min(self.frame_count.saturating_sub(1))
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
