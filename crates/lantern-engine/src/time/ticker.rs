use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/// Frames-per-second measured over one ticker interval.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FpsSample {
    pub fps: f32,
    pub frames: u32,
}

/// Counts frames between ticks.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    since: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self { frames: 0, since: now }
    }

    #[inline]
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Closes the current window at `now` and starts the next one.
    pub fn sample(&mut self, now: Instant) -> FpsSample {
        let secs = now.saturating_duration_since(self.since).as_secs_f32();
        let fps = if secs > 0.0 { self.frames as f32 / secs } else { 0.0 };
        let sample = FpsSample { fps, frames: self.frames };
        self.frames = 0;
        self.since = now;
        sample
    }
}

/// FPS sampler driven by a background thread.
///
/// The thread only sends tick timestamps over a channel; frames are counted on the
/// calling thread and the channel is drained without blocking. The thread exits on its
/// next tick after the ticker is dropped.
pub struct FpsTicker {
    ticks: Receiver<Instant>,
    counter: FpsCounter,
    latest: Option<FpsSample>,
}

impl FpsTicker {
    /// Starts a ticker firing every `interval`.
    pub fn start(interval: Duration) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new().name("fps-ticker".into()).spawn(move || loop {
            thread::sleep(interval);
            if tx.send(Instant::now()).is_err() {
                break;
            }
        })?;
        Ok(Self { ticks: rx, counter: FpsCounter::new(Instant::now()), latest: None })
    }

    /// Records one presented frame. Returns a fresh sample when a tick arrived.
    pub fn frame(&mut self) -> Option<FpsSample> {
        self.counter.record_frame();

        let mut tick = None;
        loop {
            match self.ticks.try_recv() {
                Ok(at) => tick = Some(at),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("fps ticker thread stopped");
                    break;
                }
            }
        }

        let at = tick?;
        let sample = self.counter.sample(at);
        self.latest = Some(sample);
        Some(sample)
    }

    /// Most recent sample, if any tick has arrived yet.
    pub fn latest(&self) -> Option<FpsSample> {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_divides_frames_by_window() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        for _ in 0..30 {
            counter.record_frame();
        }
        let sample = counter.sample(start + Duration::from_millis(500));
        assert_eq!(sample.frames, 30);
        assert!((sample.fps - 60.0).abs() < 1e-3);

        let next = counter.sample(start + Duration::from_millis(1500));
        assert_eq!(next.frames, 0);
        assert_eq!(next.fps, 0.0);
    }

    #[test]
    fn ticker_delivers_samples() {
        let mut ticker = FpsTicker::start(Duration::from_millis(10)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut sample = None;
        while sample.is_none() && Instant::now() < deadline {
            sample = ticker.frame();
            thread::sleep(Duration::from_millis(1));
        }
        let sample = sample.expect("no tick within 5 s");
        assert!(sample.frames >= 1);
        assert_eq!(ticker.latest(), Some(sample));
    }
}
