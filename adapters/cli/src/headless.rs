//! Rendering backend that runs scenes without opening a window.

use std::time::Duration;

use anyhow::Result;
use flow_defence_rendering::{Frame, FrameInput, Presentation, RenderingBackend};

/// Steps the update closure a fixed number of times with a constant delta.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HeadlessBackend {
    frames: u32,
    dt: Duration,
}

impl HeadlessBackend {
    /// Creates a backend presenting `frames` frames of `dt` each.
    pub(crate) const fn new(frames: u32, dt: Duration) -> Self {
        Self { frames, dt }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Frame),
    {
        let size = presentation.size();
        tracing::info!(
            title = %presentation.window_title,
            width = size.x,
            height = size.y,
            frames = self.frames,
            "headless presentation started"
        );

        let mut frame = Frame::new();
        let mut presented = 0_u32;
        let mut sprites = 0_usize;
        while presented < self.frames && !frame.exit_requested {
            frame.clear();
            update(self.dt, FrameInput::default(), &mut frame);
            presented += 1;
            sprites += frame.draws.len();
        }

        tracing::debug!(presented, sprites, "headless presentation finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flow_defence_core::Viewport;
    use flow_defence_rendering::Color;

    use super::*;

    fn presentation() -> Presentation {
        Presentation::new("test", Color::from_rgb_u8(0, 0, 0), Viewport::default())
            .expect("valid presentation")
    }

    #[test]
    fn runs_the_requested_number_of_frames() {
        let mut elapsed = Duration::ZERO;
        HeadlessBackend::new(5, Duration::from_millis(16))
            .run(presentation(), |dt, _, _| elapsed += dt)
            .expect("run");

        assert_eq!(elapsed, Duration::from_millis(80));
    }

    #[test]
    fn stops_once_exit_is_requested() {
        let mut calls = 0;
        HeadlessBackend::new(100, Duration::from_millis(16))
            .run(presentation(), |_, _, frame| {
                calls += 1;
                if calls == 3 {
                    frame.request_exit();
                }
            })
            .expect("run");

        assert_eq!(calls, 3);
    }
}
