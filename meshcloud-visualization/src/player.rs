//! Frame-by-frame playback of the settling animation

use crate::animation::{AnimationConfig, AnimationState};
use crate::canvas::Canvas;
use crate::scatter3d::{Marker, RenderConfig, Scatter3d};
use crate::view_box::ViewBox;
use meshcloud_core::{Bounded, PointSet, Result};
use meshcloud_io::OutputLayout;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Destination of rendered animation frames
pub trait FrameSink {
    /// Receive frame `index`, counted from zero
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()>;

    /// Called once after the last frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes `frame_0000.png`, `frame_0001.png`, ... as fast as they render
#[derive(Debug, Clone)]
pub struct DirectorySink {
    layout: OutputLayout,
    written: usize,
}

impl DirectorySink {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout, written: 0 }
    }

    pub fn frame_dir(&self) -> PathBuf {
        self.layout.frame_dir()
    }

    /// Frames written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        let path = self.layout.frame_path(index);
        frame.save(&path)?;
        debug!("Saved {}", path.display());
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!("Wrote {} frames to {}", self.written, self.frame_dir().display());
        Ok(())
    }
}

/// Overwrites one image with the latest frame; the live surface when no
/// window can be opened
#[derive(Debug, Clone)]
pub struct PreviewSink {
    path: PathBuf,
}

impl PreviewSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preview at the layout's `preview.png`
    pub fn in_layout(layout: &OutputLayout) -> Self {
        Self::new(layout.preview())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for PreviewSink {
    fn write_frame(&mut self, _index: usize, frame: &Canvas) -> Result<()> {
        frame.save(&self.path)
    }
}

/// Holds each frame back until the frame interval has passed since the
/// previous one
#[derive(Debug, Clone)]
pub struct PacedSink<S> {
    inner: S,
    interval: Duration,
    last: Option<Instant>,
}

impl<S: FrameSink> PacedSink<S> {
    pub fn new(inner: S, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last: None,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSink> FrameSink for PacedSink<S> {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.inner.write_frame(index, frame)?;
        self.last = Some(Instant::now());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }
}

/// Steps an [`AnimationState`] and renders every frame into a sink
#[derive(Debug, Clone)]
pub struct Animator {
    scatter: Scatter3d,
    config: AnimationConfig,
}

impl Animator {
    /// Animator whose view box leaves headroom above `points`
    pub fn new(render: RenderConfig, config: AnimationConfig, points: &PointSet) -> Result<Self> {
        config.validate()?;
        let view = ViewBox::settling(&points.bounding_box(), config.zoom)?;
        let scatter = Scatter3d::new(render, view)?;
        Ok(Self { scatter, config })
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Ghosts first, then the points at their current positions
    pub fn frame_markers(&self, state: &AnimationState, points: &PointSet) -> Vec<Marker> {
        let render = self.scatter.config();
        let ghosts = state.ghosts().iter().map(|g| Marker {
            position: g.position,
            color: render.point_color(points, g.point),
            alpha: g.alpha,
        });
        let current = (0..state.len()).map(|i| Marker {
            position: state.position(i),
            color: render.point_color(points, i),
            alpha: 1.0,
        });
        ghosts.chain(current).collect()
    }

    /// Play the configured number of frames. Each frame is drawn on a fresh
    /// canvas, so only the surviving ghosts of that frame are visible.
    pub fn run<S: FrameSink + ?Sized>(&self, points: &PointSet, sink: &mut S) -> Result<AnimationState> {
        let mut state = AnimationState::new(&points.positions, &self.config)?;
        info!("Animating {} points over {} frames", state.len(), self.config.frames);

        for index in 0..self.config.frames {
            state.step();
            let canvas = self.scatter.draw(&self.frame_markers(&state, points))?;
            sink.write_frame(index, &canvas)?;
        }

        sink.finish()?;
        Ok(state)
    }
}
