//! Settling animation with fading ghost trails
//!
//! Every point gets an activation frame derived from its height: the highest
//! point activates first and the lowest last. Once active a point accelerates
//! along z every frame and never stops. Each frame also leaves a ghost at
//! every point's position that fades out over the following frames.

use meshcloud_core::{Error, Point3f, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Added to the z range so that flat clouds do not divide by zero
const RANGE_EPSILON: f32 = 1e-8;
/// Slack on `ghost_alpha / ghost_decay` so that ratios like `0.3 / 0.1`,
/// which are whole numbers only up to rounding, do not gain a frame
const LIFETIME_SLACK: f32 = 1e-4;

/// Animation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Number of frames to render
    pub frames: usize,
    /// Frame interval for live playback
    pub interval: Duration,
    /// Added to a point's z velocity every active frame
    pub acceleration: f32,
    /// Activation frame of the lowest point
    pub activation_span: f32,
    /// Opacity of a freshly recorded ghost
    pub ghost_alpha: f32,
    /// Opacity lost by every ghost each frame
    pub ghost_decay: f32,
    /// Zoom of the settling view box
    pub zoom: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: 200,
            interval: Duration::from_millis(50),
            acceleration: 0.001,
            activation_span: 100.0,
            ghost_alpha: 0.5,
            ghost_decay: 0.125,
            zoom: 0.5,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.ghost_alpha > 0.0 && self.ghost_alpha <= 1.0) {
            return Err(Error::Visualization(format!(
                "ghost alpha must be within (0, 1], got {}",
                self.ghost_alpha
            )));
        }
        if !(self.ghost_decay > 0.0 && self.ghost_decay.is_finite()) {
            return Err(Error::Visualization(format!(
                "ghost decay must be positive, got {}",
                self.ghost_decay
            )));
        }
        if !(self.zoom > 0.0 && self.zoom.is_finite()) {
            return Err(Error::Visualization(format!("zoom must be positive, got {}", self.zoom)));
        }
        if !self.acceleration.is_finite() || !self.activation_span.is_finite() {
            return Err(Error::Visualization(
                "acceleration and activation span must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of frames a ghost stays visible: the smallest `n` with
    /// `ghost_alpha - n * ghost_decay <= 0`
    pub fn ghost_lifetime(&self) -> usize {
        ((self.ghost_alpha / self.ghost_decay - LIFETIME_SLACK).ceil() as usize).max(1)
    }
}

/// A faded echo of a point's earlier position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    /// Index of the point that left the ghost
    pub point: usize,
    pub position: Point3f,
    pub alpha: f32,
    /// Decays applied since the ghost was recorded
    pub age: usize,
}

/// Activation frame per point: `(1 - (z - zmin) / (zmax - zmin + eps)) * span`
pub fn activation_times(z: &[f32], span: f32) -> Vec<f32> {
    let (min, max) = z
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min + RANGE_EPSILON;
    z.iter().map(|&v| (1.0 - (v - min) / range) * span).collect()
}

/// Per-point animation state threaded through [`AnimationState::step`]
#[derive(Debug, Clone)]
pub struct AnimationState {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    velocity: Vec<f32>,
    activation: Vec<f32>,
    ghosts: Vec<Ghost>,
    frame: usize,
    acceleration: f32,
    ghost_alpha: f32,
    ghost_decay: f32,
    ghost_lifetime: usize,
}

impl AnimationState {
    pub fn new(positions: &[Point3f], config: &AnimationConfig) -> Result<Self> {
        config.validate()?;
        let x: Vec<f32> = positions.iter().map(|p| p.x).collect();
        let y: Vec<f32> = positions.iter().map(|p| p.y).collect();
        let z: Vec<f32> = positions.iter().map(|p| p.z).collect();
        let activation = activation_times(&z, config.activation_span);

        Ok(Self {
            velocity: vec![0.0; z.len()],
            x,
            y,
            z,
            activation,
            ghosts: Vec::new(),
            frame: 0,
            acceleration: config.acceleration,
            ghost_alpha: config.ghost_alpha,
            ghost_decay: config.ghost_decay,
            ghost_lifetime: config.ghost_lifetime(),
        })
    }

    /// Advance one frame.
    ///
    /// Existing ghosts fade and the spent ones are dropped, then a ghost is
    /// recorded at every current position and finally the active points move.
    /// Opacity is recomputed from the age, so rounding never accumulates.
    pub fn step(&mut self) {
        let (alpha, decay, lifetime) = (self.ghost_alpha, self.ghost_decay, self.ghost_lifetime);
        self.ghosts.retain_mut(|g| {
            g.age += 1;
            g.alpha = (alpha - g.age as f32 * decay).max(0.0);
            g.age < lifetime
        });

        let (x, y, z) = (&self.x, &self.y, &self.z);
        self.ghosts.extend((0..z.len()).map(|i| Ghost {
            point: i,
            position: Point3f::new(x[i], y[i], z[i]),
            alpha,
            age: 0,
        }));

        for i in 0..self.len() {
            if self.is_active(i) {
                self.velocity[i] += self.acceleration;
                self.z[i] += self.velocity[i];
            }
        }

        self.frame += 1;
    }

    /// Whether point `i` moves during the current frame
    pub fn is_active(&self, i: usize) -> bool {
        self.frame as f32 > self.activation[i]
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Frames stepped so far
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn position(&self, i: usize) -> Point3f {
        Point3f::new(self.x[i], self.y[i], self.z[i])
    }

    pub fn positions(&self) -> Vec<Point3f> {
        (0..self.len()).map(|i| self.position(i)).collect()
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }

    pub fn activation(&self) -> &[f32] {
        &self.activation
    }

    /// Surviving ghosts, oldest first
    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }
}
