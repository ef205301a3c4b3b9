//! Live playback in a native window
//!
//! The animation renders on a worker thread into a [`WindowSink`]; the
//! window runs the eframe event loop on the calling thread and shows the
//! newest frame it has received. Playback is bounded: the window closes one
//! interval after the last frame, or once `frames * interval` plus a start-up
//! grace has passed.

use crate::animation::AnimationConfig;
use crate::canvas::Canvas;
use crate::player::FrameSink;
use meshcloud_core::{Error, Result};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Time allowed for the window to appear before frames count against the
/// playback bound
const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// Hands frames to a [`LiveWindow`] running on another thread
#[derive(Debug, Clone)]
pub struct WindowSink {
    sender: Sender<Canvas>,
    sent: usize,
}

impl WindowSink {
    /// Frames delivered so far
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl FrameSink for WindowSink {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        self.sender
            .send(frame.clone())
            .map_err(|_| Error::Visualization(format!("live window closed before frame {index}")))?;
        self.sent += 1;
        Ok(())
    }
}

/// Receiving end of a [`WindowSink`]
#[derive(Debug)]
pub struct FrameQueue {
    receiver: Receiver<Canvas>,
    received: usize,
    disconnected: bool,
}

impl FrameQueue {
    /// Drain everything pending and return only the newest frame
    pub fn latest(&mut self) -> Option<Canvas> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => {
                    latest = Some(frame);
                    self.received += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        latest
    }

    /// The sender is gone and every frame has been taken
    pub fn is_finished(&self) -> bool {
        self.disconnected
    }

    pub fn received(&self) -> usize {
        self.received
    }
}

/// Whether playback is over: the last frame has been up for `linger`, or the
/// window has been open longer than `deadline`
pub fn playback_over(finished_for: Option<Duration>, open_for: Duration, linger: Duration, deadline: Duration) -> bool {
    finished_for.is_some_and(|f| f >= linger) || open_for >= deadline
}

/// RGBA copy of a canvas for upload as an egui texture
pub fn color_image(canvas: &Canvas) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [canvas.width() as usize, canvas.height() as usize],
        canvas.image().as_raw(),
    )
}

/// A native window that plays frames from a [`WindowSink`]
#[derive(Debug)]
pub struct LiveWindow {
    title: String,
    size: [f32; 2],
    queue: FrameQueue,
    interval: Duration,
    deadline: Duration,
}

impl LiveWindow {
    /// Connected sink and window for an animation of `config.frames` frames
    pub fn channel(title: impl Into<String>, width: u32, height: u32, config: &AnimationConfig) -> (WindowSink, Self) {
        let (sender, receiver) = mpsc::channel();
        let frames = u32::try_from(config.frames).unwrap_or(u32::MAX);
        let window = Self {
            title: title.into(),
            size: [width as f32, height as f32],
            queue: FrameQueue {
                receiver,
                received: 0,
                disconnected: false,
            },
            interval: config.interval,
            deadline: config.interval.saturating_mul(frames).saturating_add(STARTUP_GRACE),
        };
        (WindowSink { sender, sent: 0 }, window)
    }

    /// Upper bound on how long the window stays open
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Open the window and block until playback is over or the user closes
    /// it. Fails when no window can be created, e.g. without a display.
    pub fn run(self) -> Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(self.size)
                .with_resizable(false)
                .with_title(self.title.clone()),
            ..Default::default()
        };
        let name = self.title.clone();
        info!("Opening live window for up to {:.1}s", self.deadline.as_secs_f32());

        eframe::run_native(
            &name,
            options,
            Box::new(move |_cc| Box::new(PlaybackApp::new(self))),
        )
        .map_err(|e| Error::Visualization(format!("failed to open live window: {e}")))
    }
}

struct PlaybackApp {
    window: LiveWindow,
    texture: Option<egui::TextureHandle>,
    opened: Instant,
    finished: Option<Instant>,
}

impl PlaybackApp {
    fn new(window: LiveWindow) -> Self {
        Self {
            window,
            texture: None,
            opened: Instant::now(),
            finished: None,
        }
    }
}

impl eframe::App for PlaybackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(frame) = self.window.queue.latest() {
            let image = color_image(&frame);
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
                None => {
                    self.texture = Some(ctx.load_texture("animation-frame", image, egui::TextureOptions::NEAREST));
                }
            }
        }
        if self.window.queue.is_finished() && self.finished.is_none() {
            debug!("Live window received all {} frames", self.window.queue.received());
            self.finished = Some(Instant::now());
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.image(texture);
                }
            });

        let over = playback_over(
            self.finished.map(|t| t.elapsed()),
            self.opened.elapsed(),
            self.window.interval,
            self.window.deadline,
        );
        if over {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else {
            ctx.request_repaint_after(self.window.interval.min(Duration::from_millis(16)));
        }
    }
}
