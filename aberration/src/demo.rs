use crate::{
    DemoResult, RenderContext, SourceMode,
    session::{DemoEvent, LiveSession, SessionState, StateCell},
    source::StaticSource,
    target::{self, SharedTarget},
};
use camera::{CaptureBackend, FacingMode};
use crossbeam::channel::{Receiver, bounded};
use derivative::Derivative;
use derive_setters::Setters;
use std::{sync::Arc, thread, time::Duration};

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct DemoOptions {
    #[derivative(Default(value = "60"))]
    pub fps: u32,

    /// Extra pause between releasing one camera and opening the next.
    #[derivative(Default(value = "Duration::from_millis(100)"))]
    pub settle_delay: Duration,

    /// Events kept for a receiver that falls behind. Newer events are
    /// dropped once it is full.
    #[derivative(Default(value = "256"))]
    pub event_capacity: usize,
}

/// Switches between the static and the live frame source and keeps at most
/// one live session running.
pub struct Demo {
    context: RenderContext,
    backend: Arc<dyn CaptureBackend>,
    static_source: StaticSource,
    target: SharedTarget,
    options: DemoOptions,
    state: StateCell,
    session: Option<LiveSession>,
}

impl Demo {
    pub fn new(
        context: RenderContext,
        backend: Arc<dyn CaptureBackend>,
        static_source: StaticSource,
        target: SharedTarget,
        options: DemoOptions,
    ) -> (Self, Receiver<DemoEvent>) {
        let (tx, rx) = bounded(options.event_capacity.max(1));

        let demo = Self {
            context,
            backend,
            static_source,
            target,
            options,
            state: StateCell::new(tx),
            session: None,
        };

        (demo, rx)
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn backend(&self) -> &dyn CaptureBackend {
        self.backend.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Startup: show the still image, then go live if the context asks for
    /// it.
    pub fn start(&mut self) -> DemoResult<SessionState> {
        self.render_static()?;

        match self.context.mode() {
            SourceMode::Static => Ok(self.state()),
            SourceMode::Live => self.start_live(),
        }
    }

    /// Decode the asset, apply the effect with the current parameters and
    /// present it.
    pub fn render_static(&self) -> DemoResult<()> {
        let mut frame = self.static_source.decode()?;
        let params = self.context.params();
        params.apply(&mut frame)?;
        target::draw(&self.target, &frame)?;

        log::debug!(
            "static frame {}x{} presented, intensity = {}, phase = {}",
            frame.width(),
            frame.height(),
            params.intensity,
            params.phase
        );

        self.state.emit(DemoEvent::FramePresented {
            mode: SourceMode::Static,
            width: frame.width(),
            height: frame.height(),
        });

        Ok(())
    }

    /// The live loop reads the new value on its next tick; in static mode
    /// the image is rendered again right away.
    pub fn set_intensity(&mut self, intensity: i32) -> DemoResult<()> {
        self.context.set_intensity(intensity);
        self.rerender_static()
    }

    pub fn set_phase(&mut self, phase: i32) -> DemoResult<()> {
        self.context.set_phase(phase);
        self.rerender_static()
    }

    fn rerender_static(&self) -> DemoResult<()> {
        match self.context.mode() {
            SourceMode::Static => self.render_static(),
            SourceMode::Live => Ok(()),
        }
    }

    pub fn select_static(&mut self) -> DemoResult<()> {
        self.context.set_mode(SourceMode::Static);
        self.wait_released()?;
        self.render_static()
    }

    /// Switch to the camera. A camera that cannot be opened sends the demo
    /// back to static mode with a notice; the returned state tells which
    /// way it went.
    pub fn select_live(&mut self) -> DemoResult<SessionState> {
        self.context.set_mode(SourceMode::Live);
        self.start_live()
    }

    /// Use another camera. The running session, if any, is fully released
    /// and a static frame is shown before the new camera is opened.
    pub fn switch_device(&mut self, facing: FacingMode) -> DemoResult<SessionState> {
        log::info!("switch camera to {facing} facing mode");

        self.context.set_facing(facing);
        self.select_static()?;

        if !self.options.settle_delay.is_zero() {
            thread::sleep(self.options.settle_delay);
        }

        self.select_live()
    }

    fn start_live(&mut self) -> DemoResult<SessionState> {
        if let Some(session) = &self.session
            && self.state() == SessionState::Streaming
            && !session.is_stopping()
        {
            log::debug!("live session for {} already running", session.facing());
            return Ok(self.state());
        }
        self.wait_released()?;

        let facing = self.context.facing();
        self.state.set(SessionState::Acquiring);

        match self.backend.open(facing) {
            Ok(stream) => {
                self.state.set(SessionState::Streaming);
                self.session = Some(LiveSession::spawn(
                    stream,
                    self.context.clone(),
                    self.target.clone(),
                    self.state.clone(),
                    self.options.fps,
                ));

                Ok(SessionState::Streaming)
            }
            Err(e) => {
                log::warn!("open {facing} camera with {} backend failed: {e}", self.backend.name());

                self.state.set(SessionState::Stopped);
                self.context.set_mode(SourceMode::Static);
                self.state.emit(DemoEvent::Notice(format!(
                    "Something went wrong with obtaining the live video feed. {e}"
                )));

                self.render_static()?;
                Ok(SessionState::Stopped)
            }
        }
    }

    fn wait_released(&mut self) -> DemoResult<()> {
        match self.session.take() {
            Some(session) => session.wait_released(),
            None => Ok(()),
        }
    }
}

impl Drop for Demo {
    fn drop(&mut self) {
        self.context.set_mode(SourceMode::Static);

        if let Err(e) = self.wait_released() {
            log::warn!("release live session failed: {e}");
        }
    }
}
