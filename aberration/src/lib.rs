//! Chromatic aberration demo
//!
//! Applies a channel-shift effect to a still image or to a live camera feed
//! and presents every processed frame on a render target.
//!
//! # Architecture
//! - [`Demo`] switches between the static and the live frame source
//! - [`RenderContext`] carries the effect parameters and the mode flag
//! - [`session::LiveSession`] ticks one capture stream on its own thread
//! - [`target::RenderTarget`] is the surface frames are drawn onto

pub mod config;
pub mod context;
pub mod demo;
pub mod error;
pub mod session;
pub mod source;
pub mod target;
pub mod ticker;

pub use context::{EffectParams, RenderContext, SourceMode};
pub use demo::{Demo, DemoOptions};
pub use error::{DemoError, DemoResult};
pub use session::{DemoEvent, SessionState};

/// Initializes the logger.
///
/// Each line carries a local timestamp, the level, the file name and line
/// number of the call site. Defaults to `info`, `RUST_LOG` overrides it.
pub fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
