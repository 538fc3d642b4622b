//! Core library for converting HDR video to SDR with ffmpeg.
//!
//! This crate probes media with ffprobe, builds tone mapping command lines
//! for the CPU and NVENC paths, supervises the conversion process (progress,
//! cancellation and a single CPU retry after GPU failures) and extracts
//! before/after preview frames.
//!
//! Front ends plug in through the traits in [`ui`]: a dispatcher that runs
//! tasks on their UI thread, a view for progress and notices, and the
//! controls to disable while a conversion runs.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sdrify_core::{
//!     ConversionManager, ConversionRequest, CoreConfig, SidecarSpawner, SystemToolRunner,
//!     ToneMapMode, UiHandles,
//! };
//! # use std::sync::Arc;
//! # use sdrify_core::ui::{ConversionView, UiDispatcher, UiTask};
//! # use sdrify_core::Notification;
//! # struct Inline;
//! # impl UiDispatcher for Inline { fn dispatch(&self, task: UiTask) { task() } }
//! # struct View;
//! # impl ConversionView for View {
//! #     fn set_cancel_visible(&self, _: bool) {}
//! #     fn set_progress(&self, _: f64) {}
//! #     fn notify(&self, _: &Notification) {}
//! #     fn open_output(&self, _: &std::path::Path) {}
//! # }
//!
//! let config = CoreConfig::from_env();
//! let ui = UiHandles::new(Arc::new(Inline), Arc::new(View));
//! let mut manager = ConversionManager::new(&config, SystemToolRunner, SidecarSpawner, ui);
//!
//! let request = ConversionRequest::new("movie.mkv", "movie_sdr.mp4", 1.2)
//!     .with_gpu(true)
//!     .with_tone_map(ToneMapMode::Dynamic);
//! manager.start(request).unwrap();
//! manager.wait();
//! ```

pub mod completion;
pub mod config;
pub mod conversion;
pub mod encoding;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod hardware_accel;
pub mod media;
pub mod notifications;
pub mod preview;
pub mod process;
pub mod progress_reporting;
pub mod temp_files;
pub mod ui;
pub mod utils;

// Re-exports for public API
pub use completion::{CompletionHandler, Outcome};
pub use config::{CoreConfig, CoreConfigBuilder, DEFAULT_GAMMA, MAX_GAMMA, MIN_GAMMA};
pub use conversion::{CancelHandle, ConversionManager};
pub use encoding::{BuiltCommand, CommandBuilder, ConversionRequest, ToneMapMode};
pub use error::{CoreError, CoreResult};
pub use external::{
    ProcessExit, SidecarSpawner, SystemToolRunner, ToolOutput, ToolProcess, ToolRunner,
    ToolSpawner, check_dependency,
};
pub use hardware_accel::{HardwareAcceleration, Platform};
pub use media::{ContentLightLevel, MediaProbe, MediaProperties};
pub use notifications::{Notification, NotificationKind};
pub use preview::{FramePreviewExtractor, PreviewFrame, PreviewPair};
pub use process::{ConversionSession, ProcessSupervisor, SessionState};
pub use progress_reporting::ProgressMonitor;
pub use ui::{Control, ConversionView, UiDispatcher, UiHandles};
pub use utils::{default_output_path, format_duration, is_supported_input, parse_ffmpeg_time};
