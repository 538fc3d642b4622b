// sdrify-core/tests/common/mod.rs

// --- Shared mocks for integration tests ---

#![allow(dead_code)]

use sdrify_core::error::{CoreError, CoreResult};
use sdrify_core::external::{DiagnosticStream, ProcessExit, ToolOutput, ToolProcess, ToolRunner, ToolSpawner};
use sdrify_core::notifications::Notification;
use sdrify_core::ui::{Control, ConversionView, UiDispatcher, UiHandles, UiTask};
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};

// --- Fixtures ---

/// ffprobe `-show_streams -show_format` output for a 4K HDR10 file.
pub fn hdr_probe_json(duration_secs: f64) -> String {
    probe_json(duration_secs, true)
}

/// Same file, optionally without stream-level light level metadata.
pub fn probe_json(duration_secs: f64, with_light_level: bool) -> String {
    let side_data = if with_light_level {
        r#"[{ "side_data_type": "Content light level metadata", "max_content": 1200, "max_average": 350 }]"#
    } else {
        "[]"
    };
    format!(
        r#"{{
  "streams": [
    {{
      "index": 0,
      "codec_name": "hevc",
      "codec_type": "video",
      "width": 3840,
      "height": 2160,
      "avg_frame_rate": "24000/1001",
      "r_frame_rate": "24000/1001",
      "bit_rate": "20000000",
      "side_data_list": {side_data}
    }},
    {{ "index": 1, "codec_name": "eac3", "codec_type": "audio", "bit_rate": "640000" }},
    {{ "index": 2, "codec_name": "hdmv_pgs_subtitle", "codec_type": "subtitle" }}
  ],
  "format": {{ "duration": "{duration_secs}" }}
}}"#
    )
}

/// A small JPEG as ffmpeg would pipe it for a preview.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::new_rgb8(width, height);
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .expect("encode test jpeg");
    bytes
}

pub fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

// --- MockToolRunner ---

struct RunnerExpectation {
    /// Argument that must be present for this expectation to apply.
    arg: String,
    output: ToolOutput,
}

/// ToolRunner answering with scripted outputs, matched by a marker argument.
#[derive(Clone, Default)]
pub struct MockToolRunner {
    expectations: Arc<Mutex<Vec<RunnerExpectation>>>,
    calls: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&self, arg: &str, exit_code: i32, stdout: Vec<u8>, stderr: &str) {
        self.expectations.lock().unwrap().push(RunnerExpectation {
            arg: arg.to_string(),
            output: ToolOutput {
                exit: ProcessExit::from_code(exit_code),
                stdout,
                stderr: stderr.to_string(),
            },
        });
    }

    /// Answers `-show_streams` probes with `json`.
    pub fn expect_probe(&self, json: &str) {
        self.expect("-show_streams", 0, json.as_bytes().to_vec(), "");
    }

    /// Answers frame extractions with `bytes`.
    pub fn expect_frame(&self, bytes: Vec<u8>) {
        self.expect("image2pipe", 0, bytes, "");
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, arg: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .map(|(_, args)| args)
            .filter(|args| args.iter().any(|a| a == arg))
            .collect()
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, program: &Path, args: &[String]) -> CoreResult<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));

        let expectations = self.expectations.lock().unwrap();
        expectations
            .iter()
            .find(|e| args.iter().any(|a| *a == e.arg))
            .map(|e| e.output.clone())
            .ok_or_else(|| CoreError::DependencyNotFound(program.display().to_string()))
    }
}

// --- ScriptedProcess ---

/// Process that prints fixed stderr and exits with a fixed code.
pub struct ScriptedProcess {
    stderr: Option<Vec<u8>>,
    exit: ProcessExit,
    killed: bool,
}

impl ScriptedProcess {
    /// `lines` are written as ffmpeg would: status lines ending in `\r`.
    pub fn new(lines: &[&str], exit_code: i32) -> Self {
        let mut stderr = Vec::new();
        for line in lines {
            stderr.extend_from_slice(line.as_bytes());
            stderr.push(if line.contains("time=") { b'\r' } else { b'\n' });
        }
        Self {
            stderr: Some(stderr),
            exit: ProcessExit::from_code(exit_code),
            killed: false,
        }
    }
}

impl ToolProcess for ScriptedProcess {
    fn take_stderr(&mut self) -> Option<DiagnosticStream> {
        self.stderr
            .take()
            .map(|bytes| Box::new(Cursor::new(bytes)) as DiagnosticStream)
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.killed = true;
        Ok(())
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        self.wait().map(Some)
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        Ok(if self.killed {
            ProcessExit::terminated()
        } else {
            self.exit
        })
    }
}

// --- GatedProcess ---

struct GateState {
    sender: Option<Sender<Vec<u8>>>,
    exit: Option<ProcessExit>,
}

/// Test-side control of a [`GatedProcess`].
#[derive(Clone)]
pub struct Gate {
    state: Arc<(Mutex<GateState>, Condvar)>,
}

impl Gate {
    /// Writes one diagnostic line. Ignored once the process ended.
    pub fn emit(&self, line: &str) {
        let (lock, _) = &*self.state;
        if let Some(sender) = lock.lock().unwrap().sender.as_ref() {
            let _ = sender.send(format!("{line}\r").into_bytes());
        }
    }

    /// Ends the process naturally.
    pub fn exit(&self, code: i32) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();
        state.sender = None;
        state.exit.get_or_insert(ProcessExit::from_code(code));
        cvar.notify_all();
    }

    pub fn was_killed(&self) -> bool {
        let (lock, _) = &*self.state;
        lock.lock().unwrap().exit == Some(ProcessExit::terminated())
    }
}

/// Process whose stderr stays open until the test ends it or it is killed.
pub struct GatedProcess {
    state: Arc<(Mutex<GateState>, Condvar)>,
    stderr: Option<Receiver<Vec<u8>>>,
}

impl GatedProcess {
    pub fn new() -> (Self, Gate) {
        let (sender, receiver) = mpsc::channel();
        let state = Arc::new((
            Mutex::new(GateState {
                sender: Some(sender),
                exit: None,
            }),
            Condvar::new(),
        ));
        (
            Self {
                state: Arc::clone(&state),
                stderr: Some(receiver),
            },
            Gate { state },
        )
    }
}

struct ChannelReader {
    receiver: Receiver<Vec<u8>>,
    pending: Cursor<Vec<u8>>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            let n = self.pending.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            match self.receiver.recv() {
                Ok(chunk) => self.pending = Cursor::new(chunk),
                Err(_) => return Ok(0),
            }
        }
    }
}

impl ToolProcess for GatedProcess {
    fn take_stderr(&mut self) -> Option<DiagnosticStream> {
        self.stderr.take().map(|receiver| {
            Box::new(ChannelReader {
                receiver,
                pending: Cursor::new(Vec::new()),
            }) as DiagnosticStream
        })
    }

    fn kill(&mut self) -> CoreResult<()> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();
        state.sender = None;
        state.exit.get_or_insert(ProcessExit::terminated());
        cvar.notify_all();
        Ok(())
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        let (lock, _) = &*self.state;
        Ok(lock.lock().unwrap().exit)
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();
        loop {
            if let Some(exit) = state.exit {
                return Ok(exit);
            }
            state = cvar.wait(state).unwrap();
        }
    }
}

// --- MockSpawner ---

pub enum MockProcess {
    Scripted(ScriptedProcess),
    Gated(GatedProcess),
}

impl ToolProcess for MockProcess {
    fn take_stderr(&mut self) -> Option<DiagnosticStream> {
        match self {
            Self::Scripted(p) => p.take_stderr(),
            Self::Gated(p) => p.take_stderr(),
        }
    }

    fn kill(&mut self) -> CoreResult<()> {
        match self {
            Self::Scripted(p) => p.kill(),
            Self::Gated(p) => p.kill(),
        }
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        match self {
            Self::Scripted(p) => p.try_wait(),
            Self::Gated(p) => p.try_wait(),
        }
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        match self {
            Self::Scripted(p) => p.wait(),
            Self::Gated(p) => p.wait(),
        }
    }
}

/// ToolSpawner handing out queued processes in order. Spawning with an
/// empty queue fails as if ffmpeg were missing.
#[derive(Clone, Default)]
pub struct MockSpawner {
    queue: Arc<Mutex<VecDeque<MockProcess>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scripted(&self, lines: &[&str], exit_code: i32) {
        self.queue
            .lock()
            .unwrap()
            .push_back(MockProcess::Scripted(ScriptedProcess::new(lines, exit_code)));
    }

    pub fn push_gated(&self) -> Gate {
        let (process, gate) = GatedProcess::new();
        self.queue
            .lock()
            .unwrap()
            .push_back(MockProcess::Gated(process));
        gate
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolSpawner for MockSpawner {
    type Process = MockProcess;

    fn spawn(&self, program: &Path, args: &[String]) -> CoreResult<Self::Process> {
        self.calls.lock().unwrap().push(args.to_vec());
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoreError::DependencyNotFound(program.display().to_string()))
    }
}

// --- UI doubles ---

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    CancelVisible(bool),
    Progress(f64),
    Notified(Notification),
    Opened(PathBuf),
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Notified(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_notifications(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_terminal)
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Opened(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_visible(&self) -> Option<bool> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::CancelVisible(v) => Some(v),
            _ => None,
        })
    }
}

impl ConversionView for RecordingView {
    fn set_cancel_visible(&self, visible: bool) {
        self.events.lock().unwrap().push(ViewEvent::CancelVisible(visible));
    }

    fn set_progress(&self, percent: f64) {
        self.events.lock().unwrap().push(ViewEvent::Progress(percent));
    }

    fn notify(&self, notification: &Notification) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Notified(notification.clone()));
    }

    fn open_output(&self, path: &Path) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Opened(path.to_path_buf()));
    }
}

#[derive(Default)]
pub struct RecordingControl {
    history: Mutex<Vec<bool>>,
}

impl RecordingControl {
    pub fn history(&self) -> Vec<bool> {
        self.history.lock().unwrap().clone()
    }

    /// Enabled unless the last change disabled it.
    pub fn is_enabled(&self) -> bool {
        self.history().last().copied().unwrap_or(true)
    }
}

impl Control for RecordingControl {
    fn set_enabled(&self, enabled: bool) {
        self.history.lock().unwrap().push(enabled);
    }
}

/// Runs tasks immediately on the calling thread.
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, task: UiTask) {
        task();
    }
}

/// Holds tasks until the test drains them, standing in for a UI event loop.
#[derive(Default)]
pub struct QueueDispatcher {
    tasks: Mutex<VecDeque<UiTask>>,
}

impl QueueDispatcher {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Runs queued tasks in order; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.lock().unwrap().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl UiDispatcher for QueueDispatcher {
    fn dispatch(&self, task: UiTask) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

/// View, control and handles wired together.
pub struct TestUi {
    pub view: Arc<RecordingView>,
    pub control: Arc<RecordingControl>,
    pub handles: UiHandles,
}

pub fn inline_ui() -> TestUi {
    build_ui(Arc::new(InlineDispatcher))
}

pub fn build_ui(dispatcher: Arc<dyn UiDispatcher>) -> TestUi {
    let view = Arc::new(RecordingView::default());
    let control = Arc::new(RecordingControl::default());
    let handles = UiHandles::new(dispatcher, view.clone()).with_control(control.clone());
    TestUi {
        view,
        control,
        handles,
    }
}
