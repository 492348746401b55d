//! Script execution in a hidden shell
//!
//! A [`ShellRunner`] writes a script to the standard input of a shell process
//! and streams its output, line by line, to the handlers in [`ShellOptions`].
//! Handlers get a [`ProcessControl`] so they can answer prompts, close the
//! input or kill the process while it runs.
//!
//! [`ProcessRunner`] is the real implementation on top of `tokio::process`;
//! [`mock::MockShellRunner`] replays scripted output for tests.

use crate::errors::ShellError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

/// Callback invoked for every line a script writes to one of its streams
pub type LineHandler = Arc<dyn Fn(&str, &ProcessControl) + Send + Sync>;

#[derive(Debug)]
pub(crate) enum ControlMessage {
    Line(String),
    CloseInput,
    Kill,
}

/// Handle for steering a running script from an output handler
#[derive(Clone)]
pub struct ProcessControl {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl fmt::Debug for ProcessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessControl").finish_non_exhaustive()
    }
}

impl ProcessControl {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ControlMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Write a line to the script's standard input.
    pub fn send_line(&self, line: &str) {
        self.send(ControlMessage::Line(line.to_string()));
    }

    /// Close standard input so the shell can finish.
    pub fn close_input(&self) {
        self.send(ControlMessage::CloseInput);
    }

    /// Terminate the process.
    pub fn kill(&self) {
        self.send(ControlMessage::Kill);
    }

    fn send(&self, message: ControlMessage) {
        // The runner stops listening once the process has exited
        if self.tx.send(message).is_err() {
            trace!("Process already finished, control message dropped");
        }
    }
}

/// One script submission
#[derive(Clone, Default)]
pub struct ShellOptions {
    pub script: String,
    pub working_dir: Option<PathBuf>,
    /// Leave standard input open after writing the script
    pub keep_open: bool,
    pub on_output: Option<LineHandler>,
    pub on_error: Option<LineHandler>,
}

impl fmt::Debug for ShellOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellOptions")
            .field("script", &self.script)
            .field("working_dir", &self.working_dir)
            .field("keep_open", &self.keep_open)
            .field("on_output", &self.on_output.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ShellOptions {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Default::default()
        }
    }

    /// Run in `dir`; `None` keeps the current directory.
    pub fn working_dir(mut self, dir: Option<impl Into<PathBuf>>) -> Self {
        self.working_dir = dir.map(Into::into);
        self
    }

    pub fn keep_open(mut self, keep_open: bool) -> Self {
        self.keep_open = keep_open;
        self
    }

    pub fn on_output(mut self, handler: impl Fn(&str, &ProcessControl) + Send + Sync + 'static) -> Self {
        self.on_output = Some(Arc::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl Fn(&str, &ProcessControl) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn on_error_handler(mut self, handler: Option<LineHandler>) -> Self {
        self.on_error = handler;
        self
    }
}

/// How a script finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellExit {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    /// A handler requested termination
    pub killed: bool,
}

impl ShellExit {
    pub fn success(&self) -> bool {
        !self.killed && self.code == Some(0)
    }
}

/// Runs scripts and waits for them to exit
#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, options: ShellOptions) -> Result<ShellExit, ShellError>;
}

/// Shell program used when none is configured.
pub fn default_shell() -> &'static str {
    if cfg!(windows) {
        "powershell.exe"
    } else {
        "pwsh"
    }
}

/// Runs scripts through a real shell process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::for_shell(default_shell())
    }
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Runner for `program`, reading the script from standard input.
    ///
    /// PowerShell hosts get `-NoProfile -NoLogo -Command -`, POSIX shells `-s`.
    pub fn for_shell(program: impl Into<String>) -> Self {
        let program = program.into();
        let stem = std::path::Path::new(&program)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let args: &[&str] = if stem == "pwsh" || stem == "powershell" {
            &["-NoProfile", "-NoLogo", "-Command", "-"]
        } else {
            &["-s"]
        };
        Self::new(program, args.iter().map(|a| a.to_string()).collect())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Terminate the shell and every command it started.
///
/// On Unix the shell leads its own process group, which is signalled as a
/// whole. On Windows `taskkill /T` walks the process tree.
async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match i32::try_from(pid) {
                Ok(pid) => {
                    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                        debug!("Killing process group {} failed: {}", pid, e);
                    }
                }
                Err(_) => debug!("Process id {} out of range", pid),
            }
        }
        #[cfg(windows)]
        {
            let status = Command::new("taskkill")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if let Err(e) = status {
                debug!("taskkill for {} failed: {}", pid, e);
            }
        }
    }
    if let Err(e) = child.start_kill() {
        debug!("Kill request failed: {}", e);
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

async fn pump<R>(
    reader: R,
    handler: Option<LineHandler>,
    control: ProcessControl,
    stream: &'static str,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        trace!(stream, "{}", line);
        if let Some(handler) = &handler {
            handler(line, &control);
        }
    }
}

#[async_trait]
impl ShellRunner for ProcessRunner {
    #[instrument(skip_all, fields(shell = %self.program))]
    async fn run(&self, options: ShellOptions) -> Result<ShellExit, ShellError> {
        debug!("Running script: {}", options.script);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &options.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ShellError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let (control, mut messages) = ProcessControl::channel();
        let stdout_task = child.stdout.take().map(|out| {
            tokio::spawn(pump(out, options.on_output.clone(), control.clone(), "stdout"))
        });
        let stderr_task = child.stderr.take().map(|err| {
            tokio::spawn(pump(err, options.on_error.clone(), control.clone(), "stderr"))
        });
        drop(control);

        let mut stdin = child.stdin.take();
        if let Some(input) = stdin.as_mut() {
            write_line(input, &options.script).await?;
        }
        if !options.keep_open {
            stdin = None;
        }

        let mut killed = false;
        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                Some(message) = messages.recv() => match message {
                    ControlMessage::Line(line) => match stdin.as_mut() {
                        Some(input) => {
                            if let Err(e) = write_line(input, &line).await {
                                warn!("Failed to write to script input: {}", e);
                            }
                        }
                        None => debug!("Input already closed, dropping '{}'", line),
                    },
                    ControlMessage::CloseInput => stdin = None,
                    ControlMessage::Kill => {
                        if !killed {
                            killed = true;
                            kill_tree(&mut child).await;
                        }
                    }
                },
            }
        };
        drop(stdin);

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            if killed {
                // Output after a kill is discarded
                task.abort();
                continue;
            }
            task.await.map_err(std::io::Error::other)??;
        }

        let exit = ShellExit {
            code: status.code(),
            killed,
        };
        debug!("Script finished: {:?}", exit);
        Ok(exit)
    }
}

pub mod mock {
    //! Scripted shell runner for tests
    //!
    //! Responses are matched by substring against the submitted script; the
    //! first match wins and unmatched scripts succeed silently. Output lines
    //! are fed through the handlers, honouring control requests in between.

    use super::*;
    use std::sync::Mutex;

    /// Output and exit code replayed for a matching script
    #[derive(Debug, Clone, Default)]
    pub struct MockResponse {
        pub stdout: Vec<String>,
        pub stderr: Vec<String>,
        pub exit_code: i32,
    }

    impl MockResponse {
        pub fn ok() -> Self {
            Self::default()
        }

        pub fn stdout(mut self, lines: &[&str]) -> Self {
            self.stdout = lines.iter().map(|l| l.to_string()).collect();
            self
        }

        pub fn stderr(mut self, lines: &[&str]) -> Self {
            self.stderr = lines.iter().map(|l| l.to_string()).collect();
            self
        }

        pub fn exit_code(mut self, code: i32) -> Self {
            self.exit_code = code;
            self
        }
    }

    /// Record of a submitted script
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct MockShellCall {
        pub script: String,
        pub working_dir: Option<PathBuf>,
        pub keep_open: bool,
        /// Lines handlers wrote to standard input
        pub input: Vec<String>,
        pub input_closed: bool,
        pub killed: bool,
    }

    #[derive(Debug, Default)]
    pub struct MockShellRunner {
        responses: Mutex<Vec<(String, MockResponse)>>,
        calls: Mutex<Vec<MockShellCall>>,
    }

    impl MockShellRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reply with `response` to scripts containing `pattern`.
        pub fn with_response(self, pattern: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((pattern.to_string(), response));
            self
        }

        pub fn calls(&self) -> Vec<MockShellCall> {
            self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        /// Submitted scripts in order.
        pub fn scripts(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.script).collect()
        }

        fn response_for(&self, script: &str) -> MockResponse {
            self.responses
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .find(|(pattern, _)| script.contains(pattern.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_default()
        }
    }

    fn apply(
        messages: &mut mpsc::UnboundedReceiver<ControlMessage>,
        call: &mut MockShellCall,
    ) {
        while let Ok(message) = messages.try_recv() {
            match message {
                ControlMessage::Line(line) if !call.input_closed => call.input.push(line),
                ControlMessage::Line(_) => {}
                ControlMessage::CloseInput => call.input_closed = true,
                ControlMessage::Kill => call.killed = true,
            }
        }
    }

    #[async_trait]
    impl ShellRunner for MockShellRunner {
        async fn run(&self, options: ShellOptions) -> Result<ShellExit, ShellError> {
            let response = self.response_for(&options.script);
            let mut call = MockShellCall {
                script: options.script.clone(),
                working_dir: options.working_dir.clone(),
                keep_open: options.keep_open,
                input_closed: !options.keep_open,
                ..Default::default()
            };
            let (control, mut messages) = ProcessControl::channel();

            let streams = [
                (&response.stdout, &options.on_output),
                (&response.stderr, &options.on_error),
            ];
            'streams: for (lines, handler) in streams {
                for line in lines {
                    if call.killed {
                        break 'streams;
                    }
                    if let Some(handler) = handler {
                        handler(line, &control);
                    }
                    apply(&mut messages, &mut call);
                }
            }

            let exit = ShellExit {
                code: if call.killed {
                    None
                } else {
                    Some(response.exit_code)
                },
                killed: call.killed,
            };
            self.calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(call);
            Ok(exit)
        }
    }
}
