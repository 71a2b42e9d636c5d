//! External-renderer collaborators.
//!
//! Geometry enrichment shells out to three tools: a LaTeX compiler
//! (`pdflatex`) for TikZ anchor capture, Graphviz (`dot -Tjson`) for layout
//! extraction, and the Mermaid CLI (`mmdc`) for rendered-SVG geometry. All
//! of them sit behind the [`Renderer`] trait so tests can substitute
//! deterministic doubles, and so renderer absence degrades to a warning
//! instead of a parse failure.
//!
//! Each invocation runs in its own temporary directory and is bounded by a
//! fixed per-tool timeout; a call is attempted at most once per parse.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0} not found")]
    ToolMissing(&'static str),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("{tool} failed: {message}")]
    Failed { tool: &'static str, message: String },

    #[error("{tool} produced unparsable output: {message}")]
    Unparsable { tool: &'static str, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait Renderer: Send + Sync {
    /// Compiles an instrumented LaTeX document and returns the contents of
    /// the side file of `id|anchor|x|y` records it writes.
    fn compile_tex(&self, document: &str) -> RenderResult<String>;

    /// Executes a graph-builder program and returns the DOT source it prints.
    fn run_builder(&self, program: &str) -> RenderResult<String>;

    /// Feeds DOT source to the layout engine and returns its JSON layout.
    fn layout_graph(&self, dot_source: &str) -> RenderResult<serde_json::Value>;

    /// Renders Mermaid-style source to SVG text.
    fn render_svg(&self, code: &str) -> RenderResult<String>;
}

/// Shells out to the real tools on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemRenderer {
    pub tex_timeout: Duration,
    pub builder_timeout: Duration,
    pub layout_timeout: Duration,
    pub svg_timeout: Duration,
}

impl Default for SystemRenderer {
    fn default() -> Self {
        Self {
            tex_timeout: Duration::from_secs(60),
            builder_timeout: Duration::from_secs(10),
            layout_timeout: Duration::from_secs(30),
            svg_timeout: Duration::from_secs(60),
        }
    }
}

struct CommandOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn drain(child: &mut Child) -> (std::thread::JoinHandle<Vec<u8>>, std::thread::JoinHandle<Vec<u8>>) {
    use std::io::Read;

    let mut stdout = child.stdout.take().expect("stdout piped");
    let mut stderr = child.stderr.take().expect("stderr piped");
    let out = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });
    let err = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        buf
    });
    (out, err)
}

/// Runs a command to completion with a hard deadline. On expiry the child is
/// killed and `Timeout` returned; there is no retry.
fn run_command(
    mut command: Command,
    tool: &'static str,
    stdin_data: Option<&[u8]>,
    timeout: Duration,
) -> RenderResult<CommandOutput> {
    command
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RenderError::ToolMissing(tool));
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            // A dead child closes the pipe; that surfaces via exit status.
            let _ = stdin.write_all(data);
        }
    }

    let (out_handle, err_handle) = drain(&mut child);
    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Timeout(tool));
        }
        std::thread::sleep(Duration::from_millis(25));
    };

    let stdout = out_handle.join().unwrap_or_default();
    let stderr = err_handle.join().unwrap_or_default();
    Ok(CommandOutput {
        success: status.success(),
        stdout,
        stderr,
    })
}

fn first_error_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("non-zero exit")
        .to_string()
}

impl Renderer for SystemRenderer {
    fn compile_tex(&self, document: &str) -> RenderResult<String> {
        let dir = TempDir::with_prefix("remora-tex-")?;
        let tex_path = dir.path().join("diagram.tex");
        std::fs::write(&tex_path, document)?;

        tracing::debug!(tool = "pdflatex", "compiling instrumented TikZ document");
        let mut command = Command::new("pdflatex");
        command
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg("diagram.tex")
            .current_dir(dir.path());
        let output = run_command(command, "pdflatex", None, self.tex_timeout)?;
        if !output.success {
            return Err(RenderError::Failed {
                tool: "pdflatex",
                message: first_error_line(&output.stderr),
            });
        }

        let pos_path = dir.path().join("diagram.pos");
        std::fs::read_to_string(&pos_path).map_err(|_| RenderError::Failed {
            tool: "pdflatex",
            message: "missing position side file".to_string(),
        })
    }

    fn run_builder(&self, program: &str) -> RenderResult<String> {
        let dir = TempDir::with_prefix("remora-builder-")?;
        let py_path = dir.path().join("builder.py");
        std::fs::write(&py_path, program)?;

        tracing::debug!(tool = "python3", "executing graph-builder program");
        let mut command = Command::new("python3");
        command.arg(&py_path);
        let output = run_command(command, "python3", None, self.builder_timeout)?;
        if !output.success {
            return Err(RenderError::Failed {
                tool: "python3",
                message: first_error_line(&output.stderr),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn layout_graph(&self, dot_source: &str) -> RenderResult<serde_json::Value> {
        tracing::debug!(tool = "dot", "requesting JSON layout");
        let mut command = Command::new("dot");
        command.arg("-Tjson");
        let output = run_command(
            command,
            "dot",
            Some(dot_source.as_bytes()),
            self.layout_timeout,
        )?;
        if !output.success {
            return Err(RenderError::Failed {
                tool: "dot",
                message: first_error_line(&output.stderr),
            });
        }
        serde_json::from_slice(&output.stdout).map_err(|err| RenderError::Unparsable {
            tool: "dot",
            message: err.to_string(),
        })
    }

    fn render_svg(&self, code: &str) -> RenderResult<String> {
        let dir = TempDir::with_prefix("remora-svg-")?;
        let input_path = dir.path().join("diagram.mmd");
        let output_path = dir.path().join("diagram.svg");
        std::fs::write(&input_path, code)?;
        // Headless Chromium refuses to sandbox inside most containers.
        let puppeteer_config = dir.path().join("puppeteer-config.json");
        std::fs::write(
            &puppeteer_config,
            r#"{"args":["--no-sandbox","--disable-setuid-sandbox"]}"#,
        )?;

        tracing::debug!(tool = "mmdc", "rendering diagram to SVG");
        let mut command = Command::new("mmdc");
        command
            .arg("-i")
            .arg(&input_path)
            .arg("-o")
            .arg(&output_path)
            .arg("--puppeteerConfigFile")
            .arg(&puppeteer_config);
        let output = run_command(command, "mmdc", None, self.svg_timeout)?;
        if !output.success {
            return Err(RenderError::Failed {
                tool: "mmdc",
                message: first_error_line(&output.stderr),
            });
        }
        std::fs::read_to_string(&output_path).map_err(|_| RenderError::Failed {
            tool: "mmdc",
            message: "no SVG output produced".to_string(),
        })
    }
}

/// Test double that behaves like a machine with none of the tools installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

impl Renderer for DisabledRenderer {
    fn compile_tex(&self, _document: &str) -> RenderResult<String> {
        Err(RenderError::ToolMissing("pdflatex"))
    }

    fn run_builder(&self, _program: &str) -> RenderResult<String> {
        Err(RenderError::ToolMissing("python3"))
    }

    fn layout_graph(&self, _dot_source: &str) -> RenderResult<serde_json::Value> {
        Err(RenderError::ToolMissing("dot"))
    }

    fn render_svg(&self, _code: &str) -> RenderResult<String> {
        Err(RenderError::ToolMissing("mmdc"))
    }
}
