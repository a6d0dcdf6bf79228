use super::{CaptureOutcome, ClipboardCapture};
use crate::console::console;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

const WINDOWS_POWERSHELL: &str = r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Helper scripts shipped with the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Linux,
    Mac,
    Windows,
    WindowsBase64,
}

impl Script {
    pub fn file_name(self) -> &'static str {
        match self {
            Script::Linux => "linux.sh",
            Script::Mac => "mac.applescript",
            Script::Windows => "pc.ps1",
            Script::WindowsBase64 => "pc-base64.ps1",
        }
    }

    pub fn contents(self) -> &'static str {
        match self {
            Script::Linux => include_str!("../../res/linux.sh"),
            Script::Mac => include_str!("../../res/mac.applescript"),
            Script::Windows => include_str!("../../res/pc.ps1"),
            Script::WindowsBase64 => include_str!("../../res/pc-base64.ps1"),
        }
    }
}

/// A script ready to run. Embedded scripts live in a temp dir that is removed on drop.
struct MaterializedScript {
    path: PathBuf,
    _dir: Option<TempDir>,
}

/// Captures through the platform's helper script: PowerShell on Windows,
/// AppleScript on macOS, and `xclip` via `sh` elsewhere.
pub struct ScriptCapture {
    platform: Platform,
    script_dir: Option<PathBuf>,
}

impl ScriptCapture {
    pub fn new(script_dir: Option<PathBuf>) -> Self {
        Self::for_platform(Platform::current(), script_dir)
    }

    pub fn for_platform(platform: Platform, script_dir: Option<PathBuf>) -> Self {
        Self {
            platform,
            script_dir,
        }
    }

    fn file_script(&self) -> Script {
        match self.platform {
            Platform::Windows => Script::Windows,
            Platform::MacOs => Script::Mac,
            Platform::Linux => Script::Linux,
        }
    }

    fn materialize(&self, script: Script) -> std::io::Result<MaterializedScript> {
        if let Some(dir) = &self.script_dir {
            let path = dir.join(script.file_name());
            if path.is_file() {
                return Ok(MaterializedScript { path, _dir: None });
            }
            console().verbose(&format!(
                "{} not found, using the built-in script",
                path.display()
            ));
        }

        let dir = tempfile::Builder::new().prefix("paste-image-").tempdir()?;
        let path = dir.path().join(script.file_name());
        std::fs::write(&path, script.contents())?;
        Ok(MaterializedScript {
            path,
            _dir: Some(dir),
        })
    }

    /// Program and arguments that run `script` for `target`.
    pub fn command_line(&self, script: &Path, target: &Path) -> (PathBuf, Vec<OsString>) {
        match self.platform {
            Platform::Windows => {
                let program = if Path::new(WINDOWS_POWERSHELL).exists() {
                    PathBuf::from(WINDOWS_POWERSHELL)
                } else {
                    PathBuf::from("powershell")
                };
                let mut args: Vec<OsString> = [
                    "-noprofile",
                    "-noninteractive",
                    "-nologo",
                    "-sta",
                    "-executionpolicy",
                    "unrestricted",
                    "-windowstyle",
                    "hidden",
                    "-file",
                ]
                .into_iter()
                .map(OsString::from)
                .collect();
                args.push(script.into());
                args.push(target.into());
                (program, args)
            }
            Platform::MacOs => (
                PathBuf::from("osascript"),
                vec![script.into(), target.into()],
            ),
            Platform::Linux => (PathBuf::from("sh"), vec![script.into(), target.into()]),
        }
    }

    /// Run `script` and return its stdout, or the outcome that ended the attempt.
    async fn run(&self, script: Script, target: &Path) -> Result<String, CaptureOutcome> {
        let materialized = self
            .materialize(script)
            .map_err(|e| CaptureOutcome::ToolError(format!("failed to prepare script: {}", e)))?;
        let (program, args) = self.command_line(&materialized.path, target);

        if !program.is_absolute() && which::which(&program).is_err() {
            return Err(CaptureOutcome::ToolMissing(
                program.to_string_lossy().into_owned(),
            ));
        }

        console().debug(&format!("Running {} {:?}", program.display(), args));
        let output = Command::new(&program)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                CaptureOutcome::ToolError(format!("failed to run {}: {}", program.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            console().debug(&format!("capture stderr: {}", stderr.trim()));
        }

        // Scripts exit non-zero after printing a marker, so only fail on silence.
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(CaptureOutcome::ToolError(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

#[async_trait]
impl ClipboardCapture for ScriptCapture {
    async fn save_to_file(&self, target: &Path) -> CaptureOutcome {
        match self.run(self.file_script(), target).await {
            Ok(stdout) => CaptureOutcome::from_file_output(&stdout),
            Err(outcome) => outcome,
        }
    }

    async fn read_png(&self) -> CaptureOutcome {
        let temp = match tempfile::Builder::new().prefix("paste-image-").tempdir() {
            Ok(dir) => dir,
            Err(e) => return CaptureOutcome::ToolError(format!("failed to create temp dir: {}", e)),
        };
        let target = temp.path().join("clipboard.png");

        if self.platform == Platform::Windows {
            return match self.run(Script::WindowsBase64, &target).await {
                Ok(stdout) => CaptureOutcome::from_base64_output(&stdout),
                Err(outcome) => outcome,
            };
        }

        // The other scripts only write files, so read the bytes back.
        match self.save_to_file(&target).await {
            CaptureOutcome::Saved(path) => match tokio::fs::read(&path).await {
                Ok(bytes) if !bytes.is_empty() => CaptureOutcome::Encoded(bytes),
                Ok(_) => CaptureOutcome::NoImage,
                Err(e) => CaptureOutcome::ToolError(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )),
            },
            other => other,
        }
    }
}
