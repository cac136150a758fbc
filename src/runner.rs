use crate::invocation::{ExecutionMode, Invocation};
use log::{debug, trace};
use std::io::{self, Write};
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// 子进程的原始输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    pub fn new(stdout: &str, stderr: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

/// 启动外部进程的抽象，便于替换为脚本化实现
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> io::Result<RawOutput>;
}

/// 基于 `std::process::Command` 的默认实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RawOutput> {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.argv())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "windows")]
        cmd.creation_flags(CREATE_NO_WINDOW);

        match (invocation.stdin(), invocation.mode()) {
            (Some(_), _) => cmd.stdin(Stdio::piped()),
            // sudo 需要从终端读取密码
            (None, ExecutionMode::ElevatedPrompt) => cmd.stdin(Stdio::inherit()),
            (None, _) => cmd.stdin(Stdio::null()),
        };

        let mut child = cmd.spawn()?;

        if let Some(input) = invocation.stdin() {
            if let Some(mut pipe) = child.stdin.take() {
                // 子进程可能不读 stdin 就退出（例如 sudo 仍在免密期内）
                match pipe.write_all(input.as_bytes()) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("子进程已关闭 stdin: {}", invocation.command_line());
                    }
                    Err(e) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(e);
                    }
                }
            }
        }

        let output = child.wait_with_output()?;
        let raw = RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        trace!(
            "ADB 命令 '{}' 输出: stdout={:?} stderr={:?}",
            invocation.command_line(),
            raw.stdout,
            raw.stderr
        );
        Ok(raw)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{ADBConfigBuilder, ElevationMode, HostPlatform};

    fn shell_invocation(script: &str) -> Invocation {
        let config = ADBConfigBuilder::default()
            .platform(HostPlatform::Linux)
            .elevation(ElevationMode::None)
            .path("sh")
            .add_arg("-c")
            .add_arg(script)
            .build();
        Invocation::build(&config, &["get-state"])
    }

    #[test]
    fn captures_both_streams() {
        let invocation = shell_invocation("echo out; echo err >&2");
        assert_eq!(invocation.mode(), ExecutionMode::NoEscalation);

        let raw = SystemRunner.run(&invocation).unwrap();
        assert_eq!(raw.stdout, "out\n");
        assert_eq!(raw.stderr, "err\n");
    }

    #[test]
    fn stdin_reaches_child() {
        let invocation = shell_invocation("cat; echo err >&2").with_stdin("secret\n");

        let raw = SystemRunner.run(&invocation).unwrap();
        assert_eq!(raw.stdout, "secret\n");
        assert_eq!(raw.stderr, "err\n");
    }

    #[test]
    fn stdin_is_closed_without_input() {
        let raw = SystemRunner.run(&shell_invocation("cat")).unwrap();
        assert_eq!(raw.stdout, "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let raw = SystemRunner.run(&shell_invocation("printf 'a\\377b'")).unwrap();
        assert_eq!(raw.stdout, "a\u{FFFD}b");
    }

    #[test]
    fn child_exiting_before_reading_stdin() {
        let input = "x".repeat(1 << 20);
        let invocation = shell_invocation("exit 0").with_stdin(&input);

        let raw = SystemRunner.run(&invocation).unwrap();
        assert_eq!(raw, RawOutput::default());
    }

    #[test]
    fn missing_program_is_an_error() {
        let config = ADBConfigBuilder::default()
            .platform(HostPlatform::Linux)
            .elevation(ElevationMode::None)
            .path("/nonexistent/adb")
            .build();
        let invocation = Invocation::build(&config, &["devices"]);
        assert!(SystemRunner.run(&invocation).is_err());
    }
}
