use crate::device::ADB;
use crate::error::{ADBError, ADBResult};
use crate::invocation::Invocation;
use crate::runner::RawOutput;
use crate::utils::{contains_any, trim_output};
use log::{debug, error, info, warn};

pub(crate) const NO_DEVICES: &str = "no devices/emulators found";
pub(crate) const DEVICE_OFFLINE: &str = "device offline";
pub(crate) const DEVICE_UNAUTHORIZED: &str = "device unauthorized";
pub(crate) const STILL_AUTHORIZING: &str = "device still authorizing";
pub(crate) const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";
pub(crate) const DAEMON_STARTING: &str = "daemon not running; starting now";

const KILL_SERVER: &str = "kill-server";
const CONNECTION_REFUSED: &[&str] = &["Connection refused", "cannot connect to daemon"];
const SUDO_PROMPT: &str = "[sudo]";
const BENIGN_READ_FAILURES: &[&str] = &[
    "failed to read command: Success",
    "failed to read command: No error",
];
const NO_SUCH_FILE: &str = "No such file or directory";

/// 命令执行的结局
#[derive(Debug)]
pub enum Outcome {
    Success,
    Failed(ADBError),
    /// 提权提示混入了输出，守护进程已被终止；原命令未重发
    RecoveredRequiresRetry,
}

/// 一次 ADB 调用的归类结果
#[derive(Debug)]
pub struct ExecutionResult {
    /// 空格连接的子命令
    pub command: String,
    /// 去掉首尾空白的 stdout
    pub stdout: String,
    pub outcome: Outcome,
}

impl ExecutionResult {
    pub fn error(&self) -> Option<&ADBError> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// 设备断开或未授权
    pub fn is_unavailable(&self) -> bool {
        self.error().is_some_and(ADBError::is_unavailable)
    }

    /// 任何失败都转为 `Err`
    pub fn into_result(self) -> ADBResult<String> {
        match self.outcome {
            Outcome::Success => Ok(self.stdout),
            Outcome::Failed(e) => Err(e),
            Outcome::RecoveredRequiresRetry => Err(ADBError::RetryRequired(self.command)),
        }
    }

    /// 只有设备不可用或需要重试时才返回 `Err`，其他错误记录后保留 stdout
    pub fn into_lenient_result(self) -> ADBResult<String> {
        match self.outcome {
            Outcome::Success => Ok(self.stdout),
            Outcome::Failed(e) if e.is_unavailable() => Err(e),
            Outcome::Failed(e) => {
                warn!("ADB 命令 {} 返回错误, 继续使用输出: {}", self.command, e);
                Ok(self.stdout)
            }
            Outcome::RecoveredRequiresRetry => Err(ADBError::RetryRequired(self.command)),
        }
    }
}

/// stderr 归类的中间结果
#[derive(Debug)]
enum Verdict {
    Success(String),
    Failure(String, ADBError),
    PromptLeak,
}

/// 按优先级归类原始输出，第一个匹配的规则生效
fn classify(args: &[String], raw: &RawOutput) -> Verdict {
    let stdout = &raw.stdout;
    let stderr = &raw.stderr;
    let command = args.join(" ");
    let is_kill_server = args.first().is_some_and(|a| a == KILL_SERVER);

    if stderr.trim().is_empty() {
        return Verdict::Success(trim_output(stdout));
    }

    if contains_any(stderr, &[NO_DEVICES, DEVICE_OFFLINE]) {
        return Verdict::Failure(String::new(), ADBError::Disconnected);
    }
    if contains_any(stderr, &[DEVICE_UNAUTHORIZED, STILL_AUTHORIZING]) {
        return Verdict::Failure(String::new(), ADBError::Unauthorized);
    }
    if is_kill_server && contains_any(stderr, CONNECTION_REFUSED) {
        return Verdict::Failure(String::new(), ADBError::ConnectionRefused);
    }
    if stderr.contains(DAEMON_STARTING) {
        return Verdict::Success(trim_output(stdout));
    }
    if stderr.contains(SUDO_PROMPT) {
        debug!("stderr 中包含 {}", SUDO_PROMPT);
        if is_kill_server {
            if contains_any(stderr, CONNECTION_REFUSED) {
                return Verdict::Failure(String::new(), ADBError::ConnectionRefused);
            }
            // 终止守护进程本身出现提示时不能再递归终止
            return Verdict::Failure(
                trim_output(stdout),
                ADBError::Unclassified { command, stderr: stderr.clone() },
            );
        }
        return Verdict::PromptLeak;
    }
    if contains_any(stderr, BENIGN_READ_FAILURES) {
        return Verdict::Success(trim_output(stdout));
    }
    if stderr.contains("Service") && stderr.contains("does not exist") {
        return Verdict::Failure(
            trim_output(stdout),
            ADBError::ServiceMissing(trim_output(stderr)),
        );
    }

    let combined = format!("{} {}", stdout, stderr);
    if combined.contains(NO_SUCH_FILE) {
        let output = trim_output(&combined);
        return Verdict::Failure(
            output.clone(),
            ADBError::PathNotFound { command, output },
        );
    }

    error!(
        "ADB 命令 {} 产生了未预期的错误:\nstderr: {}\nstdout: {}",
        command, stderr, stdout
    );
    Verdict::Failure(
        trim_output(stdout),
        ADBError::Unclassified { command, stderr: stderr.clone() },
    )
}

impl ADB {
    /// 运行命令并返回未经归类的 stdout/stderr
    pub(crate) fn run_raw<S: AsRef<str>>(&self, args: &[S]) -> ADBResult<RawOutput> {
        let invocation = Invocation::build(&self.config, args);
        self.runner.run(&invocation).map_err(|e| {
            ADBError::CommandError(format!(
                "无法执行 ADB 命令 {}: {}",
                invocation.command_line(),
                e
            ))
        })
    }

    /// 执行一次 ADB 命令并归类其输出
    pub fn execute<S: AsRef<str>>(&self, args: &[S]) -> ExecutionResult {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let command = args.join(" ");

        let raw = match self.run_raw(&args) {
            Ok(raw) => raw,
            Err(e) => {
                error!("{}", e);
                return ExecutionResult {
                    command,
                    stdout: String::new(),
                    outcome: Outcome::Failed(e),
                };
            }
        };

        let (stdout, outcome) = match classify(&args, &raw) {
            Verdict::Success(stdout) => (stdout, Outcome::Success),
            Verdict::Failure(stdout, e) => (stdout, Outcome::Failed(e)),
            Verdict::PromptLeak => {
                warn!(
                    "sudo 密码提示混入了命令输出, 终止 ADB 服务器, 需要重新执行: {}",
                    command
                );
                let outcome = match self.kill_server() {
                    Ok(()) | Err(ADBError::ConnectionRefused) => Outcome::RecoveredRequiresRetry,
                    Err(e) => Outcome::Failed(e),
                };
                (String::new(), outcome)
            }
        };

        ExecutionResult { command, stdout, outcome }
    }

    /// 执行命令，任何失败都作为错误返回
    pub fn cmd<S: AsRef<str>>(&self, args: &[S]) -> ADBResult<String> {
        self.execute(args).into_result()
    }

    /// 启动 ADB 服务器
    pub fn start_server(&self) -> ADBResult<()> {
        self.cmd(&["start-server"])?;
        info!("ADB 服务器已启动");
        Ok(())
    }

    /// 终止 ADB 服务器
    pub fn kill_server(&self) -> ADBResult<()> {
        self.cmd(&[KILL_SERVER])?;
        debug!("ADB 服务器已终止");
        Ok(())
    }

    /// 推送文件到设备
    pub fn push(&self, local: &str, remote: &str) -> ADBResult<()> {
        self.cmd(&["push", local, remote])?;
        Ok(())
    }

    /// 从设备拉取文件
    pub fn pull(&self, remote: &str, local: &str) -> ADBResult<()> {
        self.cmd(&["pull", remote, local])?;
        Ok(())
    }

    pub fn remount(&self) -> ADBResult<()> {
        self.cmd(&["remount"])?;
        Ok(())
    }

    /// 以 root 权限重启 adbd
    pub fn root(&self) -> ADBResult<()> {
        self.cmd(&["root"])?;
        Ok(())
    }

    pub fn unroot(&self) -> ADBResult<()> {
        self.cmd(&["unroot"])?;
        Ok(())
    }

    /// 设备 shell 的当前用户
    pub fn whoami(&self) -> ADBResult<String> {
        self.execute(&["shell", "whoami"]).into_lenient_result()
    }
}
