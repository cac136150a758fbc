use crate::config::{ADBConfig, ElevationMode};
use log::warn;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

const SUDO: &str = "sudo";

/// 调用的执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// 平台不需要提权（Windows、macOS）
    Direct,
    /// sudo 交互式询问密码
    ElevatedPrompt,
    /// 缓存的密码经 stdin 传给 `sudo -S`
    ElevatedPipedCredential,
    /// 平台支持提权，但配置明确关闭了提权
    NoEscalation,
}

/// 单次 ADB 调用，构建后不可变
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    adb_path: PathBuf,
    global_args: Vec<String>,
    args: Vec<String>,
    mode: ExecutionMode,
    stdin: Option<String>,
}

impl Invocation {
    /// 根据配置构建一次调用
    pub fn build<S: AsRef<str>>(config: &ADBConfig, args: &[S]) -> Self {
        let mode = if !config.platform.supports_elevation() {
            ExecutionMode::Direct
        } else {
            match (config.elevation, &config.credential) {
                (ElevationMode::None, _) => ExecutionMode::NoEscalation,
                (ElevationMode::CachedCredential, Some(_)) => ExecutionMode::ElevatedPipedCredential,
                (ElevationMode::CachedCredential, None) => {
                    warn!("未缓存提权密码，改为交互式 sudo");
                    ExecutionMode::ElevatedPrompt
                }
                (ElevationMode::PromptEachTime, _) => ExecutionMode::ElevatedPrompt,
            }
        };

        let stdin = match mode {
            ExecutionMode::ElevatedPipedCredential => {
                config.credential.as_ref().map(|secret| format!("{}\n", secret))
            }
            _ => None,
        };

        Self {
            adb_path: config.path.clone(),
            global_args: config.additional_args.clone().unwrap_or_default(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            mode,
            stdin,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// ADB 子命令参数（不含全局参数和 sudo 包装）
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// 写入子进程 stdin 的内容
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// 实际启动的程序
    pub fn program(&self) -> OsString {
        match self.mode {
            ExecutionMode::ElevatedPrompt | ExecutionMode::ElevatedPipedCredential => SUDO.into(),
            ExecutionMode::Direct | ExecutionMode::NoEscalation => self.adb_path.clone().into_os_string(),
        }
    }

    /// 传给程序的完整参数列表
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = Vec::new();

        match self.mode {
            ExecutionMode::ElevatedPipedCredential => {
                // 空提示符，避免 sudo 的提示混入 stderr
                argv.extend(["-S", "-p", ""].map(OsString::from));
                argv.push(self.adb_path.clone().into_os_string());
            }
            ExecutionMode::ElevatedPrompt => argv.push(self.adb_path.clone().into_os_string()),
            ExecutionMode::Direct | ExecutionMode::NoEscalation => {}
        }

        argv.extend(self.global_args.iter().map(OsString::from));
        argv.extend(self.args.iter().map(OsString::from));
        argv
    }

    /// 空格连接的子命令，用于日志和错误信息
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("adb_path", &self.adb_path)
            .field("global_args", &self.global_args)
            .field("args", &self.args)
            .field("mode", &self.mode)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
