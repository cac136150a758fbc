use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 错误分类（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Disconnected,
    Unauthorized,
    ConnectionRefused,
    ServiceMissing,
    PathNotFound,
    UnknownArchitecture,
    Unknown,
}

impl ErrorKind {
    /// 设备不可用（断开或未授权）
    pub fn is_unavailable(self) -> bool {
        matches!(self, ErrorKind::Disconnected | ErrorKind::Unauthorized)
    }
}

/// ADB 操作相关的错误类型
#[derive(Debug, Error)]
pub enum ADBError {
    /// 没有设备或设备离线
    #[error("设备已断开连接")]
    Disconnected,

    /// 设备尚未授权 USB 调试
    #[error("设备未授权")]
    Unauthorized,

    /// ADB 守护进程未运行或拒绝连接
    #[error("ADB 守护进程拒绝连接")]
    ConnectionRefused,

    /// 设备上的系统服务不存在
    #[error("设备服务不存在: {0}")]
    ServiceMissing(String),

    /// 设备或主机上的路径不存在
    #[error("{command} 执行失败: {output}")]
    PathNotFound { command: String, output: String },

    /// 无法识别的 CPU ABI
    #[error("未知的 CPU 架构: {0}")]
    UnknownArchitecture(String),

    /// stderr 中出现了未归类的输出
    #[error("ADB 命令 {command} 产生了未预期的错误: {stderr}")]
    Unclassified { command: String, stderr: String },

    /// 提权提示混入了命令输出，守护进程已被终止，需要调用方重新执行
    #[error("ADB 守护进程已重启, 请重新执行: {0}")]
    RetryRequired(String),

    /// ADB 命令执行错误
    #[error("ADB 命令错误: {0}")]
    CommandError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 设备没有返回 IMEI
    #[error("IMEI 未找到")]
    ImeiNotFound,
}

impl ADBError {
    /// 返回错误所属的分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            ADBError::Disconnected => ErrorKind::Disconnected,
            ADBError::Unauthorized => ErrorKind::Unauthorized,
            ADBError::ConnectionRefused => ErrorKind::ConnectionRefused,
            ADBError::ServiceMissing(_) => ErrorKind::ServiceMissing,
            ADBError::PathNotFound { .. } => ErrorKind::PathNotFound,
            ADBError::UnknownArchitecture(_) => ErrorKind::UnknownArchitecture,
            ADBError::Unclassified { .. }
            | ADBError::RetryRequired(_)
            | ADBError::CommandError(_)
            | ADBError::ParseError(_)
            | ADBError::ImeiNotFound => ErrorKind::Unknown,
        }
    }

    /// 设备断开或未授权
    pub fn is_unavailable(&self) -> bool {
        self.kind().is_unavailable()
    }

    /// 调用方是否需要重新执行原命令
    pub fn requires_retry(&self) -> bool {
        matches!(self, ADBError::RetryRequired(_))
    }
}

// 为标准错误类型实现 From trait，简化错误处理
impl From<std::io::Error> for ADBError {
    fn from(error: std::io::Error) -> Self {
        ADBError::CommandError(error.to_string())
    }
}

impl From<std::num::ParseIntError> for ADBError {
    fn from(error: std::num::ParseIntError) -> Self {
        ADBError::ParseError(format!("数字解析错误: {}", error))
    }
}

pub type ADBResult<T> = Result<T, ADBError>;
