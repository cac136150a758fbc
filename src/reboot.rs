use crate::device::ADB;
use crate::error::ADBResult;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 逻辑重启目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RebootTarget {
    /// fastboot 协议的 bootloader
    Fastboot,
    /// 三星的 download 模式（Heimdall/Odin）
    Heimdall,
    /// 按品牌选择 Fastboot 或 Heimdall
    Bootloader,
    Recovery,
    Sideload,
    SideloadAutoReboot,
    Download,
    /// 普通重启
    System,
}

/// 解析后的重启命令，不再依赖品牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RebootCommand {
    Fastboot,
    Heimdall,
    Recovery,
    Sideload,
    SideloadAutoReboot,
    Download,
    System,
}

impl RebootCommand {
    /// 对应的 `adb` 参数
    pub fn args(self) -> &'static [&'static str] {
        match self {
            RebootCommand::Fastboot => &["reboot", "bootloader"],
            RebootCommand::Heimdall => &["reboot", "download"],
            RebootCommand::Recovery => &["reboot", "recovery"],
            RebootCommand::Sideload => &["reboot", "sideload"],
            RebootCommand::SideloadAutoReboot => &["reboot", "sideload-auto-reboot"],
            RebootCommand::Download => &["reboot", "download"],
            RebootCommand::System => &["reboot"],
        }
    }
}

impl RebootTarget {
    /// 解析为具体命令；只有 Bootloader 会调用 `brand` 查询品牌
    pub fn resolve<F>(self, brand: F) -> ADBResult<RebootCommand>
    where
        F: FnOnce() -> ADBResult<String>,
    {
        let command = match self {
            RebootTarget::Fastboot => RebootCommand::Fastboot,
            RebootTarget::Heimdall => RebootCommand::Heimdall,
            RebootTarget::Bootloader => {
                if brand()?.eq_ignore_ascii_case("samsung") {
                    RebootCommand::Heimdall
                } else {
                    RebootCommand::Fastboot
                }
            }
            RebootTarget::Recovery => RebootCommand::Recovery,
            RebootTarget::Sideload => RebootCommand::Sideload,
            RebootTarget::SideloadAutoReboot => RebootCommand::SideloadAutoReboot,
            RebootTarget::Download => RebootCommand::Download,
            RebootTarget::System => RebootCommand::System,
        };
        Ok(command)
    }
}

impl From<&str> for RebootTarget {
    /// 不区分大小写，无法识别的目标视为普通重启
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fastboot" => RebootTarget::Fastboot,
            "heimdall" => RebootTarget::Heimdall,
            "bootloader" => RebootTarget::Bootloader,
            "recovery" => RebootTarget::Recovery,
            "sideload" => RebootTarget::Sideload,
            "sideload-auto-reboot" => RebootTarget::SideloadAutoReboot,
            "download" => RebootTarget::Download,
            _ => RebootTarget::System,
        }
    }
}

impl fmt::Display for RebootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebootTarget::Fastboot => "fastboot",
            RebootTarget::Heimdall => "heimdall",
            RebootTarget::Bootloader => "bootloader",
            RebootTarget::Recovery => "recovery",
            RebootTarget::Sideload => "sideload",
            RebootTarget::SideloadAutoReboot => "sideload-auto-reboot",
            RebootTarget::Download => "download",
            RebootTarget::System => "system",
        };
        write!(f, "{}", name)
    }
}

impl ADB {
    /// 重启设备到指定目标
    pub fn reboot(&self, target: impl Into<RebootTarget>) -> ADBResult<()> {
        let target = target.into();
        info!("正在重启设备到 {}...", target);

        let command = target.resolve(|| {
            self.brand().map_err(|e| {
                error!("无法重启到 bootloader, 品牌未知: {}", e);
                e
            })
        })?;

        self.execute(command.args()).into_lenient_result()?;
        Ok(())
    }
}
