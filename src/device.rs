use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::{ADBConfig, ElevationMode};
use crate::runner::{CommandRunner, SystemRunner};

/// 设备状态，每次查询都重新推导，从不缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceState {
    Simulation,
    Disconnected,
    Unauthorized,
    Booting,
    Android,
    Sideload,
    Recovery,
    Unknown,
}

impl DeviceState {
    /// 设备是否通过 ADB 可见
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            DeviceState::Android
                | DeviceState::Recovery
                | DeviceState::Unauthorized
                | DeviceState::Sideload
                | DeviceState::Booting
        )
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::Simulation => "simulation",
            DeviceState::Disconnected => "disconnected",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Booting => "booting",
            DeviceState::Android => "android",
            DeviceState::Sideload => "sideload",
            DeviceState::Recovery => "recovery",
            DeviceState::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// ADB 主结构体
#[derive(Clone)]
pub struct ADB {
    pub(crate) config: ADBConfig,
    pub(crate) runner: Arc<dyn CommandRunner>,
}

impl ADB {
    /// 创建新的 ADB 实例
    pub fn new(config: Option<ADBConfig>) -> Self {
        Self::with_runner(config.unwrap_or_default(), Arc::new(SystemRunner))
    }

    /// 使用自定义的进程启动器
    pub fn with_runner(config: ADBConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ADBConfig {
        &self.config
    }

    /// 获取 ADB 路径
    pub fn adb_path(&self) -> &std::path::PathBuf {
        &self.config.path
    }

    /// 修改提权模式
    pub fn set_elevation(&mut self, mode: ElevationMode) {
        self.config.elevation = mode;
    }

    /// 设置或清除缓存的提权密码
    pub fn set_credential(&mut self, secret: Option<String>) {
        self.config.credential = secret;
    }

    /// 启用或关闭模拟模式
    pub fn set_simulation(&mut self, enabled: bool) {
        self.config.simulation = enabled;
    }
}

impl fmt::Debug for ADB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ADB")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_states() {
        let connected = [
            DeviceState::Android,
            DeviceState::Recovery,
            DeviceState::Unauthorized,
            DeviceState::Sideload,
            DeviceState::Booting,
        ];
        for state in connected {
            assert!(state.is_connected(), "{} should be connected", state);
        }
        for state in [DeviceState::Simulation, DeviceState::Disconnected, DeviceState::Unknown] {
            assert!(!state.is_connected(), "{} should not be connected", state);
        }
    }

    #[test]
    fn setters_update_config() {
        let mut adb = ADB::new(None);
        adb.set_elevation(ElevationMode::None);
        adb.set_credential(Some("pw".to_string()));
        adb.set_simulation(true);
        assert_eq!(adb.config().elevation, ElevationMode::None);
        assert_eq!(adb.config().credential.as_deref(), Some("pw"));
        assert!(adb.config().simulation);
        assert!(!format!("{:?}", adb).contains("pw\""));
    }
}
