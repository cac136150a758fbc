use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 主机平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
}

impl HostPlatform {
    /// 当前编译目标所在的平台
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Linux
        }
    }

    /// 平台对应的 ADB 默认路径
    pub fn default_adb_path(self) -> PathBuf {
        match self {
            HostPlatform::Windows => PathBuf::from("bin\\platform-tools\\adb.exe"),
            HostPlatform::MacOs | HostPlatform::Linux => PathBuf::from("bin/platform-tools/adb"),
        }
    }

    /// 该平台是否需要提权才能访问 USB 设备
    pub fn supports_elevation(self) -> bool {
        self == HostPlatform::Linux
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        HostPlatform::current()
    }
}

/// 提权模式，仅在 Linux 上生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElevationMode {
    /// 不提权（例如已配置 udev 规则）
    None,
    /// 每次由 sudo 交互式询问密码
    #[default]
    PromptEachTime,
    /// 通过 stdin 把缓存的密码传给 sudo
    CachedCredential,
}

/// ADB 配置结构体
#[derive(Clone, Deserialize, Serialize)]
pub struct ADBConfig {
    /// ADB 可执行文件路径
    pub path: PathBuf,
    /// 主机平台
    pub platform: HostPlatform,
    /// 提权模式
    pub elevation: ElevationMode,
    /// 缓存的提权密码，永不序列化
    #[serde(skip)]
    pub credential: Option<String>,
    /// 模拟模式，状态查询恒为 Simulation
    pub simulation: bool,
    /// 额外的命令行参数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_args: Option<Vec<String>>,
}

impl Default for ADBConfig {
    fn default() -> Self {
        let platform = HostPlatform::current();
        ADBConfig {
            path: platform.default_adb_path(),
            platform,
            elevation: ElevationMode::default(),
            credential: None,
            simulation: false,
            additional_args: None,
        }
    }
}

impl fmt::Debug for ADBConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ADBConfig")
            .field("path", &self.path)
            .field("platform", &self.platform)
            .field("elevation", &self.elevation)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("simulation", &self.simulation)
            .field("additional_args", &self.additional_args)
            .finish()
    }
}

/// ADB 配置构建器
#[derive(Default)]
pub struct ADBConfigBuilder {
    path: Option<PathBuf>,
    platform: Option<HostPlatform>,
    elevation: Option<ElevationMode>,
    credential: Option<String>,
    simulation: bool,
    additional_args: Option<Vec<String>>,
}

impl ADBConfigBuilder {
    /// 设置 ADB 可执行文件路径
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 覆盖主机平台
    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// 设置提权模式
    pub fn elevation(mut self, mode: ElevationMode) -> Self {
        self.elevation = Some(mode);
        self
    }

    /// 缓存提权密码，同时切换到 CachedCredential 模式
    pub fn credential(mut self, secret: &str) -> Self {
        self.credential = Some(secret.to_string());
        self.elevation = Some(ElevationMode::CachedCredential);
        self
    }

    /// 启用或关闭模拟模式
    pub fn simulation(mut self, enabled: bool) -> Self {
        self.simulation = enabled;
        self
    }

    /// 添加额外命令行参数
    pub fn add_arg(mut self, arg: &str) -> Self {
        self.additional_args
            .get_or_insert_with(Vec::new)
            .push(arg.to_string());
        self
    }

    /// 构建 ADB 配置
    pub fn build(self) -> ADBConfig {
        let platform = self.platform.unwrap_or_default();

        ADBConfig {
            path: self.path.unwrap_or_else(|| platform.default_adb_path()),
            platform,
            elevation: self.elevation.unwrap_or_default(),
            credential: self.credential,
            simulation: self.simulation,
            additional_args: self.additional_args,
        }
    }
}
