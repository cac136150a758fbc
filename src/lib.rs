mod error;
mod config;
mod device;
mod invocation;
mod runner;
mod cmd;
mod utils;

// 功能模块
pub mod props;
pub mod state;
pub mod reboot;

#[cfg(test)]
mod testing;

// 导出主要类型
pub use config::{ADBConfig, ADBConfigBuilder, ElevationMode, HostPlatform};
pub use device::{DeviceState, ADB};
pub use error::{ADBError, ADBResult, ErrorKind};
pub use invocation::{ExecutionMode, Invocation};
pub use runner::{CommandRunner, RawOutput, SystemRunner};
pub use cmd::{ExecutionResult, Outcome};
pub use props::PropertyMap;
pub use reboot::{RebootCommand, RebootTarget};

// 便利的预导出模块
pub mod prelude {
    pub use super::{ADB, ADBConfig, ADBConfigBuilder, ADBError, ADBResult, DeviceState, ElevationMode};
    pub use super::props::PropertyMap;
    pub use super::reboot::{RebootCommand, RebootTarget};
}
