use crate::cmd::{
    DAEMON_STARTING, DEVICE_OFFLINE, DEVICE_UNAUTHORIZED, INSUFFICIENT_PERMISSIONS, NO_DEVICES,
    STILL_AUTHORIZING,
};
use crate::device::{DeviceState, ADB};
use crate::error::{ADBError, ADBResult};
use crate::utils::contains_any;
use log::{debug, error, warn};

/// 开机完成标志，依次查询
const BOOT_COMPLETE_PROPS: &[&str] = &["dev.bootcomplete", "sys.boot_completed"];

impl ADB {
    /// 查询设备当前状态
    ///
    /// 状态不缓存，每次调用都会重新执行 `get-state`；
    /// 开机过程中需要调用方自行轮询。
    pub fn state(&self) -> DeviceState {
        if self.config.simulation {
            return DeviceState::Simulation;
        }

        self.query_state(true)
    }

    fn query_state(&self, retry_after_daemon_start: bool) -> DeviceState {
        let raw = match self.run_raw(&["get-state"]) {
            Ok(raw) => raw,
            Err(e) => {
                error!("无法查询设备状态: {}", e);
                return DeviceState::Unknown;
            }
        };
        let stdout = raw.stdout.trim();
        let stderr = raw.stderr.as_str();

        if contains_any(stderr, &[NO_DEVICES, DEVICE_OFFLINE]) {
            DeviceState::Disconnected
        } else if contains_any(stderr, &[INSUFFICIENT_PERMISSIONS, DEVICE_UNAUTHORIZED, STILL_AUTHORIZING]) {
            DeviceState::Unauthorized
        } else if stdout.starts_with("device") {
            self.boot_state()
        } else if stdout.starts_with("sideload") {
            DeviceState::Sideload
        } else if stdout.starts_with("recovery") {
            DeviceState::Recovery
        } else if stderr.contains(DAEMON_STARTING) && retry_after_daemon_start {
            debug!("ADB 守护进程刚刚启动, 重新查询设备状态");
            self.query_state(false)
        } else {
            error!("未知的设备状态:\nstdout: {}\nstderr: {}", stdout, stderr);
            DeviceState::Unknown
        }
    }

    /// `get-state` 为 device 时区分开机中与已开机
    fn boot_state(&self) -> DeviceState {
        match self.is_boot_complete() {
            Ok(true) => DeviceState::Android,
            Ok(false) => DeviceState::Booting,
            Err(ADBError::Disconnected) => DeviceState::Disconnected,
            Err(ADBError::Unauthorized) => DeviceState::Unauthorized,
            Err(e) => {
                warn!("开机状态检查失败, 视为已开机: {}", e);
                DeviceState::Android
            }
        }
    }

    /// 检查开机是否完成
    ///
    /// 只读取单个属性：开机完成前完整的 `getprop` 可能失败或挂起。
    pub fn is_boot_complete(&self) -> ADBResult<bool> {
        for prop in BOOT_COMPLETE_PROPS {
            // 直接读取原始输出，状态查询中不做守护进程恢复
            let raw = self.run_raw(&["shell", "getprop", *prop])?;
            let stderr = raw.stderr.trim();

            if contains_any(stderr, &[NO_DEVICES, DEVICE_OFFLINE]) {
                return Err(ADBError::Disconnected);
            }
            if contains_any(stderr, &[DEVICE_UNAUTHORIZED, STILL_AUTHORIZING]) {
                return Err(ADBError::Unauthorized);
            }
            if !stderr.is_empty() && !stderr.contains(DAEMON_STARTING) {
                debug!("读取 {} 失败: {}", prop, stderr);
                return Err(ADBError::Unclassified {
                    command: format!("shell getprop {}", prop),
                    stderr: stderr.to_string(),
                });
            }

            if raw.stdout.trim().starts_with('1') {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// 设备处于 device 状态但尚未开机完成
    pub fn is_booting(&self) -> ADBResult<bool> {
        let complete = match self.is_boot_complete() {
            Ok(complete) => complete,
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => {
                warn!("开机状态检查失败, 视为已开机: {}", e);
                true
            }
        };

        let raw = self.run_raw(&["get-state"])?;
        Ok(raw.stdout.trim().starts_with("device") && !complete)
    }

    /// 设备是否通过 ADB 可见
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// 设备是否可以接受命令：recovery 模式，或 Android 已开机完成
    pub fn is_ready(&self) -> bool {
        match self.state() {
            DeviceState::Recovery => true,
            DeviceState::Android => match self.is_booting() {
                Ok(booting) => !booting,
                Err(e) => {
                    if !e.is_unavailable() {
                        warn!("无法确认开机状态: {}", e);
                    }
                    false
                }
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{scripted, ScriptedRunner};

    fn booted_device() -> ScriptedRunner {
        ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "1\n", "")
    }

    #[test]
    fn simulation_overrides_everything() {
        let (mut adb, runner) = scripted(ScriptedRunner::default());
        adb.set_simulation(true);
        assert_eq!(adb.state(), DeviceState::Simulation);
        assert!(!adb.is_connected());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn unauthorized_scenario() {
        let (adb, _) = scripted(ScriptedRunner::default().on("get-state", "", "error: device unauthorized"));
        assert_eq!(adb.state(), DeviceState::Unauthorized);
        assert!(adb.is_connected());
        assert!(!adb.is_ready());
    }

    #[test]
    fn insufficient_permissions_is_unauthorized() {
        let (adb, _) = scripted(ScriptedRunner::default().on(
            "get-state",
            "",
            "error: insufficient permissions for device: user in plugdev group",
        ));
        assert_eq!(adb.state(), DeviceState::Unauthorized);
    }

    #[test]
    fn disconnected_states() {
        for stderr in ["error: no devices/emulators found", "error: device offline"] {
            let (adb, _) = scripted(ScriptedRunner::default().on("get-state", "", stderr));
            assert_eq!(adb.state(), DeviceState::Disconnected);
            assert!(!adb.is_connected());
            assert!(!adb.is_ready());
        }
    }

    #[test]
    fn booting_when_neither_property_is_set() {
        let runner = ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "", "")
            .on("shell getprop sys.boot_completed", "0\n", "");
        let (adb, _) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Booting);
        assert!(adb.is_connected());
        assert!(!adb.is_ready());
        assert!(adb.is_booting().unwrap());
    }

    #[test]
    fn android_once_either_property_is_set() {
        let (adb, runner) = scripted(booted_device());
        assert_eq!(adb.state(), DeviceState::Android);
        assert!(adb.is_ready());
        assert_eq!(runner.count("shell getprop sys.boot_completed"), 0);

        let runner = ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "", "")
            .on("shell getprop sys.boot_completed", "1\n", "");
        let (adb, _) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Android);
    }

    #[test]
    fn boot_check_never_dumps_all_properties() {
        let (adb, runner) = scripted(booted_device());
        adb.is_ready();
        assert_eq!(runner.count("shell getprop"), 0);
    }

    #[test]
    fn prompt_during_boot_check_does_not_kill_server() {
        let runner = ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "", "[sudo] password for user: ");
        let (adb, runner) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Android);
        assert!(matches!(adb.is_boot_complete(), Err(ADBError::Unclassified { .. })));
        assert_eq!(runner.count("kill-server"), 0);
    }

    #[test]
    fn unauthorized_during_boot_check() {
        let runner = ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "", "error: device still authorizing");
        let (adb, _) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Unauthorized);
        assert!(!adb.is_ready());
    }

    #[test]
    fn device_lost_during_boot_check() {
        let runner = ScriptedRunner::default()
            .on("get-state", "device\n", "")
            .on("shell getprop dev.bootcomplete", "", "error: no devices/emulators found");
        let (adb, _) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Disconnected);
        assert!(matches!(adb.is_booting(), Err(ADBError::Disconnected)));
    }

    #[test]
    fn recovery_and_sideload() {
        let (adb, _) = scripted(ScriptedRunner::default().on("get-state", "recovery\n", ""));
        assert_eq!(adb.state(), DeviceState::Recovery);
        assert!(adb.is_ready());

        let (adb, _) = scripted(ScriptedRunner::default().on("get-state", "sideload\n", ""));
        assert_eq!(adb.state(), DeviceState::Sideload);
        assert!(adb.is_connected());
        assert!(!adb.is_ready());
    }

    #[test]
    fn daemon_start_requeries_once() {
        let runner = ScriptedRunner::default()
            .on("get-state", "", "* daemon not running; starting now at tcp:5037")
            .on("get-state", "recovery\n", "");
        let (adb, runner) = scripted(runner);
        assert_eq!(adb.state(), DeviceState::Recovery);
        assert_eq!(runner.count("get-state"), 2);
    }

    #[test]
    fn daemon_start_does_not_loop() {
        let (adb, runner) = scripted(ScriptedRunner::default().on(
            "get-state",
            "",
            "* daemon not running; starting now at tcp:5037",
        ));
        assert_eq!(adb.state(), DeviceState::Unknown);
        assert_eq!(runner.count("get-state"), 2);
    }

    #[test]
    fn unexpected_output_is_unknown() {
        let (adb, _) = scripted(ScriptedRunner::default().on("get-state", "bootloader\n", ""));
        assert_eq!(adb.state(), DeviceState::Unknown);
        assert!(!adb.is_connected());
    }
}
