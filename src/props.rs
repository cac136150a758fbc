use crate::cmd::{ExecutionResult, Outcome};
use crate::device::ADB;
use crate::error::{ADBError, ADBResult};
use crate::utils::output_lines;
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static PROP_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]+)\]: \[(.*)\]$").expect("getprop 行正则无效"));
static DIGIT_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d\.").expect("IMEI 正则无效"));
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("IMEI 正则无效"));
static LONG_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{15,}").expect("IMEI 正则无效"));

/// 设备属性快照，`getprop` 输出的键值对
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMap(HashMap<String, String>);

impl PropertyMap {
    /// 解析 `getprop` 输出，丢弃不符合 `[key]: [value]` 格式的行
    pub fn parse(output: &str) -> Self {
        let mut properties = HashMap::new();

        for line in output_lines(output) {
            if line.is_empty() {
                continue;
            }

            match PROP_LINE.captures(line) {
                Some(caps) => {
                    properties.insert(caps[1].to_string(), caps[2].to_string());
                }
                None => debug!("丢弃 getprop 输出中的行: {}", line),
            }
        }

        PropertyMap(properties)
    }

    /// 缺失的键返回空字符串
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 依次尝试多个键，返回第一个非空值
    fn first_of(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|key| self.get(key))
            .find(|value| !value.is_empty())
            .unwrap_or("")
            .to_string()
    }

    pub fn model(&self) -> String {
        self.first_of(&["ro.product.model", "ro.omni.device"])
    }

    pub fn brand(&self) -> String {
        self.first_of(&["ro.product.brand", "ro.product.manufacturer"])
    }

    /// 从属性读取代号，并不可靠，仅在型号到代号的查表失败时使用
    pub fn codename(&self) -> String {
        self.first_of(&["ro.build.product", "ro.product.device", "ro.product.name"])
    }

    pub fn serial_number(&self) -> String {
        self.first_of(&["ro.serialno", "ro.boot.serialno"])
    }

    pub fn android_version(&self) -> String {
        self.get("ro.build.version.release").to_string()
    }

    /// Android 主版本号，取版本字符串第一段
    pub fn major_android_version(&self) -> ADBResult<u32> {
        let version = self.get("ro.build.version.release");
        let major = version.split('.').next().unwrap_or("").trim();

        major.parse::<u32>().map_err(|e| {
            error!("无法获取 Android 主版本号: \"{}\" 转换为整数失败", version);
            ADBError::ParseError(format!("Android 版本 \"{}\": {}", version, e))
        })
    }

    /// 归一化的 CPU 架构；没有该属性时返回空字符串
    pub fn cpu_arch(&self) -> ADBResult<String> {
        let abi = self.get("ro.product.cpu.abi");

        let arch = match abi.to_lowercase().as_str() {
            "armeabi-v7a" => "arm",
            "arm64-v8a" => "arm64",
            "x86" => "x86",
            "x86_64" => "x86_64",
            "" => "",
            _ => return Err(ADBError::UnknownArchitecture(abi.to_string())),
        };

        Ok(arch.to_string())
    }

    /// userdebug 构建视为第三方 ROM
    pub fn is_custom_rom(&self) -> bool {
        self.get("ro.build.type") == "userdebug"
            || self.get("ro.build.flavor").contains("userdebug")
            || self.get("ro.build.display.id").contains("userdebug")
    }

    /// 是否支持 A/B 无缝更新
    pub fn is_ab(&self) -> bool {
        self.get("ro.build.ab_update").eq_ignore_ascii_case("true")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PropertyMap(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// 从 `service call iphonesubinfo 1` 的 Parcel 输出中提取 IMEI
pub fn imei_from_service_call(output: &str) -> String {
    let collapsed: String = DIGIT_DOT.find_iter(output).map(|m| m.as_str()).collect();
    DIGIT.find_iter(&collapsed).map(|m| m.as_str()).collect()
}

/// 从 `dumpsys iphonesubinfo` 输出中提取 IMEI
pub fn imei_from_dumpsys(output: &str) -> String {
    LONG_NUMBER.find_iter(output).map(|m| m.as_str()).collect()
}

impl ADB {
    /// 获取完整的属性快照；设备不可用时返回空表和错误
    pub fn fetch_properties(&self) -> (PropertyMap, Option<ADBError>) {
        let ExecutionResult { command, stdout, outcome } = self.execute(&["shell", "getprop"]);

        match outcome {
            Outcome::Success => (PropertyMap::parse(&stdout), None),
            Outcome::Failed(e) if e.is_unavailable() => (PropertyMap::default(), Some(e)),
            Outcome::Failed(e) => (PropertyMap::parse(&stdout), Some(e)),
            Outcome::RecoveredRequiresRetry => {
                (PropertyMap::default(), Some(ADBError::RetryRequired(command)))
            }
        }
    }

    /// 获取设备所有属性，只有设备不可用或需要重试时才失败
    pub fn get_prop_map(&self) -> ADBResult<PropertyMap> {
        match self.fetch_properties() {
            (props, None) => Ok(props),
            (_, Some(e)) if e.is_unavailable() || e.requires_retry() => Err(e),
            (props, Some(e)) => {
                warn!("getprop 返回错误, 使用已解析的 {} 个属性: {}", props.len(), e);
                Ok(props)
            }
        }
    }

    /// 通过完整属性快照读取单个属性
    pub fn get_prop(&self, key: &str) -> ADBResult<String> {
        Ok(self.get_prop_map()?.get(key).to_string())
    }

    /// 直接读取单个属性，不获取完整快照
    pub fn get_prop_direct(&self, key: &str) -> ADBResult<String> {
        self.cmd(&["shell", "getprop", key])
    }

    /// 设置设备属性
    pub fn set_prop(&self, key: &str, value: &str) -> ADBResult<()> {
        self.execute(&["shell", "setprop", key, value]).into_lenient_result()?;
        Ok(())
    }

    pub fn model(&self) -> ADBResult<String> {
        Ok(self.get_prop_map()?.model())
    }

    pub fn brand(&self) -> ADBResult<String> {
        Ok(self.get_prop_map()?.brand())
    }

    pub fn codename(&self) -> ADBResult<String> {
        Ok(self.get_prop_map()?.codename())
    }

    pub fn serial_number(&self) -> ADBResult<String> {
        Ok(self.get_prop_map()?.serial_number())
    }

    pub fn android_version(&self) -> ADBResult<String> {
        Ok(self.get_prop_map()?.android_version())
    }

    pub fn major_android_version(&self) -> ADBResult<u32> {
        self.get_prop_map()?.major_android_version()
    }

    pub fn cpu_arch(&self) -> ADBResult<String> {
        self.get_prop_map()?.cpu_arch()
    }

    pub fn is_ab(&self) -> ADBResult<bool> {
        Ok(self.get_prop_map()?.is_ab())
    }

    pub fn is_custom_rom(&self) -> ADBResult<bool> {
        Ok(self.get_prop_map()?.is_custom_rom())
    }

    /// 读取 IMEI，Android 5 以上通过 binder 服务调用，以下通过 dumpsys
    pub fn imei(&self) -> ADBResult<String> {
        let major = match self.major_android_version() {
            Ok(major) => major,
            Err(e) if e.is_unavailable() || e.requires_retry() => return Err(e),
            Err(e) => {
                warn!("无法确定 Android 版本, 按旧版本读取 IMEI: {}", e);
                0
            }
        };

        let (output, extract): (String, fn(&str) -> String) = if major >= 5 {
            let output = self
                .execute(&["shell", "service", "call", "iphonesubinfo", "1"])
                .into_lenient_result()?;
            (output, imei_from_service_call)
        } else {
            let output = self
                .execute(&["shell", "dumpsys", "iphonesubinfo"])
                .into_lenient_result()?;
            (output, imei_from_dumpsys)
        };

        if output.is_empty() {
            return Err(ADBError::ImeiNotFound);
        }

        Ok(extract(&output))
    }

    /// 在设备屏幕上打开 IMEI 信息页
    pub fn show_imei_on_device_screen(&self) -> ADBResult<()> {
        self.execute(&[
            "shell",
            "am",
            "start",
            "-n",
            "com.android.settings/com.android.settings.deviceinfo.ImeiInformation",
        ])
        .into_lenient_result()?;
        Ok(())
    }
}
