//! 测试用的脚本化进程启动器

use crate::config::{ADBConfigBuilder, ElevationMode, HostPlatform};
use crate::device::ADB;
use crate::invocation::Invocation;
use crate::runner::{CommandRunner, RawOutput};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

/// 按子命令返回预设输出；队列只剩一项时重复返回该项
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<RawOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn on(self, command: &str, stdout: &str, stderr: &str) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses
                .entry(command.to_string())
                .or_default()
                .push_back(RawOutput::new(stdout, stderr));
        }
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RawOutput> {
        let command = invocation.command_line();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| io::Error::other("responses poisoned"))?;
        let queue = responses
            .get_mut(&command)
            .ok_or_else(|| io::Error::other(format!("unscripted command: {}", command)))?;

        match queue.len() {
            0 => Err(io::Error::other(format!("no response left: {}", command))),
            1 => Ok(queue[0].clone()),
            _ => Ok(queue.pop_front().unwrap_or_default()),
        }
    }
}

/// 构建使用脚本化启动器的 ADB 实例
pub(crate) fn scripted(runner: ScriptedRunner) -> (ADB, Arc<ScriptedRunner>) {
    let runner = Arc::new(runner);
    let config = ADBConfigBuilder::default()
        .platform(HostPlatform::Linux)
        .elevation(ElevationMode::None)
        .path("adb")
        .build();
    (ADB::with_runner(config, runner.clone()), runner)
}
