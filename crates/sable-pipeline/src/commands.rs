// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A registry of host callbacks run by `ExecuteCustomCommand`.

use ahash::AHashMap;
use sable_core::renderer::{GpuDevice, ViewId};
use sable_core::scene::{CameraParams, RenderScene};

/// What a custom command can see and drive.
pub struct CommandContext<'a> {
    /// The device.
    pub device: &'a mut dyn GpuDevice,
    /// The scene being rendered.
    pub scene: &'a dyn RenderScene,
    /// Current view.
    pub view: ViewId,
    /// Applied camera, if any.
    pub camera: Option<CameraParams>,
}

/// A host callback.
pub type CustomCommand = Box<dyn FnMut(&mut CommandContext<'_>)>;

/// Callbacks by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: AHashMap<String, CustomCommand>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, command: impl FnMut(&mut CommandContext<'_>) + 'static) {
        if self
            .commands
            .insert(name.to_string(), Box::new(command))
            .is_some()
        {
            log::debug!("CommandRegistry: replaced command '{}'", name);
        }
    }

    /// Removes the command named `name`.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// Runs the command named `name`. Returns `false` if none is registered.
    pub fn execute(&mut self, name: &str, context: &mut CommandContext<'_>) -> bool {
        match self.commands.get_mut(name) {
            Some(command) => {
                command(context);
                true
            }
            None => false,
        }
    }

    /// Whether a command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        f.debug_struct("CommandRegistry")
            .field("commands", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::testing::{DeviceCall, RecordingDevice, TestScene};

    #[test]
    fn test_registered_command_runs_with_context() {
        let mut registry = CommandRegistry::new();
        registry.register("touch_view", |ctx| ctx.device.touch(ctx.view));

        let mut device = RecordingDevice::new();
        let scene = TestScene::new();
        let mut context = CommandContext {
            device: &mut device,
            scene: &scene,
            view: 5,
            camera: None,
        };
        assert!(registry.execute("touch_view", &mut context));
        assert!(!registry.execute("missing", &mut context));
        assert_eq!(device.calls(), &[DeviceCall::Touch(5)]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = CommandRegistry::new();
        registry.register("noop", |_| {});
        assert!(registry.contains("noop"));
        assert!(registry.unregister("noop"));
        assert!(!registry.contains("noop"));
    }
}
