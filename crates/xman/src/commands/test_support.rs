//! Scripted command environment for unit tests

use super::{find, CommandContext};
use semver::Version;
use std::rc::Rc;
use std::sync::Arc;
use tempfile::TempDir;
use xman_core::command::run_phases;
use xman_core::config::{ConfigManager, ToolProfile};
use xman_core::prompt::mock::{Scripted, ScriptedPrompter};
use xman_core::shell::mock::MockShellRunner;
use xman_core::versions::mock::StaticVersionSource;

pub(crate) struct Harness {
    pub dir: TempDir,
    pub shell: Arc<MockShellRunner>,
    pub prompter: Rc<ScriptedPrompter>,
    pub ctx: CommandContext,
}

impl Harness {
    pub fn new(shell: MockShellRunner, answers: impl IntoIterator<Item = Scripted>) -> Self {
        Self::with_versions(shell, answers, StaticVersionSource::new())
    }

    pub fn with_versions(
        shell: MockShellRunner,
        answers: impl IntoIterator<Item = Scripted>,
        versions: StaticVersionSource,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let shell = Arc::new(shell);
        let prompter = Rc::new(ScriptedPrompter::new(answers));
        let ctx = CommandContext {
            current_dir: dir.path().to_path_buf(),
            tool_version: Version::new(4, 0, 0),
            config: ConfigManager::new(dir.path().join("xman.json")),
            shell: shell.clone(),
            versions: Arc::new(versions),
            prompter: prompter.clone(),
        };
        ctx.config
            .ensure_config_file(&ctx.tool_version, &ctx.current_dir)
            .unwrap();

        Self {
            dir,
            shell,
            prompter,
            ctx,
        }
    }

    /// Register a profile with a project folder under the temp dir and select it.
    pub fn profile(&self, name: &str) -> ToolProfile {
        let folder = self.dir.path().join(name);
        std::fs::create_dir_all(&folder).unwrap();
        let profile = ToolProfile::new(name, folder.display().to_string());
        self.ctx.config.add_profile(&profile).unwrap();
        self.ctx.config.set_current_profile(&profile).unwrap();
        profile
    }

    /// Run a command through its phases and return the logged errors.
    pub async fn run(&self, keyword: &str, action: Option<&str>) -> Vec<String> {
        let entry = find(keyword).unwrap();
        let profile = self.ctx.config.get_current_profile().unwrap();
        let action = entry.descriptor.resolve_action(action);
        let mut command = (entry.create)(&self.ctx);
        run_phases(command.as_mut(), profile.as_ref(), action.as_deref())
            .await
            .unwrap()
    }
}
