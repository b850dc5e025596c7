use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ds_core::{DialogError, DialogResult};
use serde_json::Value;
use tracing::debug;

use crate::convo::Convo;
use crate::host::DialogHost;

pub type BeforeHook =
    Arc<dyn Fn(&mut Convo<'_>, &mut dyn DialogHost) -> Result<(), DialogError> + Send + Sync>;
pub type AfterHook =
    Arc<dyn Fn(&DialogResult, &mut dyn DialogHost) -> Result<(), DialogError> + Send + Sync>;
pub type ChangeHook = Arc<
    dyn Fn(&Value, &mut Convo<'_>, &mut dyn DialogHost) -> Result<(), DialogError> + Send + Sync,
>;

/// Lifecycle callbacks, fixed when the dialog is built and invoked in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    before: BTreeMap<String, Vec<BeforeHook>>,
    after: Vec<AfterHook>,
    change: BTreeMap<String, Vec<ChangeHook>>,
}

impl HookRegistry {
    pub(crate) fn add_before(&mut self, thread: &str, hook: BeforeHook) {
        self.before.entry(thread.to_string()).or_default().push(hook);
    }

    pub(crate) fn add_after(&mut self, hook: AfterHook) {
        self.after.push(hook);
    }

    pub(crate) fn add_change(&mut self, key: &str, hook: ChangeHook) {
        self.change.entry(key.to_string()).or_default().push(hook);
    }

    pub fn before_count(&self, thread: &str) -> usize {
        self.before.get(thread).map(Vec::len).unwrap_or(0)
    }

    pub fn after_count(&self) -> usize {
        self.after.len()
    }

    pub fn change_count(&self, key: &str) -> usize {
        self.change.get(key).map(Vec::len).unwrap_or(0)
    }

    pub(crate) fn run_before(
        &self,
        dialog_id: &str,
        thread: &str,
        convo: &mut Convo<'_>,
        host: &mut dyn DialogHost,
    ) -> Result<(), DialogError> {
        let Some(hooks) = self.before.get(thread) else {
            return Ok(());
        };
        debug!(dialog = dialog_id, thread, "running before hooks");
        for hook in hooks {
            hook(convo, host)?;
        }
        Ok(())
    }

    pub(crate) fn run_after(
        &self,
        dialog_id: &str,
        result: &DialogResult,
        host: &mut dyn DialogHost,
    ) -> Result<(), DialogError> {
        if self.after.is_empty() {
            return Ok(());
        }
        debug!(dialog = dialog_id, status = ?result.status, "running after hooks");
        for hook in &self.after {
            hook(result, host)?;
        }
        Ok(())
    }

    pub(crate) fn run_change(
        &self,
        dialog_id: &str,
        key: &str,
        value: &Value,
        convo: &mut Convo<'_>,
        host: &mut dyn DialogHost,
    ) -> Result<(), DialogError> {
        let Some(hooks) = self.change.get(key) else {
            return Ok(());
        };
        debug!(dialog = dialog_id, key, %value, "running change hooks");
        for hook in hooks {
            hook(value, convo, host)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before", &self.before.keys().collect::<Vec<_>>())
            .field("after", &self.after.len())
            .field("change", &self.change.keys().collect::<Vec<_>>())
            .finish()
    }
}
