//! Concurrent tool registry keyed by tool definition name.

use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fcommon::Registry;
use fprovider::ToolDefinition;

use crate::Tool;

#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Registry<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by clients that are not given their own.
    pub fn global() -> Arc<ToolRegistry> {
        static GLOBAL: OnceLock<Arc<ToolRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ToolRegistry::new())))
    }

    /// Registers `tool` unless a tool with the same name exists. Returns whether it was added.
    pub fn register<T>(&self, tool: T) -> bool
    where
        T: Tool + 'static,
    {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.definition().name;
        self.write().insert_if_absent(name, tool)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.write().remove(name)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names = self.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Definitions sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self
            .read()
            .values()
            .map(|tool| tool.definition())
            .collect::<Vec<_>>();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry<String, Arc<dyn Tool>>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry<String, Arc<dyn Tool>>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
