use antelope_core::{LifecycleState, ModuleId};

/// A snapshot of a module's identity and current lifecycle state, returned
/// by `ModuleManager::get_module` (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    pub id: ModuleId,
    pub state: LifecycleState,
}
