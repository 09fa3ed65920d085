//! `LifecycleScheduler` (spec §4.5).

use crate::hooks::ModuleHooks;
use crate::layers::layer;
use antelope_core::{LifecycleState, ModuleId};
use antelope_planner::Plan;
use dashmap::DashMap;
use petgraph::Direction;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Construct,
    Start,
    Stop,
    Destroy,
}

impl Transition {
    const fn name(self) -> &'static str {
        match self {
            Self::Construct => "construct",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Destroy => "destroy",
        }
    }

    const fn target(self) -> LifecycleState {
        match self {
            Self::Construct => LifecycleState::Constructed,
            Self::Start => LifecycleState::Active,
            Self::Stop => LifecycleState::Constructed,
            Self::Destroy => LifecycleState::Loaded,
        }
    }

    /// Tear-down transitions are best-effort: a failure is logged but does
    /// not block siblings or halt the rest of the run.
    const fn is_teardown(self) -> bool {
        matches!(self, Self::Stop | Self::Destroy)
    }
}

/// Drives every `ResolvedModule` through `Loaded -> Constructed -> Active`
/// and back, honoring the planner's strict-edge ordering with bounded
/// concurrency, and serializing repeated calls against the same module with
/// a per-module lock.
pub struct LifecycleScheduler {
    hooks: Arc<dyn ModuleHooks>,
    states: DashMap<ModuleId, Arc<tokio::sync::Mutex<LifecycleState>>>,
    concurrency: usize,
}

impl std::fmt::Debug for LifecycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleScheduler")
            .field("concurrency", &self.concurrency)
            .field("tracked_modules", &self.states.len())
            .finish()
    }
}

impl LifecycleScheduler {
    #[must_use]
    pub fn new(hooks: Arc<dyn ModuleHooks>, concurrency: Option<usize>) -> Self {
        Self {
            hooks,
            states: DashMap::new(),
            concurrency: concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
        }
    }

    pub async fn state_of(&self, id: &ModuleId) -> LifecycleState {
        let Some(lock) = self.states.get(id).map(|l| l.value().clone()) else {
            return LifecycleState::Loaded;
        };
        *lock.lock().await
    }

    fn lock_for(&self, id: &ModuleId) -> Arc<tokio::sync::Mutex<LifecycleState>> {
        self.states
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(LifecycleState::Loaded)))
            .clone()
    }

    pub async fn construct_all(&self, plan: &Plan, configs: &HashMap<ModuleId, Value>) {
        self.run_forward(plan, Transition::Construct, configs).await;
    }

    pub async fn start_all(&self, plan: &Plan) {
        self.run_forward(plan, Transition::Start, &HashMap::new()).await;
    }

    pub async fn stop_all(&self, plan: &Plan) {
        self.run_reverse(plan, Transition::Stop).await;
    }

    pub async fn destroy_all(&self, plan: &Plan) {
        self.run_reverse(plan, Transition::Destroy).await;
    }

    async fn run_forward(&self, plan: &Plan, transition: Transition, configs: &HashMap<ModuleId, Value>) {
        let layers = layer(&plan.graph);
        let predecessors = predecessor_map(plan);
        let mut blocked = std::collections::HashSet::new();
        let empty = Value::Null;

        for batch in layers {
            let semaphore = Arc::new(Semaphore::new(self.concurrency));
            let mut tasks = Vec::new();
            for id in batch {
                let deps = predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[]);
                if deps.iter().any(|p| blocked.contains(p)) {
                    warn!(module = %id, transition = transition.name(), "skipping transition, a strict provider failed");
                    blocked.insert(id);
                    continue;
                }
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let config = configs.get(&id).unwrap_or(&empty).clone();
                let lock = self.lock_for(&id);
                let hooks = self.hooks.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = permit;
                    let outcome = transition_one(&hooks, &lock, &id, transition, &config).await;
                    (id, outcome)
                }));
            }
            for task in tasks {
                if let Ok((id, Err(_))) = task.await {
                    blocked.insert(id);
                }
            }
        }
    }

    async fn run_reverse(&self, plan: &Plan, transition: Transition) {
        let mut layers = layer(&plan.graph);
        layers.reverse();
        let empty = Value::Null;

        for batch in layers {
            let semaphore = Arc::new(Semaphore::new(self.concurrency));
            let mut tasks = Vec::new();
            for id in batch {
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let lock = self.lock_for(&id);
                let hooks = self.hooks.clone();
                let config = empty.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = permit;
                    transition_one(&hooks, &lock, &id, transition, &config).await
                }));
            }
            for task in tasks {
                let _ = task.await;
            }
        }
    }

}

/// `ModuleId -> direct strict providers` (incoming-edge sources), computed
/// once per run so layer processing doesn't rescan the graph per module.
fn predecessor_map(plan: &Plan) -> HashMap<ModuleId, Vec<ModuleId>> {
    let mut map = HashMap::new();
    for idx in plan.graph.node_indices() {
        let preds = plan
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|p| plan.graph[p].clone())
            .collect();
        map.insert(plan.graph[idx].clone(), preds);
    }
    map
}


async fn transition_one(
    hooks: &Arc<dyn ModuleHooks>,
    lock: &tokio::sync::Mutex<LifecycleState>,
    id: &ModuleId,
    transition: Transition,
    config: &Value,
) -> Result<(), ()> {
    let mut state = lock.lock().await;
    if *state == transition.target() {
        return Ok(()); // idempotent: already there.
    }
    if !state.can_transition_to(transition.target()) {
        warn!(module = %id, from = %*state, to = %transition.target(), "ignoring out-of-order transition request");
        return Err(());
    }

    let result = match transition {
        Transition::Construct => hooks.construct(id, config).await,
        Transition::Start => hooks.start(id).await,
        Transition::Stop => hooks.stop(id).await,
        Transition::Destroy => hooks.destroy(id).await,
    };

    match result {
        Ok(()) => {
            info!(module = %id, transition = transition.name(), "transition complete");
            *state = transition.target();
            Ok(())
        }
        Err(e) => {
            if transition.is_teardown() {
                warn!(module = %id, transition = transition.name(), error = %e, "teardown hook failed, continuing best-effort");
                *state = transition.target();
                Ok(())
            } else {
                error!(module = %id, transition = transition.name(), error = %e, "transition failed, module left in prior state");
                Err(())
            }
        }
    }
}
