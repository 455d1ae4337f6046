use crate::scene::NodeId;
use crate::schema::{DesignNode, NodeType};
use std::collections::{HashMap, HashSet, VecDeque};

/// An instance whose component key was declared by the current import but
/// has not been registered yet
///
/// `placeholder` is a frame holding the instance's slot in its parent until
/// the component exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInstance {
    pub key: String,
    pub design: DesignNode,
    pub placeholder: NodeId,
}

/// Component bookkeeping for one import call
///
/// Maps component keys to the live components created so far, and queues
/// instance requests against keys that are known to be coming later in the
/// same tree. Cleared at the start of every import.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, NodeId>,
    pending: HashMap<String, VecDeque<PendingInstance>>,
    declared: HashSet<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.pending.clear();
        self.declared.clear();
    }

    /// Record every explicit component key found in `roots`
    pub fn declare_tree(&mut self, roots: &[DesignNode]) {
        let mut stack: Vec<&DesignNode> = roots.iter().collect();
        while let Some(node) = stack.pop() {
            let is_component =
                NodeType::normalize(&node.node_type, node).ok() == Some(NodeType::Component);
            if let (true, Some(key)) = (is_component, &node.component.key) {
                self.declare(key);
            }
            stack.extend(node.children());
        }
    }

    pub fn declare(&mut self, key: &str) {
        self.declared.insert(key.to_string());
    }

    /// True when `key` is expected from this import but not registered yet
    pub fn is_expected(&self, key: &str) -> bool {
        self.declared.contains(key) && !self.components.contains_key(key)
    }

    /// Register a component and hand back the instances waiting for it, oldest first
    pub fn register(&mut self, key: &str, component: NodeId) -> Vec<PendingInstance> {
        self.components.insert(key.to_string(), component);
        self.pending
            .remove(key)
            .map(|queue| queue.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.components.get(key).copied()
    }

    pub fn defer(&mut self, pending: PendingInstance) {
        self.pending.entry(pending.key.clone()).or_default().push_back(pending);
    }

    /// Take every request still waiting, for resolution through the remaining fallbacks
    pub fn drain_pending(&mut self) -> Vec<PendingInstance> {
        let mut keys: Vec<String> = self.pending.keys().cloned().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .flatten()
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
