//! Tree-to-record serialization.
//!
//! The walk is iterative with an explicit frame stack, so tree depth is
//! bounded by heap rather than call stack. Each node's fields are read the
//! moment its frame is created, before any descent, because the host may
//! invalidate the tree while the walk is still running.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{NodeHandle, NodeSnapshot, FIELD_GATES};

pub(crate) struct TreeSerializer {
    /// Field names active on this host, fixed once at construction.
    active: Vec<&'static str>,
}

struct Frame {
    node: NodeHandle,
    snapshot: NodeSnapshot,
    child_count: usize,
    next_child: usize,
}

impl TreeSerializer {
    pub fn new(api_level: u32) -> Self {
        let active = FIELD_GATES
            .iter()
            .filter(|(_, min_level)| *min_level <= api_level)
            .map(|(name, _)| *name)
            .collect();
        Self { active }
    }

    /// Serialize a whole tree. Returns the root snapshot and the number of
    /// populated nodes.
    pub fn serialize_tree(&self, root: &NodeHandle) -> (NodeSnapshot, usize) {
        let mut node_count = 1usize;
        let mut stack = vec![self.open_frame(root.clone(), -1)];

        loop {
            let top = stack.last_mut().expect("stack holds the root until return");

            if top.next_child < top.child_count {
                let index = top.next_child;
                top.next_child += 1;

                match top.node.child(index) {
                    Some(child) => {
                        let parent_id = top.snapshot.own_id;
                        node_count += 1;
                        let frame = self.open_frame(child, parent_id);
                        stack.push(frame);
                    }
                    // Reported child the host could not hand out: keep the gap.
                    None => top.snapshot.children.push(None),
                }
                continue;
            }

            let finished = stack.pop().expect("non-empty, checked above");
            match stack.last_mut() {
                Some(parent) => parent.snapshot.children.push(Some(finished.snapshot)),
                None => return (finished.snapshot, node_count),
            }
        }
    }

    /// Serialize one node without descending into children. Used for the
    /// event's source node so the tree is not captured twice.
    pub fn serialize_single(&self, node: &NodeHandle, parent_id: i64) -> NodeSnapshot {
        NodeSnapshot {
            own_id: node.identity(),
            parent_id,
            fields: self.read_fields(node.as_ref()),
            children: Vec::new(),
        }
    }

    fn open_frame(&self, node: NodeHandle, parent_id: i64) -> Frame {
        let snapshot = NodeSnapshot {
            own_id: node.identity(),
            parent_id,
            fields: self.read_fields(node.as_ref()),
            children: Vec::new(),
        };
        let child_count = node.child_count();
        Frame {
            node,
            snapshot,
            child_count,
            next_child: 0,
        }
    }

    /// Every gated name appears in the output; inactive or unreadable fields
    /// are null so the record schema is identical across host versions.
    fn read_fields(&self, node: &dyn super::UiNode) -> BTreeMap<String, Value> {
        let mut fields = BTreeMap::new();
        for (name, _) in FIELD_GATES {
            let value = if self.active.contains(name) {
                node.field(name).unwrap_or(Value::Null)
            } else {
                Value::Null
            };
            fields.insert((*name).to_string(), value);
        }
        fields
    }
}
