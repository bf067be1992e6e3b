use tracing::trace;

use crate::context::ChildName;

/// Handle to a context stored in a [`ContextTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<C> {
    ctx: C,
    parent: Option<NodeId>,
    child_name: Option<ChildName>,
    children: Vec<NodeId>,
    /// Context to visit after this one.
    next: Option<NodeId>,
    /// Where to continue once the children are done. Set by the first push.
    next_after_children: Option<Option<NodeId>>,
    next_pipe: Option<String>,
    exiting: bool,
}

impl<C> Node<C> {
    fn new(ctx: C, parent: Option<NodeId>, child_name: Option<ChildName>) -> Self {
        Node {
            ctx,
            parent,
            child_name,
            children: Vec::new(),
            next: None,
            next_after_children: None,
            next_pipe: None,
            exiting: false,
        }
    }
}

/// Arena of the contexts created while processing one root value.
///
/// Children are threaded into a visiting order as they are pushed: the
/// parent's `next` hop points at its first child, each child points at the
/// following sibling, and the last child points back to the parent. The
/// parent remembers where it was heading before the first push and resumes
/// there once it has been revisited.
#[derive(Debug)]
pub struct ContextTree<C> {
    nodes: Vec<Node<C>>,
}

impl<C> ContextTree<C> {
    pub fn new(root: C) -> Self {
        ContextTree {
            nodes: vec![Node::new(root, None, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &C {
        &self.nodes[id.0].ctx
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut C {
        &mut self.nodes[id.0].ctx
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn child_name(&self, id: NodeId) -> Option<&ChildName> {
        self.nodes[id.0].child_name.as_ref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Queue `ctx` to be processed as the last child of `parent`.
    pub fn push(&mut self, parent: NodeId, name: ChildName, ctx: C) -> NodeId {
        let child = NodeId(self.nodes.len());
        trace!(?parent, %name, "push child");
        self.nodes.push(Node::new(ctx, Some(parent), Some(name)));

        let previous = self.nodes[parent.0].children.last().copied();
        match previous {
            None => {
                let node = &mut self.nodes[parent.0];
                node.next_after_children = Some(node.next);
                node.next = Some(child);
            }
            Some(sibling) => self.nodes[sibling.0].next = Some(child),
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].next = Some(parent);
        child
    }

    /// Stop running the current pipe on this context.
    pub fn exit(&mut self, id: NodeId) {
        self.nodes[id.0].exiting = true;
    }

    /// Run the named pipe on every descendant of this context. The context
    /// itself keeps its own pipe when it is revisited.
    pub fn switch_to(&mut self, id: NodeId, pipe: impl Into<String>) {
        self.nodes[id.0].next_pipe = Some(pipe.into());
    }

    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    /// Pipe requested for `id` by its nearest switched ancestor.
    pub(crate) fn pipe_for(&self, id: NodeId) -> Option<&str> {
        let mut ancestor = self.nodes[id.0].parent;
        while let Some(node) = ancestor.map(|a| &self.nodes[a.0]) {
            if let Some(pipe) = node.next_pipe.as_deref() {
                return Some(pipe);
            }
            ancestor = node.parent;
        }
        None
    }

    /// Coming back from the children: continue where the node was heading.
    pub(crate) fn resume(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if let Some(next) = node.next_after_children.take() {
            node.next = next;
        }
    }

    pub(crate) fn take_exiting(&mut self, id: NodeId) -> bool {
        std::mem::take(&mut self.nodes[id.0].exiting)
    }

    pub fn into_root(mut self) -> C {
        self.nodes.swap_remove(0).ctx
    }
}
