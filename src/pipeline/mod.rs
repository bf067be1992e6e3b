//! Filter pipelines and the trampoline that drives them.
//!
//! A filter inspects one context and either decides its result, pushes child
//! contexts to be processed first, or lets the next filter try. The
//! [`Processor`] walks the context tree iteratively: after a pipe runs on a
//! context it hops to the context queued in its `next` link, which is how
//! children get visited before their parent is revisited to collect them.

mod error;
mod pipe;
mod tree;

use std::collections::BTreeMap;

pub use error::PipelineError;
pub use pipe::Pipe;
use tracing::trace;
pub use tree::{ContextTree, NodeId};

use crate::{
    context::{Context, DiffContext, PatchContext, ReverseContext},
    error::DeltaError,
    options::Options,
};

pub type DiffFilter = for<'a> fn(&mut ContextTree<DiffContext<'a>>, NodeId, &Options) -> Result<(), DeltaError>;
pub type PatchFilter = for<'d> fn(&mut ContextTree<PatchContext<'d>>, NodeId, &Options) -> Result<(), DeltaError>;
pub type ReverseFilter =
    for<'d> fn(&mut ContextTree<ReverseContext<'d>>, NodeId, &Options) -> Result<(), DeltaError>;

/// A filter that can run on contexts of type `C`.
pub trait Filter<C>: Copy {
    fn call(self, tree: &mut ContextTree<C>, id: NodeId, options: &Options) -> Result<(), DeltaError>;
}

impl<'a> Filter<DiffContext<'a>> for DiffFilter {
    fn call(self, tree: &mut ContextTree<DiffContext<'a>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
        self(tree, id, options)
    }
}

impl<'d> Filter<PatchContext<'d>> for PatchFilter {
    fn call(self, tree: &mut ContextTree<PatchContext<'d>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
        self(tree, id, options)
    }
}

impl<'d> Filter<ReverseContext<'d>> for ReverseFilter {
    fn call(
        self,
        tree: &mut ContextTree<ReverseContext<'d>>,
        id: NodeId,
        options: &Options,
    ) -> Result<(), DeltaError> {
        self(tree, id, options)
    }
}

/// Named pipes of one filter kind.
#[derive(Debug, Clone)]
pub struct Processor<F> {
    pipes: BTreeMap<String, Pipe<F>>,
}

impl<F> Default for Processor<F> {
    fn default() -> Self {
        Processor {
            pipes: BTreeMap::new(),
        }
    }
}

impl<F> Processor<F> {
    pub fn new() -> Self {
        Processor::default()
    }

    /// Add a pipe, returning the one it replaces.
    pub fn register(&mut self, pipe: Pipe<F>) -> Option<Pipe<F>> {
        self.pipes.insert(pipe.name().to_string(), pipe)
    }

    pub fn pipe(&self, name: &str) -> Result<&Pipe<F>, PipelineError> {
        self.pipes.get(name).ok_or_else(|| PipelineError::pipe_not_found(name))
    }

    pub fn pipe_mut(&mut self, name: &str) -> Result<&mut Pipe<F>, PipelineError> {
        self.pipes
            .get_mut(name)
            .ok_or_else(|| PipelineError::pipe_not_found(name))
    }

    pub fn pipe_names(&self) -> impl Iterator<Item = &str> {
        self.pipes.keys().map(String::as_str)
    }

    /// Run the tree from its root, starting with `pipe` (or the context's
    /// own pipe) and following the `next` links until none is left.
    pub fn process<C>(&self, tree: &mut ContextTree<C>, pipe: Option<&str>, options: &Options) -> Result<(), DeltaError>
    where
        C: Context,
        F: Filter<C>,
    {
        let mut current = tree.root();
        let mut pipe = self.pipe(pipe.unwrap_or(C::PIPE))?;
        loop {
            tree.resume(current);
            pipe.process(tree, current, options)?;

            let Some(next) = tree.next(current) else {
                return Ok(());
            };
            let name = tree.pipe_for(next).unwrap_or(C::PIPE);
            trace!(pipe = name, from = ?current, to = ?next, "next context");
            pipe = self.pipe(name)?;
            current = next;
        }
    }
}

/// The three processors a [`DiffPatcher`](crate::DiffPatcher) runs.
#[derive(Debug, Clone, Default)]
pub struct Pipelines {
    pub diff: Processor<DiffFilter>,
    pub patch: Processor<PatchFilter>,
    pub reverse: Processor<ReverseFilter>,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::{Value, json};

    use super::*;
    use crate::{context::ChildName, delta::Delta};

    /// Pushes one child per array element, then sums the children.
    fn sum_children(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
        if tree.has_children(id) {
            let total: i64 = tree
                .children(id)
                .to_vec()
                .into_iter()
                .filter_map(|child| match tree.get(child).result() {
                    Some(Delta::Added(Value::Number(n))) => n.as_i64(),
                    _ => None,
                })
                .sum();
            tree.get_mut(id).set_result(Some(Delta::Added(json!(total))));
            tree.exit(id);
            return Ok(());
        }
        let left = tree.get(id).left;
        let Some(Value::Array(items)) = left else {
            return Ok(());
        };
        for (index, item) in items.iter().enumerate() {
            tree.push(id, ChildName::Index(index), DiffContext::new(Some(item), None));
        }
        tree.exit(id);
        Ok(())
    }

    fn leaf(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
        if let Some(item) = tree.get(id).left.cloned() {
            tree.get_mut(id).set_result(Some(Delta::Added(item)));
        }
        Ok(())
    }

    fn processor(check_results: bool) -> Processor<DiffFilter> {
        let mut pipe = Pipe::new("diff");
        pipe.append("sum", sum_children as DiffFilter)
            .append("leaf", leaf)
            .should_have_result(check_results);
        let mut processor = Processor::new();
        processor.register(pipe);
        processor
    }

    #[test]
    fn children_run_before_parent_collects() {
        let left = json!([[1, 2], 3, [4]]);
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), None));
        let_assert!(Ok(()) = processor(true).process(&mut tree, None, &Options::default()));
        check!(tree.len() == 7);
        let root = tree.into_root();
        check!(root.result() == Some(&Delta::Added(json!(10))));
    }

    #[test]
    fn missing_result_fails_checked_pipe() {
        let mut tree = ContextTree::new(DiffContext::new(None, None));
        let_assert!(
            Err(DeltaError::Pipeline(PipelineError::NoResult { pipe })) =
                processor(true).process(&mut tree, None, &Options::default())
        );
        check!(pipe == "diff");

        let mut tree = ContextTree::new(DiffContext::new(None, None));
        check!(processor(false).process(&mut tree, None, &Options::default()).is_ok());
    }

    #[test]
    fn unknown_pipe_is_an_error() {
        let left = json!(1);
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), None));
        let_assert!(
            Err(DeltaError::Pipeline(PipelineError::PipeNotFound { name })) =
                processor(true).process(&mut tree, Some("nested"), &Options::default())
        );
        check!(name == "nested");
    }

    #[test]
    fn switch_to_covers_every_child() {
        fn redirect(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
            if tree.has_children(id) {
                tree.get_mut(id).set_result(None);
                return Ok(());
            }
            tree.push(id, ChildName::key("a"), DiffContext::new(None, None));
            tree.push(id, ChildName::key("b"), DiffContext::new(None, None));
            tree.switch_to(id, "marker");
            tree.exit(id);
            Ok(())
        }
        fn mark(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
            check!(tree.parent(id).is_some());
            tree.get_mut(id).set_result(Some(Delta::Added(json!("marked"))));
            Ok(())
        }

        let mut processor = Processor::new();
        let mut diff = Pipe::new("diff");
        diff.append("redirect", redirect as DiffFilter);
        let mut marker = Pipe::new("marker");
        marker.append("mark", mark as DiffFilter);
        processor.register(diff);
        processor.register(marker);
        check!(processor.pipe_names().collect::<Vec<_>>() == vec!["diff", "marker"]);

        let mut tree = ContextTree::new(DiffContext::new(None, None));
        let_assert!(Ok(()) = processor.process(&mut tree, None, &Options::default()));
        let root = tree.root();
        let children = tree.children(root).to_vec();
        check!(children.len() == 2);
        for child in children {
            check!(tree.get(child).result() == Some(&Delta::Added(json!("marked"))));
        }
        check!(tree.get(root).has_result());
        check!(tree.get(root).result() == None);
    }
}
