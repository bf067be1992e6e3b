use tracing::trace;

use super::{ContextTree, Filter, NodeId, PipelineError};
use crate::{context::Context, error::DeltaError, options::Options};

/// A named, ordered list of filters.
#[derive(Debug, Clone)]
pub struct Pipe<F> {
    name: String,
    filters: Vec<(String, F)>,
    result_check: bool,
}

impl<F> Pipe<F> {
    pub fn new(name: impl Into<String>) -> Self {
        Pipe {
            name: name.into(),
            filters: Vec::new(),
            result_check: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn append(&mut self, name: impl Into<String>, filter: F) -> &mut Self {
        self.filters.push((name.into(), filter));
        self
    }

    pub fn prepend(&mut self, name: impl Into<String>, filter: F) -> &mut Self {
        self.filters.insert(0, (name.into(), filter));
        self
    }

    pub fn after(&mut self, existing: &str, name: impl Into<String>, filter: F) -> Result<&mut Self, PipelineError> {
        let index = self.index_of(existing)?;
        self.filters.insert(index + 1, (name.into(), filter));
        Ok(self)
    }

    pub fn before(&mut self, existing: &str, name: impl Into<String>, filter: F) -> Result<&mut Self, PipelineError> {
        let index = self.index_of(existing)?;
        self.filters.insert(index, (name.into(), filter));
        Ok(self)
    }

    pub fn replace(&mut self, existing: &str, name: impl Into<String>, filter: F) -> Result<&mut Self, PipelineError> {
        let index = self.index_of(existing)?;
        self.filters[index] = (name.into(), filter);
        Ok(self)
    }

    pub fn remove(&mut self, existing: &str) -> Result<&mut Self, PipelineError> {
        let index = self.index_of(existing)?;
        self.filters.remove(index);
        Ok(self)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Filter names in execution order.
    pub fn list(&self) -> Vec<&str> {
        self.filters.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Result<usize, PipelineError> {
        self.filters
            .iter()
            .position(|(filter, _)| filter == name)
            .ok_or_else(|| PipelineError::filter_not_found(&self.name, name))
    }

    /// Fail when a context leaves this pipe undecided with nothing queued.
    pub fn should_have_result(&mut self, enabled: bool) -> &mut Self {
        self.result_check = enabled;
        self
    }

    /// Run the filters on one context until one of them exits.
    pub fn process<C>(&self, tree: &mut ContextTree<C>, id: NodeId, options: &Options) -> Result<(), DeltaError>
    where
        C: Context,
        F: Filter<C>,
    {
        for (name, filter) in &self.filters {
            trace!(pipe = %self.name, filter = %name, "running filter");
            (*filter).call(tree, id, options)?;
            if tree.take_exiting(id) {
                break;
            }
        }

        if self.result_check && tree.next(id).is_none() && !tree.get(id).has_result() {
            return Err(PipelineError::NoResult {
                pipe: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }
}
