use serde_json::Value;
use tracing::debug;

use crate::{
    context::{DiffContext, PatchContext, ReverseContext},
    delta::Delta,
    error::DeltaError,
    filters::{arrays, dates, nested, texts, trivial},
    options::Options,
    pipeline::{ContextTree, DiffFilter, PatchFilter, Pipe, PipelineError, Pipelines, ReverseFilter},
};

/// Computes, applies and reverses deltas with one set of [`Options`].
///
/// ```
/// use deltapatch::{DiffPatcher, Options};
/// use serde_json::json;
///
/// let patcher = DiffPatcher::new(Options::default());
/// let left = json!({"name": "deltapatch", "tags": ["json", "diff"]});
/// let right = json!({"name": "deltapatch", "tags": ["diff", "json", "patch"]});
///
/// let delta = patcher.diff(&left, &right).unwrap().unwrap();
/// assert_eq!(patcher.patch(left.clone(), &delta).unwrap(), right);
/// assert_eq!(patcher.unpatch(right, &delta).unwrap(), left);
/// ```
#[derive(Debug, Clone)]
pub struct DiffPatcher {
    options: Options,
    pipelines: Pipelines,
}

impl Default for DiffPatcher {
    fn default() -> Self {
        DiffPatcher::new(Options::default())
    }
}

impl DiffPatcher {
    pub fn new(options: Options) -> Self {
        DiffPatcher {
            options,
            pipelines: default_pipelines(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    /// Pipe registration, for adding or replacing filters.
    pub fn pipelines_mut(&mut self) -> &mut Pipelines {
        &mut self.pipelines
    }

    /// The delta turning `left` into `right`, or `None` when they are the same.
    pub fn diff(&self, left: &Value, right: &Value) -> Result<Option<Delta>, DeltaError> {
        debug!("diff");
        let mut tree = ContextTree::new(DiffContext::new(Some(left), Some(right)));
        self.pipelines.diff.process(&mut tree, None, &self.options)?;
        debug!(contexts = tree.len(), "diff done");
        Ok(tree.into_root().take_result())
    }

    /// Apply `delta` to `left`, reusing its allocation. A delta that deletes
    /// the root value produces `null`.
    pub fn patch(&self, left: Value, delta: &Delta) -> Result<Value, DeltaError> {
        debug!(delta = delta.kind(), "patch");
        let mut tree = ContextTree::new(PatchContext::new(Some(left), delta));
        self.pipelines.patch.process(&mut tree, None, &self.options)?;
        Ok(tree.into_root().take_result().unwrap_or(Value::Null))
    }

    /// Like [`DiffPatcher::patch`], leaving `left` untouched.
    pub fn patch_cloned(&self, left: &Value, delta: &Delta) -> Result<Value, DeltaError> {
        self.patch(self.clone_value(left), delta)
    }

    /// The delta that undoes `delta`.
    pub fn reverse(&self, delta: &Delta) -> Result<Delta, DeltaError> {
        debug!(delta = delta.kind(), "reverse");
        let mut tree = ContextTree::new(ReverseContext::new(delta));
        self.pipelines.reverse.process(&mut tree, None, &self.options)?;
        tree.into_root().take_result().ok_or_else(|| {
            PipelineError::NoResult {
                pipe: "reverse".to_string(),
            }
            .into()
        })
    }

    /// Apply `delta` backwards, turning its right-hand value into the left.
    pub fn unpatch(&self, right: Value, delta: &Delta) -> Result<Value, DeltaError> {
        let reversed = self.reverse(delta)?;
        self.patch(right, &reversed)
    }

    pub fn clone_value(&self, value: &Value) -> Value {
        value.clone()
    }
}

fn default_pipelines() -> Pipelines {
    let mut pipelines = Pipelines::default();

    let mut diff: Pipe<DiffFilter> = Pipe::new("diff");
    diff.append("collectChildren", nested::collect_children_diff_filter)
        .append("trivial", trivial::diff_filter)
        .append("dates", dates::diff_filter)
        .append("texts", texts::diff_filter)
        .append("objects", nested::diff_filter)
        .append("arrays", arrays::diff_filter)
        .should_have_result(true);
    pipelines.diff.register(diff);

    let mut patch: Pipe<PatchFilter> = Pipe::new("patch");
    patch
        .append("collectChildren", nested::collect_children_patch_filter)
        .append("arraysCollectChildren", arrays::collect_children_patch_filter)
        .append("trivial", trivial::patch_filter)
        .append("texts", texts::patch_filter)
        .append("objects", nested::patch_filter)
        .append("arrays", arrays::patch_filter)
        .should_have_result(true);
    pipelines.patch.register(patch);

    let mut reverse: Pipe<ReverseFilter> = Pipe::new("reverse");
    reverse
        .append("collectChildren", nested::collect_children_reverse_filter)
        .append("arraysCollectChildren", arrays::collect_children_reverse_filter)
        .append("trivial", trivial::reverse_filter)
        .append("texts", texts::reverse_filter)
        .append("objects", nested::reverse_filter)
        .append("arrays", arrays::reverse_filter)
        .should_have_result(true);
    pipelines.reverse.register(reverse);

    pipelines
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::{delta::ArrayKey, test_util::Scenario};

    fn round_trip(patcher: &DiffPatcher, left: &Value, right: &Value) -> Option<Delta> {
        let_assert!(Ok(delta) = patcher.diff(left, right));
        match &delta {
            Some(delta) => {
                check!(patcher.patch_cloned(left, delta).as_ref() == Ok(right));
                check!(patcher.unpatch(right.clone(), delta).as_ref() == Ok(left));
            }
            None => {
                check!(left == right);
            }
        }
        delta
    }

    #[test]
    fn default_pipes_are_registered_in_order() {
        let patcher = DiffPatcher::default();
        let_assert!(Ok(diff) = patcher.pipelines().diff.pipe("diff"));
        check!(diff.list() == vec!["collectChildren", "trivial", "dates", "texts", "objects", "arrays"]);
        let_assert!(Ok(patch) = patcher.pipelines().patch.pipe("patch"));
        check!(
            patch.list()
                == vec!["collectChildren", "arraysCollectChildren", "trivial", "texts", "objects", "arrays"]
        );
        let_assert!(Ok(reverse) = patcher.pipelines().reverse.pipe("reverse"));
        check!(reverse.list().len() == 6);
    }

    #[test]
    fn seed_scenarios() {
        let patcher = DiffPatcher::default();
        check!(round_trip(&patcher, &json!({"a": 1}), &json!({"a": 1})) == None);

        let_assert!(Some(delta) = round_trip(&patcher, &json!({"a": 1}), &json!({"a": 2})));
        check!(delta.to_value() == json!({"a": [1, 2]}));

        let_assert!(Some(delta) = round_trip(&patcher, &json!({"a": 1}), &json!({})));
        check!(delta.to_value() == json!({"a": [1, 0, 0]}));

        let_assert!(Some(delta) = round_trip(&patcher, &json!([1, 2, 3]), &json!([1, 3])));
        check!(delta.to_value() == json!({"_t": "a", "_1": [2, 0, 0]}));

        let by_value = DiffPatcher::new(Options::default().with_object_hash(|value, _| Some(value.to_string())));
        let_assert!(Some(delta) = round_trip(&by_value, &json!([1, 2, 3]), &json!([2, 3, 1])));
        check!(delta.to_value() == json!({"_t": "a", "_0": ["", 2, 3]}));

        let left = json!("short string A");
        let right = json!("short string B");
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        let_assert!(Ok(reversed) = patcher.reverse(&delta));
        check!(patcher.patch(right, &reversed) == Ok(left));
    }

    #[test]
    fn moves_carry_nested_changes() {
        let patcher = DiffPatcher::new(Options::default().with_object_hash_key("id"));
        let left = json!([{"id": 1, "v": "a"}, {"id": 2, "v": "b"}, {"id": 3, "v": "c"}]);
        let right = json!([{"id": 3, "v": "c"}, {"id": 1, "v": "a"}, {"id": 2, "v": "B"}]);
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        check!(
            delta.to_value()
                == json!({
                    "_t": "a",
                    "_2": ["", 0, 3],
                    "2": {"v": ["b", "B"]}
                })
        );
    }

    #[test]
    fn include_value_on_move_embeds_the_element() {
        let patcher = DiffPatcher::new(Options::default().include_value_on_move(true));
        let left = json!([1, 2, 3]);
        let right = json!([3, 1, 2]);
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        check!(delta.to_value() == json!({"_t": "a", "_2": [3, 0, 3]}));
    }

    #[test]
    fn disabling_move_detection_keeps_removal_and_addition() {
        let patcher = DiffPatcher::new(Options::default().detect_move(false));
        let_assert!(Some(delta) = round_trip(&patcher, &json!([1, 2, 3]), &json!([3, 1, 2])));
        check!(delta.to_value() == json!({"_t": "a", "0": [3], "_2": [3, 0, 0]}));
    }

    #[test]
    fn match_by_position_heuristic() {
        let patcher = DiffPatcher::default();

        // No element is shared, so objects at the same index are the same item.
        let_assert!(Some(delta) = round_trip(&patcher, &json!([{"a": 1}, {"a": 2}]), &json!([{"a": 1}, {"a": 3}])));
        check!(delta.to_value() == json!({"_t": "a", "1": {"a": [2, 3]}}));

        // A shared primitive turns positional matching off; the objects are
        // then replaced instead of diffed.
        let left = json!([1, {"a": 2}, 5]);
        let right = json!([5, {"a": 3}, 1]);
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        let_assert!(Delta::Array(entries) = &delta);
        check!(entries.get(&ArrayKey::Left(1)) == Some(&Delta::Deleted(json!({"a": 2}))));
        check!(entries.get(&ArrayKey::Right(1)) == Some(&Delta::Added(json!({"a": 3}))));
    }

    #[test]
    fn nested_structures() {
        let patcher = DiffPatcher::default();
        let left = json!({
            "title": "report",
            "owner": {"name": "Ana", "roles": ["admin", "dev"]},
            "rows": [[1, 2], [3, 4]],
            "obsolete": true
        });
        let right = json!({
            "title": "report",
            "owner": {"name": "Ana", "roles": ["dev"], "email": "ana@example.com"},
            "rows": [[1, 2], [3, 5], [6]],
            "flag": null
        });
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        check!(
            delta.to_value()
                == json!({
                    "owner": {
                        "roles": {"_t": "a", "_0": ["admin", 0, 0]},
                        "email": ["ana@example.com"]
                    },
                    "rows": {
                        "_t": "a",
                        "1": {"_t": "a", "_1": [4, 0, 0], "1": [5]},
                        "2": [[6]]
                    },
                    "obsolete": [true, 0, 0],
                    "flag": [null]
                })
        );
    }

    #[test]
    fn root_values() {
        let patcher = DiffPatcher::default();
        check!(round_trip(&patcher, &json!(null), &json!(null)) == None);
        let_assert!(Some(delta) = round_trip(&patcher, &json!(1), &json!({"a": 1})));
        check!(delta == Delta::Modified(json!(1), json!({"a": 1})));
        check!(patcher.patch(json!(1), &Delta::Deleted(json!(1))) == Ok(Value::Null));
        check!(round_trip(&patcher, &json!([]), &json!([])) == None);
        let_assert!(Some(_) = round_trip(&patcher, &json!([]), &json!([1, 2])));
        let_assert!(Some(_) = round_trip(&patcher, &json!([1, 2]), &json!([])));
    }

    #[test]
    fn timestamps_keep_their_spelling() {
        let patcher = DiffPatcher::default();
        let left = json!({"at": "2024-01-01T10:00:00Z"});
        let right = json!({"at": "2024-01-01T12:00:00+02:00"});
        let_assert!(Some(delta) = round_trip(&patcher, &left, &right));
        check!(delta.to_value() == json!({"at": ["2024-01-01T10:00:00Z", "2024-01-01T12:00:00+02:00"]}));
    }

    #[test]
    fn patch_errors() {
        let patcher = DiffPatcher::default();
        let removal_of_added = Delta::Array(BTreeMap::from([(ArrayKey::Left(0), Delta::Added(json!(1)))]));
        let_assert!(
            Err(DeltaError::InvalidArrayPatch { index: 0, found: "added" }) =
                patcher.patch(json!([1]), &removal_of_added)
        );

        let out_of_range = Delta::Array(BTreeMap::from([(ArrayKey::Left(5), Delta::Deleted(json!(1)))]));
        let_assert!(Err(DeltaError::IndexOutOfBounds { index: 5, len: 1 }) = patcher.patch(json!([1]), &out_of_range));

        let object_delta = Delta::Object(BTreeMap::from([("a".to_string(), Delta::Added(json!(1)))]));
        let_assert!(Err(DeltaError::TypeMismatch { .. }) = patcher.patch(json!("text"), &object_delta));

        let stray_move = Delta::Moved { value: None, to: 1 };
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = patcher.patch(json!(1), &stray_move));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = patcher.reverse(&stray_move));
    }

    #[test]
    fn property_filter_and_clone_values() {
        let options = Options::default()
            .with_property_filter(|name, _| !name.starts_with('_'))
            .with_clone_diff_values(|value| json!({"copy": value}));
        let patcher = DiffPatcher::new(options);
        let_assert!(Ok(Some(delta)) = patcher.diff(&json!({"_hidden": 1, "a": {}}), &json!({"_hidden": 2})));
        check!(delta.to_value() == json!({"a": [{"copy": {}}, 0, 0]}));
    }

    #[test]
    fn fixture_scenarios() {
        for scenario in Scenario::all() {
            let patcher = DiffPatcher::new(scenario.options());
            let_assert!(Ok(delta) = patcher.diff(&scenario.left, &scenario.right), "{}", scenario.name);
            check!(delta.as_ref().map(Delta::to_value) == scenario.delta, "{}", scenario.name);
            if let Some(delta) = delta {
                check!(patcher.patch_cloned(&scenario.left, &delta).as_ref() == Ok(&scenario.right), "{}", scenario.name);
                check!(patcher.unpatch(scenario.right.clone(), &delta).as_ref() == Ok(&scenario.left), "{}", scenario.name);
            }
        }
    }
}
