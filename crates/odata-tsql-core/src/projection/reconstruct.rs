//! Rebuilding nested objects from the result sets of a graph batch.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::graph::GraphQuery;
use super::{ResultSet, PATH_KEY};
use crate::error::{CompileError, Result};

/// A reconstructed row and the related rows attached under it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphResult {
    /// Component the row belongs to.
    pub component: usize,
    /// Navigation path of the component.
    pub path: String,
    /// Compressed key of the row.
    pub key: String,
    /// Column values of the row.
    pub member: Map<String, Value>,
    /// Attached rows, in attachment order.
    pub children: Vec<GraphResult>,
}

impl GraphResult {
    /// The row as a JSON object with attached rows nested under their
    /// navigation names. Every navigation of the component is present, empty
    /// when nothing was attached.
    #[must_use]
    pub fn to_json(&self, graph: &GraphQuery) -> Value {
        let mut object = self.member.clone();
        for navigation in graph.children(self.component) {
            let related: Vec<Value> = self
                .children
                .iter()
                .filter(|c| c.component == navigation.id)
                .map(|c| c.to_json(graph))
                .collect();
            object.insert(navigation.name.clone(), Value::Array(related));
        }
        Value::Object(object)
    }
}

#[derive(Debug)]
struct Slot {
    component: usize,
    key: String,
    row: usize,
    children: Vec<usize>,
}

/// Rebuilds the root results from the edges, paths and per-component result
/// sets of a batch compiled from `graph`.
///
/// A row reachable through several paths is attached once per parent and its
/// member is read from its source row only once.
///
/// # Errors
///
/// Returns [`CompileError::InvalidResult`] when the result sets do not have
/// the shape the batch produces.
pub fn reconstruct(graph: &GraphQuery, sets: &[ResultSet]) -> Result<Vec<GraphResult>> {
    let components = graph.nodes().len();
    let [edges, paths, branches @ ..] = sets else {
        return Err(CompileError::InvalidResult(format!(
            "expected {} result sets, got {}",
            components + 2,
            sets.len()
        )));
    };
    if branches.len() != components {
        return Err(CompileError::InvalidResult(format!(
            "expected {} result sets, got {}",
            components + 2,
            sets.len()
        )));
    }

    let rows = branches
        .iter()
        .enumerate()
        .map(|(component, set)| index_rows(component, set))
        .collect::<Result<Vec<_>>>()?;

    // One slot per (component, key) present in both the edges and the
    // component's own result set.
    let component_column = required_column(edges, "ComponentId", "edges")?;
    let key_column = required_column(edges, "PathKey", "edges")?;
    let mut slots: Vec<Slot> = Vec::new();
    let mut index: HashMap<(usize, String), usize> = HashMap::new();
    for edge in &edges.rows {
        let component = edge
            .get(component_column)
            .and_then(component_id)
            .filter(|c| *c < components)
            .ok_or_else(|| {
                CompileError::InvalidResult(String::from("edge with an unknown component"))
            })?;
        let Some(key) = edge.get(key_column).and_then(text) else {
            continue;
        };
        let Some(&row) = rows[component].get(&key) else {
            continue;
        };
        index.entry((component, key.clone())).or_insert_with(|| {
            slots.push(Slot {
                component,
                key,
                row,
                children: Vec::new(),
            });
            slots.len() - 1
        });
    }

    let columns = graph
        .nodes()
        .iter()
        .map(|n| required_column(paths, &n.slot(), "paths"))
        .collect::<Result<Vec<_>>>()?;
    for path in &paths.rows {
        for node in graph.nodes().iter().skip(1) {
            let Some(parent) = node.parent else {
                continue;
            };
            let parent_key = path.get(columns[parent]).and_then(text);
            let child_key = path.get(columns[node.id]).and_then(text);
            let (Some(parent_key), Some(child_key)) = (parent_key, child_key) else {
                continue;
            };
            let (Some(&parent_slot), Some(&child_slot)) = (
                index.get(&(parent, parent_key)),
                index.get(&(node.id, child_key)),
            ) else {
                continue;
            };
            let children = &mut slots[parent_slot].children;
            if !children.contains(&child_slot) {
                children.push(child_slot);
            }
        }
    }

    let mut members: Vec<Option<Map<String, Value>>> = vec![None; slots.len()];
    let roots: Vec<usize> = (0..slots.len())
        .filter(|&i| slots[i].component == GraphQuery::ROOT)
        .collect();
    let results = roots
        .into_iter()
        .map(|i| materialize(i, graph, &slots, branches, &mut members))
        .collect::<Vec<_>>();
    tracing::debug!(
        roots = results.len(),
        rows = slots.len(),
        "reconstructed graph"
    );
    Ok(results)
}

fn materialize(
    slot: usize,
    graph: &GraphQuery,
    slots: &[Slot],
    branches: &[ResultSet],
    members: &mut [Option<Map<String, Value>>],
) -> GraphResult {
    let current = &slots[slot];
    let member = members[slot]
        .get_or_insert_with(|| member_of(&branches[current.component], current.row))
        .clone();
    let children = current
        .children
        .iter()
        .map(|&child| materialize(child, graph, slots, branches, members))
        .collect();
    GraphResult {
        component: current.component,
        path: graph
            .node(current.component)
            .map(|n| n.path.clone())
            .unwrap_or_default(),
        key: current.key.clone(),
        member,
        children,
    }
}

fn member_of(set: &ResultSet, row: usize) -> Map<String, Value> {
    let mut member = Map::new();
    let Some(values) = set.rows.get(row) else {
        return member;
    };
    for (name, value) in set.columns.iter().zip(values) {
        if name.eq_ignore_ascii_case(PATH_KEY) || member.contains_key(name) {
            continue;
        }
        member.insert(name.clone(), value.clone());
    }
    member
}

/// Path key → first row holding it.
fn index_rows(component: usize, set: &ResultSet) -> Result<HashMap<String, usize>> {
    let column = set.column(PATH_KEY).ok_or_else(|| {
        CompileError::InvalidResult(format!(
            "result set of component {component} has no [{PATH_KEY}] column"
        ))
    })?;
    let mut rows = HashMap::new();
    for (i, row) in set.rows.iter().enumerate() {
        if let Some(key) = row.get(column).and_then(text) {
            rows.entry(key).or_insert(i);
        }
    }
    Ok(rows)
}

fn required_column(set: &ResultSet, name: &str, which: &str) -> Result<usize> {
    set.column(name).ok_or_else(|| {
        CompileError::InvalidResult(format!("{which} result set has no [{name}] column"))
    })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn component_id(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_member_skips_path_key() {
        let set = ResultSet::new(["__PathKey", "Id", "Name"]).row(vec![json!("1"), json!(1), json!("Ann")]);
        let member = member_of(&set, 0);
        assert_eq!(member.len(), 2);
        assert_eq!(member["Name"], json!("Ann"));
    }

    #[test]
    fn test_text_and_component_id() {
        assert_eq!(text(&json!(42)), Some(String::from("42")));
        assert_eq!(text(&Value::Null), None);
        assert_eq!(component_id(&json!("2")), Some(2));
        assert_eq!(component_id(&json!(-1)), None);
    }

    #[test]
    fn test_wrong_number_of_sets() {
        let graph = GraphQuery::new("Customers").key("Id");
        let err = reconstruct(&graph, &[ResultSet::default()]).unwrap_err();
        assert!(matches!(err, CompileError::InvalidResult(_)));
    }
}
