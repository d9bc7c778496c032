//! Recording of the injected object graph.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock};

use wired_core::TypeKey;

/// A type that went through field injection.
#[derive(Debug, Clone)]
struct Node {
    owner: TypeKey,
    fields: Vec<(&'static str, &'static str)>,
    // Field index -> resolved type.
    edges: BTreeMap<usize, TypeKey>,
}

/// A resolved field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub owner: TypeKey,
    pub field: usize,
    pub target: TypeKey,
}

/// Append-only record of injected fields, rendered as a Graphviz `digraph`.
///
/// Nodes are keyed by type identity. Names are only used for ordering and rendering.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: RwLock<BTreeMap<TypeId, Node>>,
}

impl Graph {
    pub const fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds the node of an owner type, listing its fields as `(name, type)`.
    ///
    /// The first call for a type wins.
    pub fn add_node(&self, owner: TypeKey, fields: Vec<(&'static str, &'static str)>) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        nodes.entry(owner.id()).or_insert_with(|| Node {
            owner,
            fields,
            edges: BTreeMap::new(),
        });
    }

    /// Records that field `field` of `owner` was resolved to `target`.
    ///
    /// Returns `false` if the owner has no node.
    pub fn add_edge(&self, owner: TypeKey, field: usize, target: TypeKey) -> bool {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        nodes.get_mut(&owner.id()).is_some_and(|node| {
            node.edges.insert(field, target);
            true
        })
    }

    /// Returns every recorded edge, ordered by owner name then field.
    pub fn edges(&self) -> Vec<Edge> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        sorted(&nodes)
            .into_iter()
            .flat_map(|node| {
                node.edges.iter().map(move |(&field, &target)| Edge {
                    owner: node.owner,
                    field,
                    target,
                })
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.values().map(|node| node.edges.len()).sum()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Renders the graph in the DOT language.
    ///
    /// Each owner is an HTML table whose header cell has port `type` and whose field rows
    /// have ports `f0`, `f1`, ... in declaration order. Each edge goes from a field row to
    /// the header of the resolved type.
    pub fn render(&self) -> String {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        let sorted = sorted(&nodes);
        let mut out = String::from("digraph {\n  rankdir=LR;\n");

        for node in &sorted {
            let owner = node.owner.name();
            let _ = write!(
                out,
                "  \"{}\" [\n    shape=none\n    label=<<table border=\"1\" cellborder=\"1\" cellspacing=\"0\"><tr><td port=\"type\"><b>{}</b></td></tr>",
                escape_id(owner),
                escape_html(owner)
            );
            for (index, (name, ty)) in node.fields.iter().enumerate() {
                let _ = write!(
                    out,
                    "<tr><td port=\"f{index}\">{} {}</td></tr>",
                    escape_html(name),
                    escape_html(ty)
                );
            }
            out.push_str("</table>>\n  ];\n");
        }

        for node in &sorted {
            for (field, target) in &node.edges {
                let target_port = if nodes.contains_key(&target.id()) { ":type" } else { "" };
                let _ = writeln!(
                    out,
                    "  \"{}\":f{field} -> \"{}\"{target_port};",
                    escape_id(node.owner.name()),
                    escape_id(target.name())
                );
            }
        }

        out.push_str("}\n");
        out
    }
}

fn sorted(nodes: &BTreeMap<TypeId, Node>) -> Vec<&Node> {
    let mut sorted: Vec<&Node> = nodes.values().collect();
    sorted.sort_by_key(|node| node.owner.name());
    sorted
}

fn escape_id(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
