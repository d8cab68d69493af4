//! Evaluation of compiled paths against a document

use super::compile::{Axis, CompiledPath, Expr, NodeTest, Predicate, Step};
use std::collections::{HashMap, HashSet};
use viewcompose_parser::{Document, NodeId, NodeKind};

/// Reusable buffers for one evaluation
///
/// Owned by a cached path and reused across calls, which is why evaluation
/// of one cached path is serialized.
#[derive(Debug, Default)]
pub struct EvalScratch {
    current: Vec<NodeId>,
    next: Vec<NodeId>,
    candidates: Vec<NodeId>,
}

impl CompiledPath {
    /// All matches in document order
    pub fn select(&self, doc: &Document, context: NodeId, scratch: &mut EvalScratch) -> Vec<NodeId> {
        let EvalScratch {
            current,
            next,
            candidates,
        } = scratch;

        current.clear();
        current.push(if self.absolute { doc.root() } else { context });

        let mut order: Option<HashMap<NodeId, usize>> = None;

        for step in &self.steps {
            next.clear();
            for &node in current.iter() {
                candidates.clear();
                collect_axis(doc, step, node, candidates);
                apply_predicates(doc, &step.predicates, candidates);
                next.extend(candidates.iter().copied());
            }

            if current.len() > 1 && next.len() > 1 {
                let order = order.get_or_insert_with(|| {
                    doc.document_order()
                        .into_iter()
                        .enumerate()
                        .map(|(i, id)| (id, i))
                        .collect()
                });
                let mut seen = HashSet::with_capacity(next.len());
                next.retain(|id| seen.insert(*id));
                next.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
            }

            std::mem::swap(current, next);
            if current.is_empty() {
                break;
            }
        }

        current.clone()
    }

    /// First match in document order
    pub fn select_first(
        &self,
        doc: &Document,
        context: NodeId,
        scratch: &mut EvalScratch,
    ) -> Option<NodeId> {
        self.select(doc, context, scratch).into_iter().next()
    }
}

fn collect_axis(doc: &Document, step: &Step, node: NodeId, out: &mut Vec<NodeId>) {
    match step.axis {
        Axis::Child => out.extend(
            doc.children(node)
                .iter()
                .copied()
                .filter(|&c| matches_test(doc, &step.test, c)),
        ),
        Axis::SelfNode => {
            if matches_test(doc, &step.test, node) {
                out.push(node);
            }
        }
        Axis::Parent => {
            if let Some(parent) = doc.parent(node) {
                if matches_test(doc, &step.test, parent) {
                    out.push(parent);
                }
            }
        }
        Axis::DescendantOrSelf => {
            if matches_test(doc, &step.test, node) {
                out.push(node);
            }
            out.extend(
                doc.descendants(node)
                    .into_iter()
                    .filter(|&c| matches_test(doc, &step.test, c)),
            );
        }
    }
}

fn matches_test(doc: &Document, test: &NodeTest, node: NodeId) -> bool {
    match (test, doc.kind(node)) {
        (NodeTest::AnyNode, _) => true,
        (NodeTest::AnyElement, NodeKind::Element { .. }) => true,
        (NodeTest::Name(name), NodeKind::Element { tag, .. }) => tag == name,
        (NodeTest::Text, NodeKind::Text { .. } | NodeKind::CData { .. }) => true,
        _ => false,
    }
}

fn apply_predicates(doc: &Document, predicates: &[Predicate], candidates: &mut Vec<NodeId>) {
    for predicate in predicates {
        let size = candidates.len();
        let mut position = 0;
        candidates.retain(|&node| {
            position += 1;
            match predicate {
                Predicate::Position(n) => position == *n,
                Predicate::Last => position == size,
                Predicate::Expr(expr) => eval_expr(doc, expr, node),
            }
        });
    }
}

fn eval_expr(doc: &Document, expr: &Expr, node: NodeId) -> bool {
    match expr {
        Expr::HasAttribute(name) => doc.attribute(node, name).is_some(),
        Expr::AttributeEquals(name, value) => doc.attribute(node, name) == Some(value.as_str()),
        // Like XPath, a missing attribute compares unequal to nothing
        Expr::AttributeNotEquals(name, value) => doc
            .attribute(node, name)
            .map_or(false, |actual| actual != value),
        Expr::Contains(name, value) => doc
            .attribute(node, name)
            .map_or(false, |actual| actual.contains(value.as_str())),
        Expr::StartsWith(name, value) => doc
            .attribute(node, name)
            .map_or(false, |actual| actual.starts_with(value.as_str())),
        Expr::Not(inner) => !eval_expr(doc, inner, node),
        Expr::And(left, right) => eval_expr(doc, left, node) && eval_expr(doc, right, node),
        Expr::Or(left, right) => eval_expr(doc, left, node) || eval_expr(doc, right, node),
    }
}
