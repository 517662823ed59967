//! Tree traversal engine
//!
//! One walker, [`traverse`], visits every node exactly once per phase and
//! hands each visit a [`TraversalContext`] with the node's path, depth and
//! parent. Results flow bottom-up through [`Visitor::combine`].
//!
//! Every tree operation in the crate is a visitor over this walker:
//! collecting, filtering, folding and rebuilding here, and the codecs that
//! need ordered child emission.

use crate::node::{Body, ClonePolicy, Node, NodePath, Record};

/// When `visit` is called relative to a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Pre,
    Post,
    /// Twice: on the way down and on the way back up
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Exit,
}

/// Where a visited node sits in the tree
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext<'a> {
    /// Child indices from the root; empty for the root itself
    pub path: &'a [usize],
    pub depth: usize,
    pub parent: Option<&'a Node>,
    pub phase: Phase,
}

impl TraversalContext<'_> {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

pub trait Visitor {
    type Output;

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) -> Self::Output;

    /// Merge a node's own result with its children's, in child order.
    ///
    /// `own` comes from the enter visit under [`Order::Pre`] and from the
    /// exit visit otherwise. The default keeps `own` and drops the rest.
    fn combine(
        &mut self,
        node: &Node,
        ctx: &TraversalContext<'_>,
        own: Self::Output,
        children: Vec<Self::Output>,
    ) -> Self::Output {
        let _ = (node, ctx, children);
        own
    }
}

/// Walk `root` depth-first, calling `visitor` per `order`.
///
/// A record whose text was collapsed into its body has no `Value` child;
/// visitors read that text through [`Record::text`].
pub fn traverse<V: Visitor>(root: &Node, visitor: &mut V, order: Order) -> V::Output {
    let mut path = Vec::new();
    walk(root, None, &mut path, visitor, order)
}

fn walk<'n, V: Visitor>(
    node: &'n Node,
    parent: Option<&'n Node>,
    path: &mut NodePath,
    visitor: &mut V,
    order: Order,
) -> V::Output {
    let depth = path.len();

    let entered = match order {
        Order::Pre | Order::Both => {
            let ctx = TraversalContext { path: path.as_slice(), depth, parent, phase: Phase::Enter };
            Some(visitor.visit(node, &ctx))
        }
        Order::Post => None,
    };

    let mut results = Vec::with_capacity(node.children().len());
    for (index, child) in node.children().iter().enumerate() {
        path.push(index);
        results.push(walk(child, Some(node), path, visitor, order));
        path.pop();
    }

    let ctx = TraversalContext { path: path.as_slice(), depth, parent, phase: Phase::Exit };
    let own = match entered {
        Some(result) if order == Order::Pre => result,
        _ => visitor.visit(node, &ctx),
    };
    visitor.combine(node, &ctx, own, results)
}

/// A node handed out of the tree: an Output-policy clone plus its position
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub node: Node,
    pub path: NodePath,
    pub depth: usize,
}

struct Collector<F> {
    predicate: F,
    found: Vec<Located>,
}

impl<F: FnMut(&Node, &TraversalContext<'_>) -> bool> Visitor for Collector<F> {
    type Output = ();

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) {
        if (self.predicate)(node, ctx) {
            self.found.push(Located {
                node: ClonePolicy::Output.apply(node),
                path: ctx.path.to_vec(),
                depth: ctx.depth,
            });
        }
    }
}

/// Every node matching `predicate`, in document order
pub fn collect<F>(root: &Node, predicate: F) -> Vec<Located>
where
    F: FnMut(&Node, &TraversalContext<'_>) -> bool,
{
    let mut collector = Collector { predicate, found: Vec::new() };
    traverse(root, &mut collector, Order::Pre);
    collector.found
}

struct Reducer<T, F> {
    acc: T,
    f: F,
}

impl<T, F: FnMut(&mut T, &Node, &TraversalContext<'_>)> Visitor for Reducer<T, F> {
    type Output = ();

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) {
        (self.f)(&mut self.acc, node, ctx);
    }
}

/// Fold over every node in pre-order
pub fn reduce<T, F>(root: &Node, init: T, f: F) -> T
where
    F: FnMut(&mut T, &Node, &TraversalContext<'_>),
{
    let mut reducer = Reducer { acc: init, f };
    traverse(root, &mut reducer, Order::Pre);
    reducer.acc
}

/// A copy of `node` without its children; attributes and a text body stay
pub(crate) fn detach(node: &Node) -> Node {
    match node {
        Node::Collection(c) => Node::collection(&c.name, Vec::new()),
        Node::Record(r) => Node::Record(Record {
            body: match &r.body {
                Body::Text(value) => Body::Text(value.clone()),
                Body::Children(_) => Body::Children(Vec::new()),
            },
            name: r.name.clone(),
            namespace: r.namespace.clone(),
            label: r.label.clone(),
            namespaces: r.namespaces.clone(),
            attributes: r.attributes.clone(),
        }),
        leaf => leaf.clone(),
    }
}

struct Filter<F> {
    predicate: F,
}

impl<F: FnMut(&Node, &TraversalContext<'_>) -> bool> Visitor for Filter<F> {
    type Output = Option<Node>;

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) -> Option<Node> {
        (self.predicate)(node, ctx).then(|| detach(node))
    }

    fn combine(
        &mut self,
        node: &Node,
        _ctx: &TraversalContext<'_>,
        own: Option<Node>,
        children: Vec<Option<Node>>,
    ) -> Option<Node> {
        let kept: Vec<Node> = children.into_iter().flatten().collect();
        let mut rebuilt = match own {
            Some(matched) => matched,
            None if !kept.is_empty() => detach(node),
            None => return None,
        };
        if !kept.is_empty() {
            rebuilt.set_children(kept);
        }
        Some(rebuilt)
    }
}

/// Keep nodes matching `predicate` and every ancestor of a kept node.
///
/// The result is built from fresh copies; nothing is shared with `root`.
pub fn filter<F>(root: &Node, predicate: F) -> Option<Node>
where
    F: FnMut(&Node, &TraversalContext<'_>) -> bool,
{
    traverse(root, &mut Filter { predicate }, Order::Post)
}

/// Decision returned by a [`transform`] callback
#[derive(Debug, Clone, PartialEq)]
pub enum TransformAction {
    /// Keep the node, with its transformed children
    Keep,
    /// Substitute this subtree as given
    Replace(Node),
    /// Substitute the node's own fields, keeping its transformed children
    Update(Node),
    /// Drop the node and its subtree
    Remove,
    /// Drop the node but promote its transformed children into its parent
    Flatten,
}

enum Rebuilt {
    Action(TransformAction),
    Nodes(Vec<Node>),
}

struct Transformer<F> {
    f: F,
}

impl<F: FnMut(&Node, &TraversalContext<'_>) -> TransformAction> Visitor for Transformer<F> {
    type Output = Rebuilt;

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) -> Rebuilt {
        Rebuilt::Action((self.f)(node, ctx))
    }

    fn combine(
        &mut self,
        node: &Node,
        ctx: &TraversalContext<'_>,
        own: Rebuilt,
        children: Vec<Rebuilt>,
    ) -> Rebuilt {
        let children: Vec<Node> = children
            .into_iter()
            .flat_map(|child| match child {
                Rebuilt::Nodes(nodes) => nodes,
                Rebuilt::Action(_) => Vec::new(),
            })
            .collect();

        let action = match own {
            Rebuilt::Action(action) => action,
            nodes @ Rebuilt::Nodes(_) => return nodes,
        };

        let with_children = |mut rebuilt: Node, children: Vec<Node>| {
            if !children.is_empty() {
                rebuilt.set_children(children);
            }
            rebuilt
        };

        match action {
            TransformAction::Keep => Rebuilt::Nodes(vec![with_children(detach(node), children)]),
            // The root has no parent to flatten into
            TransformAction::Flatten if ctx.is_root() => {
                Rebuilt::Nodes(vec![with_children(detach(node), children)])
            }
            TransformAction::Replace(replacement) => Rebuilt::Nodes(vec![replacement]),
            TransformAction::Update(updated) => Rebuilt::Nodes(vec![with_children(updated, children)]),
            TransformAction::Remove => Rebuilt::Nodes(Vec::new()),
            // Collapsed text is promoted the same as a text child
            TransformAction::Flatten => match detach(node) {
                Node::Record(mut record) if children.is_empty() => Rebuilt::Nodes(record.take_children()),
                _ => Rebuilt::Nodes(children),
            },
        }
    }
}

/// Rebuild the tree bottom-up, letting `f` decide each node's fate.
///
/// `f` sees the original node. The input is never modified; the result is
/// a new tree, or `None` if the root was removed.
pub fn transform<F>(root: &Node, f: F) -> Option<Node>
where
    F: FnMut(&Node, &TraversalContext<'_>) -> TransformAction,
{
    match traverse(root, &mut Transformer { f }, Order::Post) {
        Rebuilt::Nodes(mut nodes) => nodes.pop(),
        Rebuilt::Action(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Primitive;

    fn sample() -> Node {
        Node::record("library")
            .with_child(
                Node::record("book")
                    .with_attribute("id", "1")
                    .with_child(Node::record("title").with_text("Dune"))
                    .with_child(Node::comment("classic")),
            )
            .with_child(Node::record("book").with_child(Node::record("title").with_text("Emma")))
            .into()
    }

    struct Recorder {
        events: Vec<(String, Phase, NodePath)>,
    }

    impl Visitor for Recorder {
        type Output = ();

        fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) {
            self.events.push((node.name().to_string(), ctx.phase, ctx.path.to_vec()));
        }
    }

    #[test]
    fn test_orders() {
        let tree = sample();

        let mut pre = Recorder { events: Vec::new() };
        traverse(&tree, &mut pre, Order::Pre);
        let names: Vec<&str> = pre.events.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, ["library", "book", "title", "#comment", "book", "title"]);

        let mut post = Recorder { events: Vec::new() };
        traverse(&tree, &mut post, Order::Post);
        let names: Vec<&str> = post.events.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, ["title", "#comment", "book", "title", "book", "library"]);

        let mut both = Recorder { events: Vec::new() };
        traverse(&tree, &mut both, Order::Both);
        assert_eq!(both.events.len(), 12);
        assert_eq!(both.events[0].1, Phase::Enter);
        assert_eq!(both.events[11], ("library".to_string(), Phase::Exit, vec![]));
    }

    #[test]
    fn test_paths_and_parents() {
        let tree = sample();
        let found = collect(&tree, |node, ctx| {
            node.name() == "title" && ctx.parent.map(Node::name) == Some("book")
        });
        let paths: Vec<NodePath> = found.iter().map(|l| l.path.clone()).collect();
        assert_eq!(paths, vec![vec![0, 0], vec![1, 0]]);
        assert_eq!(found[0].depth, 2);
        assert_eq!(tree.at(&found[1].path).map(Node::name), Some("title"));
    }

    #[test]
    fn test_collect_returns_detached_copies() {
        let tree = sample();
        let found = collect(&tree, |node, _| node.name() == "book");
        assert_eq!(found.len(), 2);
        assert!(found[0].node.children().is_empty());
        assert_eq!(tree.at(&[0]).unwrap().children().len(), 2);
    }

    #[test]
    fn test_reduce_counts() {
        let count = reduce(&sample(), 0usize, |count, _, _| *count += 1);
        assert_eq!(count, 6);
        let deepest = reduce(&sample(), 0usize, |max, _, ctx| *max = (*max).max(ctx.depth));
        assert_eq!(deepest, 2);
    }

    #[test]
    fn test_filter_keeps_ancestors() {
        let tree = sample();
        let kept = filter(&tree, |node, _| {
            node.as_record().and_then(|r| r.text()) == Some(&Primitive::from("Emma"))
        })
        .unwrap();

        assert_eq!(kept.children().len(), 1);
        let book = &kept.children()[0];
        assert_eq!(book.children().len(), 1);
        assert_eq!(book.children()[0].as_record().unwrap().text(), Some(&Primitive::from("Emma")));

        assert!(filter(&tree, |node, _| node.name() == "missing").is_none());
    }

    #[test]
    fn test_filter_keeps_matched_node_attributes() {
        let kept = filter(&sample(), |node, _| node.attributes().len() == 1).unwrap();
        let book = &kept.children()[0];
        assert_eq!(book.attributes().len(), 1);
        assert!(book.children().is_empty());
    }

    #[test]
    fn test_transform_actions() {
        let tree = sample();
        let out = transform(&tree, |node, _| match node {
            Node::Comment(_) => TransformAction::Remove,
            Node::Record(r) if r.name == "book" => TransformAction::Flatten,
            Node::Record(r) if r.name == "title" => {
                TransformAction::Update(Node::record("name").with_text(r.text().cloned().unwrap_or(Primitive::Null)).into())
            }
            _ => TransformAction::Keep,
        })
        .unwrap();

        let names: Vec<&str> = out.children().iter().map(Node::name).collect();
        assert_eq!(names, ["name", "name"]);
        // The input is untouched
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_transform_remove_root() {
        assert!(transform(&sample(), |_, _| TransformAction::Remove).is_none());
        let kept = transform(&sample(), |_, _| TransformAction::Flatten).unwrap();
        assert_eq!(kept.name(), "library");
        let texts = [Node::Value(Primitive::from("Dune")), Node::Value(Primitive::from("Emma"))];
        assert_eq!(kept.children(), &texts);
    }

    #[test]
    fn test_flatten_promotes_collapsed_text() {
        let collapsed: Node = Node::record("r").with_child(Node::record("w").with_text("text")).into();
        let separate: Node = Node::record("r")
            .with_child(
                Node::record("w")
                    .with_child(Node::Value(Primitive::from("text")))
                    .with_child(Node::comment("c")),
            )
            .into();

        let flatten_w = |node: &Node, _: &TraversalContext<'_>| match node {
            Node::Record(r) if r.name == "w" => TransformAction::Flatten,
            Node::Comment(_) => TransformAction::Remove,
            _ => TransformAction::Keep,
        };
        let expected = [Node::Value(Primitive::from("text"))];
        assert_eq!(transform(&collapsed, flatten_w).unwrap().children(), &expected);
        assert_eq!(transform(&separate, flatten_w).unwrap().children(), &expected);
    }
}
