//! Per-call conversion state
//!
//! A `ConversionContext` is created fresh for every top-level conversion and
//! threaded through the recursive descent. Namespace bindings form a scope:
//! they are pushed on the way down and popped on the way back up.

use crate::node::{NamespaceDecl, NodePath};

/// URI permanently bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug)]
pub struct ConversionContext {
    scopes: Vec<Vec<NamespaceDecl>>,
    path: NodePath,
    depth: usize,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionContext {
    pub fn new() -> Self {
        ConversionContext {
            scopes: vec![vec![NamespaceDecl::new(Some("xml"), XML_NAMESPACE)]],
            path: Vec::new(),
            depth: 0,
        }
    }

    /// Run `f` one level down, at child `index`, with `decls` in scope.
    /// The scope and path are restored when `f` returns, whatever it returns.
    pub fn descend<T>(
        &mut self,
        index: usize,
        decls: &[NamespaceDecl],
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.enter(index, decls);
        let result = f(self);
        self.leave();
        result
    }

    /// Move down to child `index` with `decls` in scope. Every call must be
    /// paired with [`leave`](Self::leave).
    pub fn enter(&mut self, index: usize, decls: &[NamespaceDecl]) {
        self.scopes.push(decls.to_vec());
        self.path.push(index);
        self.depth += 1;
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.path.pop();
        // The outermost scope holds the `xml` binding and is never popped
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Run `f` with extra declarations in scope, without moving down.
    pub fn with_scope<T>(&mut self, decls: &[NamespaceDecl], f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(decls.to_vec());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// URI bound to `prefix` (`None` for the default namespace).
    /// An empty default binding (`xmlns=""`) resolves to `None`.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Whether `prefix` is currently bound to exactly `uri`
    pub fn is_bound(&self, prefix: Option<&str>, uri: &str) -> bool {
        match self.resolve(prefix) {
            Some(bound) => bound == uri,
            None => uri.is_empty(),
        }
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
