//! Lowering from `Expr` to typed IR `Node`s.
//!
//! Every `lower_*` method returns `None` after reporting at least one
//! diagnostic (or after running out of recursion fuel). Siblings are still
//! lowered so that independent errors are all reported.

use pfa_core::{AvroType, Value, accepts, least_upper_bound};
use pfa_ir::{
    Assign, CallNode, CellId, Library, Node, NodeKind, PathStep, PoolId, Purity, ResolveError,
    resolve,
};

use crate::ast::{Document, Expr, NewInit};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Pos};

use super::scope::Scopes;

pub(super) struct Lowering<'a> {
    library: &'a Library,
    doc: &'a Document,
    pub(super) diagnostics: Diagnostics,
    pub(super) scopes: Scopes,
    depth: u32,
    max_depth: u32,
    /// Set once nesting exceeds `max_depth`; compilation then aborts.
    pub(super) exhausted: bool,
    /// Touches cells, pools or the RNG.
    pub(super) stateful: bool,
}

impl<'a> Lowering<'a> {
    pub fn new(library: &'a Library, doc: &'a Document, max_depth: u32) -> Self {
        Self {
            library,
            doc,
            diagnostics: Diagnostics::new(),
            scopes: Scopes::with_input(doc.input.clone()),
            depth: 0,
            max_depth,
            exhausted: false,
            stateful: false,
        }
    }

    /// Report a `SchemaError` at `pos` if `ty` is malformed.
    pub fn check_schema(&mut self, ty: &AvroType, pos: &Pos) -> bool {
        match ty.validate() {
            Ok(()) => true,
            Err(err) => {
                self.diagnostics
                    .report(DiagnosticKind::SchemaError, pos.clone())
                    .message(err.to_string())
                    .emit();
                false
            }
        }
    }

    /// Top-level action: evaluated in the root scope, typed by its last item.
    pub fn action(&mut self, exprs: &[Expr]) -> Option<Node> {
        let root = Pos::new("action");
        let nodes = self.sequence(exprs, &root);
        let node = sequence_node(nodes?);

        let output = &self.doc.output;
        if !diverges(&node) && !accepts(output, &node.ty) {
            self.diagnostics
                .report(DiagnosticKind::OutputTypeMismatch, root)
                .message(format!("expected {output}, got {}", node.ty))
                .emit();
            return None;
        }
        Some(node)
    }

    fn expr(&mut self, expr: &Expr, pos: &Pos) -> Option<Node> {
        if self.exhausted {
            return None;
        }
        if self.depth >= self.max_depth {
            self.exhausted = true;
            return None;
        }
        self.depth += 1;
        let node = self.lower(expr, pos);
        self.depth -= 1;
        node
    }

    fn lower(&mut self, expr: &Expr, pos: &Pos) -> Option<Node> {
        match expr {
            Expr::Literal { value, ty } => self.lower_literal(value, ty, pos),
            Expr::Ref(name) => self.lower_ref(name, pos),
            Expr::Call { name, args } => self.lower_call(name, args, pos),
            Expr::Let(bindings) => self.lower_let(bindings, pos),
            Expr::Set(assignments) => self.lower_set(assignments, pos),
            Expr::If {
                cond,
                then,
                otherwise,
            } => self.lower_if(cond, then, otherwise.as_deref(), pos),
            Expr::Cond {
                branches,
                otherwise,
            } => self.lower_cond(branches, otherwise.as_deref(), pos),
            Expr::Do(body) => self.block(body, &pos.child("do")),
            Expr::While { cond, body } => {
                let cond = self.condition(cond, &pos.child("while"));
                let body = self.block(body, &pos.child("body"));
                let kind = NodeKind::While {
                    cond: Box::new(cond?),
                    body: Box::new(body?),
                };
                Some(Node::new(kind, AvroType::Null))
            }
            Expr::ForEach { name, array, body } => self.lower_for_each(name, array, body, pos),
            Expr::New { ty, init } => self.lower_new(ty, init, pos),
            Expr::Attr { base, path } => self.lower_attr(base, path, pos),
            Expr::CellGet(name) => {
                let (cell, ty) = self.cell(name, pos)?;
                Some(Node::new(NodeKind::CellGet(cell), ty))
            }
            Expr::CellSet { cell, value } => self.lower_cell_set(cell, value, pos),
            Expr::PoolGet { pool, key, default } => {
                self.lower_pool_get(pool, key, default.as_deref(), pos)
            }
            Expr::PoolSet { pool, key, value } => self.lower_pool_set(pool, key, value, pos),
            Expr::Error { message, code } => {
                let kind = NodeKind::Error {
                    message: message.clone(),
                    code: *code,
                    pos: pos.to_string(),
                };
                Some(Node::new(kind, AvroType::Null))
            }
            Expr::Log { args, namespace } => {
                let args = self.sequence(args, &pos.child("log"))?;
                let kind = NodeKind::Log {
                    args,
                    namespace: namespace.clone(),
                };
                Some(Node::new(kind, AvroType::Null))
            }
        }
    }

    fn lower_literal(&mut self, value: &Value, ty: &AvroType, pos: &Pos) -> Option<Node> {
        if !self.check_schema(ty, pos) {
            return None;
        }
        match value.clone().conform(ty) {
            Some(value) => Some(Node::new(NodeKind::Literal(value), ty.clone())),
            None => {
                self.diagnostics
                    .report(DiagnosticKind::TypeMismatch, pos.clone())
                    .message(format!("literal {value} is not a valid {ty}"))
                    .emit();
                None
            }
        }
    }

    fn lower_ref(&mut self, name: &str, pos: &Pos) -> Option<Node> {
        let Some(var) = self.scopes.lookup(name) else {
            self.diagnostics
                .report(DiagnosticKind::UnresolvedReference, pos.clone())
                .message(name)
                .emit();
            return None;
        };
        let slot = var.slot;
        let ty = var.ty.clone()?;
        Some(Node::new(NodeKind::Var(slot), ty))
    }

    fn lower_call(&mut self, name: &str, args: &[Expr], pos: &Pos) -> Option<Node> {
        let library = self.library;
        let found = library.lookup(name);
        if found.is_none() {
            self.diagnostics
                .report(DiagnosticKind::UnknownFunction, pos.clone())
                .message(name)
                .emit();
        }
        let args = self.sequence(args, &pos.child("args"));
        let (id, fcn) = found?;
        let args = args?;

        let arg_types: Vec<AvroType> = args.iter().map(|a| a.ty.clone()).collect();
        match resolve(name, &fcn.signatures, &arg_types) {
            Ok(resolved) => {
                if fcn.purity == Purity::ConsumesRng {
                    self.stateful = true;
                }
                let call = CallNode {
                    fcn: id,
                    params: resolved.params,
                    args,
                    pos: pos.to_string(),
                };
                Some(Node::new(NodeKind::Call(call), resolved.ret))
            }
            Err(ResolveError::NoMatch { candidates, .. }) => {
                let shown: Vec<String> = arg_types.iter().map(ToString::to_string).collect();
                let mut report = self
                    .diagnostics
                    .report(DiagnosticKind::NoMatchingSignature, pos.clone())
                    .message(format!(
                        "no signature of `{name}` accepts ({})",
                        shown.join(", ")
                    ));
                for (signature, mismatch) in candidates {
                    let at = match mismatch.position() {
                        Some(i) => pos.child("args").item(i),
                        None => pos.clone(),
                    };
                    report = report.related_to(format!("{signature}: {mismatch}"), at);
                }
                report.emit();
                None
            }
            Err(err @ ResolveError::Ambiguous { .. }) => {
                let mut report = self
                    .diagnostics
                    .report(DiagnosticKind::AmbiguousSignature, pos.clone())
                    .message(err.to_string());
                if let ResolveError::Ambiguous { candidates, .. } = &err {
                    for signature in candidates {
                        report = report.related_to(format!("candidate {signature}"), pos.clone());
                    }
                }
                report.emit();
                None
            }
        }
    }

    fn lower_let(&mut self, bindings: &[(String, Expr)], pos: &Pos) -> Option<Node> {
        let mut assigns = Vec::with_capacity(bindings.len());
        let mut ok = true;
        for (name, value) in bindings {
            let at = pos.child("let").child(name);
            let node = self.expr(value, &at);
            let ty = node.as_ref().map(|n| n.ty.clone());
            match self.scopes.declare(name, ty, at.clone()) {
                Ok(slot) => match node {
                    Some(value) => assigns.push(Assign {
                        slot,
                        ty: value.ty.clone(),
                        value,
                    }),
                    None => ok = false,
                },
                Err(previous) => {
                    self.diagnostics
                        .report(DiagnosticKind::VariableRedeclared, at)
                        .message(name)
                        .related_to("first declared here", previous)
                        .hint("use `set` to assign an existing variable")
                        .emit();
                    ok = false;
                }
            }
        }
        ok.then(|| Node::new(NodeKind::Let(assigns), AvroType::Null))
    }

    fn lower_set(&mut self, assignments: &[(String, Expr)], pos: &Pos) -> Option<Node> {
        let mut assigns = Vec::with_capacity(assignments.len());
        let mut ok = true;
        for (name, value) in assignments {
            let at = pos.child("set").child(name);
            let node = self.expr(value, &at);
            let target = self.scopes.lookup(name).map(|v| (v.slot, v.ty.clone()));
            match (target, node) {
                (None, _) => {
                    self.diagnostics
                        .report(DiagnosticKind::UnresolvedReference, at)
                        .message(name)
                        .emit();
                    ok = false;
                }
                (Some((slot, Some(ty))), Some(value)) if accepts(&ty, &value.ty) => {
                    assigns.push(Assign { slot, ty, value });
                }
                (Some((_, Some(ty))), Some(value)) => {
                    self.diagnostics
                        .report(DiagnosticKind::TypeMismatch, at)
                        .message(format!("`{name}` is {ty}, cannot assign {}", value.ty))
                        .emit();
                    ok = false;
                }
                _ => ok = false,
            }
        }
        ok.then(|| Node::new(NodeKind::Set(assigns), AvroType::Null))
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then: &[Expr],
        otherwise: Option<&[Expr]>,
        pos: &Pos,
    ) -> Option<Node> {
        let cond = self.condition(cond, &pos.child("if"));
        let then = self.block(then, &pos.child("then"));
        let otherwise = otherwise.map(|body| self.block(body, &pos.child("else")));
        let (cond, then) = (cond?, then?);
        let otherwise = match otherwise {
            Some(node) => Some(node?),
            None => None,
        };

        let ty = match &otherwise {
            Some(other) => branch_type([&then, other]),
            None => AvroType::Null,
        };
        let kind = NodeKind::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        };
        Some(Node::new(kind, ty))
    }

    fn lower_cond(
        &mut self,
        branches: &[(Expr, Vec<Expr>)],
        otherwise: Option<&[Expr]>,
        pos: &Pos,
    ) -> Option<Node> {
        let mut lowered = Vec::with_capacity(branches.len());
        let mut ok = true;
        for (i, (cond, body)) in branches.iter().enumerate() {
            let at = pos.child("cond").item(i);
            let cond = self.condition(cond, &at.child("if"));
            let body = self.block(body, &at.child("then"));
            match (cond, body) {
                (Some(cond), Some(body)) => lowered.push((cond, body)),
                _ => ok = false,
            }
        }
        let otherwise = match otherwise.map(|body| self.block(body, &pos.child("else"))) {
            Some(Some(node)) => Some(node),
            Some(None) => return None,
            None => None,
        };
        if !ok {
            return None;
        }

        let ty = match &otherwise {
            Some(other) => branch_type(lowered.iter().map(|(_, body)| body).chain([other])),
            None => AvroType::Null,
        };
        let kind = NodeKind::Cond {
            branches: lowered,
            otherwise: otherwise.map(Box::new),
        };
        Some(Node::new(kind, ty))
    }

    fn lower_for_each(&mut self, name: &str, array: &Expr, body: &[Expr], pos: &Pos) -> Option<Node> {
        let at = pos.child("in");
        let array = self.expr(array, &at)?;
        let AvroType::Array(items) = &array.ty else {
            self.diagnostics
                .report(DiagnosticKind::TypeMismatch, at)
                .message(format!("foreach needs an array, got {}", array.ty))
                .emit();
            return None;
        };
        let item_ty = (**items).clone();

        self.scopes.push();
        let declared = self
            .scopes
            .declare(name, Some(item_ty), pos.child("foreach"));
        let body = self.block(body, &pos.child("body"));
        self.scopes.pop();

        let slot = match declared {
            Ok(slot) => slot,
            Err(previous) => {
                self.diagnostics
                    .report(DiagnosticKind::VariableRedeclared, pos.child("foreach"))
                    .message(name)
                    .related_to("first declared here", previous)
                    .emit();
                return None;
            }
        };
        let kind = NodeKind::ForEach {
            slot,
            array: Box::new(array),
            body: Box::new(body?),
        };
        Some(Node::new(kind, AvroType::Null))
    }

    fn lower_new(&mut self, ty: &AvroType, init: &NewInit, pos: &Pos) -> Option<Node> {
        if !self.check_schema(ty, pos) {
            return None;
        }
        let at = pos.child("new");
        match (ty, init) {
            (AvroType::Record(record), NewInit::Fields(fields)) => {
                let mut ok = true;
                let mut lowered = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    let field_pos = at.child(name);
                    let node = self.expr(value, &field_pos);
                    let declared = record.fields.iter().find(|f| &f.name == name);
                    match (declared, node) {
                        (None, _) => {
                            self.mismatch(&field_pos, format!("record {} has no field `{name}`", record.name));
                            ok = false;
                        }
                        (Some(_), _) if lowered.iter().any(|(n, _)| n == name) => {
                            self.mismatch(&field_pos, format!("field `{name}` is given twice"));
                            ok = false;
                        }
                        (Some(field), Some(node)) if accepts(&field.ty, &node.ty) => {
                            lowered.push((name.clone(), node));
                        }
                        (Some(field), Some(node)) => {
                            self.mismatch(
                                &field_pos,
                                format!("field `{name}` is {}, got {}", field.ty, node.ty),
                            );
                            ok = false;
                        }
                        (Some(_), None) => ok = false,
                    }
                }
                for field in &record.fields {
                    if !fields.iter().any(|(name, _)| name == &field.name) {
                        self.mismatch(&at, format!("missing field `{}`", field.name));
                        ok = false;
                    }
                }
                ok.then(|| Node::new(NodeKind::NewRecord(lowered), ty.clone()))
            }
            (AvroType::Map(values), NewInit::Fields(entries)) => {
                let mut ok = true;
                let mut lowered = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let entry_pos = at.child(key);
                    match self.expr(value, &entry_pos) {
                        Some(node) if accepts(values, &node.ty) => lowered.push((key.clone(), node)),
                        Some(node) => {
                            self.mismatch(&entry_pos, format!("expected {values}, got {}", node.ty));
                            ok = false;
                        }
                        None => ok = false,
                    }
                }
                ok.then(|| Node::new(NodeKind::NewMap(lowered), ty.clone()))
            }
            (AvroType::Array(items), NewInit::Items(values)) => {
                let mut ok = true;
                let mut lowered = Vec::with_capacity(values.len());
                for (i, value) in values.iter().enumerate() {
                    let item_pos = at.item(i);
                    match self.expr(value, &item_pos) {
                        Some(node) if accepts(items, &node.ty) => lowered.push(node),
                        Some(node) => {
                            self.mismatch(&item_pos, format!("expected {items}, got {}", node.ty));
                            ok = false;
                        }
                        None => ok = false,
                    }
                }
                ok.then(|| Node::new(NodeKind::NewArray(lowered), ty.clone()))
            }
            (_, NewInit::Fields(_)) => {
                self.mismatch(&at, format!("{ty} cannot be built from named fields"));
                None
            }
            (_, NewInit::Items(_)) => {
                self.mismatch(&at, format!("{ty} cannot be built from items"));
                None
            }
        }
    }

    fn lower_attr(&mut self, base: &Expr, path: &[Expr], pos: &Pos) -> Option<Node> {
        let base = self.expr(base, &pos.child("attr"))?;
        let mut ty = base.ty.clone();
        let mut steps = Vec::with_capacity(path.len());
        for (i, step) in path.iter().enumerate() {
            let at = pos.child("path").item(i);
            let next = match &ty {
                AvroType::Record(record) => {
                    let Expr::Literal {
                        value: Value::String(name),
                        ..
                    } = step
                    else {
                        self.invalid_path(&at, format!("fields of record {} are selected by a string literal", record.name));
                        return None;
                    };
                    let Some(field) = record.fields.iter().find(|f| &f.name == name) else {
                        self.invalid_path(&at, format!("record {} has no field `{name}`", record.name));
                        return None;
                    };
                    steps.push(PathStep::Field(name.clone()));
                    field.ty.clone()
                }
                AvroType::Array(items) => {
                    let index = self.expr(step, &at)?;
                    if !matches!(index.ty, AvroType::Int | AvroType::Long) {
                        self.mismatch(&at, format!("array index must be int or long, got {}", index.ty));
                        return None;
                    }
                    steps.push(PathStep::Index(index));
                    (**items).clone()
                }
                AvroType::Map(values) => {
                    let key = self.expr(step, &at)?;
                    if key.ty != AvroType::String {
                        self.mismatch(&at, format!("map key must be string, got {}", key.ty));
                        return None;
                    }
                    steps.push(PathStep::Key(key));
                    (**values).clone()
                }
                other => {
                    self.invalid_path(&at, format!("cannot index into {other}"));
                    return None;
                }
            };
            ty = next;
        }
        let kind = NodeKind::Attr {
            base: Box::new(base),
            path: steps,
            pos: pos.to_string(),
        };
        Some(Node::new(kind, ty))
    }

    fn lower_cell_set(&mut self, name: &str, value: &Expr, pos: &Pos) -> Option<Node> {
        let cell = self.cell(name, pos);
        let at = pos.child("to");
        let value = self.expr(value, &at);
        let ((cell, ty), value) = (cell?, value?);
        if !accepts(&ty, &value.ty) {
            self.mismatch(&at, format!("cell `{name}` is {ty}, got {}", value.ty));
            return None;
        }
        let kind = NodeKind::CellSet {
            cell,
            value: Box::new(value),
        };
        Some(Node::new(kind, ty))
    }

    fn lower_pool_get(
        &mut self,
        name: &str,
        key: &Expr,
        default: Option<&Expr>,
        pos: &Pos,
    ) -> Option<Node> {
        let pool = self.pool(name, pos);
        let key = self.key(key, &pos.child("key"));
        let at = pos.child("default");
        let default = default.map(|d| self.expr(d, &at));
        let ((pool, ty), key) = (pool?, key?);
        let default = match default {
            Some(Some(node)) if accepts(&ty, &node.ty) => Some(Box::new(node)),
            Some(Some(node)) => {
                self.mismatch(&at, format!("pool `{name}` holds {ty}, got {}", node.ty));
                return None;
            }
            Some(None) => return None,
            None => None,
        };
        let kind = NodeKind::PoolGet {
            pool,
            key: Box::new(key),
            default,
            pos: pos.to_string(),
        };
        Some(Node::new(kind, ty))
    }

    fn lower_pool_set(&mut self, name: &str, key: &Expr, value: &Expr, pos: &Pos) -> Option<Node> {
        let pool = self.pool(name, pos);
        let key = self.key(key, &pos.child("key"));
        let at = pos.child("to");
        let value = self.expr(value, &at);
        let ((pool, ty), key, value) = (pool?, key?, value?);
        if !accepts(&ty, &value.ty) {
            self.mismatch(&at, format!("pool `{name}` holds {ty}, got {}", value.ty));
            return None;
        }
        let kind = NodeKind::PoolSet {
            pool,
            key: Box::new(key),
            value: Box::new(value),
        };
        Some(Node::new(kind, ty))
    }

    fn cell(&mut self, name: &str, pos: &Pos) -> Option<(CellId, AvroType)> {
        self.stateful = true;
        match self.doc.cells.get_full(name) {
            Some((index, _, spec)) => Some((CellId(index as u32), spec.ty.clone())),
            None => {
                self.diagnostics
                    .report(DiagnosticKind::UnknownCell, pos.clone())
                    .message(name)
                    .emit();
                None
            }
        }
    }

    fn pool(&mut self, name: &str, pos: &Pos) -> Option<(PoolId, AvroType)> {
        self.stateful = true;
        match self.doc.pools.get_full(name) {
            Some((index, _, spec)) => Some((PoolId(index as u32), spec.ty.clone())),
            None => {
                self.diagnostics
                    .report(DiagnosticKind::UnknownPool, pos.clone())
                    .message(name)
                    .emit();
                None
            }
        }
    }

    fn key(&mut self, key: &Expr, pos: &Pos) -> Option<Node> {
        let key = self.expr(key, pos)?;
        if key.ty != AvroType::String {
            self.mismatch(pos, format!("pool keys are strings, got {}", key.ty));
            return None;
        }
        Some(key)
    }

    fn condition(&mut self, cond: &Expr, pos: &Pos) -> Option<Node> {
        let node = self.expr(cond, pos)?;
        if node.ty != AvroType::Boolean {
            self.mismatch(pos, format!("condition must be boolean, got {}", node.ty));
            return None;
        }
        Some(node)
    }

    /// Lower `exprs` in a fresh scope into a `Do` node.
    fn block(&mut self, exprs: &[Expr], pos: &Pos) -> Option<Node> {
        self.scopes.push();
        let nodes = self.sequence(exprs, pos);
        self.scopes.pop();
        Some(sequence_node(nodes?))
    }

    fn sequence(&mut self, exprs: &[Expr], pos: &Pos) -> Option<Vec<Node>> {
        let mut nodes = Vec::with_capacity(exprs.len());
        let mut ok = true;
        for (i, expr) in exprs.iter().enumerate() {
            match self.expr(expr, &pos.item(i)) {
                Some(node) => nodes.push(node),
                None => ok = false,
            }
        }
        ok.then_some(nodes)
    }

    fn mismatch(&mut self, pos: &Pos, detail: String) {
        self.diagnostics
            .report(DiagnosticKind::TypeMismatch, pos.clone())
            .message(detail)
            .emit();
    }

    fn invalid_path(&mut self, pos: &Pos, detail: String) {
        self.diagnostics
            .report(DiagnosticKind::InvalidPath, pos.clone())
            .message(detail)
            .emit();
    }
}

fn sequence_node(nodes: Vec<Node>) -> Node {
    let ty = nodes.last().map_or(AvroType::Null, |n| n.ty.clone());
    Node::new(NodeKind::Do(nodes), ty)
}

/// Always raises instead of producing a value.
fn diverges(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Error { .. } => true,
        NodeKind::Do(nodes) => nodes.last().is_some_and(diverges),
        _ => false,
    }
}

/// Least upper bound of the branches that can produce a value.
fn branch_type<'n>(branches: impl IntoIterator<Item = &'n Node>) -> AvroType {
    branches
        .into_iter()
        .filter(|b| !diverges(b))
        .map(|b| b.ty.clone())
        .reduce(|a, b| least_upper_bound(&a, &b))
        .unwrap_or(AvroType::Null)
}
