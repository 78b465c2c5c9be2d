use std::collections::{HashMap, HashSet};

use swc_core::{
    common::{Span, SyntaxContext},
    ecma::{
        ast::*,
        visit::{Visit, VisitWith},
    },
};

// -----------------------------------------------------------------------------
// Binding index
// -----------------------------------------------------------------------------

/// Declared bindings of a module and every place they are referenced.
///
/// The index is a cache over the tree. Whoever mutates the module calls
/// [`ScopeIndex::invalidate`] and the next lookup goes through
/// [`ScopeIndex::ensure_fresh`]. Edits made without invalidating (for example by
/// another plugin earlier in the pipeline) stay invisible until
/// [`ScopeIndex::rebuild`] runs.
#[derive(Debug, Default)]
pub struct ScopeIndex {
    declared: HashSet<Id>,
    references: HashMap<Id, Vec<Span>>,
    stale: bool,
    generation: usize,
}

impl ScopeIndex {
    /// Index over a module or a script.
    pub fn new<N: VisitWith<ScopeCollector>>(program: &N) -> Self {
        let mut index = Self::default();
        index.rebuild(program);
        index
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Number of rebuilds so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn ensure_fresh<N: VisitWith<ScopeCollector>>(&mut self, program: &N) {
        if self.stale {
            self.rebuild(program);
        }
    }

    pub fn rebuild<N: VisitWith<ScopeCollector>>(&mut self, program: &N) {
        let mut collector = ScopeCollector::default();
        program.visit_with(&mut collector);
        self.declared = collector.declared;
        self.references = collector.references;
        self.stale = false;
        self.generation += 1;
    }

    /// Reference sites of a declared binding, `None` when the binding is unknown.
    pub fn binding(&self, id: &Id) -> Option<&[Span]> {
        if !self.declared.contains(id) {
            return None;
        }
        Some(self.references.get(id).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Whether `name` is declared or referenced anywhere in the module.
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.declared.iter().any(|(sym, _)| &**sym == name)
            || self.references.keys().any(|(sym, _)| &**sym == name)
    }
}

#[derive(Default)]
pub struct ScopeCollector {
    declared: HashSet<Id>,
    references: HashMap<Id, Vec<Span>>,
}

impl ScopeCollector {
    fn declare(&mut self, ident: &Ident) {
        self.declared.insert(ident.to_id());
    }
}

impl Visit for ScopeCollector {
    fn visit_import_specifier(&mut self, n: &ImportSpecifier) {
        match n {
            ImportSpecifier::Named(named) => self.declare(&named.local),
            ImportSpecifier::Default(default) => self.declare(&default.local),
            ImportSpecifier::Namespace(ns) => self.declare(&ns.local),
        }
    }

    fn visit_binding_ident(&mut self, n: &BindingIdent) {
        self.declare(&n.id);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.declare(&n.ident);
        n.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(&n.ident);
        n.class.visit_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        if let Some(ident) = &n.ident {
            self.declare(ident);
        }
        n.function.visit_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        if let Some(ident) = &n.ident {
            self.declare(ident);
        }
        n.class.visit_with(self);
    }

    // labels are not bindings
    fn visit_labeled_stmt(&mut self, n: &LabeledStmt) {
        n.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_ident(&mut self, n: &Ident) {
        self.references.entry(n.to_id()).or_default().push(n.span);
    }
}

// -----------------------------------------------------------------------------
// Purity
// -----------------------------------------------------------------------------

/// Conservative side-effect analysis: `true` only when evaluating `expr` can
/// neither run user code nor observe unbound globals.
pub fn is_pure(expr: &Expr, unresolved_ctxt: SyntaxContext) -> bool {
    match expr {
        Expr::Lit(_) => true,
        Expr::Ident(ident) => ident.ctxt != unresolved_ctxt,
        Expr::Paren(paren) => is_pure(&paren.expr, unresolved_ctxt),
        Expr::Arrow(_) | Expr::Fn(_) => true,
        Expr::Tpl(tpl) => tpl.exprs.iter().all(|e| is_pure(e, unresolved_ctxt)),
        Expr::Unary(unary) => {
            unary.op != UnaryOp::Delete && is_pure(&unary.arg, unresolved_ctxt)
        }
        Expr::Bin(bin) => {
            is_pure(&bin.left, unresolved_ctxt) && is_pure(&bin.right, unresolved_ctxt)
        }
        Expr::Array(array) => array.elems.iter().all(|elem| match elem {
            None => true,
            Some(ExprOrSpread { spread: Some(_), .. }) => false,
            Some(ExprOrSpread { expr, .. }) => is_pure(expr, unresolved_ctxt),
        }),
        Expr::Object(object) => object.props.iter().all(|prop| match prop {
            PropOrSpread::Spread(_) => false,
            PropOrSpread::Prop(prop) => is_pure_prop(prop, unresolved_ctxt),
        }),
        _ => false,
    }
}

fn is_pure_prop(prop: &Prop, unresolved_ctxt: SyntaxContext) -> bool {
    match prop {
        Prop::Shorthand(ident) => ident.ctxt != unresolved_ctxt,
        Prop::KeyValue(kv) => {
            is_pure_key(&kv.key, unresolved_ctxt) && is_pure(&kv.value, unresolved_ctxt)
        }
        Prop::Method(method) => is_pure_key(&method.key, unresolved_ctxt),
        Prop::Getter(_) | Prop::Setter(_) | Prop::Assign(_) => false,
    }
}

fn is_pure_key(key: &PropName, unresolved_ctxt: SyntaxContext) -> bool {
    match key {
        PropName::Computed(computed) => is_pure(&computed.expr, unresolved_ctxt),
        _ => true,
    }
}
