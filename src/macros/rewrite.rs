use std::collections::HashMap;

use swc_core::{
    common::{SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        utils::ExprFactory,
        visit::{VisitMut, VisitMutWith},
    },
};

use super::css::{str_arg, tagged_template_to_call, transform_css_call_expression};
use super::styled::styled_options;
use super::StyledTarget;
use crate::label::{track_labels, LabelStack};
use crate::state::FileState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteKind {
    /// Only the identifier is replaced.
    Plain,
    /// `x\`...\`` and `x(...)` get the css treatment, `label` adds the label string.
    Styles { label: bool },
    /// `x.tag` and `x(Component)` become runtime styled calls with options.
    Styled(StyledTarget),
}

#[derive(Clone, Debug)]
pub struct Target {
    /// Identifier that takes the binding's place, `None` keeps the original.
    pub replacement: Option<Ident>,
    pub kind: RewriteKind,
}

impl Target {
    pub fn new(replacement: Option<Ident>, kind: RewriteKind) -> Self {
        Self { replacement, kind }
    }
}

enum Outer {
    Css { label: bool },
    Styled,
}

/// Rewrites every usage of the target bindings in one pass over the module.
pub struct ReferenceRewriter<'a> {
    targets: HashMap<Id, Target>,
    state: &'a mut FileState,
    labels: LabelStack,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn new(targets: HashMap<Id, Target>, state: &'a mut FileState) -> Self {
        Self {
            targets,
            state,
            labels: LabelStack::default(),
        }
    }

    fn target_of(&self, expr: &Expr) -> Option<&Target> {
        match expr {
            Expr::Ident(ident) => self.targets.get(&ident.to_id()),
            _ => None,
        }
    }

    fn styled_target(&self, expr: &Expr) -> Option<StyledTarget> {
        match self.target_of(expr)?.kind {
            RewriteKind::Styled(target) => Some(target),
            _ => None,
        }
    }

    /// `styled.tag` or `styled(Component)`.
    fn is_styled_base(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Member(member) => {
                matches!(member.prop, MemberProp::Ident(_))
                    && self.styled_target(&member.obj).is_some()
            }
            Expr::Call(call) => {
                matches!(&call.callee, Callee::Expr(callee) if self.styled_target(callee).is_some())
            }
            _ => false,
        }
    }

    /// What a call or tagged template with this callee turns into.
    fn outer_kind(&self, callee: &Expr) -> Option<Outer> {
        if let Some(target) = self.target_of(callee) {
            return match target.kind {
                RewriteKind::Styles { label } => Some(Outer::Css { label }),
                _ => None,
            };
        }
        self.is_styled_base(callee).then_some(Outer::Styled)
    }

    fn replacement_for(&self, ident: &Ident) -> Option<Ident> {
        let replacement = self.targets.get(&ident.to_id())?.replacement.clone()?;
        Some(Ident {
            span: ident.span,
            ..replacement
        })
    }

    fn finish(&mut self, call: &mut CallExpr, outer: Outer) {
        let label = match outer {
            Outer::Css { label: true } => self.labels.current().map(str::to_string),
            _ => None,
        };
        transform_css_call_expression(call, self.state, label.as_deref());
    }

    /// `styled.div` (web) into `_styled("div", options)`.
    fn rewrite_styled_member(&mut self, member: &MemberExpr, target: StyledTarget) -> Option<Expr> {
        let MemberProp::Ident(tag) = &member.prop else {
            return None;
        };
        let Expr::Ident(obj) = &*member.obj else {
            return None;
        };
        let runtime = self.replacement_for(obj)?;
        let label = self.labels.current().map(str::to_string);

        let mut args = vec![str_arg(tag.sym.to_string())];
        if let Some(options) = styled_options(None, label.as_deref(), target.is_web, self.state) {
            args.push(options.as_arg());
        }
        Some(Expr::Call(CallExpr {
            span: member.span,
            ctxt: SyntaxContext::empty(),
            callee: Expr::Ident(runtime).as_callee(),
            args,
            type_args: None,
        }))
    }

    /// `styled(Component, options?)` gets generated options as its second argument.
    fn rewrite_styled_call(&mut self, call: &mut CallExpr, target: StyledTarget) {
        if call.args.is_empty() || call.args.iter().any(|arg| arg.spread.is_some()) {
            return;
        }
        let label = self.labels.current().map(str::to_string);
        let existing = call.args.get(1).map(|arg| &*arg.expr);
        let Some(options) = styled_options(existing, label.as_deref(), target.is_web, self.state)
        else {
            return;
        };
        let options = ExprOrSpread {
            spread: None,
            expr: options,
        };
        if call.args.len() == 1 {
            call.args.push(options);
        } else {
            call.args[1] = options;
        }
    }
}

impl VisitMut for ReferenceRewriter<'_> {
    track_labels!();

    fn visit_mut_import_decl(&mut self, _: &mut ImportDecl) {}

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::TaggedTpl(tagged) => {
                if let Some(outer) = self.outer_kind(&tagged.tag) {
                    tagged.visit_mut_children_with(self);
                    let mut call = tagged_template_to_call(tagged);
                    self.finish(&mut call, outer);
                    *expr = Expr::Call(call);
                    return;
                }
            }
            Expr::Call(call) => {
                if let Callee::Expr(callee) = &call.callee {
                    if let Some(target) = self.styled_target(callee) {
                        self.rewrite_styled_call(call, target);
                        call.visit_mut_children_with(self);
                        return;
                    }
                    if let Some(outer) = self.outer_kind(callee) {
                        call.visit_mut_children_with(self);
                        self.finish(call, outer);
                        return;
                    }
                }
            }
            Expr::Member(member) => {
                let target = match member.prop {
                    MemberProp::Ident(_) => self.styled_target(&member.obj),
                    _ => None,
                };
                if let Some(target) = target.filter(|target| target.is_web) {
                    if let Some(replacement) = self.rewrite_styled_member(member, target) {
                        *expr = replacement;
                        return;
                    }
                }
            }
            _ => {}
        }
        expr.visit_mut_children_with(self);
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        if let Prop::Shorthand(ident) = prop {
            if let Some(replacement) = self.replacement_for(ident) {
                *prop = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(IdentName::new(ident.sym.clone(), ident.span)),
                    value: Box::new(Expr::Ident(replacement)),
                });
                return;
            }
        }
        prop.visit_mut_children_with(self);
    }

    fn visit_mut_export_named_specifier(&mut self, n: &mut ExportNamedSpecifier) {
        if let ModuleExportName::Ident(orig) = &n.orig {
            if let Some(replacement) = self.replacement_for(orig) {
                if n.exported.is_none() {
                    n.exported = Some(ModuleExportName::Ident(Ident::new(
                        orig.sym.clone(),
                        DUMMY_SP,
                        SyntaxContext::empty(),
                    )));
                }
                n.orig = ModuleExportName::Ident(replacement);
            }
        }
    }

    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        if let Some(replacement) = self.replacement_for(ident) {
            *ident = replacement;
        }
    }
}
