use swc_core::{
    common::{util::take::Take, Spanned, SyntaxContext},
    ecma::{ast::*, utils::ExprFactory},
};
use tracing::debug;

use crate::macros::css::{str_arg, transform_css_call_expression};
use crate::scope::is_pure;
use crate::source_map::get_source_map;
use crate::state::FileState;

/// Precompile a `css={{ ... }}` or `css={[ ... ]}` attribute into a call to
/// the css runtime. Returns whether the attribute was rewritten.
pub fn optimize_css_prop(attr: &mut JSXAttr, state: &mut FileState, label: Option<&str>) -> bool {
    if !state.transform_css_prop {
        return false;
    }
    match &attr.name {
        JSXAttrName::Ident(name) if &*name.sym == "css" => {}
        _ => return false,
    }

    let attr_span = attr.span;
    let Some(JSXAttrValue::JSXExprContainer(container)) = &mut attr.value else {
        return false;
    };
    let JSXExpr::Expr(expr) = &mut container.expr else {
        return false;
    };
    if !matches!(&**expr, Expr::Object(_) | Expr::Array(_)) {
        return false;
    }
    if !is_pure(expr, state.unresolved_ctxt) {
        return false;
    }

    let callee = state.css_identifier();
    let span = expr.span();
    let mut args = vec![expr.take().as_arg()];
    if state.emotion_source_map {
        if let Some(comment) = get_source_map(attr_span, state) {
            args.push(str_arg(comment));
        }
    }

    let mut call = CallExpr {
        span,
        ctxt: SyntaxContext::empty(),
        callee: Expr::Ident(callee).as_callee(),
        args,
        type_args: None,
    };
    transform_css_call_expression(&mut call, state, label);
    **expr = Expr::Call(call);
    state.scope.invalidate();

    debug!(label = ?label, "emotion: optimized css prop");
    true
}
