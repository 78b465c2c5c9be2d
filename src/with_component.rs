use swc_core::ecma::ast::*;

use crate::errors::EmotionError;
use crate::macros::styled::styled_options;
use crate::state::FileState;

fn is_with_component(callee: &Callee) -> bool {
    match callee {
        Callee::Expr(expr) => matches!(
            &**expr,
            Expr::Member(MemberExpr { prop: MemberProp::Ident(prop), .. })
                if &*prop.sym == "withComponent"
        ),
        _ => false,
    }
}

/// `x.withComponent(tag, options?)` gets the generated styled options as its
/// second argument. Calls with any other arity are left alone.
pub fn normalize_with_component(
    call: &mut CallExpr,
    state: &mut FileState,
    label: Option<&str>,
) -> Result<bool, EmotionError> {
    if !is_with_component(&call.callee) || !matches!(call.args.len(), 1 | 2) {
        return Ok(false);
    }
    if call.args.iter().any(|arg| arg.spread.is_some()) {
        return Err(EmotionError::WithComponentSpread);
    }

    let existing = call.args.get(1).map(|arg| &*arg.expr);
    let Some(options) = styled_options(existing, label, true, state) else {
        return Ok(false);
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
    state.scope.invalidate();
    Ok(true)
}
