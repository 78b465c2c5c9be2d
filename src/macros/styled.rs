use std::path::Path;

use swc_core::{
    common::{SyntaxContext, DUMMY_SP},
    ecma::{ast::*, utils::ExprFactory},
};

use crate::hash::hash_string;
use crate::macros::css::sanitize_label;
use crate::state::FileState;

/// `e<hash><n>`: the hash covers the file's path relative to the cwd, `n` counts
/// the targets handed out in this file so far.
pub fn target_class_name(state: &mut FileState) -> String {
    let path = state
        .filename
        .as_deref()
        .map(|filename| relative_path(filename, &state.cwd))
        .unwrap_or_default();
    format!("e{}{}", hash_string(&path), state.next_target_index())
}

fn relative_path(filename: &str, cwd: &Path) -> String {
    let filename = Path::new(filename);
    pathdiff::diff_paths(filename, cwd)
        .unwrap_or_else(|| filename.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

fn key_value(key: &str, value: String) -> PropOrSpread {
    PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
        key: PropName::Ident(IdentName::new(key.into(), DUMMY_SP)),
        value: Box::new(Expr::Lit(Lit::Str(Str {
            span: DUMMY_SP,
            value: value.into(),
            raw: None,
        }))),
    })))
}

/// Options object for a styled call. User supplied properties come first so
/// the generated `target` and `label` win. A user argument that is not an
/// object literal is merged at runtime with `Object.assign`.
///
/// Returns `None` when there is nothing to add.
pub fn styled_options(
    existing: Option<&Expr>,
    label: Option<&str>,
    is_web: bool,
    state: &mut FileState,
) -> Option<Box<Expr>> {
    let mut generated = vec![];
    if is_web {
        generated.push(key_value("target", target_class_name(state)));
    }
    if state.auto_label {
        if let Some(label) = label.map(sanitize_label).filter(|l| !l.is_empty()) {
            generated.push(key_value("label", label));
        }
    }

    match existing {
        None if generated.is_empty() => None,
        None => Some(Box::new(Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props: generated,
        }))),
        Some(existing) if generated.is_empty() => Some(Box::new(existing.clone())),
        Some(Expr::Object(object)) => {
            let mut props = object.props.clone();
            props.extend(generated);
            Some(Box::new(Expr::Object(ObjectLit {
                span: object.span,
                props,
            })))
        }
        Some(other) => {
            let object_assign = MemberExpr {
                span: DUMMY_SP,
                obj: Box::new(Expr::Ident(Ident::new(
                    "Object".into(),
                    DUMMY_SP,
                    state.unresolved_ctxt,
                ))),
                prop: MemberProp::Ident(IdentName::new("assign".into(), DUMMY_SP)),
            };
            Some(Box::new(Expr::Call(CallExpr {
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                callee: Callee::Expr(Box::new(Expr::Member(object_assign))),
                args: vec![
                    Expr::Object(ObjectLit {
                        span: DUMMY_SP,
                        props: vec![],
                    })
                    .as_arg(),
                    Expr::Object(ObjectLit {
                        span: DUMMY_SP,
                        props: generated,
                    })
                    .as_arg(),
                    other.clone().as_arg(),
                ],
                type_args: None,
            })))
        }
    }
}
