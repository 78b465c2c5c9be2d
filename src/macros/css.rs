use std::sync::LazyLock;

use regex::Regex;
use swc_core::{
    common::{util::take::Take, SyntaxContext, DUMMY_SP},
    ecma::{ast::*, utils::ExprFactory},
};

use crate::source_map::{get_source_map, is_source_map_comment};
use crate::state::FileState;

/// Quoted strings, comments and whitespace runs. Everything between two
/// matches is plain css text without whitespace.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\[\s\S])*"|'(?:[^'\\]|\\[\s\S])*'|/\*[\s\S]*?\*/|\s+"#)
        .expect("valid css token regex")
});

/// Whitespace is dropped after these and before all of them except `:`, which
/// keeps a preceding space so `div :hover` stays a descendant selector.
fn is_punctuation(c: char) -> bool {
    matches!(c, '{' | '}' | ':' | ';' | ',')
}

struct Minifier {
    out: String,
    pending_space: bool,
    /// A leading space is dropped only for the template's first quasi.
    trim_start: bool,
}

impl Minifier {
    fn flush_space(&mut self, next: Option<char>) {
        if !std::mem::take(&mut self.pending_space) {
            return;
        }
        if self.out.is_empty() && self.trim_start {
            return;
        }
        if self.out.chars().next_back().is_some_and(is_punctuation) {
            return;
        }
        if next.is_some_and(|c| is_punctuation(c) && c != ':') {
            return;
        }
        self.out.push(' ');
    }

    fn push(&mut self, text: &str) {
        self.flush_space(text.chars().next());
        self.out.push_str(text);
    }
}

/// Minify one quasi of a styles template: comments go, whitespace collapses
/// and disappears around punctuation, quoted strings are kept verbatim. Outer
/// whitespace is only trimmed at the template's ends so `${a} ${b}` keeps its
/// separator.
pub fn minify(text: &str, is_first: bool, is_last: bool) -> String {
    let mut minifier = Minifier {
        out: String::with_capacity(text.len()),
        pending_space: false,
        trim_start: is_first,
    };
    let mut last = 0;
    for token in TOKEN.find_iter(text) {
        if token.start() > last {
            minifier.push(&text[last..token.start()]);
        }
        match token.as_str().as_bytes()[0] {
            b'"' | b'\'' => minifier.push(token.as_str()),
            b'/' => {}
            _ => minifier.pending_space = true,
        }
        last = token.end();
    }
    if last < text.len() {
        minifier.push(&text[last..]);
    }
    if !is_last {
        minifier.flush_space(None);
    }
    minifier.out
}

pub fn str_arg(value: String) -> ExprOrSpread {
    Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }))
    .as_arg()
}

/// `tag`a${b}c`` into `tag("a", b, "c")` with minified strings. The cooked
/// text is used so escapes mean what they meant in the template. Empty strings
/// are dropped.
pub fn tagged_template_to_call(tagged: &mut TaggedTpl) -> CallExpr {
    let tpl = &mut *tagged.tpl;
    let last = tpl.quasis.len().saturating_sub(1);
    let mut exprs = tpl.exprs.drain(..);
    let mut args = vec![];
    for (index, quasi) in tpl.quasis.iter().enumerate() {
        let cooked = quasi.cooked.as_ref().unwrap_or(&quasi.raw);
        let text = minify(cooked, index == 0, index == last);
        if !text.is_empty() {
            args.push(str_arg(text));
        }
        if let Some(expr) = exprs.next() {
            args.push(ExprOrSpread { spread: None, expr });
        }
    }

    CallExpr {
        span: tagged.span,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(tagged.tag.take()),
        args,
        type_args: None,
    }
}

fn ends_with_source_map(call: &CallExpr) -> bool {
    matches!(
        call.args.last(),
        Some(ExprOrSpread { spread: None, expr }) if matches!(
            &**expr,
            Expr::Lit(Lit::Str(s)) if is_source_map_comment(&s.value)
        )
    )
}

/// Letters, digits, `_` and `-` survive, everything else is dropped.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Post-process a call to a css-like runtime function: append the
/// `label:<name>;` string when labels are on, then the source-map comment when
/// source maps are on. Both land before an already present source map.
pub fn transform_css_call_expression(call: &mut CallExpr, state: &FileState, label: Option<&str>) {
    if state.auto_label {
        if let Some(label) = label.map(sanitize_label).filter(|l| !l.is_empty()) {
            let at = if ends_with_source_map(call) {
                call.args.len() - 1
            } else {
                call.args.len()
            };
            call.args.insert(at, str_arg(format!("label:{label};")));
        }
    }

    if state.emotion_source_map && !ends_with_source_map(call) {
        if let Some(comment) = get_source_map(call.span, state) {
            call.args.push(str_arg(comment));
        }
    }
}
