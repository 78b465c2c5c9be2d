use std::collections::HashMap;

use indexmap::IndexMap;
use swc_core::{
    common::Span,
    ecma::{ast::*, visit::VisitMutWith},
};
use tracing::debug;

use crate::state::FileState;

pub mod css;
pub mod rewrite;
pub mod styled;

use rewrite::{ReferenceRewriter, RewriteKind, Target};

// -----------------------------------------------------------------------------
// Macro variants
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyledTarget {
    /// Module the rewritten code imports the styled runtime from.
    pub import_path: &'static str,
    /// Web targets get stable `target` class names and `styled("tag")` calls.
    pub is_web: bool,
}

pub const WEB_STYLED: StyledTarget = StyledTarget {
    import_path: "@emotion/styled-base",
    is_web: true,
};
pub const NATIVE_STYLED: StyledTarget = StyledTarget {
    import_path: "@emotion/native",
    is_web: false,
};
pub const PRIMITIVES_STYLED: StyledTarget = StyledTarget {
    import_path: "@emotion/primitives",
    is_web: false,
};

/// A rewrite bound to an import specifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Macro {
    /// `import css from "@emotion/css"`
    Css,
    /// `import styled from "@emotion/styled"` and friends
    Styled(StyledTarget),
    /// `import { css, jsx } from "@emotion/core"`. Transforms `css` in place and
    /// keeps the import.
    Core,
    /// An emotion instance (`emotion` or a configured instance path); every
    /// export is re-imported from `instance_path`.
    Emotion { instance_path: String },
}

/// Everything a macro gets to work with.
pub struct MacroContext<'a> {
    pub references: &'a ReferenceMap,
    pub state: &'a mut FileState,
    pub module: &'a mut Module,
    /// Set when invoked by the import dispatcher. A standalone invocation of an
    /// emotion instance always emits source maps, whatever the options say.
    pub is_macro_call: bool,
}

impl Macro {
    pub fn keep_import(&self) -> bool {
        matches!(self, Macro::Core)
    }

    pub fn expand(&self, ctx: MacroContext<'_>) {
        let MacroContext {
            references,
            state,
            module,
            is_macro_call,
        } = ctx;

        let mut targets = HashMap::new();
        match self {
            Macro::Css => {
                if let Some(refs) = referenced(references, "default") {
                    let runtime = state.imports.add_default(&state.scope, "@emotion/css", "css");
                    targets.insert(
                        refs.local.clone(),
                        Target::new(Some(runtime), RewriteKind::Styles { label: true }),
                    );
                }
            }
            Macro::Styled(target) => {
                if let Some(refs) = referenced(references, "default") {
                    let runtime =
                        state
                            .imports
                            .add_default(&state.scope, target.import_path, "styled");
                    targets.insert(
                        refs.local.clone(),
                        Target::new(Some(runtime), RewriteKind::Styled(*target)),
                    );
                }
            }
            Macro::Core => {
                if let Some(refs) = referenced(references, "css") {
                    targets.insert(
                        refs.local.clone(),
                        Target::new(None, RewriteKind::Styles { label: true }),
                    );
                }
            }
            Macro::Emotion { instance_path } => {
                if !is_macro_call {
                    state.emotion_source_map = true;
                }
                let used = references.iter().filter(|(_, refs)| !refs.sites.is_empty());
                for (export, refs) in used {
                    let runtime = state
                        .imports
                        .add_export(&state.scope, instance_path, export);
                    let kind = match export.as_str() {
                        "css" => RewriteKind::Styles { label: true },
                        "keyframes" | "injectGlobal" => RewriteKind::Styles { label: false },
                        _ => RewriteKind::Plain,
                    };
                    targets.insert(refs.local.clone(), Target::new(Some(runtime), kind));
                }
            }
        }

        if targets.is_empty() {
            return;
        }
        debug!(macro_ = ?self, bindings = targets.len(), "emotion: expanding macro");
        module.visit_mut_with(&mut ReferenceRewriter::new(targets, state));
    }
}

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

/// Macros keyed by the specifier exactly as written in the import.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    entries: HashMap<String, Macro>,
}

impl MacroRegistry {
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.register("@emotion/css", Macro::Css);
        registry.register("@emotion/styled", Macro::Styled(WEB_STYLED));
        registry.register("@emotion/core", Macro::Core);
        registry.register("react-emotion", Macro::Styled(WEB_STYLED));
        registry.register("@emotion/primitives", Macro::Styled(PRIMITIVES_STYLED));
        registry.register("@emotion/native", Macro::Styled(NATIVE_STYLED));
        registry.register(
            "emotion",
            Macro::Emotion {
                instance_path: "emotion".into(),
            },
        );
        registry
    }

    pub fn register(&mut self, specifier: &str, macro_: Macro) {
        self.entries.insert(specifier.to_string(), macro_);
    }

    pub fn get(&self, specifier: &str) -> Option<&Macro> {
        self.entries.get(specifier)
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.entries.contains_key(specifier)
    }
}

// -----------------------------------------------------------------------------
// References
// -----------------------------------------------------------------------------

/// Local binding of one imported name and where it is used.
#[derive(Clone, Debug, PartialEq)]
pub struct References {
    pub local: Id,
    /// Spans of the uses at collection time. Only consulted to tell used
    /// bindings from unused ones; the rewriter finds the uses again by `local`,
    /// since earlier expansions may have moved them.
    pub sites: Vec<Span>,
}

/// Imported name (`"default"` or the export name) to its references, in
/// specifier order. Names without reference sites are still present.
pub type ReferenceMap = IndexMap<String, References>;

fn referenced<'a>(references: &'a ReferenceMap, name: &str) -> Option<&'a References> {
    references.get(name).filter(|refs| !refs.sites.is_empty())
}
