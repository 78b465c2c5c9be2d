use swc_core::ecma::ast::*;
use tracing::debug;

use crate::macros::{Macro, MacroContext, ReferenceMap, References};
use crate::resolve::resolve_specifier;
use crate::state::{imported_name, FileState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// `import * as x from "..."`
    Namespace,
    /// A local binding is missing from the index.
    UnresolvedBinding,
    NoReferences,
}

/// What happened to one import declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    NotMacro,
    Skipped(SkipReason),
    Expanded { keep_import: bool },
}

/// Run every import declaration of the module through its macro, in body
/// order. Expanded declarations are removed unless their macro keeps them.
pub fn process_imports(module: &mut Module, state: &mut FileState) -> Vec<DispatchOutcome> {
    let mut outcomes = vec![];
    let mut index = 0;
    while index < module.body.len() {
        let import = match &module.body[index] {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import.clone(),
            _ => {
                index += 1;
                continue;
            }
        };

        let outcome = dispatch_import(&import, module, state);
        outcomes.push(outcome);
        if outcome == (DispatchOutcome::Expanded { keep_import: false }) {
            module.body.remove(index);
            state.scope.invalidate();
        } else {
            index += 1;
        }
    }
    outcomes
}

pub fn dispatch_import(
    import: &ImportDecl,
    module: &mut Module,
    state: &mut FileState,
) -> DispatchOutcome {
    let specifier: &str = &import.src.value;
    register_instance(specifier, state);

    let Some(macro_) = state.macros.get(specifier).cloned() else {
        return DispatchOutcome::NotMacro;
    };

    if import
        .specifiers
        .iter()
        .any(|specifier| matches!(specifier, ImportSpecifier::Namespace(_)))
    {
        debug!(specifier, "emotion: skipping namespace import");
        return DispatchOutcome::Skipped(SkipReason::Namespace);
    }

    state.scope.ensure_fresh(&*module);
    let Some(references) = collect_references(import, state) else {
        debug!(specifier, "emotion: skipping import with unresolved bindings");
        return DispatchOutcome::Skipped(SkipReason::UnresolvedBinding);
    };
    if references.values().all(|refs| refs.sites.is_empty()) {
        debug!(specifier, "emotion: skipping import without references");
        return DispatchOutcome::Skipped(SkipReason::NoReferences);
    }

    // Edits made upstream may not have reached the index.
    state.scope.rebuild(&*module);

    macro_.expand(MacroContext {
        references: &references,
        state,
        module,
        is_macro_call: true,
    });
    state.scope.invalidate();

    debug!(specifier, keep_import = macro_.keep_import(), "emotion: expanded import");
    DispatchOutcome::Expanded {
        keep_import: macro_.keep_import(),
    }
}

/// Registers `specifier` as an emotion instance when it resolves to one of the
/// configured instance paths. Registry entries are never overridden.
fn register_instance(specifier: &str, state: &mut FileState) {
    if state.macros.contains(specifier) {
        return;
    }
    let key = resolve_specifier(specifier, &state.import_base_dir());
    if state.instance_paths.contains(&key) {
        debug!(specifier, key = %key, "emotion: registering instance");
        state.macros.register(
            specifier,
            Macro::Emotion {
                instance_path: specifier.to_string(),
            },
        );
    }
}

/// `None` as soon as one local binding is unknown.
fn collect_references(import: &ImportDecl, state: &FileState) -> Option<ReferenceMap> {
    let mut references = ReferenceMap::default();
    for specifier in &import.specifiers {
        let (imported, local) = match specifier {
            ImportSpecifier::Default(default) => ("default", &default.local),
            ImportSpecifier::Named(named) => (imported_name(named), &named.local),
            // Rejected before collection.
            ImportSpecifier::Namespace(_) => continue,
        };
        let local = local.to_id();
        let sites = state.scope.binding(&local)?.to_vec();
        references.insert(imported.to_string(), References { local, sites });
    }
    Some(references)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swc_core::{
        common::{SyntaxContext, DUMMY_SP},
        ecma::visit::VisitMut,
    };

    use super::*;
    use crate::options::EmotionOptions;
    use crate::test_utils::{
        assert_contains, assert_not_contains, run_test_visit, test_env, TEST_FILENAME,
    };
    use crate::FileEnv;

    struct Dispatch {
        options: EmotionOptions,
        env: Option<FileEnv>,
        prepare: fn(&mut Module),
        outcomes: Vec<DispatchOutcome>,
        generation: usize,
    }

    impl VisitMut for Dispatch {
        fn visit_mut_module(&mut self, m: &mut Module) {
            let env = self.env.take().unwrap();
            let mut state = FileState::new(&self.options, env, m);
            (self.prepare)(m);
            self.outcomes = process_imports(m, &mut state);
            state.imports.flush(m);
            self.generation = state.scope.generation();
        }
    }

    fn dispatch_with(
        code: &str,
        options: EmotionOptions,
        prepare: fn(&mut Module),
    ) -> (String, Vec<DispatchOutcome>, usize) {
        let result = run_test_visit(code, |context| Dispatch {
            options,
            env: Some(test_env(&context, Some(TEST_FILENAME))),
            prepare,
            outcomes: vec![],
            generation: 0,
        });
        (
            result.output_code,
            result.visitor.outcomes,
            result.visitor.generation,
        )
    }

    fn dispatch(code: &str) -> (String, Vec<DispatchOutcome>, usize) {
        dispatch_with(code, EmotionOptions::default(), |_| {})
    }

    #[test]
    fn test_unregistered_imports_are_untouched() {
        let (output, outcomes, generation) = dispatch(
            r#"
            import React from "react";
            import css from "./css";
            css`color: red;`;
            "#,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::NotMacro, DispatchOutcome::NotMacro]
        );
        assert_contains(&output, r#"import css from "./css";"#);
        assert_contains(&output, "css`color: red;`");
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_expanded_import_is_removed() {
        let (output, outcomes, generation) = dispatch(
            r#"
            import css from "@emotion/css";
            const a = css`color: red;`;
            "#,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Expanded { keep_import: false }]
        );
        assert_contains(&output, r#"import _css from "@emotion/css";"#);
        assert_contains(&output, r#"const a = _css("color:red;");"#);
        assert_not_contains(&output, r#"import css from"#);
        assert_eq!(generation, 2);
    }

    #[test]
    fn test_core_import_is_kept() {
        let (output, outcomes, _) = dispatch(
            r#"
            import { css, jsx } from "@emotion/core";
            const a = css`color: red;`;
            "#,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Expanded { keep_import: true }]
        );
        assert_contains(&output, r#"import { css, jsx } from "@emotion/core";"#);
        assert_contains(&output, r#"const a = css("color:red;");"#);
    }

    #[test]
    fn test_namespace_import_is_skipped() {
        let (output, outcomes, generation) = dispatch(
            r#"
            import * as emotion from "emotion";
            emotion.css`color: red;`;
            "#,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Skipped(SkipReason::Namespace)]
        );
        assert_contains(&output, r#"import * as emotion from "emotion";"#);
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_namespace_after_default_is_skipped() {
        let (output, outcomes, generation) = dispatch(
            r#"
            import css, * as em from "emotion";
            css`color: red;`;
            em.cx(a);
            "#,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Skipped(SkipReason::Namespace)]
        );
        assert_contains(&output, r#"import css, * as em from "emotion";"#);
        assert_contains(&output, "css`color: red;`;");
        assert_not_contains(&output, "import { *");
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_import_without_references_is_left_alone() {
        let (output, outcomes, generation) = dispatch(r#"import { css } from "emotion";"#);
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Skipped(SkipReason::NoReferences)]
        );
        assert_contains(&output, r#"import { css } from "emotion";"#);
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_unresolved_binding_skips_whole_import() {
        fn add_unindexed_specifier(m: &mut Module) {
            if let Some(ModuleItem::ModuleDecl(ModuleDecl::Import(import))) = m.body.first_mut() {
                import
                    .specifiers
                    .push(ImportSpecifier::Named(ImportNamedSpecifier {
                        span: DUMMY_SP,
                        local: Ident::new("keyframes".into(), DUMMY_SP, SyntaxContext::empty()),
                        imported: None,
                        is_type_only: false,
                    }));
            }
        }

        let (output, outcomes, generation) = dispatch_with(
            r#"
            import { css } from "emotion";
            const a = css`color: red;`;
            "#,
            EmotionOptions::default(),
            add_unindexed_specifier,
        );
        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Skipped(SkipReason::UnresolvedBinding)]
        );
        assert_contains(&output, r#"import { css, keyframes } from "emotion";"#);
        assert_contains(&output, "const a = css`color: red;`");
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_relative_import_matches_configured_instance() {
        let (output, outcomes, _) = dispatch_with(
            r#"
            import { css, cx } from "./emotion";
            import { css as other } from "../emotion";
            const a = css`color: red;`;
            const b = cx(a);
            other`margin: 0;`;
            "#,
            EmotionOptions {
                instances: vec!["./src/emotion".into()],
                ..Default::default()
            },
            |_| {},
        );
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Expanded { keep_import: false },
                DispatchOutcome::NotMacro,
            ]
        );
        assert_contains(&output, r#"import { css as _css } from "./emotion";"#);
        assert_contains(&output, r#"import { cx as _cx } from "./emotion";"#);
        assert_contains(&output, r#"const a = _css("color:red;");"#);
        assert_contains(&output, "const b = _cx(a);");
        assert_contains(&output, "other`margin: 0;`");
    }

    #[test]
    fn test_guard_rebuilds_once_per_expanded_import() {
        let (_, outcomes, generation) = dispatch(
            r#"
            import React from "react";
            import * as ns from "emotion";
            import { injectGlobal } from "emotion";
            import styled from "@emotion/styled";
            injectGlobal`body { margin: 0; }`;
            "#,
        );
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::NotMacro,
                DispatchOutcome::Skipped(SkipReason::Namespace),
                DispatchOutcome::Expanded { keep_import: false },
                DispatchOutcome::Skipped(SkipReason::NoReferences),
            ]
        );
        // initial build, the guard, then the refresh after the expansion
        assert_eq!(generation, 3);
    }
}
