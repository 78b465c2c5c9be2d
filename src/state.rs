use std::collections::HashMap;
use std::path::{Path, PathBuf};

use swc_core::{
    common::{sync::Lrc, Mark, SourceMapper, DUMMY_SP, SyntaxContext},
    ecma::{ast::*, utils::ExprFactory},
};
use tracing::debug;

use crate::macros::MacroRegistry;
use crate::options::EmotionOptions;
use crate::resolve::resolve_specifier;
use crate::scope::ScopeIndex;

/// Host facts about the file being transformed.
#[derive(Clone)]
pub struct FileEnv {
    /// `None` when the host reports no filename (or `"unknown"`).
    pub filename: Option<String>,
    pub cwd: PathBuf,
    pub unresolved_mark: Mark,
    pub source_map: Option<Lrc<dyn SourceMapper>>,
}

// -----------------------------------------------------------------------------
// Per-file state
// -----------------------------------------------------------------------------

/// Everything the transforms of a single file share. Built when the module is
/// entered and dropped with the transform.
pub struct FileState {
    pub instance_paths: Vec<String>,
    pub macros: MacroRegistry,
    pub transform_css_prop: bool,
    pub emotion_source_map: bool,
    pub auto_label: bool,
    /// Local name of the injected `@emotion/css` default import used by the css prop.
    pub css_identifier: Option<Ident>,
    pub filename: Option<String>,
    pub cwd: PathBuf,
    pub source_map: Option<Lrc<dyn SourceMapper>>,
    pub unresolved_ctxt: SyntaxContext,
    pub scope: ScopeIndex,
    pub imports: ImportInjector,
    target_class_name_count: usize,
}

impl FileState {
    pub fn new(options: &EmotionOptions, env: FileEnv, module: &Module) -> Self {
        let transform_css_prop = options
            .css_prop_optimization
            .unwrap_or_else(|| imports_core_jsx(module));
        Self::build(options, env, ScopeIndex::new(module), transform_css_prop)
    }

    /// State for a CommonJS script. Scripts have no import declarations, so the
    /// css prop is only optimized when the option forces it.
    pub fn for_script(options: &EmotionOptions, env: FileEnv, script: &Script) -> Self {
        let transform_css_prop = options.css_prop_optimization.unwrap_or(false);
        Self::build(options, env, ScopeIndex::new(script), transform_css_prop)
    }

    fn build(
        options: &EmotionOptions,
        env: FileEnv,
        scope: ScopeIndex,
        transform_css_prop: bool,
    ) -> Self {
        let instance_paths = options
            .instances
            .iter()
            .map(|instance| resolve_specifier(instance, &env.cwd))
            .collect();

        let filename = env.filename.filter(|f| !f.is_empty() && f != "unknown");

        debug!(
            filename = filename.as_deref().unwrap_or("<unknown>"),
            transform_css_prop,
            source_map = options.source_map,
            "emotion: initialized file state"
        );

        Self {
            instance_paths,
            macros: MacroRegistry::with_builtins(),
            transform_css_prop,
            emotion_source_map: options.source_map,
            auto_label: options.auto_label,
            css_identifier: None,
            filename,
            cwd: env.cwd,
            source_map: env.source_map,
            unresolved_ctxt: SyntaxContext::empty().apply_mark(env.unresolved_mark),
            scope,
            imports: ImportInjector::default(),
            target_class_name_count: 0,
        }
    }

    /// Directory relative imports of this file are resolved against.
    pub fn import_base_dir(&self) -> PathBuf {
        match self.filename.as_deref().and_then(|f| Path::new(f).parent()) {
            Some(dir) => self.cwd.join(dir),
            None => self.cwd.clone(),
        }
    }

    /// Position of the next generated target class name in this file.
    pub fn next_target_index(&mut self) -> usize {
        let index = self.target_class_name_count;
        self.target_class_name_count += 1;
        index
    }

    /// Default import of `@emotion/css`, injected the first time it is asked for.
    pub fn css_identifier(&mut self) -> Ident {
        if let Some(ident) = &self.css_identifier {
            return ident.clone();
        }
        let ident = self
            .imports
            .add_default(&self.scope, "@emotion/css", "css");
        self.css_identifier = Some(ident.clone());
        ident
    }
}

fn imports_core_jsx(module: &Module) -> bool {
    module.body.iter().any(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
            &*import.src.value == "@emotion/core"
                && import.specifiers.iter().any(|s| match s {
                    ImportSpecifier::Named(named) => imported_name(named) == "jsx",
                    _ => false,
                })
        }
        _ => false,
    })
}

/// Exported name of a named import specifier.
pub fn imported_name(named: &ImportNamedSpecifier) -> &str {
    match &named.imported {
        Some(ModuleExportName::Ident(ident)) => &ident.sym,
        Some(ModuleExportName::Str(s)) => &s.value,
        None => &named.local.sym,
    }
}

// -----------------------------------------------------------------------------
// Import injection
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Imported {
    Default,
    Named(String),
}

/// Collects the runtime imports the rewrites need. Identifiers are handed out
/// immediately and the declarations are prepended to the module by [`flush`].
///
/// [`flush`]: ImportInjector::flush
#[derive(Debug, Default)]
pub struct ImportInjector {
    injected: HashMap<(String, Imported), Ident>,
    pending: Vec<ImportDecl>,
    taken: Vec<String>,
}

impl ImportInjector {
    pub fn add_default(&mut self, scope: &ScopeIndex, source: &str, name_hint: &str) -> Ident {
        self.add(scope, source, Imported::Default, name_hint)
    }

    pub fn add_named(&mut self, scope: &ScopeIndex, source: &str, name: &str) -> Ident {
        self.add(scope, source, Imported::Named(name.to_string()), name)
    }

    /// `import "default"` becomes a default import, anything else a named one.
    pub fn add_export(&mut self, scope: &ScopeIndex, source: &str, export: &str) -> Ident {
        if export == "default" {
            self.add_default(scope, source, source.rsplit('/').next().unwrap_or(source))
        } else {
            self.add_named(scope, source, export)
        }
    }

    fn add(
        &mut self,
        scope: &ScopeIndex,
        source: &str,
        imported: Imported,
        name_hint: &str,
    ) -> Ident {
        let key = (source.to_string(), imported);
        if let Some(ident) = self.injected.get(&key) {
            return ident.clone();
        }

        let local = Ident::new(
            self.unique_name(scope, name_hint).into(),
            DUMMY_SP,
            SyntaxContext::empty(),
        );
        let specifier = match &key.1 {
            Imported::Default => ImportSpecifier::Default(ImportDefaultSpecifier {
                span: DUMMY_SP,
                local: local.clone(),
            }),
            Imported::Named(name) => ImportSpecifier::Named(ImportNamedSpecifier {
                span: DUMMY_SP,
                local: local.clone(),
                imported: Some(ModuleExportName::Ident(Ident::new(
                    name.as_str().into(),
                    DUMMY_SP,
                    SyntaxContext::empty(),
                ))),
                is_type_only: false,
            }),
        };
        self.pending.push(ImportDecl {
            span: DUMMY_SP,
            specifiers: vec![specifier],
            src: Box::new(Str {
                span: DUMMY_SP,
                value: source.into(),
                raw: None,
            }),
            type_only: false,
            with: None,
            phase: ImportPhase::Evaluation,
        });

        debug!(source, local = &*local.sym, "emotion: injecting import");
        self.injected.insert(key, local.clone());
        local
    }

    /// `_hint`, then `_hint2`, `_hint3`, ... skipping names already in the module.
    fn unique_name(&mut self, scope: &ScopeIndex, hint: &str) -> String {
        let base: String = hint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
            .collect();
        let base = format!("_{}", base.trim_start_matches('_'));
        let mut candidate = base.clone();
        let mut n = 1;
        while scope.is_name_taken(&candidate) || self.taken.contains(&candidate) {
            n += 1;
            candidate = format!("{base}{n}");
        }
        self.taken.push(candidate.clone());
        candidate
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Prepend every injected import, in injection order.
    pub fn flush(&mut self, module: &mut Module) {
        if self.pending.is_empty() {
            return;
        }
        let mut body: Vec<ModuleItem> = self
            .pending
            .drain(..)
            .map(|decl| ModuleItem::ModuleDecl(ModuleDecl::Import(decl)))
            .collect();
        body.append(&mut module.body);
        module.body = body;
    }

    /// Script counterpart of [`flush`](ImportInjector::flush): every import
    /// becomes `var _x = require("source").export;`, placed after the
    /// directive prologue. `require` is the unresolved global.
    pub fn flush_script(&mut self, script: &mut Script, unresolved_ctxt: SyntaxContext) {
        if self.pending.is_empty() {
            return;
        }
        let decls: Vec<Stmt> = self
            .pending
            .drain(..)
            .flat_map(|decl| require_stmts(decl, unresolved_ctxt))
            .collect();
        let at = script
            .body
            .iter()
            .take_while(|stmt| is_directive(stmt))
            .count();
        let rest = script.body.split_off(at);
        script.body.extend(decls);
        script.body.extend(rest);
    }
}

fn is_directive(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(ExprStmt { expr, .. }) => matches!(&**expr, Expr::Lit(Lit::Str(_))),
        _ => false,
    }
}

fn require_stmts(decl: ImportDecl, unresolved_ctxt: SyntaxContext) -> Vec<Stmt> {
    let require = Ident::new("require".into(), DUMMY_SP, unresolved_ctxt);
    decl.specifiers
        .into_iter()
        .filter_map(|specifier| {
            let (export, local) = match specifier {
                ImportSpecifier::Default(default) => ("default".to_string(), default.local),
                ImportSpecifier::Named(named) => (imported_name(&named).to_string(), named.local),
                ImportSpecifier::Namespace(_) => return None,
            };
            let call = CallExpr {
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                callee: Expr::Ident(require.clone()).as_callee(),
                args: vec![Lit::Str((*decl.src).clone()).as_arg()],
                type_args: None,
            };
            let init = MemberExpr {
                span: DUMMY_SP,
                obj: Box::new(Expr::Call(call)),
                prop: MemberProp::Ident(IdentName::new(export.into(), DUMMY_SP)),
            };
            Some(Stmt::Decl(Decl::Var(Box::new(VarDecl {
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                kind: VarDeclKind::Var,
                declare: false,
                decls: vec![VarDeclarator {
                    span: DUMMY_SP,
                    name: Pat::Ident(local.into()),
                    init: Some(Box::new(Expr::Member(init))),
                    definite: false,
                }],
            }))))
        })
        .collect()
}
