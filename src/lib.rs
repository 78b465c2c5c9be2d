use std::path::PathBuf;

use swc_core::{
    common::{
        errors::HANDLER, plugin::metadata::TransformPluginMetadataContextKind, sync::Lrc,
        SourceMapper,
    },
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
    plugin::{plugin_transform, proxies::TransformPluginProgramMetadata},
};
use tracing::warn;

mod css_prop;
mod dispatch;
mod errors;
mod hash;
mod label;
mod macros;
mod options;
mod resolve;
mod scope;
mod source_map;
mod state;
#[cfg(test)]
mod test_utils;
mod with_component;

pub use errors::EmotionError;
pub use options::EmotionOptions;
pub use state::{FileEnv, FileState};

use label::{track_labels, LabelStack};

// -----------------------------------------------------------------------------
// Transform
// -----------------------------------------------------------------------------

/// The emotion transform for one file. Macro imports are expanded first, then
/// css props and `withComponent` calls are rewritten on the way through the
/// tree, and the runtime imports are added last.
pub struct EmotionTransform {
    options: EmotionOptions,
    env: Option<FileEnv>,
    state: Option<FileState>,
    labels: LabelStack,
}

pub fn emotion(options: EmotionOptions, env: FileEnv) -> EmotionTransform {
    EmotionTransform {
        options,
        env: Some(env),
        state: None,
        labels: LabelStack::default(),
    }
}

impl EmotionTransform {
    /// State of the file being transformed, once the module has been entered.
    pub fn state(&self) -> Option<&FileState> {
        self.state.as_ref()
    }
}

impl VisitMut for EmotionTransform {
    track_labels!();

    fn visit_mut_module(&mut self, module: &mut Module) {
        let Some(env) = self.env.take() else {
            return;
        };
        let mut state = FileState::new(&self.options, env, module);
        dispatch::process_imports(module, &mut state);
        self.state = Some(state);

        module.visit_mut_children_with(self);

        if let Some(state) = self.state.as_mut() {
            state.imports.flush(module);
        }
    }

    /// CommonJS files have no import macros, but the css prop and
    /// `withComponent` rewrites still apply.
    fn visit_mut_script(&mut self, script: &mut Script) {
        let Some(env) = self.env.take() else {
            return;
        };
        self.state = Some(FileState::for_script(&self.options, env, script));

        script.visit_mut_children_with(self);

        if let Some(state) = self.state.as_mut() {
            state.imports.flush_script(script, state.unresolved_ctxt);
        }
    }

    fn visit_mut_jsx_attr(&mut self, attr: &mut JSXAttr) {
        if let Some(state) = self.state.as_mut() {
            css_prop::optimize_css_prop(attr, state, self.labels.current());
        }
        attr.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        call.visit_mut_children_with(self);

        let Some(state) = self.state.as_mut() else {
            return;
        };
        let label = self.labels.current();
        if let Err(err) = with_component::normalize_with_component(call, state, label) {
            HANDLER.with(|handler| handler.struct_span_err(call.span, &err.to_string()).emit());
        }
    }
}

// -----------------------------------------------------------------------------
// Plugin entry
// -----------------------------------------------------------------------------

fn plugin_options(config: Option<String>) -> EmotionOptions {
    let Some(config) = config else {
        return EmotionOptions::default();
    };
    EmotionOptions::from_json(&config).unwrap_or_else(|err| {
        warn!(%err, "emotion: ignoring plugin configuration");
        EmotionOptions::default()
    })
}

#[plugin_transform]
pub fn process_transform(
    mut program: Program,
    metadata: TransformPluginProgramMetadata,
) -> Program {
    let options = plugin_options(metadata.get_transform_plugin_config());

    let filename = metadata.get_context(&TransformPluginMetadataContextKind::Filename);
    let cwd = metadata
        .get_context(&TransformPluginMetadataContextKind::Cwd)
        .map(PathBuf::from)
        .unwrap_or_default();

    let source_map: Lrc<dyn SourceMapper> = Lrc::new(metadata.source_map);
    let env = FileEnv {
        filename,
        cwd,
        unresolved_mark: metadata.unresolved_mark,
        source_map: Some(source_map),
    };

    program.visit_mut_with(&mut emotion(options, env));
    program
}
