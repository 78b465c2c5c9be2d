use base64::{engine::general_purpose::STANDARD, Engine as _};
use sourcemap::SourceMapBuilder;
use swc_core::common::Span;
use tracing::warn;

use crate::state::FileState;

const SOURCE_MAP_PREFIX: &str = "/*# sourceMappingURL=data:application/json;charset=utf-8;base64,";

/// Inline source-map comment pointing generated line 1 column 0 at the start
/// of `span` in the original file.
pub fn get_source_map(span: Span, state: &FileState) -> Option<String> {
    if span.is_dummy() {
        return None;
    }
    let filename = state.filename.as_deref()?;
    let cm = state.source_map.as_ref()?;
    let loc = cm.lookup_char_pos(span.lo());
    let contents: &str = &loc.file.src;

    let mut builder = SourceMapBuilder::new(None);
    let source_id = builder.add_source(filename);
    builder.set_source_contents(source_id, Some(contents));
    builder.add_raw(
        0,
        0,
        loc.line.saturating_sub(1) as u32,
        loc.col.0 as u32,
        Some(source_id),
        None,
        false,
    );

    let mut json = vec![];
    if let Err(err) = builder.into_sourcemap().to_writer(&mut json) {
        warn!(%err, filename, "emotion: failed to serialize source map");
        return None;
    }
    Some(format!("{SOURCE_MAP_PREFIX}{} */", STANDARD.encode(json)))
}

pub fn is_source_map_comment(value: &str) -> bool {
    value.starts_with(SOURCE_MAP_PREFIX)
}
