use std::path::PathBuf;

use swc_core::common::errors::{Handler, HANDLER};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, SourceMapper, SyntaxContext, GLOBALS};
use swc_core::ecma::ast::{Expr, ModuleItem, Program, Stmt};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::Emitter;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::{emotion, EmotionOptions, EmotionTransform, FileEnv};

pub const TEST_CWD: &str = "/project";
pub const TEST_FILENAME: &str = "/project/src/App.js";

pub struct RunTestContext {
    pub source_map: Lrc<SourceMap>,
    pub unresolved_mark: Mark,
    #[allow(unused)]
    pub top_level_mark: Mark,
}

pub struct RunVisitResult<V> {
    pub output_code: String,
    pub visitor: V,
    pub has_errors: bool,
}

fn parse(source_map: &Lrc<SourceMap>, code: &str, filename: &str, script: bool) -> Program {
    let fm = source_map.new_source_file(
        Lrc::new(FileName::Real(PathBuf::from(filename))),
        code.to_string(),
    );
    let mut parser = Parser::new(
        Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        StringInput::from(&*fm),
        None,
    );
    if script {
        Program::Script(parser.parse_script().expect("parse script"))
    } else {
        Program::Module(parser.parse_module().expect("parse module"))
    }
}

fn print(source_map: &Lrc<SourceMap>, program: &Program) -> String {
    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: Default::default(),
            cm: source_map.clone(),
            comments: None,
            wr: JsWriter::new(source_map.clone(), "\n", &mut buf, None),
        };
        match program {
            Program::Module(module) => emitter.emit_module(module).expect("emit module"),
            Program::Script(script) => emitter.emit_script(script).expect("emit script"),
        }
    }
    String::from_utf8(buf).expect("utf8 output")
}

/// Parse `code` as `filename`, run the resolver, then the visitor built by
/// `make_visit`, and print the result. Diagnostics are swallowed and reported
/// through `has_errors`.
pub fn run_test_visit_at<V: VisitMut>(
    code: &str,
    filename: &str,
    make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
    run_program(code, filename, false, make_visit)
}

/// Like [`run_test_visit`] with `code` parsed as a script.
pub fn run_script_visit<V: VisitMut>(
    code: &str,
    make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
    run_program(code, TEST_FILENAME, true, make_visit)
}

fn run_program<V: VisitMut>(
    code: &str,
    filename: &str,
    script: bool,
    make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
    let source_map: Lrc<SourceMap> = Default::default();
    let mut program = parse(&source_map, code, filename, script);
    let handler =
        Handler::with_emitter_writer(Box::new(std::io::sink()), Some(source_map.clone()));

    let (output_code, visitor) = GLOBALS.set(&Globals::new(), || {
        HANDLER.set(&handler, || {
            let unresolved_mark = Mark::new();
            let top_level_mark = Mark::new();
            program.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, false));

            let mut visitor = make_visit(RunTestContext {
                source_map: source_map.clone(),
                unresolved_mark,
                top_level_mark,
            });
            program.visit_mut_with(&mut visitor);
            (print(&source_map, &program), visitor)
        })
    });

    RunVisitResult {
        output_code,
        visitor,
        has_errors: handler.has_errors(),
    }
}

pub fn run_test_visit<V: VisitMut>(
    code: &str,
    make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
    run_test_visit_at(code, TEST_FILENAME, make_visit)
}

pub fn test_env(context: &RunTestContext, filename: Option<&str>) -> FileEnv {
    let source_map: Lrc<dyn SourceMapper> = context.source_map.clone();
    FileEnv {
        filename: filename.map(str::to_string),
        cwd: PathBuf::from(TEST_CWD),
        unresolved_mark: context.unresolved_mark,
        source_map: Some(source_map),
    }
}

/// Run the full transform on `code` as if it lived at [`TEST_FILENAME`].
pub fn run_emotion(code: &str, options: EmotionOptions) -> RunVisitResult<EmotionTransform> {
    run_test_visit(code, |context| {
        emotion(options, test_env(&context, Some(TEST_FILENAME)))
    })
}

/// [`run_emotion`] for a CommonJS script.
pub fn run_emotion_script(code: &str, options: EmotionOptions) -> RunVisitResult<EmotionTransform> {
    run_script_visit(code, |context| {
        emotion(options, test_env(&context, Some(TEST_FILENAME)))
    })
}

/// Parse `code` and return its last expression statement along with the
/// unresolved context.
pub fn parse_expr(code: &str) -> (Expr, SyntaxContext) {
    let source_map: Lrc<SourceMap> = Default::default();
    let mut module = parse(&source_map, code, TEST_FILENAME, false).expect_module();
    GLOBALS.set(&Globals::new(), || {
        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();
        module.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, false));
        let expr = module
            .body
            .into_iter()
            .rev()
            .find_map(|item| match item {
                ModuleItem::Stmt(Stmt::Expr(stmt)) => Some(*stmt.expr),
                _ => None,
            })
            .expect("expression statement");
        (expr, SyntaxContext::empty().apply_mark(unresolved_mark))
    })
}

/// Drop whitespace and semicolons so generated code can be compared to a
/// hand-written expectation.
pub fn normalize(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != ';')
        .collect()
}

#[track_caller]
pub fn assert_contains(output: &str, expected: &str) {
    let output_n = normalize(output);
    let expected_n = normalize(expected);
    assert!(
        output_n.contains(&expected_n),
        "expected output to contain:\n{expected}\n\noutput:\n{output}"
    );
}

#[track_caller]
pub fn assert_not_contains(output: &str, unexpected: &str) {
    assert!(
        !normalize(output).contains(&normalize(unexpected)),
        "expected output not to contain:\n{unexpected}\n\noutput:\n{output}"
    );
}
