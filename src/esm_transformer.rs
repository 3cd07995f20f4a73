//! ESM specifier rewrite pass.
//!
//! Folds one source file's tree and rewrites every relative module specifier
//! it finds on
//! - import declarations: `import { f } from './lib'`
//! - re-exports: `export { f } from './lib'`, `export * from './lib'`
//! - dynamic imports: `import('./lib')`
//!
//! to the path of the file the compiler resolves it to, relative to the
//! importing file and with a `.ts` suffix swapped for `.mjs`. Bare specifiers
//! and specifiers that do not resolve are left exactly as written.
//!
//! Nodes are never edited in place: a rewritten node is rebuilt from the old
//! one with only its specifier slot replaced, and the replacement literal
//! keeps the original literal's span so source maps still point at the
//! original text.

use crate::host::ModuleResolutionHost;
use crate::module_resolver::ModuleResolver;
use crate::specifier::{is_relative_specifier, transformed_specifier};
use crate::transform_context::TransformContext;
use std::path::{Path, PathBuf};
use swc_core::common::Span;
use swc_core::ecma::ast::{
    CallExpr, Callee, ExportAll, Expr, ExprOrSpread, ImportDecl, Lit, Module, NamedExport,
    Program, Str,
};
use swc_core::ecma::visit::{Fold, FoldWith};
use tracing::{debug, debug_span};

/// One compilation unit: its path and its syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: PathBuf,
    pub program: Program,
}

impl SourceFile {
    pub fn new(file_name: impl Into<PathBuf>, program: Program) -> Self {
        SourceFile {
            file_name: file_name.into(),
            program,
        }
    }

    /// The tree as a module, if it was parsed with the module goal.
    pub fn module(&self) -> Option<&Module> {
        match &self.program {
            Program::Module(module) => Some(module),
            Program::Script(_) => None,
        }
    }
}

/// Build the rewrite pass for one compilation.
pub fn transform<H: ModuleResolutionHost>(ctx: &TransformContext<H>) -> EsmTransformer<'_, H> {
    EsmTransformer { ctx }
}

/// Per-compilation transformer; call it once per source file.
#[derive(Debug)]
pub struct EsmTransformer<'a, H> {
    ctx: &'a TransformContext<H>,
}

impl<H: ModuleResolutionHost> EsmTransformer<'_, H> {
    pub fn transform_source_file(&self, source_file: SourceFile) -> SourceFile {
        let SourceFile { file_name, program } = source_file;
        let program = self.transform_program(&file_name, program);
        SourceFile { file_name, program }
    }

    pub fn transform_program(&self, file_name: &Path, program: Program) -> Program {
        let _span = self.file_span(file_name).entered();
        program.fold_with(&mut self.visitor(file_name))
    }

    pub fn transform_module(&self, file_name: &Path, module: Module) -> Module {
        let _span = self.file_span(file_name).entered();
        module.fold_with(&mut self.visitor(file_name))
    }

    fn file_span(&self, file_name: &Path) -> tracing::Span {
        debug_span!(
            "esm_transform",
            file = %file_name.display(),
            resolution = ?self.ctx.compiler_options().effective_module_resolution()
        )
    }

    fn visitor<'f>(&'f self, file_name: &'f Path) -> ImportExportVisitor<'f, H> {
        ImportExportVisitor {
            resolver: self.ctx.module_resolver(),
            file_name,
        }
    }
}

struct ImportExportVisitor<'a, H: ModuleResolutionHost + ?Sized> {
    resolver: ModuleResolver<'a, H>,
    file_name: &'a Path,
}

impl<H: ModuleResolutionHost + ?Sized> ImportExportVisitor<'_, H> {
    /// The literal that should replace `specifier`, or `None` if the
    /// specifier is bare, unresolved, or already correct.
    fn rewrite_specifier(&self, specifier: &str, span: Span) -> Option<Str> {
        if !is_relative_specifier(specifier) {
            return None;
        }

        let module = self.resolver.resolve(specifier, self.file_name)?;
        let transformed = transformed_specifier(self.file_name, &module.resolved_path);
        if transformed == specifier {
            return None;
        }

        debug!(
            file = %self.file_name.display(),
            from = %module.original_specifier,
            to = %transformed,
            extension = module.extension.as_str(),
            "rewriting module specifier"
        );
        Some(Str {
            span,
            value: transformed.into(),
            raw: None,
        })
    }

    fn rewrite_src(&self, src: &Str) -> Option<Box<Str>> {
        self.rewrite_specifier(&src.value, src.span).map(Box::new)
    }
}

impl<H: ModuleResolutionHost + ?Sized> Fold for ImportExportVisitor<'_, H> {
    fn fold_import_decl(&mut self, node: ImportDecl) -> ImportDecl {
        match self.rewrite_src(&node.src) {
            Some(src) => ImportDecl { src, ..node },
            None => node.fold_children_with(self),
        }
    }

    fn fold_named_export(&mut self, node: NamedExport) -> NamedExport {
        match node.src.as_deref().and_then(|src| self.rewrite_src(src)) {
            Some(src) => NamedExport {
                src: Some(src),
                ..node
            },
            None => node.fold_children_with(self),
        }
    }

    fn fold_export_all(&mut self, node: ExportAll) -> ExportAll {
        match self.rewrite_src(&node.src) {
            Some(src) => ExportAll { src, ..node },
            None => node.fold_children_with(self),
        }
    }

    fn fold_call_expr(&mut self, node: CallExpr) -> CallExpr {
        let replacement = if matches!(node.callee, Callee::Import(_)) {
            node.args
                .first()
                .and_then(literal_argument)
                .and_then(|(specifier, span)| self.rewrite_specifier(&specifier, span))
        } else {
            None
        };

        match replacement {
            Some(src) => {
                let mut args = node.args;
                args[0] = ExprOrSpread {
                    spread: None,
                    expr: Box::new(Expr::Lit(Lit::Str(src))),
                };
                CallExpr { args, ..node }
            }
            None => node.fold_children_with(self),
        }
    }
}

/// Text and span of a dynamic import's specifier argument, when it is written
/// as a string literal or a template literal without substitutions.
fn literal_argument(arg: &ExprOrSpread) -> Option<(String, Span)> {
    if arg.spread.is_some() {
        return None;
    }
    match &*arg.expr {
        Expr::Lit(Lit::Str(s)) => Some((s.value.to_string(), s.span)),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            let quasi = tpl.quasis.first()?;
            let text = quasi.cooked.as_ref().unwrap_or(&quasi.raw);
            Some((text.to_string(), tpl.span))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerOptions;
    use crate::host::InMemoryHost;
    use crate::pipeline::Session;
    use swc_core::common::DUMMY_SP;
    use swc_core::ecma::ast::{ModuleDecl, ModuleItem};

    fn ctx() -> TransformContext<InMemoryHost> {
        let host = InMemoryHost::new()
            .with_file("/proj/src/lib.ts", "")
            .with_file("/proj/src/view.tsx", "")
            .with_file("/proj/shared/util.ts", "");
        TransformContext::new(CompilerOptions::default(), host)
    }

    fn export_all_src(module: &Module) -> &Str {
        match &module.body[0] {
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) => &export.src,
            other => panic!("expected export *, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_specifier_uses_given_span() {
        let ctx = ctx();
        let transformer = transform(&ctx);
        let v = transformer.visitor(Path::new("/proj/src/app.ts"));
        let rewritten = v.rewrite_specifier("./lib", DUMMY_SP).unwrap();
        assert_eq!(&*rewritten.value, "./lib.mjs");
        assert_eq!(rewritten.span, DUMMY_SP);
        assert!(rewritten.raw.is_none());
    }

    #[test]
    fn test_rewrite_specifier_skips_unchanged_and_unresolved() {
        let ctx = ctx();
        let transformer = transform(&ctx);
        let v = transformer.visitor(Path::new("/proj/src/app.ts"));
        assert!(v.rewrite_specifier("./lib.mjs", DUMMY_SP).is_none());
        assert!(v.rewrite_specifier("./view.tsx", DUMMY_SP).is_none());
        assert!(v.rewrite_specifier("./missing", DUMMY_SP).is_none());
        assert!(v.rewrite_specifier("lodash", DUMMY_SP).is_none());
    }

    #[test]
    fn test_rewrite_specifier_keeps_other_extensions() {
        let ctx = ctx();
        let transformer = transform(&ctx);
        let v = transformer.visitor(Path::new("/proj/src/app.ts"));
        let rewritten = v.rewrite_specifier("./view", DUMMY_SP).unwrap();
        assert_eq!(&*rewritten.value, "./view.tsx");
    }

    #[test]
    fn test_export_all_replaces_only_src() {
        let ctx = ctx();
        let session = Session::new();
        let file = session
            .parse("/proj/src/app.ts", "export * from '../shared/util';")
            .unwrap();
        let before = file.module().unwrap().clone();

        let after = transform(&ctx).transform_module(&file.file_name, before.clone());
        let (old_src, new_src) = (export_all_src(&before), export_all_src(&after));
        assert_eq!(&*new_src.value, "../shared/util.mjs");
        assert_eq!(new_src.span, old_src.span);
        assert_eq!(after.span, before.span);
    }

    #[test]
    fn test_transform_module_without_relative_specifiers_is_identity() {
        let ctx = ctx();
        let session = Session::new();
        let file = session
            .parse("/proj/src/app.ts", "export * from 'some-package';\nconst x = 1;")
            .unwrap();
        let module = file.module().unwrap().clone();
        let out = transform(&ctx).transform_module(&file.file_name, module.clone());
        assert_eq!(out, module);
    }
}
