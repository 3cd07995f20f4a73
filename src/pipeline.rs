//! Parse → transform → print, for hosts that hand us text instead of trees.

use crate::esm_transformer::{SourceFile, transform};
use crate::host::ModuleResolutionHost;
use crate::transform_context::TransformContext;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use swc_core::common::comments::{Comments, SingleThreadedComments};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap};
use swc_core::ecma::ast::{EsVersion, Program};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config, Emitter};
use swc_core::ecma::parser::{Syntax, TsSyntax, parse_file_as_module};

/// Source map and comment store shared by the files of one compilation.
#[derive(Default)]
pub struct Session {
    cm: Lrc<SourceMap>,
    comments: SingleThreadedComments,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_map(&self) -> &Lrc<SourceMap> {
        &self.cm
    }

    /// Parse TypeScript source as an ES module.
    pub fn parse(
        &self,
        file_name: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> Result<SourceFile> {
        let file_name = file_name.into();
        let fm = self
            .cm
            .new_source_file(FileName::Real(file_name.clone()).into(), source.into());

        let syntax = Syntax::Typescript(TsSyntax {
            tsx: is_tsx(&file_name),
            ..Default::default()
        });
        let mut recovered = Vec::new();
        let module = parse_file_as_module(
            &fm,
            syntax,
            EsVersion::EsNext,
            Some(&self.comments as &dyn Comments),
            &mut recovered,
        )
        .map_err(|err| anyhow!("failed to parse {}: {:?}", file_name.display(), err))?;

        if let Some(err) = recovered.first() {
            return Err(anyhow!("failed to parse {}: {:?}", file_name.display(), err));
        }

        Ok(SourceFile::new(file_name, Program::Module(module)))
    }

    /// Print a tree back to source text.
    pub fn print(&self, source_file: &SourceFile) -> Result<String> {
        let mut buf = Vec::new();
        {
            let wr = JsWriter::new(self.cm.clone(), "\n", &mut buf, None);
            let mut emitter = Emitter {
                cfg: Config::default(),
                cm: self.cm.clone(),
                comments: Some(&self.comments as &dyn Comments),
                wr,
            };
            let emitted = match &source_file.program {
                Program::Module(module) => emitter.emit_module(module),
                Program::Script(script) => emitter.emit_script(script),
            };
            emitted
                .with_context(|| format!("failed to emit {}", source_file.file_name.display()))?;
        }
        String::from_utf8(buf).context("emitted code is not valid UTF-8")
    }
}

/// Rewrite the module specifiers of one file given as text.
pub fn rewrite_source_text<H: ModuleResolutionHost>(
    ctx: &TransformContext<H>,
    file_name: &Path,
    source: &str,
) -> Result<String> {
    let session = Session::new();
    let source_file = session.parse(file_name, source)?;
    let source_file = transform(ctx).transform_source_file(source_file);
    session.print(&source_file)
}

fn is_tsx(file_name: &Path) -> bool {
    file_name.extension().is_some_and(|ext| ext == "tsx")
}
