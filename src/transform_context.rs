//! Transform Context
//!
//! Everything a per-file transform may consult while it walks a tree: the
//! compiler options of the current compilation and the file-system probes
//! module resolution runs against. The context is read-only for the duration
//! of a walk, so one context can serve any number of files.

use crate::config::CompilerOptions;
use crate::host::{ModuleResolutionHost, RealFileSystem};
use crate::module_resolver::ModuleResolver;

#[derive(Debug, Clone, Default)]
pub struct TransformContext<H = RealFileSystem> {
    compiler_options: CompilerOptions,
    host: H,
}

impl<H: ModuleResolutionHost> TransformContext<H> {
    pub fn new(compiler_options: CompilerOptions, host: H) -> Self {
        TransformContext {
            compiler_options,
            host,
        }
    }

    pub fn compiler_options(&self) -> &CompilerOptions {
        &self.compiler_options
    }

    /// A resolver bound to this context's options and probes.
    pub fn module_resolver(&self) -> ModuleResolver<'_, H> {
        ModuleResolver::new(self.compiler_options(), &self.host)
    }
}

impl TransformContext<RealFileSystem> {
    /// Context that resolves against the real file system.
    pub fn with_real_file_system(compiler_options: CompilerOptions) -> Self {
        TransformContext::new(compiler_options, RealFileSystem)
    }
}
