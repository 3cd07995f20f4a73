//! Module specifier rewriting for ES module output.
//!
//! A per-file transform that runs after type checking, right before a
//! compiler prints JavaScript. Every relative specifier on an import, a
//! re-export or a dynamic `import()` is replaced with the path of the file
//! module resolution actually picked, relative to the importing file, with a
//! `.ts` suffix swapped for `.mjs`:
//!
//! ```text
//! import { add } from './lib';          // src/app.ts, src/lib.ts exists
//! import { add } from './lib.mjs';
//! ```
//!
//! Bare specifiers and specifiers that do not resolve are left alone.

// Compiler options and tsconfig.json loading
pub mod config;
pub use config::{CompilerOptions, ModuleKind, ModuleResolutionKind, load_compiler_options};

// File-system probes used by module resolution
pub mod host;
pub use host::{InMemoryHost, ModuleResolutionHost, RealFileSystem};

// Relative specifier -> source file resolution
pub mod module_resolver;
pub use module_resolver::{ModuleExtension, ModuleResolver, ResolvedModule};

// Path arithmetic on specifiers
pub mod specifier;

// Read-only state shared by every per-file transform
pub mod transform_context;
pub use transform_context::TransformContext;

// The specifier rewrite pass itself
pub mod esm_transformer;
pub use esm_transformer::{EsmTransformer, SourceFile, transform};

// Parse / print helpers around the pass
pub mod pipeline;
pub use pipeline::{Session, rewrite_source_text};

pub mod util;
pub use util::{create_get_canonical_file_name, exit};

// Tracing configuration (text / tree / JSON output for debugging)
pub mod tracing_config;
pub use tracing_config::init_tracing;
