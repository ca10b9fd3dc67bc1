//! Loam local plugins
//!
//! Plugins live in folders listed under `experimental.localPlugins` and are
//! written in Lua. Each one may contribute a parser extension, a graph
//! middleware, or both:
//!
//! - [`ExtensionLoader`]: concurrent, timeout-bounded loading with per-folder isolation
//! - [`ModuleLoader`]: seam for how one folder becomes an [`ExtensionRecord`]
//! - [`LuaModuleLoader`]: the default, running each plugin in its own Lua 5.4 state

pub mod error;
pub mod loader;
pub mod lua;
pub mod manifest;
pub mod record;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExtensionError, ExtensionResult};
pub use loader::{load_extensions, ExtensionLoader, LoadReport, ModuleLoader};
pub use lua::{
    load_lua_plugin, load_lua_plugin_until, LuaGraphMiddleware, LuaModuleLoader,
    LuaParserExtension,
};
pub use manifest::{ManifestError, PluginManifest};
pub use record::{graph_middleware, parser_extensions, ExtensionRecord};
