//! Lua plugin runtime
//!
//! A plugin is a folder whose entry script (`init.lua` unless the manifest
//! says otherwise) returns its exports, or a single `.lua` file:
//!
//! ```lua
//! return {
//!   name = "Heading Flags",
//!   parser = {
//!     before_parse = function(text, uri) return text end,
//!     after_parse = function(note) note.properties.flagged = true return note end,
//!   },
//!   graph_middleware = function(note)
//!     if note.properties.draft then return nil, "drafts stay out" end
//!     return note
//!   end,
//! }
//! ```
//!
//! Notes cross into Lua as plain tables (the serde form of
//! [`Note`]). Hooks may return the note, or `nil` after mutating it in place.
//! Middleware rejects a note by returning `false` or `nil, "reason"`.

use crate::error::{ExtensionError, ExtensionResult};
use crate::loader::ModuleLoader;
use crate::manifest::PluginManifest;
use crate::record::ExtensionRecord;
use async_trait::async_trait;
use loam_core::{GraphMiddleware, MiddlewareError, Note, NoteUri};
use loam_parser::ParserExtension;
use mlua::{
    Function, HookTriggers, Lua, LuaSerdeExt, Result as LuaResult, SerializeOptions, Table, Value,
    VmState,
};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads plugins by running their Lua entry script in a fresh state
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaModuleLoader;

impl LuaModuleLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModuleLoader for LuaModuleLoader {
    async fn load_module(&self, path: &Path) -> ExtensionResult<ExtensionRecord> {
        let owned = path.to_path_buf();
        let cancel = CancelOnDrop::default();
        let flag = cancel.0.clone();
        tokio::task::spawn_blocking(move || load_lua_plugin_until(&owned, flag))
            .await
            .map_err(|e| ExtensionError::load(path, e))?
    }
}

/// Raises its flag when dropped, which happens when the caller stops waiting
#[derive(Default)]
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Instructions between checks of the cancel flag while the entry script runs
const CANCEL_CHECK_INTERVAL: u32 = 10_000;

/// Load the plugin at `path` synchronously
pub fn load_lua_plugin(path: &Path) -> ExtensionResult<ExtensionRecord> {
    load_lua_plugin_until(path, Arc::new(AtomicBool::new(false)))
}

/// Load the plugin at `path`, aborting the entry script once `cancelled` is set
pub fn load_lua_plugin_until(
    path: &Path,
    cancelled: Arc<AtomicBool>,
) -> ExtensionResult<ExtensionRecord> {
    let metadata = std::fs::metadata(path).map_err(|source| io_error(path, source))?;

    let (plugin_dir, entry, manifest_name) = if metadata.is_dir() {
        let manifest =
            PluginManifest::discover_or_default(path).map_err(|source| ExtensionError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        if !manifest.is_enabled() {
            return Err(ExtensionError::Disabled {
                path: path.to_path_buf(),
            });
        }
        let entry = manifest.main_path(path);
        (path.to_path_buf(), entry, manifest.name)
    } else {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        (dir, path.to_path_buf(), None)
    };

    let script = std::fs::read_to_string(&entry).map_err(|source| io_error(&entry, source))?;
    debug!(entry = %entry.display(), "Running plugin entry script");

    let lua = Lua::new();
    prepare_runtime(&lua, &plugin_dir).map_err(|e| ExtensionError::load(path, e))?;

    lua.set_hook(
        HookTriggers::new().every_nth_instruction(CANCEL_CHECK_INTERVAL),
        move |_, _| {
            if cancelled.load(Ordering::Relaxed) {
                Err(mlua::Error::runtime("plugin load cancelled"))
            } else {
                Ok(VmState::Continue)
            }
        },
    )
    .map_err(|e| ExtensionError::load(path, e))?;

    let exports = lua
        .load(script.as_str())
        .set_name(format!("@{}", entry.display()))
        .eval::<Value>();
    lua.remove_hook();
    let exports = exports.map_err(|e| ExtensionError::load(path, e))?;

    build_record(&lua, exports, path, manifest_name.as_deref())
}

fn io_error(path: &Path, source: std::io::Error) -> ExtensionError {
    if source.kind() == ErrorKind::NotFound {
        ExtensionError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        ExtensionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Make sibling modules requirable and expose the `loam` table
fn prepare_runtime(lua: &Lua, plugin_dir: &Path) -> LuaResult<()> {
    let globals = lua.globals();

    let package: Table = globals.get("package")?;
    let existing: String = package.get("path")?;
    let dir = plugin_dir.display();
    package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua;{existing}"))?;

    let loam = lua.create_table()?;
    loam.set("plugin_dir", plugin_dir.display().to_string())?;
    register_log_module(lua, &loam)?;
    globals.set("loam", loam)?;

    Ok(())
}

/// `loam.log.debug/info/warn(msg)`, forwarded to tracing
fn register_log_module(lua: &Lua, loam: &Table) -> LuaResult<()> {
    let log = lua.create_table()?;

    log.set(
        "debug",
        lua.create_function(|_, msg: String| {
            debug!(target: "loam_plugins::script", "{}", msg);
            Ok(())
        })?,
    )?;
    log.set(
        "info",
        lua.create_function(|_, msg: String| {
            info!(target: "loam_plugins::script", "{}", msg);
            Ok(())
        })?,
    )?;
    log.set(
        "warn",
        lua.create_function(|_, msg: String| {
            warn!(target: "loam_plugins::script", "{}", msg);
            Ok(())
        })?,
    )?;

    loam.set("log", log)?;
    Ok(())
}

/// Validate the script's exports and wrap its hooks
fn build_record(
    lua: &Lua,
    exports: Value,
    path: &Path,
    manifest_name: Option<&str>,
) -> ExtensionResult<ExtensionRecord> {
    let exports = match exports {
        Value::Table(table) => table,
        other => {
            return Err(ExtensionError::shape(
                path,
                format!("entry script must return a table, got {}", other.type_name()),
            ))
        }
    };

    let load_err = |e: mlua::Error| ExtensionError::load(path, e);

    let name = match exports.get::<Value>("name").map_err(load_err)? {
        Value::String(s) => s.to_str().map_err(load_err)?.trim().to_string(),
        Value::Nil => match manifest_name {
            Some(name) => name.trim().to_string(),
            None => return Err(ExtensionError::shape(path, "missing `name`")),
        },
        other => {
            return Err(ExtensionError::shape(
                path,
                format!("`name` must be a string, got {}", other.type_name()),
            ))
        }
    };
    if name.is_empty() {
        return Err(ExtensionError::shape(path, "`name` must not be empty"));
    }

    let mut record = ExtensionRecord::new(name.clone(), path);

    match exports.get::<Value>("parser").map_err(load_err)? {
        Value::Nil => {}
        Value::Table(parser) => {
            let before_parse = optional_function(&parser, "before_parse", path)?;
            let after_parse = optional_function(&parser, "after_parse", path)?;
            record = record.with_parser(Arc::new(LuaParserExtension {
                name: name.clone(),
                lua: lua.clone(),
                before_parse,
                after_parse,
            }));
        }
        other => {
            return Err(ExtensionError::shape(
                path,
                format!("`parser` must be a table, got {}", other.type_name()),
            ))
        }
    }

    match exports.get::<Value>("graph_middleware").map_err(load_err)? {
        Value::Nil => {}
        Value::Function(apply) => {
            record = record.with_graph_middleware(Arc::new(LuaGraphMiddleware {
                name,
                lua: lua.clone(),
                apply,
            }));
        }
        other => {
            return Err(ExtensionError::shape(
                path,
                format!("`graph_middleware` must be a function, got {}", other.type_name()),
            ))
        }
    }

    Ok(record)
}

fn optional_function(table: &Table, key: &str, path: &Path) -> ExtensionResult<Option<Function>> {
    match table
        .get::<Value>(key)
        .map_err(|e| ExtensionError::load(path, e))?
    {
        Value::Nil => Ok(None),
        Value::Function(f) => Ok(Some(f)),
        other => Err(ExtensionError::shape(
            path,
            format!("`parser.{}` must be a function, got {}", key, other.type_name()),
        )),
    }
}

/// Serialize a note for a hook; absent fields become `nil`
fn note_to_lua(lua: &Lua, note: &Note) -> LuaResult<Value> {
    lua.to_value_with(note, SerializeOptions::new().serialize_none_to_null(false))
}

/// Parser hooks implemented by a Lua plugin
pub struct LuaParserExtension {
    name: String,
    lua: Lua,
    before_parse: Option<Function>,
    after_parse: Option<Function>,
}

impl ParserExtension for LuaParserExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_parse(&self, uri: &NoteUri, text: String) -> anyhow::Result<String> {
        let Some(hook) = &self.before_parse else {
            return Ok(text);
        };

        match hook.call::<Value>((text.clone(), uri.to_string()))? {
            Value::Nil => Ok(text),
            Value::String(s) => Ok(s.to_str()?.to_string()),
            other => anyhow::bail!(
                "before_parse must return a string or nil, got {}",
                other.type_name()
            ),
        }
    }

    fn after_parse(&self, note: Note) -> anyhow::Result<Note> {
        let Some(hook) = &self.after_parse else {
            return Ok(note);
        };

        let table = note_to_lua(&self.lua, &note)?;
        let returned = match hook.call::<Value>(table.clone())? {
            Value::Nil => table,
            value @ Value::Table(_) => value,
            other => anyhow::bail!(
                "after_parse must return a note table or nil, got {}",
                other.type_name()
            ),
        };
        Ok(self.lua.from_value(returned)?)
    }
}

/// Graph middleware implemented by a Lua plugin
pub struct LuaGraphMiddleware {
    name: String,
    lua: Lua,
    apply: Function,
}

impl GraphMiddleware for LuaGraphMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, note: Note) -> Result<Note, MiddlewareError> {
        let table = note_to_lua(&self.lua, &note).map_err(anyhow::Error::from)?;
        let (result, reason): (Value, Option<String>) = self
            .apply
            .call(table.clone())
            .map_err(anyhow::Error::from)?;

        let returned = match (result, reason) {
            (Value::Nil | Value::Boolean(false), Some(reason)) => {
                return Err(MiddlewareError::rejected(reason))
            }
            (Value::Boolean(false), None) => {
                return Err(MiddlewareError::rejected(format!("rejected by {}", self.name)))
            }
            (Value::Nil, None) => table,
            (value @ Value::Table(_), _) => value,
            (other, _) => {
                return Err(anyhow::anyhow!(
                    "graph_middleware must return a note table, got {}",
                    other.type_name()
                )
                .into())
            }
        };

        Ok(self
            .lua
            .from_value::<Note>(returned)
            .map_err(anyhow::Error::from)?)
    }
}
