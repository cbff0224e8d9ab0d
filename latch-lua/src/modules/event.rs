//! Event variables and core helpers
//!
//! The four event variables themselves are bound per evaluation by the
//! resolver. This module installs what every expression may use alongside
//! them: the `null` constant, `has`, and a few base library functions.

use crate::module::ExpressionModule;
use mlua::prelude::*;

/// Base library functions re-exported into the expression environment
const BASE_FUNCTIONS: [&str; 5] = ["tostring", "tonumber", "type", "pairs", "ipairs"];

pub struct EventModule;

impl ExpressionModule for EventModule {
    fn id(&self) -> &'static str {
        "event"
    }

    fn register(&self, lua: &Lua, env: &LuaTable) -> LuaResult<()> {
        env.set("null", LuaValue::NULL)?;

        // has(tbl, key) - key lookup that never raises
        env.set(
            "has",
            lua.create_function(|_, (table, key): (Option<LuaTable>, LuaValue)| match table {
                Some(table) => Ok(!table.raw_get::<LuaValue>(key)?.is_nil()),
                None => Ok(false),
            })?,
        )?;

        let globals = lua.globals();
        for name in BASE_FUNCTIONS {
            env.set(name, globals.get::<LuaFunction>(name)?)?;
        }

        Ok(())
    }

    fn stubs(&self) -> String {
        r#"---@meta

---Decoded JSON payload of the event
---Indexing a key the payload does not have is an error; use `has` first
---@type table<string, any>
body = {}

---HTTP headers of the event, each with every received value
---
---@usage
---header["X-GitHub-Event"][1] == "push"
---@type table<string, string[]>
header = {}

---Values attached to the event by earlier interceptors
---@type table<string, any>
extensions = {}

---Static parameters of the trigger binding
---@type table<string, any>
params = {}

---JSON null; compare against it to detect explicit nulls in the payload
---@type lightuserdata
null = nil

---Check whether a table has a key, without raising for missing keys
---@param tbl table?
---@param key any
---@return boolean
---
---@usage
---has(body, "pull_request") and body.pull_request.merged
function has(tbl, key) end
"#
        .to_string()
    }
}
