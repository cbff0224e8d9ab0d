//! String helpers for expressions
//!
//! Plain-text counterparts of the Lua pattern functions: none of these
//! interpret their arguments as patterns, so `strings.contains(ref, ".")`
//! matches a literal dot.

use crate::module::ExpressionModule;
use mlua::LuaSerdeExt;
use mlua::prelude::*;

pub struct StringsModule;

impl ExpressionModule for StringsModule {
    fn id(&self) -> &'static str {
        "strings"
    }

    fn register(&self, lua: &Lua, env: &LuaTable) -> LuaResult<()> {
        let strings = lua.create_table()?;

        strings.set(
            "starts_with",
            lua.create_function(|_, (s, prefix): (String, String)| Ok(s.starts_with(&prefix)))?,
        )?;

        strings.set(
            "ends_with",
            lua.create_function(|_, (s, suffix): (String, String)| Ok(s.ends_with(&suffix)))?,
        )?;

        strings.set(
            "contains",
            lua.create_function(|_, (s, needle): (String, String)| Ok(s.contains(&needle)))?,
        )?;

        // strings.split(s, sep) - always a sequence, even when empty
        strings.set(
            "split",
            lua.create_function(|lua, (s, sep): (String, String)| {
                let parts: Vec<String> = if sep.is_empty() {
                    s.chars().map(String::from).collect()
                } else {
                    s.split(&sep).map(String::from).collect()
                };
                lua.to_value(&parts)
            })?,
        )?;

        strings.set(
            "trim",
            lua.create_function(|_, s: String| Ok(s.trim().to_string()))?,
        )?;

        strings.set(
            "trim_prefix",
            lua.create_function(|_, (s, prefix): (String, String)| {
                Ok(s.strip_prefix(&prefix).unwrap_or(&s).to_string())
            })?,
        )?;

        strings.set(
            "trim_suffix",
            lua.create_function(|_, (s, suffix): (String, String)| {
                Ok(s.strip_suffix(&suffix).unwrap_or(&s).to_string())
            })?,
        )?;

        strings.set(
            "lower",
            lua.create_function(|_, s: String| Ok(s.to_lowercase()))?,
        )?;

        strings.set(
            "upper",
            lua.create_function(|_, s: String| Ok(s.to_uppercase()))?,
        )?;

        strings.set(
            "replace",
            lua.create_function(|_, (s, from, to): (String, String, String)| {
                Ok(s.replace(&from, &to))
            })?,
        )?;

        strings.set(
            "join",
            lua.create_function(|_, (parts, sep): (Vec<String>, Option<String>)| {
                Ok(parts.join(sep.as_deref().unwrap_or("")))
            })?,
        )?;

        env.set(self.id(), strings)?;
        Ok(())
    }

    fn stubs(&self) -> String {
        r#"---@meta

---Plain-text string helpers; arguments are never treated as Lua patterns
---@class strings
strings = {}

---@param s string
---@param prefix string
---@return boolean
function strings.starts_with(s, prefix) end

---@param s string
---@param suffix string
---@return boolean
function strings.ends_with(s, suffix) end

---@param s string
---@param needle string
---@return boolean
function strings.contains(s, needle) end

---Split a string on every occurrence of a separator
---An empty separator splits into single characters
---@param s string
---@param sep string
---@return string[]
---
---@usage
---strings.split(body.ref, "/")[3]  -- "main" for "refs/heads/main"
function strings.split(s, sep) end

---Remove leading and trailing whitespace
---@param s string
---@return string
function strings.trim(s) end

---Remove a prefix if present
---@param s string
---@param prefix string
---@return string
---
---@usage
---strings.trim_prefix(body.ref, "refs/heads/")
function strings.trim_prefix(s, prefix) end

---Remove a suffix if present
---@param s string
---@param suffix string
---@return string
function strings.trim_suffix(s, suffix) end

---@param s string
---@return string
function strings.lower(s) end

---@param s string
---@return string
function strings.upper(s) end

---Replace every occurrence of `from` with `to`
---@param s string
---@param from string
---@param to string
---@return string
function strings.replace(s, from, to) end

---Concatenate a list of strings
---@param parts string[]
---@param sep? string Defaults to the empty string
---@return string
function strings.join(parts, sep) end
"#
        .to_string()
    }
}
