//! Lua implementation of the core [`Resolver`]
//!
//! An expression is any Lua expression. It is compiled as the body of
//! `return (...)` and evaluated in a fresh sandbox whose environment holds
//! exactly the event variables and the registered helper modules.
//!
//! Classification of failures:
//! - syntax errors and references to undeclared names are
//!   [`ResolveError::Invalid`], so plain text such as `main` or `ghcr.io`
//!   falls back to a literal
//! - everything else (missing keys, indexing nil, type errors) is
//!   [`ResolveError::Evaluation`]

use latch_core::{ResolutionContext, ResolveError, Resolver};
use mlua::LuaSerdeExt;
use mlua::prelude::*;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::trace;

use crate::module::ModuleRegistry;
use crate::modules::{EventModule, StringsModule};
use crate::sandbox::create_sandbox;

/// Raised by the environment when an expression names something undeclared
#[derive(Debug, Error)]
#[error("undeclared reference to '{0}'")]
struct UndeclaredVariable(String);

/// Creates the registry with every built-in helper module
pub fn default_modules() -> ModuleRegistry {
    let mut modules = ModuleRegistry::new();
    modules.register(EventModule);
    modules.register(StringsModule);
    modules
}

/// Expression resolver backed by a sandboxed Lua 5.4 VM
pub struct LuaResolver {
    modules: ModuleRegistry,
}

impl LuaResolver {
    pub fn new() -> Self {
        Self::with_modules(default_modules())
    }

    pub fn with_modules(modules: ModuleRegistry) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Lua language-server stubs of the expression environment
    pub fn stubs(&self) -> String {
        self.modules.generate_stubs()
    }

    fn evaluate(&self, ctx: &ResolutionContext, expression: &str) -> LuaResult<JsonValue> {
        let lua = create_sandbox()?;
        let env = lua.create_table()?;
        self.modules.register_all(&lua, &env)?;

        let strict = strict_metatable(&lua)?;
        env.set("body", event_value(&lua, &ctx.body, &strict)?)?;
        env.set("header", event_value(&lua, &ctx.header, &strict)?)?;
        env.set("extensions", event_value(&lua, &ctx.extensions, &strict)?)?;
        env.set("params", event_value(&lua, &ctx.params, &strict)?)?;

        let guard = lua.create_table()?;
        guard.set(
            "__index",
            lua.create_function(|_, (_, key): (LuaTable, LuaValue)| {
                Err::<LuaValue, _>(LuaError::external(UndeclaredVariable(key_name(&key))))
            })?,
        )?;
        env.set_metatable(Some(guard))?;

        let value: LuaValue = lua
            .load(format!("return (\n{}\n)", expression))
            .set_name("expression")
            .set_environment(env)
            .eval()?;

        lua.from_value(value)
    }
}

impl Default for LuaResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for LuaResolver {
    fn value_of(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
    ) -> Result<JsonValue, ResolveError> {
        let result = self
            .evaluate(ctx, expression)
            .map_err(|err| classify(expression, err));
        trace!(expression, ok = result.is_ok(), "Evaluated expression");
        result
    }
}

/// Converts event data to Lua, making every object strict
fn event_value<T: serde::Serialize>(
    lua: &Lua,
    data: &T,
    strict: &LuaTable,
) -> LuaResult<LuaValue> {
    let value = lua.to_value(data)?;
    make_strict(&value, strict)?;
    Ok(value)
}

/// Objects raise on missing keys; arrays keep their array metatable
fn make_strict(value: &LuaValue, strict: &LuaTable) -> LuaResult<()> {
    if let LuaValue::Table(table) = value {
        for pair in table.pairs::<LuaValue, LuaValue>() {
            let (_, child) = pair?;
            make_strict(&child, strict)?;
        }
        if table.metatable().is_none() {
            table.set_metatable(Some(strict.clone()))?;
        }
    }
    Ok(())
}

fn strict_metatable(lua: &Lua) -> LuaResult<LuaTable> {
    let metatable = lua.create_table()?;
    metatable.set(
        "__index",
        lua.create_function(|_, (_, key): (LuaTable, LuaValue)| {
            Err::<LuaValue, _>(LuaError::RuntimeError(format!(
                "no such key: {}",
                key_name(&key)
            )))
        })?,
    )?;
    Ok(metatable)
}

fn key_name(key: &LuaValue) -> String {
    match key {
        LuaValue::String(s) => format!("{}", s.to_string_lossy()),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => n.to_string(),
        other => other.type_name().to_string(),
    }
}

fn undeclared(err: &LuaError) -> Option<&UndeclaredVariable> {
    match err {
        LuaError::CallbackError { cause, .. } => undeclared(cause),
        LuaError::WithContext { cause, .. } => undeclared(cause),
        LuaError::ExternalError(inner) => inner.downcast_ref::<UndeclaredVariable>(),
        _ => None,
    }
}

fn classify(expression: &str, err: LuaError) -> ResolveError {
    if let LuaError::SyntaxError { message, .. } = &err {
        return ResolveError::invalid(expression, message.clone());
    }
    if let Some(name) = undeclared(&err) {
        return ResolveError::invalid(expression, name.to_string());
    }
    ResolveError::evaluation(expression, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ResolutionContext {
        let body = json!({
            "action": "opened",
            "ref": "refs/heads/dev",
            "number": 42,
            "draft": false,
            "labels": ["bug", "ci"],
            "repository": { "clone_url": "https://example.com/repo.git" },
            "merged_by": null,
        });
        ResolutionContext::new()
            .with_body(body.as_object().cloned().unwrap())
            .with_header("X-GitHub-Event", vec!["pull_request".to_string()])
            .with_param("namespace", json!("ci"))
    }

    fn value_of(expression: &str) -> Result<JsonValue, ResolveError> {
        LuaResolver::new().value_of(&context(), expression)
    }

    #[test]
    fn test_field_references() {
        assert_eq!(value_of("body.ref").unwrap(), json!("refs/heads/dev"));
        assert_eq!(value_of("body.number").unwrap(), json!(42));
        assert_eq!(value_of("body.labels").unwrap(), json!(["bug", "ci"]));
        assert_eq!(
            value_of("body.repository.clone_url").unwrap(),
            json!("https://example.com/repo.git")
        );
        assert_eq!(value_of("params.namespace").unwrap(), json!("ci"));
    }

    #[test]
    fn test_header_values_are_lists() {
        assert_eq!(
            value_of(r#"header["X-GitHub-Event"][1]"#).unwrap(),
            json!("pull_request")
        );
    }

    #[test]
    fn test_boolean_expressions() {
        assert_eq!(value_of(r#"body.action == "opened""#).unwrap(), json!(true));
        assert_eq!(
            value_of(r#"body.action == "opened" and not body.draft"#).unwrap(),
            json!(true)
        );
        assert_eq!(value_of("body.number > 100").unwrap(), json!(false));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            value_of(r#"strings.trim_prefix(body.ref, "refs/heads/")"#).unwrap(),
            json!("dev")
        );
        assert_eq!(value_of(r#"has(body, "pull_request")"#).unwrap(), json!(false));
        assert_eq!(value_of("body.merged_by == null").unwrap(), json!(true));
    }

    #[test]
    fn test_null_converts_to_json_null() {
        assert_eq!(value_of("body.merged_by").unwrap(), JsonValue::Null);
        assert_eq!(value_of("nil").unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_plain_text_is_invalid() {
        for text in ["main", "literal-text", "ghcr.io", "1h0m0s", "build and push", "refs/heads/main"] {
            let err = value_of(text).unwrap_err();
            assert!(err.is_invalid(), "{} should be invalid, got {:?}", text, err);
        }
    }

    #[test]
    fn test_text_that_parses_as_lua_is_evaluated() {
        let resolver = LuaResolver::new();
        let ctx = context();

        let err = resolver.safe_value_of(&ctx, "#123").unwrap_err();
        assert!(!err.is_invalid());

        assert_eq!(resolver.resolve_string(&ctx, "nil").unwrap(), "");
        assert_eq!(resolver.resolve_string(&ctx, "42").unwrap(), "42");
        assert_eq!(resolver.resolve_string(&ctx, "#123 fix").unwrap(), "#123 fix");
    }

    #[test]
    fn test_missing_key_is_evaluation_error() {
        let err = value_of("body.missing").unwrap_err();
        assert!(!err.is_invalid());
        assert!(err.to_string().contains("no such key: missing"));

        let err = value_of("body.missing.field").unwrap_err();
        assert!(!err.is_invalid());
    }

    #[test]
    fn test_type_error_is_evaluation_error() {
        let err = value_of("body.number .. {}").unwrap_err();
        assert!(!err.is_invalid());
    }

    #[test]
    fn test_safe_value_of_fallback() {
        let resolver = LuaResolver::new();
        let ctx = context();

        assert_eq!(resolver.safe_value_of(&ctx, "main").unwrap(), json!("main"));
        assert_eq!(resolver.resolve_string(&ctx, "body.number").unwrap(), "42");
        assert!(resolver.safe_value_of(&ctx, "body.head_commit.id").is_err());
    }

    #[test]
    fn test_sandbox_is_closed() {
        for expression in ["os", "io.open", r#"require("os")"#, r#"load("return 1")"#] {
            let err = value_of(expression).unwrap_err();
            assert!(err.is_invalid(), "{} should be undeclared", expression);
        }
    }

    #[test]
    fn test_stubs_cover_modules() {
        let stubs = LuaResolver::new().stubs();
        assert!(stubs.contains("function has(tbl, key) end"));
        assert!(stubs.contains("function strings.split(s, sep) end"));
    }
}
