use mlua::prelude::*;

/// Trait for helper modules available to expressions.
///
/// Modules install functions and constants into the environment table an
/// expression is evaluated in. They must be pure: expressions are evaluated
/// once per configuration field and must not observe each other.
///
/// # Example
///
/// ```rust
/// use latch_lua::ExpressionModule;
/// use mlua::prelude::*;
///
/// struct MathModule;
///
/// impl ExpressionModule for MathModule {
///     fn id(&self) -> &'static str {
///         "math"
///     }
///
///     fn register(&self, lua: &Lua, env: &LuaTable) -> LuaResult<()> {
///         env.set(self.id(), lua.globals().get::<LuaTable>("math")?)?;
///         Ok(())
///     }
///
///     fn stubs(&self) -> String {
///         "---@meta\n---@class mathlib\nmath = {}".to_string()
///     }
/// }
/// ```
pub trait ExpressionModule: Send + Sync {
    /// Returns the unique identifier for this module.
    ///
    /// Modules that expose a table use it as the table's name in the
    /// environment, e.g. `strings.trim(...)`.
    ///
    /// # Requirements
    /// - Must be a valid Lua identifier (alphanumeric + underscore, no leading digit)
    /// - Must be unique across all modules
    fn id(&self) -> &'static str;

    /// Registers this module's functions and values into `env`
    ///
    /// # Errors
    /// Returns `LuaError` if registration fails
    fn register(&self, lua: &Lua, env: &LuaTable) -> LuaResult<()>;

    /// Generates Lua Language Server stubs for this module.
    ///
    /// The stub should start with `---@meta` to mark it as a definition file.
    fn stubs(&self) -> String;
}

/// Registry of the modules installed into every expression environment
pub struct ModuleRegistry {
    modules: Vec<Box<dyn ExpressionModule>>,
}

impl ModuleRegistry {
    /// Creates a new empty module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Registers a module
    ///
    /// # Panics
    /// Panics if a module with the same ID is already registered
    pub fn register<M: ExpressionModule + 'static>(&mut self, module: M) {
        let id = module.id();
        if self.modules.iter().any(|m| m.id() == id) {
            panic!("Module with id '{}' is already registered", id);
        }
        self.modules.push(Box::new(module));
    }

    /// Gets a module by its ID
    pub fn get(&self, id: &str) -> Option<&dyn ExpressionModule> {
        self.modules
            .iter()
            .find(|m| m.id() == id)
            .map(|m| m.as_ref())
    }

    /// Installs every module into an environment table
    ///
    /// # Errors
    /// Returns the first error encountered during registration
    pub fn register_all(&self, lua: &Lua, env: &LuaTable) -> LuaResult<()> {
        for module in &self.modules {
            module.register(lua, env)?;
        }
        Ok(())
    }

    /// Generates a combined stub file for all registered modules
    pub fn generate_stubs(&self) -> String {
        let mut stubs = String::new();
        for module in &self.modules {
            stubs.push_str(&module.stubs());
            stubs.push_str("\n\n");
        }
        stubs
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
