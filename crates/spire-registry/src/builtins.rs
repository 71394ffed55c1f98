//! Built-in shading types.
//!
//! One [`Builtins`] table is built by whoever assembles the compiler and is
//! passed by reference into every compile call. Its lifetime is the
//! caller's scope.

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Scalar,
    Vector(u8),
    /// Rows, columns.
    Matrix(u8, u8),
    Texture,
    Sampler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinType {
    pub name: String,
    pub kind: BuiltinKind,
    /// Element type; `None` for opaque resources.
    pub scalar: Option<ScalarKind>,
}

impl BuiltinType {
    /// Number of scalar elements; 0 for opaque resources.
    pub fn element_count(&self) -> u32 {
        match self.kind {
            BuiltinKind::Scalar => 1,
            BuiltinKind::Vector(n) => n as u32,
            BuiltinKind::Matrix(r, c) => r as u32 * c as u32,
            BuiltinKind::Texture | BuiltinKind::Sampler => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Builtins {
    types: IndexMap<String, BuiltinType>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard scalar, vector, matrix and resource types.
    pub fn standard() -> Self {
        let mut builtins = Self::new();

        for (name, scalar) in [
            ("bool", ScalarKind::Bool),
            ("int", ScalarKind::Int),
            ("uint", ScalarKind::UInt),
            ("float", ScalarKind::Float),
        ] {
            builtins.register(name, BuiltinKind::Scalar, Some(scalar));
        }

        for (prefix, scalar) in [
            ("b", ScalarKind::Bool),
            ("i", ScalarKind::Int),
            ("u", ScalarKind::UInt),
            ("", ScalarKind::Float),
        ] {
            for n in 2..=4u8 {
                let name = format!("{prefix}vec{n}");
                builtins.register(&name, BuiltinKind::Vector(n), Some(scalar));
            }
        }

        for n in 2..=4u8 {
            builtins.register(
                &format!("mat{n}"),
                BuiltinKind::Matrix(n, n),
                Some(ScalarKind::Float),
            );
        }

        builtins.register("texture2D", BuiltinKind::Texture, None);
        builtins.register("textureCube", BuiltinKind::Texture, None);
        builtins.register("texture2DShadow", BuiltinKind::Texture, None);
        builtins.register("sampler", BuiltinKind::Sampler, None);
        builtins
    }

    pub fn register(&mut self, name: &str, kind: BuiltinKind, scalar: Option<ScalarKind>) {
        self.types.insert(
            name.to_string(),
            BuiltinType {
                name: name.to_string(),
                kind,
                scalar,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
