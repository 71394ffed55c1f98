//! Parsed compile units.
//!
//! Parsing is done before `compile` is called; the compiler only needs the
//! declarations of each unit. The frontend keeps whatever else it parsed.

use spire_core::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDecl {
    pub name: String,
    /// Modules are only used by other shaders and never emitted.
    pub is_module: bool,
    pub span: Span,
}

impl ShaderDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_module: false,
            span: Span::default(),
        }
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self {
            is_module: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    /// (name, type) pairs in declaration order.
    pub fields: Vec<(String, String)>,
    pub span: Span,
}

/// Top-level declarations of one or more source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub shaders: Vec<ShaderDecl>,
    pub functions: Vec<FunctionDecl>,
    pub structs: Vec<StructDecl>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every declaration of `other`.
    pub fn include(&mut self, other: &Program) {
        self.shaders.extend(other.shaders.iter().cloned());
        self.functions.extend(other.functions.iter().cloned());
        self.structs.extend(other.structs.iter().cloned());
    }

    pub fn with_shader(mut self, shader: ShaderDecl) -> Self {
        self.shaders.push(shader);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(FunctionDecl {
            name: name.into(),
            span: Span::default(),
        });
        self
    }

    pub fn with_struct(mut self, name: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.structs.push(StructDecl {
            name: name.into(),
            fields,
            span: Span::default(),
        });
        self
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub file_name: String,
    pub program: Program,
}

impl CompileUnit {
    pub fn new(file_name: impl Into<String>, program: Program) -> Self {
        Self {
            file_name: file_name.into(),
            program,
        }
    }
}

/// Merge units in order into one program.
pub fn merge_units(units: &[CompileUnit]) -> Program {
    let mut program = Program::new();
    for unit in units {
        program.include(&unit.program);
    }
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unit_order() {
        let units = vec![
            CompileUnit::new(
                "a.spire",
                Program::new()
                    .with_shader(ShaderDecl::module("Common"))
                    .with_function("saturate"),
            ),
            CompileUnit::new(
                "b.spire",
                Program::new().with_shader(ShaderDecl::new("Lit")),
            ),
        ];
        let program = merge_units(&units);
        let shaders: Vec<_> = program.shaders.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(shaders, vec!["Common", "Lit"]);
        assert_eq!(program.functions.len(), 1);
    }
}
