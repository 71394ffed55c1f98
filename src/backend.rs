//! Per-target source generation.

use indexmap::IndexMap;
use spire_core::{CompileError, Diagnostics};
use spire_registry::SymbolTable;

use crate::codegen::CompiledShader;
use crate::options::CodeGenTarget;

/// Turns a lowered shader into target source text.
pub trait CodeGenBackend {
    fn generate_shader(
        &self,
        symbols: &SymbolTable,
        shader: &CompiledShader,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError>;
}

/// One backend per output target, fixed when the compiler is built.
#[derive(Default)]
pub struct BackendRegistry {
    backends: IndexMap<CodeGenTarget, Box<dyn CodeGenBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the backend for `target`, replacing any earlier one.
    pub fn register(&mut self, target: CodeGenTarget, backend: impl CodeGenBackend + 'static) {
        self.backends.insert(target, Box::new(backend));
    }

    pub fn with_backend(
        mut self,
        target: CodeGenTarget,
        backend: impl CodeGenBackend + 'static,
    ) -> Self {
        self.register(target, backend);
        self
    }

    pub fn get(&self, target: CodeGenTarget) -> Option<&dyn CodeGenBackend> {
        self.backends.get(&target).map(|b| b.as_ref())
    }

    pub fn targets(&self) -> impl Iterator<Item = CodeGenTarget> + '_ {
        self.backends.keys().copied()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("targets", &self.targets().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl CodeGenBackend for Named {
        fn generate_shader(
            &self,
            _symbols: &SymbolTable,
            shader: &CompiledShader,
            _diagnostics: &mut Diagnostics,
        ) -> Result<String, CompileError> {
            Ok(format!("{} {}", self.0, shader.name))
        }
    }

    #[test]
    fn lookup_by_target() {
        let registry = BackendRegistry::new()
            .with_backend(CodeGenTarget::Glsl, Named("glsl"))
            .with_backend(CodeGenTarget::Hlsl, Named("hlsl"));

        assert!(registry.get(CodeGenTarget::SpirV).is_none());
        assert_eq!(
            registry.targets().collect::<Vec<_>>(),
            vec![CodeGenTarget::Glsl, CodeGenTarget::Hlsl]
        );

        let shader = CompiledShader {
            name: "Lit".into(),
            pipeline: "Forward".into(),
            worlds: vec![],
        };
        let text = registry
            .get(CodeGenTarget::Hlsl)
            .unwrap()
            .generate_shader(&SymbolTable::new(), &shader, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(text, "hlsl Lit");
    }
}
