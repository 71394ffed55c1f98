//! Component body syntax.
//!
//! Bodies come from the external parser and have already been checked by
//! semantic analysis. The resolver only needs to clone them into definitions
//! and find which bare names refer to other components.

use rustc_hash::FxHashSet;
use spire_core::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Greater,
    Equal,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `1.0`, `true`; kept as written.
    Literal { value: String, span: Span },
    /// A bare name: a local, a parameter, or another component.
    Name { name: String, span: Span },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// `normalize(n)`; callees are functions, never components.
    Call {
        callee: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `light.color`
    Member {
        base: Box<Expr>,
        member: String,
        span: Span,
    },
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal {
            value: value.into(),
            span: Span::default(),
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name {
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: Span::default(),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Name { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. } => *span,
        }
    }

    /// Collect every name not bound in `locals`, in source order.
    fn collect_free_names<'a>(
        &'a self,
        locals: &FxHashSet<&'a str>,
        out: &mut Vec<(&'a str, Span)>,
    ) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Name { name, span } => {
                if !locals.contains(name.as_str()) {
                    out.push((name.as_str(), *span));
                }
            }
            Expr::Unary { operand, .. } => operand.collect_free_names(locals, out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_free_names(locals, out);
                rhs.collect_free_names(locals, out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_free_names(locals, out);
                }
            }
            Expr::Member { base, .. } => base.collect_free_names(locals, out),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
        span: Span,
    },
    Expr(Expr),
    Return { value: Expr, span: Span },
}

/// The body of one component implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentBody {
    /// `vec3 albedo = texture(diffuseMap, uv).xyz;`
    Expr(Expr),
    /// `vec3 lit { let n = normalize(normal); return shade(n); }`
    Block(Vec<Stmt>),
}

impl ComponentBody {
    /// Names referenced by the body that are not `let` bindings in scope.
    ///
    /// A `let` binds from the following statement on, so its own value
    /// still sees an outer name of the same spelling.
    pub fn free_names(&self) -> Vec<(&str, Span)> {
        let mut names = Vec::new();

        match self {
            ComponentBody::Expr(expr) => {
                expr.collect_free_names(&FxHashSet::default(), &mut names);
            }
            ComponentBody::Block(stmts) => {
                let mut locals = FxHashSet::default();
                for stmt in stmts {
                    match stmt {
                        Stmt::Let { name, value, .. } => {
                            value.collect_free_names(&locals, &mut names);
                            locals.insert(name.as_str());
                        }
                        Stmt::Expr(value) | Stmt::Return { value, .. } => {
                            value.collect_free_names(&locals, &mut names);
                        }
                    }
                }
            }
        }
        names
    }

    pub fn span(&self) -> Span {
        match self {
            ComponentBody::Expr(expr) => expr.span(),
            ComponentBody::Block(stmts) => stmts
                .first()
                .map(|stmt| match stmt {
                    Stmt::Let { span, .. } | Stmt::Return { span, .. } => *span,
                    Stmt::Expr(expr) => expr.span(),
                })
                .unwrap_or_default(),
        }
    }
}

impl From<Expr> for ComponentBody {
    fn from(expr: Expr) -> Self {
        ComponentBody::Expr(expr)
    }
}
