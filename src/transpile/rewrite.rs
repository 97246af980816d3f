//! Syntax tree rewriting
//!
//! Three passes run over the parsed Boltfile before it is printed again:
//!
//! * the support module is imported unless the Boltfile already does so,
//! * every task and initializer gets a leading `&mut bolt::Context`
//!   parameter unless it declares one,
//! * attribute-style sugar on the context value is turned into method calls.
//!
//! The sugar rules, with `ctx` being the context parameter:
//!
//! | written            | becomes                    |
//! |--------------------|----------------------------|
//! | `ctx.name`         | `ctx.get("name")`          |
//! | `ctx.NAME`         | `ctx.getenv("NAME")`       |
//! | `ctx.name = v`     | `{ ctx.set("name", v); }`  |
//! | `ctx.NAME = v`     | `{ ctx.setenv("NAME", v); }` |
//! | `ctx.NAME(v)`      | `ctx.setenv("NAME", v)`    |
//! | `ctx(a, b)`        | `ctx.get_settings(&[a, b])`|
//!
//! An assignment keeps type `()`: in statement position the call simply
//! replaces it, elsewhere the call is wrapped in a block that drops its
//! result. Mixed-case names are left alone, as are lower-case method calls.

use crate::transpile::extract::Extraction;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{
    parse_quote, Expr, ExprAssign, ExprCall, ExprField, ExprMethodCall, File, FnArg, Ident, Item,
    ItemUse, LitStr, Macro, Member, Signature, Stmt, Token, Type, UseTree,
};

/// Conventional name of the context parameter
pub const CONTEXT_IDENT: &str = "ctx";

/// Name of the support module embedded into the generated program
pub const SUPPORT_MODULE: &str = "bolt";

/// Apply all rewriting passes to a parsed Boltfile
pub fn rewrite(file: &mut File, extraction: &Extraction) {
    ensure_support_import(file);

    for item in &mut file.items {
        if let Item::Fn(func) = item {
            let name = func.sig.ident.to_string();
            if extraction.context_fns.contains(&name) {
                inject_context(&mut func.sig);
            }
        }
    }

    desugar_file(file);
}

/// Prepend `use bolt::prelude::*;` when no top-level import names the
/// support module. Returns whether an import was added.
pub fn ensure_support_import(file: &mut File) -> bool {
    let present = file.items.iter().any(|item| match item {
        Item::Use(import) => tree_starts_with(&import.tree, SUPPORT_MODULE),
        _ => false,
    });
    if present {
        return false;
    }

    let import: ItemUse = parse_quote! {
        #[allow(unused_imports)]
        use bolt::prelude::*;
    };
    file.items.insert(0, Item::Use(import));
    true
}

fn tree_starts_with(tree: &UseTree, name: &str) -> bool {
    match tree {
        UseTree::Path(path) => path.ident == name,
        UseTree::Name(use_name) => use_name.ident == name,
        UseTree::Rename(rename) => rename.ident == name,
        UseTree::Group(group) => group.items.iter().any(|t| tree_starts_with(t, name)),
        UseTree::Glob(_) => false,
    }
}

/// Give a function a leading context parameter unless it already has one.
/// Returns whether the signature changed.
pub fn inject_context(sig: &mut Signature) -> bool {
    if sig.inputs.first().map_or(false, is_context_param) {
        return false;
    }

    let param: FnArg = parse_quote!(ctx: &mut bolt::Context);
    sig.inputs.insert(0, param);
    true
}

/// `&mut Context`, under any path whose last segment is `Context`
fn is_context_param(arg: &FnArg) -> bool {
    let ty = match arg {
        FnArg::Typed(pat) => &*pat.ty,
        FnArg::Receiver(_) => return false,
    };

    match ty {
        Type::Reference(reference) if reference.mutability.is_some() => match &*reference.elem {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .map_or(false, |segment| segment.ident == "Context"),
            _ => false,
        },
        _ => false,
    }
}

/// Rewrite context sugar everywhere in the file
pub fn desugar_file(file: &mut File) {
    Desugar::default().visit_file_mut(file);
}

#[derive(Default)]
struct Desugar {
    changed: bool,
}

impl VisitMut for Desugar {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Expr(expr, Some(_)) = stmt {
            let call = match &*expr {
                Expr::Assign(assign) => assignment_call(assign),
                _ => None,
            };
            if let Some(call) = call {
                *expr = call;
                self.changed = true;
            }
        }
        visit_mut::visit_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if desugar_expr(expr) {
            self.changed = true;
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        // Only bodies shaped like call arguments are understood
        let mut args = match mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            Ok(args) => args,
            Err(_) => return,
        };

        let mut body = Desugar::default();
        for arg in args.iter_mut() {
            body.visit_expr_mut(arg);
        }

        if body.changed {
            mac.tokens = quote::ToTokens::to_token_stream(&args);
            self.changed = true;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
    Mixed,
}

/// Classify a name by case; a name without cased letters counts as upper
fn classify(ident: &Ident) -> Case {
    let name = ident.unraw().to_string();
    if name.to_uppercase() == name {
        Case::Upper
    } else if name.to_lowercase() == name {
        Case::Lower
    } else {
        Case::Mixed
    }
}

fn is_context(expr: &Expr) -> bool {
    match expr {
        Expr::Path(path) => path.qself.is_none() && path.path.is_ident(CONTEXT_IDENT),
        _ => false,
    }
}

/// The context value and attribute name of a `ctx.name` expression
fn context_field(expr: &Expr) -> Option<(&Expr, &Ident)> {
    match expr {
        Expr::Field(ExprField {
            base,
            member: Member::Named(name),
            ..
        }) if is_context(base) => Some((&**base, name)),
        _ => None,
    }
}

fn key_literal(ident: &Ident) -> LitStr {
    LitStr::new(&ident.unraw().to_string(), ident.span())
}

/// The setter call for `ctx.name = v`, or `None` for any other assignment
fn assignment_call(assign: &ExprAssign) -> Option<Expr> {
    let ExprAssign { left, right, .. } = assign;
    let (ctx, name) = context_field(left)?;
    let key = key_literal(name);
    match classify(name) {
        Case::Upper => Some(parse_quote!(#ctx.setenv(#key, #right))),
        Case::Lower => Some(parse_quote!(#ctx.set(#key, #right))),
        Case::Mixed => None,
    }
}

/// Rewrite a single expression node in place, without descending into it
fn desugar_expr(expr: &mut Expr) -> bool {
    let replacement: Expr = match &*expr {
        Expr::Assign(assign) => match assignment_call(assign) {
            Some(call) => parse_quote!({ #call; }),
            None => return false,
        },
        Expr::Field(_) => {
            let (ctx, name) = match context_field(expr) {
                Some(field) => field,
                None => return false,
            };
            let key = key_literal(name);
            match classify(name) {
                Case::Upper => parse_quote!(#ctx.getenv(#key)),
                Case::Lower => parse_quote!(#ctx.get(#key)),
                Case::Mixed => return false,
            }
        }
        Expr::MethodCall(ExprMethodCall {
            receiver,
            method,
            args,
            ..
        }) if is_context(receiver) && classify(method) == Case::Upper => {
            let key = key_literal(method);
            parse_quote!(#receiver.setenv(#key, #args))
        }
        Expr::Call(ExprCall { func, args, .. }) if is_context(func) => {
            parse_quote!(#func.get_settings(&[#args]))
        }
        _ => return false,
    };

    *expr = replacement;
    true
}
