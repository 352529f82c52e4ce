//! Handler shapes and type erasure.
//!
//! # The three shapes
//!
//! ```text
//! fn auth(c: &mut Context) -> HandlerResult                     ContextOnly
//! fn hello(input: &In, out: &mut Out) -> HandlerResult          Typed
//! fn hello(input: &In, out: &mut Out, c: &mut Context) -> ...   TypedWithContext
//! ```
//!
//! A `ContextOnly` handler works directly on the [`Context`]: it can read the
//! request, set a response and decide whether to call [`Context::next`]. That
//! is what middleware looks like.
//!
//! The typed shapes never see raw bytes. The invoker decodes the request body
//! as JSON into a fresh `In::default()` (a malformed or empty body leaves the
//! default in place, it never fails the request), hands the handler a fresh
//! `Out::default()` to fill in, and on `Ok(())` sends
//! `{"status":0,"data":<out>}`. Typed handlers are terminal: the chain does
//! not continue past them.
//!
//! For every shape an `Err(ErrorResponse)` becomes the response body,
//! replacing anything set before.
//!
//! # How shapes are stored
//!
//! The router keeps chains of handlers with different concrete types, so each
//! one is tagged with its [`HandlerKind`] and erased behind `dyn ErasedHandler`:
//!
//! ```text
//! router.post("/hello", hello)               ← user registers a fn
//!        ↓ IntoHandler<TypedShape<In, Out>>  ← shape picked by the signature
//! Handler { kind: Typed, inner: Arc<TypedFn<..>> }
//!        ↓ at request time
//! handler.call(&mut ctx)                     ← one vtable dispatch
//! ```
//!
//! A function that matches none of the shapes does not implement
//! [`IntoHandler`], so a wrong signature is a compile error at the
//! registration call.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::envelope::ErrorResponse;

/// What every handler returns. `Err` is sent as the response body.
pub type HandlerResult = Result<(), ErrorResponse>;

/// Which of the three call shapes a [`Handler`] implements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HandlerKind {
    /// `Fn(&mut Context) -> HandlerResult`
    ContextOnly,
    /// `Fn(&In, &mut Out) -> HandlerResult`
    Typed,
    /// `Fn(&In, &mut Out, &mut Context) -> HandlerResult`
    TypedWithContext,
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears behind the
/// public [`Handler`] type. External crates cannot usefully implement it.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    fn call(&self, ctx: &mut Context);
}

type BoxedHandler = Arc<dyn ErasedHandler>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// A registered handler: its shape tag plus the erased callable.
///
/// Cloning is one `Arc` increment; clones share the callable.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    name: &'static str,
    inner: BoxedHandler,
}

impl Handler {
    /// Wraps a handler that works on the [`Context`] directly.
    pub fn context<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        Self { kind: HandlerKind::ContextOnly, name: type_name::<F>(), inner: Arc::new(ContextFn(f)) }
    }

    /// Wraps a typed JSON-in / JSON-out handler.
    ///
    /// The body is decoded as a whole. An empty body, invalid JSON, a missing
    /// field or a field of the wrong type all hand the handler
    /// `In::default()`, losing any fields that did parse. Put
    /// `#[serde(default)]` on `In` to let missing fields fall back one by one;
    /// a wrongly typed field still resets the whole value.
    pub fn typed<In, Out, F>(f: F) -> Self
    where
        In: DeserializeOwned + Default + 'static,
        Out: Serialize + Default + 'static,
        F: Fn(&In, &mut Out) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            kind: HandlerKind::Typed,
            name: type_name::<F>(),
            inner: Arc::new(TypedFn { f, _shape: PhantomData }),
        }
    }

    /// Wraps a typed handler that also needs the [`Context`] (query, headers,
    /// metadata). The body decodes as in [`Handler::typed`].
    pub fn typed_with_context<In, Out, F>(f: F) -> Self
    where
        In: DeserializeOwned + Default + 'static,
        Out: Serialize + Default + 'static,
        F: Fn(&In, &mut Out, &mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            kind: HandlerKind::TypedWithContext,
            name: type_name::<F>(),
            inner: Arc::new(TypedContextFn { f, _shape: PhantomData }),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Type name of the wrapped callable, for logs and debugging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `true` when both handles share the same callable.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn call(&self, ctx: &mut Context) {
        self.inner.call(ctx);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("kind", &self.kind).field("name", &self.name).finish()
    }
}

// ── IntoHandler ───────────────────────────────────────────────────────────────

/// Conversion into a [`Handler`], implemented for every function of one of
/// the three shapes and for `Handler` itself.
///
/// `M` is a marker that keeps the three blanket impls apart; it is always
/// inferred. Closures need their argument types spelled out
/// (`|c: &mut Context| -> HandlerResult { .. }`), or can be wrapped with
/// [`Handler::context`] and friends, which infer everything.
pub trait IntoHandler<M>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

#[doc(hidden)]
pub struct ContextOnlyShape;

#[doc(hidden)]
pub struct TypedShape<In, Out>(PhantomData<fn(In) -> Out>);

#[doc(hidden)]
pub struct TypedWithContextShape<In, Out>(PhantomData<fn(In) -> Out>);

impl IntoHandler<Handler> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

impl<F> IntoHandler<ContextOnlyShape> for F
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::context(self)
    }
}

impl<F, In, Out> IntoHandler<TypedShape<In, Out>> for F
where
    In: DeserializeOwned + Default + 'static,
    Out: Serialize + Default + 'static,
    F: Fn(&In, &mut Out) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::typed(self)
    }
}

impl<F, In, Out> IntoHandler<TypedWithContextShape<In, Out>> for F
where
    In: DeserializeOwned + Default + 'static,
    Out: Serialize + Default + 'static,
    F: Fn(&In, &mut Out, &mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::typed_with_context(self)
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct ContextFn<F>(F);

impl<F> ErasedHandler for ContextFn<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        if let Err(err) = (self.0)(ctx) {
            ctx.respond_error(&err);
        }
    }
}

struct TypedFn<F, In, Out> {
    f: F,
    _shape: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> ErasedHandler for TypedFn<F, In, Out>
where
    In: DeserializeOwned + Default,
    Out: Serialize + Default,
    F: Fn(&In, &mut Out) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        let input: In = ctx.decode_body();
        let mut out = Out::default();
        match (self.f)(&input, &mut out) {
            Ok(()) => ctx.respond_json(&out),
            Err(err) => ctx.respond_error(&err),
        }
    }
}

struct TypedContextFn<F, In, Out> {
    f: F,
    _shape: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> ErasedHandler for TypedContextFn<F, In, Out>
where
    In: DeserializeOwned + Default,
    Out: Serialize + Default,
    F: Fn(&In, &mut Out, &mut Context) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        let input: In = ctx.decode_body();
        let mut out = Out::default();
        match (self.f)(&input, &mut out, ctx) {
            Ok(()) => ctx.respond_json(&out),
            Err(err) => ctx.respond_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Default, Deserialize)]
    struct In {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Default, Serialize)]
    struct Out {
        text: String,
    }

    fn context_only(_c: &mut Context) -> HandlerResult {
        Ok(())
    }

    fn typed(_in: &In, _out: &mut Out) -> HandlerResult {
        Ok(())
    }

    fn typed_with_context(_in: &In, _out: &mut Out, _c: &mut Context) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn signature_picks_the_shape() {
        assert_eq!(context_only.into_handler().kind(), HandlerKind::ContextOnly);
        assert_eq!(typed.into_handler().kind(), HandlerKind::Typed);
        assert_eq!(typed_with_context.into_handler().kind(), HandlerKind::TypedWithContext);
    }

    #[test]
    fn explicit_constructors_tag_the_shape() {
        let h = Handler::context(|_c| Ok(()));
        assert_eq!(h.kind(), HandlerKind::ContextOnly);

        let h = Handler::typed(|_in: &In, out: &mut Out| {
            out.text.push('x');
            Ok(())
        });
        assert_eq!(h.kind(), HandlerKind::Typed);
    }

    #[test]
    fn clones_share_the_callable() {
        let a = Handler::context(context_only);
        let b = a.clone();
        let c = Handler::context(context_only);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert!(a.name().ends_with("context_only"));
    }
}
