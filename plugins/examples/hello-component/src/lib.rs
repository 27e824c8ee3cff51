//! Example component library.
//!
//! Exports one component, [`HelloGreeter`], which answers [`Unknown`],
//! [`Plugin`] and [`Greeter`]. Its factory creates a new greeter for any of
//! those interfaces and nothing for anything else.
use std::sync::atomic::{AtomicUsize, Ordering};

use plugkit_core::component::interface::{
    self, ClassFactory, Interface, InterfaceId, InterfaceRequest, Plugin, Unknown,
};
use plugkit_core::pointer::{RefCount, RefPtr, Referenced};

/// Says hello.
pub trait Greeter: Unknown {
    fn greet(&self, who: &str) -> String;

    /// Number of greetings given so far.
    fn greetings(&self) -> usize;
}

unsafe impl Interface for dyn Greeter {
    const IID: InterfaceId = InterfaceId(2_913_406_211);
    const NAME: &'static str = "Greeter";
}

#[derive(Default)]
pub struct HelloGreeter {
    count: RefCount,
    greetings: AtomicUsize,
}

impl Referenced for HelloGreeter {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for HelloGreeter {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        request.provide::<dyn Unknown>(self)
            || request.provide::<dyn Plugin>(self)
            || request.provide::<dyn Greeter>(self)
    }
}

impl Plugin for HelloGreeter {
    fn plugin_name(&self) -> String {
        "hello".to_string()
    }
}

impl Greeter for HelloGreeter {
    fn greet(&self, who: &str) -> String {
        self.greetings.fetch_add(1, Ordering::Relaxed);
        format!("Hello, {who}!")
    }

    fn greetings(&self) -> usize {
        self.greetings.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct HelloFactory {
    count: RefCount,
}

impl Referenced for HelloFactory {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for HelloFactory {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        request.provide::<dyn Unknown>(self) || request.provide::<dyn ClassFactory>(self)
    }
}

impl ClassFactory for HelloFactory {
    fn create_instance(&self, iid: InterfaceId) -> RefPtr<dyn Unknown> {
        let greeter: Box<dyn Unknown> = Box::new(HelloGreeter::default());
        if interface::supports(greeter.as_ref(), iid) {
            RefPtr::from_box(greeter)
        } else {
            RefPtr::empty()
        }
    }
}

plugkit_core::export_class_factory!(HelloFactory::default);
