//! Exports a component library's entry points.

/// Emit the two symbols every component library exports: the build-mode
/// probe and the class factory getter.
///
/// The argument is a constructor (any `fn() -> F` path or closure
/// expression) for the library's [`ClassFactory`](crate::component::ClassFactory)
/// implementation.
///
/// ```ignore
/// plugkit_core::export_class_factory!(GreeterFactory::new);
/// ```
#[macro_export]
macro_rules! export_class_factory {
    ($constructor:expr) => {
        /// Whether this library was built with debug assertions.
        #[unsafe(no_mangle)]
        pub extern "C" fn plugkit_is_debug_build() -> bool {
            cfg!(debug_assertions)
        }

        /// A new reference to this library's class factory.
        #[unsafe(no_mangle)]
        pub fn plugkit_get_class_factory()
        -> $crate::pointer::RefPtr<dyn $crate::component::ClassFactory> {
            let factory: ::std::boxed::Box<dyn $crate::component::ClassFactory> =
                ::std::boxed::Box::new(($constructor)());
            $crate::pointer::RefPtr::from_box(factory)
        }
    };
}
