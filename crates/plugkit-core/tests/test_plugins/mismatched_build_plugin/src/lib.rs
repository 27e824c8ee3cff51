//! A library that claims the opposite build mode of the profile it was
//! compiled in.

#[unsafe(no_mangle)]
pub extern "C" fn plugkit_is_debug_build() -> bool {
    !cfg!(debug_assertions)
}

/// Never called by a correct loader. Build modes are compared first.
#[unsafe(no_mangle)]
pub extern "C" fn plugkit_get_class_factory() -> ! {
    std::process::abort()
}
