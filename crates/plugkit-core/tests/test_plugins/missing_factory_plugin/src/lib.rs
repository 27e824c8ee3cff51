//! A library with the build-mode probe but no class factory getter.

#[unsafe(no_mangle)]
pub extern "C" fn plugkit_is_debug_build() -> bool {
    cfg!(debug_assertions)
}

// Near miss of the getter the loader looks for.
#[unsafe(no_mangle)]
pub extern "C" fn plugkit_get_factory() -> *const std::ffi::c_void {
    std::ptr::null()
}
