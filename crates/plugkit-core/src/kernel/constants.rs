//! Symbol names, diagnostic codes and other fixed values shared by the host
//! and component libraries.

/// Exported probe reporting whether a library was built with debug assertions.
pub const DEBUG_PROBE_SYMBOL: &str = "plugkit_is_debug_build";

/// Exported getter returning the library's class factory.
pub const FACTORY_GETTER_SYMBOL: &str = "plugkit_get_class_factory";

/// Default file extension of component libraries on this platform.
#[cfg(target_os = "windows")]
pub const LIBRARY_EXTENSION: &str = "dll";
/// Default file extension of component libraries on this platform.
#[cfg(target_os = "macos")]
pub const LIBRARY_EXTENSION: &str = "dylib";
/// Default file extension of component libraries on this platform.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LIBRARY_EXTENSION: &str = "so";

/// Diagnostic codes carried by every error. These values are stable and may
/// be matched on by callers and log processors.
pub mod codes {
    pub const NULL_POINTER: u32 = 2_751_834_040;
    pub const NO_INTERFACE: u32 = 3_310_925_488;
    pub const REGISTRY_KEY_NOT_FOUND: u32 = 1_939_513_245;
    pub const LIBRARY_LOAD_FAILED: u32 = 2_806_232_390;
    pub const EXPORTED_FUNCTION_NOT_FOUND: u32 = 1_028_502_101;
    pub const MISMATCHED_BUILD_MODES: u32 = 4_210_150_186;
    pub const COMPONENT_CREATION_FAILED: u32 = 1_325_961_825;
    pub const COMPONENT_PANICKED: u32 = 2_297_148_630;
    pub const STORAGE: u32 = 3_422_339_904;
    pub const OTHER: u32 = 4_241_786_283;
}
