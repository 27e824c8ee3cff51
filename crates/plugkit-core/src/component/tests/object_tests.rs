use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::tempdir;

use super::{
    FakeLibrary, FakeLoader, Greeting, alpha_getter, anonymous_getter, beta_getter,
    current_mode_probe, exploding_factory_getter, fake_loader, null_getter, panicking_getter,
};
use crate::component::error::ComponentError;
use crate::component::interface::{ClassFactory, Interface, InterfaceId, Plugin, Unknown};
use crate::component::object::ErrorPolicy;
use crate::kernel::build_mode::BuildMode;
use crate::kernel::constants::{DEBUG_PROBE_SYMBOL, FACTORY_GETTER_SYMBOL};
use crate::pointer::{PointerError, QueryPtr, RefPtr};

fn plugin_name(unknown: &RefPtr<dyn Unknown>) -> Option<String> {
    QueryPtr::<dyn Plugin>::from_pointer(unknown)
        .get()
        .map(|plugin| plugin.plugin_name())
}

fn opposite_mode() -> BuildMode {
    match BuildMode::current() {
        BuildMode::Debug => BuildMode::Release,
        BuildMode::Release => BuildMode::Debug,
    }
}

#[test]
fn test_create_by_registry_name() {
    let (loader, fake) = fake_loader(
        FakeLoader::new().with("/fake/libalpha.so", FakeLibrary::component(alpha_getter)),
    );
    loader.registry().add("alpha", "/fake/libalpha.so");

    let instance = loader.create(<dyn Plugin>::IID, "alpha").expect("create alpha");
    assert!(instance.is_valid());
    assert_eq!(plugin_name(&instance).as_deref(), Some("alpha"));

    // A second instance comes from the cached library.
    let again = loader.create(<dyn Plugin>::IID, "alpha").expect("create alpha again");
    assert_ne!(instance, again);
    assert_eq!(fake.loads(), 1);
}

#[test]
fn test_existing_file_name_bypasses_registry() {
    let dir = tempdir().expect("temp dir");
    let library = dir.path().join("libalpha.so");
    fs::write(&library, b"").expect("library file");
    let name = library.to_str().expect("utf-8 path");

    let (loader, _fake) =
        fake_loader(FakeLoader::new().with(&library, FakeLibrary::component(alpha_getter)));
    loader.registry().add(name, "/fake/elsewhere.so");

    assert_eq!(loader.resolve(name).expect("resolve"), library);
    let instance = loader.create(InterfaceId::UNKNOWN, name).expect("create from file");
    assert!(instance.is_valid());
}

#[test]
fn test_unknown_name_is_registry_error() {
    let (loader, fake) = fake_loader(FakeLoader::new());
    let err = loader
        .create(InterfaceId::UNKNOWN, "does-not-exist")
        .expect_err("unregistered name");
    assert!(matches!(
        err,
        ComponentError::RegistryKeyNotFound { ref key } if key == "does-not-exist"
    ));
    assert_eq!(fake.loads(), 0);
}

#[test]
fn test_unsupported_interface_gives_empty_pointer() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/libanon.so", FakeLibrary::component(anonymous_getter)),
    );
    loader.registry().add("anon", "/fake/libanon.so");

    let instance = loader.create(<dyn Plugin>::IID, "anon").expect("create");
    assert!(instance.is_null());

    let unknown = loader.create(InterfaceId::UNKNOWN, "anon").expect("create unknown");
    assert!(unknown.is_valid());
    assert_eq!(plugin_name(&unknown), None);
}

#[test]
fn test_create_as_queries_the_instance() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/libbeta.so", FakeLibrary::component(beta_getter)),
    );
    loader.registry().add("beta", "/fake/libbeta.so");

    let greeting = loader.create_as::<dyn Greeting>("beta").expect("create greeting");
    let greeting = greeting.get().expect("beta implements Greeting");
    assert_eq!(greeting.greet("world"), "beta says hello to world");
}

#[test]
fn test_factory_is_validated() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/libalpha.so", FakeLibrary::component(alpha_getter)),
    );
    loader.registry().add("alpha", "/fake/libalpha.so");

    let factory = loader.factory("alpha").expect("factory");
    let factory = factory.access().expect("validated factory is never null");
    assert!(crate::component::interface::supports(factory, <dyn ClassFactory>::IID));
    assert!(factory.create_instance(<dyn Greeting>::IID).is_valid());
}

static GUARDED_GETTER_CALLED: AtomicBool = AtomicBool::new(false);

fn guarded_getter() -> RefPtr<dyn ClassFactory> {
    GUARDED_GETTER_CALLED.store(true, Ordering::SeqCst);
    alpha_getter()
}

#[test]
fn test_mismatched_build_mode_stops_before_factory() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/libguarded.so", FakeLibrary::component(guarded_getter)),
    );
    let loader = loader.with_build_mode(opposite_mode());
    loader.registry().add("guarded", "/fake/libguarded.so");

    match loader.create(InterfaceId::UNKNOWN, "guarded") {
        Err(ComponentError::MismatchedBuildModes { library, loader_mode, library_mode }) => {
            assert_eq!(library, Path::new("/fake/libguarded.so"));
            assert_eq!(loader_mode, opposite_mode());
            assert_eq!(library_mode, BuildMode::current());
        }
        other => panic!("Expected MismatchedBuildModes, got {:?}", other),
    }
    assert!(!GUARDED_GETTER_CALLED.load(Ordering::SeqCst));
}

#[test]
fn test_missing_exports() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/libnoprobe.so", FakeLibrary::exports(None, Some(alpha_getter)))
            .with("/fake/libnogetter.so", FakeLibrary::exports(Some(current_mode_probe), None)),
    );

    let err = loader
        .create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libnoprobe.so"))
        .expect_err("probe missing");
    assert!(matches!(
        err,
        ComponentError::ExportedFunctionNotFound { ref name, .. } if name == DEBUG_PROBE_SYMBOL
    ));
    assert!(err.is_expected());

    let err = loader
        .create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libnogetter.so"))
        .expect_err("getter missing");
    match err {
        ComponentError::ExportedFunctionNotFound { name, library } => {
            assert_eq!(name, FACTORY_GETTER_SYMBOL);
            assert_eq!(library, Path::new("/fake/libnogetter.so"));
        }
        other => panic!("Expected ExportedFunctionNotFound, got {:?}", other),
    }
}

#[test]
fn test_null_factory_is_rejected() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/libnull.so", FakeLibrary::component(null_getter)),
    );
    let err = loader
        .create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libnull.so"))
        .expect_err("null factory");
    assert!(matches!(err, ComponentError::Pointer(PointerError::NullPointer { .. })));
}

#[test]
fn test_panics_become_errors() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/libgetter.so", FakeLibrary::component(panicking_getter))
            .with("/fake/libfactory.so", FakeLibrary::component(exploding_factory_getter)),
    );

    match loader.create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libgetter.so")) {
        Err(err @ ComponentError::ComponentPanicked { .. }) => {
            assert!(err.is_unexpected());
            assert!(err.to_string().contains("getter exploded"));
            assert!(err.to_string().contains(FACTORY_GETTER_SYMBOL));
        }
        other => panic!("Expected ComponentPanicked, got {:?}", other),
    }

    match loader.create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libfactory.so")) {
        Err(ComponentError::ComponentPanicked { operation, message, .. }) => {
            assert_eq!(operation, "create_instance");
            assert_eq!(message, "factory exploded");
        }
        other => panic!("Expected ComponentPanicked, got {:?}", other),
    }
}

#[test]
fn test_create_in_stops_at_first_success() {
    let (loader, fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/first/libalpha.so", FakeLibrary::component(alpha_getter))
            .with("/fake/second/libalpha.so", FakeLibrary::component(beta_getter)),
    );

    let instance = loader
        .create_in(
            <dyn Plugin>::IID,
            &["/fake/missing", "/fake/first", "/fake/second"],
            "libalpha.so",
        )
        .expect("found in second candidate");
    assert_eq!(plugin_name(&instance).as_deref(), Some("alpha"));
    assert_eq!(fake.loads(), 2);
}

#[test]
fn test_create_in_skips_libraries_without_exports() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/plain/libalpha.so", FakeLibrary::default())
            .with("/fake/real/libalpha.so", FakeLibrary::component(beta_getter)),
    );

    let instance = loader
        .create_in(<dyn Plugin>::IID, &["/fake/plain", "/fake/real"], "libalpha.so")
        .expect("second candidate has exports");
    assert_eq!(plugin_name(&instance).as_deref(), Some("beta"));
}

#[test]
fn test_create_in_reports_every_attempt() {
    let (loader, _fake) = fake_loader(FakeLoader::new());
    let directories = [PathBuf::from("/fake/a"), PathBuf::from("/fake/b")];

    match loader.create_in(InterfaceId::UNKNOWN, &directories, "libghost.so") {
        Err(err @ ComponentError::ComponentCreationFailed { .. }) => {
            let text = err.to_string();
            if let ComponentError::ComponentCreationFailed {
                filename,
                attempted,
                os_code,
                os_message,
            } = err
            {
                assert_eq!(filename, "libghost.so");
                assert_eq!(
                    attempted,
                    vec![PathBuf::from("/fake/a/libghost.so"), PathBuf::from("/fake/b/libghost.so")]
                );
                assert_eq!(os_code, Some(2));
                assert!(os_message.is_some_and(|message| message.contains("/fake/b/libghost.so")));
            }
            assert!(text.contains("/fake/a/libghost.so, /fake/b/libghost.so"), "{text}");
        }
        other => panic!("Expected ComponentCreationFailed, got {:?}", other),
    }
}

#[test]
fn test_create_in_propagates_unexpected_failures() {
    let (loader, fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/first/libalpha.so", FakeLibrary::component(alpha_getter))
            .with("/fake/second/libalpha.so", FakeLibrary::component(alpha_getter)),
    );
    let loader = loader.with_build_mode(opposite_mode());

    let err = loader
        .create_in(InterfaceId::UNKNOWN, &["/fake/first", "/fake/second"], "libalpha.so")
        .expect_err("build modes differ");
    assert!(matches!(err, ComponentError::MismatchedBuildModes { .. }));
    assert_eq!(fake.loads(), 1, "The search must stop at the first non-load failure");
}

#[test]
fn test_create_in_rejects_unsupported_interface() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new().with("/fake/anon/libanon.so", FakeLibrary::component(anonymous_getter)),
    );

    let err = loader
        .create_in(<dyn Greeting>::IID, &["/fake/anon"], "libanon.so")
        .expect_err("factory has no Greeting component");
    assert!(matches!(err, ComponentError::Pointer(PointerError::NullPointer { .. })));
}

#[test]
fn test_create_all_skips_failures() {
    let dir = tempdir().expect("temp dir");
    let file = |name: &str| {
        let path = dir.path().join(name);
        fs::write(&path, b"").expect("library file");
        path
    };
    let alpha = file("libalpha.so");
    let beta = file("libbeta.so");
    let anon = file("libanon.so");
    let broken = file("libbroken.so");
    let unloadable = file("libunloadable.so");

    let (loader, fake) = fake_loader(
        FakeLoader::new()
            .with(&alpha, FakeLibrary::component(alpha_getter))
            .with(&beta, FakeLibrary::component(beta_getter))
            .with(&anon, FakeLibrary::component(anonymous_getter))
            .with(&broken, FakeLibrary::exports(Some(current_mode_probe), None)),
    );
    for (key, path) in [
        ("alpha", &alpha),
        ("beta", &beta),
        ("anon", &anon),
        ("broken", &broken),
        ("unloadable", &unloadable),
    ] {
        loader.registry().add(key, path.display().to_string());
    }
    loader.registry().add("ghost", "/fake/not/on/disk.so");

    let mut out = Vec::new();
    let appended = loader
        .create_all(<dyn Plugin>::IID, &mut out)
        .expect("known failures are skipped");

    assert_eq!(appended, 2);
    let names: Vec<_> = out.iter().filter_map(plugin_name).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(fake.loads(), 5, "Entries that are not files are never loaded");
}

#[test]
fn test_create_all_panics_depend_on_build_mode() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("libexploding.so");
    fs::write(&path, b"").expect("library file");

    let (loader, _fake) = fake_loader(
        FakeLoader::new().with(&path, FakeLibrary::component(exploding_factory_getter)),
    );
    loader.registry().add("exploding", path.display().to_string());

    let mut out = Vec::new();
    let result = loader.create_all(InterfaceId::UNKNOWN, &mut out);
    if cfg!(debug_assertions) {
        assert!(matches!(result, Err(ComponentError::ComponentPanicked { .. })));
    } else {
        assert_eq!(result.expect("release builds skip panics"), 0);
    }
    assert!(out.is_empty());
}

#[test]
fn test_create_quietly() {
    let (loader, _fake) = fake_loader(
        FakeLoader::new()
            .with("/fake/libalpha.so", FakeLibrary::component(alpha_getter))
            .with("/fake/libexploding.so", FakeLibrary::component(exploding_factory_getter)),
    );
    loader.registry().add("alpha", "/fake/libalpha.so");
    loader.registry().add("exploding", "/fake/libexploding.so");

    let found = loader
        .create_quietly(InterfaceId::UNKNOWN, "alpha", ErrorPolicy::QUIET)
        .expect("quiet");
    assert!(found.is_some_and(|instance| instance.is_valid()));

    assert!(matches!(
        loader.create_quietly(InterfaceId::UNKNOWN, "missing", ErrorPolicy::QUIET),
        Ok(None)
    ));
    assert!(matches!(
        loader.create_quietly(InterfaceId::UNKNOWN, "missing", ErrorPolicy::STRICT),
        Err(ComponentError::RegistryKeyNotFound { .. })
    ));

    let expected_only = ErrorPolicy {
        propagate_expected: true,
        propagate_unexpected: false,
    };
    assert!(matches!(
        loader.create_quietly(InterfaceId::UNKNOWN, "exploding", expected_only),
        Ok(None)
    ));
    assert!(matches!(
        loader.create_quietly(InterfaceId::UNKNOWN, "exploding", ErrorPolicy::STRICT),
        Err(ComponentError::ComponentPanicked { .. })
    ));
}

#[test]
fn test_release_libraries_keeps_created_handles() {
    let (loader, fake) = fake_loader(
        FakeLoader::new().with("/fake/libalpha.so", FakeLibrary::component(alpha_getter)),
    );
    loader.registry().add("alpha", "/fake/libalpha.so");
    let created = loader
        .create_with_factory(InterfaceId::UNKNOWN, "alpha")
        .expect("create");

    assert_eq!(loader.release_libraries(), 1);
    assert!(loader.pool().is_empty());
    assert_eq!(created.library.filename(), Path::new("/fake/libalpha.so"));
    assert_eq!(plugin_name(&created.instance).as_deref(), Some("alpha"));

    loader.create_from_path(InterfaceId::UNKNOWN, Path::new("/fake/libalpha.so")).expect("reload");
    assert_eq!(fake.loads(), 2);
}
