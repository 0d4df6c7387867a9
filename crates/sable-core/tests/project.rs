mod support;

use sable_core::{Language, Project, ProjectError, MODULE_SYSTEM_MIN_VERSION};

use support::{MemoryLocation, MemoryModuleLocation, UnflaggedModuleLocation};

#[test]
fn module_location_requires_java_9() {
    let err = Project::builder(Language::java(8))
        .input_location(MemoryLocation::new("app"))
        .module_input_location(MemoryModuleLocation::default())
        .build()
        .unwrap_err();

    let ProjectError::ModulesUnsupported {
        location,
        language,
        required,
    } = err;
    assert_eq!(location, "memory-modules");
    assert_eq!(language, Language::java(8));
    assert_eq!(required, MODULE_SYSTEM_MIN_VERSION);
}

#[test]
fn module_location_via_plain_registration_is_still_checked() {
    let result = Project::builder(Language::text_ir())
        .input_location(MemoryModuleLocation::default())
        .build();
    assert!(matches!(result, Err(ProjectError::ModulesUnsupported { .. })));
}

#[test]
fn module_registration_is_checked_without_as_module_location() {
    let err = Project::builder(Language::java(8))
        .module_input_location(UnflaggedModuleLocation)
        .build()
        .unwrap_err();
    let ProjectError::ModulesUnsupported { location, .. } = err;
    assert_eq!(location, "unflagged-modules");

    let project = Project::builder(Language::java(11))
        .module_input_location(UnflaggedModuleLocation)
        .build()
        .unwrap();
    assert!(project.is_module_aware());
}

#[test]
fn module_location_makes_project_module_aware() {
    let project = Project::builder(Language::java(17))
        .module_input_location(MemoryModuleLocation::default())
        .input_location(MemoryLocation::new("app"))
        .build()
        .unwrap();

    assert!(project.is_module_aware());
    assert_eq!(project.input_locations().len(), 2);
    assert_eq!(project.input_locations()[0].describe(), "memory-modules");
}

#[test]
fn error_message_names_location_and_version() {
    let err = Project::builder(Language::java(8))
        .module_input_location(MemoryModuleLocation::default())
        .build()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("memory-modules"), "{message}");
    assert!(message.contains("Java 8"), "{message}");
}
