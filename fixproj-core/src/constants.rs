//! Element, attribute and value names used by the cleanup rules.

pub const ITEM_GROUP: &str = "ItemGroup";
pub const PROPERTY_GROUP: &str = "PropertyGroup";

pub const INCLUDE: &str = "Include";
pub const UPDATE: &str = "Update";
pub const REMOVE: &str = "Remove";

pub const COMPILE: &str = "Compile";
pub const CONTENT: &str = "Content";
pub const NONE: &str = "None";
pub const EMBEDDED_RESOURCE: &str = "EmbeddedResource";
pub const REFERENCE: &str = "Reference";
pub const PROJECT_REFERENCE: &str = "ProjectReference";
pub const PACKAGE_REFERENCE: &str = "PackageReference";
pub const FOLDER: &str = "Folder";
pub const SERVICE: &str = "Service";
pub const BOOTSTRAPPER_PACKAGE: &str = "BootstrapperPackage";
pub const WCF_SERVICE_REFERENCE: &str = "WCFServiceReference";
pub const WCF_METADATA: &str = "WCFMetadata";

pub const SUB_TYPE: &str = "SubType";
pub const CODE_SUB_TYPE: &str = "Code";

pub const COPY_TO_OUTPUT_DIRECTORY: &str = "CopyToOutputDirectory";
pub const ALWAYS: &str = "Always";
pub const PRESERVE_NEWEST: &str = "PreserveNewest";

/// Root attribute that names the SDK of a convention-based project.
pub const SDK_ATTRIBUTE: &str = "Sdk";
pub const SDK_MARKER: &str = "Microsoft.NET.Sdk";

pub const MSBUILD_NAMESPACE: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

pub const PACKAGES_CONFIG: &str = "packages.config";
pub const APP_CONFIG: &str = "app.config";
pub const WEB_CONFIG: &str = "web.config";
pub const WEB_TEMPLATE_EXTENSION: &str = ".cshtml";
pub const RESOURCE_EXTENSION: &str = ".resx";
pub const CONFIG_EXTENSION: &str = ".config";

/// Item types whose include never names a single file on disk.
pub const LEGACY_STRUCTURAL_ITEMS: &[&str] = &[
    WCF_SERVICE_REFERENCE,
    WCF_METADATA,
    REFERENCE,
    PROJECT_REFERENCE,
    FOLDER,
    SERVICE,
    BOOTSTRAPPER_PACKAGE,
    PACKAGE_REFERENCE,
];

/// SDK projects glob their sources implicitly, so plain file items are
/// exempt from the existence check as well.
pub const SDK_EXEMPT_ITEMS: &[&str] = &[
    REFERENCE,
    PROJECT_REFERENCE,
    FOLDER,
    PACKAGE_REFERENCE,
    NONE,
    COMPILE,
    CONTENT,
    EMBEDDED_RESOURCE,
];

/// Properties expected to come from a shared `Directory.Build.props`.
pub const DIRECTORY_BUILD_PROPERTIES: &[&str] = &[
    "Authors",
    "Company",
    "Copyright",
    "GenerateDocumentationFile",
    "Product",
    "AssemblyName",
    "RootNamespace",
    "GeneratePackageOnBuild",
    "AutoGenerateBindingRedirects",
    "GenerateBindingRedirectsOutputType",
    "RestoreProjectStyle",
    "PlatformTarget",
];
