use fixproj_core::{
    ConflictChoice, Dialect, Document, FixOptions, FixedResolver, FixprojError, Processor,
    RejectingResolver,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LEGACY_SPLIT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <AssemblyName>Acme</AssemblyName>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Foo.cs" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="foo.cs" />
  </ItemGroup>
</Project>
"#;

const LEGACY_MESSY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <RootNamespace>Acme</RootNamespace>
    <AssemblyName>Acme</AssemblyName>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Compile Include="Program.cs">
      <SubType>Code</SubType>
    </Compile>
    <None Include="web.config" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
  <ItemGroup>
    <Compile Include="Gone.cs" />
    <Content Include="site.css">
      <CopyToOutputDirectory>Always</CopyToOutputDirectory>
    </Content>
    <Compile Include="program.cs" />
    <Compile Include="Models\User.cs" />
  </ItemGroup>
  <ItemGroup Condition="'$(Configuration)' == 'Debug'">
    <None Include="debug.txt" />
  </ItemGroup>
</Project>
"#;

const SDK_MESSY: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <Authors>Acme</Authors>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Program.cs" />
    <EmbeddedResource Include="Strings.resx" />
    <Content Include="appsettings.json">
      <CopyToOutputDirectory>Always</CopyToOutputDirectory>
    </Content>
  </ItemGroup>
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
    <PackageReference Include="serilog" Version="3.1.1" />
  </ItemGroup>
</Project>
"#;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn includes(document: &Document, local_name: &str) -> Vec<String> {
    let mut found = Vec::new();
    for group in document.root.elements().filter(|el| el.local_name() == "ItemGroup") {
        for item in group.elements().filter(|el| el.local_name() == local_name) {
            if let Some(attr) = item.attributes.iter().find(|a| a.name == "Include") {
                found.push(attr.value.clone());
            }
        }
    }
    found
}

fn item_groups(document: &Document) -> usize {
    document
        .root
        .elements()
        .filter(|el| el.local_name() == "ItemGroup")
        .count()
}

#[test]
fn test_duplicate_compile_items_are_merged() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(&path, LEGACY_SPLIT);

    let options = FixOptions {
        fix_content: true,
        delete_duplicates: true,
        ..FixOptions::default()
    }
    .with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.changed.len(), 1);
    assert_eq!(summary.changed[0].dialect, Dialect::Legacy);
    assert!(summary.changed[0]
        .changes
        .contains(&"Compile: removed 1 dupes of foo.cs".to_string()));

    let saved = Document::load(&path).unwrap();
    assert_eq!(item_groups(&saved), 1);
    assert_eq!(includes(&saved, "Compile"), vec!["Foo.cs"]);
}

#[test]
fn test_full_pipeline_is_idempotent() {
    let temp = tempdir().unwrap();
    write(&temp.path().join("Legacy").join("Acme.csproj"), LEGACY_MESSY);
    write(&temp.path().join("Legacy").join("Program.cs"), "");
    write(&temp.path().join("Legacy").join("site.css"), "");
    write(&temp.path().join("Legacy").join("web.config"), "");
    write(&temp.path().join("Legacy").join("Models").join("User.cs"), "");
    write(&temp.path().join("Modern").join("Modern.csproj"), SDK_MESSY);

    let options = FixOptions {
        recursive: true,
        ..FixOptions::all_rules()
    }
    .with_target(temp.path());
    let processor = Processor::new(&options);

    let first = processor.run(&mut FixedResolver(ConflictChoice::Embed)).unwrap();
    assert_eq!(first.processed, 2);
    assert_eq!(first.written, 2);
    let after_first = fs::read_to_string(temp.path().join("Legacy").join("Acme.csproj")).unwrap();

    let second = processor.run(&mut FixedResolver(ConflictChoice::Embed)).unwrap();
    assert!(!second.has_changes());
    assert_eq!(second.written, 0);
    let after_second = fs::read_to_string(temp.path().join("Legacy").join("Acme.csproj")).unwrap();
    assert_eq!(after_first, after_second);
}

#[test]
fn test_legacy_cleanup_result() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(&path, LEGACY_MESSY);
    write(&temp.path().join("Program.cs"), "");
    write(&temp.path().join("site.css"), "");
    write(&temp.path().join("web.config"), "");
    write(&temp.path().join("Models").join("User.cs"), "");

    let options = FixOptions::all_rules().with_target(temp.path());
    Processor::new(&options)
        .run(&mut RejectingResolver)
        .unwrap();

    let saved = Document::load(&path).unwrap();
    assert_eq!(includes(&saved, "Compile"), vec!["Models\\User.cs", "Program.cs"]);
    assert_eq!(includes(&saved, "Content"), vec!["site.css", "web.config"]);
    assert_eq!(includes(&saved, "Reference"), vec!["System"]);

    // the conditional group keeps its own container
    assert_eq!(item_groups(&saved), 4);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("<CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>"));
    assert!(!text.contains("<SubType>"));
    assert!(text.contains("<AssemblyName>Acme</AssemblyName>"));

    let names: Vec<&str> = saved.root.elements().map(|el| el.local_name()).collect();
    assert_eq!(
        names,
        vec!["PropertyGroup", "ItemGroup", "ItemGroup", "ItemGroup", "Import", "ItemGroup"]
    );
}

#[test]
fn test_dangling_references_are_removed_only_when_missing() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(&path, LEGACY_MESSY);
    write(&temp.path().join("Program.cs"), "");

    let options = FixOptions {
        fix_content: true,
        delete_references_to_non_existent_files: true,
        ..FixOptions::default()
    }
    .with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();

    let saved = Document::load(&path).unwrap();
    let compile = includes(&saved, "Compile");
    assert!(compile.contains(&"Program.cs".to_string()));
    assert!(!compile.contains(&"Gone.cs".to_string()));
    assert!(!compile.contains(&"Models\\User.cs".to_string()));
    assert_eq!(includes(&saved, "Reference"), vec!["System"]);
    assert!(summary.changed[0]
        .changes
        .contains(&"Compile: removed reference to Gone.cs because it doesn't exist".to_string()));
}

#[test]
fn test_sdk_project_rules() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Modern.csproj");
    write(&path, SDK_MESSY);

    let options = FixOptions::all_rules().with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();
    assert_eq!(summary.changed[0].dialect, Dialect::Sdk);

    let saved = Document::load(&path).unwrap();
    assert!(includes(&saved, "Compile").is_empty());
    assert!(includes(&saved, "EmbeddedResource").is_empty());
    assert_eq!(includes(&saved, "Content"), vec!["appsettings.json"]);
    assert_eq!(includes(&saved, "PackageReference"), vec!["Serilog"]);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("<None Remove=\"appsettings.json\"/>"));
    assert!(!text.contains("<Authors>"));
    assert!(text.contains("<TargetFramework>net8.0</TargetFramework>"));
}

#[test]
fn test_package_references_merge_whatever_their_attribute_order() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Modern.csproj");
    write(
        &path,
        r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
  <ItemGroup>
    <PackageReference Version="3.1.1" Include="serilog" />
  </ItemGroup>
</Project>
"#,
    );

    let options = FixOptions::all_rules().with_target(temp.path());
    Processor::new(&options).run(&mut RejectingResolver).unwrap();

    let saved = Document::load(&path).unwrap();
    assert_eq!(item_groups(&saved), 1);
    assert_eq!(includes(&saved, "PackageReference"), vec!["Serilog"]);
}

#[test]
fn test_text_whitespace_survives_a_rewrite() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Modern.csproj");
    write(
        &path,
        "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup>\
         <Description>  Indented summary</Description><NoWarn> ; </NoWarn>\
         </PropertyGroup><ItemGroup><PackageReference Include=\"A\" /></ItemGroup>\
         <ItemGroup><PackageReference Include=\"a\" /></ItemGroup></Project>",
    );

    let options = FixOptions::all_rules().with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();
    assert_eq!(summary.written, 1);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("<Description>  Indented summary</Description>"));
    assert!(text.contains("<NoWarn> ; </NoWarn>"));
}

#[test]
fn test_authors_property_survives_in_legacy_projects() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(
        &path,
        "<Project ToolsVersion=\"15.0\"><PropertyGroup><Authors>Acme</Authors></PropertyGroup>\
         <ItemGroup><Reference Include=\"System\" /></ItemGroup></Project>",
    );

    let options = FixOptions::all_rules().with_target(temp.path());
    Processor::new(&options).run(&mut RejectingResolver).unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("<Authors>Acme</Authors>"));
}

#[test]
fn test_preview_leaves_files_untouched() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(&path, LEGACY_SPLIT);

    let options = FixOptions {
        preview: true,
        ..FixOptions::all_rules()
    }
    .with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();

    assert!(summary.has_changes());
    assert_eq!(summary.written, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), LEGACY_SPLIT);
}

#[test]
fn test_backup_keeps_original_bytes() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Acme.csproj");
    write(&path, LEGACY_SPLIT);

    let options = FixOptions {
        backup: true,
        fix_content: true,
        delete_duplicates: true,
        ..FixOptions::default()
    }
    .with_target(temp.path());
    Processor::new(&options).run(&mut RejectingResolver).unwrap();

    let backup = temp.path().join("Acme.csproj.bak");
    assert_eq!(fs::read_to_string(backup).unwrap(), LEGACY_SPLIT);
    assert_ne!(fs::read_to_string(&path).unwrap(), LEGACY_SPLIT);
}

#[test]
fn test_unparseable_file_aborts_before_writing() {
    let temp = tempdir().unwrap();
    let good = temp.path().join("A.csproj");
    write(&good, LEGACY_SPLIT);
    write(&temp.path().join("B.csproj"), "<Project><ItemGroup></Project>");

    let options = FixOptions::all_rules().with_target(temp.path());
    let err = Processor::new(&options).run(&mut RejectingResolver).unwrap_err();

    assert!(matches!(err, FixprojError::DocumentInvalid { .. }));
    assert_eq!(fs::read_to_string(&good).unwrap(), LEGACY_SPLIT);
}

#[test]
fn test_unresolved_conflict_fails_the_run() {
    let temp = tempdir().unwrap();
    write(
        &temp.path().join("Acme.csproj"),
        "<Project><ItemGroup><EmbeddedResource Include=\"logo.png\">\
         <CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>\
         </EmbeddedResource></ItemGroup></Project>",
    );

    let options = FixOptions::all_rules().with_target(temp.path());
    let err = Processor::new(&options).run(&mut RejectingResolver).unwrap_err();
    assert!(matches!(err, FixprojError::InvalidArgument(_)));
}

#[test]
fn test_vendored_projects_are_ignored() {
    let temp = tempdir().unwrap();
    write(&temp.path().join("packages").join("Lib").join("Lib.csproj"), LEGACY_SPLIT);

    let options = FixOptions {
        recursive: true,
        ..FixOptions::all_rules()
    }
    .with_target(temp.path());
    let summary = Processor::new(&options).run(&mut RejectingResolver).unwrap();
    assert_eq!(summary.processed, 0);
}
