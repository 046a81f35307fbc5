use projtidy_core::normalize::{consolidate_item_groups, ITEM_GROUP};
use projtidy_core::{Document, Finding, NormalizeError, Normalizer, StructuralAnomaly};

fn normalize(input: &str) -> String {
    let normalized = Normalizer::default()
        .normalize_bytes(input.as_bytes())
        .unwrap();
    String::from_utf8(normalized.output).unwrap()
}

#[test]
fn subset_group_folds_into_earlier_group_with_metadata() {
    let input = r#"<Project Sdk="Microsoft.NET.Sdk">

  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
    <ProjectReference Include="..\Core\Core.csproj" />
  </ItemGroup>

  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json">
      <Version>13.0.3</Version>
    </PackageReference>
  </ItemGroup>

</Project>
"#;
    let expected = r#"<Project Sdk="Microsoft.NET.Sdk">

  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json">
      <Version>13.0.3</Version>
    </PackageReference>
    <PackageReference Include="Serilog" Version="3.1.1" />
    <ProjectReference Include="..\Core\Core.csproj" />
  </ItemGroup>

</Project>
"#;
    assert_eq!(normalize(input), expected);
}

#[test]
fn groups_with_different_label_or_condition_never_merge() {
    let input = r#"<Project>
  <ItemGroup Label="A">
    <Compile Include="b.cs" />
  </ItemGroup>
  <ItemGroup Label="B">
    <Compile Include="a.cs" />
  </ItemGroup>
  <ItemGroup Condition="'$(X)' == 'true'">
    <Compile Include="c.cs" />
  </ItemGroup>
  <ItemGroup Label="A" Condition="'$(X)' == 'true'">
    <Compile Include="d.cs" />
  </ItemGroup>
</Project>
"#;
    assert_eq!(normalize(input), input);
}

#[test]
fn matching_label_and_condition_merge() {
    let input = r#"<Project>
  <ItemGroup Label="Refs" Condition="'$(X)' == 'true'">
    <Compile Include="b.cs" />
  </ItemGroup>
  <ItemGroup Condition="'$(X)' == 'true'" Label="Refs">
    <Compile Include="a.cs" />
  </ItemGroup>
</Project>
"#;
    let expected = r#"<Project>
  <ItemGroup Label="Refs" Condition="'$(X)' == 'true'">
    <Compile Include="a.cs" />
    <Compile Include="b.cs" />
  </ItemGroup>
</Project>
"#;
    assert_eq!(normalize(input), expected);
}

#[test]
fn group_introducing_new_item_type_is_not_merged() {
    let input = r#"<Project>
  <ItemGroup>
    <Compile Include="b.cs" />
  </ItemGroup>
  <ItemGroup>
    <None Include="z.txt" />
    <Compile Include="a.cs" />
  </ItemGroup>
  <ItemGroup>
    <None Include="readme.md" />
  </ItemGroup>
</Project>
"#;
    let expected = r#"<Project>
  <ItemGroup>
    <Compile Include="b.cs" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="a.cs" />
    <None Include="readme.md" />
    <None Include="z.txt" />
  </ItemGroup>
</Project>
"#;
    assert_eq!(normalize(input), expected);
}

#[test]
fn empty_groups_are_removed_with_their_leading_whitespace() {
    let input = r#"<Project>
  <ItemGroup />
  <ItemGroup>
  </ItemGroup>
  <ItemGroup>
    <Compile Include="a.cs" />
  </ItemGroup>
</Project>
"#;
    let expected = r#"<Project>
  <ItemGroup>
    <Compile Include="a.cs" />
  </ItemGroup>
</Project>
"#;
    assert_eq!(normalize(input), expected);
}

#[test]
fn consolidation_reports_kept_merged_and_removed_groups() {
    let mut doc = Document::parse(
        r#"<Project>
  <ItemGroup><A Include="1" /></ItemGroup>
  <ItemGroup></ItemGroup>
  <ItemGroup><A Include="2" /></ItemGroup>
  <ItemGroup><B Include="3" /></ItemGroup>
</Project>"#,
    )
    .unwrap();
    let root = doc.root().unwrap();
    let groups = doc.child_elements_named(root, ITEM_GROUP);

    let consolidation = consolidate_item_groups(&mut doc, &groups);

    assert_eq!(consolidation.kept, vec![groups[0], groups[3]]);
    assert_eq!(consolidation.merged, 1);
    assert_eq!(consolidation.removed_empty, 1);
    assert_eq!(doc.child_elements_named(root, ITEM_GROUP).len(), 2);
    assert!(doc.parent(groups[2]).is_none());
}

#[test]
fn items_sort_by_type_then_key_value_across_key_attributes() {
    let input = r#"<Project>
  <ItemGroup>
    <PackageReference Update="Zeta" />
    <Compile Remove="obj\**" />
    <PackageReference Include="Alpha" />
    <PackageReference Remove="Mid" />
  </ItemGroup>
</Project>
"#;
    let expected = r#"<Project>
  <ItemGroup>
    <Compile Remove="obj\**" />
    <PackageReference Include="Alpha" />
    <PackageReference Remove="Mid" />
    <PackageReference Update="Zeta" />
  </ItemGroup>
</Project>
"#;
    assert_eq!(normalize(input), expected);
}

#[test]
fn equal_items_keep_their_relative_order() {
    let input = r#"<Project>
  <ItemGroup>
    <None Include="b" />
    <Compile Include="a.cs"><Link>first</Link></Compile>
    <Compile Include="a.cs"><Link>second</Link></Compile>
  </ItemGroup>
</Project>
"#;
    let expected = r#"<Project>
  <ItemGroup>
    <Compile Include="a.cs"><Link>first</Link></Compile>
    <Compile Include="a.cs"><Link>second</Link></Compile>
    <None Include="b" />
  </ItemGroup>
</Project>
"#;
    let once = normalize(input);
    assert_eq!(once, expected);
    assert_eq!(normalize(&once), once);
}

#[test]
fn nested_item_groups_are_left_alone() {
    let input = r#"<Project>
  <Target Name="Collect">
    <ItemGroup>
      <B Include="2" />
      <A Include="1" />
    </ItemGroup>
  </Target>
  <Choose>
    <When Condition="true">
      <ItemGroup>
        <B Include="2" />
      </ItemGroup>
    </When>
  </Choose>
</Project>
"#;
    assert_eq!(normalize(input), input);
}

#[test]
fn item_without_key_attribute_is_a_structural_anomaly() {
    let input = "<Project>\n  <ItemGroup>\n    <Compile Include=\"a.cs\" />\n    <Compile Link=\"b.cs\" />\n  </ItemGroup>\n</Project>\n";
    let err = Normalizer::default()
        .normalize_bytes(input.as_bytes())
        .unwrap_err();
    match err {
        NormalizeError::Anomaly(anomaly) => assert_eq!(
            anomaly,
            StructuralAnomaly::MissingItemKey {
                item_type: "Compile".to_string(),
                line: 4,
            }
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn item_with_several_key_attributes_is_reported_and_sorted_by_include() {
    let input = r#"<Project>
  <ItemGroup>
    <None Include="b" />
    <None Include="c" Remove="a" />
  </ItemGroup>
</Project>
"#;
    let normalized = Normalizer::default()
        .normalize_bytes(input.as_bytes())
        .unwrap();
    assert_eq!(String::from_utf8(normalized.output).unwrap(), input);
    assert_eq!(
        normalized.findings,
        vec![Finding::AmbiguousItemKey {
            item_type: "None".to_string(),
            line: 4,
        }]
    );
}

#[test]
fn whole_pipeline_is_idempotent() {
    let input = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <RootNamespace>App</RootNamespace>
    <Authors>team</Authors>
    <TargetFramework>net48</TargetFramework>
    <AssemblyName>App</AssemblyName>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Compile Include="Z.cs" />
  </ItemGroup>
  <!-- generated -->
  <ItemGroup>
    <Compile Include="A.cs" />
  </ItemGroup>
  <ItemGroup Condition="'$(Configuration)' == 'Debug'">
    <Compile Include="Debug.cs" />
  </ItemGroup>
  <ItemGroup>
  </ItemGroup>
</Project>
"#;
    let once = normalize(input);
    assert_ne!(once, input);
    assert_eq!(normalize(&once), once);
}
