use pbit_vcs::{
    compress, extract, read_tree, write_tree, Artifact, ErrorKind, ExtractedTree, MashupCodec,
    MashupContainer, TextEncoding, EMBEDDED_JSON_KEY,
};
use serde_json::json;
use std::io::{Cursor, Read, Write};
use zip::{write::SimpleFileOptions, ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="utf-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="json" ContentType="" /><Override PartName="/Version" ContentType="" /></Types>"#;
const LINGUISTIC_SCHEMA: &str = r#"<Linguistics Version="3.3" Language="en-US"><Entities><Entity Name="sales"><Definition><Binding Table="Sales" /></Definition></Entity></Entities></Linguistics>"#;
const PACKAGE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?><Package xmlns:xsd="http://www.w3.org/2001/XMLSchema"><Version>2.72.0</Version><MinVersion>1.5.3296.0</MinVersion><Culture>en-US</Culture></Package>"#;
const FIRST_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?><Permissions xmlns:xsd="http://www.w3.org/2001/XMLSchema"><CanEvaluateFuturePackages>false</CanEvaluateFuturePackages><FirewallEnabled>true</FirewallEnabled></Permissions>"#;
const SECOND_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?><LocalPackageMetadataFile xmlns:xsd="http://www.w3.org/2001/XMLSchema"><Items><Item><ItemLocation><ItemType>AllFormulas</ItemType><ItemPath /></ItemLocation><StableEntries /></Item></Items></LocalPackageMetadataFile>"#;

fn zip_entries(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn read_entries(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    let mut out = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        out.push((file.name().to_string(), buf));
    }
    out
}

fn utf8_bom(data: &str) -> Vec<u8> {
    TextEncoding::Utf8Bom.encode(data)
}

fn utf16(data: &str) -> Vec<u8> {
    TextEncoding::Utf16Le.encode(data)
}

fn data_mashup(package_entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let package = zip_entries(package_entries);
    let first = utf8_bom(FIRST_XML);
    let second = utf8_bom(SECOND_XML);
    MashupContainer::new(&package, &first, &second, b"\x00\x00\x00\x00\x01tail")
        .to_vec()
        .unwrap()
}

fn package_entries() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("[Content_Types].xml", utf8_bom(CONTENT_TYPES)),
        ("Config/Package.xml", utf8_bom(PACKAGE_XML)),
        (
            "Formulas/Section1.m",
            b"section Section1;\r\n\r\nshared Sales = let\r\n    Source = 1\r\nin\r\n    Source;".to_vec(),
        ),
    ]
}

fn template() -> Vec<u8> {
    let model = json!({
        "name": "3f6a0c44",
        "compatibilityLevel": 1520,
        "model": {
            "culture": "en-US",
            "tables": [{"name": "Sales", "columns": [{"name": "Amount", "dataType": "double"}]}],
            "annotations": [{"name": "PBIDesktopVersion", "value": "2.72.5556.801 (Main)"}]
        }
    });
    let visual = json!({"name": "a1b2", "layouts": [{"id": 0, "position": {"x": 1.5, "y": 0}}]});
    let layout = json!({
        "id": 0,
        "sections": [{
            "name": "ReportSection",
            "displayName": "Page 1",
            "visualContainers": [{"x": 10.0, "y": 20, "config": visual.to_string()}]
        }],
        "config": json!({"version": "5.7", "objects": {}}).to_string()
    });

    zip_entries(&[
        ("Version", utf16("1.28")),
        ("[Content_Types].xml", utf8_bom(CONTENT_TYPES)),
        ("DataModelSchema", utf16(&model.to_string())),
        ("DiagramState", utf16(&json!({"version": 0, "diagrams": []}).to_string())),
        ("Report/Layout", utf16(&layout.to_string())),
        ("Report/LinguisticSchema", utf16(LINGUISTIC_SCHEMA)),
        ("Settings", vec![0, 1, 2, 3, 0xff]),
        ("Metadata", b"\x00\x00\x00\x03\x01\x00{\"Version\":3}\xfe'\"\\".to_vec()),
        ("SecurityBindings", vec![0xd0, 0xcf, 0x11, 0xe0]),
        ("DataMashup", data_mashup(&package_entries())),
        (
            "Report/StaticResources/SharedResources/BaseThemes/CY19SU06.json",
            b"{ \"name\": \"theme\" }".to_vec(),
        ),
    ])
}

#[test]
fn test_entry_payloads_survive() {
    let original = template();
    let tree = extract(&original).unwrap();
    let rebuilt = compress(&tree).unwrap();

    let before = read_entries(&original);
    let after = read_entries(&rebuilt);
    let before_names: Vec<_> = before.iter().map(|(name, _)| name.as_str()).collect();
    let after_names: Vec<_> = after.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(after_names, before_names);
    assert_eq!(tree.manifest(), before_names.as_slice());

    for ((name, expected), (_, actual)) in before.iter().zip(after.iter()) {
        if name == "DataMashup" {
            let expected = MashupContainer::parse(expected).unwrap();
            let actual = MashupContainer::parse(actual).unwrap();
            assert_eq!(actual.first_xml(), expected.first_xml());
            assert_eq!(actual.second_xml(), expected.second_xml());
            assert_eq!(actual.tail(), expected.tail());
            assert_eq!(read_entries(actual.package()), read_entries(expected.package()));
        } else {
            assert_eq!(actual, expected, "payload of {} differs", name);
        }
    }
}

#[test]
fn test_compress_is_stable() {
    let tree = extract(&template()).unwrap();
    let first = compress(&tree).unwrap();
    let again = extract(&first).unwrap();
    assert_eq!(again, tree);
    assert_eq!(compress(&again).unwrap(), first);
}

#[test]
fn test_readable_forms() {
    let tree = extract(&template()).unwrap();

    let layout = std::str::from_utf8(tree.file("Report/Layout").unwrap()).unwrap();
    assert!(layout.starts_with("{\n  \"id\": 0,\n"));
    assert!(layout.ends_with("}\n"));
    let layout: serde_json::Value = serde_json::from_str(layout).unwrap();
    assert_eq!(
        layout["sections"][0]["visualContainers"][0]["config"][EMBEDDED_JSON_KEY]["name"],
        json!("a1b2")
    );

    let linguistic = std::str::from_utf8(tree.file("Report/LinguisticSchema").unwrap()).unwrap();
    assert!(linguistic.starts_with("<Linguistics Version=\"3.3\" Language=\"en-US\">\n  <Entities>\n"));

    let content_types = std::str::from_utf8(tree.file("[Content_Types].xml").unwrap()).unwrap();
    assert!(content_types.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Types"));

    let metadata = tree.file("Metadata").unwrap();
    assert!(metadata.is_ascii());
    assert!(metadata.starts_with(b"b'\\x00\\x00\\x00\\x03\\x01\\x00\n{"));

    let mashup = tree.get("DataMashup").unwrap().as_tree().unwrap();
    assert_eq!(
        mashup.manifest(),
        ["[Content_Types].xml", "Config/Package.xml", "Formulas/Section1.m"]
    );
    assert_eq!(mashup.file(MashupCodec::TAIL).unwrap(), b"\x00\x00\x00\x00\x01tail");
    assert!(mashup.file(MashupCodec::FIRST_XML).unwrap().starts_with(b"<?xml"));
    assert!(mashup.file(MashupCodec::SECOND_XML).unwrap().ends_with(b"</LocalPackageMetadataFile>\n"));
}

#[test]
fn test_edited_tree() {
    let tree = extract(&template()).unwrap();
    let (manifest, mut artifacts) = tree.into_parts();
    artifacts.insert(
        String::from("DiagramState"),
        Artifact::File(b"{\r\n    \"version\": 1,\r\n    \"diagrams\": []\r\n}".to_vec()),
    );
    let tree = ExtractedTree::from_parts(manifest, artifacts);

    let rebuilt = compress(&tree).unwrap();
    let entries = read_entries(&rebuilt);
    let (_, diagram) = entries.iter().find(|(name, _)| name == "DiagramState").unwrap();
    assert_eq!(diagram, &utf16(r#"{"version":1,"diagrams":[]}"#));
}

#[test]
fn test_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("template.pbit.extract");
    let tree = extract(&template()).unwrap();

    write_tree(&out, &tree).unwrap();
    assert!(out.join(".zo").is_file());
    assert!(out.join("Report").join("Layout").is_file());
    assert!(out.join("DataMashup").join(".zo").is_file());
    assert!(out.join("DataMashup").join("Formulas").join("Section1.m").is_file());
    assert!(out.join("DataMashup").join("7.bytes").is_file());

    let restored = read_tree(&out).unwrap();
    assert_eq!(restored, tree);
    assert_eq!(compress(&restored).unwrap(), compress(&tree).unwrap());
}

#[test]
fn test_unknown_entry() {
    let data = zip_entries(&[("Version", utf16("1.28")), ("CustomVisuals/x.pbiviz", vec![1])]);
    let err = extract(&data).unwrap_err();
    assert_eq!(err.entry(), Some("CustomVisuals/x.pbiviz"));
    assert!(matches!(
        err.kind(),
        ErrorKind::AmbiguousOrUnknownEntry { matches: 0 }
    ));
}

#[test]
fn test_nested_failure_path() {
    let mut package = package_entries();
    package.push(("Unknown/part.bin", vec![1, 2, 3]));
    let data = zip_entries(&[("DataMashup", data_mashup(&package))]);
    let err = extract(&data).unwrap_err();
    assert_eq!(err.entry(), Some("DataMashup/Unknown/part.bin"));
}

#[test]
fn test_encoding_mismatch() {
    let declared = CONTENT_TYPES.replace("utf-8", "utf-16");
    let data = zip_entries(&[("[Content_Types].xml", utf8_bom(&declared))]);
    let err = extract(&data).unwrap_err();
    assert_eq!(err.entry(), Some("[Content_Types].xml"));
    assert!(matches!(err.kind(), ErrorKind::EncodingMismatch { .. }));
}

#[test]
fn test_missing_artifact() {
    let tree = extract(&template()).unwrap();
    let (manifest, mut artifacts) = tree.into_parts();
    artifacts.remove("Settings");
    let err = compress(&ExtractedTree::from_parts(manifest, artifacts)).unwrap_err();
    assert_eq!(err.entry(), Some("Settings"));
    assert!(matches!(err.kind(), ErrorKind::MissingArtifact { .. }));
}
