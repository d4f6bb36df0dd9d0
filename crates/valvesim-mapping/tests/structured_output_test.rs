//! End-to-end tests for the document pipeline: flat file in, canonical
//! structured file out, and the idempotence guarantee over the emitter's
//! own output.

use std::io::Write;

use valvesim_mapping::{
    emit_to_string, group_entries, read_document, read_mapping_file, DataKind,
};

/// A small but representative flat mapping: global data, parameters with
/// annotations, commands, all three measurement families with unit
/// subsections, a non-ASCII label, an unresolvable entry and an
/// out-of-range unit index.
fn flat_fixture() -> String {
    let mut mappings = String::new();
    mappings.push_str(
        r#"        <Mapping Label="DB_GlobalData.Version" NodeId="ns=2;s=Version" DataTypeId="4" />
        <!-- Zykluszeit aktueller Test -->
        <Mapping Label="Block1.DB_AllgemeineParameter.Zykluszeit" NodeId="ns=2;i=1001" DataTypeId="6" />
        <Mapping Label="Block2.DB_AllgemeineParameter.Testnummer" NodeId="ns=2;i=1002" DataTypeId="4" />
        <!-- Größe des Prüflings -->
        <Mapping Label="Block1.DB_VentilKonfiguration.Größe_Ventil" NodeId="ns=2;i=1101" DataTypeId="7" />
        <!-- Startkommando -->
        <Mapping Label="Block1.DB_Kommandos.Start" NodeId="ns=2;i=2001" DataTypeId="1" />
        <Mapping Label="Block1.DB_Daten_Detailtest.DB_Strommessung1.Status" NodeId="ns=2;i=3000" DataTypeId="4" />
        <Mapping Label="Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext2.Strom" NodeId="ns=2;i=3001" DataTypeId="6" />
        <Mapping Label="Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext1.Strom" NodeId="ns=2;i=3002" DataTypeId="6" />
        <Mapping Label="Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext17.Strom" NodeId="ns=2;i=3017" DataTypeId="6" />
        <Mapping Label="Block2.DB_Daten_Detailtest.DB_Durchflussmessung1.DB_Ventil7.Durchfluss" NodeId="ns=2;i=3101" DataTypeId="6" />
        <Mapping Label="Block2.DB_Daten_Detailtest.DB_Kraftmessung1.DB_Ventil16.Kraft" NodeId="ns=2;i=3201" DataTypeId="6" />
        <Mapping Label="Unklassifizierbar" NodeId="ns=2;i=9999" DataTypeId="4" />
"#,
    );
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<DataMapping>\n    <NamespaceUris>\n        <Uri>http://opcfoundation.org/UA/</Uri>\n        <Uri>urn:valvesim:sps</Uri>\n    </NamespaceUris>\n    <Mappings>\n{mappings}    </Mappings>\n</DataMapping>\n"
    )
}

#[test]
fn test_flat_to_structured_conversion() {
    let doc = read_document(&flat_fixture()).unwrap();
    assert_eq!(doc.entries.len(), 12);

    let report = group_entries(doc.entries.clone());
    assert_eq!(report.dropped, vec!["Unklassifizierbar"]);
    assert_eq!(report.grouped.global.len(), 1);
    // 12 entries minus 1 dropped: everything else appears exactly once.
    assert_eq!(report.grouped.len(), 11);

    let output = emit_to_string(&doc.namespace_uris, &report.grouped);

    // Canonical section order regardless of input order.
    let positions: Vec<usize> = [
        "Globale Daten",
        "DB_AllgemeineParameter_1-4",
        "DB_Ventilkonfiguration_1-4",
        "DB_Kommandos_1-4",
        "DB_Daten_Strommessung_1-4",
        "DB_Daten_Durchflussmessung_1-4",
        "DB_Daten_Kraftmessung_1-4",
    ]
    .iter()
    .map(|needle| output.find(needle).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    // Annotations survive; the dropped entry and the out-of-range unit do not.
    assert!(output.contains("<!-- Zykluszeit aktueller Test -->"));
    assert!(output.contains("<!-- Größe des Prüflings -->"));
    assert!(!output.contains("Unklassifizierbar"));
    assert!(!output.contains("Ext17"));

    // Units ascending within their block.
    let unit1 = output.find("<Unit1>").unwrap();
    let unit2 = output.find("<Unit2>").unwrap();
    assert!(unit1 < unit2);

    // Namespace declarations copied through.
    assert!(output.contains("<Uri>http://opcfoundation.org/UA/</Uri>"));
}

#[test]
fn test_structured_output_is_idempotent() {
    let doc = read_document(&flat_fixture()).unwrap();
    let first = emit_to_string(
        &doc.namespace_uris,
        &group_entries(doc.entries.clone()).grouped,
    );

    // Re-flatten the emitter's own output and run the pipeline again.
    let reparsed = read_document(&first).unwrap();
    let second = emit_to_string(
        &reparsed.namespace_uris,
        &group_entries(reparsed.entries).grouped,
    );

    assert_eq!(first, second);
}

#[test]
fn test_block_with_only_out_of_range_units_is_omitted_and_idempotent() {
    // Unit 17 is beyond the representable range, and here it is the only
    // content of its block: no section or block scaffolding may be emitted.
    let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<DataMapping>\n    <Mappings>\n        <Mapping Label=\"Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext17.Strom\" NodeId=\"ns=2;i=3017\" DataTypeId=\"6\" />\n    </Mappings>\n</DataMapping>\n";

    let doc = read_document(input).unwrap();
    let first = emit_to_string(
        &doc.namespace_uris,
        &group_entries(doc.entries.clone()).grouped,
    );
    assert!(!first.contains("DB_Daten_Strommessung_1-4"));
    assert!(!first.contains("Block1"));
    assert!(first.contains("<Mappings />"));

    let reparsed = read_document(&first).unwrap();
    let second = emit_to_string(
        &reparsed.namespace_uris,
        &group_entries(reparsed.entries).grouped,
    );
    assert_eq!(first, second);
}

#[test]
fn test_grouping_is_input_order_independent() {
    let doc = read_document(&flat_fixture()).unwrap();
    let forward = emit_to_string(
        &doc.namespace_uris,
        &group_entries(doc.entries.clone()).grouped,
    );

    // Reversing the input only reorders entries within their leaf buckets;
    // section/block/unit structure stays identical.
    let mut reversed = doc.entries.clone();
    reversed.reverse();
    let backward = emit_to_string(&doc.namespace_uris, &group_entries(reversed).grouped);

    let structure = |text: &str| -> Vec<String> {
        text.lines()
            .filter(|line| {
                let t = line.trim_start();
                t.starts_with('<') && !t.starts_with("<Mapping ") && !t.starts_with("<!--")
            })
            .map(str::to_string)
            .collect()
    };
    assert_eq!(structure(&forward), structure(&backward));
}

#[test]
fn test_read_mapping_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(flat_fixture().as_bytes()).unwrap();

    let doc = read_mapping_file(file.path()).unwrap();
    assert_eq!(doc.entries.len(), 12);
    assert_eq!(doc.entries[1].data_kind, DataKind::Double);
}
