use std::fs;

use wmtscaps::{convert, layers_from_str, ExtractConfig, Legend, Value};

fn fixture(name: &str) -> std::io::Result<String> {
    fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
}

#[test]
fn test_capabilities_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let xml = fixture("capabilities.xml")?;
    let layers = layers_from_str(&xml, &ExtractConfig::default())?;

    let titles: Vec<_> = layers.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "National Map colour",
            "National Map grey",
            "SWISSIMAGE Background",
            "Hiking trails",
        ]
    );

    let urls: Vec<_> = layers.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://wmts.geo.admin.ch/1.0.0/ch.swisstopo.pixelkarte-farbe/default/current/3857/{z}/{x}/{y}.jpeg",
            "https://wmts.geo.admin.ch/1.0.0/ch.swisstopo.pixelkarte-grau/default/current/3857/{z}/{x}/{y}.jpeg",
            "https://wmts.geo.admin.ch/1.0.0/ch.swisstopo.swissimage/default/current/3857/{z}/{x}/{y}.jpeg",
            "https://wmts.geo.admin.ch/1.0.0/ch.swisstopo.swisstlm3d-wanderwege/default/20240101/3857/{z}/{x}/{y}.png",
        ]
    );

    assert_eq!(
        layers.first().map(|l| l.description.as_str()),
        Some("The national maps of Switzerland & Liechtenstein")
    );
    assert_eq!(
        layers.first().map(|l| &l.legend),
        Some(&Legend::Link(
            "https://api3.geo.admin.ch/static/images/legends/ch.swisstopo.pixelkarte-farbe_de.png"
                .to_string()
        ))
    );
    assert_eq!(layers.get(1).map(|l| &l.legend), Some(&Legend::Unavailable));
    assert_eq!(layers.get(2).map(|l| &l.legend), Some(&Legend::Unavailable));
    assert!(layers.get(3).is_some_and(|l| l.legend.is_available()));
    Ok(())
}

#[test]
fn test_capabilities_fixture_tree_shape() -> Result<(), Box<dyn std::error::Error>> {
    let xml = fixture("capabilities.xml")?;
    let tree = convert(&xml, &[])?;
    let capabilities = tree
        .get("Capabilities")
        .and_then(Value::as_node)
        .ok_or("missing Capabilities")?;

    assert_eq!(
        capabilities.get("version").and_then(Value::as_text),
        Some("1.0.0")
    );
    let contents = capabilities
        .get("Contents")
        .and_then(Value::as_node)
        .ok_or("missing Contents")?;
    assert_eq!(contents.get("Layer").and_then(Value::as_list).map(<[Value]>::len), Some(4));
    assert!(contents.get("TileMatrixSet").is_some_and(Value::is_node));
    Ok(())
}

#[test]
fn test_single_layer_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let xml = fixture("single_layer.xml")?;
    let layers = layers_from_str(&xml, &ExtractConfig::default())?;
    assert_eq!(layers.len(), 1);
    assert_eq!(
        layers.first().map(|l| l.url.as_str()),
        Some("https://tiles.example/only/current/{z}/{x}/{y}.png")
    );
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        let result = convert(&content, &[]);
        if !result.as_ref().is_err_and(wmtscaps::Error::is_parse) {
            return Err(std::io::Error::other(format!(
                "Should fail to parse invalid file: {path:?}"
            ))
            .into());
        }
    }
    Ok(())
}
