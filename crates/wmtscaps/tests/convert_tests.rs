use wmtscaps::{
    convert, convert_bytes, convert_with_options, ConvertOptions, Node, ParseErrorKind, Value,
    XmlConfig, TEXT_KEY,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn root<'a>(tree: &'a Node, name: &str) -> Result<&'a Node, Box<dyn std::error::Error>> {
    tree.get(name)
        .and_then(Value::as_node)
        .ok_or_else(|| format!("missing root element {name}").into())
}

#[test]
fn test_attributes_merged_exactly() -> TestResult {
    let tree = convert(r#"<e a="1" b="2"/>"#, &[])?;
    let e = root(&tree, "e")?;
    let entries: Vec<_> = e.iter().map(|(k, v)| (k.as_str(), v.as_text())).collect();
    assert_eq!(entries, vec![("a", Some("1")), ("b", Some("2"))]);
    Ok(())
}

#[test]
fn test_attributes_then_children() -> TestResult {
    let tree = convert(r#"<e a="1" b="2"><c/>text</e>"#, &[])?;
    let e = root(&tree, "e")?;
    let keys: Vec<_> = e.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c", TEXT_KEY]);
    Ok(())
}

#[test]
fn test_repeated_tags_coalesce() -> TestResult {
    let tree = convert("<r><x/><x/><x/></r>", &[])?;
    let x = root(&tree, "r")?.get("x").and_then(Value::as_list);
    assert_eq!(x.map(<[Value]>::len), Some(3));
    Ok(())
}

#[test]
fn test_forced_single_is_list() -> TestResult {
    let tree = convert("<r><x/></r>", &["x"])?;
    let x = root(&tree, "r")?.get("x");
    assert_eq!(x, Some(&Value::List(vec![Value::Node(Node::new())])));
    Ok(())
}

#[test]
fn test_unforced_single_is_bare() -> TestResult {
    let tree = convert("<r><x/></r>", &[])?;
    let x = root(&tree, "r")?.get("x");
    assert_eq!(x, Some(&Value::Node(Node::new())));
    Ok(())
}

#[test]
fn test_whitespace_text_dropped() -> TestResult {
    let tree = convert("<t>  </t>", &[])?;
    let t = root(&tree, "t")?;
    assert!(t.is_empty());
    assert_eq!(t.text(), None);
    Ok(())
}

#[test]
fn test_text_kept_untrimmed() -> TestResult {
    let tree = convert("<t> hi </t>", &[])?;
    assert_eq!(root(&tree, "t")?.text(), Some(" hi "));
    Ok(())
}

#[test]
fn test_last_text_wins() -> TestResult {
    let tree = convert("<t>first<b/>second<!-- c -->third</t>", &[])?;
    let t = root(&tree, "t")?;
    assert_eq!(t.text(), Some("third"));
    let keys: Vec<_> = t.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![TEXT_KEY, "b"]);
    Ok(())
}

#[test]
fn test_document_order_in_lists() -> TestResult {
    let tree = convert(
        r#"<r><i n="1"/><j/><i n="2"/><i n="3"/></r>"#,
        &[],
    )?;
    let r = root(&tree, "r")?;
    let order: Vec<_> = r
        .get("i")
        .into_iter()
        .flat_map(Value::nodes)
        .filter_map(|n| n.get("n").and_then(Value::as_text))
        .collect();
    assert_eq!(order, vec!["1", "2", "3"]);
    let keys: Vec<_> = r.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["i", "j"]);
    Ok(())
}

#[test]
fn test_prefixed_names_pass_through() -> TestResult {
    let tree = convert(
        r#"<a:r xmlns:a="urn:a"><a:t xlink:href="h">x</a:t></a:r>"#,
        &[],
    )?;
    let r = root(&tree, "a:r")?;
    assert_eq!(r.get("xmlns:a").and_then(Value::as_text), Some("urn:a"));
    let t = r.get("a:t").and_then(Value::as_node);
    assert_eq!(t.and_then(|t| t.get("xlink:href")).and_then(Value::as_text), Some("h"));
    Ok(())
}

#[test]
fn test_attribute_child_collision() -> TestResult {
    // the child attaches to the attribute's slot as if it were an earlier sibling
    let tree = convert(r#"<r x="attr"><x>child</x></r>"#, &[])?;
    let x = root(&tree, "r")?.get("x").and_then(Value::as_list);
    let expected_child: Node = vec![(TEXT_KEY.to_string(), Value::from("child"))]
        .into_iter()
        .collect();
    assert_eq!(
        x,
        Some(&[Value::from("attr"), Value::Node(expected_child.clone())][..])
    );

    // an empty attribute value is replaced outright
    let tree = convert(r#"<r x=""><x>child</x></r>"#, &[])?;
    assert_eq!(
        root(&tree, "r")?.get("x"),
        Some(&Value::Node(expected_child))
    );
    Ok(())
}

#[test]
fn test_options_builder() -> TestResult {
    let options = ConvertOptions::new()
        .force_array("x")
        .force_array("y")
        .with_parser_config(XmlConfig::new(8, 1024));
    let tree = convert_with_options("<r><x/><y/><z/></r>", &options)?;
    let r = root(&tree, "r")?;
    assert!(r.get("x").is_some_and(Value::is_list));
    assert!(r.get("y").is_some_and(Value::is_list));
    assert!(r.get("z").is_some_and(Value::is_node));
    Ok(())
}

#[test]
fn test_convert_bytes_with_bom() -> TestResult {
    let tree = convert_bytes(b"\xEF\xBB\xBF<r>ok</r>", &ConvertOptions::default())?;
    assert_eq!(root(&tree, "r")?.text(), Some("ok"));
    Ok(())
}

#[test]
fn test_convert_bytes_invalid_utf8() {
    let result = convert_bytes(b"<r>\xFF\xFE</r>", &ConvertOptions::default());
    match result {
        Err(wmtscaps::Error::Parse(err)) => assert_eq!(err.kind(), &ParseErrorKind::InvalidUtf8),
        other => panic!("expected invalid utf-8 error, got {other:?}"),
    }
}

#[test]
fn test_malformed_is_parse_error() {
    for input in ["", "<r>", "<r></s>", "<r/><r/>", "text only"] {
        let result = convert(input, &[]);
        assert!(
            result.as_ref().is_err_and(wmtscaps::Error::is_parse),
            "expected parse error for {input:?}, got {result:?}"
        );
    }
}

fn nested(depth: usize) -> String {
    format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
}

/// Number of `a` levels below `tree`, walked without recursion
fn nesting_depth(tree: &Node) -> usize {
    let mut depth = 0;
    let mut node = tree;
    while let Some(child) = node.get("a").and_then(Value::as_node) {
        depth += 1;
        node = child;
    }
    depth
}

#[test]
fn test_deep_document_converts_by_default() -> TestResult {
    let tree = convert(&nested(129), &[])?;
    assert_eq!(nesting_depth(&tree), 129);
    Ok(())
}

#[test]
fn test_large_document_converts_by_default() -> TestResult {
    let text = "x".repeat(11 * 1024 * 1024);
    let tree = convert(&format!("<r>{text}</r>"), &[])?;
    assert_eq!(root(&tree, "r")?.text().map(str::len), Some(text.len()));
    Ok(())
}

#[test]
fn test_very_deep_document_without_limits() -> TestResult {
    let options = ConvertOptions::new().with_parser_config(XmlConfig::unlimited());
    let tree = convert_with_options(&nested(200_000), &options)?;
    assert_eq!(nesting_depth(&tree), 200_000);
    Ok(())
}

#[test]
fn test_opt_in_limits() {
    let options = ConvertOptions::new().with_parser_config(XmlConfig::new(128, 0));
    let result = convert_with_options(&nested(129), &options);
    match result {
        Err(wmtscaps::Error::Parse(err)) => {
            assert_eq!(err.kind(), &ParseErrorKind::MaxDepthExceeded { max: 128 });
        }
        other => panic!("expected depth error, got {:?}", other.map(|_| ())),
    }
    assert!(convert_with_options(&nested(128), &options).is_ok());
}

#[test]
fn test_line_ends_normalized() -> TestResult {
    let tree = convert("<t k=\"1\r\n2\">a\r\nb</t>", &[])?;
    let t = root(&tree, "t")?;
    assert_eq!(t.text(), Some("a\nb"));
    assert_eq!(t.get("k").and_then(Value::as_text), Some("1 2"));
    Ok(())
}
