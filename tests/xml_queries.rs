use pathquill::document::xml::XmlNode;
use pathquill::treepath::{Dialect, PathBuilder, QueryEngine, QueryResult};
use serde_json::json;

const CATALOG: &str = r#"<catalog>
  <!-- inventory -->
  <book id="b1" lang="en"><title>Dune</title><price>9.99</price></book>
  <book id="b2"><title>Emma</title><price>4.50</price></book>
  <magazine id="m1"><title>Wired</title></magazine>
</catalog>"#;

fn query(xml: &str, expr: &str) -> QueryResult {
    let doc = XmlNode::parse(xml).unwrap();
    QueryEngine::new(Dialect::Xml).query(&doc, expr)
}

#[test]
fn test_descendant_scenario() {
    let result = query("<root><item>X</item><item>Y</item></root>", "//item");
    assert!(result.success);
    assert_eq!(result.count, 2);
    assert_eq!(result.paths, vec!["/root/item[1]", "/root/item[2]"]);
}

#[test]
fn test_root_selector() {
    let result = query(CATALOG, "/");
    assert_eq!(result.count, 1);
    assert_eq!(result.paths, vec!["/"]);

    for padded in ["/ ", " / "] {
        let result = query(CATALOG, padded);
        assert!(result.success, "{:?}", padded);
        assert_eq!(result.paths, vec!["/"]);
    }
}

#[test]
fn test_unique_names_have_no_position() {
    let result = query(CATALOG, "/catalog/magazine/title");
    assert_eq!(result.paths, vec!["/catalog/magazine/title"]);
    assert_eq!(result.matches, vec![json!("<title>Wired</title>")]);
}

#[test]
fn test_positions_are_one_based() {
    let result = query(CATALOG, "/catalog/book[2]/title/text()");
    assert_eq!(result.matches, vec![json!("Emma")]);
    assert_eq!(result.paths, vec!["/catalog/book[2]/title/text()"]);

    assert_eq!(query(CATALOG, "/catalog/book[3]").count, 0);
}

#[test]
fn test_last_position() {
    let result = query(CATALOG, "/catalog/book[last()]/@id");
    assert_eq!(result.matches, vec![json!("b2")]);
}

#[test]
fn test_attributes() {
    let result = query(CATALOG, "/catalog/book/@id");
    assert_eq!(result.matches, vec![json!("b1"), json!("b2")]);
    assert_eq!(
        result.paths,
        vec!["/catalog/book[1]/@id", "/catalog/book[2]/@id"]
    );

    let all = query(CATALOG, "/catalog/book[1]/@*");
    assert_eq!(all.matches, vec![json!("b1"), json!("en")]);
}

#[test]
fn test_descendant_attributes_in_document_order() {
    let result = query(CATALOG, "//@id");
    assert_eq!(result.matches, vec![json!("b1"), json!("b2"), json!("m1")]);
}

#[test]
fn test_descendant_text() {
    let result = query(CATALOG, "//title/text()");
    assert_eq!(
        result.matches,
        vec![json!("Dune"), json!("Emma"), json!("Wired")]
    );
    assert_eq!(
        result.paths,
        vec![
            "/catalog/book[1]/title/text()",
            "/catalog/book[2]/title/text()",
            "/catalog/magazine/title/text()",
        ]
    );
}

#[test]
fn test_attribute_predicate() {
    let result = query(CATALOG, r#"//book[@lang="en"]/title/text()"#);
    assert_eq!(result.matches, vec![json!("Dune")]);
}

#[test]
fn test_child_text_predicate_numeric() {
    let result = query(CATALOG, "//book[?(@price > 5)]/@id");
    assert_eq!(result.matches, vec![json!("b1")]);

    let result = query(CATALOG, "//book[@price <= 4.5]/@id");
    assert_eq!(result.matches, vec![json!("b2")]);
}

#[test]
fn test_position_applies_per_parent() {
    let xml = "<r><g><i>1</i><i>2</i></g><g><i>3</i><i>4</i></g></r>";
    let first = query(xml, "//i[1]/text()");
    assert_eq!(first.matches, vec![json!("1"), json!("3")]);
    let last = query(xml, "//g/i[last()]/text()");
    assert_eq!(last.matches, vec![json!("2"), json!("4")]);
}

#[test]
fn test_comments() {
    let result = query(CATALOG, "/catalog/comment()");
    assert_eq!(result.matches, vec![json!("inventory")]);
    assert_eq!(result.paths, vec!["/catalog/comment()[1]"]);
}

#[test]
fn test_wildcard_children() {
    let result = query(CATALOG, "/catalog/*");
    assert_eq!(
        result.paths,
        vec!["/catalog/book[1]", "/catalog/book[2]", "/catalog/magazine"]
    );
}

#[test]
fn test_zero_position_is_parse_error() {
    let result = query(CATALOG, "/catalog/book[0]");
    assert!(!result.success);
    assert!(result.error.unwrap().to_string().contains("Parse error"));
}

#[test]
fn test_descendant_matches_manual_dfs() {
    fn walk(node: &XmlNode, path: &str, out: &mut Vec<String>) {
        use pathquill::document::node::TreeNode;
        for child in node.children() {
            let builder = PathBuilder::new(Dialect::Xml);
            let mut tokens = builder.parse(path).unwrap();
            tokens.push(child.token.clone());
            let child_path = builder.render(&tokens);
            if child.node.name() == Some("x") {
                out.push(child_path.clone());
            }
            walk(child.node, &child_path, out);
        }
    }

    let xml = "<x><a><x/><b><x/></b></a><x><x/></x></x>";
    let doc = XmlNode::parse(xml).unwrap();
    let mut expected = Vec::new();
    walk(&doc, "/", &mut expected);

    let result = QueryEngine::new(Dialect::Xml).query(&doc, "//x");
    assert_eq!(result.paths, expected);
    assert_eq!(result.count, 5);
}

#[test]
fn test_canonical_paths_resolve() {
    let doc = XmlNode::parse(CATALOG).unwrap();
    let engine = QueryEngine::new(Dialect::Xml);
    let everything = engine.query(&doc, "//*");
    assert!(everything.count > 0);
    for (path, value) in everything.paths.iter().zip(&everything.matches) {
        let resolved = engine.resolve(&doc, path);
        assert_eq!(&resolved.paths, &vec![path.clone()]);
        assert_eq!(&resolved.matches[0], value);
    }
}
