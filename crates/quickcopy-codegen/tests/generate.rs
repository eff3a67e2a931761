use quickcopy_codegen::naming::helper_name;
use quickcopy_codegen::plan::Reason;
use quickcopy_codegen::registry::HelperBody;
use quickcopy_codegen::resolve::{Builtin, Unmapped};
use quickcopy_codegen::types::RefKind;
use quickcopy_codegen::{generate, Config, Error, MemoryTree, Report, Session, Strategy, TypeRef};
use std::path::PathBuf;
use std::sync::Arc;

fn run(tree: &MemoryTree, paths: &[&str]) -> Result<Report, Error> {
  let session = Session::new(Arc::new(tree.clone()), Config::default())?;
  let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
  generate(&session, &paths)
}

fn lib(source: &str) -> MemoryTree {
  MemoryTree::new().with_file("src/lib.rs", source)
}

fn helper_names(report: &Report) -> Vec<&str> {
  report.helpers.iter().map(|h| h.name.as_str()).collect()
}

fn record(qualifier: &str, name: &str) -> TypeRef {
  TypeRef::named(qualifier, name)
}

/// Record helper name for `crate::{src}` into `crate::{dst}`.
fn record_helper(src: &str, dst: &str) -> String {
  helper_name(&record("crate", src), &record("crate", dst))
}

fn vec_helper(src: &str, dst: &str) -> String {
  helper_name(&TypeRef::vec(record("crate", src)), &TypeRef::vec(record("crate", dst)))
}

#[test]
fn test_int_to_text() {
  let tree = lib(
    r#"
pub struct User {
  pub age: i32,
}

#[derive(Default)]
pub struct UserDto {
  pub age: String,
}

#[quickcopy]
fn copy_user(dst: &mut UserDto, src: &User) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  assert_eq!(plan.mappings.len(), 1);
  assert_eq!(plan.mappings[0].strategy, Strategy::Builtin(Builtin::IntToText));
  assert!(plan.diagnostics.is_empty());
  assert!(report.units[0]
    .rendered
    .contains("dst.age = quickcopy::convert::int_to_text(&src.age);"));
  assert!(report.helpers.is_empty());
}

#[test]
fn test_renamed_elements() {
  let tree = lib(
    r#"
pub struct Foo {
  pub name: String,
}

#[derive(Default)]
pub struct Bar {
  #[copy(from = "name")]
  pub label: String,
}

pub struct Order {
  pub items: Vec<Foo>,
}

#[derive(Default)]
pub struct OrderDto {
  pub items: Vec<Bar>,
}

#[quickcopy]
fn copy_order(dst: &mut OrderDto, src: &Order) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  let element = record_helper("Foo", "Bar");
  let sequence = vec_helper("Foo", "Bar");
  assert_eq!(plan.mappings[0].strategy, Strategy::SliceFn(sequence.clone()));
  assert_eq!(helper_names(&report), vec![element.as_str(), sequence.as_str()]);

  match &report.helpers[0].body {
    HelperBody::Record(plan) => {
      assert_eq!(plan.mappings.len(), 1);
      assert_eq!(plan.mappings[0].src_path, vec!["name"]);
      assert_eq!(plan.mappings[0].dst_path, vec!["label"]);
    }
    body => panic!("unexpected helper body: {:?}", body),
  }
  match &report.helpers[1].body {
    HelperBody::Sequence { element, .. } => {
      assert_eq!(element, &Strategy::StructFn(record_helper("Foo", "Bar")))
    }
    body => panic!("unexpected helper body: {:?}", body),
  }

  let rendered = &report.units[0].rendered;
  assert!(rendered.contains(&format!("{}(&mut dst.items, &src.items);", sequence)));
  assert!(rendered.contains(&format!("fn {}(dst: &mut Vec<Bar>, src: &[Foo]) {{", sequence)));
  assert!(rendered.contains(&format!("fn {}(dst: &mut Bar, src: &Foo) {{", element)));
  assert!(rendered.contains("dst.label = src.name.clone();"));
  let position = |name: &str| rendered.find(&format!("fn {}", name)).unwrap();
  assert!(position(&element) < position(&sequence));
}

#[test]
fn test_absent_container_stays_absent() {
  let tree = lib(
    r#"
pub struct Foo { pub name: String }
#[derive(Default)]
pub struct Bar { pub name: String }
pub struct Order { pub items: Option<Vec<Foo>> }
#[derive(Default)]
pub struct OrderDto { pub items: Option<Vec<Bar>> }

#[quickcopy]
fn copy_order(dst: &mut OrderDto, src: &Order) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  assert_eq!(
    plan.mappings[0].strategy,
    Strategy::PointerWrap {
      kind: RefKind::Option,
      inner: Box::new(Strategy::SliceFn(vec_helper("Foo", "Bar"))),
    }
  );
  assert!(report.units[0].rendered.contains("as_ref()"));
}

#[test]
fn test_mutually_recursive_records() {
  let tree = lib(
    r#"
pub struct A { pub name: String, pub b: Option<Box<B>> }
pub struct B { pub id: u64, pub a: Option<Box<A>> }

#[derive(Default)]
pub struct ADto { pub name: String, pub b: Option<Box<BDto>> }
#[derive(Default)]
pub struct BDto { pub id: u64, pub a: Option<Box<ADto>> }

#[quickcopy]
fn copy_a(dst: &mut ADto, src: &A) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let a = record_helper("A", "ADto");
  let b = record_helper("B", "BDto");
  assert_eq!(helper_names(&report), vec![a.as_str(), b.as_str()]);
  assert_eq!(report.helpers[0].dependencies(), vec![b.as_str()]);
  assert_eq!(report.helpers[1].dependencies(), vec![a.as_str()]);

  let rendered = &report.units[0].rendered;
  assert!(rendered.contains(&format!("fn {}(dst: &mut ADto, src: &A) {{", a)));
  assert!(rendered.contains(&format!("fn {}(dst: &mut BDto, src: &B) {{", b)));
}

#[test]
fn test_self_referencing_record() {
  let tree = lib(
    r#"
pub struct Node { pub value: i32, pub children: Vec<Node>, pub next: Option<Box<Node>> }
#[derive(Default)]
pub struct NodeDto { pub value: i64, pub children: Vec<NodeDto>, pub next: Option<Box<NodeDto>> }

#[quickcopy]
fn copy_node(dst: &mut NodeDto, src: &Node) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let node = record_helper("Node", "NodeDto");
  let children = vec_helper("Node", "NodeDto");
  assert_eq!(helper_names(&report), vec![node.as_str(), children.as_str()]);
  let mut dependencies = report.helpers[0].dependencies();
  dependencies.sort();
  assert_eq!(dependencies, vec![node.as_str(), children.as_str()]);
}

#[test]
fn test_narrowing_needs_opt_in() {
  let source = |attr: &str| {
    format!(
      r#"
pub struct Src {{ pub level: i32 }}
#[derive(Default)]
pub struct Dst {{ pub level: i8 }}

{}
fn copy(dst: &mut Dst, src: &Src) {{}}
"#,
      attr
    )
  };

  let report = run(&lib(&source("#[quickcopy]")), &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  assert!(plan.mappings.is_empty());
  assert!(matches!(
    plan.diagnostics[0].reason,
    Reason::Unmapped(Unmapped::Narrowing { .. })
  ));

  let report = run(&lib(&source("#[quickcopy(allow_narrowing)]")), &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  assert_eq!(plan.mappings[0].strategy, Strategy::Cast("i8".to_string()));
  assert!(report.units[0].rendered.contains("dst.level = src.level as i8;"));
}

#[test]
fn test_cross_module() {
  let tree = MemoryTree::new()
    .with_file("src/lib.rs", "mod api;\nmod model;\n")
    .with_file(
      "src/model.rs",
      r#"
pub struct Address { pub city: String }
pub struct User { pub name: String, pub address: Address }
"#,
    )
    .with_file(
      "src/api.rs",
      r#"use crate::model::User;

#[derive(Default)]
pub struct Home { pub city: String }

#[derive(Default)]
pub struct UserDto {
  pub name: String,
  #[copy(from = "address")]
  pub home: Home,
}

#[quickcopy]
fn copy_user(dst: &mut UserDto, src: &User) {}
"#,
    );
  let report = run(&tree, &["src/api.rs"]).unwrap();
  let home = helper_name(&record("crate::model", "Address"), &record("crate::api", "Home"));
  assert!(home.starts_with("copy_home_from_address_"));
  assert_eq!(helper_names(&report), vec![home.as_str()]);
  let rendered = &report.units[0].rendered;
  assert!(rendered.contains(&format!("{}(&mut dst.home, &src.address);", home)));
  assert!(rendered.contains(&format!(
    "fn {}(dst: &mut Home, src: &crate::model::Address) {{",
    home
  )));
}

#[test]
fn test_helpers_emitted_per_unit() {
  let records = r#"
pub struct Foo { pub name: String }
#[derive(Default)]
pub struct Bar { pub name: String }
pub struct Outer { pub foo: Foo }
#[derive(Default)]
pub struct OuterDto { pub foo: Bar }
"#;
  let tree = MemoryTree::new()
    .with_file("src/lib.rs", records)
    .with_file(
      "src/a.rs",
      "use crate::*;\n\n#[quickcopy]\nfn copy_a(dst: &mut OuterDto, src: &Outer) {}\n",
    )
    .with_file(
      "src/b.rs",
      "use crate::*;\n\n#[quickcopy]\nfn copy_b(dst: &mut OuterDto, src: &Outer) {}\n",
    );
  let report = run(&tree, &["src/a.rs", "src/b.rs"]).unwrap();
  assert_eq!(report.helpers.len(), 1);
  let signature = format!(
    "fn {}(dst: &mut crate::Bar, src: &crate::Foo) {{",
    record_helper("Foo", "Bar")
  );
  for unit in &report.units {
    assert!(unit.rendered.contains(&signature));
  }
}

#[test]
fn test_shared_helper_output_is_stable() {
  let mut tree = MemoryTree::new().with_file(
    "src/lib.rs",
    r#"
pub struct Foo { pub name: String, pub rank: u16 }
#[derive(Default)]
pub struct Bar { pub name: String, pub rank: u64 }
pub struct Outer { pub foo: Foo, pub foos: Vec<Foo> }
#[derive(Default)]
pub struct OuterDto { pub foo: Bar, pub foos: Vec<Bar> }
"#,
  );
  let paths = ["src/a.rs", "src/b.rs", "src/c.rs", "src/d.rs"];
  for (i, path) in paths.iter().enumerate() {
    let source = format!(
      "use crate::*;\n\n#[quickcopy]\nfn copy_{}(dst: &mut OuterDto, src: &Outer) {{}}\n",
      i
    );
    tree.insert(*path, source);
  }

  let first = run(&tree, &paths).unwrap();
  assert_eq!(first.helpers.len(), 2);
  for _ in 0..3 {
    let again = run(&tree, &paths).unwrap();
    assert_eq!(helper_names(&again), helper_names(&first));
    for (a, b) in first.units.iter().zip(&again.units) {
      assert_eq!(a.path, b.path);
      assert_eq!(a.rendered, b.rendered);
    }
  }

  // every unit carries the same helper text
  let helpers = |rendered: &str| rendered[rendered.find("/// Generated by quickcopy").unwrap()..].to_string();
  let expected = helpers(&first.units[0].rendered);
  assert!(expected.contains(&format!("fn {}(", record_helper("Foo", "Bar"))));
  assert!(expected.contains(&format!("fn {}(", vec_helper("Foo", "Bar"))));
  for unit in &first.units[1..] {
    assert_eq!(helpers(&unit.rendered), expected);
  }
}

#[test]
fn test_helpers_for_same_named_records() {
  let tree = MemoryTree::new()
    .with_file(
      "src/lib.rs",
      r#"mod user;

pub struct UserDto { pub name: String }
pub struct Dto { pub name: String }

#[derive(Default)]
pub struct Out { pub name: String }

pub struct Source { pub a: UserDto, pub b: user::Dto, pub c: Dto }
#[derive(Default)]
pub struct Target { pub a: Out, pub b: Out, pub c: Out }

#[quickcopy]
fn copy_target(dst: &mut Target, src: &Source) {}
"#,
    )
    .with_file("src/user.rs", "pub struct Dto { pub name: String }\n");
  let report = run(&tree, &["src/lib.rs"]).unwrap();

  let out = record("crate", "Out");
  let a = helper_name(&record("crate", "UserDto"), &out);
  let b = helper_name(&record("crate::user", "Dto"), &out);
  let c = helper_name(&record("crate", "Dto"), &out);
  assert_eq!(report.helpers.len(), 3);
  for name in [&a, &b, &c] {
    assert!(helper_names(&report).contains(&name.as_str()));
  }

  let rendered = &report.units[0].rendered;
  assert!(rendered.contains(&format!("{}(&mut dst.a, &src.a);", a)));
  assert!(rendered.contains(&format!("{}(&mut dst.b, &src.b);", b)));
  assert!(rendered.contains(&format!("{}(&mut dst.c, &src.c);", c)));
  for name in [&a, &b, &c] {
    assert_eq!(rendered.matches(&format!("fn {}(", name)).count(), 1);
  }
}

#[test]
fn test_second_run_is_a_no_op() {
  let source = r#"// header comment
pub struct Foo { pub name: String, pub tags: Vec<String> }
#[derive(Default)]
pub struct Bar { pub name: String, pub tags: Vec<String> }
pub struct Order { pub id: u32, pub items: Vec<Foo>, pub first: Option<Box<Foo>> }
#[derive(Default)]
pub struct OrderDto { pub id: String, pub items: Vec<Bar>, pub first: Option<Box<Bar>> }

/// Copies an order.
#[quickcopy]
fn copy_order(dst: &mut OrderDto, src: &Order) {}
"#;
  let first = run(&lib(source), &["src/lib.rs"]).unwrap();
  assert!(first.units[0].changed());
  assert!(first.units[0].rendered.starts_with("// header comment\n"));

  // identical input, identical output
  let again = run(&lib(source), &["src/lib.rs"]).unwrap();
  assert_eq!(first.units[0].rendered, again.units[0].rendered);

  let second = run(&lib(&first.units[0].rendered), &["src/lib.rs"]).unwrap();
  assert!(!second.units[0].changed());
}

#[test]
fn test_skip_and_rules() {
  let tree = lib(
    r#"
pub struct User { pub first: String, pub last: String }
#[derive(Default)]
pub struct UserDto {
  pub name: String,
  pub last: String,
  #[copy(skip)]
  pub computed: String,
  pub missing: String,
}

#[quickcopy(fields(name = "first", last = "first"))]
fn copy(dst: &mut UserDto, src: &User) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  let pairs: Vec<(String, String)> = plan
    .mappings
    .iter()
    .map(|m| (m.dst_path.join("."), m.src_path.join(".")))
    .collect();
  assert_eq!(
    pairs,
    vec![
      ("name".to_string(), "first".to_string()),
      ("last".to_string(), "first".to_string()),
    ]
  );
  assert_eq!(plan.diagnostics.len(), 1);
  assert_eq!(plan.diagnostics[0].field, "missing");
  assert_eq!(plan.diagnostics[0].reason, Reason::NoSourceField);
}

#[test]
fn test_single_to_slice() {
  let tree = lib(
    r#"
pub struct Src { pub tag: u32 }
#[derive(Default)]
pub struct Dst { pub tag: Vec<String> }

#[quickcopy(single_to_slice)]
fn copy(dst: &mut Dst, src: &Src) {}
"#,
  );
  let report = run(&tree, &["src/lib.rs"]).unwrap();
  let plan = &report.units[0].functions[0].plan;
  assert_eq!(
    plan.mappings[0].strategy,
    Strategy::SingleToSlice(Box::new(Strategy::Builtin(Builtin::IntToText)))
  );
  assert!(report.units[0].rendered.contains("dst.tag = vec!["));
}

#[test]
fn test_structural_errors() {
  let err = run(
    &lib("pub struct A { pub x: u8 }\n#[quickcopy]\nfn bad(dst: &mut A) {}\n"),
    &["src/lib.rs"],
  )
  .unwrap_err();
  assert!(matches!(err, Error::Arity { found: 1, .. }));

  let err = run(
    &lib("pub struct A { pub x: u8 }\n#[quickcopy]\nfn bad(dst: &mut Missing, src: &A) {}\n"),
    &["src/lib.rs"],
  )
  .unwrap_err();
  assert!(matches!(err, Error::UnresolvedType { .. }));

  let err = run(
    &lib("pub struct A { pub x: u8 }\n#[quickcopy]\nfn bad(dst: A, src: &A) {}\n"),
    &["src/lib.rs"],
  )
  .unwrap_err();
  assert!(matches!(err, Error::Signature { .. }));

  let err = run(&lib("#[quickcopy(deep)]\nfn bad() {}\n"), &["src/lib.rs"]).unwrap_err();
  assert!(matches!(err, Error::Annotation { .. }));
}
