//! Splices rendered functions into a unit's original text.
//!
//! Only the edited items change, every other byte of the file is kept.

use crate::source::Unit;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

/// Merges by name.
///
/// `functions` replace the annotated functions they are named after.
/// `helpers` replace the function of the same name where there is one and are
/// appended (sorted by name) otherwise. Generated helpers that are no longer
/// in `helpers` are removed.
pub fn merge(unit: &Unit, functions: &BTreeMap<String, String>, helpers: &BTreeMap<String, String>) -> String {
  let source = unit.source.as_str();
  let mut edits: Vec<(Range<usize>, &str)> = vec![];
  let mut placed: HashSet<&str> = HashSet::new();

  for function in &unit.functions {
    let name = function.name.as_str();
    if function.annotation.is_some() {
      if let Some(text) = functions.get(name) {
        edits.push((function.range.clone(), text.trim_end()));
      }
      continue;
    }
    match helpers.get(name) {
      Some(text) if placed.insert(name) => edits.push((function.range.clone(), text.trim_end())),
      _ if function.generated => {
        // stale or duplicated, goes with the blank lines before it
        let start = source[..function.range.start].trim_end().len();
        edits.push((start..function.range.end, ""));
      }
      _ => {}
    }
  }

  edits.sort_by_key(|(range, _)| range.start);
  let mut out = String::with_capacity(source.len());
  let mut cursor = 0;
  for (range, text) in edits {
    if range.start < cursor {
      continue;
    }
    out.push_str(&source[cursor..range.start]);
    out.push_str(text);
    cursor = range.end;
  }
  out.push_str(&source[cursor..]);

  let appended: Vec<&String> = helpers
    .iter()
    .filter(|(name, _)| !placed.contains(name.as_str()))
    .map(|(_, text)| text)
    .collect();
  if !appended.is_empty() {
    out.truncate(out.trim_end().len());
    for text in appended {
      out.push_str("\n\n");
      out.push_str(text.trim_end());
    }
    out.push('\n');
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::ModulePath;
  use std::path::Path;

  fn unit(source: &str) -> Unit {
    Unit::parse(Path::new("src/lib.rs"), ModulePath::root(), source.to_string()).unwrap()
  }

  fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  const SOURCE: &str = r#"// Keep me.
use crate::dto::User;

#[quickcopy]
fn copy_user(dst: &mut UserDto, src: &User) {}

fn unrelated() {
  // untouched
}
"#;

  #[test]
  fn test_replace_and_append() {
    let functions = map(&[(
      "copy_user",
      "#[quickcopy]\nfn copy_user(dst: &mut UserDto, src: &User) {\n    dst.a = src.a;\n}\n",
    )]);
    let helpers = map(&[
      ("copy_b", "/// Generated by quickcopy.\nfn copy_b() {}\n"),
      ("copy_a", "/// Generated by quickcopy.\nfn copy_a() {}\n"),
    ]);
    let merged = merge(&unit(SOURCE), &functions, &helpers);
    assert_eq!(
      merged,
      r#"// Keep me.
use crate::dto::User;

#[quickcopy]
fn copy_user(dst: &mut UserDto, src: &User) {
    dst.a = src.a;
}

fn unrelated() {
  // untouched
}

/// Generated by quickcopy.
fn copy_a() {}

/// Generated by quickcopy.
fn copy_b() {}
"#
    );

    // a second merge over the output changes nothing
    assert_eq!(merge(&unit(&merged), &functions, &helpers), merged);
  }

  #[test]
  fn test_stale_helpers_removed() {
    let source = format!(
      "{}\n/// Generated by quickcopy.\nfn copy_old() {{}}\n\n/// Generated by quickcopy.\nfn copy_a() {{}}\n",
      SOURCE
    );
    let helpers = map(&[("copy_a", "/// Generated by quickcopy.\nfn copy_a() {\n    let _ = 1;\n}\n")]);
    let merged = merge(&unit(&source), &BTreeMap::new(), &helpers);
    assert_eq!(
      merged,
      format!(
        "{}\n/// Generated by quickcopy.\nfn copy_a() {{\n    let _ = 1;\n}}\n",
        SOURCE
      )
    );
  }

  #[test]
  fn test_user_function_replaced_by_name() {
    let source = "fn copy_a() { todo!() }\n\nfn keep() {}\n";
    let helpers = map(&[("copy_a", "/// Generated by quickcopy.\nfn copy_a() {}")]);
    assert_eq!(
      merge(&unit(source), &BTreeMap::new(), &helpers),
      "/// Generated by quickcopy.\nfn copy_a() {}\n\nfn keep() {}\n"
    );
  }
}
