use crate::model::{Node, User};
use quickcopy::{quickcopy, QuickCopy};

#[derive(Debug, Default, PartialEq)]
pub struct UserDto {
  pub id: String,
  pub age: String,
  pub name: String,
  pub joined: String,
  pub tags: Vec<TagDto>,
  pub nicknames: Option<Vec<String>>,
}

#[derive(Debug, Default, PartialEq, QuickCopy)]
pub struct TagDto {
  #[copy(from = "name")]
  pub label: String,
  pub weight: u32,
}

#[derive(Debug, Default, PartialEq)]
pub struct NodeDto {
  pub value: i64,
  pub peer: Option<Box<PeerDto>>,
}

#[derive(Debug, Default, PartialEq)]
pub struct PeerDto {
  pub label: String,
  pub node: Option<Box<NodeDto>>,
}

#[quickcopy]
pub fn copy_user(dst: &mut UserDto, src: &User) {
    dst.id = quickcopy::convert::uuid_to_text(&src.id);
    dst.age = quickcopy::convert::int_to_text(&src.age);
    dst.name = src.name.clone();
    dst.joined = quickcopy::convert::timestamp_to_text(&src.joined);
    copy_vec_tag_dto_from_vec_tag_c54581d4(&mut dst.tags, &src.tags);
    dst.nicknames = src.nicknames.clone();
}

#[quickcopy]
pub fn copy_node(dst: &mut NodeDto, src: &Node) {
    dst.value = src.value;
    dst
        .peer = src
        .peer
        .as_ref()
        .map(|item| Box::new({
            let mut out = Default::default();
            copy_peer_dto_from_peer_546b2eac(&mut out, &**item);
            out
        }));
}

/// Generated by quickcopy: `crate::api::NodeDto` from `crate::model::Node`.
fn copy_node_dto_from_node_cb576a70(dst: &mut NodeDto, src: &crate::model::Node) {
    dst.value = src.value;
    dst
        .peer = src
        .peer
        .as_ref()
        .map(|item| Box::new({
            let mut out = Default::default();
            copy_peer_dto_from_peer_546b2eac(&mut out, &**item);
            out
        }));
}

/// Generated by quickcopy: `crate::api::PeerDto` from `crate::model::Peer`.
fn copy_peer_dto_from_peer_546b2eac(dst: &mut PeerDto, src: &crate::model::Peer) {
    dst.label = src.label.clone();
    dst
        .node = src
        .node
        .as_ref()
        .map(|item| Box::new({
            let mut out = Default::default();
            copy_node_dto_from_node_cb576a70(&mut out, &**item);
            out
        }));
}

/// Generated by quickcopy: `crate::api::TagDto` from `crate::model::Tag`.
fn copy_tag_dto_from_tag_7ad6d6e6(dst: &mut TagDto, src: &crate::model::Tag) {
    dst.label = src.name.clone();
    dst.weight = src.weight as u32;
}

/// Generated by quickcopy: `Vec<crate::api::TagDto>` from `Vec<crate::model::Tag>`.
fn copy_vec_tag_dto_from_vec_tag_c54581d4(
    dst: &mut Vec<TagDto>,
    src: &[crate::model::Tag],
) {
    *dst = src
        .iter()
        .map(|item| {
            let mut out = Default::default();
            copy_tag_dto_from_tag_7ad6d6e6(&mut out, item);
            out
        })
        .collect();
}
