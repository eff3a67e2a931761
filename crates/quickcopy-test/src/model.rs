use quickcopy::{Timestamp, Uuid};

pub struct User {
  pub id: Uuid,
  pub age: i32,
  pub name: String,
  pub joined: Timestamp,
  pub tags: Vec<Tag>,
  pub nicknames: Option<Vec<String>>,
}

pub struct Tag {
  pub name: String,
  pub weight: u8,
}

pub struct Node {
  pub value: i64,
  pub peer: Option<Box<Peer>>,
}

pub struct Peer {
  pub label: String,
  pub node: Option<Box<Node>>,
}
