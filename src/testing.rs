//! In-memory collaborators for unit tests

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap, HashSet},
};

use cid::Cid;
use gix_object::Kind;

use crate::error::{Error, Result};
use crate::git::{ObjectId, ObjectStore, Reference, TypedObject};
use crate::store::{BlockFormat, ContentStore};
use crate::tracker::Tracker;

pub fn commit_payload(tree: ObjectId, parents: &[ObjectId], message: &str) -> Vec<u8> {
    let mut out = format!("tree {}\n", tree);
    for parent in parents {
        out.push_str(&format!("parent {}\n", parent));
    }
    out.push_str("author A U Thor <author@example.com> 1700000000 +0000\n");
    out.push_str("committer A U Thor <author@example.com> 1700000000 +0000\n");
    out.push_str(&format!("\n{}\n", message));
    out.into_bytes()
}

pub fn tree_payload(entries: &[(&str, &str, ObjectId)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (mode, name, id) in entries {
        out.extend_from_slice(mode.as_bytes());
        out.push(b' ');
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(id.as_bytes());
    }
    out
}

pub fn tag_payload(target: ObjectId, name: &str) -> Vec<u8> {
    format!(
        "object {}\ntype commit\ntag {}\ntagger A U Thor <author@example.com> 1700000000 +0000\n\nrelease\n",
        target, name
    )
    .into_bytes()
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: HashMap<ObjectId, TypedObject>,
    branches: BTreeMap<String, ObjectId>,
    head: Option<Reference>,
    pub reads: RefCell<Vec<ObjectId>>,
    pub fail_branches: Cell<bool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: Kind, data: Vec<u8>) -> ObjectId {
        let id = ObjectId::for_object(kind, &data);
        self.objects.insert(id, TypedObject::new(kind, data));
        id
    }

    pub fn blob(&mut self, content: &str) -> ObjectId {
        self.add(Kind::Blob, content.as_bytes().to_vec())
    }

    pub fn tree(&mut self, entries: &[(&str, &str, ObjectId)]) -> ObjectId {
        self.add(Kind::Tree, tree_payload(entries))
    }

    pub fn commit(&mut self, tree: ObjectId, parents: &[ObjectId], message: &str) -> ObjectId {
        self.add(Kind::Commit, commit_payload(tree, parents, message))
    }

    pub fn set_branch(&mut self, name: &str, id: ObjectId) {
        self.branches.insert(name.to_string(), id);
    }

    pub fn set_head(&mut self, head: Reference) {
        self.head = Some(head);
    }

    pub fn read_count(&self, id: &ObjectId) -> usize {
        self.reads.borrow().iter().filter(|r| *r == id).count()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn resolve_reference(&self, name: &str) -> Result<Reference> {
        if name == "HEAD" {
            return self
                .head
                .clone()
                .ok_or_else(|| Error::retrieval("HEAD is not set"));
        }
        self.branches
            .get(name)
            .map(|id| Reference::direct(name, *id))
            .ok_or_else(|| Error::retrieval(format!("could not resolve reference {}", name)))
    }

    fn branches(&self) -> Result<Vec<Reference>> {
        if self.fail_branches.get() {
            return Err(Error::retrieval("branch enumeration failed"));
        }
        Ok(self
            .branches
            .iter()
            .map(|(name, id)| Reference::direct(name.clone(), *id))
            .collect())
    }

    fn object(&self, id: &ObjectId) -> Result<TypedObject> {
        self.reads.borrow_mut().push(*id);
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| Error::retrieval(format!("object {} not found", id)))
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    blocks: RefCell<HashMap<Cid, Vec<u8>>>,
    pub puts: RefCell<Vec<(BlockFormat, Cid)>>,
    /// Zero-based put index whose returned CID gets corrupted
    pub tamper_at: Cell<Option<usize>>,
    pub fail_gets: Cell<bool>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self, format: BlockFormat) -> usize {
        self.puts.borrow().iter().filter(|(f, _)| *f == format).count()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.borrow().contains_key(cid)
    }
}

impl ContentStore for MemoryContentStore {
    fn put(&self, bytes: &[u8], format: BlockFormat) -> Result<Cid> {
        let mut cid = format.cid_for(bytes)?;
        self.blocks.borrow_mut().insert(cid, bytes.to_vec());

        let index = self.puts.borrow().len();
        if self.tamper_at.get() == Some(index) {
            let mut corrupted = bytes.to_vec();
            corrupted.push(b'!');
            cid = format.cid_for(&corrupted)?;
        }
        self.puts.borrow_mut().push((format, cid));
        Ok(cid)
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>> {
        if self.fail_gets.get() {
            return Err(Error::store("content store unavailable"));
        }
        self.blocks
            .borrow()
            .get(cid)
            .cloned()
            .ok_or_else(|| Error::store(format!("block {} not found", cid)))
    }
}

#[derive(Default)]
pub struct MemoryTracker {
    entries: RefCell<HashSet<ObjectId>>,
    slots: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl Tracker for MemoryTracker {
    fn has_entry(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.entries.borrow().contains(id))
    }

    fn add_entry(&self, id: &ObjectId) -> Result<()> {
        self.entries.borrow_mut().insert(*id);
        Ok(())
    }

    fn slot(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.borrow().get(name).cloned())
    }

    fn set_slot(&self, name: &str, value: &[u8]) -> Result<()> {
        self.slots
            .borrow_mut()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }
}
