//! The in-memory database: a `Header`, flat `Group`/`Entry` sequences, and
//! the credentials used to derive its encryption key.

pub mod entry;
pub mod group;
pub mod hierarchy;
mod io;

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use entry::Entry;
use group::Group;
use hierarchy::RootNode;

use crate::error::{DatabaseIntegrityError, DatabaseOpenError, DatabaseSaveError};
use crate::header::Header;
use crate::key::Credentials;

/// The number of AES-ECB rounds a freshly created database transforms its
/// composite key with. KeePass1's own default; callers opening an existing
/// file always inherit whatever round count that file's header carries.
pub const DEFAULT_TRANSFORM_ROUNDS: u32 = 6_000;

/// How [`Database::add_entry`] behaves when an entry with the same title
/// already exists in the target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMode {
    /// Keep the existing entry and append a new one alongside it.
    Append,
    /// Overwrite the first existing entry with that title in place.
    Replace,
}

/// A lookup key for [`Database::find_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupQuery {
    Id(u32),
    Name(String),
}

/// A loaded or freshly created KeePass v1 database.
///
/// Groups and entries are kept as flat, ordered lists; call [`Database::hierarchy`]
/// to view them as a tree. `path` is `None` for a database created with
/// [`Database::empty`] until the first successful [`Database::write`].
pub struct Database {
    header: Header,
    groups: Vec<Group>,
    entries: Vec<Entry>,
    credentials: Credentials,
    path: Option<PathBuf>,
}

impl Database {
    /// Load and decrypt a `.kdb` file at `path` with the given credentials.
    pub fn open(path: impl AsRef<Path>, credentials: Credentials) -> Result<Database, DatabaseOpenError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let (header, groups, entries) = io::parse_kdb(&bytes, &credentials)?;
        Ok(Database {
            header,
            groups,
            entries,
            credentials,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a new, empty in-memory database with a freshly generated
    /// header (random master seed, IV, and transform seed).
    pub fn empty(credentials: Credentials) -> Result<Database, DatabaseOpenError> {
        let header = Header::generate(DEFAULT_TRANSFORM_ROUNDS)
            .map_err(|err| DatabaseOpenError::Io(std::io::Error::other(err)))?;
        Ok(Database {
            header,
            groups: Vec::new(),
            entries: Vec::new(),
            credentials,
            path: None,
        })
    }

    /// Re-encrypt and write the current in-memory state. The header's
    /// seeds, IV, and transform round count are carried over unchanged
    /// from however this database was opened or created; only the record
    /// counts and content hash are refreshed.
    ///
    /// Writes to a temp file in the same directory and renames over the
    /// destination so a crash mid-write cannot corrupt an existing file.
    pub fn write(&mut self, path: Option<&Path>) -> Result<(), DatabaseSaveError> {
        let target = match path.map(Path::to_path_buf).or_else(|| self.path.clone()) {
            Some(target) => target,
            None => return Err(DatabaseSaveError::MissingPath),
        };

        let bytes = io::dump_kdb(&mut self.header, &self.groups, &self.entries, &self.credentials)?;

        let tmp_path = target.with_extension("tmp");
        {
            let mut tmp_file = fs::File::create(&tmp_path)?;
            tmp_file.write_all(&bytes)?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, &target)?;

        self.path = Some(target);
        Ok(())
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Direct mutable access to the entry list, for callers (such as the
    /// CLI) that add, edit, or remove entries outside of [`Database::add_entry`].
    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The first entry with an exactly matching title, in list order.
    pub fn get(&self, title: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.title == title)
    }

    /// The first group matching `query`, in list order.
    pub fn find_group(&self, query: &GroupQuery) -> Option<&Group> {
        self.groups.iter().find(|group| match query {
            GroupQuery::Id(id) => group.groupid == *id,
            GroupQuery::Name(name) => &group.name == name,
        })
    }

    /// Rebuild the group hierarchy from the current flat lists. Built fresh
    /// on every call; nothing is cached.
    pub fn hierarchy(&self) -> Result<RootNode, crate::error::HierarchyError> {
        hierarchy::reconstruct(&self.groups, &self.entries)
    }

    /// Replace the entire group and entry lists directly. The one and only
    /// "update" entry point; see [`Database::replace_from_hierarchy`] for
    /// the tree-shaped equivalent.
    pub fn replace_contents(&mut self, groups: Vec<Group>, entries: Vec<Entry>) {
        self.groups = groups;
        self.entries = entries;
    }

    /// Flatten `root` and replace the database's contents with the result.
    pub fn replace_from_hierarchy(&mut self, root: &RootNode) {
        let (groups, entries) = hierarchy::flatten(root);
        self.replace_contents(groups, entries);
    }

    /// Add an entry under the `/`-separated group `path`, creating any
    /// missing intermediate groups (`mkdir -p` semantics, each with a
    /// freshly generated group id).
    #[allow(clippy::too_many_arguments)]
    pub fn add_entry(
        &mut self,
        path: &str,
        title: &str,
        username: &str,
        password: &str,
        url: Option<&str>,
        notes: Option<&str>,
        image_id: Option<u32>,
        mode: AddMode,
    ) -> Result<(), DatabaseIntegrityError> {
        let group_id = self.ensure_group_path(path)?;

        if mode == AddMode::Replace {
            if let Some(existing) = self
                .entries
                .iter_mut()
                .find(|entry| entry.group_id == group_id && entry.title == title)
            {
                existing.username = username.to_string();
                existing.set_password(password);
                existing.url = url.unwrap_or("").to_string();
                existing.notes = notes.unwrap_or("").to_string();
                if let Some(image_id) = image_id {
                    existing.image_id = image_id;
                }
                return Ok(());
            }
        }

        let mut entry = Entry::default();
        entry.uuid = self.gen_uuid()?;
        entry.group_id = group_id;
        entry.title = title.to_string();
        entry.username = username.to_string();
        entry.url = url.unwrap_or("").to_string();
        entry.notes = notes.unwrap_or("").to_string();
        entry.image_id = image_id.unwrap_or(0);
        entry.set_password(password);
        self.entries.push(entry);
        Ok(())
    }

    /// Walk (creating as needed) each `/`-separated path segment as a
    /// top-level-to-nested chain of groups, returning the leaf group's id.
    fn ensure_group_path(&mut self, path: &str) -> Result<u32, DatabaseIntegrityError> {
        let mut parent_level: i32 = -1;
        let mut insert_at = self.groups.len();
        let mut current_group_id: Option<u32> = None;

        for (depth, segment) in path.split('/').filter(|s| !s.is_empty()).enumerate() {
            let level = depth as u16;
            let existing = self
                .groups
                .iter()
                .enumerate()
                .find(|(_, g)| g.level == level && g.name == segment && parent_level + 1 == level as i32)
                .map(|(i, g)| (i, g.groupid));

            match existing {
                Some((i, id)) => {
                    current_group_id = Some(id);
                    insert_at = i + 1;
                }
                None => {
                    let groupid = self.gen_groupid()?;
                    let group = Group {
                        groupid,
                        name: segment.to_string(),
                        level,
                        ..Group::default()
                    };
                    self.groups.insert(insert_at.min(self.groups.len()), group);
                    current_group_id = Some(groupid);
                    insert_at += 1;
                }
            }
            parent_level = level as i32;
        }

        current_group_id.ok_or(DatabaseIntegrityError::EmptyGroupPath)
    }

    /// Generate a group id uniformly at random from `1..=2^32-2`, rejecting
    /// and retrying any collision with an existing group id.
    pub fn gen_groupid(&self) -> Result<u32, DatabaseIntegrityError> {
        loop {
            let candidate = crate::random::gen_range_u32_inclusive(1, 0xFFFF_FFFE)?;
            if !self.groups.iter().any(|g| g.groupid == candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Generate a fresh, random entry UUID.
    pub fn gen_uuid(&self) -> Result<uuid::Uuid, DatabaseIntegrityError> {
        Ok(uuid::Uuid::from_bytes(crate::random::gen_uuid_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_database_round_trips_to_and_from_bytes() {
        let credentials = Credentials::new().with_password("x");
        let db = Database::empty(credentials).unwrap();
        assert!(db.groups().is_empty());
        assert!(db.entries().is_empty());
    }

    #[test]
    fn add_entry_creates_missing_intermediate_groups() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        db.add_entry(
            "Internet/Shopping",
            "Example",
            "me",
            "hunter2",
            None,
            None,
            None,
            AddMode::Append,
        )
        .unwrap();

        assert_eq!(db.groups().len(), 2);
        assert_eq!(db.groups()[0].name, "Internet");
        assert_eq!(db.groups()[0].level, 0);
        assert_eq!(db.groups()[1].name, "Shopping");
        assert_eq!(db.groups()[1].level, 1);

        let entry = db.get("Example").unwrap();
        assert_eq!(entry.group_id, db.groups()[1].groupid);
        assert_eq!(entry.password(), "hunter2");
    }

    #[test]
    fn add_entry_reuses_an_existing_group_path() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        db.add_entry("Internet", "A", "u", "p", None, None, None, AddMode::Append)
            .unwrap();
        db.add_entry("Internet", "B", "u", "p", None, None, None, AddMode::Append)
            .unwrap();
        assert_eq!(db.groups().len(), 1);
        assert_eq!(db.entries().len(), 2);
    }

    #[test]
    fn add_entry_replace_mode_overwrites_in_place() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        db.add_entry("Internet", "A", "u1", "p1", None, None, None, AddMode::Append)
            .unwrap();
        db.add_entry(
            "Internet",
            "A",
            "u2",
            "p2",
            None,
            None,
            None,
            AddMode::Replace,
        )
        .unwrap();

        assert_eq!(db.entries().len(), 1);
        assert_eq!(db.entries()[0].username, "u2");
        assert_eq!(db.entries()[0].password(), "p2");
    }

    #[test]
    fn find_group_matches_by_id_and_name() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        db.add_entry("Internet", "A", "u", "p", None, None, None, AddMode::Append)
            .unwrap();
        let groupid = db.groups()[0].groupid;

        assert_eq!(
            db.find_group(&GroupQuery::Name("Internet".into())).unwrap().groupid,
            groupid
        );
        assert_eq!(
            db.find_group(&GroupQuery::Id(groupid)).unwrap().name,
            "Internet"
        );
        assert!(db.find_group(&GroupQuery::Name("Missing".into())).is_none());
    }

    #[test]
    fn gen_groupid_never_collides_with_existing_ids() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        for i in 1..50u32 {
            db.groups.push(Group {
                groupid: i,
                ..Group::default()
            });
        }
        let generated = db.gen_groupid().unwrap();
        assert!(!db.groups.iter().any(|g| g.groupid == generated));
    }

    #[test]
    fn write_without_a_known_path_fails() {
        let mut db = Database::empty(Credentials::new().with_password("x")).unwrap();
        assert!(matches!(
            db.write(None).unwrap_err(),
            DatabaseSaveError::MissingPath
        ));
    }
}
