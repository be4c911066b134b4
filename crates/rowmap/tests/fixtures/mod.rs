//! Shared models and a recording connection for the integration tests.

#![allow(dead_code)]

use rowmap::prelude::*;
use rowmap::{Dialect, UnresolvedKind, downcast_all, downcast_first};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording connection
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub statements: Vec<Statement>,
    /// Result sets handed out by successive `query` calls; empty once drained.
    pub results: VecDeque<Vec<Row>>,
    pub last_id: i64,
    /// Any statement containing this fragment fails.
    pub fail_on: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    pub state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next unanswered `query`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state
            .lock()
            .expect("lock poisoned")
            .results
            .push_back(rows);
    }

    pub fn fail_on(&self, fragment: &str) {
        self.state.lock().expect("lock poisoned").fail_on = Some(fragment.to_string());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().expect("lock poisoned").statements.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|s| s.sql).collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().expect("lock poisoned").statements.clear();
    }

    fn record(&self, sql: &str, params: &[Value]) -> rowmap::Result<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.statements.push(Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(fragment) = &state.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(Error::query(sql, "forced failure"));
            }
        }
        Ok(state)
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&self, sql: &str, params: &[Value]) -> rowmap::Result<Vec<Row>> {
        let mut state = self.record(sql, params)?;
        Ok(state.results.pop_front().unwrap_or_default())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> rowmap::Result<u64> {
        self.record(sql, params)?;
        Ok(1)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> rowmap::Result<i64> {
        let mut state = self.record(sql, params)?;
        state.last_id += 1;
        Ok(state.last_id)
    }

    fn begin(&self) -> rowmap::Result<()> {
        self.record("BEGIN", &[]).map(drop)
    }

    fn commit(&self) -> rowmap::Result<()> {
        self.record("COMMIT", &[]).map(drop)
    }

    fn rollback(&self) -> rowmap::Result<()> {
        self.record("ROLLBACK", &[]).map(drop)
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().cloned())
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub profile: Option<Profile>,
    pub posts: Vec<Post>,
    pub tags: Vec<Tag>,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            ..Self::default()
        }
    }
}

impl Model for User {
    const MODEL_NAME: &'static str = "User";
    const TABLE_NAME: &'static str = "users";
    const ASSOCIATIONS: &'static [AssociationInfo] = &[
        AssociationInfo::one("profile", "Profile"),
        AssociationInfo::many("posts", "Post"),
        AssociationInfo::many("tags", "Tag").save(false),
    ];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("name"),
            FieldInfo::new("email").column("email_address"),
        ];
        FIELDS
    }

    fn new_empty() -> Self {
        Self::default()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("email", self.email.clone().into()),
        ]
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "name" => self.name = value.try_into()?,
            "email" => self.email = value.try_into()?,
            _ => {}
        }
        Ok(())
    }

    fn association(&self, name: &str) -> Option<Related<'_>> {
        match name {
            "profile" => Some(Related::One(
                self.profile.as_ref().map(|p| p as &dyn Entity),
            )),
            "posts" => Some(Related::Many(
                self.posts.iter().map(|p| p as &dyn Entity).collect(),
            )),
            "tags" => Some(Related::Many(
                self.tags.iter().map(|t| t as &dyn Entity).collect(),
            )),
            _ => None,
        }
    }

    fn association_mut(&mut self, name: &str) -> Option<RelatedMut<'_>> {
        match name {
            "profile" => Some(RelatedMut::One(
                self.profile.as_mut().map(|p| p as &mut dyn Entity),
            )),
            "posts" => Some(RelatedMut::Many(
                self.posts.iter_mut().map(|p| p as &mut dyn Entity).collect(),
            )),
            "tags" => Some(RelatedMut::Many(
                self.tags.iter_mut().map(|t| t as &mut dyn Entity).collect(),
            )),
            _ => None,
        }
    }

    fn attach(&mut self, name: &str, members: Vec<Box<dyn Entity>>) -> Result<()> {
        match name {
            "profile" => self.profile = downcast_first(members)?,
            "posts" => self.posts = downcast_all(members)?,
            "tags" => self.tags = downcast_all(members)?,
            _ => {
                return Err(Error::unresolved_for(
                    UnresolvedKind::Association,
                    name,
                    Self::MODEL_NAME,
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub bio: String,
}

impl Model for Profile {
    const MODEL_NAME: &'static str = "Profile";
    const TABLE_NAME: &'static str = "profiles";

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("userID").column("user_id"),
            FieldInfo::new("bio"),
        ];
        FIELDS
    }

    fn new_empty() -> Self {
        Self::default()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("userID", self.user_id.into()),
            ("bio", self.bio.clone().into()),
        ]
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "userID" => self.user_id = value.try_into()?,
            "bio" => self.bio = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub title: String,
    pub views: i64,
}

impl Post {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

impl Model for Post {
    const MODEL_NAME: &'static str = "Post";
    const TABLE_NAME: &'static str = "posts";

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("userID").column("user_id"),
            FieldInfo::new("title"),
            FieldInfo::new("views").converter("Integer"),
        ];
        FIELDS
    }

    fn new_empty() -> Self {
        Self::default()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("userID", self.user_id.into()),
            ("title", self.title.clone().into()),
            ("views", self.views.into()),
        ]
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "userID" => self.user_id = value.try_into()?,
            "title" => self.title = value.try_into()?,
            "views" => self.views = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub label: String,
}

impl Tag {
    pub fn labelled(id: i64, label: &str) -> Self {
        Self {
            id: Some(id),
            user_id: None,
            label: label.to_string(),
        }
    }
}

impl Model for Tag {
    const MODEL_NAME: &'static str = "Tag";
    const TABLE_NAME: &'static str = "tags";

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("userID").column("user_id"),
            FieldInfo::new("label").converter("Upper"),
        ];
        FIELDS
    }

    fn new_empty() -> Self {
        Self::default()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("userID", self.user_id.into()),
            ("label", self.label.clone().into()),
        ]
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "userID" => self.user_id = value.try_into()?,
            "label" => self.label = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

/// Self-referencing tree node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: Option<i64>,
    pub parent_id: Option<i64>,
    pub children: Vec<Node>,
}

impl Node {
    /// A chain of `depth` nested transient nodes below a root.
    pub fn chain(depth: usize) -> Self {
        let mut node = Node::default();
        for _ in 0..depth {
            node = Node {
                children: vec![node],
                ..Node::default()
            };
        }
        node
    }
}

impl Model for Node {
    const MODEL_NAME: &'static str = "Node";
    const TABLE_NAME: &'static str = "nodes";
    const ASSOCIATIONS: &'static [AssociationInfo] =
        &[AssociationInfo::many("children", "Node").foreign_key("parentID")];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[FieldInfo::new("parentID").column("parent_id")];
        FIELDS
    }

    fn new_empty() -> Self {
        Self::default()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("parentID", self.parent_id.into())]
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        if field == "parentID" {
            self.parent_id = value.try_into()?;
        }
        Ok(())
    }

    fn association(&self, name: &str) -> Option<Related<'_>> {
        (name == "children").then(|| {
            Related::Many(self.children.iter().map(|n| n as &dyn Entity).collect())
        })
    }

    fn association_mut(&mut self, name: &str) -> Option<RelatedMut<'_>> {
        if name == "children" {
            Some(RelatedMut::Many(
                self.children.iter_mut().map(|n| n as &mut dyn Entity).collect(),
            ))
        } else {
            None
        }
    }
}

/// Uppercases text; registered as the application's `Upper` converter.
pub fn upper(value: &Value) -> Result<Value> {
    Ok(match value {
        Value::Text(s) => Value::Text(s.to_uppercase()),
        other => other.clone(),
    })
}

/// Registry builder with every fixture model and the `Upper` converter.
pub fn registry() -> RegistryBuilder {
    RegistryBuilder::new()
        .model::<User>()
        .model::<Profile>()
        .model::<Post>()
        .model::<Tag>()
        .model::<Node>()
        .converter("Upper", upper)
}

pub fn session(conn: &MockConnection) -> Session {
    session_with(conn, registry())
}

pub fn session_with(conn: &MockConnection, registry: RegistryBuilder) -> Session {
    SessionBuilder::new()
        .registry(|_| registry)
        .connection(conn.clone())
        .build()
        .expect("build session")
}
