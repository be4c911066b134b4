//! Association metadata.
//!
//! Associations are declared statically on each [`Model`](crate::Model) and
//! drive cascading persistence and association population. A `One`
//! association holds a single related model, a `Many` association an ordered
//! collection. The related model carries a foreign-key field pointing back at
//! the owner, named `{ownerModelNameLowerFirst}ID` unless declared otherwise.

use crate::entity::Entity;

/// The cardinality of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// A single related model.
    One,
    /// An ordered collection of related models.
    Many,
}

/// Metadata about an association between models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationInfo {
    /// Name of the association on the owning model.
    pub name: &'static str,
    /// Model name of the related model.
    pub model: &'static str,
    /// Kind of association.
    pub kind: AssociationKind,
    /// Whether save/clear cascade into this association.
    pub save: bool,
    /// Foreign-key field on the related model (default derived from the owner name).
    pub foreign_key: Option<&'static str>,
}

impl AssociationInfo {
    /// A `One` association that cascades.
    pub const fn one(name: &'static str, model: &'static str) -> Self {
        Self {
            name,
            model,
            kind: AssociationKind::One,
            save: true,
            foreign_key: None,
        }
    }

    /// A `Many` association that cascades.
    pub const fn many(name: &'static str, model: &'static str) -> Self {
        Self {
            name,
            model,
            kind: AssociationKind::Many,
            save: true,
            foreign_key: None,
        }
    }

    /// Set whether save/clear cascade into this association.
    pub const fn save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Use an explicit foreign-key field on the related model.
    pub const fn foreign_key(mut self, field: &'static str) -> Self {
        self.foreign_key = Some(field);
        self
    }

    /// Foreign-key field name on the related model for the given owner model.
    pub fn foreign_key_for(&self, owner: &str) -> String {
        match self.foreign_key {
            Some(field) => field.to_string(),
            None => format!("{}ID", lower_first(owner)),
        }
    }
}

/// Lowercase the first character of a model name (`BlogPost` → `blogPost`).
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Read access to an association's current members.
pub enum Related<'a> {
    One(Option<&'a dyn Entity>),
    Many(Vec<&'a dyn Entity>),
}

/// Mutable access to an association's current members.
pub enum RelatedMut<'a> {
    One(Option<&'a mut dyn Entity>),
    Many(Vec<&'a mut dyn Entity>),
}

impl<'a> Related<'a> {
    /// Members in declaration order (zero or one for `One`).
    pub fn into_members(self) -> Vec<&'a dyn Entity> {
        match self {
            Related::One(one) => one.into_iter().collect(),
            Related::Many(many) => many,
        }
    }
}

impl<'a> RelatedMut<'a> {
    /// Members in declaration order (zero or one for `One`).
    pub fn into_members(self) -> Vec<&'a mut dyn Entity> {
        match self {
            RelatedMut::One(one) => one.into_iter().collect(),
            RelatedMut::Many(many) => many,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_foreign_key_uses_lower_first_owner() {
        let assoc = AssociationInfo::many("comments", "Comment");
        assert_eq!(assoc.foreign_key_for("BlogPost"), "blogPostID");
        assert_eq!(assoc.foreign_key_for("user"), "userID");
    }

    #[test]
    fn explicit_foreign_key_wins() {
        let assoc = AssociationInfo::one("profile", "Profile").foreign_key("owner_id");
        assert_eq!(assoc.foreign_key_for("User"), "owner_id");
    }

    #[test]
    fn save_flag_toggles() {
        const A: AssociationInfo = AssociationInfo::many("tags", "Tag").save(false);
        assert!(!A.save);
        assert_eq!(A.kind, AssociationKind::Many);
    }

    #[test]
    fn lower_first_handles_edges() {
        assert_eq!(lower_first(""), "");
        assert_eq!(lower_first("A"), "a");
        assert_eq!(lower_first("ÉtéModel"), "étéModel");
    }
}
