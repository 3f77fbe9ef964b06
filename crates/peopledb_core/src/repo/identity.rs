//! Typed access to an entity's primary-key field.

use crate::repo::error::{RepoError, RepoResult};

/// Reads and writes the single key field of `E` through a typed accessor pair.
pub struct IdentityAccessor<E> {
    entity: &'static str,
    field: &'static str,
    read: fn(&E) -> Option<i64>,
    write: fn(&mut E, i64),
}

impl<E> IdentityAccessor<E> {
    pub const fn new(
        entity: &'static str,
        field: &'static str,
        read: fn(&E) -> Option<i64>,
        write: fn(&mut E, i64),
    ) -> Self {
        Self {
            entity,
            field,
            read,
            write,
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the key if one has been assigned.
    pub fn key_of(&self, entity: &E) -> Option<i64> {
        (self.read)(entity)
    }

    /// Returns the key, failing with `MissingIdentity` while it is unset.
    pub fn get(&self, entity: &E) -> RepoResult<i64> {
        self.key_of(entity).ok_or(RepoError::MissingIdentity {
            entity: self.entity,
            field: Some(self.field),
        })
    }

    pub fn set(&self, entity: &mut E, key: i64) {
        (self.write)(entity, key);
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityAccessor;
    use crate::repo::error::RepoError;

    #[derive(Default)]
    struct Widget {
        key: Option<i64>,
    }

    fn widget_key(widget: &Widget) -> Option<i64> {
        widget.key
    }

    fn assign_widget_key(widget: &mut Widget, key: i64) {
        widget.key = Some(key);
    }

    const WIDGET_IDENTITY: IdentityAccessor<Widget> =
        IdentityAccessor::new("widget", "key", widget_key, assign_widget_key);

    #[test]
    fn get_fails_until_key_is_set() {
        let mut widget = Widget::default();

        let err = WIDGET_IDENTITY.get(&widget).unwrap_err();
        assert!(matches!(
            err,
            RepoError::MissingIdentity {
                entity: "widget",
                field: Some("key"),
            }
        ));

        WIDGET_IDENTITY.set(&mut widget, 9);
        assert_eq!(WIDGET_IDENTITY.get(&widget).unwrap(), 9);
        assert_eq!(WIDGET_IDENTITY.field(), "key");
    }
}
