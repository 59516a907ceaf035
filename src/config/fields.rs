//! Named field access for [`Configuration`]
//!
//! Every field the settings page can touch is listed once in [`FIELDS`],
//! together with its YAML key, declared type and a typed getter/setter pair.
//! Lookups by name go through this table, so an unknown name or a value of
//! the wrong type is rejected before anything is mutated.

use std::fmt;

use serde_yaml::Value;

use super::schema::Configuration;

/// Top-level section of the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    App,
    Dataset,
    Mysql,
}

impl Section {
    /// YAML key of the section
    pub fn key(self) -> &'static str {
        match self {
            Section::App => "app",
            Section::Dataset => "dataset",
            Section::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    Integer,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("string"),
            FieldKind::Flag => f.write_str("bool"),
            FieldKind::Integer => f.write_str("integer"),
        }
    }
}

/// A value travelling into or out of a named field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Integer(i64),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::Integer(_) => FieldKind::Integer,
        }
    }

    pub fn to_yaml(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::Integer(n) => Value::Number((*n).into()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

type Getter = fn(&Configuration) -> Option<FieldValue>;
type Setter = fn(&mut Configuration, FieldValue) -> Result<(), String>;

/// One entry of the field table
pub struct FieldDescriptor {
    pub section: Section,
    pub key: &'static str,
    pub kind: FieldKind,
    /// Whether `set_field` may change this field and `save` writes it back
    pub writable: bool,
    get: Getter,
    set: Setter,
}

impl FieldDescriptor {
    /// Current value, `None` when the owning section is absent
    pub fn get(&self, config: &Configuration) -> Option<FieldValue> {
        (self.get)(config)
    }

    /// Store `value`; the caller has already checked `value.kind() == self.kind`
    pub fn set(&self, config: &mut Configuration, value: FieldValue) -> Result<(), String> {
        (self.set)(config, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("section", &self.section)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("writable", &self.writable)
            .finish()
    }
}

fn text(value: FieldValue) -> Result<String, String> {
    match value {
        FieldValue::Text(s) => Ok(s),
        other => Err(format!("expected string, got {}", other.kind())),
    }
}

fn flag(value: FieldValue) -> Result<bool, String> {
    match value {
        FieldValue::Flag(b) => Ok(b),
        other => Err(format!("expected bool, got {}", other.kind())),
    }
}

fn integer<T: TryFrom<i64>>(value: FieldValue) -> Result<T, String> {
    match value {
        FieldValue::Integer(n) => {
            T::try_from(n).map_err(|_| format!("{} is out of range", n))
        }
        other => Err(format!("expected integer, got {}", other.kind())),
    }
}

fn no_write(_: &mut Configuration, _: FieldValue) -> Result<(), String> {
    Err("read-only".to_string())
}

fn mysql_missing() -> String {
    "mysql section is not configured".to_string()
}

/// Every addressable field
pub static FIELDS: &[FieldDescriptor] = &[
    // app: identity strings, never written back
    FieldDescriptor {
        section: Section::App,
        key: "name",
        kind: FieldKind::Text,
        writable: false,
        get: |c| Some(FieldValue::Text(c.app.name.clone())),
        set: no_write,
    },
    FieldDescriptor {
        section: Section::App,
        key: "version",
        kind: FieldKind::Text,
        writable: false,
        get: |c| Some(FieldValue::Text(c.app.version.clone())),
        set: no_write,
    },
    FieldDescriptor {
        section: Section::App,
        key: "description",
        kind: FieldKind::Text,
        writable: false,
        get: |c| Some(FieldValue::Text(c.app.description.clone())),
        set: no_write,
    },
    FieldDescriptor {
        section: Section::App,
        key: "author",
        kind: FieldKind::Text,
        writable: false,
        get: |c| Some(FieldValue::Text(c.app.author.clone())),
        set: no_write,
    },
    FieldDescriptor {
        section: Section::App,
        key: "startup",
        kind: FieldKind::Text,
        writable: false,
        get: |c| Some(FieldValue::Text(c.app.startup.clone())),
        set: no_write,
    },
    // dataset
    FieldDescriptor {
        section: Section::Dataset,
        key: "tmp_dir",
        kind: FieldKind::Text,
        writable: true,
        get: |c| Some(FieldValue::Text(c.dataset.tmp_dir.clone())),
        set: |c, v| {
            c.dataset.tmp_dir = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Dataset,
        key: "save_dir",
        kind: FieldKind::Text,
        writable: true,
        get: |c| Some(FieldValue::Text(c.dataset.save_dir.clone())),
        set: |c, v| {
            c.dataset.save_dir = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Dataset,
        key: "auto_rename",
        kind: FieldKind::Flag,
        writable: true,
        get: |c| Some(FieldValue::Flag(c.dataset.auto_rename)),
        set: |c, v| {
            c.dataset.auto_rename = flag(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Dataset,
        key: "auto_rename_key",
        kind: FieldKind::Text,
        writable: true,
        get: |c| Some(FieldValue::Text(c.dataset.auto_rename_key.clone())),
        set: |c, v| {
            c.dataset.auto_rename_key = text(v)?;
            Ok(())
        },
    },
    // mysql
    FieldDescriptor {
        section: Section::Mysql,
        key: "host",
        kind: FieldKind::Text,
        writable: true,
        get: |c| c.mysql.as_ref().map(|m| FieldValue::Text(m.host.clone())),
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.host = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "user",
        kind: FieldKind::Text,
        writable: true,
        get: |c| c.mysql.as_ref().map(|m| FieldValue::Text(m.user.clone())),
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.user = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "password",
        kind: FieldKind::Text,
        writable: true,
        get: |c| c.mysql.as_ref().map(|m| FieldValue::Text(m.password.clone())),
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.password = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "dbname",
        kind: FieldKind::Text,
        writable: true,
        get: |c| c.mysql.as_ref().map(|m| FieldValue::Text(m.dbname.clone())),
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.dbname = text(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "port",
        kind: FieldKind::Integer,
        writable: true,
        get: |c| c.mysql.as_ref().map(|m| FieldValue::Integer(m.port.into())),
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.port = integer(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "max_open_conns",
        kind: FieldKind::Integer,
        writable: true,
        get: |c| {
            c.mysql
                .as_ref()
                .map(|m| FieldValue::Integer(m.max_open_conns.into()))
        },
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.max_open_conns = integer(v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        section: Section::Mysql,
        key: "max_idle_conns",
        kind: FieldKind::Integer,
        writable: true,
        get: |c| {
            c.mysql
                .as_ref()
                .map(|m| FieldValue::Integer(m.max_idle_conns.into()))
        },
        set: |c, v| {
            c.mysql.as_mut().ok_or_else(mysql_missing)?.max_idle_conns = integer(v)?;
            Ok(())
        },
    },
];

/// Find the descriptor for `section.key`
pub fn lookup(section: Section, key: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|f| f.section == section && f.key == key)
}

/// Descriptors written back by a save
pub fn writable_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELDS.iter().filter(|f| f.writable)
}
