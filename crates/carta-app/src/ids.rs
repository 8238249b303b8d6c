// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::model::FieldSource;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(TableId);
entity_id!(FieldId);
entity_id!(ChartId);

impl TableId {
    pub fn numbered(seq: u64) -> Self {
        Self(format!("table-{seq}"))
    }
}

impl ChartId {
    pub fn numbered(seq: u64) -> Self {
        Self(format!("chart-{seq}"))
    }
}

impl FieldId {
    // Composition is stable so re-deriving the same column yields the same id.
    pub fn compose(source: FieldSource, table: &TableId, name: &str) -> Self {
        Self(format!("{}--{}--{}", source.as_str(), table.as_str(), name))
    }
}
